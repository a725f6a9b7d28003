//! Error types.
//!
//! Public decode operations never return these directly: they are rendered
//! into the diagnostic string carried on each result value.

use solana_pubkey::Pubkey;
use thiserror::Error;

/// Failure while validating or importing a raw schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema must be a JSON object")]
    NotAnObject,
    #[error("schema is missing an `instructions` list")]
    MissingInstructions,
    #[error("schema has neither a top-level `name` nor a `metadata.name`")]
    MissingName,
    #[error("invalid {context}: {reason}")]
    Invalid { context: String, reason: String },
    #[error("unsupported type `{0}`")]
    UnsupportedType(String),
    #[error("duplicate {kind} discriminator {discriminator} ({first} and {second})")]
    DuplicateDiscriminator {
        kind: &'static str,
        discriminator: String,
        first: String,
        second: String,
    },
}

impl SchemaError {
    pub(crate) fn invalid(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

/// Failure while binding a schema to program addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("schema `{0}` must be bound to at least one address")]
    NoAddresses(String),
    #[error("invalid program address `{0}`")]
    InvalidAddress(String),
}

/// Low-level cause of a structural decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldDecodeError {
    #[error("insufficient data for {what}: need {needed} bytes, {remaining} remaining")]
    InsufficientData {
        what: String,
        needed: usize,
        remaining: usize,
    },
    #[error("invalid {what} tag {tag}")]
    InvalidTag { what: String, tag: u32 },
    #[error("invalid {what}: {detail}")]
    InvalidValue { what: String, detail: String },
    #[error("type `{0}` is not defined in schema")]
    UndefinedType(String),
    #[error("type nesting deeper than {0} levels")]
    DepthExceeded(usize),
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<FieldDecodeError>,
    },
}

impl FieldDecodeError {
    /// Wrap this error with the name of the field being decoded.
    pub fn in_field(self, field: &str) -> Self {
        Self::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }
}

/// Error taxonomy for every decode path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("encoding decode failure: {0}")]
    BadEncoding(String),
    #[error("no schema bound to program {0}")]
    NoSchemaBound(Pubkey),
    #[error("discriminator {discriminator} not found in schema {schema}; known: {known}")]
    DiscriminatorMismatch {
        discriminator: String,
        schema: String,
        known: String,
    },
    #[error("{name} discriminator matched; argument decode failed: {detail}")]
    StructuralDecodeFailure { name: String, detail: String },
    /// Event payload failure reported without the codec detail.
    #[error("{name} discriminator matched; argument decode failed")]
    EventDecodeFailure { name: String },
}
