//! Core result types shared by every decoder.

use serde::Serialize;
use solana_pubkey::Pubkey;

use crate::value::DecodedValue;

/// A decoded field for display.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedField {
    /// Field name
    pub name: String,
    /// Field value as string
    pub value: String,
    /// Optional nested fields (for complex types)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DecodedField>,
}

impl DecodedField {
    /// Create a simple field with name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    /// Create a field with nested children.
    pub fn with_children(name: impl Into<String>, children: Vec<DecodedField>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            children,
        }
    }
}

/// Result of decoding an instruction payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeResult {
    /// Matched instruction name, if any.
    pub name: Option<String>,
    /// Decoded argument tree.
    pub data: Option<DecodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    /// Whether a schema was bound to the program.
    pub has_schema: bool,
    /// The payload as it was received (base58).
    pub raw: String,
}

impl DecodeResult {
    pub(crate) fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            name: None,
            data: None,
            decode_error: None,
            has_schema: false,
            raw: raw.into(),
        }
    }

    /// True when both a name and a data tree were recovered.
    pub fn is_decoded(&self) -> bool {
        self.name.is_some() && self.data.is_some()
    }
}

/// An account referenced by an instruction, with its schema-declared role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAccount {
    #[serde(serialize_with = "crate::core::serialize_pubkey")]
    pub pubkey: Pubkey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_signer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_writable: Option<bool>,
    /// User-facing label supplied by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DecodedAccount {
    pub fn new(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            name: None,
            is_signer: None,
            is_writable: None,
            label: None,
        }
    }
}

/// Result of decoding raw account data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDecodeResult {
    pub account_type: Option<String>,
    pub data: Option<DecodedValue>,
    #[serde(skip)]
    pub has_schema: bool,
}

impl AccountDecodeResult {
    pub(crate) fn empty(has_schema: bool) -> Self {
        Self {
            account_type: None,
            data: None,
            has_schema,
        }
    }
}

/// An event recovered from program logs or from a CPI event instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedEvent {
    #[serde(serialize_with = "crate::core::serialize_pubkey")]
    pub program_id: Pubkey,
    pub name: Option<String>,
    pub data: Option<DecodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    /// Index of the top-level instruction that emitted the event.
    pub instruction_index: usize,
    pub is_cpi: bool,
}

/// Name, data and diagnostic recovered for a single event payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventDecode {
    pub name: Option<String>,
    pub data: Option<DecodedValue>,
    pub decode_error: Option<String>,
}

impl EventDecode {
    pub fn into_event(
        self,
        program_id: Pubkey,
        instruction_index: usize,
        is_cpi: bool,
    ) -> DecodedEvent {
        DecodedEvent {
            program_id,
            name: self.name,
            data: self.data,
            decode_error: self.decode_error,
            instruction_index,
            is_cpi,
        }
    }
}

/// Outcome of probing an inner instruction for an embedded event.
#[derive(Debug, Clone, PartialEq)]
pub enum CpiEventProbe {
    /// The payload is not an event; interpret it as an ordinary instruction.
    NotAnEvent,
    Event(EventDecode),
}

impl CpiEventProbe {
    pub fn is_event(&self) -> bool {
        matches!(self, CpiEventProbe::Event(_))
    }
}

pub(crate) fn serialize_pubkey<S: serde::Serializer>(
    pubkey: &Pubkey,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(pubkey)
}
