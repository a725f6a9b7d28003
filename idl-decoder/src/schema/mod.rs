//! Canonical program schema.
//!
//! A [`Schema`] is produced once per raw IDL document by [`import_schema`]
//! and is immutable afterwards. Field types form a closed tree
//! ([`IdlType`]); named types are referenced through [`IdlType::Defined`]
//! and resolved against [`Schema::types`] at decode time.

mod import;
mod normalize;

pub use import::{anchor_discriminator, import_schema, import_schema_str};
pub use normalize::{detect, normalize, validate, SchemaGeneration};

use serde::{Deserialize, Serialize};

/// 8-byte prefix identifying an instruction, account type or event.
pub type Discriminator = [u8; 8];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    /// Program address declared inside the document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_address: Option<String>,
    pub instructions: Vec<InstructionDef>,
    pub accounts: Vec<AccountTypeDef>,
    pub events: Vec<EventDef>,
    pub types: Vec<TypeDef>,
}

impl Schema {
    pub fn instruction_by_discriminator(&self, discriminator: &[u8]) -> Option<&InstructionDef> {
        self.instructions
            .iter()
            .find(|ix| ix.discriminator.as_slice() == discriminator)
    }

    pub fn instruction_by_name(&self, name: &str) -> Option<&InstructionDef> {
        self.instructions.iter().find(|ix| ix.name == name)
    }

    pub fn event_by_discriminator(&self, discriminator: &[u8]) -> Option<&EventDef> {
        self.events
            .iter()
            .find(|ev| ev.discriminator.as_slice() == discriminator)
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|ty| ty.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionDef {
    pub name: String,
    pub discriminator: Discriminator,
    pub accounts: Vec<AccountItem>,
    pub args: Vec<FieldDef>,
}

/// Entry in an instruction's account list: a single role or a named group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountItem {
    Group(AccountGroup),
    Role(AccountRole),
}

impl AccountItem {
    pub fn name(&self) -> &str {
        match self {
            AccountItem::Role(role) => &role.name,
            AccountItem::Group(group) => &group.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountRole {
    pub name: String,
    #[serde(default)]
    pub signer: bool,
    #[serde(default)]
    pub writable: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountGroup {
    pub name: String,
    pub accounts: Vec<AccountItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTypeDef {
    pub name: String,
    pub discriminator: Option<Discriminator>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    pub discriminator: Discriminator,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeDefKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TypeDefKind {
    Struct {
        fields: Vec<FieldDef>,
    },
    Enum {
        variants: Vec<EnumVariant>,
        /// Width of the variant tag in bytes (1, 2 or 4).
        tag_size: u8,
    },
}

/// Enum variant. Tuple variants carry positional field names (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IdlType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: IdlType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdlType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    String,
    /// Length-prefixed byte vector.
    Bytes,
    Pubkey,
    Array(Box<IdlType>, usize),
    Vec(Box<IdlType>),
    Option(Box<IdlType>),
    Defined(String),
}

impl IdlType {
    /// Encoded width for fixed-width primitives.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            IdlType::Bool | IdlType::U8 | IdlType::I8 => Some(1),
            IdlType::U16 | IdlType::I16 => Some(2),
            IdlType::U32 | IdlType::I32 | IdlType::F32 => Some(4),
            IdlType::U64 | IdlType::I64 | IdlType::F64 => Some(8),
            IdlType::U128 | IdlType::I128 => Some(16),
            IdlType::Pubkey => Some(32),
            _ => None,
        }
    }

    /// Short name used in diagnostics.
    pub fn label(&self) -> String {
        match self {
            IdlType::Bool => "bool".into(),
            IdlType::U8 => "u8".into(),
            IdlType::U16 => "u16".into(),
            IdlType::U32 => "u32".into(),
            IdlType::U64 => "u64".into(),
            IdlType::U128 => "u128".into(),
            IdlType::I8 => "i8".into(),
            IdlType::I16 => "i16".into(),
            IdlType::I32 => "i32".into(),
            IdlType::I64 => "i64".into(),
            IdlType::I128 => "i128".into(),
            IdlType::F32 => "f32".into(),
            IdlType::F64 => "f64".into(),
            IdlType::String => "string".into(),
            IdlType::Bytes => "bytes".into(),
            IdlType::Pubkey => "pubkey".into(),
            IdlType::Array(inner, len) => format!("[{}; {len}]", inner.label()),
            IdlType::Vec(inner) => format!("vec<{}>", inner.label()),
            IdlType::Option(inner) => format!("option<{}>", inner.label()),
            IdlType::Defined(name) => name.clone(),
        }
    }
}
