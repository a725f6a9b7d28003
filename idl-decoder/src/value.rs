//! Decoded value tree.
//!
//! Mirrors the shape of [`IdlType`](crate::schema::IdlType) but carries values.
//! Integers up to 64 bits collapse into [`DecodedValue::Unsigned`] /
//! [`DecodedValue::Signed`]; 128-bit integers keep their own variants so they
//! can be rendered as decimal strings.

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use solana_pubkey::Pubkey;

use crate::core::DecodedField;

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    U128(u128),
    I128(i128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Pubkey(Pubkey),
    Option(Option<Box<DecodedValue>>),
    Array(Vec<DecodedValue>),
    /// Named fields in declaration order.
    Struct(Vec<(String, DecodedValue)>),
    /// Enum variant; `fields` is `None` for unit variants.
    Enum {
        variant: String,
        fields: Option<Box<DecodedValue>>,
    },
}

impl DecodedValue {
    /// Look up a struct field by name.
    pub fn get(&self, field: &str) -> Option<&DecodedValue> {
        match self {
            DecodedValue::Struct(fields) => fields
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            DecodedValue::Unsigned(v) => Some(*v),
            DecodedValue::Signed(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::Signed(v) => Some(*v),
            DecodedValue::Unsigned(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pubkey(&self) -> Option<&Pubkey> {
        match self {
            DecodedValue::Pubkey(v) => Some(v),
            _ => None,
        }
    }

    /// Flatten into display rows.
    ///
    /// Struct fields become one row each; nested structs, enum payloads and
    /// non-empty arrays become rows with children. Scalars become a single
    /// unnamed row.
    pub fn to_fields(&self) -> Vec<DecodedField> {
        match self {
            DecodedValue::Struct(fields) => fields
                .iter()
                .map(|(name, value)| value.to_field(name))
                .collect(),
            other => vec![other.to_field("")],
        }
    }

    fn to_field(&self, name: &str) -> DecodedField {
        match self {
            DecodedValue::Struct(fields) => DecodedField::with_children(
                name,
                fields
                    .iter()
                    .map(|(child, value)| value.to_field(child))
                    .collect(),
            ),
            DecodedValue::Enum {
                variant,
                fields: Some(inner),
            } => {
                let mut field = DecodedField::with_children(name, inner.to_fields());
                field.value = variant.clone();
                field
            }
            DecodedValue::Array(items) if items.iter().any(|i| i.is_composite()) => {
                DecodedField::with_children(
                    name,
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| item.to_field(&format!("[{i}]")))
                        .collect(),
                )
            }
            DecodedValue::Option(Some(inner)) if inner.is_composite() => inner.to_field(name),
            other => DecodedField::new(name, other.to_string()),
        }
    }

    fn is_composite(&self) -> bool {
        matches!(
            self,
            DecodedValue::Struct(_) | DecodedValue::Enum { fields: Some(_), .. }
        )
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Bool(v) => write!(f, "{v}"),
            DecodedValue::Unsigned(v) => write!(f, "{v}"),
            DecodedValue::Signed(v) => write!(f, "{v}"),
            DecodedValue::U128(v) => write!(f, "{v}"),
            DecodedValue::I128(v) => write!(f, "{v}"),
            DecodedValue::Float(v) => write!(f, "{v}"),
            DecodedValue::String(v) => write!(f, "{v:?}"),
            DecodedValue::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
            DecodedValue::Pubkey(v) => write!(f, "{v}"),
            DecodedValue::Option(None) => write!(f, "None"),
            DecodedValue::Option(Some(v)) => write!(f, "Some({v})"),
            DecodedValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            DecodedValue::Struct(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, " }}")
            }
            DecodedValue::Enum {
                variant,
                fields: None,
            } => write!(f, "{variant}"),
            DecodedValue::Enum {
                variant,
                fields: Some(inner),
            } => write!(f, "{variant} {inner}"),
        }
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedValue::Bool(v) => serializer.serialize_bool(*v),
            DecodedValue::Unsigned(v) => serializer.serialize_u64(*v),
            DecodedValue::Signed(v) => serializer.serialize_i64(*v),
            DecodedValue::U128(v) => serializer.collect_str(v),
            DecodedValue::I128(v) => serializer.collect_str(v),
            DecodedValue::Float(v) => serializer.serialize_f64(*v),
            DecodedValue::String(v) => serializer.serialize_str(v),
            DecodedValue::Bytes(v) => {
                let mut seq = serializer.serialize_seq(Some(v.len()))?;
                for byte in v {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }
            DecodedValue::Pubkey(v) => serializer.collect_str(v),
            DecodedValue::Option(None) => serializer.serialize_none(),
            DecodedValue::Option(Some(v)) => serializer.serialize_some(v.as_ref()),
            DecodedValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DecodedValue::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            DecodedValue::Enum { variant, fields } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(variant, &fields)?;
                map.end()
            }
        }
    }
}
