//! Schema generation detection and legacy-to-modern rewriting.
//!
//! Legacy documents express account roles with `isMut` / `isSigner` /
//! `isOptional`; modern documents use `writable` / `signer` / `optional`
//! and omit flags that are false.

use serde_json::{Map, Value};

use crate::error::SchemaError;

const LEGACY_WRITABLE: &str = "isMut";
const LEGACY_SIGNER: &str = "isSigner";
const LEGACY_OPTIONAL: &str = "isOptional";

/// Which account-role naming convention a schema document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGeneration {
    Legacy,
    Modern,
}

/// Detect the generation of a raw schema document.
///
/// Any legacy role flag on any instruction account entry, including entries
/// inside nested account groups, makes the whole document legacy.
pub fn detect(raw: &Value) -> SchemaGeneration {
    let legacy = raw
        .get("instructions")
        .and_then(Value::as_array)
        .is_some_and(|instructions| {
            instructions.iter().any(|ix| {
                ix.get("accounts")
                    .and_then(Value::as_array)
                    .is_some_and(|accounts| accounts.iter().any(has_legacy_marker))
            })
        });
    if legacy {
        SchemaGeneration::Legacy
    } else {
        SchemaGeneration::Modern
    }
}

fn has_legacy_marker(entry: &Value) -> bool {
    let Some(object) = entry.as_object() else {
        return false;
    };
    if [LEGACY_WRITABLE, LEGACY_SIGNER, LEGACY_OPTIONAL]
        .iter()
        .any(|key| object.contains_key(*key))
    {
        return true;
    }
    object
        .get("accounts")
        .and_then(Value::as_array)
        .is_some_and(|nested| nested.iter().any(has_legacy_marker))
}

/// Check the minimal shape every schema document must have.
///
/// Runs before [`normalize`], which assumes its input passed.
pub fn validate(raw: &Value) -> Result<(), SchemaError> {
    let object = raw.as_object().ok_or(SchemaError::NotAnObject)?;
    if !object.get("instructions").is_some_and(Value::is_array) {
        return Err(SchemaError::MissingInstructions);
    }
    let top_level_name = object.get("name").and_then(Value::as_str).is_some();
    let metadata_name = object
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .is_some();
    if !top_level_name && !metadata_name {
        return Err(SchemaError::MissingName);
    }
    Ok(())
}

/// Rewrite a legacy document into the modern account-role shape.
///
/// Modern documents are returned unchanged, so normalizing twice is the same
/// as normalizing once.
pub fn normalize(mut raw: Value) -> Value {
    if detect(&raw) == SchemaGeneration::Modern {
        return raw;
    }
    if let Some(instructions) = raw.get_mut("instructions").and_then(Value::as_array_mut) {
        for ix in instructions {
            if let Some(accounts) = ix.get_mut("accounts").and_then(Value::as_array_mut) {
                for entry in accounts {
                    rewrite_account_entry(entry);
                }
            }
        }
    }
    raw
}

fn rewrite_account_entry(entry: &mut Value) {
    let Some(object) = entry.as_object_mut() else {
        return;
    };
    if let Some(nested) = object.get_mut("accounts").and_then(Value::as_array_mut) {
        for child in nested {
            rewrite_account_entry(child);
        }
        return;
    }
    move_flag(object, LEGACY_WRITABLE, "writable");
    move_flag(object, LEGACY_SIGNER, "signer");
    move_flag(object, LEGACY_OPTIONAL, "optional");
}

/// Replace a legacy flag with its modern name, emitted only when true.
fn move_flag(object: &mut Map<String, Value>, legacy: &str, modern: &str) {
    if let Some(value) = object.remove(legacy) {
        if value.as_bool() == Some(true) {
            object.insert(modern.to_string(), Value::Bool(true));
        }
    }
}
