//! Raw IDL JSON to canonical [`Schema`].

use std::collections::HashMap;

use heck::ToSnakeCase;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{
    detect, normalize, validate, AccountGroup, AccountItem, AccountRole, AccountTypeDef,
    Discriminator, EnumVariant, EventDef, FieldDef, IdlType, InstructionDef, Schema, TypeDef,
    TypeDefKind,
};
use crate::error::SchemaError;

/// Compute an Anchor discriminator: `sha256("<namespace>:<name>")[..8]`.
pub fn anchor_discriminator(namespace: &str, name: &str) -> Discriminator {
    let mut hasher = Sha256::new();
    hasher.update(format!("{namespace}:{name}").as_bytes());
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Parse, validate, normalize and import a schema from JSON text.
pub fn import_schema_str(raw: &str) -> Result<Schema, SchemaError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| SchemaError::invalid("schema JSON", e.to_string()))?;
    import_schema(value)
}

/// Validate, normalize and import a raw schema document.
pub fn import_schema(raw: Value) -> Result<Schema, SchemaError> {
    validate(&raw)?;
    let generation = detect(&raw);
    let canonical = normalize(raw);
    let schema = build_schema(&canonical)?;
    debug!(
        schema = %schema.name,
        ?generation,
        instructions = schema.instructions.len(),
        accounts = schema.accounts.len(),
        events = schema.events.len(),
        "imported schema"
    );
    Ok(schema)
}

fn build_schema(raw: &Value) -> Result<Schema, SchemaError> {
    let metadata = raw.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .or_else(|| raw.get("name").and_then(Value::as_str))
        .ok_or(SchemaError::MissingName)?
        .to_string();
    let declared_address = raw
        .get("address")
        .or_else(|| metadata.and_then(|m| m.get("address")))
        .and_then(Value::as_str)
        .map(str::to_string);

    // Documents that never spell out discriminators follow the Anchor
    // hashing convention for account types too.
    let derive_account_discriminators = !array(raw, "instructions")
        .iter()
        .any(|ix| ix.get("discriminator").is_some());

    let types = array(raw, "types")
        .iter()
        .map(parse_type_def)
        .collect::<Result<Vec<_>, _>>()?;
    let instructions = array(raw, "instructions")
        .iter()
        .map(parse_instruction)
        .collect::<Result<Vec<_>, _>>()?;
    let accounts = array(raw, "accounts")
        .iter()
        .map(|account| parse_account_type(account, &types, derive_account_discriminators))
        .collect::<Result<Vec<_>, _>>()?;
    let events = array(raw, "events")
        .iter()
        .map(|event| parse_event(event, &types))
        .collect::<Result<Vec<_>, _>>()?;

    check_unique(
        "instruction",
        instructions.iter().map(|ix| (ix.name.as_str(), &ix.discriminator)),
    )?;
    check_unique(
        "event",
        events.iter().map(|ev| (ev.name.as_str(), &ev.discriminator)),
    )?;

    Ok(Schema {
        name,
        declared_address,
        instructions,
        accounts,
        events,
        types,
    })
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn name_of<'a>(value: &'a Value, context: &str) -> Result<&'a str, SchemaError> {
    value
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::invalid(context, "missing `name`"))
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn parse_discriminator(value: &Value, context: &str) -> Result<Option<Discriminator>, SchemaError> {
    let Some(raw) = value.get("discriminator") else {
        return Ok(None);
    };
    let bytes = raw
        .as_array()
        .ok_or_else(|| SchemaError::invalid(context, "discriminator must be a byte array"))?
        .iter()
        .map(|b| {
            b.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| SchemaError::invalid(context, "discriminator byte out of range"))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    let disc: Discriminator = bytes.as_slice().try_into().map_err(|_| {
        SchemaError::invalid(
            context,
            format!("discriminator must be 8 bytes, got {}", bytes.len()),
        )
    })?;
    Ok(Some(disc))
}

fn parse_instruction(value: &Value) -> Result<InstructionDef, SchemaError> {
    let name = name_of(value, "instruction")?;
    let context = format!("instruction `{name}`");
    let discriminator = match parse_discriminator(value, &context)? {
        Some(disc) => disc,
        None => anchor_discriminator("global", &name.to_snake_case()),
    };
    let accounts = array(value, "accounts")
        .iter()
        .map(|item| parse_account_item(item, &context))
        .collect::<Result<Vec<_>, _>>()?;
    let args = array(value, "args")
        .iter()
        .enumerate()
        .map(|(i, arg)| parse_field(arg, i, &context))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InstructionDef {
        name: name.to_string(),
        discriminator,
        accounts,
        args,
    })
}

fn parse_account_item(value: &Value, context: &str) -> Result<AccountItem, SchemaError> {
    let name = name_of(value, context)?.to_string();
    if let Some(nested) = value.get("accounts").and_then(Value::as_array) {
        let accounts = nested
            .iter()
            .map(|item| parse_account_item(item, context))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AccountItem::Group(AccountGroup { name, accounts }));
    }
    let docs = array(value, "docs")
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    Ok(AccountItem::Role(AccountRole {
        name,
        signer: flag(value, "signer"),
        writable: flag(value, "writable"),
        optional: flag(value, "optional"),
        docs,
    }))
}

/// Parse a struct field. Entries without a name are tuple members and get
/// their position as name.
fn parse_field(value: &Value, position: usize, context: &str) -> Result<FieldDef, SchemaError> {
    match value.get("name").and_then(Value::as_str) {
        Some(name) => {
            let ty = value.get("type").ok_or_else(|| {
                SchemaError::invalid(context, format!("field `{name}` has no type"))
            })?;
            Ok(FieldDef::new(name, parse_type(ty)?))
        }
        None => Ok(FieldDef::new(position.to_string(), parse_type(value)?)),
    }
}

fn parse_fields(value: Option<&Value>, context: &str) -> Result<Vec<FieldDef>, SchemaError> {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .map(|(i, field)| parse_field(field, i, context))
        .collect()
}

/// Parse a field type in either generation's spelling.
pub(crate) fn parse_type(value: &Value) -> Result<IdlType, SchemaError> {
    match value {
        Value::String(name) => primitive(name),
        Value::Object(object) => {
            if let Some(inner) = object.get("vec") {
                Ok(IdlType::Vec(Box::new(parse_type(inner)?)))
            } else if let Some(inner) = object.get("option") {
                Ok(IdlType::Option(Box::new(parse_type(inner)?)))
            } else if let Some(array) = object.get("array") {
                let parts = array
                    .as_array()
                    .filter(|parts| parts.len() == 2)
                    .ok_or_else(|| SchemaError::invalid("array type", "expected [type, length]"))?;
                let len = parts[1]
                    .as_u64()
                    .and_then(|len| usize::try_from(len).ok())
                    .ok_or_else(|| {
                        SchemaError::UnsupportedType(format!("array length {}", parts[1]))
                    })?;
                Ok(IdlType::Array(Box::new(parse_type(&parts[0])?), len))
            } else if let Some(defined) = object.get("defined") {
                let name = defined
                    .as_str()
                    .or_else(|| defined.get("name").and_then(Value::as_str))
                    .ok_or_else(|| SchemaError::invalid("defined type", "missing type name"))?;
                Ok(IdlType::Defined(name.to_string()))
            } else {
                Err(SchemaError::UnsupportedType(value.to_string()))
            }
        }
        other => Err(SchemaError::UnsupportedType(other.to_string())),
    }
}

fn primitive(name: &str) -> Result<IdlType, SchemaError> {
    let ty = match name {
        "bool" => IdlType::Bool,
        "u8" => IdlType::U8,
        "u16" => IdlType::U16,
        "u32" => IdlType::U32,
        "u64" => IdlType::U64,
        "u128" => IdlType::U128,
        "i8" => IdlType::I8,
        "i16" => IdlType::I16,
        "i32" => IdlType::I32,
        "i64" => IdlType::I64,
        "i128" => IdlType::I128,
        "f32" => IdlType::F32,
        "f64" => IdlType::F64,
        "string" => IdlType::String,
        "bytes" => IdlType::Bytes,
        "publicKey" | "pubkey" => IdlType::Pubkey,
        other => return Err(SchemaError::UnsupportedType(other.to_string())),
    };
    Ok(ty)
}

fn parse_type_def(value: &Value) -> Result<TypeDef, SchemaError> {
    let name = name_of(value, "type definition")?;
    let context = format!("type `{name}`");
    let body = value
        .get("type")
        .ok_or_else(|| SchemaError::invalid(&context, "missing `type` body"))?;
    Ok(TypeDef {
        name: name.to_string(),
        kind: parse_type_body(body, &context)?,
    })
}

fn parse_type_body(body: &Value, context: &str) -> Result<TypeDefKind, SchemaError> {
    match body.get("kind").and_then(Value::as_str) {
        Some("struct") => Ok(TypeDefKind::Struct {
            fields: parse_fields(body.get("fields"), context)?,
        }),
        Some("enum") => {
            let variants = array(body, "variants")
                .iter()
                .map(|variant| {
                    let name = name_of(variant, context)?;
                    Ok(EnumVariant {
                        name: name.to_string(),
                        fields: parse_fields(variant.get("fields"), context)?,
                    })
                })
                .collect::<Result<Vec<_>, SchemaError>>()?;
            let tag_size = match body.get("tagSize").and_then(Value::as_u64).unwrap_or(1) {
                size @ (1 | 2 | 4) => size as u8,
                other => {
                    return Err(SchemaError::invalid(
                        context,
                        format!("unsupported enum tag size {other}"),
                    ))
                }
            };
            Ok(TypeDefKind::Enum { variants, tag_size })
        }
        Some(other) => Err(SchemaError::UnsupportedType(format!("{other} kind in {context}"))),
        None => Err(SchemaError::invalid(context, "missing `kind`")),
    }
}

fn struct_fields_of(
    name: &str,
    types: &[TypeDef],
    context: &str,
) -> Result<Vec<FieldDef>, SchemaError> {
    match types.iter().find(|ty| ty.name == name).map(|ty| &ty.kind) {
        Some(TypeDefKind::Struct { fields }) => Ok(fields.clone()),
        Some(TypeDefKind::Enum { .. }) => {
            Err(SchemaError::invalid(context, "layout must be a struct"))
        }
        None => Err(SchemaError::invalid(context, "no type definition for layout")),
    }
}

fn parse_account_type(
    value: &Value,
    types: &[TypeDef],
    derive_discriminator: bool,
) -> Result<AccountTypeDef, SchemaError> {
    let name = name_of(value, "account type")?;
    let context = format!("account type `{name}`");
    let discriminator = match parse_discriminator(value, &context)? {
        Some(disc) => Some(disc),
        None if derive_discriminator => Some(anchor_discriminator("account", name)),
        None => None,
    };
    let fields = match value.get("type") {
        Some(body) => match parse_type_body(body, &context)? {
            TypeDefKind::Struct { fields } => fields,
            TypeDefKind::Enum { .. } => {
                return Err(SchemaError::invalid(&context, "layout must be a struct"))
            }
        },
        None => struct_fields_of(name, types, &context)?,
    };
    Ok(AccountTypeDef {
        name: name.to_string(),
        discriminator,
        fields,
    })
}

fn parse_event(value: &Value, types: &[TypeDef]) -> Result<EventDef, SchemaError> {
    let name = name_of(value, "event")?;
    let context = format!("event `{name}`");
    let discriminator = match parse_discriminator(value, &context)? {
        Some(disc) => disc,
        None => anchor_discriminator("event", name),
    };
    let fields = match value.get("fields") {
        Some(fields) => parse_fields(Some(fields), &context)?,
        None => struct_fields_of(name, types, &context)?,
    };
    Ok(EventDef {
        name: name.to_string(),
        discriminator,
        fields,
    })
}

fn check_unique<'a>(
    kind: &'static str,
    entries: impl Iterator<Item = (&'a str, &'a Discriminator)>,
) -> Result<(), SchemaError> {
    let mut seen: HashMap<&Discriminator, &str> = HashMap::new();
    for (name, disc) in entries {
        if let Some(first) = seen.insert(disc, name) {
            return Err(SchemaError::DuplicateDiscriminator {
                kind,
                discriminator: hex::encode(disc),
                first: first.to_string(),
                second: name.to_string(),
            });
        }
    }
    Ok(())
}
