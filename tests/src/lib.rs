//! Fixtures for idl-decoder integration tests.
//!
//! Provides the counter program's IDL in both schema generations, helpers
//! that build instruction payloads and runtime log lines, and a borsh
//! encoder that mirrors the decoder for round-trip tests.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use idl_decoder::{
    event::EVENT_IX_TAG,
    schema::{IdlType, Schema, TypeDefKind},
    import_schema, DecodedValue, SchemaRegistry,
};
use serde_json::{json, Value};
use solana_pubkey::Pubkey;

pub use idl_decoder;
pub use idl_decoder::schema::anchor_discriminator;

pub const COUNTER_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("Counter111111111111111111111111111111111111");

// ---------------------------------------------------------------------------
// Counter program IDL
// ---------------------------------------------------------------------------

fn legacy_counter_accounts(extra: &[(&str, bool)]) -> Vec<Value> {
    let mut accounts = vec![
        json!({ "name": "counter", "isMut": true, "isSigner": false }),
        json!({ "name": "authority", "isMut": false, "isSigner": true }),
    ];
    accounts.extend(
        extra
            .iter()
            .map(|(name, writable)| json!({ "name": name, "isMut": writable, "isSigner": false })),
    );
    accounts
}

/// Counter IDL as emitted by Anchor before 0.30.
pub fn counter_idl_legacy() -> Value {
    json!({
        "version": "0.1.0",
        "name": "counter",
        "instructions": [
            {
                "name": "initialize",
                "accounts": [
                    { "name": "counter", "isMut": true, "isSigner": true },
                    { "name": "authority", "isMut": true, "isSigner": true },
                    { "name": "systemProgram", "isMut": false, "isSigner": false }
                ],
                "args": []
            },
            { "name": "increment", "accounts": legacy_counter_accounts(&[]), "args": [] },
            { "name": "decrement", "accounts": legacy_counter_accounts(&[]), "args": [] },
            {
                "name": "set",
                "accounts": legacy_counter_accounts(&[]),
                "args": [{ "name": "value", "type": "u64" }]
            },
            {
                "name": "configure",
                "accounts": legacy_counter_accounts(&[
                    ("delegate", false),
                    ("feeReceiver", true),
                    ("config", false),
                    ("metadata", false),
                    ("oracle", false),
                    ("backupAuthority", false),
                    ("systemProgram", false),
                    ("rent", false),
                ]),
                "args": [
                    { "name": "newValue", "type": "u64" },
                    { "name": "multiplier", "type": "u16" },
                    { "name": "enabled", "type": "bool" },
                    { "name": "label", "type": { "array": ["u8", 32] } },
                    { "name": "nonce", "type": "u64" }
                ]
            }
        ],
        "accounts": [{
            "name": "Counter",
            "type": {
                "kind": "struct",
                "fields": [
                    { "name": "count", "type": "u64" },
                    { "name": "authority", "type": "publicKey" }
                ]
            }
        }],
        "events": [
            {
                "name": "CounterChanged",
                "fields": [
                    { "name": "counter", "type": "publicKey", "index": false },
                    { "name": "oldValue", "type": "u64", "index": false },
                    { "name": "newValue", "type": "u64", "index": false },
                    { "name": "mode", "type": { "defined": "ChangeMode" }, "index": false }
                ]
            },
            {
                "name": "Configured",
                "fields": [
                    { "name": "multiplier", "type": "u16", "index": false },
                    { "name": "note", "type": { "option": "string" }, "index": false }
                ]
            }
        ],
        "types": [{
            "name": "ChangeMode",
            "type": {
                "kind": "enum",
                "variants": [
                    { "name": "Increment" },
                    { "name": "Decrement" },
                    { "name": "Set", "fields": [{ "name": "value", "type": "u64" }] }
                ]
            }
        }]
    })
}

fn modern_counter_accounts(extra: &[(&str, bool)]) -> Vec<Value> {
    let mut accounts = vec![
        json!({ "name": "counter", "writable": true }),
        json!({ "name": "authority", "signer": true, "relations": ["counter"] }),
    ];
    accounts.extend(extra.iter().map(|(name, writable)| {
        if *writable {
            json!({ "name": name, "writable": true })
        } else {
            json!({ "name": name })
        }
    }));
    accounts
}

/// Counter IDL as emitted by Anchor 0.30 and later.
pub fn counter_idl_modern() -> Value {
    json!({
        "address": COUNTER_PROGRAM_ID.to_string(),
        "metadata": { "name": "counter", "version": "0.1.0", "spec": "0.1.0" },
        "instructions": [
            {
                "name": "initialize",
                "discriminator": anchor_discriminator("global", "initialize"),
                "accounts": [
                    { "name": "counter", "writable": true, "signer": true },
                    { "name": "authority", "writable": true, "signer": true },
                    { "name": "system_program", "address": "11111111111111111111111111111111" }
                ],
                "args": []
            },
            {
                "name": "increment",
                "discriminator": anchor_discriminator("global", "increment"),
                "accounts": modern_counter_accounts(&[]),
                "args": []
            },
            {
                "name": "decrement",
                "discriminator": anchor_discriminator("global", "decrement"),
                "accounts": modern_counter_accounts(&[]),
                "args": []
            },
            {
                "name": "set",
                "discriminator": anchor_discriminator("global", "set"),
                "accounts": modern_counter_accounts(&[]),
                "args": [{ "name": "value", "type": "u64" }]
            },
            {
                "name": "configure",
                "discriminator": anchor_discriminator("global", "configure"),
                "accounts": modern_counter_accounts(&[
                    ("delegate", false),
                    ("fee_receiver", true),
                    ("config", false),
                    ("metadata", false),
                    ("oracle", false),
                    ("backup_authority", false),
                    ("system_program", false),
                    ("rent", false),
                ]),
                "args": [
                    { "name": "new_value", "type": "u64" },
                    { "name": "multiplier", "type": "u16" },
                    { "name": "enabled", "type": "bool" },
                    { "name": "label", "type": { "array": ["u8", 32] } },
                    { "name": "nonce", "type": "u64" }
                ]
            }
        ],
        "accounts": [
            { "name": "Counter", "discriminator": anchor_discriminator("account", "Counter") }
        ],
        "events": [
            { "name": "CounterChanged", "discriminator": anchor_discriminator("event", "CounterChanged") },
            { "name": "Configured", "discriminator": anchor_discriminator("event", "Configured") }
        ],
        "types": [
            {
                "name": "ChangeMode",
                "type": {
                    "kind": "enum",
                    "variants": [
                        { "name": "Increment" },
                        { "name": "Decrement" },
                        { "name": "Set", "fields": [{ "name": "value", "type": "u64" }] }
                    ]
                }
            },
            {
                "name": "Configured",
                "type": {
                    "kind": "struct",
                    "fields": [
                        { "name": "multiplier", "type": "u16" },
                        { "name": "note", "type": { "option": "string" } }
                    ]
                }
            },
            {
                "name": "Counter",
                "type": {
                    "kind": "struct",
                    "fields": [
                        { "name": "count", "type": "u64" },
                        { "name": "authority", "type": "pubkey" }
                    ]
                }
            },
            {
                "name": "CounterChanged",
                "type": {
                    "kind": "struct",
                    "fields": [
                        { "name": "counter", "type": "pubkey" },
                        { "name": "old_value", "type": "u64" },
                        { "name": "new_value", "type": "u64" },
                        { "name": "mode", "type": { "defined": { "name": "ChangeMode" } } }
                    ]
                }
            }
        ]
    })
}

/// The modern counter IDL imported into a canonical schema.
pub fn counter_schema() -> Schema {
    import_schema(counter_idl_modern()).unwrap()
}

/// Registry with the counter schema bound to [`COUNTER_PROGRAM_ID`].
pub fn counter_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .bind(counter_schema(), [COUNTER_PROGRAM_ID])
        .unwrap();
    registry
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

/// Build a base58 Anchor instruction payload: discriminator + borsh args.
pub fn instruction_data(name: &str, args: &[u8]) -> String {
    let mut data = anchor_discriminator("global", name).to_vec();
    data.extend_from_slice(args);
    bs58::encode(data).into_string()
}

/// Borsh body of a `CounterChanged` event.
pub fn counter_changed_fields(
    counter: &Pubkey,
    old_value: u64,
    new_value: u64,
    mode: &[u8],
) -> Vec<u8> {
    let mut data = counter.to_bytes().to_vec();
    data.extend_from_slice(&old_value.to_le_bytes());
    data.extend_from_slice(&new_value.to_le_bytes());
    data.extend_from_slice(mode);
    data
}

/// Event discriminator followed by `fields`.
pub fn event_payload(name: &str, fields: &[u8]) -> Vec<u8> {
    let mut data = anchor_discriminator("event", name).to_vec();
    data.extend_from_slice(fields);
    data
}

/// Base58 payload of an Anchor `emit_cpi!` self-invocation.
pub fn cpi_event_data(name: &str, fields: &[u8]) -> String {
    let mut data = EVENT_IX_TAG.to_vec();
    data.extend_from_slice(&event_payload(name, fields));
    bs58::encode(data).into_string()
}

pub fn invoke_line(program_id: &Pubkey, depth: usize) -> String {
    format!("Program {program_id} invoke [{depth}]")
}

pub fn success_line(program_id: &Pubkey) -> String {
    format!("Program {program_id} success")
}

pub fn failed_line(program_id: &Pubkey, reason: &str) -> String {
    format!("Program {program_id} failed: {reason}")
}

pub fn data_line(payload: &[u8]) -> String {
    format!("Program data: {}", STANDARD.encode(payload))
}

/// Deterministic key whose 32 bytes all equal `seed`.
pub fn test_key(seed: u8) -> Pubkey {
    Pubkey::new_from_array([seed; 32])
}

/// RPC `json` encoding of a counter `set` transaction.
///
/// The program emits `CounterChanged` both through `Program data:` and through
/// a self-CPI event instruction. Account table: authority (seed 1), counter
/// account (seed 2), counter program.
pub fn counter_set_transaction(value: u64, old_value: u64) -> Value {
    let authority = test_key(1);
    let counter = test_key(2);
    let mut set_mode = vec![2u8];
    set_mode.extend_from_slice(&value.to_le_bytes());
    let log_fields = counter_changed_fields(&counter, old_value, value, &set_mode);
    // The CPI copy reports the unit `Increment` mode.
    let cpi_fields = counter_changed_fields(&counter, old_value, value, &[0]);
    json!({
        "slot": 42,
        "transaction": {
            "signatures": ["5set1111111111111111111111111111111111111111111111111111111111111111111111111111111111"],
            "message": {
                "accountKeys": [
                    authority.to_string(),
                    counter.to_string(),
                    COUNTER_PROGRAM_ID.to_string()
                ],
                "header": {
                    "numRequiredSignatures": 1,
                    "numReadonlySignedAccounts": 0,
                    "numReadonlyUnsignedAccounts": 1
                },
                "instructions": [{
                    "programIdIndex": 2,
                    "accounts": [1, 0],
                    "data": instruction_data("set", &value.to_le_bytes()),
                    "stackHeight": null
                }],
                "recentBlockhash": "11111111111111111111111111111111"
            }
        },
        "meta": {
            "err": null,
            "fee": 5000,
            "computeUnitsConsumed": 3120,
            "innerInstructions": [{
                "index": 0,
                "instructions": [{
                    "programIdIndex": 2,
                    "accounts": [],
                    "data": cpi_event_data("CounterChanged", &cpi_fields),
                    "stackHeight": 2
                }]
            }],
            "logMessages": [
                invoke_line(&COUNTER_PROGRAM_ID, 1),
                "Program log: Instruction: Set",
                data_line(&event_payload("CounterChanged", &log_fields)),
                invoke_line(&COUNTER_PROGRAM_ID, 2),
                format!("Program {COUNTER_PROGRAM_ID} consumed 1200 of 190000 compute units"),
                success_line(&COUNTER_PROGRAM_ID),
                format!("Program {COUNTER_PROGRAM_ID} consumed 3120 of 200000 compute units"),
                success_line(&COUNTER_PROGRAM_ID)
            ],
            "loadedAddresses": { "writable": [], "readonly": [] }
        }
    })
}

// ---------------------------------------------------------------------------
// Test-only encoder
// ---------------------------------------------------------------------------

/// Encode `value` as `ty` the way the decoder expects to read it.
///
/// Panics when the value does not fit the type; only used by tests.
pub fn encode_value(value: &DecodedValue, ty: &IdlType, schema: &Schema) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value, ty, schema);
    out
}

fn borsh_bytes<T: borsh::BorshSerialize>(value: &T) -> Vec<u8> {
    borsh::to_vec(value).unwrap()
}

fn write_value(out: &mut Vec<u8>, value: &DecodedValue, ty: &IdlType, schema: &Schema) {
    match (ty, value) {
        (IdlType::Bool, DecodedValue::Bool(v)) => out.extend(borsh_bytes(v)),
        (IdlType::U8, DecodedValue::Unsigned(v)) => out.extend(borsh_bytes(&(*v as u8))),
        (IdlType::U16, DecodedValue::Unsigned(v)) => out.extend(borsh_bytes(&(*v as u16))),
        (IdlType::U32, DecodedValue::Unsigned(v)) => out.extend(borsh_bytes(&(*v as u32))),
        (IdlType::U64, DecodedValue::Unsigned(v)) => out.extend(borsh_bytes(v)),
        (IdlType::U128, DecodedValue::U128(v)) => out.extend(borsh_bytes(v)),
        (IdlType::I8, DecodedValue::Signed(v)) => out.extend(borsh_bytes(&(*v as i8))),
        (IdlType::I16, DecodedValue::Signed(v)) => out.extend(borsh_bytes(&(*v as i16))),
        (IdlType::I32, DecodedValue::Signed(v)) => out.extend(borsh_bytes(&(*v as i32))),
        (IdlType::I64, DecodedValue::Signed(v)) => out.extend(borsh_bytes(v)),
        (IdlType::I128, DecodedValue::I128(v)) => out.extend(borsh_bytes(v)),
        (IdlType::F32, DecodedValue::Float(v)) => out.extend(borsh_bytes(&(*v as f32))),
        (IdlType::F64, DecodedValue::Float(v)) => out.extend(borsh_bytes(v)),
        (IdlType::String, DecodedValue::String(v)) => out.extend(borsh_bytes(v)),
        (IdlType::Bytes, DecodedValue::Bytes(v)) => out.extend(borsh_bytes(v)),
        (IdlType::Pubkey, DecodedValue::Pubkey(v)) => out.extend_from_slice(&v.to_bytes()),
        (IdlType::Array(_, len), DecodedValue::Bytes(v)) => {
            assert_eq!(v.len(), *len, "byte array length");
            out.extend_from_slice(v);
        }
        (IdlType::Array(inner, len), DecodedValue::Array(items)) => {
            assert_eq!(items.len(), *len, "array length");
            for item in items {
                write_value(out, item, inner, schema);
            }
        }
        (IdlType::Vec(inner), DecodedValue::Array(items)) => {
            out.extend(borsh_bytes(&(items.len() as u32)));
            for item in items {
                write_value(out, item, inner, schema);
            }
        }
        (IdlType::Option(_), DecodedValue::Option(None)) => out.push(0),
        (IdlType::Option(inner), DecodedValue::Option(Some(item))) => {
            out.push(1);
            write_value(out, item, inner, schema);
        }
        (IdlType::Defined(name), value) => write_defined(out, value, name, schema),
        (ty, value) => panic!("cannot encode {value:?} as {}", ty.label()),
    }
}

fn write_defined(out: &mut Vec<u8>, value: &DecodedValue, name: &str, schema: &Schema) {
    let def = schema
        .type_def(name)
        .unwrap_or_else(|| panic!("type `{name}` not in schema"));
    match (&def.kind, value) {
        (TypeDefKind::Struct { fields }, DecodedValue::Struct(values)) => {
            for (field, (_, value)) in fields.iter().zip(values) {
                write_value(out, value, &field.ty, schema);
            }
        }
        (TypeDefKind::Enum { variants, tag_size }, DecodedValue::Enum { variant, fields }) => {
            let tag = variants
                .iter()
                .position(|v| &v.name == variant)
                .unwrap_or_else(|| panic!("unknown variant `{variant}`"));
            match tag_size {
                2 => out.extend(borsh_bytes(&(tag as u16))),
                4 => out.extend(borsh_bytes(&(tag as u32))),
                _ => out.push(tag as u8),
            }
            if let Some(DecodedValue::Struct(values)) = fields.as_deref() {
                for (field, (_, value)) in variants[tag].fields.iter().zip(values) {
                    write_value(out, value, &field.ty, schema);
                }
            }
        }
        (_, value) => panic!("cannot encode {value:?} as `{name}`"),
    }
}
