//! Schema-driven decoder for Solana program data.
//!
//! This crate provides:
//! - Schema import and normalization for legacy and modern Anchor IDL documents
//! - A schema registry binding schemas to program addresses
//! - Instruction, account data and event decoding driven by the bound schema
//! - Event extraction from program logs and from CPI event instructions
//! - A decoded transaction view with text formatting and file logging
//!
//! Decode operations never fail: problems are reported as a diagnostic string
//! on the returned value.

pub use solana_pubkey;

pub mod account;
pub mod codec;
pub mod config;
mod core;
pub mod decoder;
pub mod error;
pub mod event;
pub mod formatter;
pub mod instruction;
pub mod logs;
pub mod registry;
pub mod schema;
pub mod transaction;
pub mod types;
pub mod value;

pub use account::{decode_account_base64, decode_account_data};
pub use config::{AccountLabels, DecoderConfig, KnownPrograms, LogVerbosity};
pub use crate::core::{
    AccountDecodeResult, CpiEventProbe, DecodeResult, DecodedAccount, DecodedEvent, DecodedField,
    EventDecode,
};
pub use decoder::IdlDecoder;
pub use error::{DecodeError, FieldDecodeError, RegistryError, SchemaError};
pub use event::probe_cpi_event;
pub use formatter::{Colors, TransactionFormatter};
pub use instruction::{attach_account_roles, decode_instruction};
pub use logs::extract_log_events;
pub use registry::{is_valid_address, SchemaBinding, SchemaRegistry, SchemaResolver};
pub use schema::{
    detect, import_schema, import_schema_str, normalize, validate, Schema, SchemaGeneration,
};
pub use transaction::{
    decode_transaction, strip_ansi_codes, write_to_log_file, RawTransaction, TransactionLogger,
};
pub use types::{DecodedInstructionLog, DecodedTransaction, TransactionStatus};
pub use value::DecodedValue;
