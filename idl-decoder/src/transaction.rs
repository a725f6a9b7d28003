//! Transaction decoding, transaction logging, and snapshot testing.
//!
//! Provides:
//! - [`RawTransaction`] -- the RPC `json` transaction encoding
//! - [`decode_transaction`] -- decode a transaction into a [`DecodedTransaction`]
//! - [`TransactionLogger`] -- decode, format, and log in one call
//! - Snapshot types for insta JSON testing
//! - File logging to `target/idl_decoder.log` (ANSI-stripped)

use std::{
    fs::{self, OpenOptions},
    io::Write,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Once,
    },
};

use serde::{Deserialize, Deserializer, Serialize};
use solana_pubkey::Pubkey;

use crate::{
    config::DecoderConfig,
    core::{CpiEventProbe, DecodeResult, DecodedEvent},
    event::probe_cpi_event,
    formatter::TransactionFormatter,
    instruction::{attach_account_roles, decode_instruction},
    logs::extract_log_events,
    registry::SchemaResolver,
    types::{DecodedInstructionLog, DecodedTransaction, TransactionStatus},
};

// ---------------------------------------------------------------------------
// RPC input shape
// ---------------------------------------------------------------------------

/// A transaction as returned by `getTransaction` with `"encoding": "json"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub slot: u64,
    pub transaction: RawTransactionBody,
    #[serde(default)]
    pub meta: Option<RawMeta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: RawMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(deserialize_with = "deserialize_pubkeys")]
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<RawInstruction>,
}

/// A compiled instruction; `data` is base58.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    pub program_id_index: u8,
    #[serde(default)]
    pub accounts: Vec<u8>,
    pub data: String,
    #[serde(default)]
    pub stack_height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeta {
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub compute_units_consumed: Option<u64>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<RawInnerInstructions>>,
    #[serde(default)]
    pub log_messages: Option<Vec<String>>,
    #[serde(default)]
    pub loaded_addresses: Option<RawLoadedAddresses>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInnerInstructions {
    /// Index of the top-level instruction these were invoked from.
    pub index: usize,
    pub instructions: Vec<RawInstruction>,
}

/// Addresses loaded from lookup tables, appended after the static keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLoadedAddresses {
    #[serde(default, deserialize_with = "deserialize_pubkeys")]
    pub writable: Vec<Pubkey>,
    #[serde(default, deserialize_with = "deserialize_pubkeys")]
    pub readonly: Vec<Pubkey>,
}

impl RawTransaction {
    /// Parse the JSON text of an RPC transaction response.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Full account table: static keys, then loaded writable, then loaded readonly.
    pub fn account_keys(&self) -> Vec<Pubkey> {
        let mut keys = self.transaction.message.account_keys.clone();
        if let Some(loaded) = self.meta.as_ref().and_then(|m| m.loaded_addresses.as_ref()) {
            keys.extend_from_slice(&loaded.writable);
            keys.extend_from_slice(&loaded.readonly);
        }
        keys
    }

    pub fn status(&self) -> TransactionStatus {
        match self.meta.as_ref().map(|meta| meta.err.as_ref()) {
            None => TransactionStatus::Unknown,
            Some(None) => TransactionStatus::Success,
            Some(Some(err)) => TransactionStatus::Failed(err.to_string()),
        }
    }
}

fn deserialize_pubkeys<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Pubkey>, D::Error> {
    let keys = Vec::<String>::deserialize(deserializer)?;
    keys.iter()
        .map(|key| Pubkey::from_str(key).map_err(serde::de::Error::custom))
        .collect()
}

// ---------------------------------------------------------------------------
// Transaction decoding
// ---------------------------------------------------------------------------

/// Decode every instruction, inner instruction and event of a transaction.
///
/// Log events come first in [`DecodedTransaction::events`], followed by CPI
/// events in inner-instruction order.
pub fn decode_transaction<R: SchemaResolver + ?Sized>(
    raw: &RawTransaction,
    resolver: &R,
    config: &DecoderConfig,
) -> DecodedTransaction {
    let account_keys = raw.account_keys();
    let signature = raw
        .transaction
        .signatures
        .first()
        .cloned()
        .unwrap_or_default();

    let mut log = DecodedTransaction::new(signature, raw.slot);
    log.status = raw.status();
    if let Some(meta) = &raw.meta {
        log.fee = meta.fee;
        log.compute_used = meta.compute_units_consumed.unwrap_or_default();
        log.program_logs = meta.log_messages.clone().unwrap_or_default();
    }

    let mut cpi_events = Vec::new();
    for (ix_index, compiled_ix) in raw.transaction.message.instructions.iter().enumerate() {
        let mut ix_log = decode_compiled(ix_index, compiled_ix, &account_keys, resolver, config);
        ix_log.depth = 0;

        let inner_ixs = raw
            .meta
            .as_ref()
            .and_then(|m| m.inner_instructions.as_ref())
            .and_then(|sets| sets.iter().find(|set| set.index == ix_index));
        if let Some(inner_ixs) = inner_ixs {
            parse_inner_instructions(
                &inner_ixs.instructions,
                &account_keys,
                resolver,
                config,
                &mut ix_log,
                &mut cpi_events,
            );
        }

        log.instructions.push(ix_log);
    }

    log.events = extract_log_events(&log.program_logs, resolver, config);
    log.events.extend(cpi_events);
    log
}

/// Format a decoded transaction into a human-readable string.
pub fn format_transaction(
    log: &DecodedTransaction,
    config: &DecoderConfig,
    tx_number: usize,
) -> String {
    let formatter = TransactionFormatter::new(config);
    formatter.format(log, tx_number)
}

fn decode_compiled<R: SchemaResolver + ?Sized>(
    index: usize,
    compiled_ix: &RawInstruction,
    account_keys: &[Pubkey],
    resolver: &R,
    config: &DecoderConfig,
) -> DecodedInstructionLog {
    let program_id = program_at(compiled_ix, account_keys);
    let schema = resolver.resolve_schema(&program_id);
    let decoded = decode_instruction(&program_id, &compiled_ix.data, schema, config);
    instruction_log(index, compiled_ix, account_keys, program_id, decoded, resolver, config)
}

fn program_at(compiled_ix: &RawInstruction, account_keys: &[Pubkey]) -> Pubkey {
    account_keys
        .get(compiled_ix.program_id_index as usize)
        .copied()
        .unwrap_or_default()
}

fn instruction_log<R: SchemaResolver + ?Sized>(
    index: usize,
    compiled_ix: &RawInstruction,
    account_keys: &[Pubkey],
    program_id: Pubkey,
    decoded: DecodeResult,
    resolver: &R,
    config: &DecoderConfig,
) -> DecodedInstructionLog {
    let program_name = resolver.program_name(&program_id, &config.known_programs);
    let instruction = resolver
        .resolve_schema(&program_id)
        .zip(decoded.name.as_deref())
        .and_then(|(schema, name)| schema.instruction_by_name(name));
    let accounts = attach_account_roles(
        instruction,
        &compiled_ix.accounts,
        account_keys,
        &config.account_labels,
    );

    let mut ix_log = DecodedInstructionLog::new(index, program_id, program_name, decoded);
    ix_log.accounts = accounts;
    ix_log
}

/// Parse inner (CPI) instructions and attach them to the parent instruction log.
fn parse_inner_instructions<R: SchemaResolver + ?Sized>(
    inner_ixs: &[RawInstruction],
    account_keys: &[Pubkey],
    resolver: &R,
    config: &DecoderConfig,
    parent: &mut DecodedInstructionLog,
    cpi_events: &mut Vec<DecodedEvent>,
) {
    for (inner_idx, inner_ix) in inner_ixs.iter().enumerate() {
        let program_id = program_at(inner_ix, account_keys);
        let schema = resolver.resolve_schema(&program_id);
        let mut ix_log = match probe_cpi_event(&program_id, &inner_ix.data, schema, config) {
            CpiEventProbe::Event(event) => {
                // An event carrier is not interpreted as an instruction call.
                let carrier = DecodeResult {
                    has_schema: schema.is_some(),
                    ..DecodeResult::unparsed(inner_ix.data.clone())
                };
                let mut ix_log = instruction_log(
                    inner_idx,
                    inner_ix,
                    account_keys,
                    program_id,
                    carrier,
                    resolver,
                    config,
                );
                ix_log.cpi_event = event.name.clone();
                cpi_events.push(event.into_event(program_id, parent.index, true));
                ix_log
            }
            CpiEventProbe::NotAnEvent => {
                decode_compiled(inner_idx, inner_ix, account_keys, resolver, config)
            }
        };

        let depth = (inner_ix.stack_height.unwrap_or(2) as usize).saturating_sub(1);
        ix_log.depth = depth;

        if depth <= 1 {
            parent.inner_instructions.push(ix_log);
        } else {
            let target_depth = depth - 1;
            if let Some(nested_parent) = DecodedInstructionLog::find_parent_for_instruction(
                &mut parent.inner_instructions,
                target_depth,
            ) {
                nested_parent.inner_instructions.push(ix_log);
            } else {
                parent.inner_instructions.push(ix_log);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot types (JSON-serializable for insta)
// ---------------------------------------------------------------------------

/// JSON-serializable snapshot of an entire transaction.
#[derive(Debug, Serialize)]
pub struct TransactionSnapshot {
    pub signature: String,
    pub status: String,
    pub fee: u64,
    pub compute_used: u64,
    pub instructions: Vec<InstructionSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventSnapshot>,
}

/// JSON-serializable snapshot of a single instruction (including inner/CPI).
#[derive(Debug, Serialize)]
pub struct InstructionSnapshot {
    pub program_id: String,
    pub program_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    pub accounts: Vec<AccountSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_fields: Option<Vec<FieldSnapshot>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inner_instructions: Vec<InstructionSnapshot>,
}

/// JSON-serializable snapshot of an account reference within an instruction.
#[derive(Debug, Serialize)]
pub struct AccountSnapshot {
    pub pubkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// JSON-serializable snapshot of a decoded instruction field.
#[derive(Debug, Serialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub value: String,
}

/// JSON-serializable snapshot of a decoded event.
#[derive(Debug, Serialize)]
pub struct EventSnapshot {
    pub program_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    pub instruction_index: usize,
    pub is_cpi: bool,
}

/// Decode a transaction straight into a JSON-serializable snapshot.
pub fn decode_transaction_snapshot<R: SchemaResolver + ?Sized>(
    raw: &RawTransaction,
    resolver: &R,
    config: &DecoderConfig,
) -> TransactionSnapshot {
    let log = decode_transaction(raw, resolver, config);
    transaction_log_to_snapshot(&log)
}

/// Convert a [`DecodedTransaction`] into a [`TransactionSnapshot`].
pub fn transaction_log_to_snapshot(log: &DecodedTransaction) -> TransactionSnapshot {
    TransactionSnapshot {
        signature: log.signature.clone(),
        status: log.status.text(),
        fee: log.fee,
        compute_used: log.compute_used,
        instructions: log
            .instructions
            .iter()
            .map(instruction_to_snapshot)
            .collect(),
        events: log.events.iter().map(event_to_snapshot).collect(),
    }
}

fn instruction_to_snapshot(ix: &DecodedInstructionLog) -> InstructionSnapshot {
    let decoded_fields = ix.decoded.data.as_ref().map(|data| {
        data.to_fields()
            .into_iter()
            .map(|f| FieldSnapshot {
                name: f.name,
                value: f.value,
            })
            .collect()
    });

    let accounts: Vec<AccountSnapshot> = ix
        .accounts
        .iter()
        .map(|a| AccountSnapshot {
            pubkey: a.pubkey.to_string(),
            name: a.name.clone(),
            is_signer: a.is_signer.unwrap_or(false),
            is_writable: a.is_writable.unwrap_or(false),
        })
        .collect();

    InstructionSnapshot {
        program_id: ix.program_id.to_string(),
        program_name: ix.program_name.clone(),
        instruction_name: ix.decoded.name.clone(),
        decode_error: ix.decoded.decode_error.clone(),
        accounts,
        decoded_fields,
        inner_instructions: ix
            .inner_instructions
            .iter()
            .map(instruction_to_snapshot)
            .collect(),
    }
}

fn event_to_snapshot(event: &DecodedEvent) -> EventSnapshot {
    EventSnapshot {
        program_id: event.program_id.to_string(),
        name: event.name.clone(),
        data: event.data.as_ref().map(ToString::to_string),
        decode_error: event.decode_error.clone(),
        instruction_index: event.instruction_index,
        is_cpi: event.is_cpi,
    }
}

// ---------------------------------------------------------------------------
// File logging
// ---------------------------------------------------------------------------

static LOG_INIT: Once = Once::new();
static LOG_INIT_DONE: AtomicBool = AtomicBool::new(false);
const LOG_PATH: &str = "target/idl_decoder.log";

/// Strip ANSI escape codes from text.
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            result.push(c);
            continue;
        }
        // CSI sequences end at the first ASCII letter.
        if chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        }
    }
    result
}

/// Append ANSI-stripped content to `target/idl_decoder.log`.
///
/// The first call per process truncates the file; later calls append.
pub fn write_to_log_file(content: &str) {
    LOG_INIT.call_once(|| {
        let _ = fs::create_dir_all("target");
        let _ = fs::File::create(LOG_PATH);
        LOG_INIT_DONE.store(true, Ordering::Release);
    });

    while !LOG_INIT_DONE.load(Ordering::Acquire) {
        std::hint::spin_loop();
    }

    let stripped = strip_ansi_codes(content);
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(LOG_PATH) {
        if let Err(e) = f.write_all(stripped.as_bytes()) {
            tracing::warn!(path = LOG_PATH, error = %e, "failed to write transaction log");
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionLogger
// ---------------------------------------------------------------------------

/// Decodes, formats and logs transactions against one resolver.
///
/// # Example
/// ```ignore
/// let logger = TransactionLogger::new(registry, DecoderConfig::from_env());
/// let decoded = logger.log_transaction(&RawTransaction::from_json(&json)?);
/// ```
pub struct TransactionLogger<R> {
    resolver: R,
    config: DecoderConfig,
    counter: AtomicUsize,
}

impl<R: SchemaResolver> TransactionLogger<R> {
    pub fn new(resolver: R, config: DecoderConfig) -> Self {
        Self {
            resolver,
            config,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode, format, and log a transaction.
    ///
    /// Output always goes to the log file; stderr gets failed transactions,
    /// or every transaction when `log_events` is set.
    pub fn log_transaction(&self, raw: &RawTransaction) -> DecodedTransaction {
        let tx_number = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let log = decode_transaction(raw, &self.resolver, &self.config);
        let formatted = format_transaction(&log, &self.config, tx_number);

        write_to_log_file(&formatted);

        if self.config.log_events || log.is_failed() {
            eprint!("{}", formatted);
        }
        log
    }
}
