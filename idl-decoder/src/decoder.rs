//! Entry point tying a schema resolver to a decoder configuration.

use solana_pubkey::Pubkey;

use crate::{
    account::{decode_account_base64, decode_account_data},
    config::DecoderConfig,
    core::{AccountDecodeResult, CpiEventProbe, DecodeResult, DecodedAccount, DecodedEvent},
    event::probe_cpi_event,
    instruction::{attach_account_roles, decode_instruction},
    logs::extract_log_events,
    registry::{SchemaRegistry, SchemaResolver},
    transaction::{decode_transaction, RawTransaction},
    types::DecodedTransaction,
};

/// Decodes instructions, accounts, events and whole transactions for every
/// program known to `R`.
///
/// All methods take `&self`; one decoder can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct IdlDecoder<R = SchemaRegistry> {
    resolver: R,
    config: DecoderConfig,
}

impl<R: SchemaResolver> IdlDecoder<R> {
    pub fn new(resolver: R, config: DecoderConfig) -> Self {
        Self { resolver, config }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a base58 instruction payload sent to `program_id`.
    pub fn decode_instruction(&self, program_id: &Pubkey, data: &str) -> DecodeResult {
        decode_instruction(
            program_id,
            data,
            self.resolver.resolve_schema(program_id),
            &self.config,
        )
    }

    /// Resolve `account_indices` against `account_keys` and attach the roles
    /// of the instruction named in `decoded`.
    pub fn instruction_accounts(
        &self,
        program_id: &Pubkey,
        decoded: &DecodeResult,
        account_indices: &[u8],
        account_keys: &[Pubkey],
    ) -> Vec<DecodedAccount> {
        let instruction = self
            .resolver
            .resolve_schema(program_id)
            .zip(decoded.name.as_deref())
            .and_then(|(schema, name)| schema.instruction_by_name(name));
        attach_account_roles(
            instruction,
            account_indices,
            account_keys,
            &self.config.account_labels,
        )
    }

    pub fn decode_account(&self, owner: &Pubkey, data: &[u8]) -> AccountDecodeResult {
        decode_account_data(owner, data, self.resolver.resolve_schema(owner), &self.config)
    }

    pub fn decode_account_base64(&self, owner: &Pubkey, data: &str) -> AccountDecodeResult {
        decode_account_base64(owner, data, self.resolver.resolve_schema(owner), &self.config)
    }

    pub fn probe_cpi_event(&self, program_id: &Pubkey, data: &str) -> CpiEventProbe {
        probe_cpi_event(
            program_id,
            data,
            self.resolver.resolve_schema(program_id),
            &self.config,
        )
    }

    pub fn extract_log_events<S: AsRef<str>>(&self, logs: &[S]) -> Vec<DecodedEvent> {
        extract_log_events(logs, &self.resolver, &self.config)
    }

    pub fn decode_transaction(&self, raw: &RawTransaction) -> DecodedTransaction {
        decode_transaction(raw, &self.resolver, &self.config)
    }

    pub fn program_name(&self, program_id: &Pubkey) -> String {
        self.resolver.program_name(program_id, &self.config.known_programs)
    }
}
