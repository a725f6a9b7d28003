//! Type definitions for the decoded transaction view.
//!
//! These types are produced by [`crate::transaction::decode_transaction`] and
//! consumed by the formatter and snapshot helpers. They carry no references
//! into the registry and can outlive it.

use solana_pubkey::Pubkey;

use crate::core::{DecodeResult, DecodedAccount, DecodedEvent};

/// Decoded transaction: instruction tree plus every recovered event.
#[derive(Debug, Clone)]
pub struct DecodedTransaction {
    pub signature: String,
    pub slot: u64,
    pub status: TransactionStatus,
    pub fee: u64,
    pub compute_used: u64,
    pub instructions: Vec<DecodedInstructionLog>,
    /// Log events first, then CPI events.
    pub events: Vec<DecodedEvent>,
    pub program_logs: Vec<String>,
}

impl DecodedTransaction {
    /// Create a new empty transaction with basic info
    pub fn new(signature: impl Into<String>, slot: u64) -> Self {
        Self {
            signature: signature.into(),
            slot,
            status: TransactionStatus::Unknown,
            fee: 0,
            compute_used: 0,
            instructions: Vec::new(),
            events: Vec::new(),
            program_logs: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TransactionStatus::Failed(_))
    }
}

/// Transaction execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Failed(String),
    Unknown,
}

impl TransactionStatus {
    pub fn text(&self) -> String {
        match self {
            TransactionStatus::Success => "Success".to_string(),
            TransactionStatus::Failed(err) => format!("Failed: {}", err),
            TransactionStatus::Unknown => "Unknown".to_string(),
        }
    }
}

/// One decoded instruction with its nested inner instructions.
#[derive(Debug, Clone)]
pub struct DecodedInstructionLog {
    pub index: usize,
    pub program_id: Pubkey,
    pub program_name: String,
    pub accounts: Vec<DecodedAccount>,
    pub decoded: DecodeResult,
    /// Set when this inner instruction carried an embedded event.
    pub cpi_event: Option<String>,
    pub inner_instructions: Vec<DecodedInstructionLog>,
    pub depth: usize,
}

impl DecodedInstructionLog {
    pub fn new(
        index: usize,
        program_id: Pubkey,
        program_name: String,
        decoded: DecodeResult,
    ) -> Self {
        Self {
            index,
            program_id,
            program_name,
            accounts: Vec::new(),
            decoded,
            cpi_event: None,
            inner_instructions: Vec::new(),
            depth: 0,
        }
    }

    pub fn instruction_name(&self) -> Option<&str> {
        self.decoded.name.as_deref()
    }

    /// Find parent instruction at target depth for nesting
    pub fn find_parent_for_instruction(
        instructions: &mut [DecodedInstructionLog],
        target_depth: usize,
    ) -> Option<&mut DecodedInstructionLog> {
        for instruction in instructions.iter_mut().rev() {
            if instruction.depth == target_depth {
                return Some(instruction);
            }
            if let Some(parent) =
                Self::find_parent_for_instruction(&mut instruction.inner_instructions, target_depth)
            {
                return Some(parent);
            }
        }
        None
    }
}
