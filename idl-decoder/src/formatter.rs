//! Human-readable rendering of decoded transactions.

use std::fmt::Write as _;

use tabled::{settings::Style, Table, Tabled};

use crate::{
    config::{DecoderConfig, LogVerbosity},
    core::{DecodedAccount, DecodedEvent, DecodedField},
    types::{DecodedInstructionLog, DecodedTransaction, TransactionStatus},
};

/// ANSI color codes; all empty when colors are disabled.
#[derive(Debug, Clone, Copy)]
pub struct Colors {
    pub reset: &'static str,
    pub bold: &'static str,
    pub dim: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub blue: &'static str,
    pub cyan: &'static str,
}

impl Colors {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self::enabled()
        } else {
            Self::disabled()
        }
    }

    pub fn enabled() -> Self {
        Self {
            reset: "\x1b[0m",
            bold: "\x1b[1m",
            dim: "\x1b[2m",
            red: "\x1b[31m",
            green: "\x1b[32m",
            yellow: "\x1b[33m",
            blue: "\x1b[34m",
            cyan: "\x1b[36m",
        }
    }

    pub fn disabled() -> Self {
        Self {
            reset: "",
            bold: "",
            dim: "",
            red: "",
            green: "",
            yellow: "",
            blue: "",
            cyan: "",
        }
    }
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Account")]
    pubkey: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Access")]
    access: &'static str,
    #[tabled(rename = "Label")]
    label: String,
}

impl AccountRow {
    fn new(position: usize, account: &DecodedAccount) -> Self {
        let access = match (account.is_signer, account.is_writable) {
            (Some(true), Some(true)) => "signer+writable",
            (Some(true), _) => "signer",
            (_, Some(true)) => "writable",
            (Some(false), Some(false)) => "readonly",
            _ => "-",
        };
        Self {
            position,
            pubkey: account.pubkey.to_string(),
            role: account.name.clone().unwrap_or_else(|| "-".to_string()),
            access,
            label: account.label.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Ix")]
    instruction_index: usize,
    #[tabled(rename = "Source")]
    source: &'static str,
    #[tabled(rename = "Program")]
    program: String,
    #[tabled(rename = "Event")]
    name: String,
    #[tabled(rename = "Data")]
    data: String,
}

impl EventRow {
    fn new(event: &DecodedEvent) -> Self {
        let data = match (&event.data, &event.decode_error) {
            (Some(data), _) => data.to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        Self {
            instruction_index: event.instruction_index,
            source: if event.is_cpi { "cpi" } else { "log" },
            program: event.program_id.to_string(),
            name: event.name.clone().unwrap_or_else(|| "unknown".to_string()),
            data,
        }
    }
}

/// Renders a [`DecodedTransaction`] as text.
pub struct TransactionFormatter<'a> {
    config: &'a DecoderConfig,
    colors: Colors,
}

impl<'a> TransactionFormatter<'a> {
    pub fn new(config: &'a DecoderConfig) -> Self {
        Self {
            config,
            colors: Colors::new(config.use_colors),
        }
    }

    pub fn format(&self, log: &DecodedTransaction, tx_number: usize) -> String {
        let c = self.colors;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{}{}=== Transaction #{} ==={}",
            c.bold, c.blue, tx_number, c.reset
        );
        let _ = writeln!(out, "Signature: {}", log.signature);
        let status_color = match log.status {
            TransactionStatus::Success => c.green,
            TransactionStatus::Failed(_) => c.red,
            TransactionStatus::Unknown => c.yellow,
        };
        let _ = writeln!(
            out,
            "Status: {}{}{} | Slot: {} | Fee: {} | Compute: {}",
            status_color,
            log.status.text(),
            c.reset,
            log.slot,
            log.fee,
            log.compute_used
        );

        let _ = writeln!(out, "{}Instructions ({}):{}", c.bold, log.instructions.len(), c.reset);
        for ix in &log.instructions {
            self.write_instruction(&mut out, ix);
        }

        if !log.events.is_empty() {
            let _ = writeln!(out, "{}Events ({}):{}", c.bold, log.events.len(), c.reset);
            let rows = log.events.iter().map(EventRow::new);
            let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()));
        }

        if self.config.verbosity == LogVerbosity::Detailed && !log.program_logs.is_empty() {
            let _ = writeln!(out, "{}Program logs:{}", c.bold, c.reset);
            for line in &log.program_logs {
                let _ = writeln!(out, "  {}{}{}", c.dim, line, c.reset);
            }
        }
        out.push('\n');
        out
    }

    fn write_instruction(&self, out: &mut String, ix: &DecodedInstructionLog) {
        let c = self.colors;
        let indent = "  ".repeat(ix.depth + 1);
        let name = ix.instruction_name().unwrap_or("unknown");
        let _ = write!(
            out,
            "{indent}{}#{}{} {}{}{}: {}{}{}",
            c.dim, ix.index, c.reset, c.cyan, ix.program_name, c.reset, c.bold, name, c.reset
        );
        if let Some(event) = &ix.cpi_event {
            let _ = write!(out, " {}(event {}){}", c.yellow, event, c.reset);
        }
        out.push('\n');

        if let Some(error) = &ix.decoded.decode_error {
            let _ = writeln!(out, "{indent}  {}{}{}", c.red, error, c.reset);
        }

        if self.config.verbosity != LogVerbosity::Brief {
            if !ix.accounts.is_empty() {
                let rows = ix
                    .accounts
                    .iter()
                    .enumerate()
                    .map(|(position, account)| AccountRow::new(position, account));
                let table = Table::new(rows).with(Style::rounded()).to_string();
                for line in table.lines() {
                    let _ = writeln!(out, "{indent}  {line}");
                }
            }
            if let Some(data) = &ix.decoded.data {
                for field in data.to_fields() {
                    write_field(out, &format!("{indent}  "), &field);
                }
            }
        }

        if self.config.verbosity == LogVerbosity::Detailed {
            let _ = writeln!(out, "{indent}  {}data: {}{}", c.dim, ix.decoded.raw, c.reset);
        }

        for inner in &ix.inner_instructions {
            self.write_instruction(out, inner);
        }
    }
}

fn write_field(out: &mut String, indent: &str, field: &DecodedField) {
    match (field.name.is_empty(), field.value.is_empty()) {
        (true, _) => {
            let _ = writeln!(out, "{indent}{}", field.value);
        }
        (false, true) => {
            let _ = writeln!(out, "{indent}{}:", field.name);
        }
        (false, false) => {
            let _ = writeln!(out, "{indent}{}: {}", field.name, field.value);
        }
    }
    let nested = format!("{indent}  ");
    for child in &field.children {
        write_field(out, &nested, child);
    }
}
