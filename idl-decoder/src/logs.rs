//! Event extraction from runtime log lines.
//!
//! The runtime prints `Program <id> invoke [depth]` when a program is entered
//! and `Program <id> success` / `Program <id> failed: ...` when it returns.
//! Tracking those lines as a stack attributes every `Program data:` line to
//! the program that emitted it and to its top-level instruction.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_pubkey::Pubkey;
use tracing::trace;

use crate::config::DecoderConfig;
use crate::core::{DecodedEvent, EventDecode};
use crate::error::DecodeError;
use crate::event::decode_log_event;
use crate::registry::SchemaResolver;

/// A recognised log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine<'a> {
    Invoke(Pubkey),
    Exit { program_id: Pubkey, success: bool },
    Data(&'a str),
    Other,
}

impl<'a> LogLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("Program") {
            return LogLine::Other;
        }
        let subject = tokens.next();
        if subject == Some("data:") {
            // A payload-less data line still emitted an event.
            return LogLine::Data(tokens.next().unwrap_or(""));
        }
        let (Some(subject), Some(verb)) = (subject, tokens.next()) else {
            return LogLine::Other;
        };
        let Ok(program_id) = Pubkey::from_str(subject) else {
            return LogLine::Other;
        };
        match verb {
            "invoke" => LogLine::Invoke(program_id),
            "success" => LogLine::Exit {
                program_id,
                success: true,
            },
            verb if verb.starts_with("failed") => LogLine::Exit {
                program_id,
                success: false,
            },
            _ => LogLine::Other,
        }
    }
}

/// Scanner state: the invocation stack and the top-level instruction counter.
#[derive(Debug, Default)]
pub struct LogScanner {
    stack: Vec<Pubkey>,
    instruction_index: usize,
}

impl LogScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the top-level instruction currently executing.
    pub fn instruction_index(&self) -> usize {
        self.instruction_index
    }

    pub fn current_program(&self) -> Option<&Pubkey> {
        self.stack.last()
    }

    /// Apply one line; returns the attributed payload for data lines.
    pub fn step<'a>(&mut self, line: &'a str) -> Option<(Pubkey, &'a str)> {
        match LogLine::parse(line) {
            LogLine::Invoke(program_id) => {
                self.stack.push(program_id);
                None
            }
            LogLine::Exit { success, .. } => {
                self.stack.pop();
                // A failing outermost invocation leaves the counter untouched.
                if self.stack.is_empty() && success {
                    self.instruction_index += 1;
                }
                None
            }
            LogLine::Data(payload) => match self.stack.last() {
                Some(program_id) => Some((*program_id, payload)),
                None => {
                    trace!("dropping data line outside any invocation");
                    None
                }
            },
            LogLine::Other => None,
        }
    }
}

/// Extract every event emitted in `logs`, in order.
pub fn extract_log_events<S, R>(
    logs: &[S],
    resolver: &R,
    config: &DecoderConfig,
) -> Vec<DecodedEvent>
where
    S: AsRef<str>,
    R: SchemaResolver + ?Sized,
{
    let mut scanner = LogScanner::new();
    let mut events = Vec::new();
    for line in logs {
        let Some((program_id, payload)) = scanner.step(line.as_ref()) else {
            continue;
        };
        let decoded = match STANDARD.decode(payload) {
            Ok(bytes) => decode_log_event(
                &program_id,
                &bytes,
                resolver.resolve_schema(&program_id),
                config,
            ),
            Err(e) => EventDecode {
                decode_error: Some(DecodeError::BadEncoding(e.to_string()).to_string()),
                ..EventDecode::default()
            },
        };
        events.push(decoded.into_event(program_id, scanner.instruction_index(), false));
    }
    events
}
