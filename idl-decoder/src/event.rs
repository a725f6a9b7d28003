//! Event payload classification and the CPI event probe.
//!
//! Events reach a transaction two ways: base64 `Program data:` log lines and
//! self-invoked "event instructions" whose payload is an 8-byte instruction
//! tag followed by the event discriminator and fields.

use solana_pubkey::Pubkey;
use tracing::{debug, trace};

use crate::codec::decode_struct;
use crate::config::DecoderConfig;
use crate::core::{CpiEventProbe, EventDecode};
use crate::error::DecodeError;
use crate::instruction::{known_discriminators, DISCRIMINATOR_LEN};
use crate::schema::{EventDef, Schema};
use crate::value::DecodedValue;

/// Smallest CPI payload that can carry an event: instruction tag + event discriminator.
pub const MIN_CPI_EVENT_LEN: usize = 2 * DISCRIMINATOR_LEN;

/// Instruction tag Anchor puts in front of `emit_cpi!` self-invocations.
pub const EVENT_IX_TAG: [u8; 8] = [0xe4, 0x45, 0xa5, 0x2e, 0x51, 0xcb, 0x9a, 0x1d];

/// How an event payload relates to a schema's event definitions.
#[derive(Debug, Clone, PartialEq)]
pub enum EventMatch<'s> {
    Decoded { def: &'s EventDef, data: DecodedValue },
    /// Discriminator matched; the fields did not decode.
    Failed { def: &'s EventDef, detail: String },
    Unmatched { discriminator: Vec<u8> },
}

/// Match `payload` (event discriminator followed by fields) against `schema`.
pub fn match_event<'s>(
    schema: &'s Schema,
    payload: &[u8],
    config: &DecoderConfig,
) -> EventMatch<'s> {
    let discriminator = &payload[..payload.len().min(DISCRIMINATOR_LEN)];
    let Some(def) = schema.event_by_discriminator(discriminator) else {
        return EventMatch::Unmatched {
            discriminator: discriminator.to_vec(),
        };
    };
    match decode_struct(
        schema,
        &def.fields,
        &payload[DISCRIMINATOR_LEN..],
        config.max_type_depth,
    ) {
        Ok((data, _)) => EventMatch::Decoded { def, data },
        Err(e) => EventMatch::Failed {
            def,
            detail: e.to_string(),
        },
    }
}

/// Decode a log-embedded event payload for `program_id`.
///
/// Produces exactly one of: decoded, matched but failed, unmatched, or
/// unbound (no diagnostic).
pub fn decode_log_event(
    program_id: &Pubkey,
    payload: &[u8],
    schema: Option<&Schema>,
    config: &DecoderConfig,
) -> EventDecode {
    let Some(schema) = schema else {
        trace!(%program_id, "event from program without schema");
        return EventDecode::default();
    };
    match match_event(schema, payload, config) {
        EventMatch::Decoded { def, data } => EventDecode {
            name: Some(def.name.clone()),
            data: Some(data),
            decode_error: None,
        },
        EventMatch::Failed { def, detail } => {
            let error = DecodeError::StructuralDecodeFailure {
                name: def.name.clone(),
                detail: config.bound_detail(&detail),
            };
            debug!(%program_id, "{error}");
            EventDecode {
                name: Some(def.name.clone()),
                data: None,
                decode_error: Some(error.to_string()),
            }
        }
        EventMatch::Unmatched { discriminator } => {
            let error = DecodeError::DiscriminatorMismatch {
                discriminator: hex::encode(&discriminator),
                schema: schema.name.clone(),
                known: known_discriminators(
                    schema
                        .events
                        .iter()
                        .map(|ev| (ev.name.as_str(), &ev.discriminator[..])),
                    config.max_known_discriminators,
                ),
            };
            debug!(%program_id, "{error}");
            EventDecode {
                decode_error: Some(error.to_string()),
                ..EventDecode::default()
            }
        }
    }
}

/// Probe a base58 inner-instruction payload for an embedded event.
///
/// Anything that cannot be an event of the bound schema yields
/// [`CpiEventProbe::NotAnEvent`] so the caller can treat it as an ordinary
/// instruction.
pub fn probe_cpi_event(
    program_id: &Pubkey,
    data: &str,
    schema: Option<&Schema>,
    config: &DecoderConfig,
) -> CpiEventProbe {
    let Ok(bytes) = bs58::decode(data).into_vec() else {
        return CpiEventProbe::NotAnEvent;
    };
    probe_cpi_event_bytes(program_id, &bytes, schema, config)
}

pub fn probe_cpi_event_bytes(
    program_id: &Pubkey,
    bytes: &[u8],
    schema: Option<&Schema>,
    config: &DecoderConfig,
) -> CpiEventProbe {
    if bytes.len() < MIN_CPI_EVENT_LEN {
        return CpiEventProbe::NotAnEvent;
    }
    let Some(schema) = schema.filter(|schema| !schema.events.is_empty()) else {
        return CpiEventProbe::NotAnEvent;
    };
    match match_event(schema, &bytes[DISCRIMINATOR_LEN..], config) {
        EventMatch::Unmatched { .. } => CpiEventProbe::NotAnEvent,
        EventMatch::Decoded { def, data } => {
            debug!(%program_id, event = %def.name, "decoded CPI event");
            CpiEventProbe::Event(EventDecode {
                name: Some(def.name.clone()),
                data: Some(data),
                decode_error: None,
            })
        }
        EventMatch::Failed { def, detail } => {
            debug!(%program_id, event = %def.name, %detail, "CPI event fields did not decode");
            CpiEventProbe::Event(EventDecode {
                name: Some(def.name.clone()),
                data: None,
                decode_error: Some(
                    DecodeError::EventDecodeFailure {
                        name: def.name.clone(),
                    }
                    .to_string(),
                ),
            })
        }
    }
}
