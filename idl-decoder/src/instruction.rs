//! Instruction payload decoding and account-role attachment.

use solana_pubkey::Pubkey;
use tracing::{debug, trace};

use crate::codec::decode_struct;
use crate::config::{AccountLabels, DecoderConfig};
use crate::core::{DecodeResult, DecodedAccount};
use crate::error::DecodeError;
use crate::schema::{AccountItem, InstructionDef, Schema};

/// Length of every instruction / account / event discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Decode a base58 instruction payload against the schema bound to `program_id`.
///
/// Never fails: every problem is reported through [`DecodeResult::decode_error`].
pub fn decode_instruction(
    program_id: &Pubkey,
    data: &str,
    schema: Option<&Schema>,
    config: &DecoderConfig,
) -> DecodeResult {
    let bytes = match bs58::decode(data).into_vec() {
        Ok(bytes) => bytes,
        Err(e) => {
            trace!(%program_id, error = %e, "instruction data is not base58");
            return DecodeResult {
                decode_error: Some(DecodeError::BadEncoding(e.to_string()).to_string()),
                ..DecodeResult::unparsed(data)
            };
        }
    };
    let Some(schema) = schema else {
        trace!("{}", DecodeError::NoSchemaBound(*program_id));
        return DecodeResult::unparsed(data);
    };
    decode_instruction_bytes(&bytes, schema, config, data)
}

/// Decode already-decoded instruction bytes; `raw` is kept for display.
pub fn decode_instruction_bytes(
    bytes: &[u8],
    schema: &Schema,
    config: &DecoderConfig,
    raw: &str,
) -> DecodeResult {
    let mut result = DecodeResult {
        has_schema: true,
        ..DecodeResult::unparsed(raw)
    };
    let discriminator = &bytes[..bytes.len().min(DISCRIMINATOR_LEN)];

    let Some(def) = schema.instruction_by_discriminator(discriminator) else {
        let error = DecodeError::DiscriminatorMismatch {
            discriminator: hex::encode(discriminator),
            schema: schema.name.clone(),
            known: known_discriminators(
                schema
                    .instructions
                    .iter()
                    .map(|ix| (ix.name.as_str(), &ix.discriminator[..])),
                config.max_known_discriminators,
            ),
        };
        debug!(schema = %schema.name, "{error}");
        result.decode_error = Some(error.to_string());
        return result;
    };

    result.name = Some(def.name.clone());
    match decode_struct(
        schema,
        &def.args,
        &bytes[DISCRIMINATOR_LEN..],
        config.max_type_depth,
    ) {
        Ok((data, _)) => result.data = Some(data),
        Err(e) => {
            let error = DecodeError::StructuralDecodeFailure {
                name: def.name.clone(),
                detail: config.bound_detail(&e.to_string()),
            };
            debug!(schema = %schema.name, "{error}");
            result.decode_error = Some(error.to_string());
        }
    }
    result
}

/// Render up to `max` `name:hex` pairs for a discriminator-mismatch diagnostic.
pub(crate) fn known_discriminators<'a>(
    entries: impl Iterator<Item = (&'a str, &'a [u8])>,
    max: usize,
) -> String {
    entries
        .take(max)
        .map(|(name, discriminator)| format!("{name}:{}", hex::encode(discriminator)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the accounts of an instruction and attach schema-declared roles.
///
/// Roles are matched strictly by position in the instruction's top-level
/// account list; nested groups are not expanded. A group at a given position
/// contributes only its name.
pub fn attach_account_roles(
    instruction: Option<&InstructionDef>,
    account_indices: &[u8],
    account_keys: &[Pubkey],
    labels: &AccountLabels,
) -> Vec<DecodedAccount> {
    account_indices
        .iter()
        .enumerate()
        .map(|(position, &index)| {
            let pubkey = account_keys
                .get(index as usize)
                .copied()
                .unwrap_or_default();
            let mut account = DecodedAccount::new(pubkey);
            account.label = labels.get(&pubkey).map(str::to_string);
            match instruction.and_then(|ix| ix.accounts.get(position)) {
                Some(AccountItem::Role(role)) => {
                    account.name = Some(role.name.clone());
                    account.is_signer = Some(role.signer);
                    account.is_writable = Some(role.writable);
                }
                Some(AccountItem::Group(group)) => {
                    account.name = Some(group.name.clone());
                    account.is_signer = Some(false);
                    account.is_writable = Some(false);
                }
                None => {}
            }
            account
        })
        .collect()
}
