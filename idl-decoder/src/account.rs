//! Account data decoding by brute force over a schema's account types.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_pubkey::Pubkey;
use tracing::{debug, trace};

use crate::codec::decode_struct;
use crate::config::DecoderConfig;
use crate::core::AccountDecodeResult;
use crate::error::DecodeError;
use crate::instruction::DISCRIMINATOR_LEN;
use crate::schema::{AccountTypeDef, Schema};
use crate::value::DecodedValue;

/// Decode raw account bytes owned by `program_id`.
///
/// Account types are tried in declaration order and the first one that
/// decodes wins. When none does, the result is empty and carries no
/// diagnostic; [`AccountDecodeResult::has_schema`] still tells the two
/// empty cases apart.
pub fn decode_account_data(
    program_id: &Pubkey,
    data: &[u8],
    schema: Option<&Schema>,
    config: &DecoderConfig,
) -> AccountDecodeResult {
    let Some(schema) = schema else {
        trace!("{}", DecodeError::NoSchemaBound(*program_id));
        return AccountDecodeResult::empty(false);
    };
    for account_type in &schema.accounts {
        if let Some(decoded) = try_account_type(schema, account_type, data, config) {
            debug!(%program_id, account_type = %account_type.name, "decoded account data");
            return AccountDecodeResult {
                account_type: Some(account_type.name.clone()),
                data: Some(decoded),
                has_schema: true,
            };
        }
    }
    trace!(%program_id, schema = %schema.name, "no account type matched");
    AccountDecodeResult::empty(true)
}

/// Decode a base64 account payload as returned by RPC `getAccountInfo`.
pub fn decode_account_base64(
    program_id: &Pubkey,
    data: &str,
    schema: Option<&Schema>,
    config: &DecoderConfig,
) -> AccountDecodeResult {
    match STANDARD.decode(data.trim()) {
        Ok(bytes) => decode_account_data(program_id, &bytes, schema, config),
        Err(e) => {
            trace!(%program_id, error = %e, "account data is not base64");
            AccountDecodeResult::empty(schema.is_some())
        }
    }
}

fn try_account_type(
    schema: &Schema,
    account_type: &AccountTypeDef,
    data: &[u8],
    config: &DecoderConfig,
) -> Option<DecodedValue> {
    // Types without a discriminator are laid out from the first byte.
    let body = match &account_type.discriminator {
        Some(discriminator) if data.starts_with(discriminator) => &data[DISCRIMINATOR_LEN..],
        Some(_) => return None,
        None => data,
    };
    decode_struct(schema, &account_type.fields, body, config.max_type_depth)
        .map(|(value, _)| value)
        .ok()
}
