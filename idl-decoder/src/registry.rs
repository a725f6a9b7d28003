//! Schema registry: binds canonical schemas to program addresses.

use std::str::FromStr;
use std::sync::Arc;

use solana_pubkey::Pubkey;
use tracing::{debug, warn};

use crate::config::KnownPrograms;
use crate::error::RegistryError;
use crate::schema::Schema;

/// Resolves a program address to the schema used to decode its data.
pub trait SchemaResolver: Send + Sync {
    fn resolve_schema(&self, program_id: &Pubkey) -> Option<&Schema>;

    /// Human-readable program name.
    ///
    /// Prefers the bound schema's name, then the injected known-program table.
    fn program_name(&self, program_id: &Pubkey, known: &KnownPrograms) -> String {
        if let Some(schema) = self.resolve_schema(program_id) {
            return schema.name.clone();
        }
        if let Some(name) = known.get(program_id) {
            return name.to_string();
        }
        format!("Unknown Program ({program_id})")
    }
}

/// One schema and the addresses it is deployed at.
#[derive(Debug, Clone)]
pub struct SchemaBinding {
    pub schema: Arc<Schema>,
    pub addresses: Vec<Pubkey>,
}

impl SchemaBinding {
    pub fn contains(&self, program_id: &Pubkey) -> bool {
        self.addresses.contains(program_id)
    }
}

/// Registry of schema bindings, resolved in registration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    bindings: Vec<SchemaBinding>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `schema` to a non-empty set of program addresses.
    ///
    /// An address already bound to an earlier schema keeps resolving to that
    /// earlier schema.
    pub fn bind(
        &mut self,
        schema: impl Into<Arc<Schema>>,
        addresses: impl IntoIterator<Item = Pubkey>,
    ) -> Result<(), RegistryError> {
        let schema = schema.into();
        let mut unique: Vec<Pubkey> = Vec::new();
        for address in addresses {
            if !unique.contains(&address) {
                unique.push(address);
            }
        }
        if unique.is_empty() {
            return Err(RegistryError::NoAddresses(schema.name.clone()));
        }
        for address in &unique {
            if let Some(existing) = self.resolve(address) {
                warn!(
                    %address,
                    existing = %existing.name,
                    ignored = %schema.name,
                    "program already bound to another schema; first binding wins"
                );
            }
        }
        debug!(schema = %schema.name, addresses = unique.len(), "bound schema");
        self.bindings.push(SchemaBinding {
            schema,
            addresses: unique,
        });
        Ok(())
    }

    /// Bind `schema` to base58 addresses, validating each one.
    pub fn bind_strs(
        &mut self,
        schema: impl Into<Arc<Schema>>,
        addresses: &[&str],
    ) -> Result<(), RegistryError> {
        let parsed = addresses
            .iter()
            .map(|address| parse_address(address))
            .collect::<Result<Vec<_>, _>>()?;
        self.bind(schema, parsed)
    }

    /// First schema, in registration order, bound to `program_id`.
    pub fn resolve(&self, program_id: &Pubkey) -> Option<&Schema> {
        self.bindings
            .iter()
            .find(|binding| binding.contains(program_id))
            .map(|binding| binding.schema.as_ref())
    }

    pub fn has_schema(&self, program_id: &Pubkey) -> bool {
        self.resolve(program_id).is_some()
    }

    pub fn bindings(&self) -> &[SchemaBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl SchemaResolver for SchemaRegistry {
    fn resolve_schema(&self, program_id: &Pubkey) -> Option<&Schema> {
        self.resolve(program_id)
    }
}

impl<T: SchemaResolver + ?Sized> SchemaResolver for Arc<T> {
    fn resolve_schema(&self, program_id: &Pubkey) -> Option<&Schema> {
        (**self).resolve_schema(program_id)
    }
}

/// Base58 alphabet, 32 to 44 characters, decoding to exactly 32 bytes.
pub fn is_valid_address(address: &str) -> bool {
    (32..=44).contains(&address.len())
        && bs58::decode(address)
            .into_vec()
            .is_ok_and(|bytes| bytes.len() == 32)
}

fn parse_address(address: &str) -> Result<Pubkey, RegistryError> {
    if !is_valid_address(address) {
        return Err(RegistryError::InvalidAddress(address.to_string()));
    }
    Pubkey::from_str(address).map_err(|_| RegistryError::InvalidAddress(address.to_string()))
}
