//! # Static Token Registry
//!
//! Hand-curated fallback metadata for tokens whose standard ERC20 read
//! methods are absent, non-standard, or revert. The table is immutable after
//! startup: a fixed built-in list merged with any deployment-specific entries
//! from [`crate::config::ResolverSettings`], indexed by address.
//!
//! Total supply deliberately has no entry here; it resolves on-chain or
//! defaults to zero.

use std::str::FromStr;

use ahash::AHashMap;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{FieldValue, TokenField};

/// Immutable metadata tuple for a known non-standard token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticTokenDefinition {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Address-indexed table of static definitions, built once at startup.
#[derive(Debug)]
pub struct StaticTokenRegistry {
    definitions: Vec<StaticTokenDefinition>,
    index: AHashMap<Address, usize>,
}

impl StaticTokenRegistry {
    /// Registry holding only the built-in exceptions.
    pub fn builtin() -> Self {
        Self::from_definitions(builtin_definitions())
    }

    /// Built-in exceptions plus deployment-specific entries. A later entry
    /// for an already-known address replaces the earlier one.
    pub fn with_extra(extra: &[StaticTokenDefinition]) -> Self {
        let mut definitions = builtin_definitions();
        definitions.extend_from_slice(extra);
        Self::from_definitions(definitions)
    }

    /// Registry over exactly the given definitions.
    pub fn from_definitions(definitions: Vec<StaticTokenDefinition>) -> Self {
        let mut index = AHashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if let Some(previous) = index.insert(def.address, i) {
                debug!(
                    target: "token_metadata",
                    token = ?def.address,
                    replaced = ?definitions[previous].symbol,
                    by = ?def.symbol,
                    "Static token definition overridden"
                );
            }
        }
        Self { definitions, index }
    }

    /// Looks up the full definition for `address`.
    pub fn lookup(&self, address: Address) -> Option<&StaticTokenDefinition> {
        self.index.get(&address).map(|&i| &self.definitions[i])
    }

    /// Returns the static value for one field of `address`, if the registry
    /// can provide it. Total supply is never served statically.
    pub fn field(&self, address: Address, field: TokenField) -> Option<FieldValue> {
        let def = self.lookup(address)?;
        match field {
            TokenField::Symbol => Some(FieldValue::Symbol(def.symbol.clone())),
            TokenField::Name => Some(FieldValue::Name(def.name.clone())),
            TokenField::Decimals => Some(FieldValue::Decimals(def.decimals)),
            TokenField::TotalSupply => None,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Default for StaticTokenRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The fixed list of known exceptions.
fn builtin_definitions() -> Vec<StaticTokenDefinition> {
    vec![StaticTokenDefinition {
        address: Address::from_str("0x552791be94b679cd0cefb35c8ab0364973acb37f")
            .expect("Invalid built-in static token address"),
        symbol: "USDC.e".to_string(),
        name: "USDC.e".to_string(),
        decimals: 6,
    }]
}
