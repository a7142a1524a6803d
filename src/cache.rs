//! # Token Metadata Cache
//!
//! Process-wide, field-granular memoization keyed by token address. Created
//! empty at pipeline start, filled lazily, never evicted: the token universe
//! grows slowly relative to the volume of records that reference it.
//!
//! Writes are first-write-wins per (address, field): once any tier has
//! populated a field, including a terminal default, the value is stable for
//! the rest of the run.

use dashmap::DashMap;
use ethers::types::Address;
use tracing::trace;

use crate::types::{FieldValue, TokenField, TokenMetadata};

/// Cache over a sharded-lock map; shared between tasks behind an `Arc`.
#[derive(Debug, Default)]
pub struct TokenMetadataCache {
    records: DashMap<Address, TokenMetadata>,
}

/// Point-in-time cache occupancy, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub tokens: usize,
    pub symbols: usize,
    pub names: usize,
    pub decimals: usize,
    pub total_supplies: usize,
}

impl TokenMetadataCache {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Returns the cached value for `(address, field)`, if populated.
    pub fn get(&self, address: Address, field: TokenField) -> Option<FieldValue> {
        self.records.get(&address).and_then(|record| record.field(field))
    }

    /// Stores `value` for its field unless that field is already populated.
    ///
    /// Returns `true` when the value was written. Holding the shard entry for
    /// the whole check-and-fill gives read-your-writes for the key.
    pub fn put(&self, address: Address, value: FieldValue) -> bool {
        let field = value.field();
        let mut entry = self.records.entry(address).or_default();
        let wrote = entry.fill(value);
        if !wrote {
            trace!(
                target: "token_metadata",
                token = ?address,
                field = %field,
                "Ignored overwrite of populated cache field"
            );
        }
        wrote
    }

    /// Full partial record for `address`, if any field has been resolved.
    pub fn record(&self, address: Address) -> Option<TokenMetadata> {
        self.records.get(&address).map(|record| record.clone())
    }

    /// Pre-populates the cache, field by field, respecting first-write-wins.
    /// Useful for carrying known metadata across pipeline restarts.
    pub fn seed(&self, address: Address, record: TokenMetadata) {
        let mut entry = self.records.entry(address).or_default();
        for field in TokenField::ALL {
            if let Some(value) = record.field(field) {
                entry.fill(value);
            }
        }
    }

    /// Number of addresses with at least one populated field.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counts populated fields across all records.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            tokens: 0,
            symbols: 0,
            names: 0,
            decimals: 0,
            total_supplies: 0,
        };
        for record in self.records.iter() {
            stats.tokens += 1;
            if record.symbol.is_some() {
                stats.symbols += 1;
            }
            if record.name.is_some() {
                stats.names += 1;
            }
            if record.decimals.is_some() {
                stats.decimals += 1;
            }
            if record.total_supply.is_some() {
                stats.total_supplies += 1;
            }
        }
        stats
    }
}
