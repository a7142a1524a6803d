//! # Batch Resolution Driver
//!
//! Entry point for the indexing pipeline: takes the addresses observed while
//! processing a unit of work, deduplicates them, and fans resolution out over
//! the resolver with bounded concurrency. Results aggregate unordered into an
//! address-keyed map.
//!
//! A broken token never aborts a batch. The only propagated failure is a
//! structurally unreachable source, and even then every field resolved before
//! the outage stays cached, so a retried batch only re-issues what is missing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ethers::types::{Address, BlockId, U256};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::cache::TokenMetadataCache;
use crate::config::ResolverSettings;
use crate::errors::ResolverError;
use crate::resolver::TokenResolver;
use crate::static_tokens::StaticTokenRegistry;
use crate::token_source::TokenSource;
use crate::types::{FieldValue, TokenField, TokenMetadata};

/// Semaphore-bounded fan-out over [`TokenResolver`].
#[derive(Debug)]
pub struct BatchResolver {
    resolver: Arc<TokenResolver>,
    /// Bounds in-flight resolutions; sized to what the upstream RPC provider
    /// tolerates.
    concurrency: Arc<Semaphore>,
}

impl BatchResolver {
    pub fn new(resolver: Arc<TokenResolver>, max_concurrent_resolutions: usize) -> Self {
        Self {
            resolver,
            concurrency: Arc::new(Semaphore::new(max_concurrent_resolutions.max(1))),
        }
    }

    /// Wires a driver from settings: empty cache, builtin static definitions
    /// extended with the configured ones, concurrency bound from settings.
    pub fn from_settings(settings: &ResolverSettings, source: Arc<dyn TokenSource>) -> Self {
        let static_tokens = StaticTokenRegistry::with_extra(&settings.static_tokens);
        let cache = Arc::new(TokenMetadataCache::new());
        let resolver = Arc::new(TokenResolver::new(source, cache, static_tokens));
        Self::new(resolver, settings.max_concurrent_resolutions)
    }

    pub fn resolver(&self) -> &Arc<TokenResolver> {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<TokenMetadataCache> {
        self.resolver.cache()
    }

    /// Resolves the requested fields for every distinct address in the batch.
    ///
    /// Returns a map with one record per distinct address, only the requested
    /// fields populated. Duplicate addresses and fields are collapsed before
    /// any resolution starts.
    pub async fn resolve_metadata(
        &self,
        addresses: &[Address],
        fields: &[TokenField],
        block: Option<BlockId>,
    ) -> Result<HashMap<Address, TokenMetadata>, ResolverError> {
        let unique = unique_addresses(addresses);
        let wanted = unique_fields(fields);
        if unique.is_empty() {
            return Ok(HashMap::new());
        }
        debug!(
            target: "token_metadata",
            addresses = unique.len(),
            fields = ?wanted,
            "Resolving metadata batch"
        );

        let mut pairs = Vec::with_capacity(unique.len() * wanted.len());
        for &address in &unique {
            for &field in &wanted {
                pairs.push((address, field));
            }
        }
        let resolved = self.resolve_pairs(pairs, block).await?;

        let mut out: HashMap<Address, TokenMetadata> = HashMap::with_capacity(unique.len());
        for address in unique {
            out.insert(address, TokenMetadata::default());
        }
        for (address, value) in resolved {
            if let Some(record) = out.get_mut(&address) {
                record.fill(value);
            }
        }
        Ok(out)
    }

    /// All four fields for every distinct address.
    pub async fn resolve_all(
        &self,
        addresses: &[Address],
        block: Option<BlockId>,
    ) -> Result<HashMap<Address, TokenMetadata>, ResolverError> {
        self.resolve_metadata(addresses, &TokenField::ALL, block).await
    }

    pub async fn resolve_symbols(
        &self,
        addresses: &[Address],
        block: Option<BlockId>,
    ) -> Result<HashMap<Address, String>, ResolverError> {
        let pairs = unique_addresses(addresses)
            .into_iter()
            .map(|address| (address, TokenField::Symbol))
            .collect();
        let resolved = self.resolve_pairs(pairs, block).await?;
        let mut out = HashMap::with_capacity(resolved.len());
        for (address, value) in resolved {
            match value {
                FieldValue::Symbol(symbol) => {
                    out.insert(address, symbol);
                }
                other => {
                    return Err(ResolverError::Internal(format!(
                        "Symbol resolution produced {:?}",
                        other
                    )))
                }
            }
        }
        Ok(out)
    }

    pub async fn resolve_names(
        &self,
        addresses: &[Address],
        block: Option<BlockId>,
    ) -> Result<HashMap<Address, String>, ResolverError> {
        let pairs = unique_addresses(addresses)
            .into_iter()
            .map(|address| (address, TokenField::Name))
            .collect();
        let resolved = self.resolve_pairs(pairs, block).await?;
        let mut out = HashMap::with_capacity(resolved.len());
        for (address, value) in resolved {
            match value {
                FieldValue::Name(name) => {
                    out.insert(address, name);
                }
                other => {
                    return Err(ResolverError::Internal(format!(
                        "Name resolution produced {:?}",
                        other
                    )))
                }
            }
        }
        Ok(out)
    }

    pub async fn resolve_decimals(
        &self,
        addresses: &[Address],
        block: Option<BlockId>,
    ) -> Result<HashMap<Address, u8>, ResolverError> {
        let pairs = unique_addresses(addresses)
            .into_iter()
            .map(|address| (address, TokenField::Decimals))
            .collect();
        let resolved = self.resolve_pairs(pairs, block).await?;
        let mut out = HashMap::with_capacity(resolved.len());
        for (address, value) in resolved {
            match value {
                FieldValue::Decimals(decimals) => {
                    out.insert(address, decimals);
                }
                other => {
                    return Err(ResolverError::Internal(format!(
                        "Decimals resolution produced {:?}",
                        other
                    )))
                }
            }
        }
        Ok(out)
    }

    pub async fn resolve_total_supplies(
        &self,
        addresses: &[Address],
        block: Option<BlockId>,
    ) -> Result<HashMap<Address, U256>, ResolverError> {
        let pairs = unique_addresses(addresses)
            .into_iter()
            .map(|address| (address, TokenField::TotalSupply))
            .collect();
        let resolved = self.resolve_pairs(pairs, block).await?;
        let mut out = HashMap::with_capacity(resolved.len());
        for (address, value) in resolved {
            match value {
                FieldValue::TotalSupply(total_supply) => {
                    out.insert(address, total_supply);
                }
                other => {
                    return Err(ResolverError::Internal(format!(
                        "Total supply resolution produced {:?}",
                        other
                    )))
                }
            }
        }
        Ok(out)
    }

    /// Runs one resolution task per (address, field) pair under the
    /// concurrency bound. All tasks run to completion; if any reported an
    /// unreachable source, the first such error is returned after the rest
    /// have finished (and cached their values).
    async fn resolve_pairs(
        &self,
        pairs: Vec<(Address, TokenField)>,
        block: Option<BlockId>,
    ) -> Result<Vec<(Address, FieldValue)>, ResolverError> {
        let tasks = pairs.into_iter().map(|(address, field)| {
            let resolver = Arc::clone(&self.resolver);
            let semaphore = Arc::clone(&self.concurrency);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| ResolverError::Internal("Concurrency semaphore closed".to_string()))?;
                resolver
                    .resolve_field(address, field, block)
                    .await
                    .map(|value| (address, value))
            }
        });

        let results = join_all(tasks).await;
        let mut out = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(pair) => out.push(pair),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }
}

/// Order-preserving dedup of the batch's addresses.
fn unique_addresses(addresses: &[Address]) -> Vec<Address> {
    let mut seen = HashSet::with_capacity(addresses.len());
    addresses
        .iter()
        .copied()
        .filter(|address| seen.insert(*address))
        .collect()
}

fn unique_fields(fields: &[TokenField]) -> Vec<TokenField> {
    let mut out = Vec::with_capacity(fields.len().min(TokenField::ALL.len()));
    for &field in fields {
        if !out.contains(&field) {
            out.push(field);
        }
    }
    out
}
