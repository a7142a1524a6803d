//! # Token Metadata Resolver
//!
//! Per-field resolution with a cascading fallback: memory cache, on-chain
//! read, static definitions (symbol/name/decimals), terminal default. Every
//! tier that produces a value writes it through the first-write-wins cache,
//! so resolution is idempotent for the process lifetime.
//!
//! Concurrent requests for the same uncached (address, field) coalesce on a
//! single-flight table: exactly one task runs the cascade, everyone else
//! awaits its result. Because the fallback tiers only ever run inside that
//! one flight, the data-quality warning for a degraded field fires at most
//! once per (address, field).

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use ethers::types::{Address, BlockId, U256};
use tokio::sync::OnceCell;
use tracing::{debug, error, trace, warn};

use crate::cache::TokenMetadataCache;
use crate::errors::{ResolverError, TokenSourceError};
use crate::metrics;
use crate::static_tokens::StaticTokenRegistry;
use crate::token_source::TokenSource;
use crate::types::{FieldValue, TokenField};

/// Field-granular metadata resolution over a shared cache.
///
/// Cheap to share behind an [`Arc`]; all interior state is concurrent.
#[derive(Debug)]
pub struct TokenResolver {
    source: Arc<dyn TokenSource>,
    cache: Arc<TokenMetadataCache>,
    static_tokens: StaticTokenRegistry,
    /// In-flight resolutions, keyed per (address, field). The task whose
    /// cascade produces a value publishes it to the cache and retires the
    /// entry; a failed flight leaves its uninitialized cell in place so
    /// retries still coalesce.
    flights: DashMap<(Address, TokenField), Arc<OnceCell<FieldValue>>>,
}

impl TokenResolver {
    pub fn new(
        source: Arc<dyn TokenSource>,
        cache: Arc<TokenMetadataCache>,
        static_tokens: StaticTokenRegistry,
    ) -> Self {
        Self {
            source,
            cache,
            static_tokens,
            flights: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<TokenMetadataCache> {
        &self.cache
    }

    pub fn static_tokens(&self) -> &StaticTokenRegistry {
        &self.static_tokens
    }

    /// Resolves one field of one token at the given execution context
    /// (`None` = latest block).
    ///
    /// Never fails for a non-standard or broken token: call failures degrade
    /// through the static registry to the terminal default. The only error is
    /// [`ResolverError::SourceUnavailable`], raised when the upstream source
    /// cannot be reached at all.
    pub async fn resolve_field(
        &self,
        token: Address,
        field: TokenField,
        block: Option<BlockId>,
    ) -> Result<FieldValue, ResolverError> {
        let started = Instant::now();
        let result = self.resolve_field_inner(token, field, block).await;
        metrics::RESOLUTION_DURATION
            .with_label_values(&[field.as_str()])
            .observe(started.elapsed().as_secs_f64());
        result
    }

    async fn resolve_field_inner(
        &self,
        token: Address,
        field: TokenField,
        block: Option<BlockId>,
    ) -> Result<FieldValue, ResolverError> {
        // 1. Memory cache (fastest)
        if let Some(value) = self.cache.get(token, field) {
            trace!(target: "token_metadata", token = ?token, field = %field, "Found in cache");
            metrics::CACHE_HITS.with_label_values(&[field.as_str()]).inc();
            return Ok(value);
        }
        metrics::CACHE_MISSES.with_label_values(&[field.as_str()]).inc();

        // 2. Join or start the single flight for this key. The temporary
        //    shard guard is dropped before any await.
        let cell = self
            .flights
            .entry((token, field))
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let value = match cell
            .get_or_try_init(|| self.resolution_cascade(token, field, block))
            .await
        {
            Ok(value) => value.clone(),
            Err(e) => {
                // The cell stays in the table uninitialized, so retries after
                // an outage keep funnelling through one flight per key.
                return Err(ResolverError::SourceUnavailable {
                    address: token,
                    field,
                    reason: e.to_string(),
                });
            }
        };

        // 3. Publish, then retire the flight. Latecomers holding the same
        //    cell still read the initialized value.
        self.cache.put(token, value.clone());
        self.flights.remove(&(token, field));
        Ok(value)
    }

    /// The fallback cascade. Runs at most once per flight; errors out only
    /// when the source is structurally unreachable.
    async fn resolution_cascade(
        &self,
        token: Address,
        field: TokenField,
        block: Option<BlockId>,
    ) -> Result<FieldValue, TokenSourceError> {
        // A request that missed the cache can join a fresh flight just after
        // the previous one published and retired; re-checking here keeps the
        // upstream call count at one per key.
        if let Some(value) = self.cache.get(token, field) {
            return Ok(value);
        }

        // On-chain read
        metrics::UPSTREAM_CALLS.with_label_values(&[field.as_str()]).inc();
        match self.source.get_field(field, token, block).await {
            Ok(value) => {
                debug!(
                    target: "token_metadata",
                    token = ?token,
                    field = %field,
                    value = %value,
                    "Resolved on-chain"
                );
                return Ok(value);
            }
            Err(TokenSourceError::Unavailable(reason)) => {
                error!(
                    target: "token_metadata",
                    token = ?token,
                    field = %field,
                    error = %reason,
                    "Token source unavailable, aborting resolution"
                );
                return Err(TokenSourceError::Unavailable(reason));
            }
            Err(TokenSourceError::Call(e)) => {
                metrics::UPSTREAM_CALL_FAILURES
                    .with_label_values(&[field.as_str()])
                    .inc();
                debug!(
                    target: "token_metadata",
                    token = ?token,
                    field = %field,
                    error = %e,
                    "On-chain read failed, falling through"
                );
            }
        }

        // Static definitions (no total_supply tier)
        if let Some(value) = self.static_tokens.field(token, field) {
            metrics::STATIC_FALLBACKS.with_label_values(&[field.as_str()]).inc();
            warn!(
                target: "token_metadata",
                token = ?token,
                field = %field,
                value = %value,
                "Missing {} for token {:?}; using static definition",
                field,
                token
            );
            return Ok(value);
        }

        // Terminal default
        let value = field.default_value();
        metrics::DEFAULT_FALLBACKS.with_label_values(&[field.as_str()]).inc();
        warn!(
            target: "token_metadata",
            token = ?token,
            field = %field,
            "Missing {} for token {:?}; defaulting to {}",
            field,
            token,
            value
        );
        Ok(value)
    }

    pub async fn resolve_symbol(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<String, ResolverError> {
        match self.resolve_field(token, TokenField::Symbol, block).await? {
            FieldValue::Symbol(symbol) => Ok(symbol),
            other => Err(ResolverError::Internal(format!(
                "Symbol resolution produced {:?}",
                other
            ))),
        }
    }

    pub async fn resolve_name(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<String, ResolverError> {
        match self.resolve_field(token, TokenField::Name, block).await? {
            FieldValue::Name(name) => Ok(name),
            other => Err(ResolverError::Internal(format!(
                "Name resolution produced {:?}",
                other
            ))),
        }
    }

    pub async fn resolve_decimals(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<u8, ResolverError> {
        match self.resolve_field(token, TokenField::Decimals, block).await? {
            FieldValue::Decimals(decimals) => Ok(decimals),
            other => Err(ResolverError::Internal(format!(
                "Decimals resolution produced {:?}",
                other
            ))),
        }
    }

    pub async fn resolve_total_supply(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<U256, ResolverError> {
        match self.resolve_field(token, TokenField::TotalSupply, block).await? {
            FieldValue::TotalSupply(total_supply) => Ok(total_supply),
            other => Err(ResolverError::Internal(format!(
                "Total supply resolution produced {:?}",
                other
            ))),
        }
    }
}
