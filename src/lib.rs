//! # erc20-metadata
//!
//! Resolution and caching of ERC20 token metadata (symbol, name, decimals,
//! total supply) for an EVM event-indexing pipeline.
//!
//! On-chain metadata reads are unreliable: methods revert, return
//! non-standard encodings, or are missing entirely. This crate turns those
//! reads into stable, idempotent values through a per-field cascade (memory
//! cache, on-chain call, static definitions, terminal default) behind a
//! process-wide first-write-wins cache, so a given address yields the same
//! metadata for the lifetime of the run no matter how often or how
//! concurrently it is asked for.
//!
//! The typical entry point is [`BatchResolver`], handed the set of token
//! addresses observed while processing a unit of work:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use ethers::providers::{Http, Provider};
//! # use erc20_metadata::{BatchResolver, ResolverSettings, RpcTokenSource};
//! # async fn example() -> eyre::Result<()> {
//! let settings = ResolverSettings::default();
//! let provider = Arc::new(Provider::<Http>::try_from("http://localhost:8545")?);
//! let source = Arc::new(RpcTokenSource::new(provider, settings.chain_name.clone()));
//! let driver = BatchResolver::from_settings(&settings, source);
//! let metadata = driver.resolve_all(&[], None).await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod resolver;
pub mod static_tokens;
pub mod token_source;
pub mod types;

pub use batch::BatchResolver;
pub use cache::{CacheStats, TokenMetadataCache};
pub use config::ResolverSettings;
pub use errors::{CallError, ResolverError, TokenSourceError};
pub use resolver::TokenResolver;
pub use static_tokens::{StaticTokenDefinition, StaticTokenRegistry};
pub use token_source::{RpcTokenSource, TokenSource};
pub use types::{FieldValue, TokenField, TokenMetadata, DEFAULT_DECIMALS, UNKNOWN_SENTINEL};
