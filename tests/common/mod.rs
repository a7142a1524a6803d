use std::str::FromStr;
use std::sync::Arc;

use ethers::types::Address;

use erc20_metadata::{
    BatchResolver, StaticTokenRegistry, TokenMetadataCache, TokenResolver,
};

pub mod mocks;

/// USDC.e on Polygon, carried by the builtin static definitions.
pub const USDC_E: &str = "0x552791be94b679cd0cefb35c8ab0364973acb37f";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

pub fn addr(s: &str) -> Address {
    Address::from_str(s).expect("valid test address")
}

/// Deterministic throwaway token address.
pub fn token(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn resolver_with(source: Arc<mocks::MockTokenSource>) -> Arc<TokenResolver> {
    Arc::new(TokenResolver::new(
        source,
        Arc::new(TokenMetadataCache::new()),
        StaticTokenRegistry::builtin(),
    ))
}

pub fn driver_with(
    source: Arc<mocks::MockTokenSource>,
    max_concurrent_resolutions: usize,
) -> BatchResolver {
    BatchResolver::new(resolver_with(source), max_concurrent_resolutions)
}
