use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, BlockId, U256};

use erc20_metadata::{CallError, FieldValue, TokenField, TokenSource, TokenSourceError};

// === Mock Token Source ===

/// Programmable in-memory token source.
///
/// Behavior is keyed per (address, field); anything unprogrammed reverts,
/// mirroring a contract without that method. Every upstream attempt is
/// counted, and the mock tracks how many calls overlapped so tests can
/// assert both coalescing and the worker-pool bound.
#[derive(Debug, Default)]
pub struct MockTokenSource {
    responses: Mutex<HashMap<(Address, TokenField), MockResponse>>,
    calls: Mutex<HashMap<(Address, TokenField), u64>>,
    total_calls: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
    down: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

#[derive(Clone, Debug)]
enum MockResponse {
    Value(FieldValue),
    Revert,
    DecodeError,
    RpcError,
}

impl MockTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_symbol(&self, token: Address, symbol: &str) {
        self.program(token, MockResponse::Value(FieldValue::Symbol(symbol.to_string())));
    }

    pub fn set_name(&self, token: Address, name: &str) {
        self.program(token, MockResponse::Value(FieldValue::Name(name.to_string())));
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.program(token, MockResponse::Value(FieldValue::Decimals(decimals)));
    }

    pub fn set_total_supply(&self, token: Address, total_supply: U256) {
        self.program(
            token,
            MockResponse::Value(FieldValue::TotalSupply(total_supply)),
        );
    }

    /// Programs all four fields of a well-behaved token.
    pub fn set_standard_token(
        &self,
        token: Address,
        symbol: &str,
        name: &str,
        decimals: u8,
        total_supply: U256,
    ) {
        self.set_symbol(token, symbol);
        self.set_name(token, name);
        self.set_decimals(token, decimals);
        self.set_total_supply(token, total_supply);
    }

    pub fn set_revert(&self, token: Address, field: TokenField) {
        self.responses
            .lock()
            .unwrap()
            .insert((token, field), MockResponse::Revert);
    }

    pub fn set_decode_error(&self, token: Address, field: TokenField) {
        self.responses
            .lock()
            .unwrap()
            .insert((token, field), MockResponse::DecodeError);
    }

    pub fn set_rpc_error(&self, token: Address, field: TokenField) {
        self.responses
            .lock()
            .unwrap()
            .insert((token, field), MockResponse::RpcError);
    }

    /// Simulates a structural outage: every call fails with `Unavailable`
    /// until the source is brought back up.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Injects latency into every call, widening the window in which
    /// concurrent requests overlap.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn calls(&self, token: Address, field: TokenField) -> u64 {
        self.calls
            .lock()
            .unwrap()
            .get(&(token, field))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn program(&self, token: Address, response: MockResponse) {
        let field = match &response {
            MockResponse::Value(value) => value.field(),
            _ => unreachable!("typed setters always carry a value"),
        };
        self.responses
            .lock()
            .unwrap()
            .insert((token, field), response);
    }

    fn enter(&self) -> InFlightGuard<'_> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        InFlightGuard { source: self }
    }

    async fn maybe_sleep(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn respond(&self, token: Address, field: TokenField) -> Result<FieldValue, TokenSourceError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry((token, field))
            .or_insert(0) += 1;
        if self.down.load(Ordering::SeqCst) {
            return Err(TokenSourceError::Unavailable(
                "mock source down".to_string(),
            ));
        }
        match self.responses.lock().unwrap().get(&(token, field)) {
            Some(MockResponse::Value(value)) => Ok(value.clone()),
            Some(MockResponse::Revert) | None => {
                Err(CallError::Revert("execution reverted".to_string()).into())
            }
            Some(MockResponse::DecodeError) => {
                Err(CallError::Decode("undecodable return data".to_string()).into())
            }
            Some(MockResponse::RpcError) => {
                Err(CallError::Rpc("internal error".to_string()).into())
            }
        }
    }
}

struct InFlightGuard<'a> {
    source: &'a MockTokenSource,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.source.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenSource for MockTokenSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_token_symbol(
        &self,
        token: Address,
        _block: Option<BlockId>,
    ) -> Result<String, TokenSourceError> {
        let _guard = self.enter();
        self.maybe_sleep().await;
        match self.respond(token, TokenField::Symbol)? {
            FieldValue::Symbol(symbol) => Ok(symbol),
            other => Err(CallError::Decode(format!("mock programmed with {:?}", other)).into()),
        }
    }

    async fn get_token_name(
        &self,
        token: Address,
        _block: Option<BlockId>,
    ) -> Result<String, TokenSourceError> {
        let _guard = self.enter();
        self.maybe_sleep().await;
        match self.respond(token, TokenField::Name)? {
            FieldValue::Name(name) => Ok(name),
            other => Err(CallError::Decode(format!("mock programmed with {:?}", other)).into()),
        }
    }

    async fn get_token_decimals(
        &self,
        token: Address,
        _block: Option<BlockId>,
    ) -> Result<u8, TokenSourceError> {
        let _guard = self.enter();
        self.maybe_sleep().await;
        match self.respond(token, TokenField::Decimals)? {
            FieldValue::Decimals(decimals) => Ok(decimals),
            other => Err(CallError::Decode(format!("mock programmed with {:?}", other)).into()),
        }
    }

    async fn get_token_total_supply(
        &self,
        token: Address,
        _block: Option<BlockId>,
    ) -> Result<U256, TokenSourceError> {
        let _guard = self.enter();
        self.maybe_sleep().await;
        match self.respond(token, TokenField::TotalSupply)? {
            FieldValue::TotalSupply(total_supply) => Ok(total_supply),
            other => Err(CallError::Decode(format!("mock programmed with {:?}", other)).into()),
        }
    }
}
