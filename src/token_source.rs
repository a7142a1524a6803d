//! # On-Chain Token Source
//!
//! The narrow capability interface through which metadata is read from the
//! chain, and its JSON-RPC implementation. Keeping the interface this small
//! decouples the resolution cascade from transport details and lets tests
//! substitute a deterministic mock programmed to fail per address/field.
//!
//! No retry and no rate limiting happen here: the provider handed in by the
//! host owns that policy.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{self, ParamType, Token as AbiToken};
use ethers::providers::{Http, Middleware, Provider, ProviderError};
use ethers::types::{Address, BlockId, Bytes, TransactionRequest, U256};
use lazy_static::lazy_static;
use tracing::trace;

use crate::errors::{CallError, TokenSourceError};
use crate::types::{FieldValue, TokenField};

//================================================================================================//
//                                          CONSTANTS                                            //
//================================================================================================//

lazy_static! {
    /// ERC20 symbol() selector
    static ref SYMBOL_SELECTOR: Bytes = {
        hex::decode("95d89b41")
            .map(Bytes::from)
            .expect("Invalid selector for symbol()")
    };
    /// ERC20 name() selector
    static ref NAME_SELECTOR: Bytes = {
        hex::decode("06fdde03")
            .map(Bytes::from)
            .expect("Invalid selector for name()")
    };
    /// ERC20 decimals() selector
    static ref DECIMALS_SELECTOR: Bytes = {
        hex::decode("313ce567")
            .map(Bytes::from)
            .expect("Invalid selector for decimals()")
    };
    /// ERC20 totalSupply() selector
    static ref TOTAL_SUPPLY_SELECTOR: Bytes = {
        hex::decode("18160ddd")
            .map(Bytes::from)
            .expect("Invalid selector for totalSupply()")
    };
}

/// Error-text markers for a provider that cannot reach the chain at all.
/// Everything else is a per-token call failure and stays inside the cascade.
const CONNECTION_ERRORS: &[&str] = &[
    "connection refused",
    "connection reset",
    "error sending request",
    "tcp connect error",
    "dns error",
    "network unreachable",
];

//================================================================================================//
//                                       TRAIT DEFINITION                                         //
//================================================================================================//

/// Read access to the four ERC20 metadata methods at a given execution
/// context (`None` = latest block).
#[async_trait]
pub trait TokenSource: fmt::Debug + Send + Sync {
    async fn get_token_symbol(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<String, TokenSourceError>;

    async fn get_token_name(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<String, TokenSourceError>;

    async fn get_token_decimals(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<u8, TokenSourceError>;

    async fn get_token_total_supply(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<U256, TokenSourceError>;

    /// Name of the source implementation, for logs.
    fn name(&self) -> &'static str;

    /// Dispatches to the typed read for `field`.
    async fn get_field(
        &self,
        field: TokenField,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<FieldValue, TokenSourceError> {
        match field {
            TokenField::Symbol => self
                .get_token_symbol(token, block)
                .await
                .map(FieldValue::Symbol),
            TokenField::Name => self.get_token_name(token, block).await.map(FieldValue::Name),
            TokenField::Decimals => self
                .get_token_decimals(token, block)
                .await
                .map(FieldValue::Decimals),
            TokenField::TotalSupply => self
                .get_token_total_supply(token, block)
                .await
                .map(FieldValue::TotalSupply),
        }
    }
}

//================================================================================================//
//                                     RPC IMPLEMENTATION                                         //
//================================================================================================//

/// [`TokenSource`] over a JSON-RPC provider, issuing raw `eth_call`s with
/// hand-encoded selectors.
#[derive(Clone, Debug)]
pub struct RpcTokenSource {
    provider: Arc<Provider<Http>>,
    chain_name: String,
}

impl RpcTokenSource {
    pub fn new(provider: Arc<Provider<Http>>, chain_name: impl Into<String>) -> Self {
        Self {
            provider,
            chain_name: chain_name.into(),
        }
    }

    async fn call(
        &self,
        token: Address,
        selector: &Bytes,
        block: Option<BlockId>,
    ) -> Result<Bytes, TokenSourceError> {
        let tx = TransactionRequest::new().to(token).data(selector.clone());
        trace!(
            target: "token_metadata",
            chain = %self.chain_name,
            token = ?token,
            selector = ?selector,
            "Issuing metadata eth_call"
        );
        self.provider
            .call(&tx.into(), block)
            .await
            .map_err(classify_provider_error)
    }
}

#[async_trait]
impl TokenSource for RpcTokenSource {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn get_token_symbol(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<String, TokenSourceError> {
        let data = self.call(token, &SYMBOL_SELECTOR, block).await?;
        decode_string(&data, "symbol()")
    }

    async fn get_token_name(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<String, TokenSourceError> {
        let data = self.call(token, &NAME_SELECTOR, block).await?;
        decode_string(&data, "name()")
    }

    async fn get_token_decimals(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<u8, TokenSourceError> {
        let data = self.call(token, &DECIMALS_SELECTOR, block).await?;
        if data.len() == 32 {
            // uint8 occupies the least significant byte of the word
            Ok(data[31])
        } else {
            Err(CallError::Decode(format!(
                "Invalid decimals response length: expected 32 bytes, got {}",
                data.len()
            ))
            .into())
        }
    }

    async fn get_token_total_supply(
        &self,
        token: Address,
        block: Option<BlockId>,
    ) -> Result<U256, TokenSourceError> {
        let data = self.call(token, &TOTAL_SUPPLY_SELECTOR, block).await?;
        if data.len() == 32 {
            Ok(U256::from_big_endian(&data))
        } else {
            Err(CallError::Decode(format!(
                "Invalid totalSupply response length: expected 32 bytes, got {}",
                data.len()
            ))
            .into())
        }
    }
}

/// Decodes a dynamic ABI string return. Tokens that return `bytes32` or
/// nothing at all land here as a decode failure and fall through the
/// cascade's fallback tiers.
fn decode_string(data: &Bytes, method: &str) -> Result<String, TokenSourceError> {
    let decoded = abi::decode(&[ParamType::String], data).map_err(|e| {
        CallError::Decode(format!("{} returned undecodable data: {}", method, e))
    })?;
    match decoded.into_iter().next() {
        Some(AbiToken::String(s)) => Ok(s),
        other => Err(CallError::Decode(format!(
            "{} decoded to unexpected token: {:?}",
            method, other
        ))
        .into()),
    }
}

/// Splits provider failures into the structural-outage class and the
/// per-token call-failure class.
fn classify_provider_error(e: ProviderError) -> TokenSourceError {
    let text = e.to_string();
    let lowered = text.to_lowercase();
    if CONNECTION_ERRORS.iter().any(|marker| lowered.contains(marker)) {
        return TokenSourceError::Unavailable(text);
    }
    if lowered.contains("revert") {
        return CallError::Revert(text).into();
    }
    CallError::Rpc(text).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_string_handles_standard_payload() {
        // abi.encode("USDC")
        let payload = hex::decode(concat!(
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000004",
            "5553444300000000000000000000000000000000000000000000000000000000",
        ))
        .unwrap();
        let decoded = decode_string(&Bytes::from(payload), "symbol()").unwrap();
        assert_eq!(decoded, "USDC");
    }

    #[test]
    fn decode_string_rejects_bytes32_payload() {
        // A bare 32-byte word is not a valid dynamic string encoding.
        let payload = vec![0x4d; 32];
        let err = decode_string(&Bytes::from(payload), "symbol()").unwrap_err();
        assert!(matches!(err, TokenSourceError::Call(CallError::Decode(_))));
    }

    #[test]
    fn decode_string_rejects_empty_payload() {
        let err = decode_string(&Bytes::new(), "name()").unwrap_err();
        assert!(matches!(err, TokenSourceError::Call(CallError::Decode(_))));
    }

    #[test]
    fn connection_failures_classify_as_unavailable() {
        let err = classify_provider_error(ProviderError::CustomError(
            "error sending request for url (http://localhost:8545/): connection refused".to_string(),
        ));
        assert!(err.is_unavailable());
    }

    #[test]
    fn reverts_classify_as_call_errors() {
        let err = classify_provider_error(ProviderError::CustomError(
            "execution reverted".to_string(),
        ));
        assert!(matches!(err, TokenSourceError::Call(CallError::Revert(_))));
    }
}
