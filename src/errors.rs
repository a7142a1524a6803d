//! # Error Taxonomy
//!
//! Typed errors for the resolution subsystem. The cascade in
//! [`crate::resolver`] absorbs every per-field call failure; the only
//! condition that crosses the batch boundary is a structurally unavailable
//! token source (no connection at all), which the indexing pipeline handles
//! above this layer.

use ethers::types::Address;
use thiserror::Error;

use crate::types::TokenField;

/// A single on-chain read failing.
///
/// The variants exist for log fidelity only: the resolver treats a revert,
/// a malformed return payload, and a transport error identically, falling
/// through to the static registry and then to the terminal default.
#[derive(Error, Debug, Clone)]
pub enum CallError {
    #[error("contract call reverted: {0}")]
    Revert(String),
    #[error("failed to decode return data: {0}")]
    Decode(String),
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Errors surfaced by a [`crate::token_source::TokenSource`] implementation.
#[derive(Error, Debug, Clone)]
pub enum TokenSourceError {
    /// The source cannot reach the chain at all. Unlike a per-token call
    /// failure this is not a data-quality problem, so it propagates to the
    /// caller instead of being defaulted away.
    #[error("token source unavailable: {0}")]
    Unavailable(String),
    #[error("token call failed: {0}")]
    Call(#[from] CallError),
}

impl TokenSourceError {
    /// True for the structural-outage variant that aborts a batch.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TokenSourceError::Unavailable(_))
    }
}

/// Errors escaping the resolver and batch driver.
#[derive(Error, Debug, Clone)]
pub enum ResolverError {
    #[error("token source unavailable while resolving {field} for {address:?}: {reason}")]
    SourceUnavailable {
        address: Address,
        field: TokenField,
        reason: String,
    },
    #[error("internal resolver error: {0}")]
    Internal(String),
}
