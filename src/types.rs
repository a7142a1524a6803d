//! # Core Type Definitions
//!
//! Shared data structures for the token-metadata subsystem: the field
//! enumeration, the partial per-token record, and the terminal defaults
//! applied when neither the chain nor the static registry can produce a
//! value.

use std::fmt;

use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Sentinel used for symbol/name when no tier produced a value.
pub const UNKNOWN_SENTINEL: &str = "unknown";

/// Decimals applied when no tier produced a value.
pub const DEFAULT_DECIMALS: u8 = 18;

/// The four ERC20 metadata fields this subsystem resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenField {
    Symbol,
    Name,
    Decimals,
    TotalSupply,
}

impl TokenField {
    /// All fields, in the order the indexing pipeline persists them.
    pub const ALL: [TokenField; 4] = [
        TokenField::Symbol,
        TokenField::Name,
        TokenField::Decimals,
        TokenField::TotalSupply,
    ];

    /// Stable snake_case label used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenField::Symbol => "symbol",
            TokenField::Name => "name",
            TokenField::Decimals => "decimals",
            TokenField::TotalSupply => "total_supply",
        }
    }

    /// Terminal default for this field (tier 4 of the cascade).
    pub fn default_value(&self) -> FieldValue {
        match self {
            TokenField::Symbol => FieldValue::Symbol(UNKNOWN_SENTINEL.to_string()),
            TokenField::Name => FieldValue::Name(UNKNOWN_SENTINEL.to_string()),
            TokenField::Decimals => FieldValue::Decimals(DEFAULT_DECIMALS),
            TokenField::TotalSupply => FieldValue::TotalSupply(U256::zero()),
        }
    }
}

impl fmt::Display for TokenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved value for a single field, tagged with its field kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Symbol(String),
    Name(String),
    Decimals(u8),
    TotalSupply(U256),
}

impl FieldValue {
    /// The field this value belongs to.
    pub fn field(&self) -> TokenField {
        match self {
            FieldValue::Symbol(_) => TokenField::Symbol,
            FieldValue::Name(_) => TokenField::Name,
            FieldValue::Decimals(_) => TokenField::Decimals,
            FieldValue::TotalSupply(_) => TokenField::TotalSupply,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Symbol(s) | FieldValue::Name(s) => f.write_str(s),
            FieldValue::Decimals(d) => write!(f, "{}", d),
            FieldValue::TotalSupply(ts) => write!(f, "{}", ts),
        }
    }
}

/// Partial per-token metadata record.
///
/// Doubles as the cache entry and as the bundle returned to the indexing
/// pipeline: fields are populated independently and a missing field simply
/// has not been requested or resolved yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<u8>,
    pub total_supply: Option<U256>,
}

impl TokenMetadata {
    /// Returns the stored value for `field`, if populated.
    pub fn field(&self, field: TokenField) -> Option<FieldValue> {
        match field {
            TokenField::Symbol => self.symbol.clone().map(FieldValue::Symbol),
            TokenField::Name => self.name.clone().map(FieldValue::Name),
            TokenField::Decimals => self.decimals.map(FieldValue::Decimals),
            TokenField::TotalSupply => self.total_supply.map(FieldValue::TotalSupply),
        }
    }

    /// Populates the value's field if it is still empty.
    ///
    /// Returns `true` when the value was written. Populated fields are never
    /// overwritten; resolution is idempotent for the process lifetime.
    pub fn fill(&mut self, value: FieldValue) -> bool {
        match value {
            FieldValue::Symbol(s) => {
                if self.symbol.is_some() {
                    return false;
                }
                self.symbol = Some(s);
            }
            FieldValue::Name(n) => {
                if self.name.is_some() {
                    return false;
                }
                self.name = Some(n);
            }
            FieldValue::Decimals(d) => {
                if self.decimals.is_some() {
                    return false;
                }
                self.decimals = Some(d);
            }
            FieldValue::TotalSupply(ts) => {
                if self.total_supply.is_some() {
                    return false;
                }
                self.total_supply = Some(ts);
            }
        }
        true
    }

    /// True when none of the four fields is populated.
    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
            && self.name.is_none()
            && self.decimals.is_none()
            && self.total_supply.is_none()
    }
}
