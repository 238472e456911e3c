//! Pool state and the pure decision components
//!
//! A [`PoolSnapshot`] is fetched fresh every cycle and never mutated. The
//! [`RateOracle`] derives a quote from it and the [`TradeThrottle`] caps how
//! many trades an agent may fire per period.

mod oracle;
mod throttle;

pub use oracle::{RateOracle, RateQuote};
pub use throttle::TradeThrottle;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Hex token id of an asset on the chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters of the id, for log lines
    pub fn short(&self) -> String {
        if self.0.chars().count() <= 8 {
            return self.0.clone();
        }
        let prefix: String = self.0.chars().take(8).collect();
        format!("{}…", prefix)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reserves of one constant-product pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolPair {
    pub token1_id: AssetId,
    pub token1_pool_value: u64,
    pub token2_id: AssetId,
    pub token2_pool_value: u64,
}

impl PoolPair {
    /// Reserves oriented as `(sell_pool, buy_pool)` for selling `sell_asset`
    ///
    /// If `sell_asset` is not token1 the pool is read as token2 → token1.
    pub fn oriented(&self, sell_asset: &AssetId) -> (u64, u64) {
        if &self.token1_id == sell_asset {
            (self.token1_pool_value, self.token2_pool_value)
        } else {
            (self.token2_pool_value, self.token1_pool_value)
        }
    }

    /// True when either side of the pool is empty
    pub fn is_degenerate(&self) -> bool {
        self.token1_pool_value == 0 || self.token2_pool_value == 0
    }
}

/// Pool map key as reported by the node: `pdepool-<height>-<tokenA>-<tokenB>`
pub fn pool_key(height: u64, token_a: &AssetId, token_b: &AssetId) -> String {
    format!("pdepool-{}-{}-{}", height, token_a, token_b)
}

/// All pools known at one beacon height
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    height: u64,
    pairs: HashMap<String, PoolPair>,
}

impl PoolSnapshot {
    pub fn new(height: u64, pairs: HashMap<String, PoolPair>) -> Self {
        Self { height, pairs }
    }

    /// Beacon height the snapshot was taken at
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Find the pool for an unordered asset pair at this snapshot's height
    pub fn pair(&self, a: &AssetId, b: &AssetId) -> Option<&PoolPair> {
        self.pairs
            .get(&pool_key(self.height, a, b))
            .or_else(|| self.pairs.get(&pool_key(self.height, b, a)))
    }

    /// Add or replace a pool, keyed in `token1`/`token2` order
    pub fn with_pair(mut self, pair: PoolPair) -> Self {
        let key = pool_key(self.height, &pair.token1_id, &pair.token2_id);
        self.pairs.insert(key, pair);
        self
    }
}
