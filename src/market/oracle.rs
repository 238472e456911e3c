//! Constant-product rate oracle
//!
//! Prices a fixed sell increment against `x * y = k`, rounding the new buy
//! reserve up so the quote never favours the trader.

use super::{AssetId, PoolSnapshot};
use alloy::primitives::U256;

/// Amount of the buy asset obtainable for one sell increment.
/// Zero means "no liquidity".
pub type RateQuote = u64;

/// Stateless AMM quote calculator
pub struct RateOracle;

impl RateOracle {
    /// Quote selling `sell_increment` of `sell_asset` for `buy_asset`
    ///
    /// Returns 0 when the pool is missing or either reserve is empty.
    pub fn quote(
        snapshot: &PoolSnapshot,
        sell_asset: &AssetId,
        buy_asset: &AssetId,
        sell_increment: u64,
    ) -> RateQuote {
        let Some(pair) = snapshot.pair(sell_asset, buy_asset) else {
            return 0;
        };
        if pair.is_degenerate() {
            return 0;
        }

        let (sell_pool, buy_pool) = pair.oriented(sell_asset);
        Self::quote_reserves(sell_pool, buy_pool, sell_increment)
    }

    /// Constant-product output for raw reserves
    pub fn quote_reserves(sell_pool: u64, buy_pool: u64, sell_increment: u64) -> RateQuote {
        if sell_pool == 0 || buy_pool == 0 {
            return 0;
        }

        let buy = U256::from(buy_pool);
        let invariant = U256::from(sell_pool) * buy;
        let new_sell_pool = U256::from(sell_pool) + U256::from(sell_increment);

        let (mut new_buy_pool, remainder) = invariant.div_rem(new_sell_pool);
        if !remainder.is_zero() {
            new_buy_pool += U256::from(1u8);
        }

        if buy <= new_buy_pool {
            return 0;
        }
        // Strictly below buy_pool, so it fits in u64.
        (buy - new_buy_pool).to::<u64>()
    }
}
