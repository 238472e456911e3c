//! Chain collaborators consumed by the trading agents
//!
//! Agents only see two narrow capabilities: reading pool state
//! ([`ChainQuery`]) and broadcasting a sell order ([`TradeSubmitter`]).
//! Transport and transaction signing live behind these traits.

mod paper;
pub mod rpc;

pub use paper::PaperSubmitter;
pub use rpc::RpcChainClient;

use crate::config::SellerCredentials;
use crate::market::{AssetId, PoolSnapshot};
use crate::Result;
use async_trait::async_trait;

/// Read access to chain state
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Latest beacon height
    async fn latest_height(&self) -> Result<u64>;

    /// Pool state at `height`
    async fn pool_state(&self, height: u64) -> Result<PoolSnapshot>;
}

/// A cross-pool sell order ready for submission
#[derive(Debug, Clone, Copy)]
pub struct SellOrder<'a> {
    pub seller: &'a SellerCredentials,
    pub sell_asset: &'a AssetId,
    pub buy_asset: &'a AssetId,
    pub sell_amount: u64,
    pub min_acceptable_amount: u64,
    pub trading_fee: u64,
    pub network_fee: u64,
}

/// Broadcasts sell orders and reports the transaction id
#[async_trait]
pub trait TradeSubmitter: Send + Sync {
    async fn submit_sell(&self, order: SellOrder<'_>) -> Result<String>;
}

#[async_trait]
impl<T: ChainQuery + ?Sized> ChainQuery for std::sync::Arc<T> {
    async fn latest_height(&self) -> Result<u64> {
        (**self).latest_height().await
    }

    async fn pool_state(&self, height: u64) -> Result<PoolSnapshot> {
        (**self).pool_state(height).await
    }
}

#[async_trait]
impl<T: TradeSubmitter + ?Sized> TradeSubmitter for std::sync::Arc<T> {
    async fn submit_sell(&self, order: SellOrder<'_>) -> Result<String> {
        (**self).submit_sell(order).await
    }
}
