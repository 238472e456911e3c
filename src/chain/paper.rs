//! Paper trade submitter
//!
//! Logs the order that would be broadcast and hands back a synthetic
//! 64-hex-char transaction id. Never signs or touches the private key.

use super::{SellOrder, TradeSubmitter};
use crate::tokens::registry;
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Submitter that records orders without broadcasting them
#[derive(Debug, Default)]
pub struct PaperSubmitter;

impl PaperSubmitter {
    pub fn new() -> Self {
        Self
    }

    /// Synthetic transaction id for an order
    ///
    /// The nonce keeps ids unique across identical orders.
    fn synthetic_tx_id(order: &SellOrder<'_>, nonce: Uuid) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(order.seller.address().as_bytes());
        hasher.update(order.sell_asset.as_str().as_bytes());
        hasher.update(order.buy_asset.as_str().as_bytes());
        hasher.update(&order.sell_amount.to_le_bytes());
        hasher.update(&order.min_acceptable_amount.to_le_bytes());
        hasher.update(&order.trading_fee.to_le_bytes());
        hasher.update(&order.network_fee.to_le_bytes());
        hasher.update(nonce.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[async_trait]
impl TradeSubmitter for PaperSubmitter {
    async fn submit_sell(&self, order: SellOrder<'_>) -> Result<String> {
        let tx_id = Self::synthetic_tx_id(&order, Uuid::new_v4());
        let tokens = registry();

        tracing::info!(
            seller = order.seller.address(),
            sell = %tokens.display_amount(order.sell_asset, order.sell_amount),
            min_receive = %tokens.display_amount(order.buy_asset, order.min_acceptable_amount),
            trading_fee = order.trading_fee,
            network_fee = order.network_fee,
            tx_id = %tx_id,
            "Paper sell recorded (not broadcast)"
        );

        Ok(tx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SellerCredentials;
    use crate::market::AssetId;
    use crate::tokens::ids;

    fn order<'a>(
        seller: &'a SellerCredentials,
        sell: &'a AssetId,
        buy: &'a AssetId,
    ) -> SellOrder<'a> {
        SellOrder {
            seller,
            sell_asset: sell,
            buy_asset: buy,
            sell_amount: 250_000_000_000,
            min_acceptable_amount: 250_000_000,
            trading_fee: 0,
            network_fee: 100,
        }
    }

    #[tokio::test]
    async fn test_returns_hex_tx_id() {
        let seller = SellerCredentials::new("secret", "12S5Lr");
        let (sell, buy) = (AssetId::from(ids::PRV), AssetId::from(ids::PUSDT));

        let tx_id = tokio_test::assert_ok!(
            PaperSubmitter::new().submit_sell(order(&seller, &sell, &buy)).await
        );
        assert_eq!(tx_id.len(), 64);
        assert!(tx_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_identical_orders_get_distinct_ids() {
        let seller = SellerCredentials::new("secret", "12S5Lr");
        let (sell, buy) = (AssetId::from(ids::PRV), AssetId::from(ids::PUSDT));
        let submitter = PaperSubmitter::new();

        let first = submitter.submit_sell(order(&seller, &sell, &buy)).await.unwrap();
        let second = submitter.submit_sell(order(&seller, &sell, &buy)).await.unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_tx_id_is_deterministic_for_nonce() {
        let seller = SellerCredentials::new("secret", "12S5Lr");
        let (sell, buy) = (AssetId::from(ids::PRV), AssetId::from(ids::PUSDT));
        let nonce = Uuid::nil();

        let a = PaperSubmitter::synthetic_tx_id(&order(&seller, &sell, &buy), nonce);
        let b = PaperSubmitter::synthetic_tx_id(&order(&seller, &sell, &buy), nonce);
        assert_eq!(a, b);
    }
}
