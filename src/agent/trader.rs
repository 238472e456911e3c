//! Rate-gated selling agent
//!
//! Each cycle runs, in order: lazy throttle reset, throttle check, pool
//! query, rate check, submission. A throttled agent never touches the
//! network. A failed query or submission leaves the throttle untouched; the
//! next scheduler tick is the retry.

use super::{Agent, Clock, CycleOutcome, SystemClock};
use crate::chain::{ChainQuery, SellOrder, TradeSubmitter};
use crate::config::{AgentConfig, SellerCredentials};
use crate::market::{RateOracle, TradeThrottle};
use crate::tokens::registry;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Agent that sells a fixed amount whenever the AMM rate clears a bound
pub struct TradingAgent<Q, S, C = SystemClock> {
    config: AgentConfig,
    chain: Q,
    submitter: S,
    seller: Arc<SellerCredentials>,
    clock: C,
    throttle: TradeThrottle,
}

impl<Q, S> TradingAgent<Q, S, SystemClock>
where
    Q: ChainQuery,
    S: TradeSubmitter,
{
    /// Create an agent reading the hour from the local wall clock
    pub fn new(
        config: AgentConfig,
        chain: Q,
        submitter: S,
        seller: Arc<SellerCredentials>,
    ) -> Self {
        Self::with_clock(config, chain, submitter, seller, SystemClock)
    }
}

impl<Q, S, C> TradingAgent<Q, S, C>
where
    Q: ChainQuery,
    S: TradeSubmitter,
    C: Clock,
{
    pub fn with_clock(
        config: AgentConfig,
        chain: Q,
        submitter: S,
        seller: Arc<SellerCredentials>,
        clock: C,
    ) -> Self {
        let throttle = TradeThrottle::new(config.max_trades_per_period, config.reset_hour);
        Self {
            config,
            chain,
            submitter,
            seller,
            clock,
            throttle,
        }
    }

    pub fn throttle(&self) -> &TradeThrottle {
        &self.throttle
    }

    /// Quote one increment of the sell asset against the latest pool state
    pub async fn current_rate(&self) -> Result<u64> {
        let height = self.chain.latest_height().await?;
        let snapshot = self.chain.pool_state(height).await?;

        Ok(RateOracle::quote(
            &snapshot,
            &self.config.sell_asset,
            &self.config.buy_asset,
            self.config.quote_increment,
        ))
    }

    /// One decision cycle
    pub async fn execute(&mut self) -> CycleOutcome {
        let hour = self.clock.hour();
        if self.throttle.reset_if_due(hour) {
            info!(hour = hour, "Trade counter reset for new period");
        }

        if !self.throttle.can_trade() {
            info!(
                trade_count = self.throttle.trade_count(),
                max_trades = self.throttle.max_trades(),
                "Reached max number of trades for this period"
            );
            return CycleOutcome::Throttled {
                trade_count: self.throttle.trade_count(),
            };
        }

        info!("Trading agent is executing");

        let rate = match self.current_rate().await {
            Ok(rate) => rate,
            Err(e) => {
                error!(error = %e, "Failed to read pool state");
                return CycleOutcome::QueryFailed {
                    error: e.to_string(),
                };
            }
        };

        let tokens = registry();
        let lower_bound = self.config.rate_lower_bound;
        if rate < lower_bound {
            info!(
                rate = rate,
                rate_display = %tokens.display_amount(&self.config.buy_asset, rate),
                lower_bound = lower_bound,
                "Rate is below the expected bound"
            );
            return CycleOutcome::BelowThreshold { rate, lower_bound };
        }

        let order = SellOrder {
            seller: &self.seller,
            sell_asset: &self.config.sell_asset,
            buy_asset: &self.config.buy_asset,
            sell_amount: self.config.sell_amount,
            min_acceptable_amount: self.config.min_acceptable_amount,
            trading_fee: self.config.trading_fee,
            network_fee: self.config.network_fee,
        };

        match self.submitter.submit_sell(order).await {
            Ok(tx_id) => {
                self.throttle.record_trade();
                info!(
                    tx_id = %tx_id,
                    rate = rate,
                    sold = %tokens.display_amount(&self.config.sell_asset, self.config.sell_amount),
                    trade_count = self.throttle.trade_count(),
                    "Sell submitted"
                );
                CycleOutcome::Submitted { rate, tx_id }
            }
            Err(e) => {
                error!(error = %e, rate = rate, "Sell failed");
                CycleOutcome::SubmissionFailed {
                    rate,
                    error: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl<Q, S, C> Agent for TradingAgent<Q, S, C>
where
    Q: ChainQuery,
    S: TradeSubmitter,
    C: Clock,
{
    fn name(&self) -> &str {
        &self.config.name
    }

    fn frequency(&self) -> Duration {
        self.config.frequency()
    }

    async fn run_cycle(&mut self) -> CycleOutcome {
        self.execute().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{AssetId, PoolPair, PoolSnapshot};
    use crate::tokens::ids;
    use crate::Error;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const HEIGHT: u64 = 1_000;

    #[derive(Default)]
    struct FakeChain {
        snapshot: Option<PoolSnapshot>,
        fail_height: bool,
        fail_pool_state: bool,
        calls: AtomicUsize,
    }

    impl FakeChain {
        fn with_pool(prv: u64, usdt: u64) -> Self {
            let snapshot = PoolSnapshot::new(HEIGHT, HashMap::new()).with_pair(PoolPair {
                token1_id: AssetId::from(ids::PRV),
                token1_pool_value: prv,
                token2_id: AssetId::from(ids::PUSDT),
                token2_pool_value: usdt,
            });
            Self {
                snapshot: Some(snapshot),
                ..Self::default()
            }
        }

        fn without_pool() -> Self {
            Self {
                snapshot: Some(PoolSnapshot::new(HEIGHT, HashMap::new())),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ChainQuery for FakeChain {
        async fn latest_height(&self) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_height {
                return Err(Error::rpc("connection refused"));
            }
            Ok(HEIGHT)
        }

        async fn pool_state(&self, height: u64) -> Result<PoolSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(height, HEIGHT);
            if self.fail_pool_state {
                return Err(Error::Rpc {
                    message: "state not found".into(),
                    stack_trace: Some("trace".into()),
                });
            }
            Ok(self.snapshot.clone().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeSubmitter {
        fail: bool,
        orders: Mutex<Vec<(u64, u64, u64, u64)>>,
    }

    impl FakeSubmitter {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn order_count(&self) -> usize {
            self.orders.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TradeSubmitter for FakeSubmitter {
        async fn submit_sell(&self, order: SellOrder<'_>) -> Result<String> {
            let mut orders = self.orders.lock().unwrap();
            orders.push((
                order.sell_amount,
                order.min_acceptable_amount,
                order.trading_fee,
                order.network_fee,
            ));
            if self.fail {
                return Err(Error::Submission("insufficient balance".into()));
            }
            Ok(format!("tx-{}", orders.len()))
        }
    }

    #[derive(Clone)]
    struct TestClock(Arc<AtomicU32>);

    impl TestClock {
        fn at(hour: u32) -> Self {
            Self(Arc::new(AtomicU32::new(hour)))
        }

        fn set(&self, hour: u32) {
            self.0.store(hour, Ordering::SeqCst);
        }
    }

    impl Clock for TestClock {
        fn hour(&self) -> u32 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn agent_config(max_trades: u32) -> AgentConfig {
        AgentConfig {
            max_trades_per_period: max_trades,
            ..AgentConfig::prv_seller()
        }
    }

    fn agent(
        config: AgentConfig,
        chain: FakeChain,
        submitter: FakeSubmitter,
        clock: TestClock,
    ) -> TradingAgent<FakeChain, FakeSubmitter, TestClock> {
        let seller = Arc::new(SellerCredentials::new("secret", "12S5Lr"));
        TradingAgent::with_clock(config, chain, submitter, seller, clock)
    }

    #[tokio::test]
    async fn test_submits_when_rate_clears_bound() {
        let mut agent = agent(
            agent_config(10),
            FakeChain::with_pool(10_000_000_000, 14_000_000_000),
            FakeSubmitter::default(),
            TestClock::at(12),
        );

        let outcome = agent.execute().await;

        assert_eq!(
            outcome,
            CycleOutcome::Submitted {
                rate: 1_272_727_272,
                tx_id: "tx-1".into()
            }
        );
        assert_eq!(agent.throttle().trade_count(), 1);

        let orders = agent.submitter.orders.lock().unwrap();
        assert_eq!(orders[0], (250_000_000_000, 250_000_000, 0, 100));
    }

    #[tokio::test]
    async fn test_missing_pool_is_below_threshold_not_failure() {
        let mut agent = agent(
            agent_config(10),
            FakeChain::without_pool(),
            FakeSubmitter::default(),
            TestClock::at(12),
        );

        let outcome = agent.execute().await;

        assert_eq!(
            outcome,
            CycleOutcome::BelowThreshold {
                rate: 0,
                lower_bound: 1_000_000
            }
        );
        assert!(!outcome.is_error());
        assert_eq!(agent.submitter.order_count(), 0);
        assert_eq!(agent.throttle().trade_count(), 0);
    }

    #[tokio::test]
    async fn test_low_rate_skips_trade() {
        let config = AgentConfig {
            rate_lower_bound: 2_000_000_000,
            ..agent_config(10)
        };
        let mut agent = agent(
            config,
            FakeChain::with_pool(10_000_000_000, 14_000_000_000),
            FakeSubmitter::default(),
            TestClock::at(12),
        );

        assert!(matches!(
            agent.execute().await,
            CycleOutcome::BelowThreshold {
                rate: 1_272_727_272,
                ..
            }
        ));
        assert_eq!(agent.submitter.order_count(), 0);
    }

    #[tokio::test]
    async fn test_height_failure_aborts_cycle() {
        let chain = FakeChain {
            fail_height: true,
            ..FakeChain::with_pool(10_000_000_000, 14_000_000_000)
        };
        let mut agent = agent(agent_config(10), chain, FakeSubmitter::default(), TestClock::at(12));

        let outcome = agent.execute().await;

        assert!(matches!(outcome, CycleOutcome::QueryFailed { .. }));
        assert_eq!(agent.chain.calls.load(Ordering::SeqCst), 1);
        assert_eq!(agent.submitter.order_count(), 0);
        assert_eq!(agent.throttle().trade_count(), 0);
    }

    #[tokio::test]
    async fn test_pool_state_failure_aborts_cycle() {
        let chain = FakeChain {
            fail_pool_state: true,
            ..FakeChain::with_pool(10_000_000_000, 14_000_000_000)
        };
        let mut agent = agent(agent_config(10), chain, FakeSubmitter::default(), TestClock::at(12));

        match agent.execute().await {
            CycleOutcome::QueryFailed { error } => assert!(error.contains("state not found")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(agent.submitter.order_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_throttle_budget() {
        let mut agent = agent(
            agent_config(1),
            FakeChain::with_pool(10_000_000_000, 14_000_000_000),
            FakeSubmitter::failing(),
            TestClock::at(12),
        );

        for _ in 0..3 {
            let outcome = agent.execute().await;
            assert!(matches!(outcome, CycleOutcome::SubmissionFailed { .. }));
            assert_eq!(agent.throttle().trade_count(), 0);
        }
        assert_eq!(agent.submitter.order_count(), 3);
    }

    #[tokio::test]
    async fn test_throttled_agent_does_no_network_work() {
        let mut agent = agent(
            agent_config(2),
            FakeChain::with_pool(10_000_000_000, 14_000_000_000),
            FakeSubmitter::default(),
            TestClock::at(12),
        );

        agent.execute().await;
        agent.execute().await;
        assert_eq!(agent.throttle().trade_count(), 2);
        let calls_before = agent.chain.calls.load(Ordering::SeqCst);

        let outcome = agent.execute().await;

        assert_eq!(outcome, CycleOutcome::Throttled { trade_count: 2 });
        assert_eq!(agent.chain.calls.load(Ordering::SeqCst), calls_before);
        assert_eq!(agent.submitter.order_count(), 2);
    }

    #[tokio::test]
    async fn test_reset_at_midnight_releases_throttle() {
        let clock = TestClock::at(23);
        let mut agent = agent(
            agent_config(2),
            FakeChain::with_pool(10_000_000_000, 14_000_000_000),
            FakeSubmitter::default(),
            clock.clone(),
        );

        agent.execute().await;
        agent.execute().await;
        assert!(matches!(agent.execute().await, CycleOutcome::Throttled { .. }));

        clock.set(0);
        let outcome = agent.execute().await;

        // Reset happened first, then the rate was evaluated and a trade fired
        assert!(matches!(outcome, CycleOutcome::Submitted { .. }));
        assert_eq!(agent.throttle().trade_count(), 1);
        assert_eq!(agent.throttle().last_reset_hour(), Some(0));
    }

    #[tokio::test]
    async fn test_midnight_below_cap_does_not_reset() {
        let mut agent = agent(
            agent_config(3),
            FakeChain::with_pool(10_000_000_000, 14_000_000_000),
            FakeSubmitter::default(),
            TestClock::at(0),
        );

        agent.execute().await;
        agent.execute().await;
        assert_eq!(agent.throttle().trade_count(), 2);
        assert!(agent.throttle().last_reset_hour().is_none());
    }

    #[tokio::test]
    async fn test_runs_through_agent_trait() {
        let mut agent = agent(
            AgentConfig {
                name: "trait-agent".into(),
                frequency_secs: 42,
                ..agent_config(1)
            },
            FakeChain::with_pool(10_000_000_000, 14_000_000_000),
            FakeSubmitter::default(),
            TestClock::at(8),
        );

        let dyn_agent: &mut dyn Agent = &mut agent;
        assert_eq!(dyn_agent.name(), "trait-agent");
        assert_eq!(dyn_agent.frequency(), Duration::from_secs(42));
        assert!(matches!(
            dyn_agent.run_cycle().await,
            CycleOutcome::Submitted { .. }
        ));
    }
}
