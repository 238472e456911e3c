//! Configuration for the trade agents

pub mod rpc;

use crate::market::AssetId;
use crate::tokens::ids;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

// Re-export chain endpoint config
pub use rpc::{RpcConfig, SellerCredentials};

/// Tunables of one selling agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name, used as the `worker` log field
    pub name: String,
    /// Seconds between cycles
    pub frequency_secs: u64,
    /// Asset being sold
    pub sell_asset: AssetId,
    /// Asset being bought
    pub buy_asset: AssetId,
    /// Amount used to measure the rate (one unit of the sell asset)
    pub quote_increment: u64,
    /// Amount sold per trade
    pub sell_amount: u64,
    /// Minimum amount of the buy asset accepted for one trade
    pub min_acceptable_amount: u64,
    /// Minimum quote for one increment before selling
    pub rate_lower_bound: u64,
    /// Trades allowed per throttle period
    pub max_trades_per_period: u32,
    /// Local hour at which an exhausted throttle is released
    #[serde(default)]
    pub reset_hour: u32,
    /// Trading fee paid to the pool
    #[serde(default)]
    pub trading_fee: u64,
    /// Network fee for the transaction
    #[serde(default = "default_network_fee")]
    pub network_fee: u64,
}

fn default_network_fee() -> u64 {
    100
}

impl AgentConfig {
    /// PRV → pUSDT seller: sells 250 PRV when 1 PRV buys at least 1 pUSDT,
    /// at most 10 times a day, checking every 10 minutes
    pub fn prv_seller() -> Self {
        Self {
            name: "prv-seller".to_string(),
            frequency_secs: 600,
            sell_asset: AssetId::from(ids::PRV),
            buy_asset: AssetId::from(ids::PUSDT),
            quote_increment: 1_000_000_000,     // 1 PRV
            sell_amount: 250_000_000_000,       // 250 PRV
            min_acceptable_amount: 250_000_000, // 250 pUSDT
            rate_lower_bound: 1_000_000,        // 1 pUSDT
            max_trades_per_period: 10,
            reset_hour: 0,
            trading_fee: 0,
            network_fee: default_network_fee(),
        }
    }

    pub fn frequency(&self) -> Duration {
        Duration::from_secs(self.frequency_secs)
    }

    /// Check the tunables for values that would make the agent misbehave
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| Err(Error::Config(format!("agent {}: {}", self.name, reason)));

        if self.name.trim().is_empty() {
            return Err(Error::Config("agent name must not be empty".to_string()));
        }
        if self.frequency_secs == 0 {
            return fail("frequency_secs must be positive");
        }
        if self.quote_increment == 0 {
            return fail("quote_increment must be positive");
        }
        if self.sell_amount == 0 {
            return fail("sell_amount must be positive");
        }
        if self.sell_asset == self.buy_asset {
            return fail("sell_asset and buy_asset must differ");
        }
        if self.max_trades_per_period == 0 {
            return fail("max_trades_per_period must be positive");
        }
        if self.reset_hour >= 24 {
            return fail("reset_hour must be within 0..24");
        }
        Ok(())
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Agents to schedule
    pub agents: Vec<AgentConfig>,
    /// Pause before an agent reports completion on shutdown (milliseconds)
    #[serde(default = "default_drain_delay_ms")]
    pub drain_delay_ms: u64,
    /// Directory for the agent log file
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_drain_delay_ms() -> u64 {
    1_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents: vec![AgentConfig::prv_seller()],
            drain_delay_ms: default_drain_delay_ms(),
            log_dir: Some("logs".to_string()),
        }
    }
}

impl Config {
    /// Load and validate a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn drain_delay(&self) -> Duration {
        Duration::from_millis(self.drain_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.agents.is_empty() {
            return Err(Error::Config("at least one agent is required".to_string()));
        }

        let mut names = HashSet::new();
        for agent in &self.agents {
            agent.validate()?;
            if !names.insert(agent.name.as_str()) {
                return Err(Error::Config(format!("duplicate agent name: {}", agent.name)));
            }
        }
        Ok(())
    }
}
