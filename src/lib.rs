//! AMM Trade Agent
//!
//! Scheduled agents that watch a constant-product pool and sell a fixed
//! amount whenever the pool rate clears a configured bound:
//! - Read the beacon height and pool pairs over JSON-RPC
//! - Quote one increment of the sell asset against the pool invariant
//! - Cap trades per day with a throttle released at a configured hour
//! - Run every agent on its own schedule with coordinated shutdown
//!
//! # Security Model
//!
//! - The seller's private key is read from the environment into a secret
//!   wrapper and is never logged or serialized
//! - Only a [`chain::TradeSubmitter`] can read the key; the bundled
//!   [`chain::PaperSubmitter`] never does

pub mod agent;
pub mod chain;
pub mod config;
pub mod market;
pub mod scheduler;
pub mod tokens;

mod error;

// Re-export commonly used types
pub use agent::{Agent, CycleOutcome, TradingAgent};
pub use config::{AgentConfig, Config, RpcConfig, SellerCredentials};
pub use error::{Error, Result};
pub use scheduler::{Scheduler, SchedulerHandle};
