//! Per-period trade counter
//!
//! The counter only moves up on a successful trade and back to zero through
//! the lazy reset, which is evaluated at the top of each cycle: once the cap
//! is hit, the first cycle that observes the reset hour clears it.

/// Tracks trades fired in the current period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeThrottle {
    trade_count: u32,
    max_trades: u32,
    reset_hour: u32,
    last_reset_hour: Option<u32>,
}

impl TradeThrottle {
    /// Create a throttle allowing `max_trades` per period, released at `reset_hour`
    pub fn new(max_trades: u32, reset_hour: u32) -> Self {
        Self {
            trade_count: 0,
            max_trades,
            reset_hour,
            last_reset_hour: None,
        }
    }

    pub fn trade_count(&self) -> u32 {
        self.trade_count
    }

    pub fn max_trades(&self) -> u32 {
        self.max_trades
    }

    /// Hour of day at which the counter was last released
    pub fn last_reset_hour(&self) -> Option<u32> {
        self.last_reset_hour
    }

    /// True iff the cap is reached and `current_hour` is the reset hour
    pub fn should_reset(&self, current_hour: u32) -> bool {
        self.trade_count == self.max_trades && current_hour == self.reset_hour
    }

    /// True iff another trade fits in the current period
    pub fn can_trade(&self) -> bool {
        self.trade_count < self.max_trades
    }

    /// Apply the reset if due. Returns whether the counter was cleared.
    pub fn reset_if_due(&mut self, current_hour: u32) -> bool {
        if !self.should_reset(current_hour) {
            return false;
        }
        self.trade_count = 0;
        self.last_reset_hour = Some(current_hour);
        true
    }

    /// Count one successful trade. Saturates at the cap.
    pub fn record_trade(&mut self) {
        if self.can_trade() {
            self.trade_count += 1;
        }
    }
}
