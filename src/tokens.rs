//! Shared asset registry
//!
//! Token ids on the chain are 32-byte hex strings. The registry maps the ids
//! the agents trade to a symbol and decimal count so amounts can be logged
//! in human units.

use crate::market::AssetId;
use std::collections::HashMap;

/// Asset metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    /// Token symbol (e.g., "PRV", "pUSDT")
    pub symbol: &'static str,
    /// Number of decimals of the smallest unit
    pub decimals: u8,
}

impl TokenInfo {
    pub const fn new(symbol: &'static str, decimals: u8) -> Self {
        Self { symbol, decimals }
    }
}

/// Well-known asset ids
pub mod ids {
    /// Native chain token
    pub const PRV: &str = "0000000000000000000000000000000000000000000000000000000000000004";
    /// Bridged USDT
    pub const PUSDT: &str = "716fd1009e2a1669caacc36891e707bfdf02590f96ebd897548e8963c95ebac0";
}

/// Registry providing asset info lookups
pub struct TokenRegistry {
    tokens: HashMap<&'static str, TokenInfo>,
}

impl TokenRegistry {
    /// Create a registry with all known assets
    pub fn new() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(ids::PRV, TokenInfo::new("PRV", 9));
        tokens.insert(ids::PUSDT, TokenInfo::new("pUSDT", 6));
        Self { tokens }
    }

    /// Get asset info by id
    pub fn get(&self, asset: &AssetId) -> Option<&TokenInfo> {
        self.tokens.get(asset.as_str())
    }

    /// Symbol for an asset, falling back to a shortened id
    pub fn symbol(&self, asset: &AssetId) -> String {
        match self.get(asset) {
            Some(info) => info.symbol.to_string(),
            None => asset.short(),
        }
    }

    /// Render a raw amount in human units, e.g. `250 PRV` or `1.272727 pUSDT`
    ///
    /// Unknown assets are rendered as the raw integer with the short id.
    pub fn display_amount(&self, asset: &AssetId, raw: u64) -> String {
        let Some(info) = self.get(asset) else {
            return format!("{} {}", raw, asset.short());
        };

        let divisor = 10u64.pow(info.decimals as u32);
        let whole = raw / divisor;
        let frac = raw % divisor;
        if frac == 0 {
            return format!("{} {}", whole, info.symbol);
        }

        let frac = format!("{:0width$}", frac, width = info.decimals as usize);
        format!("{}.{} {}", whole, frac.trim_end_matches('0'), info.symbol)
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: std::sync::OnceLock<TokenRegistry> = std::sync::OnceLock::new();

/// Get the global token registry
pub fn registry() -> &'static TokenRegistry {
    REGISTRY.get_or_init(TokenRegistry::new)
}
