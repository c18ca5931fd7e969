//! Binance futures configuration types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::venue::config::ClientConfig;
use crate::venue::error::{VenueError, VenueResult};

/// Binance futures market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FuturesMarket {
    /// USDT-M futures (linear), served under `fapi`
    #[default]
    Usdt,
    /// COIN-M futures (inverse), served under `dapi`
    Coin,
}

impl FromStr for FuturesMarket {
    type Err = VenueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "usdt" | "usdtm" | "usdt_futures" | "linear" | "fapi" => Ok(Self::Usdt),
            "coin" | "coinm" | "coin_futures" | "inverse" | "dapi" => Ok(Self::Coin),
            _ => Err(VenueError::Configuration(format!(
                "unknown futures market '{}', expected usdt or coin",
                s
            ))),
        }
    }
}

impl FuturesMarket {
    /// API category segment of the REST path.
    pub fn api_category(&self) -> &'static str {
        match self {
            Self::Usdt => "fapi",
            Self::Coin => "dapi",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Usdt => "USDT-M Futures",
            Self::Coin => "COIN-M Futures",
        }
    }
}

/// Configuration for a Binance futures user stream client.
///
/// Extends [`ClientConfig`] with the market and the testnet switch. An empty
/// `rest.base_url` means "use the default host for this market".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinanceFuturesConfig {
    #[serde(flatten)]
    pub base: ClientConfig,

    #[serde(default)]
    pub market: FuturesMarket,

    #[serde(default)]
    pub testnet: bool,
}

impl BinanceFuturesConfig {
    pub fn usdt_futures(base: ClientConfig) -> Self {
        Self {
            base,
            market: FuturesMarket::Usdt,
            testnet: false,
        }
    }

    pub fn coin_futures(base: ClientConfig) -> Self {
        Self {
            base,
            market: FuturesMarket::Coin,
            testnet: false,
        }
    }

    /// Set the testnet flag.
    pub fn with_testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> VenueResult<Self> {
        toml::from_str(s).map_err(|e| VenueError::Configuration(format!("Invalid config: {}", e)))
    }
}
