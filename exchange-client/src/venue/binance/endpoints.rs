//! Binance futures API endpoints.
//!
//! This module centralizes the hosts for USDT-M and COIN-M futures in
//! production and testnet, and the user stream endpoint paths.

use super::config::FuturesMarket;

/// Host configuration for a Binance futures market.
#[derive(Debug, Clone)]
pub struct BinanceEndpoints {
    /// REST API base URL
    pub rest_url: String,
    /// User data stream WebSocket URL
    pub user_data_ws_url: String,
}

impl BinanceEndpoints {
    /// Get endpoints for the specified market and testnet setting.
    pub fn for_market(market: FuturesMarket, testnet: bool) -> Self {
        match (market, testnet) {
            (FuturesMarket::Usdt, false) => Self::usdt_futures(),
            (FuturesMarket::Usdt, true) => Self::usdt_futures_testnet(),
            (FuturesMarket::Coin, false) => Self::coin_futures(),
            (FuturesMarket::Coin, true) => Self::coin_futures_testnet(),
        }
    }

    /// Binance USDT-M Futures production endpoints.
    pub fn usdt_futures() -> Self {
        Self {
            rest_url: "https://fapi.binance.com".to_string(),
            user_data_ws_url: "wss://fstream.binance.com/ws".to_string(),
        }
    }

    /// Binance USDT-M Futures testnet endpoints.
    pub fn usdt_futures_testnet() -> Self {
        Self {
            rest_url: "https://testnet.binancefuture.com".to_string(),
            user_data_ws_url: "wss://stream.binancefuture.com/ws".to_string(),
        }
    }

    /// Binance COIN-M Futures production endpoints.
    pub fn coin_futures() -> Self {
        Self {
            rest_url: "https://dapi.binance.com".to_string(),
            user_data_ws_url: "wss://dstream.binance.com/ws".to_string(),
        }
    }

    /// Binance COIN-M Futures testnet endpoints.
    pub fn coin_futures_testnet() -> Self {
        Self {
            rest_url: "https://testnet.binancefuture.com".to_string(),
            user_data_ws_url: "wss://dstream.binancefuture.com/ws".to_string(),
        }
    }

    /// Get the user data stream URL with listen key.
    pub fn user_data_stream_url(&self, listen_key: &str) -> String {
        format!("{}/{}", self.user_data_ws_url, listen_key)
    }
}

/// Version segment of the user stream route.
pub const USER_STREAM_VERSION: &str = "1";

/// Endpoint paths relative to `{category}/v{version}`.
pub mod paths {
    /// Start (POST), keepalive (PUT) and close (DELETE) a user data stream
    pub const LISTEN_KEY: &str = "listenKey";
}
