//! Factory functions for Binance futures user stream clients.

use std::sync::Arc;

use tracing::debug;

use crate::venue::config::ClientConfig;
use crate::venue::error::VenueResult;
use crate::venue::http::{ApiRoute, HttpClient};

use super::config::BinanceFuturesConfig;
use super::endpoints::{BinanceEndpoints, USER_STREAM_VERSION};
use super::signer::BinanceHmacSigner;
use super::user_stream::FuturesUserStreamClient;

/// Create a user stream client from configuration.
///
/// Credentials are read from the environment variables named in
/// `config.base.auth`. The clock route is the user stream route itself, so
/// the drift is measured against `{category}/v1/time` of the same market.
///
/// # Example
///
/// ```ignore
/// let config = BinanceFuturesConfig::usdt_futures(ClientConfig::default()).with_testnet(true);
/// let client = create_futures_user_stream(config)?;
///
/// let listen_key = client.start_user_stream(&cancel).await;
/// ```
pub fn create_futures_user_stream(
    config: BinanceFuturesConfig,
) -> VenueResult<FuturesUserStreamClient> {
    let signer = BinanceHmacSigner::from_auth_config(&config.base.auth)?;

    let base_url = resolve_rest_url(&config);
    let rest = config.base.rest.clone().with_base_url(base_url.clone());
    let route = ApiRoute::new(base_url, config.market.api_category(), USER_STREAM_VERSION);

    debug!("Creating {} user stream client for {}", config.market.display_name(), route);

    let http_client = HttpClient::new(Box::new(signer), route.clone(), rest)?;
    Ok(FuturesUserStreamClient::new(Arc::new(http_client), route))
}

/// Create a Binance USDT-M Futures user stream client.
pub fn create_usdt_futures_user_stream(config: ClientConfig) -> VenueResult<FuturesUserStreamClient> {
    create_futures_user_stream(BinanceFuturesConfig::usdt_futures(config))
}

/// Create a Binance COIN-M Futures user stream client.
pub fn create_coin_futures_user_stream(config: ClientConfig) -> VenueResult<FuturesUserStreamClient> {
    create_futures_user_stream(BinanceFuturesConfig::coin_futures(config))
}

/// Configured base URL, or the market default when empty.
pub fn resolve_rest_url(config: &BinanceFuturesConfig) -> String {
    if config.base.rest.base_url.trim().is_empty() {
        BinanceEndpoints::for_market(config.market, config.testnet).rest_url
    } else {
        config.base.rest.base_url.clone()
    }
}
