//! Futures user data stream REST client.
//!
//! Three calls manage the listen key that authorizes the user data
//! WebSocket: start (POST), keepalive (PUT) and close (DELETE). All three
//! require the API key header but no signature.

use std::sync::Arc;

use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::venue::error::{VenueError, VenueResult};
use crate::venue::http::{ApiRoute, AuthLevel, HttpClient, RequestResult};

use super::config::FuturesMarket;
use super::endpoints::{paths, USER_STREAM_VERSION};
use super::types::{EmptyResponse, ListenKeyResponse};

/// User data stream client for USDT-M (`fapi`) or COIN-M (`dapi`) futures.
///
/// Cheap to clone; clones share the HTTP client and its clock drift.
#[derive(Clone)]
pub struct FuturesUserStreamClient {
    http_client: Arc<HttpClient>,
    route: ApiRoute,
}

impl FuturesUserStreamClient {
    pub fn new(http_client: Arc<HttpClient>, route: ApiRoute) -> Self {
        Self { http_client, route }
    }

    /// Client for the user stream route of `market` on `base_url`.
    pub fn for_market(
        http_client: Arc<HttpClient>,
        base_url: impl Into<String>,
        market: FuturesMarket,
    ) -> Self {
        let route = ApiRoute::new(base_url, market.api_category(), USER_STREAM_VERSION);
        Self::new(http_client, route)
    }

    pub fn route(&self) -> &ApiRoute {
        &self.route
    }

    pub fn http_client(&self) -> &Arc<HttpClient> {
        &self.http_client
    }

    /// Start a user data stream and return its listen key.
    ///
    /// If a stream is already open for the account, Binance returns the
    /// existing key and extends its validity.
    pub async fn start_user_stream(&self, cancel: &CancellationToken) -> RequestResult<String> {
        debug!("Starting user stream on {}", self.route);

        let result = self
            .http_client
            .execute::<ListenKeyResponse>(
                &self.route,
                paths::LISTEN_KEY,
                Method::POST,
                AuthLevel::ApiKey,
                &[],
                cancel,
            )
            .await
            .map(|response| response.listen_key);

        if let Some(listen_key) = result.data() {
            info!("Started user stream: {}...", key_prefix(listen_key));
        }
        result
    }

    /// Extend the validity of a listen key by 60 minutes.
    pub async fn keep_alive_user_stream(
        &self,
        listen_key: &str,
        cancel: &CancellationToken,
    ) -> RequestResult<()> {
        if let Err(e) = validate_listen_key(listen_key) {
            return RequestResult::from_error(e);
        }
        debug!("Keeping alive user stream: {}...", key_prefix(listen_key));

        self.http_client
            .execute::<EmptyResponse>(
                &self.route,
                paths::LISTEN_KEY,
                Method::PUT,
                AuthLevel::ApiKey,
                &[("listenKey", listen_key)],
                cancel,
            )
            .await
            .map(|_| ())
    }

    /// Close a user data stream.
    pub async fn stop_user_stream(
        &self,
        listen_key: &str,
        cancel: &CancellationToken,
    ) -> RequestResult<()> {
        if let Err(e) = validate_listen_key(listen_key) {
            return RequestResult::from_error(e);
        }

        let result = self
            .http_client
            .execute::<EmptyResponse>(
                &self.route,
                paths::LISTEN_KEY,
                Method::DELETE,
                AuthLevel::ApiKey,
                &[("listenKey", listen_key)],
                cancel,
            )
            .await
            .map(|_| ());

        if result.is_success() {
            info!("Closed user stream: {}...", key_prefix(listen_key));
        }
        result
    }
}

fn validate_listen_key(listen_key: &str) -> VenueResult<()> {
    if listen_key.trim().is_empty() {
        return Err(VenueError::validation("listen key must not be empty"));
    }
    Ok(())
}

/// First characters of a listen key, for logs.
pub(crate) fn key_prefix(listen_key: &str) -> &str {
    listen_key.get(..8).unwrap_or(listen_key)
}
