//! HTTP client for venue REST APIs.
//!
//! This module provides the authenticated request pipeline:
//! - Server time synchronization via [`TimeSync`]
//! - URL composition via [`ApiRoute`]
//! - Request signing via the `RequestSigner` trait
//! - Cancellation via [`CancellationToken`]
//! - Error normalization into [`RequestResult`]
//!
//! There is no retry logic here; errors are classified and handed back.

use std::sync::Arc;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::response::RequestResult;
use super::route::ApiRoute;
use super::signer::{build_query_string, AuthLevel, RequestSigner};
use super::time_sync::TimeSync;
use crate::venue::config::RestConfig;
use crate::venue::error::{VenueError, VenueResult};

/// Endpoint on the clock route that returns `{"serverTime": <ms>}`.
const SERVER_TIME_ENDPOINT: &str = "time";

/// HTTP client for venue REST APIs.
///
/// One client owns one [`TimeSync`]; share it between sub-clients with an
/// `Arc` so they all use the same drift measurement.
///
/// # Example
///
/// ```ignore
/// let signer = BinanceHmacSigner::new(api_key, api_secret);
/// let route = ApiRoute::new("https://fapi.binance.com", "fapi", "1");
///
/// let client = HttpClient::new(Box::new(signer), route.clone(), RestConfig::default())?;
///
/// let result: RequestResult<ListenKeyResponse> = client
///     .execute(&route, "listenKey", Method::POST, AuthLevel::ApiKey, &[], &cancel)
///     .await;
/// ```
pub struct HttpClient {
    /// The underlying HTTP client
    client: Client,
    /// Request signer for authentication
    signer: Arc<dyn RequestSigner>,
    /// Server clock drift
    time_sync: TimeSync,
    /// Route whose `time` endpoint is used for drift measurement
    clock_route: ApiRoute,
    /// Configuration
    config: RestConfig,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// # Arguments
    ///
    /// * `signer` - Request signer for authentication
    /// * `clock_route` - Route serving the server time endpoint (e.g. `fapi/v1`)
    /// * `config` - REST configuration
    pub fn new(
        signer: Box<dyn RequestSigner>,
        clock_route: ApiRoute,
        config: RestConfig,
    ) -> VenueResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| VenueError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            signer: Arc::from(signer),
            time_sync: TimeSync::new(config.time_sync.clone()),
            clock_route,
            config,
        })
    }

    /// Run the full pipeline for one endpoint: time sync, URL composition,
    /// authentication, dispatch and decoding.
    ///
    /// If the time sync fails the endpoint is not called and the sync
    /// failure, with the status and headers of the time request, is returned.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        route: &ApiRoute,
        endpoint: &str,
        method: Method,
        auth: AuthLevel,
        params: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> RequestResult<T> {
        if let (status, headers, Err(e)) = self.check_auto_timestamp(cancel).await.into_parts() {
            return RequestResult::failure(status, headers, e);
        }

        let url = route.url(endpoint);
        self.send_request(&url, method, auth, params, cancel).await
    }

    /// Measure the clock drift if the policy says it is missing or stale.
    pub async fn check_auto_timestamp(&self, cancel: &CancellationToken) -> RequestResult<()> {
        self.time_sync
            .ensure_synced(cancel, || self.server_time(cancel))
            .await
    }

    /// Fetch the server time in milliseconds (unsigned).
    pub async fn server_time(&self, cancel: &CancellationToken) -> RequestResult<i64> {
        let url = self.clock_route.url(SERVER_TIME_ENDPOINT);
        self.send_request::<ServerTimeResponse>(&url, Method::GET, AuthLevel::None, &[], cancel)
            .await
            .map(|response| response.server_time)
    }

    /// Dispatch a request to a full URL and decode the response.
    ///
    /// GET and DELETE carry the parameters in the query string, POST and PUT
    /// in a form-encoded body.
    pub async fn send_request<T: DeserializeOwned>(
        &self,
        url: &str,
        method: Method,
        auth: AuthLevel,
        params: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> RequestResult<T> {
        if cancel.is_cancelled() {
            return RequestResult::from_error(VenueError::cancelled("cancelled before dispatch"));
        }

        let params = if auth.is_signed() {
            self.sign_params(params)
        } else {
            to_owned_params(params)
        };

        let request = if sends_body(&method) {
            self.client
                .request(method.clone(), url)
                .body(build_query_string(&params))
        } else {
            self.client
                .request(method.clone(), build_url(url, &params))
        };
        let request = if auth.sends_api_key() {
            request.headers(self.build_auth_headers())
        } else {
            request
        };

        debug!("{} ({:?}) {}", method, auth, url);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return RequestResult::from_error(VenueError::cancelled(
                    "cancelled while request was in flight",
                ));
            }
            response = request.send() => response,
        };

        match response {
            Ok(response) => self.handle_response(response, cancel).await,
            Err(e) => {
                warn!("{} {} failed: {}", method, url, e);
                RequestResult::from_error(VenueError::from_transport(&e))
            }
        }
    }

    /// Add recvWindow, timestamp and signature to the parameters.
    fn sign_params(&self, params: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut signed_params = to_owned_params(params);

        if !signed_params.iter().any(|(k, _)| k == "recvWindow") {
            signed_params.push((
                "recvWindow".to_string(),
                self.config.recv_window_ms.to_string(),
            ));
        }

        self.signer
            .sign(&mut signed_params, self.time_sync.timestamp_ms());

        signed_params
    }

    /// Build request headers with authentication.
    fn build_auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();

        if let (Ok(header_name), Ok(header_value)) = (
            header::HeaderName::from_bytes(self.signer.api_key_header().as_bytes()),
            header::HeaderValue::from_str(self.signer.api_key()),
        ) {
            headers.insert(header_name, header_value);
        }

        for (name, value) in self.signer.additional_headers() {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::from_bytes(name.as_bytes()),
                header::HeaderValue::from_str(&value),
            ) {
                headers.insert(name, value);
            }
        }

        headers
    }

    /// Read and decode the HTTP response.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        cancel: &CancellationToken,
    ) -> RequestResult<T> {
        let status = response.status();
        let headers = response.headers().clone();

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return RequestResult::failure(
                    Some(status),
                    Some(headers),
                    VenueError::cancelled("cancelled while reading response"),
                );
            }
            body = response.text() => body,
        };

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                return RequestResult::failure(
                    Some(status),
                    Some(headers),
                    VenueError::from_transport(&e),
                )
            }
        };

        if !status.is_success() {
            let error = api_error(status, &body);
            warn!("Request rejected: {}", error);
            return RequestResult::failure(Some(status), Some(headers), error);
        }

        match serde_json::from_str(&body) {
            Ok(data) => RequestResult::success(Some(status), Some(headers), data),
            Err(e) => RequestResult::failure(
                Some(status),
                Some(headers),
                VenueError::Deserialization(format!(
                    "Failed to parse response: {} - body: {}",
                    e, body
                )),
            ),
        }
    }

    /// Clock drift state shared by all requests of this client.
    pub fn time_sync(&self) -> &TimeSync {
        &self.time_sync
    }

    pub fn clock_route(&self) -> &ApiRoute {
        &self.clock_route
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }
}

/// Binance-style error response.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: i32,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTimeResponse {
    server_time: i64,
}

/// Map a non-2xx response to an API error.
fn api_error(status: StatusCode, body: &str) -> VenueError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(error) => VenueError::Api {
            status: status.as_u16(),
            code: Some(error.code),
            message: error.msg,
        },
        Err(_) => VenueError::Api {
            status: status.as_u16(),
            code: None,
            message: if body.trim().is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                body.to_string()
            },
        },
    }
}

fn sends_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn to_owned_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Build the full URL with query parameters.
fn build_url(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        url.to_string()
    } else {
        format!("{}?{}", url, build_query_string(params))
    }
}
