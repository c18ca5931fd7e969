//! Binance REST payloads for the user data stream endpoints.

use serde::Deserialize;

/// Response of `POST listenKey`.
///
/// Only the key itself is kept; other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenKeyResponse {
    pub listen_key: String,
}

/// Response of `PUT listenKey` and `DELETE listenKey` (`{}`).
#[derive(Debug, Clone, Deserialize)]
pub struct EmptyResponse {}
