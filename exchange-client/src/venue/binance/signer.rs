//! HMAC-SHA256 request signing for Binance API.
//!
//! Binance uses HMAC-SHA256 for request authentication. This module
//! provides the signer implementation that:
//! 1. Adds timestamp parameter
//! 2. Computes HMAC-SHA256 signature of the query string
//! 3. Appends signature to parameters

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::venue::config::AuthConfig;
use crate::venue::error::{VenueError, VenueResult};
use crate::venue::http::{build_query_string, RequestSigner};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 request signer for Binance API.
///
/// # Example
///
/// ```ignore
/// let signer = BinanceHmacSigner::new("api_key", "api_secret");
///
/// let mut params = vec![("listenKey".to_string(), "abc".to_string())];
/// signer.sign(&mut params, 1234567890);
///
/// // params now contains timestamp and signature
/// ```
#[derive(Clone)]
pub struct BinanceHmacSigner {
    api_key: String,
    api_secret: String,
}

impl BinanceHmacSigner {
    /// Create a new Binance HMAC signer.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Create a signer from the environment variables named in `auth`.
    pub fn from_auth_config(auth: &AuthConfig) -> VenueResult<Self> {
        let api_key = auth.load_api_key().ok_or_else(|| {
            VenueError::Configuration(format!("Missing API key: set {}", auth.api_key_env))
        })?;
        let api_secret = auth.load_api_secret().ok_or_else(|| {
            VenueError::Configuration(format!("Missing API secret: set {}", auth.api_secret_env))
        })?;
        Ok(Self::new(api_key, api_secret))
    }

    /// Compute HMAC-SHA256 signature.
    fn compute_signature(&self, data: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(data.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for BinanceHmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceHmacSigner")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl RequestSigner for BinanceHmacSigner {
    fn sign(&self, params: &mut Vec<(String, String)>, timestamp: u64) {
        params.push(("timestamp".to_string(), timestamp.to_string()));

        let signature = self.compute_signature(&build_query_string(params));

        params.push(("signature".to_string(), signature));
    }

    fn api_key_header(&self) -> &str {
        "x-mbx-apikey"
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }
}
