//! Request signing traits for authenticated API calls.
//!
//! This module provides a venue-agnostic abstraction for request signing.
//! Each venue implements its own signing algorithm (HMAC-SHA256 for Binance).

/// How much authentication an endpoint requires.
///
/// Mirrors Binance's endpoint security types: `NONE`, API-key only
/// (`USER_STREAM`, `MARKET_DATA`) and `SIGNED` (`TRADE`, `USER_DATA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLevel {
    /// No API key, no signature
    None,
    /// API key header only
    ApiKey,
    /// API key header plus timestamp and signature parameters
    Signed,
}

impl AuthLevel {
    pub fn sends_api_key(self) -> bool {
        !matches!(self, AuthLevel::None)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, AuthLevel::Signed)
    }
}

/// Trait for signing HTTP requests.
///
/// Implementations of this trait handle venue-specific authentication:
/// - Adding timestamp parameters
/// - Computing signatures
/// - Providing API key headers
///
/// # Example
///
/// ```ignore
/// struct HmacSigner {
///     api_key: String,
///     api_secret: String,
/// }
///
/// impl RequestSigner for HmacSigner {
///     fn sign(&self, params: &mut Vec<(String, String)>, timestamp: u64) {
///         params.push(("timestamp".to_string(), timestamp.to_string()));
///         let query = build_query_string(params);
///         let signature = hmac_sha256(&self.api_secret, &query);
///         params.push(("signature".to_string(), signature));
///     }
///
///     fn api_key_header(&self) -> &str {
///         "X-MBX-APIKEY"
///     }
///
///     fn api_key(&self) -> &str {
///         &self.api_key
///     }
/// }
/// ```
pub trait RequestSigner: Send + Sync {
    /// Sign the request parameters.
    ///
    /// This method should:
    /// 1. Add any required timestamp parameters
    /// 2. Compute the signature from existing parameters
    /// 3. Append the signature to the parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Mutable reference to the request parameters
    /// * `timestamp` - Drift-corrected timestamp in milliseconds
    fn sign(&self, params: &mut Vec<(String, String)>, timestamp: u64);

    /// Returns the header name for the API key.
    fn api_key_header(&self) -> &str;

    /// Returns the API key value.
    fn api_key(&self) -> &str;

    /// Returns additional headers required for authentication.
    fn additional_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Build a form-urlencoded query string from parameters.
///
/// This is also the string that gets signed and sent unchanged, so parameter
/// order is preserved and keys and values are encoded exactly once.
pub fn build_query_string(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}
