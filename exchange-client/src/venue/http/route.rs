//! URL composition for versioned REST APIs.

use std::fmt;

/// Where a family of endpoints lives: host, API category and version.
///
/// Binance splits its REST surface by category (`api`, `fapi`, `dapi`) and
/// version (`v1`, `v2`, `v3`). A sub-client holds one route and asks it for
/// endpoint URLs:
///
/// ```ignore
/// let route = ApiRoute::new("https://fapi.binance.com", "fapi", "1");
/// assert_eq!(route.url("listenKey"), "https://fapi.binance.com/fapi/v1/listenKey");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoute {
    base_url: String,
    api_category: String,
    version: String,
}

impl ApiRoute {
    pub fn new(
        base_url: impl Into<String>,
        api_category: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_category: api_category.into(),
            version: version.into(),
        }
    }

    /// Same host and category, different version.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_category(&self) -> &str {
        &self.api_category
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full URL for an endpoint on this route.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/v{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_category.trim_matches('/'),
            self.version,
            endpoint.trim_start_matches('/')
        )
    }
}

impl fmt::Display for ApiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url(""))
    }
}
