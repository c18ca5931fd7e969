//! HTTP client infrastructure for venues.
//!
//! This module provides venue-agnostic HTTP client components:
//!
//! - [`RequestSigner`]: Trait for request signing (HMAC, ECDSA, etc.)
//! - [`ApiRoute`]: Host, API category and version of an endpoint family
//! - [`TimeSync`]: Server clock drift with single-flight refresh
//! - [`HttpClient`]: The authenticated request pipeline
//! - [`RequestResult`]: Uniform outcome with status and headers
//!
//! # Example
//!
//! ```ignore
//! use exchange_client::venue::http::{ApiRoute, AuthLevel, HttpClient};
//!
//! let route = ApiRoute::new("https://fapi.binance.com", "fapi", "1");
//! let client = HttpClient::new(Box::new(signer), route.clone(), rest_config)?;
//!
//! let result: RequestResult<MyResponse> = client
//!     .execute(&route, "endpoint", Method::GET, AuthLevel::Signed, &[], &cancel)
//!     .await;
//! ```

mod client;
mod response;
mod route;
mod signer;
mod time_sync;

pub use client::HttpClient;
pub use response::RequestResult;
pub use route::ApiRoute;
pub use signer::{build_query_string, AuthLevel, RequestSigner};
pub use time_sync::TimeSync;
