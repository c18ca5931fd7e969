//! Error classification shared across the client.
//!
//! This module provides:
//! - The [`ErrorCategory`] enum describing how an error should be handled
//! - The [`ErrorClassification`] trait that error types implement so callers
//!   above the request pipeline can decide on retries themselves
//!
//! # Usage
//!
//! ```rust,ignore
//! use exchange_client::error::ErrorClassification;
//!
//! fn should_retry(err: &impl ErrorClassification, attempt: u32) -> bool {
//!     err.is_transient() && attempt < err.max_retries()
//! }
//! ```

mod traits;

pub use traits::*;
