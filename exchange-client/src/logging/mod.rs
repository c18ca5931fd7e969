//! Standardized logging configuration.
//!
//! Provides consistent logging format for the library and the CLI with
//! support for:
//! - Human-readable console output (default)
//! - Compact single-line output
//! - JSON output for log aggregation
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Standard tracing filter (e.g., `info`, `exchange_client=debug`)
//! - `LOG_FORMAT`: Output format - `pretty` (default), `compact`, or `json`
//! - `LOG_TIMESTAMPS`: Timestamp format - `local` (default), `utc`, or `none`
//!
//! # Usage
//!
//! ```rust,ignore
//! use exchange_client::logging::{init_logging, LogConfig};
//!
//! init_logging(LogConfig::from_env().with_app_name("user-stream"))?;
//! ```

mod config;

pub use config::{init_logging, LogConfig, LogFormat, TimestampFormat};
