//! Venue connectivity.
//!
//! - [`http`]: Authenticated REST pipeline shared by all venue sub-clients
//! - [`binance`]: Binance futures user data stream client
//!
//! # Example
//!
//! ```ignore
//! use exchange_client::venue::binance::create_usdt_futures_user_stream;
//! use exchange_client::venue::ClientConfig;
//!
//! let user_stream = create_usdt_futures_user_stream(ClientConfig::default())?;
//! let result = user_stream.start_user_stream(&cancel).await;
//! ```

mod config;
mod error;

pub mod binance;
pub mod http;

pub use config::{AuthConfig, ClientConfig, RestConfig, TimeSyncConfig};
pub use error::{ErrorKind, VenueError, VenueResult};
