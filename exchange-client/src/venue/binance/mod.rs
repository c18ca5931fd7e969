//! Binance futures user data stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     BinanceFuturesConfig                         │
//! │       market: Usdt/Coin     testnet     rest     auth            │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   BinanceEndpoints  +  BinanceHmacSigner  ─►  HttpClient         │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌────────────────────────────┐       ┌────────────────────────────┐
//! │  FuturesUserStreamClient   │ ◄──── │      ListenKeyKeeper       │
//! │  start / keepalive / stop  │       │  periodic keepalive task   │
//! └────────────────────────────┘       └────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use exchange_client::venue::binance::create_usdt_futures_user_stream;
//! use exchange_client::venue::ClientConfig;
//!
//! let client = create_usdt_futures_user_stream(ClientConfig::default())?;
//! let cancel = CancellationToken::new();
//!
//! let result = client.start_user_stream(&cancel).await;
//! if let Some(listen_key) = result.data() {
//!     client.keep_alive_user_stream(listen_key, &cancel).await;
//! }
//! ```

pub mod config;
pub mod endpoints;
pub mod factory;
pub mod listen_key;
pub mod signer;
pub mod types;
pub mod user_stream;

pub use config::{BinanceFuturesConfig, FuturesMarket};
pub use endpoints::BinanceEndpoints;
pub use factory::{
    create_coin_futures_user_stream, create_futures_user_stream, create_usdt_futures_user_stream,
};
pub use listen_key::ListenKeyKeeper;
pub use signer::BinanceHmacSigner;
pub use user_stream::FuturesUserStreamClient;
