//! User Stream CLI
//!
//! Provides commands for:
//! - `start`: Open a user data stream and print its listen key
//! - `keepalive`: Extend a listen key
//! - `stop`: Close a listen key
//! - `watch`: Open a stream and keep it alive until Ctrl-C

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use exchange_client::logging::{init_logging, LogConfig};
use exchange_client::venue::binance::{
    create_futures_user_stream, BinanceEndpoints, BinanceFuturesConfig, FuturesMarket,
    FuturesUserStreamClient, ListenKeyKeeper,
};
use exchange_client::venue::http::RequestResult;

/// Binance futures user data stream CLI
#[derive(Parser)]
#[command(name = "user-stream")]
#[command(about = "Manage Binance futures user data stream listen keys")]
#[command(version)]
struct Cli {
    /// Futures market: usdt or coin
    #[arg(long, global = true, value_parser = parse_market)]
    market: Option<FuturesMarket>,

    /// Use the futures testnet
    #[arg(long, global = true)]
    testnet: bool,

    /// TOML configuration file
    #[arg(long, global = true, env = "USER_STREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Start a user data stream and print the listen key
    Start,
    /// Keep a listen key alive
    Keepalive {
        /// Listen key returned by `start`
        listen_key: String,
    },
    /// Close a listen key
    Stop {
        /// Listen key returned by `start`
        listen_key: String,
    },
    /// Start a stream and keep it alive until Ctrl-C, then close it
    Watch,
}

fn parse_market(s: &str) -> Result<FuturesMarket, String> {
    s.parse::<FuturesMarket>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig::from_env().with_app_name("exchange-client")) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let endpoints = BinanceEndpoints::for_market(config.market, config.testnet);
    let client = create_futures_user_stream(config)?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    match cli.command {
        Commands::Start => {
            let listen_key = into_anyhow(client.start_user_stream(&cancel).await)?;
            println!("{}", listen_key);
            info!("Stream URL: {}", endpoints.user_data_stream_url(&listen_key));
        }
        Commands::Keepalive { listen_key } => {
            into_anyhow(client.keep_alive_user_stream(&listen_key, &cancel).await)?;
            println!("ok");
        }
        Commands::Stop { listen_key } => {
            into_anyhow(client.stop_user_stream(&listen_key, &cancel).await)?;
            println!("ok");
        }
        Commands::Watch => watch(client, &endpoints, cancel).await?,
    }

    Ok(())
}

async fn watch(
    client: FuturesUserStreamClient,
    endpoints: &BinanceEndpoints,
    cancel: CancellationToken,
) -> Result<()> {
    let keeper = ListenKeyKeeper::new(client);
    let listen_key = into_anyhow(keeper.start(&cancel).await)?;

    println!("{}", listen_key);
    info!(
        "Keeping {} alive every {:?}; press Ctrl-C to close",
        endpoints.user_data_stream_url(&listen_key),
        keeper.keepalive_interval()
    );

    cancel.cancelled().await;
    keeper.stop().await;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<BinanceFuturesConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            BinanceFuturesConfig::from_toml_str(&contents)?
        }
        None => BinanceFuturesConfig::default(),
    };

    // Flags override the file
    if let Some(market) = cli.market {
        config.market = market;
    }
    config.testnet = config.testnet || cli.testnet;
    Ok(config)
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, cancelling");
            cancel.cancel();
        }
    });
}

fn into_anyhow<T>(result: RequestResult<T>) -> Result<T> {
    let status = result.status();
    result.into_result().map_err(|e| match status {
        Some(status) => anyhow!("{:?} error (HTTP {}): {}", e.kind(), status.as_u16(), e),
        None => anyhow!("{:?} error: {}", e.kind(), e),
    })
}
