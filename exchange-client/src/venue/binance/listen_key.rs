//! Listen key keeper for the futures user data stream.
//!
//! Listen keys expire after 60 minutes without a keepalive. The keeper
//! starts a stream and refreshes its key in the background until stopped.

use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::venue::error::VenueError;
use crate::venue::http::RequestResult;

use super::user_stream::{key_prefix, FuturesUserStreamClient};

/// Default keepalive interval (30 minutes as recommended by Binance).
const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Keepalive margin - refresh a bit earlier than recommended.
const KEEPALIVE_MARGIN: Duration = Duration::from_secs(60);

struct KeepaliveTask {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

enum KeeperState {
    Idle,
    /// A `start` call is waiting for the listen key
    Starting,
    Running(KeepaliveTask),
}

impl KeeperState {
    fn is_active(&self) -> bool {
        match self {
            KeeperState::Idle => false,
            KeeperState::Starting => true,
            KeeperState::Running(task) => !task.handle.is_finished(),
        }
    }
}

/// Keeps one listen key alive.
///
/// # Example
///
/// ```ignore
/// let keeper = ListenKeyKeeper::new(user_stream_client);
///
/// // Creates the listen key and starts the keepalive task
/// let result = keeper.start(&shutdown).await;
/// let listen_key = result.data().unwrap();
///
/// // Connect to WebSocket with listen key
/// let ws_url = endpoints.user_data_stream_url(listen_key);
///
/// // When done, stop the keeper (closes the key)
/// keeper.stop().await;
/// ```
pub struct ListenKeyKeeper {
    client: FuturesUserStreamClient,
    listen_key: RwLock<Option<String>>,
    state: Mutex<KeeperState>,
    keepalive_interval: Duration,
}

impl ListenKeyKeeper {
    pub fn new(client: FuturesUserStreamClient) -> Self {
        Self {
            client,
            listen_key: RwLock::new(None),
            state: Mutex::new(KeeperState::Idle),
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL - KEEPALIVE_MARGIN,
        }
    }

    /// Set a custom keepalive interval.
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }

    /// Start a user stream and the keepalive task.
    ///
    /// Only one start may be in progress or running at a time. Cancelling
    /// `cancel` stops the keepalive task but does not close the key; use
    /// [`stop`](Self::stop) for that.
    pub async fn start(&self, cancel: &CancellationToken) -> RequestResult<String> {
        {
            let mut state = self.state.lock();
            if state.is_active() {
                return RequestResult::from_error(VenueError::validation(
                    "listen key keeper is already running",
                ));
            }
            *state = KeeperState::Starting;
        }

        let result = self.client.start_user_stream(cancel).await;
        let Some(listen_key) = result.data().cloned() else {
            let mut state = self.state.lock();
            if matches!(*state, KeeperState::Starting) {
                *state = KeeperState::Idle;
            }
            return result;
        };

        let stopped_while_starting = {
            let mut state = self.state.lock();
            if matches!(*state, KeeperState::Starting) {
                *self.listen_key.write() = Some(listen_key.clone());

                let task_cancel = cancel.child_token();
                let handle = tokio::spawn(Self::keepalive_task(
                    self.client.clone(),
                    listen_key.clone(),
                    self.keepalive_interval,
                    task_cancel.clone(),
                ));
                *state = KeeperState::Running(KeepaliveTask {
                    handle,
                    cancel: task_cancel,
                });
                false
            } else {
                true
            }
        };

        if stopped_while_starting {
            self.close_listen_key(&listen_key).await;
            let (status, headers, _) = result.into_parts();
            return RequestResult::failure(
                status,
                headers,
                VenueError::cancelled("listen key keeper was stopped while starting"),
            );
        }

        result
    }

    /// Keepalive background task.
    async fn keepalive_task(
        client: FuturesUserStreamClient,
        listen_key: String,
        keepalive_interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = interval_at(Instant::now() + keepalive_interval, keepalive_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Listen key keepalive task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let result = client.keep_alive_user_stream(&listen_key, &cancel).await;
                    match result.error() {
                        None => debug!("Listen key keepalive successful"),
                        Some(e) if e.is_cancelled() => break,
                        Some(e) => {
                            warn!("Listen key keepalive failed: {}. Will retry on next interval.", e);
                        }
                    }
                }
            }
        }
    }

    /// Get the current listen key.
    pub fn listen_key(&self) -> Option<String> {
        self.listen_key.read().clone()
    }

    /// Stop the keepalive task and close the listen key.
    ///
    /// A failed close is logged; the server expires the key on its own.
    pub async fn stop(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), KeeperState::Idle);
        if let KeeperState::Running(task) = previous {
            task.cancel.cancel();
            task.handle.abort();
        }

        let listen_key = self.listen_key.write().take();

        if let Some(key) = listen_key {
            self.close_listen_key(&key).await;
            info!("Listen key keeper stopped");
        }
    }

    async fn close_listen_key(&self, listen_key: &str) {
        let result = self
            .client
            .stop_user_stream(listen_key, &CancellationToken::new())
            .await;
        if let Some(e) = result.error() {
            warn!("Failed to close listen key {}...: {}", key_prefix(listen_key), e);
        }
    }

    /// Check if the keepalive task is running.
    pub fn is_running(&self) -> bool {
        matches!(
            &*self.state.lock(),
            KeeperState::Running(task) if !task.handle.is_finished()
        )
    }
}

impl Drop for ListenKeyKeeper {
    fn drop(&mut self) {
        // The key itself expires on the server
        if let KeeperState::Running(task) =
            std::mem::replace(self.state.get_mut(), KeeperState::Idle)
        {
            task.cancel.cancel();
            task.handle.abort();
        }
    }
}
