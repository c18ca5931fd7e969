//! Server clock drift tracking.
//!
//! Signed requests carry a `timestamp` that the server checks against its own
//! clock within `recvWindow`. [`TimeSync`] measures the offset between the
//! local clock and the server, keeps it for the configured interval and
//! applies it to every timestamp it hands out.
//!
//! Refreshes are single-flight: when several requests find the offset stale
//! at the same time, one of them fetches the server time and the others wait
//! for that attempt and share its outcome.

use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::response::RequestResult;
use crate::venue::config::TimeSyncConfig;
use crate::venue::error::VenueError;

#[derive(Debug, Default)]
struct TimeSyncState {
    /// Server time minus local time, in milliseconds
    offset_ms: i64,
    last_synced_at: Option<Instant>,
    /// Bumped after every completed (non-cancelled) sync attempt
    generation: u64,
    last_outcome: Option<RequestResult<()>>,
}

/// Clock drift state shared by every request of one client.
pub struct TimeSync {
    policy: TimeSyncConfig,
    state: RwLock<TimeSyncState>,
    /// Held by the caller currently fetching the server time
    refresh: Mutex<()>,
}

impl TimeSync {
    pub fn new(policy: TimeSyncConfig) -> Self {
        Self {
            policy,
            state: RwLock::new(TimeSyncState::default()),
            refresh: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &TimeSyncConfig {
        &self.policy
    }

    /// Measured drift in milliseconds (0 until the first sync).
    pub fn offset_ms(&self) -> i64 {
        self.state.read().offset_ms
    }

    pub fn last_synced_at(&self) -> Option<Instant> {
        self.state.read().last_synced_at
    }

    /// Returns true if the next request should measure the drift first.
    pub fn needs_sync(&self) -> bool {
        if !self.policy.auto_timestamp {
            return false;
        }
        match self.state.read().last_synced_at {
            None => true,
            Some(at) => at.elapsed() >= self.policy.recalculation_interval(),
        }
    }

    /// Force a resync on the next request, e.g. after a -1021 rejection.
    pub fn invalidate(&self) {
        self.state.write().last_synced_at = None;
    }

    /// Current time in milliseconds, corrected by the measured drift and the
    /// configured manual offset.
    pub fn timestamp_ms(&self) -> u64 {
        let corrected = local_time_ms() + self.offset_ms() + self.policy.manual_offset_ms;
        corrected.max(0) as u64
    }

    /// Make sure the drift is known and fresh.
    ///
    /// `fetch_server_time` is only invoked when a sync is actually needed and
    /// no concurrent caller already performed one. It must return the server
    /// time in milliseconds.
    ///
    /// A failed fetch is returned as [`VenueError::TimeSync`] with the
    /// response status and headers of the fetch. Cancellation is returned as
    /// [`VenueError::Cancelled`].
    pub async fn ensure_synced<F, Fut>(
        &self,
        cancel: &CancellationToken,
        fetch_server_time: F,
    ) -> RequestResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RequestResult<i64>>,
    {
        if !self.needs_sync() {
            return RequestResult::success(None, None, ());
        }

        let seen_generation = self.state.read().generation;

        let _refresh_guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return RequestResult::from_error(VenueError::cancelled(
                    "cancelled while waiting for time sync",
                ));
            }
            guard = self.refresh.lock() => guard,
        };

        {
            let state = self.state.read();
            if state.generation != seen_generation {
                if let Some(outcome) = &state.last_outcome {
                    debug!("Reusing time sync outcome from concurrent request");
                    return outcome.clone();
                }
            }
        }

        if !self.needs_sync() {
            return RequestResult::success(None, None, ());
        }

        debug!("Synchronizing clock with server");
        let local_before = local_time_ms();
        let fetched = fetch_server_time().await;
        let local_after = local_time_ms();

        let (status, headers, outcome) = fetched.into_parts();
        match outcome {
            Ok(server_time) => {
                let round_trip = local_after - local_before;
                let offset = server_time - (local_before + round_trip / 2);
                info!(
                    offset_ms = offset,
                    round_trip_ms = round_trip,
                    "Clock drift measured"
                );
                let result = RequestResult::success(status, headers, ());
                self.record(Some(offset), result.clone());
                result
            }
            Err(e) if e.is_cancelled() => RequestResult::failure(status, headers, e),
            Err(e) => {
                warn!("Server time request failed: {}", e);
                let result = RequestResult::failure(status, headers, VenueError::time_sync(e));
                self.record(None, result.clone());
                result
            }
        }
    }

    fn record(&self, offset_ms: Option<i64>, outcome: RequestResult<()>) {
        let mut state = self.state.write();
        if let Some(offset_ms) = offset_ms {
            state.offset_ms = offset_ms;
            state.last_synced_at = Some(Instant::now());
        }
        state.generation = state.generation.wrapping_add(1);
        state.last_outcome = Some(outcome);
    }
}

fn local_time_ms() -> i64 {
    Utc::now().timestamp_millis()
}
