//! Perpetual mode
//!
//! [`run_periodic`] drives a [`SyncEngine`] on a fixed interval until its
//! cancellation token fires. A pass that reports `error`, or that panics,
//! is followed by the shorter error cooldown instead of the full interval;
//! nothing a single pass does can end the loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::engine::{PassOutcome, SyncEngine};

/// Runs sync passes every `interval` until `shutdown` is cancelled
///
/// After a failed or panicking pass the next one starts after
/// `min(cooldown, interval)`. Later calls to [`SyncEngine::set_interval`]
/// take effect from the next wait. Cancelling `shutdown` abandons an
/// in-flight pass; the size recheck repairs partial files on the next run.
pub async fn run_periodic(
    engine: Arc<SyncEngine>,
    interval: Duration,
    cooldown: Duration,
    shutdown: CancellationToken,
) {
    engine.set_interval(interval);
    info!(
        interval_secs = engine.interval().as_secs(),
        cooldown_secs = cooldown.as_secs(),
        "starting periodic sync"
    );

    loop {
        let pass = AssertUnwindSafe(engine.run_once()).catch_unwind();

        let outcome = tokio::select! {
            outcome = pass => outcome,
            _ = shutdown.cancelled() => {
                info!("shutdown requested during sync pass");
                break;
            }
        };

        let interval = engine.interval();
        let wait = match outcome {
            Ok(PassOutcome::Error { error }) => {
                debug!(error = %error, "pass failed, using error cooldown");
                cooldown.min(interval)
            }
            Ok(outcome) => {
                debug!(status = outcome.status(), "pass finished");
                interval
            }
            Err(_) => {
                error!("sync pass panicked, using error cooldown");
                cooldown.min(interval)
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.cancelled() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    info!("periodic sync stopped");
}
