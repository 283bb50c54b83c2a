use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;

use crate::Payload;
use crate::ReaperConfig;
use crate::Result;
use crate::TransitionDispatcher;

/// Spawns the background reap loop for `dispatcher`.
///
/// Returns `None` when reaping is disabled, leaving
/// [`TransitionDispatcher::reap_all`] to the embedder. The loop exits when
/// `shutdown_signal` changes or its sender is dropped.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
/// [`Error::Config`](crate::Error::Config) when `config` fails validation,
/// e.g. an `interval_ms` outside the accepted range.
pub fn spawn_reaper<P: Payload>(
    dispatcher: Arc<TransitionDispatcher<P>>,
    config: &ReaperConfig,
    shutdown_signal: watch::Receiver<()>,
) -> Result<Option<JoinHandle<()>>> {
    config.validate()?;

    if !config.enabled {
        debug!("Reaper disabled: no background reap worker");
        return Ok(None);
    }

    Ok(Some(spawn_reap_worker(
        dispatcher,
        config.interval_ms,
        shutdown_signal,
    )))
}

fn spawn_reap_worker<P: Payload>(
    dispatcher: Arc<TransitionDispatcher<P>>,
    interval_ms: u64,
    mut shutdown_signal: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let stats = dispatcher.reap_all(SystemTime::now());
                    if stats.watchers_reaped > 0 {
                        debug!(
                            "Background reap: expired {} watchers, pruned {} groups",
                            stats.watchers_reaped,
                            stats.groups_pruned
                        );
                    }
                }
                _ = shutdown_signal.changed() => {
                    info!("Background reaper received shutdown signal");
                    break;
                }
            }
        }
    })
}
