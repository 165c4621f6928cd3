//! Restart-on-failure loop for long-running tasks.
//!
//! A supervised task is a factory that builds a fresh future per attempt.
//! Whenever an attempt returns while shutdown has not been requested (an
//! error, or an unexpected clean exit), the supervisor waits out a back-off
//! and starts a new attempt.  The back-off doubles per consecutive restart
//! up to [`RestartPolicy::max_backoff`].

use std::future::Future;
use std::time::Duration;

use smartpot_types::PotResult;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestartPolicy {
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

fn stopping(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Run `task` until shutdown, restarting it after failures.
///
/// Returns the number of restarts performed.
pub async fn supervise<F, Fut>(
    name: String,
    mut shutdown: watch::Receiver<bool>,
    policy: RestartPolicy,
    mut task: F,
) -> usize
where
    F: FnMut(watch::Receiver<bool>) -> Fut,
    Fut: Future<Output = PotResult<()>>,
{
    let mut restarts = 0;
    let mut delay = policy.backoff;
    loop {
        if stopping(&shutdown) {
            break;
        }
        info!(task = %name, attempt = restarts + 1, "starting task");
        match task(shutdown.clone()).await {
            Ok(()) if stopping(&shutdown) => break,
            Ok(()) => warn!(task = %name, "task exited before shutdown"),
            Err(e) => error!(task = %name, error = %e, "task failed"),
        }

        restarts += 1;
        info!(task = %name, retry_in_secs = delay.as_secs_f64(), "restarting after back-off");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => {}
        }
        delay = (delay * 2).min(policy.max_backoff);
    }
    info!(task = %name, restarts, "task supervisor stopped");
    restarts
}
