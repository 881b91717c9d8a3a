//! Fixed-interval status polling.
//!
//! Cloud resources report readiness only through status queries, so waits
//! are driven by re-querying at a fixed interval until a condition holds.
//! There is no timeout and no backoff. A failing query ends the wait
//! immediately with [`InstallError::StatusQuery`]; only "not ready yet"
//! leads to another attempt.

use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::config::PollConfig;
use crate::error::{InstallError, InstallResult};

/// Polls a status query until it reports a ready state.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    spinner_interval: Duration,
    progress: bool,
}

impl Poller {
    /// Create a poller with the given query interval and no spinner.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            spinner_interval: Duration::from_millis(250),
            progress: false,
        }
    }

    /// Create a poller from configuration.
    #[must_use]
    pub const fn from_config(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
            spinner_interval: config.spinner_interval(),
            progress: config.progress,
        }
    }

    /// Enable or disable the terminal spinner.
    #[must_use]
    pub const fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Delay between queries.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Query until `is_ready` holds for the returned state.
    pub async fn wait_until<S, E, Q, Fut, R>(
        &self,
        label: &str,
        query: Q,
        is_ready: R,
    ) -> InstallResult<S>
    where
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<S, E>>,
        E: Into<InstallError>,
        R: Fn(&S) -> bool,
    {
        self.wait_for(label, query, |state| Ok(is_ready(state)))
            .await
    }

    /// Query until `classify` reports ready.
    ///
    /// `classify` returns `Ok(true)` for a ready state, `Ok(false)` to keep
    /// waiting and an error for a terminal state that will never become
    /// ready. Query errors and classification errors both end the wait
    /// without a further delay.
    pub async fn wait_for<S, E, Q, Fut, C>(
        &self,
        label: &str,
        query: Q,
        classify: C,
    ) -> InstallResult<S>
    where
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<S, E>>,
        E: Into<InstallError>,
        C: Fn(&S) -> InstallResult<bool>,
    {
        let spinner = Spinner::start(label, self.spinner_interval, self.progress);
        self.watch(spinner, label, query, classify).await
    }

    async fn watch<S, E, Q, Fut, C>(
        &self,
        _spinner: Spinner,
        label: &str,
        mut query: Q,
        classify: C,
    ) -> InstallResult<S>
    where
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<S, E>>,
        E: Into<InstallError>,
        C: Fn(&S) -> InstallResult<bool>,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let state = query()
                .await
                .map_err(|e| InstallError::StatusQuery {
                    resource: label.to_owned(),
                    source: Box::new(e.into()),
                })?;

            if classify(&state)? {
                debug!(label = %label, attempt, "ready");
                return Ok(state);
            }

            debug!(label = %label, attempt, delay = ?self.interval, "not ready, waiting");
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Terminal spinner that lives exactly as long as a wait.
///
/// The bar is cleared when the guard drops, which covers success, errors
/// and cancellation of the waiting future.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn start(label: &str, tick: Duration, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner().tick_strings(&["|", "-", " "]));
        bar.set_message(format!("waiting for {label}"));
        bar.enable_steady_tick(tick);
        Self { bar }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
