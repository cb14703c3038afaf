//! Supervisor loop.
//!
//! Starts the container and starts it again every time it stops, until the
//! shutdown flag is set. Any return from `start` means the container is no
//! longer running; only the flag decides whether another start happens.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use ctrmon_core::container::{ContainerConfig, ImageTarget};
use ctrmon_core::metrics as m;
use ctrmon_core::runtime::ContainerRuntime;
use ctrmon_core::shutdown::ShutdownSignal;

/// Restart loop around a [`ContainerRuntime`].
pub struct Supervisor<R: ContainerRuntime> {
    runtime: Arc<R>,
    shutdown: ShutdownSignal,
    target: ImageTarget,
    config: ContainerConfig,
    restart_delay: Duration,
}

impl<R: ContainerRuntime> Supervisor<R> {
    pub fn new(
        runtime: Arc<R>,
        shutdown: ShutdownSignal,
        target: ImageTarget,
        config: ContainerConfig,
        restart_delay: Duration,
    ) -> Self {
        Self {
            runtime,
            shutdown,
            target,
            config,
            restart_delay,
        }
    }

    /// Run until stop is requested.
    ///
    /// Returns the number of start attempts made. The backoff sleep is
    /// skipped when the flag is already set after a start, and is cut short
    /// when the shutdown token is cancelled during it.
    pub async fn run(&self) -> u64 {
        let image = self.target.image_name.as_str();
        let mut attempts: u64 = 0;

        while !self.shutdown.is_stop_requested() {
            attempts += 1;
            metrics::counter!(m::CONTAINER_STARTS_TOTAL, m::LABEL_IMAGE => image.to_owned())
                .increment(1);
            info!(image, attempt = attempts, "starting container");

            let result = self
                .runtime
                .start(
                    &self.target.image_path,
                    image,
                    &self.config,
                    self.shutdown.token(),
                )
                .await;

            match result {
                Ok(()) => info!(image, "container stopped"),
                Err(e) => {
                    metrics::counter!(
                        m::CONTAINER_START_FAILURES_TOTAL,
                        m::LABEL_IMAGE => image.to_owned()
                    )
                    .increment(1);
                    error!(image, error = %e, "container run failed");
                }
            }

            if self.shutdown.is_stop_requested() {
                break;
            }

            info!(
                image,
                delay_secs = self.restart_delay.as_secs_f64(),
                "restarting container after delay"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.restart_delay) => {}
                _ = self.shutdown.cancelled() => break,
            }
            metrics::counter!(m::CONTAINER_RESTARTS_TOTAL, m::LABEL_IMAGE => image.to_owned())
                .increment(1);
        }

        info!(image, attempts, "supervisor loop finished");
        attempts
    }
}
