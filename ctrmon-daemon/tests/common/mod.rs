//! Shared test helpers: a scriptable `ContainerRuntime` mock.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ctrmon_core::container::{ConfigFlags, ContainerConfig, ImageTarget};
use ctrmon_core::error::RuntimeError;
use ctrmon_core::runtime::ContainerRuntime;
use ctrmon_core::shutdown::ShutdownSignal;

/// A recorded `stop` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCall {
    pub image_name: String,
    pub container_name: String,
    pub force: bool,
}

/// Mock runtime that records calls and supports configurable behavior.
///
/// - `start` returns immediately unless `blocking` is set, in which case it
///   waits until `stop` is called (like a real running container).
/// - `trigger_on_start(n, signal)` sets the shutdown flag during the n-th
///   start call (1-based), simulating a signal arriving mid-run.
#[derive(Default)]
pub struct MockRuntime {
    start_calls: AtomicUsize,
    launches: AtomicUsize,
    stop_calls: std::sync::Mutex<Vec<StopCall>>,
    fail_start: bool,
    fail_stop: bool,
    blocking: bool,
    run_for: Option<Duration>,
    trigger: Option<(usize, ShutdownSignal)>,
    stopped: CancellationToken,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `start` call returns an error.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Every `stop` call returns an error.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// `start` waits until `stop` is called.
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// `start` sleeps for `duration` before returning.
    pub fn running_for(mut self, duration: Duration) -> Self {
        self.run_for = Some(duration);
        self
    }

    /// Trigger `signal` during the n-th start call.
    pub fn trigger_on_start(mut self, n: usize, signal: ShutdownSignal) -> Self {
        self.trigger = Some((n, signal));
        self
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Start calls that got past the cancellation check.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> Vec<StopCall> {
        self.stop_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl ContainerRuntime for MockRuntime {
    async fn start(
        &self,
        _image_path: &Path,
        image_name: &str,
        _config: &ContainerConfig,
        cancel: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let call = self.start_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.launches.fetch_add(1, Ordering::SeqCst);

        if let Some(duration) = self.run_for {
            tokio::time::sleep(duration).await;
        }
        if self.blocking {
            self.stopped.cancelled().await;
        }
        if let Some((n, signal)) = &self.trigger {
            if call == *n {
                signal.trigger();
            }
        }

        if self.fail_start {
            return Err(RuntimeError::StartFailed {
                image: image_name.to_owned(),
                reason: "mock start failure".to_owned(),
            });
        }
        Ok(())
    }

    async fn stop(
        &self,
        image_name: &str,
        container_name: &str,
        force: bool,
    ) -> Result<(), RuntimeError> {
        if let Ok(mut calls) = self.stop_calls.lock() {
            calls.push(StopCall {
                image_name: image_name.to_owned(),
                container_name: container_name.to_owned(),
                force,
            });
        }
        self.stopped.cancel();

        if self.fail_stop {
            return Err(RuntimeError::StopFailed {
                target: image_name.to_owned(),
                reason: "mock stop failure".to_owned(),
            });
        }
        Ok(())
    }
}

pub fn sample_target() -> ImageTarget {
    ImageTarget {
        image_path: PathBuf::from("/tmp/svc-image.tar"),
        image_name: "svc:latest".to_owned(),
    }
}

pub fn sample_config() -> ContainerConfig {
    ContainerConfig::from_flags(&ConfigFlags {
        container_name: "svc".to_owned(),
        ..ConfigFlags::default()
    })
    .expect("default flags are valid")
}

pub fn shared(runtime: MockRuntime) -> Arc<MockRuntime> {
    Arc::new(runtime)
}
