//! Stop-signal handling.
//!
//! [`SignalListener`] waits for the first stop event, sets the shared
//! shutdown flag and asks the runtime to stop the container exactly once.
//! Events come from a [`SignalSource`]: [`OsSignals`] in production, or a
//! channel in tests.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use ctrmon_core::metrics as m;
use ctrmon_core::runtime::ContainerRuntime;
use ctrmon_core::shutdown::ShutdownSignal;

/// A stream of stop signals, identified by name.
pub trait SignalSource: Send + 'static {
    /// Wait for the next signal. `None` means the source is closed.
    fn recv(&mut self) -> impl Future<Output = Option<&'static str>> + Send;
}

/// SIGINT, SIGQUIT and SIGTERM on Unix; Ctrl-C elsewhere.
#[cfg(unix)]
pub struct OsSignals {
    sigint: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    /// Install the signal handlers.
    ///
    /// Handlers stay installed for the lifetime of the process, so later
    /// signals no longer terminate it.
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigquit: signal(SignalKind::quit())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }
}

#[cfg(unix)]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            s = self.sigint.recv() => s.map(|()| "SIGINT"),
            s = self.sigquit.recv() => s.map(|()| "SIGQUIT"),
            s = self.sigterm.recv() => s.map(|()| "SIGTERM"),
        }
    }
}

#[cfg(not(unix))]
pub struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<&'static str> {
        tokio::signal::ctrl_c().await.ok().map(|()| "CTRL_C")
    }
}

impl SignalSource for mpsc::Receiver<&'static str> {
    async fn recv(&mut self) -> Option<&'static str> {
        mpsc::Receiver::recv(self).await
    }
}

/// What ended the wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopTrigger {
    /// A signal arrived from the source.
    Signal(&'static str),
    /// The shutdown token was cancelled by something else.
    Cancelled,
}

/// Waits for one stop event and stops the container.
pub struct SignalListener<R: ContainerRuntime> {
    runtime: Arc<R>,
    shutdown: ShutdownSignal,
    image_name: String,
    container_name: String,
}

impl<R: ContainerRuntime> SignalListener<R> {
    pub fn new(
        runtime: Arc<R>,
        shutdown: ShutdownSignal,
        image_name: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            shutdown,
            image_name: image_name.into(),
            container_name: container_name.into(),
        }
    }

    /// Handle the first stop event, then return.
    ///
    /// Signals arriving after the first one are left in the source and
    /// have no effect. A failed stop is logged and not retried.
    pub async fn listen<S: SignalSource>(self, mut source: S) -> StopTrigger {
        let trigger = tokio::select! {
            signal = source.recv() => match signal {
                Some(name) => StopTrigger::Signal(name),
                None => {
                    warn!("signal source closed, waiting for shutdown");
                    self.shutdown.cancelled().await;
                    StopTrigger::Cancelled
                }
            },
            _ = self.shutdown.cancelled() => StopTrigger::Cancelled,
        };

        if let StopTrigger::Signal(name) = &trigger {
            metrics::counter!(m::STOP_SIGNALS_TOTAL, m::LABEL_SIGNAL => *name).increment(1);
            info!(signal = *name, "stop signal received");
        }

        self.shutdown.trigger();

        info!(
            image = %self.image_name,
            container = %self.container_name,
            "stopping container"
        );
        if let Err(e) = self
            .runtime
            .stop(&self.image_name, &self.container_name, false)
            .await
        {
            error!(image = %self.image_name, error = %e, "failed to stop container");
        }

        trigger
    }
}
