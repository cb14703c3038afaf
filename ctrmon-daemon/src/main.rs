//! ctrmon - run a single container as a supervised service.
//!
//! Startup sequence:
//! 1. Parse CLI arguments
//! 2. Load settings (file, env, CLI overrides)
//! 3. Initialize tracing
//! 4. Validate arguments and build the container config
//! 5. Connect to Docker
//! 6. Spawn the signal listener, then run the supervisor loop
//!
//! Exit codes: 0 on normal shutdown, 255 on invalid input, 1 on runtime
//! initialization failure.

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use ctrmon_core::config::MonitorSettings;
use ctrmon_core::container;
use ctrmon_core::error::{CtrmonError, INPUT_ERROR_EXIT_CODE};
use ctrmon_core::runtime::ContainerRuntime;
use ctrmon_core::shutdown::ShutdownSignal;
use ctrmon_daemon::cli::{self, MonitorCli};
use ctrmon_daemon::logging;
use ctrmon_daemon::signals::{OsSignals, SignalListener};
use ctrmon_daemon::supervisor::Supervisor;
use ctrmon_docker::BollardRuntime;

#[tokio::main]
async fn main() {
    let cli = match MonitorCli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                INPUT_ERROR_EXIT_CODE
            } else {
                0
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        let code = e
            .downcast_ref::<CtrmonError>()
            .map_or(1, CtrmonError::exit_code);
        if code == INPUT_ERROR_EXIT_CODE {
            eprintln!();
            eprintln!("{}", cli::usage());
        }
        process::exit(code);
    }
}

async fn run(cli: MonitorCli) -> Result<()> {
    let mut settings = MonitorSettings::load(cli.config.as_ref())
        .await
        .map_err(CtrmonError::from)?;
    settings.apply_cli_overrides(cli.log_level.as_deref(), cli.log_format.as_deref());
    settings.validate().map_err(CtrmonError::from)?;

    logging::init_tracing(&settings.general)?;

    let (target, config) =
        container::build(&cli.args, &cli.config_flags()).map_err(CtrmonError::from)?;

    let runtime = BollardRuntime::connect(&settings.docker.socket)
        .map_err(CtrmonError::from)?
        .with_stop_timeout(settings.docker.stop_timeout());
    let runtime = Arc::new(runtime);

    info!(
        image = %target.image_name,
        image_path = %target.image_path.display(),
        config = %runtime.render_config(&config, false),
        "ctrmon starting"
    );

    let shutdown = ShutdownSignal::new();

    let signals = OsSignals::install().map_err(CtrmonError::from)?;
    let listener = SignalListener::new(
        Arc::clone(&runtime),
        shutdown.clone(),
        target.image_name.clone(),
        config.container_name.clone(),
    );
    let listener_handle = tokio::spawn(listener.listen(signals));

    let supervisor = Supervisor::new(
        runtime,
        shutdown.clone(),
        target,
        config,
        settings.supervisor.restart_delay(),
    );
    supervisor.run().await;

    // flag is set here; wait for the single stop call to finish
    match listener_handle.await {
        Ok(trigger) => info!(?trigger, "ctrmon stopped"),
        Err(e) => tracing::error!(error = %e, "signal listener task failed"),
    }

    Ok(())
}
