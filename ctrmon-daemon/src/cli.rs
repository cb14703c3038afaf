//! CLI argument definitions for ctrmon.
//!
//! Uses `clap` v4 derive macros. Positional arguments are collected as a
//! plain list so that the count check (exactly two) is done by
//! [`ctrmon_core::container::build`] together with the rest of the input
//! validation, and every failure exits with the same status.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};

use ctrmon_core::container::ConfigFlags;

/// Run a container as a service: start it, restart it when it exits,
/// and stop it on SIGINT, SIGQUIT or SIGTERM.
#[derive(Parser, Debug)]
#[command(name = "ctrmon")]
#[command(version, about, long_about = None)]
#[command(override_usage = "ctrmon [OPTIONS] <IMAGE_PATH> <IMAGE_NAME_OR_ID>")]
pub struct MonitorCli {
    /// Path to the image archive, followed by the image name or ID.
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,

    /// Name of the container.
    #[arg(long, default_value = "")]
    pub container_name: String,

    /// Port mapping between host and container (repeatable).
    #[arg(long = "port", value_name = "[HOST_IP:]HOST_PORT:CONTAINER_PORT")]
    pub ports: Vec<String>,

    /// Optional volume driver for the container.
    #[arg(long, default_value = "")]
    pub volume_driver: String,

    /// Volume to mount in the container (repeatable).
    #[arg(long = "volume", value_name = "VOLUME_NAME|HOST_PATH:CONTAINER_PATH")]
    pub volumes: Vec<String>,

    /// Run the container in the background.
    #[arg(long)]
    pub background: bool,

    /// Restart policy for the container (never, on-failure, unless-stopped, always).
    #[arg(long, value_name = "POLICY")]
    pub restart_policy: Option<String>,

    /// Automatically remove the container when it exits.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub auto_remove: bool,

    /// Forward the logs generated by the container.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub log: bool,

    /// Keep stdin open even if not attached.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub interactive: bool,

    /// Allocate a tty for the container.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub tty: bool,

    /// Allow only one running container instance of the image.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub one_instance: bool,

    /// Path to a ctrmon.toml settings file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the settings file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the settings file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,
}

impl MonitorCli {
    /// Raw flag values for the config builder.
    pub fn config_flags(&self) -> ConfigFlags {
        ConfigFlags {
            container_name: self.container_name.clone(),
            ports: self.ports.clone(),
            volume_driver: self.volume_driver.clone(),
            volumes: self.volumes.clone(),
            background: self.background,
            restart_policy: self.restart_policy.clone(),
            auto_remove: self.auto_remove,
            log: self.log,
            interactive: self.interactive,
            tty: self.tty,
            one_instance: self.one_instance,
        }
    }
}

/// Full usage text, as printed on argument errors.
pub fn usage() -> String {
    MonitorCli::command().render_help().to_string()
}
