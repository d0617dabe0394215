//! Command-line interface definitions for the `spotinst-machine` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `spotinst-machine` binary.
#[derive(Debug, Parser)]
#[command(
    name = "spotinst-machine",
    about = "Provision and manage a machine inside a Spotinst Elastigroup",
    version,
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Directory holding machine records.
    #[arg(
        long,
        global = true,
        env = "SPOTINST_STORE_PATH",
        default_value = ".spotinst-machine",
        value_name = "DIR"
    )]
    pub(crate) store_path: String,
    /// Operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Machine operations exposed by the binary.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List the flags accepted by `create`.
    #[command(name = "flags")]
    Flags,
    /// Scale the Elastigroup by one instance and wait for its address.
    #[command(name = "create")]
    Create(CreateCommand),
    /// Print the machine's lifecycle state.
    #[command(name = "state")]
    State(MachineArgs),
    /// Print the machine's address.
    #[command(name = "ip")]
    Ip(MachineArgs),
    /// Print the container runtime URL of a running machine.
    #[command(name = "url")]
    Url(MachineArgs),
    /// Print SSH connection details.
    #[command(name = "ssh")]
    Ssh(MachineArgs),
    /// Accepted for compatibility; instances cannot be started in place.
    #[command(name = "start")]
    Start(MachineArgs),
    /// Accepted for compatibility; instances cannot be stopped in place.
    #[command(name = "stop")]
    Stop(MachineArgs),
    /// Accepted for compatibility; instances cannot be restarted in place.
    #[command(name = "restart")]
    Restart(MachineArgs),
    /// Detach the instance and lower the group's target capacity.
    #[command(name = "kill")]
    Kill(MachineArgs),
    /// Detach the instance and delete the machine record.
    #[command(name = "rm")]
    Remove(MachineArgs),
}

/// Selects an existing machine.
#[derive(Debug, Args)]
pub(crate) struct MachineArgs {
    /// Machine name.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: String,
}

/// Arguments for the `create` subcommand.
#[derive(Debug, Args)]
pub(crate) struct CreateCommand {
    /// Machine name.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: String,
    /// Spotinst API token.
    #[arg(
        long = "spotinst-token",
        env = "SPOTINST_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub(crate) token: Option<String>,
    /// Spotinst account id.
    #[arg(long = "spotinst-account", env = "SPOTINST_ACCOUNT", value_name = "ACCOUNT")]
    pub(crate) account: Option<String>,
    /// Elastigroup to scale for the new machine.
    #[arg(
        long = "spotinst-elastigroup-id",
        env = "SPOTINST_ELASTIGROUP_ID",
        value_name = "GROUP"
    )]
    pub(crate) group_id: Option<String>,
    /// Private key used to reach the instance over SSH.
    #[arg(
        long = "spotinst-sshkey-path",
        env = "SPOTINST_SSHKEY_PATH",
        value_name = "PATH"
    )]
    pub(crate) ssh_key_path: Option<String>,
    /// Connect through the instance's public IP instead of its private IP.
    #[arg(long = "use-public-ip", env = "USE_PUBLIC_IP")]
    pub(crate) use_public_ip: bool,
    /// SSH user (defaults to ubuntu).
    #[arg(long = "ssh-user", env = "SSH_USER", value_name = "USER")]
    pub(crate) ssh_user: Option<String>,
}
