//! Binary entry point for the `spotinst-machine` CLI.
//!
//! The binary plays the host role for a single machine: it feeds flags to
//! the driver, runs one lifecycle operation, and persists the driver record
//! in the store directory between invocations.

use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spotinst_machine::config::{
    FLAG_ACCOUNT, FLAG_GROUP_ID, FLAG_SSH_KEY_PATH, FLAG_SSH_USER, FLAG_TOKEN, FLAG_USE_PUBLIC_IP,
};
use spotinst_machine::{
    ClientFactory, ConfigError, DriverError, FlagValues, HttpClientFactory, MachineDriver,
    PollConfig, RecordStore, SpotinstDriver, StoreError, create_flags,
};

mod cli;

use cli::{Cli, Command, CreateCommand, MachineArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("machine {0} already exists")]
    AlreadyExists(String),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli, &mut io::stdout()).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    let store = RecordStore::new(cli.store_path.as_str());
    match cli.command {
        Command::Flags => write_flags(out),
        Command::Create(args) => create(&store, args, out).await,
        Command::State(args) => {
            let driver = open(&store, &args)?;
            let state = driver.state().await?;
            writeln!(out, "{state}")?;
            Ok(())
        }
        Command::Ip(args) => {
            let driver = open(&store, &args)?;
            writeln!(out, "{}", driver.ip()?)?;
            Ok(())
        }
        Command::Url(args) => {
            let driver = open(&store, &args)?;
            writeln!(out, "{}", driver.url().await?)?;
            Ok(())
        }
        Command::Ssh(args) => {
            let mut driver = open(&store, &args)?;
            let host = driver.ssh_hostname()?;
            let user = driver.ssh_username();
            let port = driver.ssh_port();
            writeln!(out, "{user}@{host}:{port}")?;
            writeln!(out, "{}", driver.ssh_key_path())?;
            store.save(&driver.into_record())?;
            Ok(())
        }
        Command::Start(args) => {
            open(&store, &args)?.start()?;
            Ok(())
        }
        Command::Stop(args) => {
            open(&store, &args)?.stop()?;
            Ok(())
        }
        Command::Restart(args) => {
            open(&store, &args)?.restart()?;
            Ok(())
        }
        Command::Kill(args) => {
            let mut driver = open(&store, &args)?;
            driver.kill().await?;
            store.save(&driver.into_record())?;
            Ok(())
        }
        Command::Remove(args) => {
            let mut driver = open(&store, &args)?;
            driver.remove().await?;
            store.delete(&args.name)?;
            info!(machine = %args.name, "machine removed");
            Ok(())
        }
    }
}

fn write_flags(out: &mut impl Write) -> Result<(), CliError> {
    for flag in create_flags() {
        writeln!(out, "--{}\t{}\t{}", flag.name, flag.env_var, flag.usage)?;
    }
    Ok(())
}

fn open(
    store: &RecordStore,
    args: &MachineArgs,
) -> Result<SpotinstDriver<HttpClientFactory>, CliError> {
    let record = store.load(&args.name)?;
    Ok(SpotinstDriver::from_record(record, HttpClientFactory::new()))
}

async fn create(
    store: &RecordStore,
    args: CreateCommand,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if store.exists(&args.name)? {
        return Err(CliError::AlreadyExists(args.name));
    }

    let store_path = Utf8PathBuf::from(store.root());
    let mut driver = SpotinstDriver::new(args.name.as_str(), store_path, HttpClientFactory::new());
    driver.set_config_from_flags(&flag_values(&args))?;
    driver.pre_create_check()?;

    let poll = PollConfig::load_without_cli_args()?.settings()?;
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling provisioning");
            watcher.cancel();
        }
    });

    let driver = driver.with_poll_settings(poll).with_cancellation(cancel);
    provision_and_save(store, driver, out).await
}

/// Runs `create` and persists the record. A failed create still saves the
/// record while it names an instance, so `rm` can release it later.
async fn provision_and_save<F: ClientFactory>(
    store: &RecordStore,
    mut driver: SpotinstDriver<F>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if let Err(err) = driver.create().await {
        if let Some(instance_id) = driver.record().instance_id.as_deref() {
            warn!(
                machine = %driver.record().machine_name,
                instance_id,
                "instance is still attached; keeping its record for a later rm"
            );
            store.save(&driver.into_record())?;
        }
        return Err(err.into());
    }

    let address = driver.ip()?;
    store.save(&driver.into_record())?;
    writeln!(out, "{address}")?;
    Ok(())
}

fn flag_values(args: &CreateCommand) -> FlagValues {
    let mut values = FlagValues::new();
    for (name, value) in [
        (FLAG_TOKEN, &args.token),
        (FLAG_ACCOUNT, &args.account),
        (FLAG_GROUP_ID, &args.group_id),
        (FLAG_SSH_KEY_PATH, &args.ssh_key_path),
        (FLAG_SSH_USER, &args.ssh_user),
    ] {
        if let Some(text) = value {
            values.set(name, text.as_str());
        }
    }
    values.set(FLAG_USE_PUBLIC_IP, args.use_public_ip.to_string());
    values
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
