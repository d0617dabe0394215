//! Shared fixtures for provisioning scenarios.

use std::time::Duration;

use rstest::fixture;
use spotinst_machine::config::{FLAG_ACCOUNT, FLAG_GROUP_ID, FLAG_SSH_KEY_PATH, FLAG_TOKEN};
use spotinst_machine::test_support::ScriptedGroupClient;
use spotinst_machine::{
    DriverError, DriverRecord, FlagValues, MachineDriver, PollSettings, SpotinstDriver,
};
use thiserror::Error;
use tokio::runtime::Runtime;

#[derive(Clone, Debug)]
pub struct ProvisionContext {
    pub client: ScriptedGroupClient,
    pub options: FlagValues,
    pub record: Option<DriverRecord>,
    pub outcome: Option<CreateOutcome>,
}

#[derive(Clone, Debug)]
pub enum CreateOutcome {
    Created,
    Failed(DriverError),
}

impl From<Result<(), DriverError>> for CreateOutcome {
    fn from(result: Result<(), DriverError>) -> Self {
        match result {
            Ok(()) => Self::Created,
            Err(err) => Self::Failed(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisionTestError {
    #[error("failed to start runtime: {0}")]
    Runtime(String),
    #[error("no machine has been created")]
    MissingRecord,
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext {
        client: ScriptedGroupClient::new(),
        options: FlagValues::new()
            .with(FLAG_TOKEN, "T")
            .with(FLAG_ACCOUNT, "A")
            .with(FLAG_SSH_KEY_PATH, "/k")
            .with(FLAG_GROUP_ID, ""),
        record: None,
        outcome: None,
    }
}

pub fn runtime() -> Result<Runtime, ProvisionTestError> {
    Runtime::new().map_err(|err| ProvisionTestError::Runtime(err.to_string()))
}

fn fast_poll() -> PollSettings {
    PollSettings::default().with_interval(Duration::from_millis(1))
}

/// Builds a fresh driver from the context's flags.
pub fn new_driver(context: &ProvisionContext) -> SpotinstDriver<ScriptedGroupClient> {
    let mut driver = SpotinstDriver::new("scenario", "/store", context.client.clone())
        .with_poll_settings(fast_poll());
    driver
        .set_config_from_flags(&context.options)
        .unwrap_or_else(|err| panic!("apply flags: {err}"));
    driver
}

/// Rehydrates the driver that ran the last operation.
pub fn existing_driver(
    context: &ProvisionContext,
) -> Result<SpotinstDriver<ScriptedGroupClient>, ProvisionTestError> {
    let record = context
        .record
        .clone()
        .ok_or(ProvisionTestError::MissingRecord)?;
    Ok(SpotinstDriver::from_record(record, context.client.clone()).with_poll_settings(fast_poll()))
}
