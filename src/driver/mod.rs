//! Spotinst Elastigroup machine driver.
//!
//! [`SpotinstDriver`] provisions one instance by scaling a pre-existing
//! Elastigroup up by a single unit, waits for the launched spot request or
//! instance to expose the address selected by the record's policy, and
//! releases the instance by detaching it while lowering the group's target
//! capacity. Failed provisioning always runs the same teardown, so the
//! group never keeps capacity the host does not know about.
//!
//! Remote calls made while provisioning or inspecting race the driver's
//! [`CancellationToken`]. Teardown ignores the token so cleanup still
//! reaches the API after a cancelled `create`.

mod error;
mod inspect;
mod provision;
mod record;
mod teardown;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::{DriverConfig, PollSettings, create_flags};
use crate::group::{ClientFactory, GroupFuture, HttpClientFactory};
use crate::host::{DriverFuture, DriverOptions, Flag, MachineDriver, MachineState};

pub use error::DriverError;
pub use inspect::{docker_url, map_status};
pub use record::{AddressKind, DEFAULT_SSH_USER, DOCKER_PORT, DriverRecord, SSH_PORT};

/// Name under which the driver registers with the host.
pub const DRIVER_NAME: &str = "spotinst";

/// Machine driver backed by a Spotinst Elastigroup.
#[derive(Debug)]
pub struct SpotinstDriver<F = HttpClientFactory> {
    record: DriverRecord,
    factory: F,
    poll: PollSettings,
    cancel: CancellationToken,
}

impl<F> SpotinstDriver<F> {
    /// Creates a driver for a new machine with a freshly generated id.
    #[must_use]
    pub fn new(
        machine_name: impl Into<String>,
        store_path: impl Into<Utf8PathBuf>,
        factory: F,
    ) -> Self {
        Self::from_record(DriverRecord::new(machine_name, store_path), factory)
    }

    /// Rehydrates a driver from a persisted record.
    #[must_use]
    pub fn from_record(record: DriverRecord, factory: F) -> Self {
        Self {
            record,
            factory,
            poll: PollSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the poll cadence used while provisioning.
    #[must_use]
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Attaches a cancellation token observed by provisioning and
    /// inspection.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the current driver record.
    #[must_use]
    pub const fn record(&self) -> &DriverRecord {
        &self.record
    }

    /// Consumes the driver, returning its record for persistence.
    #[must_use]
    pub fn into_record(self) -> DriverRecord {
        self.record
    }

    /// Returns the poll cadence in use.
    #[must_use]
    pub const fn poll_settings(&self) -> PollSettings {
        self.poll
    }

    /// Validates the configuration needed before any remote call.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingCredentials`],
    /// [`DriverError::MissingSshKey`], or [`DriverError::MissingGroup`] for
    /// the first missing setting, in that order.
    pub fn validate(&self) -> Result<(), DriverError> {
        let record = &self.record;
        if record.token.is_empty() || record.account.is_empty() {
            return Err(DriverError::MissingCredentials);
        }
        if record.ssh_key_path.as_str().is_empty() {
            return Err(DriverError::MissingSshKey);
        }
        if record.group_id.is_empty() {
            return Err(DriverError::MissingGroup);
        }
        Ok(())
    }

    async fn guarded<T>(
        &self,
        operation: &'static str,
        call: GroupFuture<'_, T>,
    ) -> Result<T, DriverError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DriverError::Cancelled),
            result = call => result.map_err(|source| DriverError::RemoteCall { operation, source }),
        }
    }

    async fn pause(&self) -> Result<(), DriverError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DriverError::Cancelled),
            () = sleep(self.poll.interval) => Ok(()),
        }
    }
}

impl<F: ClientFactory> SpotinstDriver<F> {
    fn client(&self) -> Result<F::Client, DriverError> {
        self.factory
            .build(&self.record.credentials())
            .map_err(DriverError::Client)
    }
}

impl<F: ClientFactory> MachineDriver for SpotinstDriver<F> {
    type Error = DriverError;

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn create_flags(&self) -> Vec<Flag> {
        create_flags()
    }

    fn set_config_from_flags(&mut self, flags: &dyn DriverOptions) -> Result<(), DriverError> {
        self.record.apply(DriverConfig::from_options(flags));
        Ok(())
    }

    fn pre_create_check(&self) -> Result<(), DriverError> {
        self.validate()
    }

    fn create(&mut self) -> DriverFuture<'_, (), DriverError> {
        Box::pin(async move {
            self.validate()?;
            if let Err(err) = self.provision().await {
                warn!(
                    group_id = %self.record.group_id,
                    error = %err,
                    "provisioning failed; releasing any launched instance"
                );
                self.teardown().await;
                return Err(err);
            }
            Ok(())
        })
    }

    fn url(&self) -> DriverFuture<'_, String, DriverError> {
        Box::pin(async move {
            let state = self.observe_state().await;
            if state != MachineState::Running {
                return Err(DriverError::NotRunning { state });
            }
            self.record.address().map(docker_url)
        })
    }

    fn ip(&self) -> Result<String, DriverError> {
        self.record.address().map(str::to_owned)
    }

    fn state(&self) -> DriverFuture<'_, MachineState, DriverError> {
        Box::pin(async move { Ok(self.observe_state().await) })
    }

    fn ssh_hostname(&self) -> Result<String, DriverError> {
        self.ip()
    }

    fn ssh_username(&mut self) -> String {
        if self.record.ssh_user.is_empty() {
            DEFAULT_SSH_USER.clone_into(&mut self.record.ssh_user);
        }
        self.record.ssh_user.clone()
    }

    fn ssh_port(&mut self) -> u16 {
        *self.record.ssh_port.get_or_insert(SSH_PORT)
    }

    fn ssh_key_path(&self) -> &Utf8Path {
        &self.record.ssh_key_path
    }

    fn start(&mut self) -> Result<(), DriverError> {
        warn!("start is not supported by the spotinst driver; ignoring");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        warn!("stop is not supported by the spotinst driver; ignoring");
        Ok(())
    }

    fn restart(&mut self) -> Result<(), DriverError> {
        warn!("restart is not supported by the spotinst driver; ignoring");
        Ok(())
    }

    fn kill(&mut self) -> DriverFuture<'_, (), DriverError> {
        Box::pin(async move {
            self.teardown().await;
            Ok(())
        })
    }

    fn remove(&mut self) -> DriverFuture<'_, (), DriverError> {
        Box::pin(async move {
            self.teardown().await;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests;
