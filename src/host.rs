//! Contract between the machine-management host and a driver.
//!
//! The host discovers a driver, hands it flag values, and then drives the
//! machine lifecycle through [`MachineDriver`]. Remote operations return
//! boxed futures so the trait stays object safe.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Lifecycle states understood by the host.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MachineState {
    /// The instance exists but is not yet usable.
    Starting,
    /// The instance is up.
    Running,
    /// The instance is shutting down.
    Stopping,
    /// The instance is stopped.
    Stopped,
    /// The instance is gone, terminated, or in an unknown condition.
    Error,
}

impl MachineState {
    /// Returns the host's canonical name for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value type carried by a driver flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlagKind {
    /// Free-form string value.
    String,
    /// Presence/boolean switch.
    Bool,
}

/// Describes one configuration flag the driver accepts at creation time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Flag {
    /// Hyphenated flag name, for example `spotinst-token`.
    pub name: &'static str,
    /// Short help text shown by the host.
    pub usage: &'static str,
    /// Environment variable consulted when the flag is not given.
    pub env_var: &'static str,
    /// Value type of the flag.
    pub kind: FlagKind,
}

/// Accessor the host passes to [`MachineDriver::set_config_from_flags`].
pub trait DriverOptions {
    /// Returns the string value for `name`, or an empty string when unset.
    fn string(&self, name: &str) -> String;

    /// Returns the boolean value for `name`, or `false` when unset.
    fn boolean(&self, name: &str) -> bool;
}

/// Future returned by asynchronous driver operations.
pub type DriverFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Operation set a driver exposes to the host.
pub trait MachineDriver {
    /// Driver specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the driver's registered name.
    fn driver_name(&self) -> &'static str;

    /// Lists the flags accepted by `create`.
    fn create_flags(&self) -> Vec<Flag>;

    /// Populates the driver record from host-supplied flag values.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the values cannot be applied.
    fn set_config_from_flags(&mut self, flags: &dyn DriverOptions) -> Result<(), Self::Error>;

    /// Validates configuration before any remote call is made.
    ///
    /// # Errors
    ///
    /// Returns the driver error describing the first missing setting.
    fn pre_create_check(&self) -> Result<(), Self::Error>;

    /// Provisions the machine.
    fn create(&mut self) -> DriverFuture<'_, (), Self::Error>;

    /// Returns the container runtime URL of a running machine.
    fn url(&self) -> DriverFuture<'_, String, Self::Error>;

    /// Returns the machine address selected by the driver's policy.
    ///
    /// # Errors
    ///
    /// Returns the driver error when no address is known.
    fn ip(&self) -> Result<String, Self::Error>;

    /// Reports the machine's lifecycle state.
    fn state(&self) -> DriverFuture<'_, MachineState, Self::Error>;

    /// Returns the host name to use for SSH.
    ///
    /// # Errors
    ///
    /// Returns the driver error when no address is known.
    fn ssh_hostname(&self) -> Result<String, Self::Error>;

    /// Returns the SSH user, recording the default when none was configured.
    fn ssh_username(&mut self) -> String;

    /// Returns the SSH port, recording it in the driver state.
    fn ssh_port(&mut self) -> u16;

    /// Returns the private key path used for SSH.
    fn ssh_key_path(&self) -> &Utf8Path;

    /// Starts the machine.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the operation fails.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Stops the machine.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the operation fails.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Restarts the machine.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the operation fails.
    fn restart(&mut self) -> Result<(), Self::Error>;

    /// Forcefully releases the machine.
    fn kill(&mut self) -> DriverFuture<'_, (), Self::Error>;

    /// Removes the machine.
    fn remove(&mut self) -> DriverFuture<'_, (), Self::Error>;
}
