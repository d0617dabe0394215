//! Poll cadence for the provisioning wait loops.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use super::ConfigError;

/// Pause between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
/// Status checks allowed while a spot request is being fulfilled.
pub const DEFAULT_SPOT_ATTEMPTS: u32 = 10;
/// Status checks allowed while waiting for an address.
pub const DEFAULT_IP_ATTEMPTS: u32 = 15;

/// Runtime poll settings used by the driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollSettings {
    /// Pause between two status checks.
    pub interval: Duration,
    /// Maximum status checks while resolving a spot request.
    pub spot_attempts: u32,
    /// Maximum status checks while waiting for an address.
    pub ip_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            spot_attempts: DEFAULT_SPOT_ATTEMPTS,
            ip_attempts: DEFAULT_IP_ATTEMPTS,
        }
    }
}

impl PollSettings {
    /// Overrides the pause between status checks.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poll cadence loaded from defaults, configuration files, and
/// `SPOTINST_POLL_*` environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SPOTINST_POLL")]
pub struct PollConfig {
    /// Seconds between two status checks.
    #[ortho_config(default = 20)]
    pub interval_secs: u64,
    /// Status checks allowed while a spot request is fulfilled.
    #[ortho_config(default = 10)]
    pub spot_attempts: u32,
    /// Status checks allowed while waiting for an address.
    #[ortho_config(default = 15)]
    pub ip_attempts: u32,
}

impl PollConfig {
    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("spotinst-machine")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Converts the loaded values into [`PollSettings`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an attempt budget is zero.
    pub fn settings(&self) -> Result<PollSettings, ConfigError> {
        Self::require_attempts(self.spot_attempts, "spot_attempts")?;
        Self::require_attempts(self.ip_attempts, "ip_attempts")?;
        Ok(PollSettings {
            interval: Duration::from_secs(self.interval_secs),
            spot_attempts: self.spot_attempts,
            ip_attempts: self.ip_attempts,
        })
    }

    fn require_attempts(value: u32, field: &str) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::Invalid {
                field: field.to_owned(),
                message: format!(
                    "at least one status check is required; set SPOTINST_POLL_{}",
                    field.to_uppercase()
                ),
            });
        }
        Ok(())
    }
}
