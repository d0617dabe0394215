//! Driver configuration: flag descriptors, flag resolution, and poll cadence.
//!
//! Flags mirror the host's creation options. Each flag has an environment
//! variable fallback, so [`FlagValues::from_env`] can resolve a complete set
//! without the host passing anything explicitly. [`DriverConfig`] is the
//! immutable record materialised from those values.

mod poll;

use std::collections::BTreeMap;
use std::env;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::host::{DriverOptions, Flag, FlagKind};

pub use poll::{
    DEFAULT_IP_ATTEMPTS, DEFAULT_POLL_INTERVAL, DEFAULT_SPOT_ATTEMPTS, PollConfig, PollSettings,
};

/// Flag carrying the Spotinst API token.
pub const FLAG_TOKEN: &str = "spotinst-token";
/// Flag carrying the Spotinst account identifier.
pub const FLAG_ACCOUNT: &str = "spotinst-account";
/// Flag carrying the target Elastigroup identifier.
pub const FLAG_GROUP_ID: &str = "spotinst-elastigroup-id";
/// Flag carrying the SSH private key path.
pub const FLAG_SSH_KEY_PATH: &str = "spotinst-sshkey-path";
/// Flag selecting the public address over the private one.
pub const FLAG_USE_PUBLIC_IP: &str = "use-public-ip";
/// Flag overriding the SSH user.
pub const FLAG_SSH_USER: &str = "ssh-user";

const FLAGS: [Flag; 6] = [
    Flag {
        name: FLAG_TOKEN,
        usage: "Spotinst API token",
        env_var: "SPOTINST_TOKEN",
        kind: FlagKind::String,
    },
    Flag {
        name: FLAG_ACCOUNT,
        usage: "Spotinst account id",
        env_var: "SPOTINST_ACCOUNT",
        kind: FlagKind::String,
    },
    Flag {
        name: FLAG_GROUP_ID,
        usage: "Elastigroup to scale for the new machine",
        env_var: "SPOTINST_ELASTIGROUP_ID",
        kind: FlagKind::String,
    },
    Flag {
        name: FLAG_SSH_KEY_PATH,
        usage: "Private key used to reach the instance over SSH",
        env_var: "SPOTINST_SSHKEY_PATH",
        kind: FlagKind::String,
    },
    Flag {
        name: FLAG_USE_PUBLIC_IP,
        usage: "Connect through the instance's public IP instead of its private IP",
        env_var: "USE_PUBLIC_IP",
        kind: FlagKind::Bool,
    },
    Flag {
        name: FLAG_SSH_USER,
        usage: "SSH user (defaults to ubuntu)",
        env_var: "SSH_USER",
        kind: FlagKind::String,
    },
];

/// Returns the flags accepted when creating a machine.
#[must_use]
pub fn create_flags() -> Vec<Flag> {
    FLAGS.to_vec()
}

fn flag(name: &str) -> Option<&'static Flag> {
    FLAGS.iter().find(|candidate| candidate.name == name)
}

/// Interprets a boolean flag or environment value.
///
/// `1`, `true`, `yes`, and `on` (any case) are true; everything else is
/// false.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Flag values keyed by flag name, optionally falling back to each flag's
/// environment variable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlagValues {
    values: BTreeMap<String, String>,
    env_fallback: bool,
}

impl FlagValues {
    /// Creates an empty set that only reports explicitly set values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set that consults environment variables for any
    /// flag without an explicit value.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            values: BTreeMap::new(),
            env_fallback: true,
        }
    }

    /// Sets a flag value, returning the updated set.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a flag value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if !self.env_fallback {
            return None;
        }
        flag(name).and_then(|descriptor| env::var(descriptor.env_var).ok())
    }
}

impl DriverOptions for FlagValues {
    fn string(&self, name: &str) -> String {
        self.lookup(name).unwrap_or_default()
    }

    fn boolean(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|value| parse_bool(&value))
    }
}

/// Configuration record materialised from flag values.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DriverConfig {
    /// Spotinst API token.
    pub token: String,
    /// Spotinst account identifier.
    pub account: String,
    /// Elastigroup to scale.
    pub group_id: String,
    /// SSH private key path.
    pub ssh_key_path: Utf8PathBuf,
    /// SSH user override; empty means the driver default.
    pub ssh_user: String,
    /// Whether the public address is used instead of the private one.
    pub use_public_ip: bool,
}

impl DriverConfig {
    /// Reads every creation flag from `options`, trimming string values.
    #[must_use]
    pub fn from_options(options: &dyn DriverOptions) -> Self {
        let text = |name: &str| options.string(name).trim().to_owned();
        Self {
            token: text(FLAG_TOKEN),
            account: text(FLAG_ACCOUNT),
            group_id: text(FLAG_GROUP_ID),
            ssh_key_path: Utf8PathBuf::from(text(FLAG_SSH_KEY_PATH)),
            ssh_user: text(FLAG_SSH_USER),
            use_public_ip: options.boolean(FLAG_USE_PUBLIC_IP),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Raised when a loaded value is out of range.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
