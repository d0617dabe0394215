//! Persistent driver state shared with the host.

use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::config::DriverConfig;
use crate::group::Credentials;
use crate::identity::generate_id;

use super::DriverError;

/// SSH user assumed when none is configured.
pub const DEFAULT_SSH_USER: &str = "ubuntu";
/// SSH port reported to the host.
pub const SSH_PORT: u16 = 22;
/// Port of the container runtime endpoint.
pub const DOCKER_PORT: u16 = 2376;

/// Which instance address the driver hands to the host.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// The instance's public address.
    Public,
    /// The instance's private address.
    Private,
}

impl AddressKind {
    /// Returns the lowercase name of the address kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State the host persists between driver invocations.
///
/// Remote identifiers and addresses stay `None` until the Spotinst API has
/// reported them. Provisioning sets `instance_id` once and never replaces
/// it; a successful teardown clears it together with the addresses.
#[derive(Clone, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverRecord {
    /// Opaque driver identifier.
    pub id: String,
    /// Machine name assigned by the host.
    pub machine_name: String,
    /// Host store directory.
    pub store_path: Utf8PathBuf,
    /// SSH user.
    pub ssh_user: String,
    /// SSH private key path.
    pub ssh_key_path: Utf8PathBuf,
    /// SSH port, recorded the first time the host asks for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<u16>,
    /// Spotinst API token.
    pub token: String,
    /// Spotinst account identifier.
    pub account: String,
    /// Elastigroup the machine belongs to.
    pub group_id: String,
    /// Whether the public address is reported instead of the private one.
    pub use_public_ip: bool,
    /// Provisioned instance.
    pub instance_id: Option<String>,
    /// Spot request still waiting to be fulfilled.
    pub spot_request_id: Option<String>,
    /// Observed public address.
    pub public_ip: Option<String>,
    /// Observed private address.
    pub private_ip: Option<String>,
}

impl fmt::Debug for DriverRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRecord")
            .field("id", &self.id)
            .field("machine_name", &self.machine_name)
            .field("store_path", &self.store_path)
            .field("ssh_user", &self.ssh_user)
            .field("ssh_key_path", &self.ssh_key_path)
            .field("ssh_port", &self.ssh_port)
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .field("group_id", &self.group_id)
            .field("use_public_ip", &self.use_public_ip)
            .field("instance_id", &self.instance_id)
            .field("spot_request_id", &self.spot_request_id)
            .field("public_ip", &self.public_ip)
            .field("private_ip", &self.private_ip)
            .finish()
    }
}

impl DriverRecord {
    /// Creates an unconfigured record with a fresh identifier.
    #[must_use]
    pub fn new(machine_name: impl Into<String>, store_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            id: generate_id(),
            machine_name: machine_name.into(),
            store_path: store_path.into(),
            ssh_user: DEFAULT_SSH_USER.to_owned(),
            ..Self::default()
        }
    }

    /// Copies configuration values into the record.
    ///
    /// An empty SSH user keeps the current one.
    pub fn apply(&mut self, config: DriverConfig) {
        let DriverConfig {
            token,
            account,
            group_id,
            ssh_key_path,
            ssh_user,
            use_public_ip,
        } = config;
        self.token = token;
        self.account = account;
        self.group_id = group_id;
        self.ssh_key_path = ssh_key_path;
        self.use_public_ip = use_public_ip;
        if !ssh_user.is_empty() {
            self.ssh_user = ssh_user;
        }
    }

    /// Returns the address kind selected by the record's policy.
    #[must_use]
    pub const fn address_kind(&self) -> AddressKind {
        if self.use_public_ip {
            AddressKind::Public
        } else {
            AddressKind::Private
        }
    }

    /// Returns the recorded address of the selected kind.
    #[must_use]
    pub fn selected_address(&self) -> Option<&str> {
        match self.address_kind() {
            AddressKind::Public => self.public_ip.as_deref(),
            AddressKind::Private => self.private_ip.as_deref(),
        }
    }

    /// Returns the selected address or explains why none is known.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoAddress`] when the selected address has not
    /// been observed.
    pub fn address(&self) -> Result<&str, DriverError> {
        self.selected_address()
            .ok_or_else(|| DriverError::NoAddress {
                instance_id: self.instance_id.clone(),
                kind: self.address_kind(),
            })
    }

    /// Credentials for the Spotinst API.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.as_str(), self.account.as_str())
    }

    pub(crate) fn record_address(&mut self, kind: AddressKind, address: String) {
        match kind {
            AddressKind::Public => self.public_ip = Some(address),
            AddressKind::Private => self.private_ip = Some(address),
        }
    }

    pub(crate) fn clear_instance(&mut self) {
        self.instance_id = None;
        self.spot_request_id = None;
        self.public_ip = None;
        self.private_ip = None;
    }
}
