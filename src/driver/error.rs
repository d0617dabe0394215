//! Error type surfaced by the Spotinst driver.

use thiserror::Error;

use crate::group::GroupError;
use crate::host::MachineState;

use super::AddressKind;

/// Errors raised by driver operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DriverError {
    /// Raised when the API token or account is missing.
    #[error("spotinst token and account are required (--spotinst-token, --spotinst-account)")]
    MissingCredentials,
    /// Raised when no SSH private key path is configured.
    #[error("an SSH private key path is required (--spotinst-sshkey-path)")]
    MissingSshKey,
    /// Raised when no Elastigroup is configured.
    #[error("an elastigroup id is required (--spotinst-elastigroup-id)")]
    MissingGroup,
    /// Raised when a call to the Spotinst API fails.
    #[error("spotinst {operation} call failed: {source}")]
    RemoteCall {
        /// API operation being performed.
        operation: &'static str,
        /// Client error.
        #[source]
        source: GroupError,
    },
    /// Raised when the API client cannot be constructed.
    #[error("failed to build the spotinst client: {0}")]
    Client(#[source] GroupError),
    /// Raised when a scale-up launched nothing the driver can track.
    #[error("scaling elastigroup {group_id} returned neither an instance nor a spot request")]
    EmptyScale {
        /// Elastigroup that was scaled.
        group_id: String,
    },
    /// Raised when a spot request never shows up in the group.
    #[error("spot request {spot_request_id} never appeared in the group; it was likely cancelled")]
    SpotCancelled {
        /// Spot request identifier.
        spot_request_id: String,
    },
    /// Raised when a listed spot request is not fulfilled in time.
    #[error("spot request {spot_request_id} was not fulfilled after {attempts} status checks")]
    SpotTimeout {
        /// Spot request identifier.
        spot_request_id: String,
        /// Status checks performed.
        attempts: u32,
    },
    /// Raised when the selected address does not appear in time.
    #[error("instance {instance_id} exposed no {kind} address after {attempts} status checks")]
    IpTimeout {
        /// Instance identifier.
        instance_id: String,
        /// Address kind that was awaited.
        kind: AddressKind,
        /// Status checks performed.
        attempts: u32,
    },
    /// Raised when the record holds no address of the selected kind.
    #[error(
        "no {kind} address recorded for instance {}",
        .instance_id.as_deref().unwrap_or("<none>")
    )]
    NoAddress {
        /// Recorded instance, if any.
        instance_id: Option<String>,
        /// Address kind selected by the policy.
        kind: AddressKind,
    },
    /// Raised when a running machine is required.
    #[error("machine is not running (state: {state})")]
    NotRunning {
        /// State reported for the machine.
        state: MachineState,
    },
    /// Raised when the operation is cancelled.
    #[error("operation cancelled")]
    Cancelled,
}
