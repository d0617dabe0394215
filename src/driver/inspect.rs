//! Read-only views of the machine: lifecycle state and endpoint URL.

use tracing::{debug, warn};

use crate::group::{ClientFactory, GroupClient, InstanceStatus};
use crate::host::MachineState;

use super::{DOCKER_PORT, SpotinstDriver};

/// Maps a Spotinst instance status onto the host lifecycle.
///
/// Anything the host cannot act on, including an absent status, maps to
/// [`MachineState::Error`].
#[must_use]
pub fn map_status(status: Option<&InstanceStatus>) -> MachineState {
    match status {
        Some(InstanceStatus::Pending | InstanceStatus::PendingEvaluation) => MachineState::Starting,
        Some(InstanceStatus::Running | InstanceStatus::Fulfilled) => MachineState::Running,
        Some(InstanceStatus::Stopping | InstanceStatus::ShuttingDown) => MachineState::Stopping,
        Some(InstanceStatus::Stopped) => MachineState::Stopped,
        Some(InstanceStatus::Terminated) | None => MachineState::Error,
        Some(InstanceStatus::Other(raw)) => {
            warn!(status = %raw, "unknown instance status reported by spotinst");
            MachineState::Error
        }
    }
}

/// Formats the container runtime endpoint for `host`.
#[must_use]
pub fn docker_url(host: &str) -> String {
    format!("tcp://{}", join_host_port(host, DOCKER_PORT))
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

impl<F: ClientFactory> SpotinstDriver<F> {
    /// Looks the recorded instance up in the group.
    ///
    /// Every failure is reported as [`MachineState::Error`].
    pub(super) async fn observe_state(&self) -> MachineState {
        let Some(instance_id) = self.record.instance_id.as_deref() else {
            debug!("no instance recorded; reporting error state");
            return MachineState::Error;
        };

        let client = match self.client() {
            Ok(client) => client,
            Err(err) => {
                warn!(instance_id, error = %err, "cannot build spotinst client");
                return MachineState::Error;
            }
        };

        let instances = match self
            .guarded("status", client.status(&self.record.group_id))
            .await
        {
            Ok(instances) => instances,
            Err(err) => {
                warn!(instance_id, error = %err, "failed to read elastigroup status");
                return MachineState::Error;
            }
        };

        instances
            .iter()
            .find(|instance| instance.observed_id() == Some(instance_id))
            .map_or_else(
                || {
                    warn!(instance_id, group_id = %self.record.group_id, "instance not listed in elastigroup");
                    MachineState::Error
                },
                |instance| map_status(instance.status.as_ref()),
            )
    }
}
