//! Teardown: detach the provisioned instance and lower the target capacity.

use tracing::{debug, error, info};

use crate::group::{ClientFactory, DetachRequest, GroupClient};

use super::SpotinstDriver;

impl<F: ClientFactory> SpotinstDriver<F> {
    /// Detaches the recorded instance, if any.
    ///
    /// Failures are logged and swallowed so removal always succeeds from
    /// the host's point of view. The cancellation token is not consulted.
    pub(super) async fn teardown(&mut self) {
        let Some(instance_id) = self.record.instance_id.clone() else {
            debug!(machine = %self.record.machine_name, "no instance recorded; nothing to detach");
            return;
        };
        let group_id = self.record.group_id.clone();

        let client = match self.client() {
            Ok(client) => client,
            Err(err) => {
                error!(%group_id, %instance_id, error = %err, "cannot build spotinst client for detach");
                return;
            }
        };

        let request = DetachRequest::decrementing(group_id.as_str(), [instance_id.clone()]);
        match client.detach(&request).await {
            Ok(()) => {
                info!(%group_id, %instance_id, "instance detached and target capacity lowered");
                self.record.clear_instance();
            }
            Err(err) => {
                error!(%group_id, %instance_id, error = %err, "failed to detach instance");
            }
        }
    }
}
