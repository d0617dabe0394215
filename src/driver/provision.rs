//! Provisioning: scale the group, resolve the launch, wait for an address.

use tracing::{debug, info};

use crate::group::{ClientFactory, GroupClient, GroupInstance, ScaleRequest, ScaleResult};

use super::{AddressKind, DriverError, SpotinstDriver};

/// What a scale-up launched for this driver.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Placement {
    Instance(String),
    SpotRequest(String),
}

impl Placement {
    /// Reads the first scale item, preferring a directly launched instance
    /// and skipping entries without an identifier.
    fn from_scale(result: &ScaleResult) -> Option<Self> {
        let item = result.items.first()?;
        item.new_instances
            .iter()
            .find_map(|instance| non_empty(instance.id.as_deref()))
            .map(|id| Self::Instance(id.to_owned()))
            .or_else(|| {
                item.new_spot_requests
                    .iter()
                    .find_map(|request| non_empty(request.id.as_deref()))
                    .map(|id| Self::SpotRequest(id.to_owned()))
            })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

impl<F: ClientFactory> SpotinstDriver<F> {
    pub(super) async fn provision(&mut self) -> Result<(), DriverError> {
        let client = self.client()?;
        let group_id = self.record.group_id.clone();

        info!(%group_id, "scaling elastigroup up by one instance");
        let request = ScaleRequest::up(group_id.as_str(), 1);
        let result = self.guarded("scale", client.scale(&request)).await?;

        let instance_id = match Placement::from_scale(&result) {
            Some(Placement::Instance(instance_id)) => {
                info!(%group_id, %instance_id, "elastigroup launched an instance");
                self.record.instance_id = Some(instance_id.clone());
                instance_id
            }
            Some(Placement::SpotRequest(spot_request_id)) => {
                info!(%group_id, %spot_request_id, "elastigroup opened a spot request");
                self.record.spot_request_id = Some(spot_request_id.clone());
                let instance_id = self.await_spot(&client, &spot_request_id).await?;
                self.record.instance_id = Some(instance_id.clone());
                self.record.spot_request_id = None;
                instance_id
            }
            None => return Err(DriverError::EmptyScale { group_id }),
        };

        self.await_address(&client, &instance_id).await
    }

    /// Polls the group until an instance fulfilling `spot_request_id`
    /// reports an identifier.
    ///
    /// Only the first listed entry for the request is considered. While
    /// that entry has no instance id the attempt counts as unfulfilled,
    /// even if a later entry for the same request carries one.
    async fn await_spot(
        &self,
        client: &F::Client,
        spot_request_id: &str,
    ) -> Result<String, DriverError> {
        let attempts = self.poll.spot_attempts;
        let mut listed = false;

        for attempt in 1..=attempts {
            let instances = self
                .guarded("status", client.status(&self.record.group_id))
                .await?;
            let fulfilled = {
                let first = instances
                    .iter()
                    .find(|instance| instance.spot_request_id.as_deref() == Some(spot_request_id));
                listed |= first.is_some();
                first
                    .and_then(GroupInstance::observed_id)
                    .map(str::to_owned)
            };

            if let Some(instance_id) = fulfilled {
                info!(spot_request_id, %instance_id, "spot request fulfilled");
                return Ok(instance_id);
            }

            debug!(spot_request_id, attempt, attempts, "spot request not fulfilled yet");
            if attempt < attempts {
                self.pause().await?;
            }
        }

        if listed {
            Err(DriverError::SpotTimeout {
                spot_request_id: spot_request_id.to_owned(),
                attempts,
            })
        } else {
            Err(DriverError::SpotCancelled {
                spot_request_id: spot_request_id.to_owned(),
            })
        }
    }

    /// Polls the group until `instance_id` exposes the address selected by
    /// the record's policy, then records only that address.
    async fn await_address(
        &mut self,
        client: &F::Client,
        instance_id: &str,
    ) -> Result<(), DriverError> {
        let attempts = self.poll.ip_attempts;
        let kind = self.record.address_kind();

        for attempt in 1..=attempts {
            let instances = self
                .guarded("status", client.status(&self.record.group_id))
                .await?;
            let address = instances
                .iter()
                .find(|instance| instance.observed_id() == Some(instance_id))
                .and_then(|instance| match kind {
                    AddressKind::Public => instance.observed_public_ip(),
                    AddressKind::Private => instance.observed_private_ip(),
                });

            if let Some(address) = address {
                info!(instance_id, %kind, address, "instance address assigned");
                self.record.record_address(kind, address.to_owned());
                return Ok(());
            }

            debug!(instance_id, %kind, attempt, attempts, "instance address not assigned yet");
            if attempt < attempts {
                self.pause().await?;
            }
        }

        Err(DriverError::IpTimeout {
            instance_id: instance_id.to_owned(),
            kind,
            attempts,
        })
    }
}
