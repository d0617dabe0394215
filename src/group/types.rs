//! Wire types returned by the Elastigroup API.
//!
//! Every identifier and address is optional: the API omits or nulls fields
//! until the underlying cloud has produced them.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Outcome of a scale request.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ScaleResult {
    /// One entry per scaling action; the driver reads the first.
    #[serde(default)]
    pub items: Vec<ScaleItem>,
}

/// Resources launched by one scaling action.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleItem {
    /// Spot requests opened by the scale.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub new_spot_requests: Vec<SpotRequest>,
    /// Instances launched directly by the scale.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub new_instances: Vec<NewInstance>,
}

impl ScaleItem {
    /// Builds an item carrying a single directly launched instance.
    #[must_use]
    pub fn instance(id: impl Into<String>) -> Self {
        Self {
            new_spot_requests: Vec::new(),
            new_instances: vec![NewInstance {
                id: Some(id.into()),
            }],
        }
    }

    /// Builds an item carrying a single spot request.
    #[must_use]
    pub fn spot_request(id: impl Into<String>) -> Self {
        Self {
            new_spot_requests: vec![SpotRequest {
                id: Some(id.into()),
            }],
            new_instances: Vec::new(),
        }
    }
}

/// Spot request opened by a scale action.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct SpotRequest {
    /// Spot instance request identifier.
    #[serde(rename = "spotInstanceRequestId", default)]
    pub id: Option<String>,
}

/// Instance launched directly by a scale action.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct NewInstance {
    /// Instance identifier.
    #[serde(rename = "instanceId", default)]
    pub id: Option<String>,
}

/// One instance as listed by the group status endpoint.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupInstance {
    /// Instance identifier.
    #[serde(rename = "instanceId", default)]
    pub id: Option<String>,
    /// Provider lifecycle status.
    #[serde(default)]
    pub status: Option<InstanceStatus>,
    /// Public IPv4 address, when assigned.
    #[serde(default)]
    pub public_ip: Option<String>,
    /// Private IPv4 address, when assigned.
    #[serde(default)]
    pub private_ip: Option<String>,
    /// Spot request the instance fulfils, when it is a spot instance.
    #[serde(rename = "spotInstanceRequestId", default)]
    pub spot_request_id: Option<String>,
}

impl GroupInstance {
    /// Starts an instance view with only its identifier set.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<InstanceStatus>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the public address.
    #[must_use]
    pub fn with_public_ip(mut self, address: impl Into<String>) -> Self {
        self.public_ip = Some(address.into());
        self
    }

    /// Sets the private address.
    #[must_use]
    pub fn with_private_ip(mut self, address: impl Into<String>) -> Self {
        self.private_ip = Some(address.into());
        self
    }

    /// Sets the spot request the instance fulfils.
    #[must_use]
    pub fn with_spot_request(mut self, spot_request_id: impl Into<String>) -> Self {
        self.spot_request_id = Some(spot_request_id.into());
        self
    }

    /// Returns the identifier when it is present and non-empty.
    #[must_use]
    pub fn observed_id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }

    /// Returns the public address when it is present and non-empty.
    #[must_use]
    pub fn observed_public_ip(&self) -> Option<&str> {
        non_empty(self.public_ip.as_deref())
    }

    /// Returns the private address when it is present and non-empty.
    #[must_use]
    pub fn observed_private_ip(&self) -> Option<&str> {
        non_empty(self.private_ip.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Instance status reported by the Elastigroup API.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(from = "String")]
pub enum InstanceStatus {
    /// `pending`
    Pending,
    /// `running`
    Running,
    /// `shutting-down`
    ShuttingDown,
    /// `terminated`
    Terminated,
    /// `stopping`
    Stopping,
    /// `stopped`
    Stopped,
    /// `fulfilled`, reported for spot capacity that has been granted.
    Fulfilled,
    /// `pending-evaluation`, reported while a spot request is evaluated.
    PendingEvaluation,
    /// Any status outside the documented set.
    Other(String),
}

impl InstanceStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Fulfilled => "fulfilled",
            Self::PendingEvaluation => "pending-evaluation",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for InstanceStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            "fulfilled" => Self::Fulfilled,
            "pending-evaluation" => Self::PendingEvaluation,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
