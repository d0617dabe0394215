//! Narrow client over the Spotinst Elastigroup API.
//!
//! The driver only needs three operations against a group: scale it up,
//! read the status of its instances, and detach one instance. They are
//! expressed by [`GroupClient`] so tests can substitute a scripted double,
//! and clients are produced through a [`ClientFactory`] because credentials
//! are only known once the driver has been configured.

mod error;
mod http;
mod types;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub use error::GroupError;
pub use http::{HttpClientFactory, SPOTINST_API_BASE, SpotinstClient};
pub use types::{GroupInstance, InstanceStatus, NewInstance, ScaleItem, ScaleResult, SpotRequest};

/// Future returned by group client operations.
pub type GroupFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GroupError>> + Send + 'a>>;

/// Credentials presented to the Spotinst API.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    /// Bearer token.
    pub token: String,
    /// Account the token acts on behalf of.
    pub account: String,
}

impl Credentials {
    /// Bundles a token and account identifier.
    #[must_use]
    pub fn new(token: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: account.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

/// Request to grow a group's capacity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScaleRequest {
    /// Target group.
    pub group_id: String,
    /// Number of instances to add.
    pub adjustment: u32,
}

impl ScaleRequest {
    /// Builds a scale-up request for `group_id`.
    #[must_use]
    pub fn up(group_id: impl Into<String>, adjustment: u32) -> Self {
        Self {
            group_id: group_id.into(),
            adjustment,
        }
    }
}

/// Request to remove instances from a group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DetachRequest {
    /// Group the instances belong to.
    pub group_id: String,
    /// Instances to detach.
    pub instance_ids: Vec<String>,
    /// Whether the group's target capacity shrinks with the detach, so the
    /// group does not launch a replacement.
    pub decrement_capacity: bool,
}

impl DetachRequest {
    /// Builds a detach request that also lowers the target capacity.
    #[must_use]
    pub fn decrementing(
        group_id: impl Into<String>,
        instance_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            instance_ids: instance_ids.into_iter().collect(),
            decrement_capacity: true,
        }
    }
}

/// Operations the driver performs against an elastic group.
pub trait GroupClient {
    /// Adds capacity to the group and reports what was launched.
    fn scale<'a>(&'a self, request: &'a ScaleRequest) -> GroupFuture<'a, ScaleResult>;

    /// Returns a snapshot of every instance currently in the group.
    fn status<'a>(&'a self, group_id: &'a str) -> GroupFuture<'a, Vec<GroupInstance>>;

    /// Detaches instances from the group.
    fn detach<'a>(&'a self, request: &'a DetachRequest) -> GroupFuture<'a, ()>;
}

/// Produces group clients for a set of credentials.
pub trait ClientFactory: Send + Sync {
    /// Client type handed to the driver.
    type Client: GroupClient + Send + Sync;

    /// Builds a client authenticated with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::Config`] when the client cannot be constructed.
    fn build(&self, credentials: &Credentials) -> Result<Self::Client, GroupError>;
}
