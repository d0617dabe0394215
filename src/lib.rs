//! Core library for the Spotinst machine driver.
//!
//! The crate lets a machine-management host provision a single instance
//! inside a pre-existing Spotinst Elastigroup: the group is scaled up by one
//! unit, the resulting spot request or instance is resolved, and the driver
//! waits for a usable address. Teardown detaches the instance and lowers the
//! group's target capacity.

pub mod config;
pub mod driver;
pub mod group;
pub mod host;
pub mod identity;
pub mod store;
pub mod test_support;

pub use config::{ConfigError, DriverConfig, FlagValues, PollConfig, PollSettings, create_flags};
pub use driver::{AddressKind, DriverError, DriverRecord, SpotinstDriver};
pub use group::{
    ClientFactory, Credentials, DetachRequest, GroupClient, GroupError, GroupInstance,
    HttpClientFactory, InstanceStatus, ScaleItem, ScaleRequest, ScaleResult, SpotinstClient,
};
pub use host::{DriverOptions, Flag, FlagKind, MachineDriver, MachineState};
pub use store::{RecordStore, StoreError};
