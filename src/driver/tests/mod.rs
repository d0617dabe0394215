//! Unit tests for the Spotinst driver.


use std::time::Duration;

use rstest::fixture;

use super::*;
use crate::config::{
    FLAG_ACCOUNT, FLAG_GROUP_ID, FLAG_SSH_KEY_PATH, FLAG_TOKEN, FLAG_USE_PUBLIC_IP, FlagValues,
};
use crate::group::GroupInstance;
use crate::test_support::ScriptedGroupClient;

type TestDriver = SpotinstDriver<ScriptedGroupClient>;

#[fixture]
fn client() -> ScriptedGroupClient {
    ScriptedGroupClient::new()
}

fn flags(use_public_ip: bool) -> FlagValues {
    FlagValues::new()
        .with(FLAG_TOKEN, "T")
        .with(FLAG_ACCOUNT, "A")
        .with(FLAG_GROUP_ID, "g1")
        .with(FLAG_SSH_KEY_PATH, "/k")
        .with(FLAG_USE_PUBLIC_IP, if use_public_ip { "true" } else { "false" })
}

fn fast_poll() -> PollSettings {
    PollSettings::default().with_interval(Duration::from_millis(1))
}

fn driver_with(client: &ScriptedGroupClient, options: &FlagValues) -> TestDriver {
    let mut driver = SpotinstDriver::new("m1", "/store", client.clone()).with_poll_settings(fast_poll());
    driver
        .set_config_from_flags(options)
        .unwrap_or_else(|err| panic!("apply flags: {err}"));
    driver
}

fn configured(client: &ScriptedGroupClient) -> TestDriver {
    driver_with(client, &flags(false))
}

/// Builds a driver whose record already points at a provisioned instance.
fn provisioned(client: &ScriptedGroupClient, instance_id: &str, private_ip: &str) -> TestDriver {
    let mut record = configured(client).into_record();
    record.instance_id = Some(instance_id.to_owned());
    record.private_ip = Some(private_ip.to_owned());
    SpotinstDriver::from_record(record, client.clone()).with_poll_settings(fast_poll())
}

fn pending(id: &str) -> GroupInstance {
    GroupInstance::new(id).with_status("pending")
}
