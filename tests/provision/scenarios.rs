//! BDD scenarios for provisioning and teardown.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provision.feature",
    name = "A directly launched instance becomes reachable on its private address"
)]
fn scenario_direct_instance(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "A spot request resolves into an instance before its address is awaited"
)]
fn scenario_spot_request(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "An instance that never exposes an address is detached"
)]
fn scenario_ip_timeout(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "The public address is used when requested"
)]
fn scenario_public_address(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Missing credentials stop creation before any remote call"
)]
fn scenario_missing_credentials(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Killing a machine twice detaches it once"
)]
fn scenario_kill_twice(provision_context: ProvisionContext) {
    let _ = provision_context;
}
