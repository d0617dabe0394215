//! BDD step definitions for provisioning and teardown.

use rstest_bdd_macros::{given, then, when};
use spotinst_machine::config::{FLAG_GROUP_ID, FLAG_TOKEN, FLAG_USE_PUBLIC_IP};
use spotinst_machine::{DetachRequest, GroupInstance, MachineDriver, ScaleItem, ScaleResult};

use super::test_helpers::{
    CreateOutcome, ProvisionContext, ProvisionTestError, existing_driver, new_driver, runtime,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Setup(#[from] ProvisionTestError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a driver configured for group \"{group}\"")]
fn configured_driver(mut provision_context: ProvisionContext, group: String) -> ProvisionContext {
    provision_context.options.set(FLAG_GROUP_ID, group);
    provision_context
}

#[given("public addresses are preferred")]
fn public_addresses(mut provision_context: ProvisionContext) -> ProvisionContext {
    provision_context.options.set(FLAG_USE_PUBLIC_IP, "true");
    provision_context
}

#[given("the API token is missing")]
fn missing_token(mut provision_context: ProvisionContext) -> ProvisionContext {
    provision_context.options.set(FLAG_TOKEN, "");
    provision_context
}

#[given("the group launches instance \"{id}\"")]
fn launches_instance(provision_context: ProvisionContext, id: String) -> ProvisionContext {
    provision_context.client.push_scale(ScaleResult {
        items: vec![ScaleItem::instance(id)],
    });
    provision_context
}

#[given("the group opens spot request \"{id}\"")]
fn opens_spot_request(provision_context: ProvisionContext, id: String) -> ProvisionContext {
    provision_context.client.push_scale(ScaleResult {
        items: vec![ScaleItem::spot_request(id)],
    });
    provision_context
}

#[given("the group lists no instances")]
fn lists_nothing(provision_context: ProvisionContext) -> ProvisionContext {
    provision_context.client.push_status(Vec::new());
    provision_context
}

#[given("the group lists instance \"{id}\" as \"{status}\"")]
fn lists_instance(
    provision_context: ProvisionContext,
    id: String,
    status: String,
) -> ProvisionContext {
    provision_context
        .client
        .push_status(vec![GroupInstance::new(id).with_status(status)]);
    provision_context
}

#[given("the group lists instance \"{id}\" from spot request \"{spot}\"")]
fn lists_spot_instance(
    provision_context: ProvisionContext,
    id: String,
    spot: String,
) -> ProvisionContext {
    provision_context.client.push_status(vec![
        GroupInstance::new(id)
            .with_status("pending")
            .with_spot_request(spot),
    ]);
    provision_context
}

#[given("the group keeps listing instance \"{id}\" as \"{status}\"")]
fn keeps_listing_instance(
    provision_context: ProvisionContext,
    id: String,
    status: String,
) -> ProvisionContext {
    provision_context
        .client
        .repeat_status(vec![GroupInstance::new(id).with_status(status)]);
    provision_context
}

#[given("the group keeps listing instance \"{id}\" with private address \"{address}\"")]
fn keeps_listing_private(
    provision_context: ProvisionContext,
    id: String,
    address: String,
) -> ProvisionContext {
    provision_context.client.repeat_status(vec![
        GroupInstance::new(id)
            .with_status("running")
            .with_private_ip(address),
    ]);
    provision_context
}

#[given(
    "the group keeps listing instance \"{id}\" with addresses \"{private}\" and \"{public}\""
)]
fn keeps_listing_both(
    provision_context: ProvisionContext,
    id: String,
    private: String,
    public: String,
) -> ProvisionContext {
    provision_context.client.repeat_status(vec![
        GroupInstance::new(id)
            .with_status("running")
            .with_private_ip(private)
            .with_public_ip(public),
    ]);
    provision_context
}

#[when("I create the machine")]
fn create_machine(provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    let runtime = runtime()?;
    let mut driver = new_driver(&provision_context);
    let outcome = runtime.block_on(driver.create());

    Ok(ProvisionContext {
        record: Some(driver.into_record()),
        outcome: Some(CreateOutcome::from(outcome)),
        ..provision_context
    })
}

#[when("I kill the machine twice")]
fn kill_twice(provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    let runtime = runtime()?;
    let mut driver = existing_driver(&provision_context)?;
    for attempt in 1..=2 {
        runtime
            .block_on(driver.kill())
            .map_err(|err| StepError::Assertion(format!("kill #{attempt} failed: {err}")))?;
    }

    Ok(ProvisionContext {
        record: Some(driver.into_record()),
        ..provision_context
    })
}

#[then("the machine is created")]
fn machine_created(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match &provision_context.outcome {
        Some(CreateOutcome::Created) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected successful creation, got {other:?}"
        ))),
    }
}

#[then("creation fails with \"{message}\"")]
fn creation_fails(provision_context: &ProvisionContext, message: String) -> Result<(), StepError> {
    match &provision_context.outcome {
        Some(CreateOutcome::Failed(err)) if err.to_string().contains(&message) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure mentioning '{message}', got {other:?}"
        ))),
    }
}

#[then("the recorded instance is \"{id}\"")]
fn recorded_instance(provision_context: &ProvisionContext, id: String) -> Result<(), StepError> {
    let record = provision_context
        .record
        .as_ref()
        .ok_or(ProvisionTestError::MissingRecord)?;
    if record.instance_id.as_deref() == Some(id.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected instance {id}, got {:?}",
            record.instance_id
        )))
    }
}

#[then("the machine address is \"{address}\"")]
fn machine_address(provision_context: &ProvisionContext, address: String) -> Result<(), StepError> {
    let driver = existing_driver(provision_context)?;
    let actual = driver
        .ip()
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    if actual == address {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected address {address}, got {actual}"
        )))
    }
}

#[then("the machine state is \"{state}\"")]
fn machine_state(provision_context: &ProvisionContext, state: String) -> Result<(), StepError> {
    let runtime = runtime()?;
    let driver = existing_driver(provision_context)?;
    let actual = runtime
        .block_on(driver.state())
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    if actual.as_str() == state {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected state {state}, got {actual}"
        )))
    }
}

#[then("the machine URL is \"{url}\"")]
fn machine_url(provision_context: &ProvisionContext, url: String) -> Result<(), StepError> {
    let runtime = runtime()?;
    let driver = existing_driver(provision_context)?;
    let actual = runtime
        .block_on(driver.url())
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    if actual == url {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected URL {url}, got {actual}")))
    }
}

#[then("no private address is recorded")]
fn no_private_address(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let record = provision_context
        .record
        .as_ref()
        .ok_or(ProvisionTestError::MissingRecord)?;
    match &record.private_ip {
        None => Ok(()),
        Some(address) => Err(StepError::Assertion(format!(
            "private address {address} should not be recorded"
        ))),
    }
}

#[then("no instance is recorded")]
fn no_instance(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let record = provision_context
        .record
        .as_ref()
        .ok_or(ProvisionTestError::MissingRecord)?;
    match &record.instance_id {
        None => Ok(()),
        Some(id) => Err(StepError::Assertion(format!(
            "instance {id} should have been cleared"
        ))),
    }
}

#[then("instance \"{id}\" of group \"{group}\" was detached once")]
fn detached_once(
    provision_context: &ProvisionContext,
    id: String,
    group: String,
) -> Result<(), StepError> {
    let detaches = provision_context.client.detach_requests();
    let expected = vec![DetachRequest::decrementing(group, [id])];
    if detaches == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected:?}, got {detaches:?}"
        )))
    }
}

#[then("no remote call was made")]
fn no_remote_call(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let calls = provision_context.client.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected calls: {calls:?}")))
    }
}
