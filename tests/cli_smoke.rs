//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const DRIVER_ENV: [&str; 7] = [
    "SPOTINST_TOKEN",
    "SPOTINST_ACCOUNT",
    "SPOTINST_ELASTIGROUP_ID",
    "SPOTINST_SSHKEY_PATH",
    "USE_PUBLIC_IP",
    "SSH_USER",
    "SPOTINST_STORE_PATH",
];

fn store() -> TempDir {
    TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"))
}

#[test]
fn flags_lists_creation_flags() {
    let mut cmd = cargo_bin_cmd!("spotinst-machine");
    cmd.arg("flags")
        .assert()
        .success()
        .stdout(predicate::str::contains("--spotinst-token\tSPOTINST_TOKEN"))
        .stdout(predicate::str::contains("--use-public-ip\tUSE_PUBLIC_IP"));
}

#[test]
fn create_without_credentials_fails() {
    let tmp = store();
    let mut cmd = cargo_bin_cmd!("spotinst-machine");
    for name in DRIVER_ENV {
        cmd.env_remove(name);
    }
    cmd.arg("--store-path")
        .arg(tmp.path())
        .args(["create", "--name", "m1", "--spotinst-elastigroup-id", "g1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("token and account are required"));
    assert!(!tmp.path().join("machines").join("m1").exists());
}

#[test]
fn state_of_unknown_machine_fails() {
    let tmp = store();
    let mut cmd = cargo_bin_cmd!("spotinst-machine");
    cmd.env_remove("SPOTINST_STORE_PATH")
        .arg("--store-path")
        .arg(tmp.path())
        .args(["state", "--name", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("machine ghost does not exist"));
}

#[test]
fn ssh_reports_connection_details_from_the_record() {
    let tmp = store();
    let dir = tmp.path().join("machines").join("m1");
    std::fs::create_dir_all(&dir).unwrap_or_else(|err| panic!("mkdir: {err}"));
    std::fs::write(
        dir.join("spotinst.json"),
        r#"{"machineName":"m1","sshUser":"admin","sshKeyPath":"/k","groupId":"g1","instanceId":"i-1","privateIp":"10.0.0.5"}"#,
    )
    .unwrap_or_else(|err| panic!("write record: {err}"));

    let mut cmd = cargo_bin_cmd!("spotinst-machine");
    cmd.env_remove("SPOTINST_STORE_PATH")
        .arg("--store-path")
        .arg(tmp.path())
        .args(["ssh", "--name", "m1"])
        .assert()
        .success()
        .stdout("admin@10.0.0.5:22\n/k\n");

    let saved = std::fs::read_to_string(dir.join("spotinst.json"))
        .unwrap_or_else(|err| panic!("read record: {err}"));
    assert!(saved.contains("\"sshPort\": 22"), "record: {saved}");
}

#[test]
fn stop_is_accepted_as_a_no_op() {
    let tmp = store();
    let dir = tmp.path().join("machines").join("m1");
    std::fs::create_dir_all(&dir).unwrap_or_else(|err| panic!("mkdir: {err}"));
    std::fs::write(dir.join("spotinst.json"), r#"{"machineName":"m1"}"#)
        .unwrap_or_else(|err| panic!("write record: {err}"));

    let mut cmd = cargo_bin_cmd!("spotinst-machine");
    cmd.env_remove("SPOTINST_STORE_PATH")
        .arg("--store-path")
        .arg(tmp.path())
        .args(["stop", "--name", "m1"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn rm_without_instance_deletes_the_record() {
    let tmp = store();
    let dir = tmp.path().join("machines").join("m1");
    std::fs::create_dir_all(&dir).unwrap_or_else(|err| panic!("mkdir: {err}"));
    std::fs::write(dir.join("spotinst.json"), r#"{"machineName":"m1"}"#)
        .unwrap_or_else(|err| panic!("write record: {err}"));

    let mut cmd = cargo_bin_cmd!("spotinst-machine");
    cmd.env_remove("SPOTINST_STORE_PATH")
        .arg("--store-path")
        .arg(tmp.path())
        .args(["rm", "--name", "m1"])
        .assert()
        .success();

    assert!(!dir.join("spotinst.json").exists());
}
