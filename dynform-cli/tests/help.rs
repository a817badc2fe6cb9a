use assert_cmd::cargo::{self};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

#[test]
fn prints_help() {
    let mut cmd = cargo::cargo_bin_cmd!("dynform");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("dynform"));
}

#[test]
fn lists_companies_without_starting_the_ui() {
    let config = r#"{
        "Acme Retail": {"FormFields": [{"Label": "Store Name", "Type": "text"}]},
        "Globex Logistics": {"FormFields": [{"Label": "Depot City", "Type": "text"}]}
    }"#;
    let mut cmd = cargo::cargo_bin_cmd!("dynform");
    cmd.args(["--config", config, "--list-companies"])
        .assert()
        .success()
        .stdout(contains("Acme Retail").and(contains("Globex Logistics")));
}

#[test]
fn rejects_a_malformed_configuration() {
    let mut cmd = cargo::cargo_bin_cmd!("dynform");
    cmd.args(["--config", r#"{"Broken Co": {}}"#])
        .assert()
        .failure()
        .stderr(contains("company configuration"));
}
