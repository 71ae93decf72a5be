//! Load command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn assembled(env: &TestEnv) {
  env.write_file("core/components/button.js", "class Button {}");
  env.write_file("core/settings.json", r#"{ "timeout": 10, "retries": 3 }"#);
  env.weld_cmd().args(["assemble", "core"]).assert().success();
}

#[test]
fn load_applies_overrides() {
  let env = TestEnv::empty();
  assembled(&env);
  env.write_file("overrides.json", r#"{ "core": { "timeout": 20 } }"#);

  env
    .weld_cmd()
    .args(["load", "dist/core.ado.json", "--overrides", "overrides.json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Loaded core"))
    .stdout(predicate::str::contains(r#"{"retries":3,"timeout":20}"#));
}

#[test]
fn load_json_output() {
  let env = TestEnv::empty();
  assembled(&env);

  env
    .weld_cmd()
    .args(["load", "dist/core.ado.json", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"components\": [\n      \"button\"\n    ]"))
    .stdout(predicate::str::is_match(r#""built": "\d{4}-\d{2}-\d{2}T[0-9:.]+Z""#).unwrap());
}

#[test]
fn duplicate_load_rejected_when_requested() {
  let env = TestEnv::empty();
  assembled(&env);

  env
    .weld_cmd()
    .args(["load", "dist/core.ado.json", "dist/core.ado.json"])
    .assert()
    .success();

  env
    .weld_cmd()
    .args(["load", "dist/core.ado.json", "dist/core.ado.json", "--reject-reload"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("already loaded"));
}

#[test]
fn load_missing_definition_fails() {
  let env = TestEnv::empty();

  env
    .weld_cmd()
    .args(["load", "missing.ado.json"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load missing.ado.json"));
}
