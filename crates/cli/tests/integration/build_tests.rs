//! Build command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const TWO_PROFILES: &str = r#"{
  "profiles": {
    "app": {
      "dest": "dist",
      "bundles": [{ "target": "dist/app.js", "files": ["src/a.js", "src/b.js"] }]
    },
    "lib": {
      "dest": "lib",
      "bundles": [{ "target": "lib/lib.js", "files": ["src/b.js"] }]
    }
  }
}"#;

fn sources(env: &TestEnv) {
  env.write_file("src/a.js", "x=1");
  env.write_file("src/b.js", "y=2");
}

#[test]
fn build_all_profiles() {
  let env = TestEnv::with_project(TWO_PROFILES);
  sources(&env);

  env
    .weld_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("app"))
    .stdout(predicate::str::contains("lib"));

  let bundle = env.read_file("dist/app.js");
  assert!(bundle.starts_with("// created: "));
  assert!(bundle.contains("// file (start): src/a.js\nx=1\n// file (end)\n"));
  assert!(env.path("lib/lib.js").exists());
}

#[test]
fn build_selected_profile_only() {
  let env = TestEnv::with_project(TWO_PROFILES);
  sources(&env);

  env.weld_cmd().args(["build", "lib"]).assert().success();

  assert!(env.path("lib/lib.js").exists());
  assert!(!env.path("dist/app.js").exists());
}

#[test]
fn build_unknown_profile_fails() {
  let env = TestEnv::with_project(TWO_PROFILES);

  env
    .weld_cmd()
    .args(["build", "mobile"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown profile: mobile"));
}

#[test]
fn failing_profile_reported_others_built() {
  let env = TestEnv::with_project(TWO_PROFILES);
  env.write_file("src/b.js", "y=2");

  env
    .weld_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("1 of 2 profile(s) failed"));

  assert!(!env.path("dist/app.js").exists());
  assert!(env.path("lib/lib.js").exists());
}

#[test]
fn json_output_lists_profiles() {
  let env = TestEnv::with_project(TWO_PROFILES);
  sources(&env);

  env
    .weld_cmd()
    .args(["build", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"profile\": \"app\""))
    .stdout(predicate::str::contains("\"ok\": true"));
}

#[cfg(unix)]
#[test]
fn minify_runs_configured_command_and_compresses() {
  let env = TestEnv::with_project(
    r#"{
      "settings": {
        "minify": true,
        "minifyConfig": { "command": ["cp", "{input}", "{output}"] },
        "gzip": true,
        "gzipConfig": { "level": 9 }
      },
      "profiles": {
        "app": {
          "dest": "dist",
          "bundles": [{ "target": "dist/app.js", "files": ["src/a.js"] }],
          "options": { "minify": true, "minifyConfig": {}, "gzip": true, "gzipConfig": {} }
        }
      }
    }"#,
  );
  env.write_file("src/a.js", "x=1");

  env.weld_cmd().arg("build").assert().success();

  assert!(env.path("dist/app.min.js").exists());
  assert!(env.path("dist/app.min.js.gz").exists());
}

#[cfg(unix)]
#[test]
fn quick_build_skips_minify() {
  let env = TestEnv::with_project(
    r#"{
      "settings": { "minify": true, "minifyConfig": { "command": ["cp", "{input}", "{output}"] } },
      "profiles": {
        "app": {
          "dest": "dist",
          "bundles": [{ "target": "dist/app.js", "files": ["src/a.js"] }],
          "options": { "minify": true, "minifyConfig": {} }
        }
      }
    }"#,
  );
  env.write_file("src/a.js", "x=1");

  env.weld_cmd().args(["build", "--quick"]).assert().success();

  assert!(env.path("dist/app.js").exists());
  assert!(!env.path("dist/app.min.js").exists());
}

#[test]
fn assemblies_built_into_profile_dest() {
  let env = TestEnv::with_project(
    r#"{ "profiles": { "app": { "dest": "dist", "assemblies": [{ "src": "core" }] } } }"#,
  );
  env.write_file("core/components/button.js", "class Button {}");

  env.weld_cmd().arg("build").assert().success();

  assert!(env.read_file("dist/core.js").contains("class Button {}"));
  assert!(env.path("dist/core.ado.json").exists());
}
