//! Assemble command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn assemble_folder_writes_artifact_and_definition() {
  let env = TestEnv::empty();
  env.write_file("shop/components/cart.js", "class Cart {}");
  env.write_file("shop/functions/total.js", "function total() {}");

  env
    .weld_cmd()
    .args(["assemble", "shop", "--out", "out"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Assembled shop v0.0.0"));

  let artifact = env.read_file("out/shop.js");
  assert!(artifact.find("class Cart").unwrap() < artifact.find("function total").unwrap());
  assert!(env.read_file("out/shop.ado.json").contains("\"name\": \"shop\""));
}

#[test]
fn assemble_with_custom_template() {
  let env = TestEnv::empty();
  env.write_file("shop/components/cart.js", "class Cart {}");
  env.write_file("tpl.js", "// $${name}@$${version}\n$${components}");

  env
    .weld_cmd()
    .args(["assemble", "shop", "--template", "tpl.js"])
    .assert()
    .success();

  assert!(env.read_file("dist/shop.js").starts_with("// shop@0.0.0\n"));
}

#[test]
fn assemble_rejects_out_of_order_template() {
  let env = TestEnv::empty();
  env.write_file("shop/components/cart.js", "class Cart {}");
  env.write_file("tpl.js", "$${types}\n$${components}");

  env
    .weld_cmd()
    .args(["assemble", "shop", "--template", "tpl.js"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("must come after"));
}
