//! Assemble an artifact, then load its definition.

use std::collections::HashMap;

use serde_json::json;
use weld_lib::ado::AssemblyDefinition;
use weld_lib::loader::{LoadContext, LoadError, LoadHooks, ReloadPolicy};
use weld_lib::template::{AssemblyManifest, Template, write_assembly};

use super::common::Project;

fn assembled(project: &Project) -> std::path::PathBuf {
  project.write("core/components/button.js", "class Button {}");
  project.write("core/components/forms/input.js", "class Input {}");
  project.write("core/types/size.js", "const Size = {};");
  project.write("core/settings.json", r#"{ "timeout": 10, "retries": 3 }"#);
  project.write("core/config.json", r#"{ "theme": "dark" }"#);

  let manifest = AssemblyManifest::load(&project.path("core")).unwrap();
  let files = write_assembly(&manifest, &Template::builtin(), &project.path("dist"), 1).unwrap();
  files.definition
}

#[test]
fn overrides_merge_into_embedded_settings() {
  let project = Project::new();
  let definition = assembled(&project);
  let overrides = HashMap::from([("core".to_string(), json!({ "timeout": 20 }))]);
  let mut ctx = LoadContext::new().with_overrides(overrides);

  let assembly = ctx.load_file(&definition, &LoadHooks::new()).unwrap();

  assert_eq!(assembly.settings().as_value(), &json!({ "timeout": 20, "retries": 3 }));
  assert_eq!(assembly.config().get("theme"), Some(&json!("dark")));
  assert!(matches!(
    assembly.settings().set("timeout", json!(1)),
    Err(LoadError::Frozen { .. })
  ));
  assert_eq!(assembly.base_path(), project.path("dist"));
  assert_eq!(assembly.built(), 1);
  let names: Vec<&str> = assembly.components().iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, vec!["button", "forms.input"]);
}

#[test]
fn artifact_embeds_definition_and_settings() {
  let project = Project::new();
  let definition_path = assembled(&project);
  let artifact = project.read("dist/core.js");
  let definition = AssemblyDefinition::from_json(&project.read("dist/core.ado.json")).unwrap();

  assert_eq!(definition_path, project.path("dist/core.ado.json"));
  assert_eq!(definition.file, "core.js");
  assert!(artifact.contains(r#"JSON.parse("{ \"timeout\": 10, \"retries\": 3 }")"#));
  assert!(artifact.find("class Button").unwrap() < artifact.find("const Size").unwrap());
}

#[test]
fn loading_twice_follows_policy() {
  let project = Project::new();
  let definition = assembled(&project);

  let mut lenient = LoadContext::new();
  let first = lenient.load_file(&definition, &LoadHooks::new()).unwrap();
  let second = lenient.load_file(&definition, &LoadHooks::new()).unwrap();
  assert!(std::sync::Arc::ptr_eq(&first, &second));

  let mut strict = LoadContext::new().with_policy(ReloadPolicy::Reject);
  strict.load_file(&definition, &LoadHooks::new()).unwrap();
  assert!(matches!(
    strict.load_file(&definition, &LoadHooks::new()),
    Err(LoadError::AlreadyLoaded(_))
  ));
}

#[test]
fn failed_load_leaves_context_usable() {
  let project = Project::new();
  let definition = assembled(&project);
  let mut ctx = LoadContext::new();
  let failing = LoadHooks::new().after_load(|_| Err("listener crashed".into()));

  let err = ctx.load_file(&definition, &failing).unwrap_err();

  assert!(matches!(err, LoadError::Hook { hook: "after_load", .. }));
  assert_eq!(ctx.current(), None);
  assert!(ctx.get("core").is_some());
}

#[test]
fn missing_definition_is_io_error() {
  let project = Project::new();
  let mut ctx = LoadContext::new();

  let err = ctx
    .load_file(&project.path("dist/none.ado.json"), &LoadHooks::new())
    .unwrap_err();

  assert!(matches!(err, LoadError::Io { .. }));
}
