//! Build pipeline scenarios.

use std::fs;

use weld_lib::build::concat::concat_files;
use weld_lib::build::minify::{GzipCompressor, MinifyStage, minified_path, run_minify};
use weld_lib::build::package::package;
use weld_lib::build::{BuildContext, BuildError, build_profiles};
use weld_lib::consts::{CREATED_MARKER, FILE_END_MARKER, FILE_START_MARKER};
use weld_lib::profile::{BuildFlags, BundleDescriptor, PackageEntry, PackageSpec, ProjectConfig, StageToggles};

use super::common::{BrokenCompressor, MemoryLogger, Project, ScriptedRunner, UpperMinifier};

#[test]
fn bundle_of_two_files_has_markers_in_order() {
  let project = Project::new();
  project.write("src/a.js", "x=1");
  project.write("src/b.js", "y=2");
  let bundle = BundleDescriptor {
    target: "out/bundle.js".into(),
    files: vec!["src/a.js".into(), "src/b.js".into()],
  };

  concat_files(project.root(), &bundle).unwrap();

  let text = project.read("out/bundle.js");
  let (header, body) = text.split_once('\n').unwrap();
  let created: u128 = header.strip_prefix(CREATED_MARKER).unwrap().trim().parse().unwrap();
  assert!(created > 0);
  assert_eq!(
    body,
    format!(
      "{start} src/a.js\nx=1\n{end}\n{start} src/b.js\ny=2\n{end}\n",
      start = FILE_START_MARKER,
      end = FILE_END_MARKER
    )
  );
}

#[tokio::test]
async fn gzip_collaborator_writes_compressed_variant() {
  let project = Project::new();
  let artifact = project.write("dist/app.js", &"let value = 42;\n".repeat(200));
  let toggles = StageToggles {
    minify: true,
    minify_config: Some(serde_json::json!({})),
    gzip: true,
    gzip_config: Some(serde_json::json!({ "level": 9 })),
  };
  let logger = MemoryLogger::default();
  let stage = MinifyStage {
    settings: &toggles,
    options: &toggles,
    flags: &BuildFlags::default(),
    minifier: &UpperMinifier,
    compressor: &GzipCompressor,
    logger: &logger,
  };

  let outcome = run_minify(&artifact, &stage).await.unwrap();

  assert!(outcome.minified.ran());
  assert!(outcome.compressed.ran());
  let gz = fs::read(project.path("dist/app.min.js.gz")).unwrap();
  assert_eq!(&gz[..2], &[0x1f, 0x8b]);
  assert!(logger.lines.borrow().iter().any(|l| l.contains("app.js:")));
}

#[tokio::test]
async fn failed_compression_keeps_minified_file() {
  let project = Project::new();
  let artifact = project.write("dist/app.js", "let a = 1;");
  let toggles = StageToggles {
    minify: true,
    minify_config: Some(serde_json::json!({})),
    gzip: true,
    gzip_config: Some(serde_json::json!({})),
  };
  let logger = MemoryLogger::default();
  let stage = MinifyStage {
    settings: &toggles,
    options: &toggles,
    flags: &BuildFlags::default(),
    minifier: &UpperMinifier,
    compressor: &BrokenCompressor,
    logger: &logger,
  };

  let err = run_minify(&artifact, &stage).await.unwrap_err();

  assert!(matches!(err, BuildError::Tool { ref tool, .. } if tool == "gzip"));
  assert_eq!(fs::read_to_string(minified_path(&artifact)).unwrap(), "LET A = 1;");
}

#[tokio::test]
async fn missing_package_artifact_is_named() {
  let project = Project::new();
  project.write("dist/app.js", "x");
  project.write("pkg/package.json", r#"{ "name": "pkg", "version": "1.0.0" }"#);
  let spec = PackageSpec {
    stage: "stage".into(),
    files: vec![
      PackageEntry {
        src: "pkg/package.json".into(),
        dest: Some("package.json".into()),
      },
      PackageEntry {
        src: "dist".into(),
        dest: None,
      },
    ],
    command: vec!["npm".to_string(), "pack".to_string()],
    out_dir: None,
    extension: "tgz".to_string(),
    name: None,
    version: None,
  };
  let runner = ScriptedRunner {
    code: 1,
    stderr: "npm ERR! pack failed".to_string(),
    ..Default::default()
  };

  let err = package(project.root(), &spec, &runner, &MemoryLogger::default())
    .await
    .unwrap_err();

  match err {
    BuildError::PackageMissing { artifact, command_error } => {
      assert!(artifact.ends_with("pkg-v1.0.0.tgz"));
      assert_eq!(command_error, "npm ERR! pack failed");
    }
    other => panic!("unexpected error: {}", other),
  }
  assert!(project.path("stage/dist/app.js").exists());
}

#[tokio::test]
async fn profiles_build_independently() {
  let project = Project::new();
  project.write("src/a.js", "a");
  project.write(
    "weld.json",
    r#"{
      "profiles": {
        "alpha": { "dest": "dist", "bundles": [{ "target": "dist/alpha.js", "files": ["src/gone.js"] }] },
        "beta": { "dest": "dist", "bundles": [{ "target": "dist/beta.js", "files": ["src/a.js"] }] }
      }
    }"#,
  );
  let config = ProjectConfig::load(&project.path("weld.json")).unwrap();
  let runner = ScriptedRunner::default();
  let logger = MemoryLogger::default();
  let ctx = BuildContext {
    project: &config,
    flags: BuildFlags::default(),
    minifier: &UpperMinifier,
    compressor: &GzipCompressor,
    runner: &runner,
    logger: &logger,
  };

  let reports = build_profiles(&ctx, &[]).await.unwrap();

  assert_eq!(reports.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["alpha", "beta"]);
  assert!(!reports[0].succeeded());
  assert!(reports[1].succeeded());
  assert!(!project.path("dist/alpha.js").exists());
  assert!(project.read("dist/beta.js").contains("src/a.js"));
}
