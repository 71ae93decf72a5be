//! Implementation of the `weld build` command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::{OwoColorize, Stream};

use weld_lib::build::minify::{CommandMinifier, GzipCompressor};
use weld_lib::build::{BuildContext, ProfileReport, StageLogger, build_profiles};
use weld_lib::exec::TokioRunner;
use weld_lib::profile::BuildFlags;

use super::load_project;
use crate::output::{OutputFormat, format_duration, print_error, print_json, print_stat, print_success};

/// Flags given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct BuildArgs {
  pub clean: bool,
  pub full: bool,
  pub quick: bool,
}

impl From<BuildArgs> for BuildFlags {
  fn from(args: BuildArgs) -> Self {
    BuildFlags {
      clean: args.clean,
      full_build: args.full,
      quick_build: args.quick,
    }
  }
}

/// Prints stage progress to stdout.
struct ConsoleLogger {
  quiet: bool,
}

impl StageLogger for ConsoleLogger {
  fn log(&self, index: usize, stage: &str, message: &str, header: bool) {
    if self.quiet {
      return;
    }
    if header {
      let label = format!("[{}/5 {}]", index, stage);
      println!(
        "{} {}",
        label.if_supports_color(Stream::Stdout, |s| s.cyan()),
        message.if_supports_color(Stream::Stdout, |s| s.bold())
      );
    } else {
      println!("    {}", message);
    }
  }
}

fn report_json(report: &ProfileReport) -> serde_json::Value {
  match &report.result {
    Ok(outcome) => serde_json::json!({
      "profile": report.name,
      "ok": true,
      "elapsed_ms": report.elapsed.as_millis() as u64,
      "assemblies": outcome.assemblies.iter().filter(|a| a.status.ran()).count(),
      "bundles": outcome.bundles.iter().filter(|(_, s)| s.ran()).count(),
      "minified": outcome.minified.iter().filter(|(_, m)| m.minified.ran()).count(),
      "dependencies_installed": outcome.deps.as_ref().is_some_and(|d| d.reason.installs()),
      "package": outcome.package.as_ref().map(|p| p.artifact.display().to_string()),
    }),
    Err(e) => serde_json::json!({
      "profile": report.name,
      "ok": false,
      "elapsed_ms": report.elapsed.as_millis() as u64,
      "error": e.to_string(),
    }),
  }
}

/// Execute the build command.
///
/// Builds each selected profile in order. A failing profile is reported and
/// the remaining profiles still build; the command fails if any did.
pub fn cmd_build(config: &Path, profiles: &[String], args: BuildArgs, output: OutputFormat) -> Result<()> {
  let project = load_project(config)?;

  let runner = TokioRunner;
  let minifier = CommandMinifier::new(TokioRunner);
  let logger = ConsoleLogger {
    quiet: output.is_json(),
  };
  let ctx = BuildContext {
    project: &project,
    flags: args.into(),
    minifier: &minifier,
    compressor: &GzipCompressor,
    runner: &runner,
    logger: &logger,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let reports = rt.block_on(build_profiles(&ctx, profiles)).context("Build failed")?;

  if output.is_json() {
    let items: Vec<_> = reports.iter().map(report_json).collect();
    print_json(&items)?;
  } else {
    println!();
    for report in &reports {
      match &report.result {
        Ok(_) => print_success(&format!("{} ({})", report.name, format_duration(report.elapsed))),
        Err(e) => print_error(&format!("{}: {}", report.name, e)),
      }
    }
    print_stat("Profiles", &reports.len().to_string());
  }

  let failed = reports.iter().filter(|r| !r.succeeded()).count();
  if failed > 0 {
    bail!("{} of {} profile(s) failed", failed, reports.len());
  }
  Ok(())
}
