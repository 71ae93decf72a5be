//! Build orchestration.
//!
//! A profile runs its stages in a fixed order:
//!
//! 1. assemble: expand the declared assemblies
//! 2. bundle: concatenate bundle sources into their targets
//! 3. minify: minify and compress bundle targets and the individual files
//! 4. deps: mirror the dependency manifest and install
//! 5. package: stage files and run the packager
//!
//! A failing stage stops the rest of that profile. [`build_profiles`] keeps
//! going with the next profile and reports one result per profile.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::build::change::should_run_any;
use crate::ado::AssemblyDefinition;
use crate::build::concat::{concat_files, listing_matches};
use crate::build::deps::{DepsOutcome, install_deps};
use crate::build::minify::{Compressor, MinifyOutcome, MinifyStage, Minifier, run_minify};
use crate::build::package::{PackageOutcome, package};
use crate::build::types::{BuildError, StageLogger, StepStatus, stage};
use crate::exec::ProcessRunner;
use crate::profile::{BuildFlags, Profile, ProjectConfig};
use crate::template::{AssembledFiles, AssemblyManifest, FragmentKind, Template, write_assembly};
use crate::util::fs::{display_relative, epoch_millis, resolve};

/// Everything a build needs besides the profile itself.
pub struct BuildContext<'a, M, C, R, L> {
  pub project: &'a ProjectConfig,
  pub flags: BuildFlags,
  pub minifier: &'a M,
  pub compressor: &'a C,
  pub runner: &'a R,
  pub logger: &'a L,
}

/// An assembly and whether it was rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyResult {
  pub source: PathBuf,
  pub status: StepStatus,
  /// Written files; `None` when the artifact was up to date.
  pub files: Option<AssembledFiles>,
}

/// What one profile build did, stage by stage.
#[derive(Debug, Default)]
pub struct ProfileOutcome {
  pub assemblies: Vec<AssemblyResult>,
  pub bundles: Vec<(PathBuf, StepStatus)>,
  pub minified: Vec<(PathBuf, MinifyOutcome)>,
  pub deps: Option<DepsOutcome>,
  pub package: Option<PackageOutcome>,
}

/// Result of one profile within [`build_profiles`].
#[derive(Debug)]
pub struct ProfileReport {
  pub name: String,
  pub elapsed: Duration,
  pub result: Result<ProfileOutcome, BuildError>,
}

impl ProfileReport {
  pub fn succeeded(&self) -> bool {
    self.result.is_ok()
  }
}

/// Build the selected profiles in order (all when `names` is empty).
///
/// Only an unknown profile name fails the call; build errors are recorded in
/// the affected profile's report.
pub async fn build_profiles<M, C, R, L>(
  ctx: &BuildContext<'_, M, C, R, L>,
  names: &[String],
) -> Result<Vec<ProfileReport>, BuildError>
where
  M: Minifier,
  C: Compressor,
  R: ProcessRunner,
  L: StageLogger,
{
  let selected = ctx.project.select(names)?;
  let mut reports = Vec::with_capacity(selected.len());

  for (name, profile) in selected {
    info!(profile = name, "building profile");
    let start = Instant::now();
    let result = build_profile(ctx, name, profile).await;
    let elapsed = start.elapsed();

    match &result {
      Ok(_) => info!(profile = name, elapsed = ?elapsed, "profile built"),
      Err(e) => error!(profile = name, error = %e, "profile failed"),
    }
    reports.push(ProfileReport {
      name: name.to_string(),
      elapsed,
      result,
    });
  }

  Ok(reports)
}

/// Run every stage of one profile.
pub async fn build_profile<M, C, R, L>(
  ctx: &BuildContext<'_, M, C, R, L>,
  name: &str,
  profile: &Profile,
) -> Result<ProfileOutcome, BuildError>
where
  M: Minifier,
  C: Compressor,
  R: ProcessRunner,
  L: StageLogger,
{
  let root = ctx.project.root.as_path();
  let dest = resolve(root, &profile.dest);
  let mut outcome = ProfileOutcome::default();

  outcome.assemblies = assemble_stage(ctx, name, profile, &dest)?;
  outcome.bundles = bundle_stage(ctx, name, profile)?;
  outcome.minified = minify_stage(ctx, name, profile).await?;

  if let Some(deps) = &profile.deps {
    let (index, stage_name) = stage::DEPS;
    ctx
      .logger
      .log(index, stage_name, &format!("{}: installing dependencies", name), true);
    outcome.deps = Some(install_deps(root, &dest, deps, &ctx.flags, ctx.runner, ctx.logger).await?);
  }

  if let Some(spec) = &profile.package {
    let (index, stage_name) = stage::PACKAGE;
    ctx.logger.log(index, stage_name, &format!("{}: packaging", name), true);
    outcome.package = Some(package(root, spec, ctx.runner, ctx.logger).await?);
  }

  Ok(outcome)
}

/// Template for a profile: its own, else the project's, else the built-in.
fn profile_template(project: &ProjectConfig, profile: &Profile) -> Result<(Template, Option<PathBuf>), BuildError> {
  match profile.template.as_ref().or(project.template.as_ref()) {
    Some(path) => {
      let path = resolve(&project.root, path);
      Ok((Template::load(&path)?, Some(path)))
    }
    None => Ok((Template::builtin(), None)),
  }
}

/// Every file an assembly artifact is derived from.
fn assembly_inputs(manifest: &AssemblyManifest, source: &Path) -> Vec<PathBuf> {
  let mut inputs: Vec<PathBuf> = FragmentKind::ALL
    .into_iter()
    .flat_map(|kind| manifest.fragments(kind).into_iter().map(|f| f.path))
    .collect();
  for block in [&manifest.keywords, &manifest.globals, &manifest.settings, &manifest.config]
    .into_iter()
    .flatten()
  {
    inputs.push(manifest.resolve(block));
  }
  let explicit = if source.is_dir() {
    source.join(crate::template::manifest::MANIFEST_FILE)
  } else {
    source.to_path_buf()
  };
  if explicit.exists() {
    inputs.push(explicit);
  }
  inputs
}

/// Whether the fragment files recorded in the artifact's definition differ
/// from the manifest's current ones. An unreadable definition counts as
/// changed.
fn fragments_changed(manifest: &AssemblyManifest, artifact: &Path) -> bool {
  let path = AssemblyDefinition::path_for(artifact);
  let Some(recorded) = fs::read_to_string(&path)
    .ok()
    .and_then(|content| AssemblyDefinition::from_json(&content).ok())
  else {
    return true;
  };

  FragmentKind::ALL.into_iter().any(|kind| {
    let refs = match kind {
      FragmentKind::Component => &recorded.components,
      FragmentKind::Resource => &recorded.resources,
      FragmentKind::Type => &recorded.types,
      FragmentKind::Function => &recorded.functions,
    };
    let current = manifest
      .fragments(kind)
      .into_iter()
      .map(|f| display_relative(&manifest.root, &f.path));
    !current.eq(refs.iter().map(|r| r.file.clone()))
  })
}

fn assemble_stage<M, C, R, L: StageLogger>(
  ctx: &BuildContext<'_, M, C, R, L>,
  name: &str,
  profile: &Profile,
  dest: &Path,
) -> Result<Vec<AssemblyResult>, BuildError> {
  if profile.assemblies.is_empty() {
    return Ok(Vec::new());
  }

  let (index, stage_name) = stage::ASSEMBLE;
  let root = ctx.project.root.as_path();
  ctx.logger.log(
    index,
    stage_name,
    &format!("{}: {} assembl(ies)", name, profile.assemblies.len()),
    true,
  );

  let (template, template_path) = profile_template(ctx.project, profile)?;
  let mut results = Vec::with_capacity(profile.assemblies.len());

  for assembly in &profile.assemblies {
    let source = resolve(root, &assembly.src);
    let manifest = AssemblyManifest::load(&source)?;
    let out_dir = assembly.out.as_ref().map_or_else(|| dest.to_path_buf(), |out| resolve(root, out));
    let artifact = out_dir.join(manifest.artifact_file());

    let mut inputs = assembly_inputs(&manifest, &source);
    inputs.extend(template_path.clone());

    let stale = should_run_any(inputs.iter().map(PathBuf::as_path), &artifact, &ctx.flags)
      || fragments_changed(&manifest, &artifact);
    if !stale {
      ctx
        .logger
        .log(index, stage_name, &format!("{}: up to date", manifest.name), false);
      results.push(AssemblyResult {
        source,
        status: StepStatus::Skipped,
        files: None,
      });
      continue;
    }

    let files = write_assembly(&manifest, &template, &out_dir, epoch_millis() as u64)?;
    ctx.logger.log(
      index,
      stage_name,
      &format!("{} -> {}", manifest.name, files.artifact.display()),
      false,
    );
    results.push(AssemblyResult {
      source,
      status: StepStatus::Ran,
      files: Some(files),
    });
  }

  Ok(results)
}

fn bundle_stage<M, C, R, L: StageLogger>(
  ctx: &BuildContext<'_, M, C, R, L>,
  name: &str,
  profile: &Profile,
) -> Result<Vec<(PathBuf, StepStatus)>, BuildError> {
  if profile.bundles.is_empty() {
    return Ok(Vec::new());
  }

  let (index, stage_name) = stage::BUNDLE;
  let root = ctx.project.root.as_path();
  ctx.logger.log(
    index,
    stage_name,
    &format!("{}: {} bundle(s)", name, profile.bundles.len()),
    true,
  );

  let mut results = Vec::with_capacity(profile.bundles.len());
  for bundle in &profile.bundles {
    let target = resolve(root, &bundle.target);
    let sources: Vec<PathBuf> = bundle.files.iter().map(|f| resolve(root, f)).collect();

    if should_run_any(sources.iter().map(PathBuf::as_path), &target, &ctx.flags) || !listing_matches(root, bundle) {
      concat_files(root, bundle)?;
      ctx.logger.log(
        index,
        stage_name,
        &format!("{} ({} files)", bundle.target.display(), bundle.files.len()),
        false,
      );
      results.push((target, StepStatus::Ran));
    } else {
      ctx
        .logger
        .log(index, stage_name, &format!("{}: up to date", bundle.target.display()), false);
      results.push((target, StepStatus::Skipped));
    }
  }

  Ok(results)
}

/// Bundle targets first, then the individually listed files that are not
/// also bundle targets.
fn minify_targets(root: &Path, profile: &Profile) -> Vec<PathBuf> {
  let mut targets: Vec<PathBuf> = profile.bundles.iter().map(|b| resolve(root, &b.target)).collect();
  for file in &profile.minify {
    let path = resolve(root, file);
    if !targets.contains(&path) {
      targets.push(path);
    }
  }
  targets
}

async fn minify_stage<M, C, R, L>(
  ctx: &BuildContext<'_, M, C, R, L>,
  name: &str,
  profile: &Profile,
) -> Result<Vec<(PathBuf, MinifyOutcome)>, BuildError>
where
  M: Minifier,
  C: Compressor,
  L: StageLogger,
{
  let targets = minify_targets(&ctx.project.root, profile);
  if targets.is_empty() {
    return Ok(Vec::new());
  }

  let (index, stage_name) = stage::MINIFY;
  if ctx.flags.quick_build {
    ctx
      .logger
      .log(index, stage_name, &format!("{}: quick build, skipping minify", name), true);
    return Ok(Vec::new());
  }
  ctx
    .logger
    .log(index, stage_name, &format!("{}: {} file(s)", name, targets.len()), true);

  let stage = MinifyStage {
    settings: &ctx.project.settings,
    options: &profile.options,
    flags: &ctx.flags,
    minifier: ctx.minifier,
    compressor: ctx.compressor,
    logger: ctx.logger,
  };

  let mut results = Vec::with_capacity(targets.len());
  for target in targets {
    let outcome = run_minify(&target, &stage).await?;
    results.push((target, outcome));
  }
  Ok(results)
}
