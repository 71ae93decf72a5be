//! Minify and compress stage.
//!
//! For an artifact `app.js` the stage may produce `app.min.js` and
//! `app.min.js.gz`. Each step needs both the project settings and the
//! profile options to opt in, and compression only ever works from the
//! minified variant.

use std::ffi::OsString;
use std::fs::File;
use std::future::Future;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;
use tracing::debug;

use crate::build::change::should_run;
use crate::build::types::{BuildError, StageLogger, StepStatus, stage};
use crate::consts::{COMPRESSED_EXT, MINIFIED_SUFFIX};
use crate::exec::{CommandSpec, ProcessRunner};
use crate::profile::{BuildFlags, StageToggles};
use crate::util::fs::{size_kb, write_atomic};
use crate::util::json::deep_merge;

/// Default gzip level when the config does not name one.
const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Produces a minified copy of a file.
pub trait Minifier {
  fn minify(&self, input: &Path, output: &Path, config: &Value) -> impl Future<Output = Result<(), BuildError>>;
}

/// Produces a compressed copy of a file.
pub trait Compressor {
  fn compress(&self, input: &Path, output: &Path, config: &Value) -> impl Future<Output = Result<(), BuildError>>;
}

/// `dir/app.js` -> `dir/app.min.js`; `dir/app` -> `dir/app.min`.
pub fn minified_path(path: &Path) -> PathBuf {
  let stem = path.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
  let mut name = stem;
  name.push(".");
  name.push(MINIFIED_SUFFIX);
  if let Some(ext) = path.extension() {
    name.push(".");
    name.push(ext);
  }
  path.with_file_name(name)
}

/// `dir/app.min.js` -> `dir/app.min.js.gz`.
pub fn compressed_path(path: &Path) -> PathBuf {
  let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".");
  name.push(COMPRESSED_EXT);
  path.with_file_name(name)
}

/// Config handed to a collaborator: the settings side overlaid with the
/// options side.
fn effective_config(settings: Option<&Value>, options: Option<&Value>) -> Value {
  let mut config = settings.cloned().unwrap_or(Value::Null);
  if let Some(options) = options {
    deep_merge(&mut config, options);
  }
  config
}

/// What the stage did for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyOutcome {
  pub minified: StepStatus,
  pub compressed: StepStatus,
  /// Sizes in KB of the raw, minified and compressed variants that exist.
  pub sizes: VariantSizes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSizes {
  pub raw: Option<u64>,
  pub minified: Option<u64>,
  pub compressed: Option<u64>,
}

impl VariantSizes {
  fn measure(artifact: &Path) -> Self {
    let minified = minified_path(artifact);
    Self {
      raw: size_kb(artifact),
      minified: size_kb(&minified),
      compressed: size_kb(&compressed_path(&minified)),
    }
  }

  fn describe(&self) -> String {
    let mut parts = Vec::new();
    if let Some(kb) = self.raw {
      parts.push(format!("{} KB", kb));
    }
    if let Some(kb) = self.minified {
      parts.push(format!("min {} KB", kb));
    }
    if let Some(kb) = self.compressed {
      parts.push(format!("gz {} KB", kb));
    }
    parts.join(", ")
  }
}

/// Collaborators and switches for [`run_minify`].
pub struct MinifyStage<'a, M, C, L> {
  pub settings: &'a StageToggles,
  pub options: &'a StageToggles,
  pub flags: &'a BuildFlags,
  pub minifier: &'a M,
  pub compressor: &'a C,
  pub logger: &'a L,
}

/// Minify and compress one artifact as far as settings and options allow.
pub async fn run_minify<M: Minifier, C: Compressor, L: StageLogger>(
  artifact: &Path,
  ctx: &MinifyStage<'_, M, C, L>,
) -> Result<MinifyOutcome, BuildError> {
  let (index, name) = stage::MINIFY;
  let label = artifact.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
  let mut outcome = MinifyOutcome {
    minified: StepStatus::Skipped,
    compressed: StepStatus::Skipped,
    sizes: VariantSizes::default(),
  };

  if !(ctx.settings.minify_on() && ctx.options.minify_on()) {
    debug!(artifact = ?artifact, "minify not enabled by both settings and options");
    outcome.sizes = VariantSizes::measure(artifact);
    return Ok(outcome);
  }

  let minified = minified_path(artifact);
  if should_run(artifact, &minified, ctx.flags) {
    let config = effective_config(ctx.settings.minify_config.as_ref(), ctx.options.minify_config.as_ref());
    ctx.minifier.minify(artifact, &minified, &config).await?;
    outcome.minified = StepStatus::Ran;
    ctx.logger.log(index, name, &format!("minified {}", label), false);
  }

  if minified.exists() && ctx.settings.gzip_on() && ctx.options.gzip_on() {
    let compressed = compressed_path(&minified);
    if should_run(&minified, &compressed, ctx.flags) {
      let config = effective_config(ctx.settings.gzip_config.as_ref(), ctx.options.gzip_config.as_ref());
      ctx.compressor.compress(&minified, &compressed, &config).await?;
      outcome.compressed = StepStatus::Ran;
      ctx.logger.log(index, name, &format!("compressed {}", label), false);
    }
  }

  outcome.sizes = VariantSizes::measure(artifact);
  ctx
    .logger
    .log(index, name, &format!("{}: {}", label, outcome.sizes.describe()), false);

  Ok(outcome)
}

/// Runs an external minifier.
///
/// The command line comes from the `command` key of the minify config, with
/// `{input}`, `{output}` and `{config}` tokens replaced per file. Without one,
/// `terser {input} --compress --mangle -o {output}` is used.
#[derive(Debug, Clone)]
pub struct CommandMinifier<R> {
  runner: R,
}

impl<R: ProcessRunner> CommandMinifier<R> {
  pub fn new(runner: R) -> Self {
    Self { runner }
  }

  fn command_line(config: &Value) -> Vec<String> {
    config
      .get("command")
      .and_then(Value::as_array)
      .map(|parts| parts.iter().filter_map(Value::as_str).map(String::from).collect())
      .unwrap_or_else(|| {
        ["terser", "{input}", "--compress", "--mangle", "-o", "{output}"]
          .iter()
          .map(|s| s.to_string())
          .collect()
      })
  }
}

impl<R: ProcessRunner> Minifier for CommandMinifier<R> {
  async fn minify(&self, input: &Path, output: &Path, config: &Value) -> Result<(), BuildError> {
    let input_str = input.to_string_lossy();
    let output_str = output.to_string_lossy();
    let config_str = config.to_string();

    let line: Vec<String> = Self::command_line(config)
      .into_iter()
      .map(|part| {
        part
          .replace("{input}", &input_str)
          .replace("{output}", &output_str)
          .replace("{config}", &config_str)
      })
      .collect();

    let cwd = input.parent().unwrap_or(Path::new("."));
    let spec = CommandSpec::from_line(&line, cwd).map_err(|e| BuildError::tool("minifier", input, e))?;
    let tool = spec.program.clone();

    let result = self
      .runner
      .run(&spec)
      .await
      .map_err(|e| BuildError::tool(&tool, input, e))?;
    if !result.success() {
      let message = if result.stderr.is_empty() {
        format!("exit code {:?}", result.code)
      } else {
        result.stderr
      };
      return Err(BuildError::tool(&tool, input, message));
    }
    if !output.exists() {
      return Err(BuildError::tool(&tool, input, "minifier produced no output"));
    }

    Ok(())
  }
}

/// In-process gzip compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCompressor;

impl GzipCompressor {
  fn level(config: &Value, input: &Path) -> Result<u32, BuildError> {
    match config.get("level") {
      None | Some(Value::Null) => Ok(DEFAULT_GZIP_LEVEL),
      Some(value) => value
        .as_u64()
        .filter(|level| *level <= 9)
        .map(|level| level as u32)
        .ok_or_else(|| BuildError::tool("gzip", input, format!("invalid compression level {}: must be 0-9", value))),
    }
  }

  fn compress_file(input: &Path, output: &Path, level: u32) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    io::copy(&mut reader, &mut encoder)?;
    let compressed = encoder.finish()?;
    write_atomic(output, &compressed)
  }
}

impl Compressor for GzipCompressor {
  async fn compress(&self, input: &Path, output: &Path, config: &Value) -> Result<(), BuildError> {
    let level = Self::level(config, input)?;
    Self::compress_file(input, output, level).map_err(|e| BuildError::tool("gzip", input, e))
  }
}
