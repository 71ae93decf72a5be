mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use weld_lib::consts::PROJECT_FILE;

use crate::output::OutputFormat;

/// weld - incremental assembly builder and loader
#[derive(Parser)]
#[command(name = "weld")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build profiles from the project file
  Build {
    /// Profiles to build (default: all)
    profiles: Vec<String>,

    /// Path to the project file
    #[arg(short, long, default_value = PROJECT_FILE)]
    config: PathBuf,

    /// Rebuild everything
    #[arg(long)]
    clean: bool,

    /// Rebuild everything, ignoring timestamps
    #[arg(long)]
    full: bool,

    /// Skip minification and compression
    #[arg(long)]
    quick: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Expand one assembly into an artifact and its definition
  Assemble {
    /// Assembly folder or manifest file
    src: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist")]
    out: PathBuf,

    /// Template file (default: built-in template)
    #[arg(long)]
    template: Option<PathBuf>,
  },

  /// Load assembly definitions and show the resolved result
  Load {
    /// Assembly definition files (*.ado.json), loaded in order
    #[arg(required = true)]
    definitions: Vec<PathBuf>,

    /// JSON file with settings overrides keyed by assembly name
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Fail when an assembly is loaded twice
    #[arg(long)]
    reject_reload: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// List the profiles of the project file
  Profiles {
    /// Path to the project file
    #[arg(short, long, default_value = PROJECT_FILE)]
    config: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      profiles,
      config,
      clean,
      full,
      quick,
      output,
    } => cmd::cmd_build(&config, &profiles, cmd::BuildArgs { clean, full, quick }, output),
    Commands::Assemble { src, out, template } => cmd::cmd_assemble(&src, &out, template.as_deref()),
    Commands::Load {
      definitions,
      overrides,
      reject_reload,
      output,
    } => cmd::cmd_load(&definitions, overrides.as_deref(), reject_reload, output),
    Commands::Profiles { config, output } => cmd::cmd_profiles(&config, output),
  }
}
