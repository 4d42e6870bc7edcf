//! Tokenweave CLI
//!
//! Builds CSS custom-property sheets and TypeScript token modules from a
//! design token source, one scoped block per `(brand, theme)` variant.
//!
//! - `tokenweave build` resolve, compose, validate and write artifacts
//! - `tokenweave check` the same run without writing anything
//! - `tokenweave init` scaffold a project
//! - `tokenweave contrast` WCAG ratio of two colors

mod config;
mod project;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tokenweave_core::contrast::WCAG_AA_NORMAL;
use tokenweave_core::{
    contrast_ratio, load_path, run, write_artifacts, PipelineOutput, Rgba,
};

use crate::config::TokenweaveConfig;

/// Design token pipeline
#[derive(Parser, Debug)]
#[command(name = "tokenweave")]
#[command(about = "Resolve design tokens into themed CSS and TypeScript artifacts")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build and write all artifacts
    Build {
        /// Project directory or config file
        #[arg(short = 'C', long, default_value = ".")]
        project: PathBuf,

        /// Treat contrast violations as errors
        #[arg(long)]
        strict: bool,

        /// Run the pipeline but do not write artifacts
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the pipeline and print the contrast report
    Check {
        /// Project directory or config file
        #[arg(short = 'C', long, default_value = ".")]
        project: PathBuf,

        /// Treat contrast violations as errors
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new token project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print the contrast ratio of two hex colors
    Contrast {
        /// Foreground color, e.g. "#767676"
        foreground: String,

        /// Background color, e.g. "#ffffff"
        background: String,

        /// Minimum ratio to pass
        #[arg(short, long, default_value_t = WCAG_AA_NORMAL)]
        threshold: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Build {
            project,
            strict,
            dry_run,
        } => cmd_build(&project, strict, dry_run),
        Commands::Check {
            project,
            strict,
            json,
        } => cmd_check(&project, strict, json),
        Commands::Init { path, name } => cmd_init(&path, name),
        Commands::Contrast {
            foreground,
            background,
            threshold,
        } => cmd_contrast(&foreground, &background, threshold),
    }
}

/// Directory that config paths are relative to.
fn project_root(project: &Path) -> PathBuf {
    if project.is_file() {
        project
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        project.to_path_buf()
    }
}

fn run_project(project: &Path, strict: bool) -> Result<(TokenweaveConfig, PipelineOutput)> {
    let config = TokenweaveConfig::load_from_dir(project)?;
    let root = project_root(project);

    info!("Building {} v{}", config.project.name, config.project.version);

    let source = config.source_path(&root);
    let tokens = load_path(&source)
        .with_context(|| format!("Failed to load tokens from {}", source.display()))?;
    let output = run(&tokens, &config.pipeline_config(strict))?;
    Ok((config, output))
}

fn cmd_build(project: &Path, strict: bool, dry_run: bool) -> Result<()> {
    let (config, output) = run_project(project, strict)?;
    let root = project_root(project);

    let artifacts = output.artifacts;

    if dry_run {
        for artifact in &artifacts {
            info!(
                "Would write {} ({} bytes)",
                artifact.path.display(),
                artifact.contents.len()
            );
        }
        return Ok(());
    }

    let out_dir = config.output_dir(&root);
    let written = write_artifacts(&out_dir, &artifacts)?;
    info!(
        "Wrote {} of {} artifacts to {}",
        written.len(),
        artifacts.len(),
        out_dir.display()
    );
    Ok(())
}

fn cmd_check(project: &Path, strict: bool, json: bool) -> Result<()> {
    let (_, output) = run_project(project, strict)?;

    if json {
        let report = output
            .report
            .to_json()
            .context("Failed to serialize contrast report")?;
        println!("{}", report);
        return Ok(());
    }

    for check in &output.report.checks {
        let scope = match &check.variant {
            Some(variant) => variant.to_string(),
            None => "base".to_string(),
        };
        println!(
            "{:<4} {:<20} {} on {}  {:.2} (min {})",
            if check.passed { "ok" } else { "FAIL" },
            scope,
            check.pair.foreground,
            check.pair.background,
            check.ratio,
            check.threshold
        );
    }

    let violations = output.report.violations().len();
    if violations > 0 {
        warn!("{} contrast violation(s)", violations);
    } else {
        info!("All {} contrast checks passed", output.report.checks.len());
    }
    Ok(())
}

fn cmd_init(path: &Path, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .or_else(|| {
                let absolute = path.canonicalize().ok()?;
                Some(absolute.file_name()?.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "tokens".to_string()),
    };

    project::create_project(path, &name)?;
    info!("Created token project `{}` in {}", name, path.display());
    Ok(())
}

fn cmd_contrast(foreground: &str, background: &str, threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        anyhow::bail!("threshold must be a positive number, got {threshold}");
    }
    let parse = |src: &str| {
        Rgba::parse_hex(src).with_context(|| format!("`{src}` is not a hex color"))
    };
    let ratio = contrast_ratio(parse(foreground)?, parse(background)?);
    let verdict = if ratio >= threshold { "pass" } else { "fail" };
    println!("{ratio:.2}:1 ({verdict} at {threshold})");
    Ok(())
}
