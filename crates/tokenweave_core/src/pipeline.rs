//! Pipeline entry point
//!
//! [`run`] takes a loaded [`TokenSet`] and an immutable [`PipelineConfig`] and
//! produces every resolved variant, the contrast report and the rendered
//! artifacts, all in memory. Nothing touches the disk until
//! [`write_artifacts`] is called with the complete artifact list.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::contrast::{check_set, validate_pairs, ContrastPair, ContrastReport};
use crate::emit::{render, Artifact, OutputMode, Platform};
use crate::error::{ConfigError, Result, TokenError};
use crate::resolver::resolve;
use crate::token::{is_valid_segment, ResolvedTokenSet, TokenSet};
use crate::variant::{Variant, VariantComposer, VariantLayer};

/// What to do with contrast violations
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastPolicy {
    /// Log and report violations, keep going
    #[default]
    Warn,
    /// Fail the run on any violation
    Error,
}

/// File names used for artifacts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    pub mode: OutputMode,
    /// Aggregate CSS file name
    pub css_file: String,
    /// Aggregate module file name
    pub module_file: String,
    /// Contrast report written alongside the artifacts
    pub report_file: Option<String>,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            mode: OutputMode::Aggregate,
            css_file: "tokens.css".to_string(),
            module_file: "tokens.ts".to_string(),
            report_file: None,
        }
    }
}

impl OutputLayout {
    fn aggregate_file(&self, platform: Platform) -> &str {
        match platform {
            Platform::Css => &self.css_file,
            Platform::TypeScript => &self.module_file,
        }
    }

    /// Path of the artifact for `platform`, per variant or aggregated.
    fn artifact_path(&self, platform: Platform, variant: Option<&Variant>) -> PathBuf {
        match variant {
            Some(variant) => PathBuf::from(format!(
                "{}.{}.{}",
                variant.brand,
                variant.theme,
                platform.extension()
            )),
            None => PathBuf::from(self.aggregate_file(platform)),
        }
    }
}

/// Everything a pipeline run needs besides the token source
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub brands: Vec<String>,
    pub themes: Vec<String>,
    pub layers: Vec<VariantLayer>,
    pub contrast_pairs: Vec<ContrastPair>,
    pub contrast_policy: ContrastPolicy,
    pub platforms: Vec<Platform>,
    pub layout: OutputLayout,
}

impl PipelineConfig {
    /// Config for the `brands × themes` variants with both built-in platforms.
    pub fn new<B, T>(brands: B, themes: T) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            brands: brands.into_iter().map(Into::into).collect(),
            themes: themes.into_iter().map(Into::into).collect(),
            layers: Vec::new(),
            contrast_pairs: Vec::new(),
            contrast_policy: ContrastPolicy::Warn,
            platforms: vec![Platform::Css, Platform::TypeScript],
            layout: OutputLayout::default(),
        }
    }

    pub fn with_layer(mut self, layer: VariantLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_contrast_pair(mut self, pair: ContrastPair) -> Self {
        self.contrast_pairs.push(pair);
        self
    }

    pub fn with_policy(mut self, policy: ContrastPolicy) -> Self {
        self.contrast_policy = policy;
        self
    }

    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.layout.mode = mode;
        self
    }

    pub fn with_report_file(mut self, file: impl Into<String>) -> Self {
        self.layout.report_file = Some(file.into());
        self
    }

    /// Every file a successful run produces, in artifact order.
    pub fn artifact_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for &platform in &self.platforms {
            match self.layout.mode {
                OutputMode::Aggregate => paths.push(self.layout.artifact_path(platform, None)),
                OutputMode::PerVariant => {
                    for variant in self.variants() {
                        paths.push(self.layout.artifact_path(platform, Some(&variant)));
                    }
                }
            }
        }
        if let Some(report_file) = &self.layout.report_file {
            paths.push(PathBuf::from(report_file));
        }
        paths
    }

    /// Declared variants: every brand with every theme, in declaration order.
    pub fn variants(&self) -> Vec<Variant> {
        self.brands
            .iter()
            .flat_map(|brand| self.themes.iter().map(move |theme| Variant::new(brand, theme)))
            .collect()
    }

    /// Check the configuration for consistency, independent of any tokens.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (axis, names) in [("brand", &self.brands), ("theme", &self.themes)] {
            let mut seen = FxHashSet::default();
            for name in names {
                if !is_valid_segment(name) {
                    return Err(ConfigError::InvalidVariantName {
                        axis,
                        name: name.clone(),
                    });
                }
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::DuplicateVariant {
                        axis,
                        name: name.clone(),
                    });
                }
            }
        }
        if self.brands.is_empty() || self.themes.is_empty() {
            return Err(ConfigError::NoVariants);
        }

        for (index, layer) in self.layers.iter().enumerate() {
            if layer.brand.is_none() && layer.theme.is_none() {
                return Err(ConfigError::LayerWithoutSelector { index });
            }
            if let Some(brand) = &layer.brand {
                if !self.brands.contains(brand) {
                    return Err(ConfigError::UndeclaredVariant {
                        layer: layer.selector(),
                        axis: "brand",
                        name: brand.clone(),
                    });
                }
            }
            if let Some(theme) = &layer.theme {
                if !self.themes.contains(theme) {
                    return Err(ConfigError::UndeclaredVariant {
                        layer: layer.selector(),
                        axis: "theme",
                        name: theme.clone(),
                    });
                }
            }
        }

        ensure_distinct_paths(self.artifact_paths().iter())?;
        Ok(())
    }
}

/// One composed variant
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedVariant {
    pub variant: Variant,
    pub tokens: ResolvedTokenSet,
}

/// Result of a successful run
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub base: ResolvedTokenSet,
    pub variants: Vec<ComposedVariant>,
    pub report: ContrastReport,
    pub artifacts: Vec<Artifact>,
}

/// Run the whole pipeline: resolve, compose, validate, emit.
///
/// Fails on the first fatal error; with [`ContrastPolicy::Error`] any
/// contrast violation is fatal too. Artifacts are rendered but not written.
pub fn run(tokens: &TokenSet, config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;

    let base = resolve(tokens)?;
    validate_pairs(&config.contrast_pairs, &base)?;
    let composer = VariantComposer::new(&base, &config.layers)?;

    let variants = compose_variants(&composer, &config.variants())?;
    tracing::debug!("composed {} variants", variants.len());

    let report = contrast_report(&config.contrast_pairs, &base, &variants)?;
    let violations = report.violations();
    if !violations.is_empty() {
        match config.contrast_policy {
            ContrastPolicy::Error => return Err(TokenError::ContrastViolations { violations }),
            ContrastPolicy::Warn => {
                for violation in &violations {
                    tracing::warn!("contrast: {}", violation);
                }
            }
        }
    }

    let mut artifacts = render_artifacts(config, &variants)?;
    if let Some(report_file) = &config.layout.report_file {
        artifacts.push(Artifact {
            path: PathBuf::from(report_file),
            contents: report.to_json()?,
        });
    }
    tracing::info!(
        "{} tokens, {} variants, {} artifacts, {} contrast violations",
        base.len(),
        variants.len(),
        artifacts.len(),
        violations.len()
    );

    Ok(PipelineOutput {
        base,
        variants,
        report,
        artifacts,
    })
}

fn compose_variants(
    composer: &VariantComposer<'_>,
    variants: &[Variant],
) -> Result<Vec<ComposedVariant>> {
    let compose = |variant: &Variant| -> Result<ComposedVariant> {
        Ok(ComposedVariant {
            variant: variant.clone(),
            tokens: composer.compose(variant)?,
        })
    };

    #[cfg(feature = "parallel")]
    let composed = variants.par_iter().map(compose).collect();
    #[cfg(not(feature = "parallel"))]
    let composed = variants.iter().map(compose).collect();

    composed
}

fn contrast_report(
    pairs: &[ContrastPair],
    base: &ResolvedTokenSet,
    variants: &[ComposedVariant],
) -> Result<ContrastReport> {
    let mut report = ContrastReport::default();
    report.extend(check_set(pairs, None, base)?);
    for composed in variants {
        report.extend(check_set(pairs, Some(&composed.variant), &composed.tokens)?);
    }
    Ok(report)
}

fn render_artifacts(config: &PipelineConfig, variants: &[ComposedVariant]) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for &platform in &config.platforms {
        let emitter = platform.emitter();
        match config.layout.mode {
            OutputMode::Aggregate => {
                let all: Vec<_> = variants.iter().map(|c| (&c.variant, &c.tokens)).collect();
                artifacts.push(Artifact {
                    path: config.layout.artifact_path(platform, None),
                    contents: render(emitter, &all)?,
                });
            }
            OutputMode::PerVariant => {
                for composed in variants {
                    let variant = &composed.variant;
                    artifacts.push(Artifact {
                        path: config.layout.artifact_path(platform, Some(variant)),
                        contents: render(emitter, &[(variant, &composed.tokens)])?,
                    });
                }
            }
        }
    }
    Ok(artifacts)
}

/// Write artifacts under `out_dir`, all or nothing.
///
/// Every changed file is first staged next to its destination; destinations
/// are only replaced once all staging writes have succeeded. Files whose
/// contents are already up to date are left untouched.
pub fn write_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    ensure_distinct_paths(artifacts.iter().map(|artifact| &artifact.path))?;
    fs::create_dir_all(out_dir).map_err(|e| TokenError::io(out_dir, e))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
    for artifact in artifacts {
        let dest = out_dir.join(&artifact.path);
        if fs::read_to_string(&dest).is_ok_and(|current| current == artifact.contents) {
            tracing::debug!("{} is up to date", dest.display());
            continue;
        }

        let tmp = staging_path(&dest);
        let written = dest
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(&tmp, &artifact.contents));
        if let Err(e) = written {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(TokenError::io(&tmp, e));
        }
        staged.push((tmp, dest));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (index, (tmp, dest)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, dest) {
            discard(&staged[index..]);
            return Err(TokenError::io(dest, e));
        }
        tracing::debug!("wrote {}", dest.display());
        written.push(dest.clone());
    }
    Ok(written)
}

/// Two artifacts sharing a file would stage onto the same temporary file.
fn ensure_distinct_paths<'a>(
    paths: impl Iterator<Item = &'a PathBuf>,
) -> std::result::Result<(), ConfigError> {
    let mut seen = FxHashSet::default();
    for path in paths {
        if !seen.insert(path) {
            return Err(ConfigError::DuplicateArtifactPath {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.tokenweave-tmp"))
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}
