//! Tokenweave configuration file handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tokenweave_core::pipeline::OutputLayout;
use tokenweave_core::{
    ContrastPair, ContrastPolicy, OutputMode, PipelineConfig, Platform, VariantLayer,
};

/// File name looked up in a project directory
pub const CONFIG_FILE: &str = "tokenweave.toml";

/// Top-level Tokenweave configuration (tokenweave.toml)
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenweaveConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
    pub variants: VariantsConfig,
    #[serde(default)]
    pub contrast: ContrastConfig,
    #[serde(default)]
    pub layers: Vec<VariantLayer>,
}

/// Project metadata
#[derive(Debug, Deserialize, Serialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Build configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Token source document (relative to project root)
    #[serde(default = "default_source")]
    pub source: String,
    /// Output directory
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default)]
    pub mode: OutputMode,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<Platform>,
    /// Aggregate CSS file name
    #[serde(default = "default_css_file")]
    pub css_file: String,
    /// Aggregate module file name
    #[serde(default = "default_module_file")]
    pub module_file: String,
    /// Contrast report written next to the artifacts
    #[serde(default)]
    pub report_file: Option<String>,
}

fn default_source() -> String {
    "tokens.json".to_string()
}

fn default_output() -> String {
    "dist".to_string()
}

fn default_platforms() -> Vec<Platform> {
    vec![Platform::Css, Platform::TypeScript]
}

fn default_css_file() -> String {
    "tokens.css".to_string()
}

fn default_module_file() -> String {
    "tokens.ts".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            mode: OutputMode::default(),
            platforms: default_platforms(),
            css_file: default_css_file(),
            module_file: default_module_file(),
            report_file: None,
        }
    }
}

/// Declared variant axes; every brand is combined with every theme
#[derive(Debug, Deserialize, Serialize)]
pub struct VariantsConfig {
    pub brands: Vec<String>,
    pub themes: Vec<String>,
}

/// Contrast validation configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContrastConfig {
    #[serde(default)]
    pub policy: ContrastPolicy,
    #[serde(default)]
    pub pairs: Vec<ContrastPair>,
}

impl TokenweaveConfig {
    /// Load configuration from a directory (looks for tokenweave.toml)
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = if path.is_file() {
            path.to_path_buf()
        } else {
            path.join(CONFIG_FILE)
        };

        if !config_path.exists() {
            anyhow::bail!(
                "No {} found in {}. Run `tokenweave init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: TokenweaveConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Create a starter configuration with the given project name
    pub fn new(name: &str) -> Self {
        Self {
            project: ProjectConfig {
                name: name.to_string(),
                version: default_version(),
                description: None,
            },
            build: BuildConfig::default(),
            variants: VariantsConfig {
                brands: vec!["default".to_string()],
                themes: vec!["light".to_string(), "dark".to_string()],
            },
            contrast: ContrastConfig {
                policy: ContrastPolicy::Warn,
                pairs: vec![ContrastPair::new(
                    "color.text.primary",
                    "color.background.primary",
                )],
            },
            layers: vec![VariantLayer::theme("dark")
                .with_override("color.background.primary", "{color.gray.900}")
                .with_override("color.text.primary", "{color.gray.50}")],
        }
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn source_path(&self, root: &Path) -> PathBuf {
        root.join(&self.build.source)
    }

    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.build.output)
    }

    /// Build the immutable pipeline configuration. `strict` forces
    /// [`ContrastPolicy::Error`].
    pub fn pipeline_config(&self, strict: bool) -> PipelineConfig {
        let policy = if strict {
            ContrastPolicy::Error
        } else {
            self.contrast.policy
        };
        PipelineConfig {
            brands: self.variants.brands.clone(),
            themes: self.variants.themes.clone(),
            layers: self.layers.clone(),
            contrast_pairs: self.contrast.pairs.clone(),
            contrast_policy: policy,
            platforms: self.build.platforms.clone(),
            layout: OutputLayout {
                mode: self.build.mode,
                css_file: self.build.css_file.clone(),
                module_file: self.build.module_file.clone(),
                report_file: self.build.report_file.clone(),
            },
        }
    }
}
