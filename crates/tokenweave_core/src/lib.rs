//! Tokenweave Core
//!
//! Design token resolution and multi-variant theming.
//!
//! # Overview
//!
//! The pipeline turns one token source document into per-variant artifacts:
//!
//! - **Loader**: nested JSON/TOML/YAML groups into a flat [`TokenSet`]
//! - **Resolver**: alias chains into literals, with cycle detection
//! - **Composer**: brand and theme [`VariantLayer`]s over the base set
//! - **Contrast**: WCAG ratios for declared [`ContrastPair`]s
//! - **Emitters**: scoped CSS custom properties and a TypeScript module
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tokenweave_core::{load_str, run, write_artifacts, PipelineConfig, SourceFormat};
//!
//! let tokens = load_str(include_str!("tokens.json"), SourceFormat::Json)?;
//! let config = PipelineConfig::new(["acme"], ["light", "dark"])
//!     .with_layer(VariantLayer::theme("dark").with_override("color.bg", "#000000"))
//!     .with_contrast_pair(ContrastPair::new("color.fg", "color.bg"));
//!
//! let output = run(&tokens, &config)?;
//! write_artifacts(Path::new("dist"), &output.artifacts)?;
//! ```
//!
//! # Variants
//!
//! The emitted CSS scopes each variant under
//! `[data-brand="..."][data-theme="..."]`, so switching either attribute on a
//! root element restyles the page through the cascade alone.

pub mod contrast;
pub mod emit;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod resolver;
pub mod token;
pub mod variant;

// Re-export commonly used types
pub use contrast::{contrast_ratio, relative_luminance, ContrastPair, ContrastReport, ContrastViolation};
pub use emit::{emit, Artifact, OutputMode, Platform};
pub use error::{ConfigError, EmitError, Result, SchemaError, TokenError};
pub use loader::{load_path, load_str, Scalar, SourceFormat};
pub use pipeline::{run, write_artifacts, ContrastPolicy, PipelineConfig, PipelineOutput};
pub use resolver::resolve;
pub use token::{Literal, ResolvedTokenSet, Rgba, Token, TokenSet, TokenType, TokenValue};
pub use variant::{Variant, VariantComposer, VariantLayer};
