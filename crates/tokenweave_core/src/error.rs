//! Pipeline error types

use std::path::PathBuf;
use thiserror::Error;

use crate::contrast::ContrastViolation;
use crate::token::TokenType;

/// Malformed token source document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The document could not be parsed in its declared format
    #[error("failed to parse {format} token source: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// The document root is not a group, or holds no tokens
    #[error("token source must be a non-empty group of tokens")]
    EmptyDocument,

    /// A group key is not a valid id segment
    #[error("invalid key `{key}` under `{parent}` (allowed: [A-Za-z0-9_-] segments joined by `.`)")]
    InvalidKey { parent: String, key: String },

    /// Two paths collapse to the same dotted id
    #[error("duplicate token id `{id}`")]
    DuplicateId { id: String },

    /// A leaf has no explicit type and its literal shape is not recognized
    #[error("cannot infer the type of `{id}` from {found}; add an explicit `type`")]
    UnrecognizedShape { id: String, found: String },

    /// A literal does not parse as the type it must have
    #[error("`{id}` expects a {expected} literal, found {found}")]
    InvalidLiteral {
        id: String,
        expected: TokenType,
        found: String,
    },

    /// An explicit `type` names no known token type
    #[error("`{id}` declares unknown type `{name}`")]
    UnknownType { id: String, name: String },

    /// A leaf or group carries a field outside the schema
    #[error("`{id}` has unknown field `{field}`")]
    UnknownField { id: String, field: String },

    /// A leaf spells the same field twice, e.g. `type` and `$type`
    #[error("`{id}` sets `{field}` more than once")]
    DuplicateField { id: String, field: String },

    /// A leaf metadata field has the wrong shape
    #[error("`{id}` field `{field}` must be a string")]
    InvalidField { id: String, field: String },

    /// An alias marker whose inner reference is not a valid id
    #[error("`{id}` has malformed alias `{reference}`")]
    InvalidAlias { id: String, reference: String },
}

/// Inconsistent pipeline configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No `(brand, theme)` combinations were declared
    #[error("no variants declared; configure at least one brand and one theme")]
    NoVariants,

    /// A brand or theme name cannot be used in selectors and identifiers
    #[error("invalid {axis} name `{name}` (allowed: [A-Za-z0-9_-]+)")]
    InvalidVariantName { axis: &'static str, name: String },

    /// The same brand or theme was declared twice
    #[error("{axis} `{name}` is declared more than once")]
    DuplicateVariant { axis: &'static str, name: String },

    /// A layer scoped to neither a brand nor a theme
    #[error("variant layer #{index} must name a brand, a theme, or both")]
    LayerWithoutSelector { index: usize },

    /// A layer scoped to a brand or theme that is not declared
    #[error("variant layer {layer} names undeclared {axis} `{name}`")]
    UndeclaredVariant {
        layer: String,
        axis: &'static str,
        name: String,
    },

    /// A contrast threshold that no ratio can be meaningfully compared to
    #[error("contrast pair {pair} has invalid threshold {threshold}; expected a positive number")]
    InvalidThreshold { pair: String, threshold: f64 },

    /// Two artifacts would be written to the same file
    #[error("more than one artifact would be written to `{path}`")]
    DuplicateArtifactPath { path: String },

    /// A contrast pair names a token that does not exist
    #[error("contrast pair {pair} references unknown token `{id}`")]
    UnknownContrastToken { pair: String, id: String },

    /// A contrast pair names a token that is not a color
    #[error("contrast pair {pair} references `{id}`, which is a {found}, not a color")]
    NotAColor {
        pair: String,
        id: String,
        found: TokenType,
    },
}

/// Artifact rendering failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    /// Two ids map to the same output name
    #[error("{target} name `{name}` is produced by both `{first}` and `{second}`")]
    NameCollision {
        target: &'static str,
        name: String,
        first: String,
        second: String,
    },
}

/// Any fatal pipeline failure
#[derive(Error, Debug)]
pub enum TokenError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Alias chain loops back on itself; `path` ends with the repeated id
    #[error("reference cycle: {}", .path.join(" → "))]
    Cycle { path: Vec<String> },

    /// Alias to an id that does not exist; `path` ends with the missing id
    #[error("unresolved reference `{missing}` ({})", .path.join(" → "))]
    UnresolvedReference { path: Vec<String>, missing: String },

    /// Alias resolves to a literal of a different type than declared
    #[error("type mismatch at {}: expected {expected}, found {found}", .path.join(" → "))]
    TypeMismatch {
        path: Vec<String>,
        expected: TokenType,
        found: TokenType,
    },

    /// A variant layer overrides a token the base set does not define
    #[error("variant layer {layer} overrides unknown token `{id}`")]
    UnknownVariantOverrideKey { layer: String, id: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Contrast findings elevated to errors by policy
    #[error("{} contrast violation(s): {}", .violations.len(), summarize(.violations))]
    ContrastViolations { violations: Vec<ContrastViolation> },

    /// The contrast report could not be serialized
    #[error("failed to serialize contrast report: {0}")]
    Report(#[from] serde_json::Error),

    /// Reading a source or writing an artifact failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn summarize(violations: &[ContrastViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TokenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, TokenError>;
