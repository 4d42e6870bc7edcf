//! Platform emitters
//!
//! Every emitter renders a document as a header, one block per variant, and
//! an optional footer. Rendering is a pure function of the resolved sets, so
//! unchanged input produces byte-identical output.

mod css;
mod module;
pub mod naming;

pub use css::CssEmitter;
pub use module::TypeScriptEmitter;

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use crate::error::EmitError;
use crate::token::ResolvedTokenSet;
use crate::variant::Variant;

/// Header written at the top of every artifact.
pub const GENERATED_NOTICE: &str = "Generated by tokenweave. Do not edit.";

/// Built-in artifact targets
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Scoped CSS custom-property blocks
    Css,
    /// TypeScript constant module
    TypeScript,
}

impl Platform {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::TypeScript => "ts",
        }
    }

    pub fn emitter(self) -> &'static dyn Emitter {
        match self {
            Self::Css => &CssEmitter,
            Self::TypeScript => &TypeScriptEmitter,
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Css => "css",
            Self::TypeScript => "typescript",
        })
    }
}

/// How variants are split across files
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One file per platform holding every variant
    #[default]
    Aggregate,
    /// One file per platform and variant, named `<brand>.<theme>.<ext>`
    PerVariant,
}

/// A rendered output file, relative to the output directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

/// A serializer for resolved token sets
pub trait Emitter: Sync {
    /// Target name used in collision errors
    fn target(&self) -> &'static str;

    /// Fail if two ids would produce the same name in this target.
    fn check_names(&self, set: &ResolvedTokenSet) -> Result<(), EmitError>;

    fn header(&self) -> String;

    /// Render one variant's tokens.
    fn variant_block(&self, variant: &Variant, set: &ResolvedTokenSet) -> String;

    /// Trailer after all variant blocks.
    fn footer(&self, _variants: &[Variant]) -> Result<String, EmitError> {
        Ok(String::new())
    }
}

/// Render a document holding the given variants, in order.
pub fn render(
    emitter: &dyn Emitter,
    variants: &[(&Variant, &ResolvedTokenSet)],
) -> Result<String, EmitError> {
    let mut out = emitter.header();
    let mut order = Vec::with_capacity(variants.len());
    for (variant, set) in variants {
        emitter.check_names(set)?;
        out.push('\n');
        out.push_str(&emitter.variant_block(variant, set));
        order.push((*variant).clone());
    }
    out.push_str(&emitter.footer(&order)?);
    Ok(out)
}

/// Render a single variant as a standalone document.
pub fn emit(
    platform: Platform,
    variant: &Variant,
    set: &ResolvedTokenSet,
) -> Result<String, EmitError> {
    render(platform.emitter(), &[(variant, set)])
}

/// Escape the end-of-comment marker so text can sit inside `/* */`.
fn comment_text(text: &str) -> String {
    text.replace("*/", "* /").replace('\n', " ")
}
