//! Variant composition
//!
//! A [`Variant`] is one `(brand, theme)` combination. Its token set is the
//! base resolved set with [`VariantLayer`] overrides applied in a fixed
//! order:
//!
//! 1. brand layers scoped to every theme (`brand = b`, no theme)
//! 2. brand layers scoped to this theme (`brand = b`, `theme = t`)
//! 3. theme layers scoped to every brand (no brand, `theme = t`)
//!
//! Layers in the same stage apply in declaration order. Override aliases
//! resolve against the set composed so far.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::error::{ConfigError, Result, TokenError};
use crate::loader::{classify, Scalar, SourceNode};
use crate::resolver::resolve_overrides;
use crate::token::{ResolvedTokenSet, TokenType, TokenValue};

/// One `(brand, theme)` combination
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Variant {
    pub brand: String,
    pub theme: String,
}

impl Variant {
    pub fn new(brand: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            theme: theme.into(),
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.brand, self.theme)
    }
}

/// A partial override map scoped to a brand, a theme, or both
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Token id to literal or `{alias}`
    #[serde(default)]
    pub overrides: IndexMap<String, Scalar>,
}

impl VariantLayer {
    /// Layer applied to every theme of `brand`.
    pub fn brand(brand: impl Into<String>) -> Self {
        Self {
            brand: Some(brand.into()),
            ..Self::default()
        }
    }

    /// Layer applied to `theme` under every brand.
    pub fn theme(theme: impl Into<String>) -> Self {
        Self {
            theme: Some(theme.into()),
            ..Self::default()
        }
    }

    /// Layer applied only to one `(brand, theme)` combination.
    pub fn exact(brand: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            brand: Some(brand.into()),
            theme: Some(theme.into()),
            ..Self::default()
        }
    }

    pub fn with_override(mut self, id: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.overrides.insert(id.into(), value.into());
        self
    }

    /// Human-readable selector, e.g. `[brand=acme theme=*]`.
    pub fn selector(&self) -> String {
        format!(
            "[brand={} theme={}]",
            self.brand.as_deref().unwrap_or("*"),
            self.theme.as_deref().unwrap_or("*")
        )
    }

    fn stage_for(&self, variant: &Variant) -> Option<Stage> {
        let brand = self.brand.as_deref();
        let theme = self.theme.as_deref();
        match (brand, theme) {
            (Some(b), None) if b == variant.brand => Some(Stage::Brand),
            (Some(b), Some(t)) if b == variant.brand && t == variant.theme => {
                Some(Stage::BrandTheme)
            }
            (None, Some(t)) if t == variant.theme => Some(Stage::Theme),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
enum Stage {
    Brand,
    BrandTheme,
    Theme,
}

/// A layer whose keys are validated and whose values are classified
#[derive(Debug)]
struct PreparedLayer<'a> {
    source: &'a VariantLayer,
    overrides: Vec<(String, TokenValue, TokenType)>,
}

/// Composes per-variant token sets from a base set and its layers
///
/// All layers are validated when the composer is built, so composition never
/// starts for a configuration that would fail part-way.
#[derive(Debug)]
pub struct VariantComposer<'a> {
    base: &'a ResolvedTokenSet,
    layers: Vec<PreparedLayer<'a>>,
}

impl<'a> VariantComposer<'a> {
    pub fn new(base: &'a ResolvedTokenSet, layers: &'a [VariantLayer]) -> Result<Self> {
        let mut prepared = Vec::with_capacity(layers.len());
        for (index, layer) in layers.iter().enumerate() {
            if layer.brand.is_none() && layer.theme.is_none() {
                return Err(ConfigError::LayerWithoutSelector { index }.into());
            }

            let mut overrides = Vec::with_capacity(layer.overrides.len());
            for (id, raw) in &layer.overrides {
                let Some(token) = base.get(id) else {
                    return Err(TokenError::UnknownVariantOverrideKey {
                        layer: layer.selector(),
                        id: id.clone(),
                    });
                };
                let ty = token.token_type();
                let (value, _) = classify(id, &SourceNode::Scalar(raw.clone()), Some(ty))?;
                overrides.push((id.clone(), value, ty));
            }

            prepared.push(PreparedLayer {
                source: layer,
                overrides,
            });
        }

        Ok(Self {
            base,
            layers: prepared,
        })
    }

    /// Compose the token set of one variant.
    ///
    /// Starts from a private copy of the base set; the base is never touched.
    /// The result keeps the base's declaration order.
    pub fn compose(&self, variant: &Variant) -> Result<ResolvedTokenSet> {
        let mut staged: Vec<(Stage, &PreparedLayer<'a>)> = self
            .layers
            .iter()
            .filter_map(|layer| layer.source.stage_for(variant).map(|stage| (stage, layer)))
            .collect();
        // Stable: layers within one stage keep declaration order.
        staged.sort_by_key(|(stage, _)| *stage);

        let mut composed = self.base.clone();
        for (stage, layer) in staged {
            let updates = resolve_overrides(&layer.overrides, &composed)?;
            tracing::debug!(
                "{}: applying {:?} layer {} ({} overrides)",
                variant,
                stage,
                layer.source.selector(),
                updates.len()
            );
            for (id, value) in updates {
                composed.set_value(&id, value);
            }
        }
        Ok(composed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::token::{Literal, Rgba, Token, TokenSet};

    fn base() -> ResolvedTokenSet {
        let mut set = TokenSet::new();
        for (id, hex) in [
            ("x", 0xAAAAAA),
            ("color.brand", 0x0000FF),
            ("color.link", 0x000000),
        ] {
            set.insert(Token::literal(id, Literal::Color(Rgba::from_hex(hex))))
                .unwrap();
        }
        set.insert(Token::literal("space.md", Literal::Number(16.0)))
            .unwrap();
        resolve(&set).unwrap()
    }

    fn color(hex: u32) -> Literal {
        Literal::Color(Rgba::from_hex(hex))
    }

    #[test]
    fn theme_layer_wins_over_brand_layer() {
        let base = base();
        let layers = vec![
            VariantLayer::theme("dark").with_override("x", "#cccccc"),
            VariantLayer::brand("acme").with_override("x", "#bbbbbb"),
        ];
        let composer = VariantComposer::new(&base, &layers).unwrap();

        let dark = composer.compose(&Variant::new("acme", "dark")).unwrap();
        assert_eq!(dark.value("x"), Some(&color(0xCCCCCC)));

        let light = composer.compose(&Variant::new("acme", "light")).unwrap();
        assert_eq!(light.value("x"), Some(&color(0xBBBBBB)));

        let other = composer.compose(&Variant::new("globex", "light")).unwrap();
        assert_eq!(other.value("x"), Some(&color(0xAAAAAA)));
    }

    #[test]
    fn exact_layer_applies_between_brand_and_theme_layers() {
        let base = base();
        let layers = vec![
            VariantLayer::theme("dark").with_override("color.link", "#111111"),
            VariantLayer::exact("acme", "dark")
                .with_override("color.link", "#222222")
                .with_override("x", "#222222"),
            VariantLayer::brand("acme").with_override("x", "#333333"),
        ];
        let composer = VariantComposer::new(&base, &layers).unwrap();
        let composed = composer.compose(&Variant::new("acme", "dark")).unwrap();
        assert_eq!(composed.value("x"), Some(&color(0x222222)));
        assert_eq!(composed.value("color.link"), Some(&color(0x111111)));
    }

    #[test]
    fn theme_override_alias_sees_brand_override() {
        let base = base();
        let layers = vec![
            VariantLayer::brand("acme").with_override("color.brand", "#ff0000"),
            VariantLayer::theme("dark").with_override("color.link", "{color.brand}"),
        ];
        let composer = VariantComposer::new(&base, &layers).unwrap();
        let composed = composer.compose(&Variant::new("acme", "dark")).unwrap();
        assert_eq!(composed.value("color.link"), Some(&color(0xFF0000)));

        let globex = composer.compose(&Variant::new("globex", "dark")).unwrap();
        assert_eq!(globex.value("color.link"), Some(&color(0x0000FF)));
    }

    #[test]
    fn composition_never_touches_the_base() {
        let base = base();
        let snapshot = base.clone();
        let layers = vec![VariantLayer::brand("acme").with_override("x", "#000000")];
        let composer = VariantComposer::new(&base, &layers).unwrap();
        composer.compose(&Variant::new("acme", "light")).unwrap();
        assert_eq!(base, snapshot);
    }

    #[test]
    fn output_keeps_base_order() {
        let base = base();
        let layers = vec![VariantLayer::brand("acme")
            .with_override("space.md", 20.0)
            .with_override("x", "#000000")];
        let composer = VariantComposer::new(&base, &layers).unwrap();
        let composed = composer.compose(&Variant::new("acme", "light")).unwrap();
        let ids: Vec<&str> = composed.ids().collect();
        assert_eq!(ids, ["x", "color.brand", "color.link", "space.md"]);
        assert_eq!(composed.value("space.md"), Some(&Literal::Number(20.0)));
    }

    #[test]
    fn unknown_override_key_is_rejected_up_front() {
        let base = base();
        let layers = vec![
            VariantLayer::brand("acme").with_override("x", "#000000"),
            VariantLayer::theme("dark").with_override("color.missing", "#000000"),
        ];
        match VariantComposer::new(&base, &layers).unwrap_err() {
            TokenError::UnknownVariantOverrideKey { layer, id } => {
                assert_eq!(layer, "[brand=* theme=dark]");
                assert_eq!(id, "color.missing");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn override_cycles_and_missing_targets_fail() {
        let base = base();
        let layers = vec![VariantLayer::brand("acme")
            .with_override("x", "{color.link}")
            .with_override("color.link", "{x}")];
        let composer = VariantComposer::new(&base, &layers).unwrap();
        let err = composer.compose(&Variant::new("acme", "light")).unwrap_err();
        assert!(
            matches!(&err, TokenError::Cycle { path } if path == &["x", "color.link", "x"]),
            "{err:?}"
        );

        let layers = vec![VariantLayer::brand("acme").with_override("x", "{color.nope}")];
        let composer = VariantComposer::new(&base, &layers).unwrap();
        let err = composer.compose(&Variant::new("acme", "light")).unwrap_err();
        assert!(matches!(err, TokenError::UnresolvedReference { .. }), "{err:?}");
    }

    #[test]
    fn override_literal_must_match_base_type() {
        let base = base();
        let layers = vec![VariantLayer::brand("acme").with_override("x", "16px")];
        let err = VariantComposer::new(&base, &layers).unwrap_err();
        assert!(matches!(err, TokenError::Schema(_)), "{err:?}");

        let layers = vec![VariantLayer::brand("acme").with_override("x", "{space.md}")];
        let composer = VariantComposer::new(&base, &layers).unwrap();
        let err = composer.compose(&Variant::new("acme", "light")).unwrap_err();
        assert!(matches!(err, TokenError::TypeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn layer_needs_a_selector() {
        let base = base();
        let layers = vec![VariantLayer::default().with_override("x", "#000000")];
        let err = VariantComposer::new(&base, &layers).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Config(ConfigError::LayerWithoutSelector { index: 0 })
        ));
    }
}
