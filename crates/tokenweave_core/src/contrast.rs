//! WCAG contrast validation
//!
//! Computes relative luminance and contrast ratios for declared
//! foreground/background pairs. The validator only reports; whether a
//! violation fails the build is decided by the pipeline's
//! [`ContrastPolicy`](crate::pipeline::ContrastPolicy).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::error::{ConfigError, Result};
use crate::token::{ResolvedTokenSet, Rgba};
use crate::variant::Variant;

/// Minimum ratio for normal text (WCAG AA)
pub const WCAG_AA_NORMAL: f64 = 4.5;

/// Minimum ratio for large text (WCAG AA)
pub const WCAG_AA_LARGE: f64 = 3.0;

/// Convert an 8-bit sRGB channel to linear light.
pub fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance. Alpha is ignored.
pub fn relative_luminance(color: Rgba) -> f64 {
    let r = srgb_to_linear(color.r);
    let g = srgb_to_linear(color.g);
    let b = srgb_to_linear(color.b);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// WCAG contrast ratio in `[1, 21]`, independent of argument order.
pub fn contrast_ratio(a: Rgba, b: Rgba) -> f64 {
    let lum_a = relative_luminance(a);
    let lum_b = relative_luminance(b);
    let lighter = lum_a.max(lum_b);
    let darker = lum_a.min(lum_b);
    (lighter + 0.05) / (darker + 0.05)
}

/// A foreground/background pair that must meet a minimum contrast ratio
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContrastPair {
    pub foreground: String,
    pub background: String,
    /// Explicit minimum ratio; overrides `large_text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Use the large-text minimum (3.0) when no threshold is given
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub large_text: bool,
}

impl ContrastPair {
    pub fn new(foreground: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            foreground: foreground.into(),
            background: background.into(),
            threshold: None,
            large_text: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn large_text(mut self) -> Self {
        self.large_text = true;
        self
    }

    /// The ratio this pair must reach.
    pub fn min_ratio(&self) -> f64 {
        match self.threshold {
            Some(threshold) => threshold,
            None if self.large_text => WCAG_AA_LARGE,
            None => WCAG_AA_NORMAL,
        }
    }
}

impl Display for ContrastPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` on `{}`", self.foreground, self.background)
    }
}

/// One measured pair in one token set
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContrastCheck {
    pub pair: ContrastPair,
    /// `None` for the base set
    pub variant: Option<Variant>,
    pub foreground: String,
    pub background: String,
    pub ratio: f64,
    pub threshold: f64,
    pub passed: bool,
}

/// A pair whose ratio is below its threshold
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContrastViolation {
    pub pair: ContrastPair,
    pub variant: Option<Variant>,
    pub ratio: f64,
    pub threshold: f64,
}

impl Display for ContrastViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let scope = match &self.variant {
            Some(variant) => variant.to_string(),
            None => "base".to_string(),
        };
        write!(
            f,
            "{} in {}: {:.2} < {}",
            self.pair, scope, self.ratio, self.threshold
        )
    }
}

/// All contrast measurements of a pipeline run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContrastReport {
    pub checks: Vec<ContrastCheck>,
}

impl ContrastReport {
    pub fn violations(&self) -> Vec<ContrastViolation> {
        self.checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| ContrastViolation {
                pair: check.pair.clone(),
                variant: check.variant.clone(),
                ratio: check.ratio,
                threshold: check.threshold,
            })
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    pub fn extend(&mut self, checks: Vec<ContrastCheck>) {
        self.checks.extend(checks);
    }

    /// Pretty-printed JSON for build tooling.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Check that every pair has a usable threshold and names two color tokens
/// in `set`.
pub fn validate_pairs(pairs: &[ContrastPair], set: &ResolvedTokenSet) -> Result<()> {
    for pair in pairs {
        if let Some(threshold) = pair.threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ConfigError::InvalidThreshold {
                    pair: pair.to_string(),
                    threshold,
                }
                .into());
            }
        }
        pair_colors(pair, set)?;
    }
    Ok(())
}

fn pair_colors(pair: &ContrastPair, set: &ResolvedTokenSet) -> Result<(Rgba, Rgba)> {
    let color = |id: &str| -> Result<Rgba> {
        let token = set.get(id).ok_or_else(|| ConfigError::UnknownContrastToken {
            pair: pair.to_string(),
            id: id.to_string(),
        })?;
        let color = token.value.as_color().ok_or_else(|| ConfigError::NotAColor {
            pair: pair.to_string(),
            id: id.to_string(),
            found: token.token_type(),
        })?;
        if !color.is_opaque() {
            tracing::warn!(
                "`{}` is translucent ({}); contrast ignores alpha",
                id,
                color
            );
        }
        Ok(color)
    };
    Ok((color(&pair.foreground)?, color(&pair.background)?))
}

/// Measure every pair in one token set.
pub fn check_set(
    pairs: &[ContrastPair],
    variant: Option<&Variant>,
    set: &ResolvedTokenSet,
) -> Result<Vec<ContrastCheck>> {
    let mut checks = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (fg, bg) = pair_colors(pair, set)?;
        let ratio = contrast_ratio(fg, bg);
        let threshold = pair.min_ratio();
        checks.push(ContrastCheck {
            pair: pair.clone(),
            variant: variant.cloned(),
            foreground: fg.to_hex(),
            background: bg.to_hex(),
            ratio,
            threshold,
            passed: ratio >= threshold,
        });
    }
    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Literal, Token, TokenSet};

    fn hex(src: &str) -> Rgba {
        Rgba::parse_hex(src).unwrap()
    }

    fn resolved(tokens: &[(&str, &str)]) -> ResolvedTokenSet {
        let mut set = TokenSet::new();
        for (id, value) in tokens {
            let literal = match Rgba::parse_hex(value) {
                Some(color) => Literal::Color(color),
                None => Literal::String(value.to_string()),
            };
            set.insert(Token::literal(*id, literal)).unwrap();
        }
        crate::resolver::resolve(&set).unwrap()
    }

    #[test]
    fn black_on_white_is_21() {
        let ratio = contrast_ratio(hex("#000000"), hex("#FFFFFF"));
        assert!((ratio - 21.0).abs() < 1e-3, "{ratio}");
    }

    #[test]
    fn same_color_is_1_and_ratio_is_symmetric() {
        for src in ["#000000", "#767676", "#1e66f5", "#ffffff", "#0a0b0c"] {
            let c = hex(src);
            assert!((contrast_ratio(c, c) - 1.0).abs() < 1e-12, "{src}");
        }
        let a = hex("#1e66f5");
        let b = hex("#eff1f5");
        assert_eq!(contrast_ratio(a, b), contrast_ratio(b, a));
    }

    #[test]
    fn linearization_uses_the_0_04045_knee() {
        // 10/255 = 0.0392 sits below the knee, 11/255 = 0.0431 above it.
        assert!((srgb_to_linear(10) - (10.0 / 255.0) / 12.92).abs() < 1e-15);
        let above = ((11.0 / 255.0 + 0.055) / 1.055f64).powf(2.4);
        assert!((srgb_to_linear(11) - above).abs() < 1e-15);
        assert!((relative_luminance(Rgba::WHITE) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gray_767676_on_white_passes_and_efefef_fails() {
        let pair = ContrastPair::new("color.fg", "color.bg").with_threshold(4.5);

        let light = resolved(&[("color.bg", "#FFFFFF"), ("color.fg", "#767676")]);
        let checks = check_set(std::slice::from_ref(&pair), None, &light).unwrap();
        assert!((checks[0].ratio - 4.54).abs() < 0.01, "{}", checks[0].ratio);
        assert!(checks[0].passed);

        let dimmer = resolved(&[("color.bg", "#EFEFEF"), ("color.fg", "#767676")]);
        let lower = check_set(std::slice::from_ref(&pair), None, &dimmer).unwrap();
        assert!(lower[0].ratio < checks[0].ratio);
        assert!(!lower[0].passed);

        let report = ContrastReport { checks: lower };
        let violations = report.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].threshold, 4.5);
        assert!(!report.is_clean());
    }

    #[test]
    fn large_text_uses_lower_threshold() {
        assert_eq!(ContrastPair::new("a", "b").min_ratio(), WCAG_AA_NORMAL);
        assert_eq!(ContrastPair::new("a", "b").large_text().min_ratio(), WCAG_AA_LARGE);
        assert_eq!(
            ContrastPair::new("a", "b").large_text().with_threshold(7.0).min_ratio(),
            7.0
        );
    }

    #[test]
    fn thresholds_must_be_positive_numbers() {
        let set = resolved(&[("color.bg", "#FFFFFF"), ("color.fg", "#000000")]);
        for threshold in [f64::NAN, f64::INFINITY, 0.0, -4.5] {
            let pair = ContrastPair::new("color.fg", "color.bg").with_threshold(threshold);
            let err = validate_pairs(&[pair], &set).unwrap_err();
            assert!(err.to_string().contains("invalid threshold"), "{err}");
        }
        let pair = ContrastPair::new("color.fg", "color.bg").with_threshold(7.0);
        assert!(validate_pairs(&[pair], &set).is_ok());
    }

    #[test]
    fn report_serializes_every_check() {
        let set = resolved(&[("color.bg", "#FFFFFF"), ("color.fg", "#767676")]);
        let pairs = [ContrastPair::new("color.fg", "color.bg")];
        let report = ContrastReport {
            checks: check_set(&pairs, None, &set).unwrap(),
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["checks"][0]["foreground"], "#767676");
        assert_eq!(json["checks"][0]["passed"], true);
        assert_eq!(json["checks"][0]["variant"], serde_json::Value::Null);
    }

    #[test]
    fn pairs_must_name_color_tokens() {
        let set = resolved(&[("color.bg", "#FFFFFF"), ("font.body", "Inter")]);

        let err = validate_pairs(&[ContrastPair::new("color.missing", "color.bg")], &set)
            .unwrap_err();
        assert!(err.to_string().contains("unknown token `color.missing`"), "{err}");

        let err =
            validate_pairs(&[ContrastPair::new("font.body", "color.bg")], &set).unwrap_err();
        assert!(err.to_string().contains("is a string, not a color"), "{err}");
    }
}
