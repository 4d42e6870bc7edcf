//! Naming rules shared by every emitter
//!
//! - CSS custom property: segments joined with `-`, prefixed with `--`
//!   (`color.background.primary` → `--color-background-primary`)
//! - Module key: lowerCamelCase over `.`, `-` and `_` boundaries
//!   (`color.gray-100` → `colorGray100`), `_`-prefixed if it would start
//!   with a digit

use rustc_hash::FxHashMap;

use crate::error::EmitError;
use crate::variant::Variant;

pub fn css_custom_property(id: &str) -> String {
    let mut name = String::with_capacity(id.len() + 2);
    name.push_str("--");
    for (i, segment) in id.split('.').enumerate() {
        if i > 0 {
            name.push('-');
        }
        name.push_str(segment);
    }
    name
}

pub fn module_key(id: &str) -> String {
    lower_camel(id.split(['.', '-', '_']))
}

/// Identifier of a variant's constant, e.g. `acmeDark`.
pub fn variant_identifier(variant: &Variant) -> String {
    lower_camel(
        variant
            .brand
            .split(['-', '_'])
            .chain(variant.theme.split(['-', '_'])),
    )
}

/// The first word is lowercased entirely; later words get an uppercase
/// initial and keep their interior case (`ACME`, `highContrast` →
/// `acmeHighContrast`).
fn lower_camel<'a>(words: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in words.filter(|w| !w.is_empty()) {
        if out.is_empty() {
            out.push_str(&word.to_lowercase());
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Fail if two ids map to the same output name under `rule`.
pub(crate) fn ensure_unique<'a>(
    target: &'static str,
    ids: impl Iterator<Item = &'a str>,
    rule: impl Fn(&str) -> String,
) -> Result<(), EmitError> {
    let mut seen: FxHashMap<String, &str> = FxHashMap::default();
    for id in ids {
        let name = rule(id);
        if let Some(first) = seen.get(&name) {
            return Err(EmitError::NameCollision {
                target,
                name,
                first: first.to_string(),
                second: id.to_string(),
            });
        }
        seen.insert(name, id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_names_join_segments_with_dashes() {
        assert_eq!(
            css_custom_property("color.background.primary"),
            "--color-background-primary"
        );
        assert_eq!(css_custom_property("space.2xl"), "--space-2xl");
    }

    #[test]
    fn module_keys_are_lower_camel() {
        assert_eq!(module_key("color.background.primary"), "colorBackgroundPrimary");
        assert_eq!(module_key("color.gray-100"), "colorGray100");
        assert_eq!(module_key("font.line_height"), "fontLineHeight");
        assert_eq!(module_key("space.2xl"), "space2xl");
        assert_eq!(module_key("2xl.gap"), "_2xlGap");
    }

    #[test]
    fn variant_identifiers() {
        assert_eq!(variant_identifier(&Variant::new("acme", "dark")), "acmeDark");
        assert_eq!(
            variant_identifier(&Variant::new("big-co", "high_contrast")),
            "bigCoHighContrast"
        );
        assert_eq!(variant_identifier(&Variant::new("ACME", "dark")), "acmeDark");
        assert_eq!(
            variant_identifier(&Variant::new("ACME", "highContrast")),
            "acmeHighContrast"
        );
        assert_eq!(module_key("UI.buttonBg"), "uiButtonBg");
    }

    #[test]
    fn collisions_name_both_ids() {
        let err = ensure_unique(
            "module",
            ["color.gray-100", "color.gray100"].into_iter(),
            module_key,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EmitError::NameCollision {
                target: "module",
                name: "colorGray100".to_string(),
                first: "color.gray-100".to_string(),
                second: "color.gray100".to_string(),
            }
        );
    }
}
