//! CSS custom-property emitter

use super::naming::{css_custom_property, ensure_unique};
use super::{Emitter, GENERATED_NOTICE};
use crate::error::EmitError;
use crate::token::{Literal, ResolvedTokenSet};
use crate::variant::Variant;

/// Emits one `[data-brand][data-theme]` rule block per variant
#[derive(Clone, Copy, Debug, Default)]
pub struct CssEmitter;

impl Emitter for CssEmitter {
    fn target(&self) -> &'static str {
        "CSS"
    }

    fn check_names(&self, set: &ResolvedTokenSet) -> Result<(), EmitError> {
        ensure_unique(self.target(), set.ids(), css_custom_property)
    }

    fn header(&self) -> String {
        format!("/* {GENERATED_NOTICE} */\n")
    }

    fn variant_block(&self, variant: &Variant, set: &ResolvedTokenSet) -> String {
        let mut out = format!(
            "[data-brand=\"{}\"][data-theme=\"{}\"] {{\n",
            variant.brand, variant.theme
        );
        for token in set.iter() {
            out.push_str("  ");
            out.push_str(&css_custom_property(&token.id));
            out.push_str(": ");
            out.push_str(&css_value(&token.value));
            out.push_str(";\n");
        }
        out.push_str("}\n");
        out
    }
}

fn css_value(value: &Literal) -> String {
    match value {
        Literal::String(text) => css_string(text),
        other => other.to_string(),
    }
}

/// Strings go out verbatim (so font stacks stay usable) unless they would
/// break the declaration, in which case they are quoted.
fn css_string(text: &str) -> String {
    if !text.contains([';', '{', '}', '\n', '"', '\\']) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\A "),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
