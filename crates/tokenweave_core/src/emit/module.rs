//! TypeScript constant-module emitter

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::naming::{ensure_unique, module_key, variant_identifier};
use super::{comment_text, Emitter, GENERATED_NOTICE};
use crate::error::EmitError;
use crate::token::{format_number, Literal, ResolvedTokenSet};
use crate::variant::Variant;

/// Emits one `export const <brandTheme> = { ... } as const;` per variant and
/// a `tokens` index keyed by brand, then theme
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeScriptEmitter;

impl Emitter for TypeScriptEmitter {
    fn target(&self) -> &'static str {
        "module"
    }

    fn check_names(&self, set: &ResolvedTokenSet) -> Result<(), EmitError> {
        ensure_unique(self.target(), set.ids(), module_key)
    }

    fn header(&self) -> String {
        format!("// {GENERATED_NOTICE}\n")
    }

    fn variant_block(&self, variant: &Variant, set: &ResolvedTokenSet) -> String {
        let mut out = format!("export const {} = {{\n", variant_identifier(variant));
        for token in set.iter() {
            if let Some(description) = &token.description {
                out.push_str(&format!("  /** {} */\n", comment_text(description)));
            }
            out.push_str(&format!(
                "  {}: {},\n",
                module_key(&token.id),
                ts_value(&token.value)
            ));
        }
        out.push_str("} as const;\n");
        out
    }

    fn footer(&self, variants: &[Variant]) -> Result<String, EmitError> {
        let Some(first) = variants.first() else {
            return Ok(String::new());
        };

        let mut idents: FxHashMap<String, &Variant> = FxHashMap::default();
        let mut by_brand: IndexMap<&str, Vec<(&str, String)>> = IndexMap::new();
        for variant in variants {
            let ident = variant_identifier(variant);
            if let Some(previous) = idents.get(&ident) {
                return Err(EmitError::NameCollision {
                    target: "module",
                    name: ident,
                    first: previous.to_string(),
                    second: variant.to_string(),
                });
            }
            idents.insert(ident.clone(), variant);
            by_brand
                .entry(variant.brand.as_str())
                .or_default()
                .push((variant.theme.as_str(), ident));
        }

        let mut out = String::from("\nexport const tokens = {\n");
        for (brand, themes) in &by_brand {
            out.push_str(&format!("  {}: {{\n", ts_string(brand)));
            for (theme, ident) in themes {
                out.push_str(&format!("    {}: {},\n", ts_string(theme), ident));
            }
            out.push_str("  },\n");
        }
        out.push_str("} as const;\n");
        out.push_str(&format!(
            "\nexport type TokenName = keyof typeof {};\n",
            variant_identifier(first)
        ));
        Ok(out)
    }
}

fn ts_value(value: &Literal) -> String {
    match value {
        Literal::Number(number) => format_number(*number),
        other => ts_string(&other.to_string()),
    }
}

/// Double-quoted string literal; JSON escaping is valid TypeScript.
fn ts_string(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}
