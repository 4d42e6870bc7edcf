//! Token graph loader
//!
//! Turns a nested source document into a flat [`TokenSet`] keyed by dotted id.
//!
//! Documents are read through serde into [`SourceNode`], an order-preserving
//! tree that rejects duplicate keys, so JSON, TOML and YAML sources share one
//! schema:
//!
//! ```json
//! {
//!   "color": {
//!     "$category": "palette",
//!     "white": "#ffffff",
//!     "text": { "value": "{color.gray.700}", "type": "color" },
//!     "gray": { "700": "#374151" }
//!   },
//!   "font": {
//!     "body": { "value": "Inter, sans-serif", "type": "string" }
//!   }
//! }
//! ```
//!
//! A node is a leaf when it is a scalar, or a map holding `value` (`$value`).
//! Types are inferred from the literal shape unless `type` is given:
//! `#hex` is a color, a number with a unit is a dimension, a bare number is a
//! number. Everything else needs an explicit `type`.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use rustc_hash::FxHashSet;

use crate::error::{Result, SchemaError, TokenError};
use crate::token::{
    alias_target, is_valid_id, Dimension, Literal, Rgba, Token, TokenSet, TokenType, TokenValue,
};

/// A scalar source value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    fn describe(&self) -> String {
        match self {
            Self::Bool(b) => format!("boolean {b}"),
            Self::Number(n) => format!("number {n}"),
            Self::String(s) => format!("string {s:?}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Order-preserving document tree
#[derive(Clone, Debug, PartialEq)]
pub enum SourceNode {
    Scalar(Scalar),
    Null,
    List(Vec<SourceNode>),
    Map(Vec<(String, SourceNode)>),
}

impl SourceNode {
    fn describe(&self) -> String {
        match self {
            Self::Scalar(scalar) => scalar.describe(),
            Self::Null => "null".to_string(),
            Self::List(_) => "a list".to_string(),
            Self::Map(_) => "a map".to_string(),
        }
    }

    fn field(&self, name: &str) -> Option<&SourceNode> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    fn is_leaf(&self) -> bool {
        match self {
            Self::Map(_) => self.field("value").is_some() || self.field("$value").is_some(),
            _ => true,
        }
    }
}

impl<'de> Deserialize<'de> for SourceNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = SourceNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a token group or a token value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Scalar(Scalar::Number(v as f64)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Scalar(Scalar::Number(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Scalar(Scalar::Number(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Scalar(Scalar::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Scalar(Scalar::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<SourceNode, E> {
        Ok(SourceNode::Null)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<SourceNode, D::Error> {
        SourceNode::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<SourceNode, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(SourceNode::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<SourceNode, A::Error> {
        let mut seen = FxHashSet::default();
        let mut entries = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate key `{key}`")));
            }
            let value = map.next_value()?;
            entries.push((key, value));
        }
        Ok(SourceNode::Map(entries))
    }
}

/// Serialization format of a token source document
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceFormat {
    Json,
    Toml,
    Yaml,
}

impl SourceFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
        }
    }

    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Parse a document into a [`SourceNode`] tree.
    pub fn parse(self, src: &str) -> std::result::Result<SourceNode, SchemaError> {
        let parsed = match self {
            Self::Json => serde_json::from_str(src).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(src).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(src).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| SchemaError::Parse {
            format: self.name(),
            message,
        })
    }
}

/// Load a token set from a source string.
pub fn load_str(src: &str, format: SourceFormat) -> std::result::Result<TokenSet, SchemaError> {
    let root = format.parse(src)?;
    load_document(&root)
}

/// Load a token set from a file, choosing the format by extension.
pub fn load_path(path: &Path) -> Result<TokenSet> {
    let format = SourceFormat::from_path(path).ok_or_else(|| SchemaError::Parse {
        format: "unknown",
        message: format!(
            "cannot tell the format of {} (expected .json, .toml, .yaml or .yml)",
            path.display()
        ),
    })?;
    let src = fs::read_to_string(path).map_err(|e| TokenError::io(path, e))?;
    let set = load_str(&src, format)?;
    tracing::debug!("loaded {} tokens from {}", set.len(), path.display());
    Ok(set)
}

/// Flatten a parsed document into a token set.
pub fn load_document(root: &SourceNode) -> std::result::Result<TokenSet, SchemaError> {
    let SourceNode::Map(entries) = root else {
        return Err(SchemaError::EmptyDocument);
    };
    if root.is_leaf() {
        return Err(SchemaError::EmptyDocument);
    }

    let mut set = TokenSet::new();
    walk_group("", entries, None, &mut set)?;
    if set.is_empty() {
        return Err(SchemaError::EmptyDocument);
    }
    Ok(set)
}

fn walk_group(
    prefix: &str,
    entries: &[(String, SourceNode)],
    inherited_category: Option<&str>,
    set: &mut TokenSet,
) -> std::result::Result<(), SchemaError> {
    let parent = if prefix.is_empty() { "<root>" } else { prefix };

    let mut category = inherited_category.map(str::to_string);
    for (key, node) in entries {
        match key.as_str() {
            "$category" => category = Some(meta_string(parent, key, node)?),
            "$description" => {
                meta_string(parent, key, node)?;
            }
            _ if key.starts_with('$') => {
                return Err(SchemaError::UnknownField {
                    id: parent.to_string(),
                    field: key.clone(),
                })
            }
            _ => {}
        }
    }

    for (key, node) in entries.iter().filter(|(k, _)| !k.starts_with('$')) {
        if !is_valid_id(key) {
            return Err(SchemaError::InvalidKey {
                parent: parent.to_string(),
                key: key.clone(),
            });
        }
        let id = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match node {
            SourceNode::Map(children) if !node.is_leaf() => {
                if children.is_empty() {
                    tracing::debug!("skipping empty group `{id}`");
                }
                walk_group(&id, children, category.as_deref(), set)?;
            }
            _ => set.insert(read_leaf(id, node, category.as_deref())?)?,
        }
    }
    Ok(())
}

fn meta_string(id: &str, field: &str, node: &SourceNode) -> std::result::Result<String, SchemaError> {
    match node {
        SourceNode::Scalar(Scalar::String(s)) => Ok(s.clone()),
        _ => Err(SchemaError::InvalidField {
            id: id.to_string(),
            field: field.to_string(),
        }),
    }
}

fn read_leaf(
    id: String,
    node: &SourceNode,
    inherited_category: Option<&str>,
) -> std::result::Result<Token, SchemaError> {
    let SourceNode::Map(fields) = node else {
        let (value, declared_type) = classify(&id, node, None)?;
        return Ok(Token {
            id,
            declared_type,
            value,
            category: inherited_category.map(str::to_string),
            description: None,
        });
    };

    let mut raw_value = None;
    let mut explicit = None;
    let mut category = inherited_category.map(str::to_string);
    let mut description = None;
    let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
    for (field, child) in fields {
        let name = field.trim_start_matches('$');
        if seen.contains(&name) {
            return Err(SchemaError::DuplicateField {
                id,
                field: name.to_string(),
            });
        }
        seen.push(name);
        match name {
            "value" => raw_value = Some(child),
            "type" => {
                let name = meta_string(&id, field, child)?;
                let ty = TokenType::from_name(&name).ok_or_else(|| SchemaError::UnknownType {
                    id: id.clone(),
                    name,
                })?;
                explicit = Some(ty);
            }
            "category" => category = Some(meta_string(&id, field, child)?),
            "description" => description = Some(meta_string(&id, field, child)?),
            _ => {
                return Err(SchemaError::UnknownField {
                    id,
                    field: field.clone(),
                })
            }
        }
    }

    let raw_value = raw_value.ok_or_else(|| SchemaError::UnrecognizedShape {
        id: id.clone(),
        found: node.describe(),
    })?;
    let (value, declared_type) = classify(&id, raw_value, explicit)?;
    Ok(Token {
        id,
        declared_type,
        value,
        category,
        description,
    })
}

/// Classify a raw leaf value into a token value and its declared type.
///
/// Alias markers always classify as aliases and keep the explicit type, if
/// any. Literals must parse as the explicit type, or, without one, must have
/// one of the recognized shapes.
pub(crate) fn classify(
    id: &str,
    node: &SourceNode,
    explicit: Option<TokenType>,
) -> std::result::Result<(TokenValue, Option<TokenType>), SchemaError> {
    let SourceNode::Scalar(scalar) = node else {
        return Err(match explicit {
            Some(expected) => SchemaError::InvalidLiteral {
                id: id.to_string(),
                expected,
                found: node.describe(),
            },
            None => SchemaError::UnrecognizedShape {
                id: id.to_string(),
                found: node.describe(),
            },
        });
    };

    if let Scalar::String(text) = scalar {
        if let Some(target) = alias_target(text) {
            if !is_valid_id(target) {
                return Err(SchemaError::InvalidAlias {
                    id: id.to_string(),
                    reference: text.clone(),
                });
            }
            return Ok((TokenValue::Alias(target.to_string()), explicit));
        }
    }

    let literal = match explicit {
        Some(expected) => parse_literal(scalar, expected).ok_or_else(|| SchemaError::InvalidLiteral {
            id: id.to_string(),
            expected,
            found: scalar.describe(),
        })?,
        None => infer_literal(scalar).ok_or_else(|| SchemaError::UnrecognizedShape {
            id: id.to_string(),
            found: scalar.describe(),
        })?,
    };
    let ty = literal.token_type();
    Ok((TokenValue::Literal(literal), Some(ty)))
}

fn parse_literal(scalar: &Scalar, expected: TokenType) -> Option<Literal> {
    match (expected, scalar) {
        (TokenType::Color, Scalar::String(s)) => Rgba::parse_hex(s).map(Literal::Color),
        (TokenType::Dimension, Scalar::String(s)) => Dimension::parse(s).map(Literal::Dimension),
        (TokenType::Number, Scalar::Number(n)) if n.is_finite() => Some(Literal::Number(*n)),
        (TokenType::String, Scalar::String(s)) => Some(Literal::String(s.clone())),
        _ => None,
    }
}

/// The closed set of shapes recognized without a `type` annotation.
fn infer_literal(scalar: &Scalar) -> Option<Literal> {
    match scalar {
        Scalar::String(s) => Rgba::parse_hex(s)
            .map(Literal::Color)
            .or_else(|| Dimension::parse(s).map(Literal::Dimension)),
        Scalar::Number(n) if n.is_finite() => Some(Literal::Number(*n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Unit;

    fn load_json(src: &str) -> std::result::Result<TokenSet, SchemaError> {
        load_str(src, SourceFormat::Json)
    }

    #[test]
    fn flattens_nested_groups_in_declaration_order() {
        let set = load_json(
            r##"{
                "color": {
                    "white": "#ffffff",
                    "text": { "value": "{color.white}" }
                },
                "space": { "md": "16px", "scale": 1.5 }
            }"##,
        )
        .unwrap();

        let ids: Vec<&str> = set.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["color.white", "color.text", "space.md", "space.scale"]);
        assert_eq!(
            set.get("space.md").unwrap().value,
            TokenValue::Literal(Literal::Dimension(Dimension::new(16.0, Unit::Px)))
        );
        assert_eq!(
            set.get("color.text").unwrap().value,
            TokenValue::Alias("color.white".to_string())
        );
        assert_eq!(set.get("color.text").unwrap().declared_type, None);
        assert_eq!(
            set.get("space.scale").unwrap().declared_type,
            Some(TokenType::Number)
        );
    }

    #[test]
    fn explicit_type_takes_precedence() {
        let set = load_json(
            r#"{ "font": { "body": { "value": "Inter, sans-serif", "type": "string" } } }"#,
        )
        .unwrap();
        assert_eq!(
            set.get("font.body").unwrap().value,
            TokenValue::Literal(Literal::String("Inter, sans-serif".to_string()))
        );

        // A hex-looking string annotated as a string stays a string.
        let set = load_json(r##"{ "label": { "$value": "#fff", "$type": "string" } }"##).unwrap();
        assert_eq!(
            set.get("label").unwrap().declared_type,
            Some(TokenType::String)
        );
    }

    #[test]
    fn unrecognized_shapes_are_errors() {
        for src in [
            r#"{ "font": "Inter" }"#,
            r#"{ "flag": true }"#,
            r#"{ "list": [1, 2] }"#,
            r#"{ "nothing": null }"#,
        ] {
            let err = load_json(src).unwrap_err();
            assert!(
                matches!(err, SchemaError::UnrecognizedShape { .. }),
                "{src}: {err:?}"
            );
        }
    }

    #[test]
    fn explicit_type_must_match_literal() {
        let err = load_json(r#"{ "c": { "value": "16px", "type": "color" } }"#).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidLiteral {
                id: "c".to_string(),
                expected: TokenType::Color,
                found: "string \"16px\"".to_string(),
            }
        );

        let err = load_json(r#"{ "c": { "value": 1, "type": "colour" } }"#).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { name, .. } if name == "colour"));
    }

    #[test]
    fn dotted_keys_collapsing_onto_one_id_are_duplicates() {
        let err = load_json(
            r##"{ "color": { "bg": "#ffffff" }, "color.bg": "#000000" }"##,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateId {
                id: "color.bg".to_string()
            }
        );
    }

    #[test]
    fn duplicate_object_keys_are_rejected() {
        let err = load_json(r##"{ "color": { "a": "#fff" }, "color": { "b": "#000" } }"##)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn group_category_is_inherited() {
        let set = load_json(
            r##"{
                "color": {
                    "$category": "palette",
                    "a": "#fff",
                    "b": { "value": "#000", "category": "ink" }
                }
            }"##,
        )
        .unwrap();
        assert_eq!(set.get("color.a").unwrap().category.as_deref(), Some("palette"));
        assert_eq!(set.get("color.b").unwrap().category.as_deref(), Some("ink"));
    }

    #[test]
    fn rejects_bad_keys_fields_and_aliases() {
        assert!(matches!(
            load_json(r##"{ "color bg": "#fff" }"##).unwrap_err(),
            SchemaError::InvalidKey { .. }
        ));
        assert!(matches!(
            load_json(r##"{ "a": { "value": "#fff", "unit": "px" } }"##).unwrap_err(),
            SchemaError::UnknownField { .. }
        ));
        assert!(matches!(
            load_json(r#"{ "a": "{not valid}" }"#).unwrap_err(),
            SchemaError::InvalidAlias { .. }
        ));
        assert_eq!(load_json("{}").unwrap_err(), SchemaError::EmptyDocument);
        assert_eq!(load_json("[]").unwrap_err(), SchemaError::EmptyDocument);
    }

    #[test]
    fn leaf_fields_may_not_repeat_under_either_spelling() {
        assert_eq!(
            load_json(r##"{ "a": { "value": "#fff", "type": "color", "$type": "string" } }"##)
                .unwrap_err(),
            SchemaError::DuplicateField {
                id: "a".to_string(),
                field: "type".to_string(),
            }
        );
        assert!(matches!(
            load_json(r##"{ "a": { "value": "#fff", "$value": "#000" } }"##).unwrap_err(),
            SchemaError::DuplicateField { field, .. } if field == "value"
        ));
        assert!(matches!(
            load_json(r#"{ "a": { "value": 1, "category": "x", "$category": "y" } }"#).unwrap_err(),
            SchemaError::DuplicateField { field, .. } if field == "category"
        ));
    }

    #[test]
    fn toml_and_yaml_share_the_schema() {
        let toml_set = load_str(
            r##"
            [color]
            bg = "#ffffff"
            fg = { value = "{color.bg}", type = "color" }
            "##,
            SourceFormat::Toml,
        )
        .unwrap();
        let yaml_set = load_str(
            "color:\n  bg: \"#ffffff\"\n  fg:\n    value: \"{color.bg}\"\n    type: color\n",
            SourceFormat::Yaml,
        )
        .unwrap();
        assert_eq!(toml_set, yaml_set);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("tokens.JSON")),
            Some(SourceFormat::Json)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("a/tokens.yml")),
            Some(SourceFormat::Yaml)
        );
        assert_eq!(SourceFormat::from_path(Path::new("tokens.txt")), None);
    }
}
