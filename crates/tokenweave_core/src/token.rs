//! Token data model
//!
//! A [`TokenSet`] is what the loader produces: every entry is either a literal
//! or an alias to another token id. A [`ResolvedTokenSet`] is what the resolver
//! and the variant composer produce: every entry is a [`Literal`].
//!
//! Both sets keep the declaration order of the source document, which is the
//! order every emitter writes tokens in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::error::SchemaError;

/// The closed set of token types
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Color,
    Dimension,
    Number,
    String,
}

impl TokenType {
    /// Stable name used in source documents and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Dimension => "dimension",
            Self::Number => "number",
            Self::String => "string",
        }
    }

    /// Parse an explicit `type` annotation.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "color" => Some(Self::Color),
            "dimension" => Some(Self::Dimension),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An 8-bit-per-channel sRGB color
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgba = Rgba::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` (case-insensitive).
    pub fn parse_hex(src: &str) -> Option<Self> {
        let digits = src.strip_prefix('#')?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&digits[i..=i], 16).ok();
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 | 4 => {
                let r = nibble(0)?;
                let g = nibble(1)?;
                let b = nibble(2)?;
                let a = if digits.len() == 4 { nibble(3)? } else { 0xF };
                Some(Self::rgba(r * 17, g * 17, b * 17, a * 17))
            }
            6 | 8 => {
                let a = if digits.len() == 8 { byte(6)? } else { 0xFF };
                Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
            }
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 0xFF
    }

    /// Canonical lowercase hex form; alpha is only written when not opaque.
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Display for Rgba {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Units accepted for `dimension` tokens
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Unit {
    Px,
    Rem,
    Em,
    Percent,
    Vh,
    Vw,
    Pt,
    Ms,
    S,
}

impl Unit {
    /// Longer suffixes first so `rem` is never read as `em` and `ms` never as `s`.
    const BY_SUFFIX_LEN: [Unit; 9] = [
        Unit::Rem,
        Unit::Px,
        Unit::Em,
        Unit::Vh,
        Unit::Vw,
        Unit::Pt,
        Unit::Ms,
        Unit::Percent,
        Unit::S,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Rem => "rem",
            Self::Em => "em",
            Self::Percent => "%",
            Self::Vh => "vh",
            Self::Vw => "vw",
            Self::Pt => "pt",
            Self::Ms => "ms",
            Self::S => "s",
        }
    }
}

/// A number with a unit, e.g. `16px` or `1.5rem`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: Unit,
}

impl Dimension {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn parse(src: &str) -> Option<Self> {
        let unit = Unit::BY_SUFFIX_LEN
            .into_iter()
            .find(|unit| src.ends_with(unit.suffix()))?;
        let number = &src[..src.len() - unit.suffix().len()];
        // `str::parse::<f64>` also accepts words like "inf" and "NaN".
        if number.is_empty() || !number.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: f64 = number.parse().ok()?;
        value.is_finite().then_some(Self { value, unit })
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_number(self.value), self.unit.suffix())
    }
}

/// Shortest round-trip decimal form, with negative zero folded into zero.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// A fully resolved token value
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Color(Rgba),
    Dimension(Dimension),
    Number(f64),
    String(String),
}

impl Literal {
    pub fn token_type(&self) -> TokenType {
        match self {
            Self::Color(_) => TokenType::Color,
            Self::Dimension(_) => TokenType::Dimension,
            Self::Number(_) => TokenType::Number,
            Self::String(_) => TokenType::String,
        }
    }

    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(color) => Some(*color),
            _ => None,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(color) => color.fmt(f),
            Self::Dimension(dimension) => dimension.fmt(f),
            Self::Number(number) => f.write_str(&format_number(*number)),
            Self::String(text) => f.write_str(text),
        }
    }
}

/// A token's value before alias resolution
#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    Literal(Literal),
    /// Reference to another token's id
    Alias(String),
}

/// A token as declared in the source document
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub id: String,
    /// Explicit or inferred type. `None` only for aliases without a `type`
    /// annotation, which adopt the type of whatever they resolve to.
    pub declared_type: Option<TokenType>,
    pub value: TokenValue,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl Token {
    pub fn literal(id: impl Into<String>, value: Literal) -> Self {
        Self {
            id: id.into(),
            declared_type: Some(value.token_type()),
            value: TokenValue::Literal(value),
            category: None,
            description: None,
        }
    }

    pub fn alias(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            declared_type: None,
            value: TokenValue::Alias(target.into()),
            category: None,
            description: None,
        }
    }

    pub fn with_type(mut self, ty: TokenType) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.value, TokenValue::Alias(_))
    }
}

/// Ordered mapping from token id to [`Token`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenSet {
    tokens: IndexMap<String, Token>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, rejecting an id that is already present.
    pub fn insert(&mut self, token: Token) -> Result<(), SchemaError> {
        if self.tokens.contains_key(&token.id) {
            return Err(SchemaError::DuplicateId { id: token.id });
        }
        self.tokens.insert(token.id.clone(), token);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tokens.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A token whose value is a literal
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedToken {
    pub id: String,
    pub value: Literal,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl ResolvedToken {
    pub fn token_type(&self) -> TokenType {
        self.value.token_type()
    }
}

/// Ordered mapping from token id to [`ResolvedToken`]
///
/// Each set is an independent value. Variants are built by cloning the base
/// set and overriding values in the clone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedTokenSet {
    tokens: IndexMap<String, ResolvedToken>,
}

impl ResolvedTokenSet {
    pub(crate) fn push(&mut self, token: ResolvedToken) {
        self.tokens.insert(token.id.clone(), token);
    }

    /// Replace the value of an existing token. Returns `false` for unknown ids.
    pub(crate) fn set_value(&mut self, id: &str, value: Literal) -> bool {
        match self.tokens.get_mut(id) {
            Some(token) => {
                token.value = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedToken> {
        self.tokens.get(id)
    }

    pub fn value(&self, id: &str) -> Option<&Literal> {
        self.tokens.get(id).map(|token| &token.value)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tokens.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedToken> {
        self.tokens.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// View this set as an alias-free [`TokenSet`].
    pub fn to_token_set(&self) -> TokenSet {
        let tokens = self
            .iter()
            .map(|resolved| {
                (
                    resolved.id.clone(),
                    Token {
                        id: resolved.id.clone(),
                        declared_type: Some(resolved.token_type()),
                        value: TokenValue::Literal(resolved.value.clone()),
                        category: resolved.category.clone(),
                        description: resolved.description.clone(),
                    },
                )
            })
            .collect();
        TokenSet { tokens }
    }
}

/// Whether `segment` is a valid id segment: `[A-Za-z0-9_-]+`.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Whether `id` is a dotted path of valid segments.
pub fn is_valid_id(id: &str) -> bool {
    id.split('.').all(is_valid_segment)
}

/// Extract the referenced id from an alias marker `{dotted.id}`.
///
/// Returns `None` when `src` is not shaped like an alias at all; the caller
/// decides what to do with a marker whose inner id is malformed.
pub fn alias_target(src: &str) -> Option<&str> {
    src.strip_prefix('{')?.strip_suffix('}').map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_hex_shapes() {
        assert_eq!(Rgba::parse_hex("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse_hex("#000F"), Some(Rgba::BLACK));
        assert_eq!(Rgba::parse_hex("#767676"), Some(Rgba::from_hex(0x767676)));
        assert_eq!(
            Rgba::parse_hex("#11223380"),
            Some(Rgba::rgba(0x11, 0x22, 0x33, 0x80))
        );
        assert_eq!(Rgba::parse_hex("#ABCDEF"), Some(Rgba::from_hex(0xABCDEF)));
    }

    #[test]
    fn rejects_malformed_hex() {
        for src in ["fff", "#ff", "#fffff", "#ggg", "#", "#1234567"] {
            assert_eq!(Rgba::parse_hex(src), None, "{src}");
        }
    }

    #[test]
    fn hex_output_is_lowercase_and_drops_opaque_alpha() {
        assert_eq!(Rgba::from_hex(0xABCDEF).to_hex(), "#abcdef");
        assert_eq!(Rgba::rgba(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn parses_dimensions_with_longest_suffix() {
        assert_eq!(Dimension::parse("16px"), Some(Dimension::new(16.0, Unit::Px)));
        assert_eq!(Dimension::parse("1.5rem"), Some(Dimension::new(1.5, Unit::Rem)));
        assert_eq!(Dimension::parse("2em"), Some(Dimension::new(2.0, Unit::Em)));
        assert_eq!(Dimension::parse("150ms"), Some(Dimension::new(150.0, Unit::Ms)));
        assert_eq!(Dimension::parse("-4px"), Some(Dimension::new(-4.0, Unit::Px)));
        assert_eq!(Dimension::parse("50%"), Some(Dimension::new(50.0, Unit::Percent)));
    }

    #[test]
    fn rejects_non_dimensions() {
        for src in ["px", "16", "16 px", "infpx", "NaNrem", "16furlongs", "abc"] {
            assert_eq!(Dimension::parse(src), None, "{src}");
        }
    }

    #[test]
    fn numbers_format_shortest() {
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(Dimension::new(1.25, Unit::Rem).to_string(), "1.25rem");
    }

    #[test]
    fn token_set_rejects_duplicate_ids() {
        let mut set = TokenSet::new();
        set.insert(Token::literal("a", Literal::Number(1.0))).unwrap();
        let err = set
            .insert(Token::literal("a", Literal::Number(2.0)))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateId { id } if id == "a"));
    }

    #[test]
    fn alias_markers() {
        assert_eq!(alias_target("{color.base}"), Some("color.base"));
        assert_eq!(alias_target("color.base"), None);
        assert!(is_valid_id("color.gray-100"));
        assert!(!is_valid_id("color..base"));
        assert!(!is_valid_id("color.base tone"));
    }
}
