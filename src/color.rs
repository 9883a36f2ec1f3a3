//! Color overrides: literal colors and theme tokens.
//!
//! A color string is classified into a [`ColorSpec`]. Literal colors (hex or
//! CSS names) are parsed with palette. Theme tokens are looked up in the first
//! rule of the theme stylesheet, parsed with lightningcss.

use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use palette::Srgb;

use crate::error::{Result, SvgfxError};

// ============================================================================
// ColorSpec
// ============================================================================

/// A color override as given by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    /// A symbolic name resolved through the theme stylesheet, e.g. `--accent`.
    ThemeToken(String),
    /// A literal `#rgb` or `#rrggbb` value.
    Hex(String),
    /// A CSS color keyword such as `crimson`.
    Named(String),
}

impl ColorSpec {
    /// Classifies a color string. Classification never fails; invalid literals
    /// are reported when the color is resolved.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with('-') {
            Self::ThemeToken(value.to_string())
        } else if value.starts_with('#') {
            Self::Hex(value.to_string())
        } else {
            Self::Named(value.to_string())
        }
    }

    /// Returns true for theme tokens.
    pub fn is_theme_token(&self) -> bool {
        matches!(self, Self::ThemeToken(_))
    }

    /// Resolves a literal color. Theme tokens resolve through [`Theme::color`].
    pub fn resolve_literal(&self) -> Result<Srgb<u8>> {
        match self {
            Self::Hex(value) | Self::Named(value) => {
                parse_color(value).ok_or_else(|| SvgfxError::InvalidColor(value.clone()))
            }
            Self::ThemeToken(token) => Err(SvgfxError::InvalidColor(format!(
                "{token} is a theme token, not a literal color"
            ))),
        }
    }
}

/// Parses a hex (`#rgb`, `#rrggbb`, `#rrggbbaa`) or named CSS color.
///
/// Alpha is dropped; fill and stroke overrides are always opaque.
pub fn parse_color(value: &str) -> Option<Srgb<u8>> {
    let value = value.trim();
    if value.starts_with('#') {
        if let Ok(rgb) = value.parse::<Srgb<u8>>() {
            return Some(rgb);
        }
        return value.parse::<palette::Srgba<u8>>().ok().map(|rgba| rgba.color);
    }
    palette::named::from_str(&value.to_ascii_lowercase())
}

/// Formats a color as lowercase `#rrggbb`.
pub fn to_hex_string(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

// ============================================================================
// Theme
// ============================================================================

/// Declarations of the first rule of a theme stylesheet.
///
/// Only the first rule is consulted; it plays the role of the root scope
/// where theme tokens are declared.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    declarations: Vec<(String, String)>,
}

impl Theme {
    /// Parses a stylesheet and keeps the declarations of its first rule.
    pub fn parse(css: &str) -> Result<Self> {
        let sheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| SvgfxError::Stylesheet(e.to_string()))?;

        let Some(CssRule::Style(rule)) = sheet.rules.0.first() else {
            return Ok(Self::default());
        };

        let mut declarations = Vec::new();
        let block = &rule.declarations;
        for decl in block.declarations.iter().chain(block.important_declarations.iter()) {
            let id = decl.property_id();
            let value = decl
                .value_to_css_string(PrinterOptions::default())
                .map_err(|e| SvgfxError::Stylesheet(e.to_string()))?;
            declarations.push((id.name().to_string(), value.trim().to_string()));
        }

        Ok(Self { declarations })
    }

    /// Returns the raw declared value of a token.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| name == token)
            .map(|(_, value)| value.as_str())
    }

    /// Resolves a token to a color, if declared with a parsable color value.
    pub fn color(&self, token: &str) -> Option<Srgb<u8>> {
        self.lookup(token).and_then(parse_color)
    }

    /// Number of declarations in the first rule.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns true if the first rule declares nothing.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_color_strings() {
        assert!(ColorSpec::parse("--accent").is_theme_token());
        assert!(ColorSpec::parse("-fx-accent").is_theme_token());
        assert_eq!(ColorSpec::parse("#ff0000"), ColorSpec::Hex("#ff0000".into()));
        assert_eq!(ColorSpec::parse(" crimson "), ColorSpec::Named("crimson".into()));
    }

    #[test]
    fn parse_hex_and_named() {
        assert_eq!(parse_color("#ff0000"), Some(Srgb::new(255, 0, 0)));
        assert_eq!(parse_color("#0f0"), Some(Srgb::new(0, 255, 0)));
        assert_eq!(parse_color("Blue"), Some(Srgb::new(0, 0, 255)));
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn literal_resolution_reports_invalid_colors() {
        let err = ColorSpec::parse("#12").resolve_literal().unwrap_err();
        assert!(matches!(err, SvgfxError::InvalidColor(_)));
        assert!(ColorSpec::parse("--accent").resolve_literal().is_err());
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(to_hex_string(Srgb::new(13, 110, 253)), "#0d6efd");
    }

    #[test]
    fn theme_reads_only_the_first_rule() {
        let css = ".root { --accent: #0d6efd; --danger: #dc3545; }\n.dark { --accent: #ffffff; }";
        let theme = Theme::parse(css).unwrap();
        assert_eq!(theme.len(), 2);
        assert_eq!(theme.color("--accent"), Some(Srgb::new(13, 110, 253)));
        assert_eq!(theme.color("--danger"), Some(Srgb::new(220, 53, 69)));
        assert_eq!(theme.color("--missing"), None);
    }

    #[test]
    fn bundled_theme_parses() {
        let css = crate::assets::bundled(crate::assets::THEME_STYLESHEET).unwrap();
        let theme = Theme::parse(std::str::from_utf8(css).unwrap()).unwrap();
        assert!(theme.color("--accent").is_some());
    }
}
