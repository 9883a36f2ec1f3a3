//! Serializable view state for persistence and host/backend exchange.
//!
//! A [`ViewProfile`] captures what a view displays (an icon or an SVG
//! resource) together with its color override and size, in a JSON-friendly
//! format.
//!
//! # Example
//!
//! ```
//! use svgfx_renderer::{Bi, ViewProfile};
//!
//! let profile = ViewProfile::new()
//!     .with_icon(Bi::Gear)
//!     .with_color("--accent")
//!     .with_size(32.0, 32.0);
//!
//! let json = profile.to_json().unwrap();
//! let restored = ViewProfile::from_json(&json).unwrap();
//! assert_eq!(restored, profile);
//! ```

use serde::{Deserialize, Serialize};

use crate::icon::Bi;

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for views that can be configured from a [`ViewProfile`].
pub trait Configurable {
    /// Applies a profile's settings as a partial update.
    ///
    /// Every field left as `None` keeps the view's current value, so a
    /// profile carrying only a color recolors without touching the rest.
    /// Fields the view does not use are ignored.
    fn apply_profile(&mut self, profile: &ViewProfile);

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> ViewProfile;
}

// ============================================================================
// ViewProfile
// ============================================================================

/// A serializable snapshot of a view's visual state.
///
/// # JSON Format
///
/// ```json
/// {
///   "icon": "x-circle",
///   "color": "--danger",
///   "width": 24.0,
///   "height": 24.0
/// }
/// ```
///
/// Absent fields are omitted. An [`IconView`](crate::IconView) reads `icon`;
/// an [`SvgImageView`](crate::SvgImageView) reads `svg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ViewProfile {
    /// Icon shown by an icon view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Bi>,

    /// SVG resource path shown by an SVG image view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,

    /// Theme token, hex value or color name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Preferred width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Preferred height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl ViewProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_icon(mut self, icon: Bi) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_svg(mut self, svg: impl Into<String>) -> Self {
        self.svg = Some(svg.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets both preferred dimensions.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_json_format() {
        let profile = ViewProfile::new()
            .with_icon(Bi::ArrowLeftSquareFill)
            .with_color("#ff0000")
            .with_size(48.0, 24.0);

        let json = profile.to_json_pretty().unwrap();
        assert!(json.contains("\"icon\": \"arrow-left-square-fill\""));
        assert!(json.contains("\"color\": \"#ff0000\""));
        assert!(json.contains("\"width\": 48.0"));
        assert!(!json.contains("\"svg\""), "absent fields are skipped");
    }

    #[test]
    fn svg_profile_survives_json() {
        let profile = ViewProfile::new().with_svg("images/logo.svg").with_size(100.0, 80.0);
        let restored = ViewProfile::from_json(&profile.to_json().unwrap()).unwrap();

        assert_eq!(restored.svg.as_deref(), Some("images/logo.svg"));
        assert_eq!(restored.width, Some(100.0));
        assert!(restored.icon.is_none());
    }

    #[test]
    fn empty_profile_deserializes() {
        let profile = ViewProfile::from_json("{}").unwrap();
        assert_eq!(profile, ViewProfile::default());
    }

    #[test]
    fn unknown_icon_is_rejected() {
        assert!(ViewProfile::from_json(r#"{"icon":"not-an-icon"}"#).is_err());
    }
}
