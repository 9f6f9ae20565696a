//! Configuration types for tvnav.
//!
//! This module provides the [`RouterConfig`] struct which holds every selector,
//! class name, threshold and delay the router uses. The defaults reproduce the
//! cloud web client's TV-mode; a host page can override any field, either from
//! TOML or (in the wasm binding) from a plain JS object.
//!
//! # Key Configuration Fields
//!
//! - `focusable_selectors`: which elements are navigation candidates
//! - `small_target_selectors` / `small_target_px`: when to use the stronger indicator
//! - `modal_selector` / `open_modal_selector`: how a visible dialog is recognized
//! - `storage_key`: where the on/off flag is persisted
//! - `timing` / `joystick`: the explicit time windows of deferred work and
//!   pointer-gesture classification
//!
//! # Example
//!
//! ```ignore
//! use tvnav_core::config::RouterConfig;
//!
//! let config = RouterConfig::from_toml_str(r#"
//!     storage_key = "myAppTvMode"
//!     [joystick]
//!     distance_threshold_px = 40.0
//! "#)?;
//! assert_eq!(config.joystick.rate_limit_ms, 300.0);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{NavError, Result};
use crate::selector;

/// Class names applied by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
pub struct IndicatorClasses {
    /// Applied to the focused element.
    pub focus: String,
    /// Added on top of `focus` for small targets.
    pub focus_small: String,
    /// Transient "pressed" feedback on activation.
    pub pressed: String,
    /// Transient feedback after a pointer-gesture move.
    pub direction_change: String,
    /// Root (body) class while the mode is on.
    pub mode_active: String,
    /// Root (body) class while the pointer is moving.
    pub pointer_moving: String,
}

impl Default for IndicatorClasses {
    fn default() -> Self {
        Self {
            focus: "tv-focus".to_string(),
            focus_small: "tv-focus-small".to_string(),
            pressed: "tv-active".to_string(),
            direction_change: "tv-direction-change".to_string(),
            mode_active: "tv-mode-active".to_string(),
            pointer_moving: "mouse-moving".to_string(),
        }
    }
}

/// Delays for deferred work, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after a relevant DOM mutation before refreshing candidates.
    pub settle_ms: f64,
    /// Lifetime of the pressed indicator.
    pub pressed_ms: f64,
    /// Lifetime of the direction-change indicator.
    pub direction_change_ms: f64,
    /// How long the pointer-moving root class survives the last movement.
    pub pointer_activity_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 100.0,
            pressed_ms: 200.0,
            direction_change_ms: 200.0,
            pointer_activity_ms: 1500.0,
        }
    }
}

/// Pointer-as-joystick thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
pub struct JoystickConfig {
    /// Samples closer together than this are ignored.
    pub debounce_ms: f64,
    /// Minimum time between two pointer-driven moves.
    pub rate_limit_ms: f64,
    /// Minimum displacement along the dominant axis.
    pub distance_threshold_px: f64,
    /// Minimum speed along the dominant axis, in px/ms.
    pub speed_threshold: f64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 20.0,
            rate_limit_ms: 300.0,
            distance_threshold_px: 30.0,
            speed_threshold: 0.5,
        }
    }
}

/// `RouterConfig` holds everything about the router a host page can tune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
pub struct RouterConfig {
    /// Selectors of interactive elements eligible for focus
    pub focusable_selectors: Vec<String>,

    /// Selectors of controls that always get the small-target indicator
    pub small_target_selectors: Vec<String>,

    /// Elements whose client width or height is below this get the
    /// small-target indicator too
    pub small_target_px: f64,

    /// Containers that hide everything inside them
    pub hidden_container_selectors: Vec<String>,

    /// Any modal dialog container
    pub modal_selector: String,

    /// A modal dialog that is currently shown
    pub open_modal_selector: String,

    /// Class names applied by the router
    pub classes: IndicatorClasses,

    /// Persistent key-value store key for the on/off flag
    pub storage_key: String,

    /// Delays for deferred work
    pub timing: TimingConfig,

    /// Pointer gesture thresholds
    pub joystick: JoystickConfig,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Close buttons and other tiny controls.
const SMALL_TARGETS: &[&str] = &[
    ".close-modal",
    ".close",
    ".close-sidebar",
    ".close-notification",
    ".close-search-results",
    "#close-preview",
    "#close-movie-modal",
    "#close-watch-movie-modal",
];

impl Default for RouterConfig {
    fn default() -> Self {
        let mut focusable = strings(&[
            "a",
            "button",
            "input",
            "select",
            "textarea",
            "[role=\"button\"]",
            "[tabindex]",
            ".menu-item",
            ".file-card",
            ".movie-card",
            ".note-card",
            ".btn-primary",
            ".btn-secondary",
            ".btn-success",
            ".btn-danger",
        ]);
        focusable.extend(strings(SMALL_TARGETS));
        focusable.extend(strings(&[
            ".toggle-label",
            ".language-option",
            ".file-actions a",
            ".note-edit-btn",
            ".note-delete-btn",
            ".sort-options select",
            ".mobile-menu-button",
            ".torrent-get-link",
            ".magnet-link",
            ".torrent-link",
            ".source-link",
            ".logout-link",
            ".btn-copy",
            ".btn-sm",
            ".btn-add",
        ]));

        Self {
            focusable_selectors: focusable,
            small_target_selectors: strings(SMALL_TARGETS),
            small_target_px: 40.0,
            hidden_container_selectors: strings(&[".hidden", "[style*=\"display: none\"]"]),
            modal_selector: ".modal".to_string(),
            open_modal_selector: ".modal[style*=\"display: block\"]".to_string(),
            classes: IndicatorClasses::default(),
            storage_key: "tvModeActive".to_string(),
            timing: TimingConfig::default(),
            joystick: JoystickConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Parse a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RouterConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse from a JSON value (used by JS hosts).
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let config: RouterConfig = serde_json::from_value(value)
            .map_err(|e| NavError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check selectors parse and thresholds are sane.
    pub fn validate(&self) -> Result<()> {
        if self.focusable_selectors.is_empty() {
            return Err(NavError::InvalidConfig(
                "focusable_selectors must not be empty".to_string(),
            ));
        }
        let selectors = self
            .focusable_selectors
            .iter()
            .chain(&self.small_target_selectors)
            .chain(&self.hidden_container_selectors)
            .chain([&self.modal_selector, &self.open_modal_selector]);
        for source in selectors {
            selector::validate(source)?;
        }

        if self.storage_key.trim().is_empty() {
            return Err(NavError::InvalidConfig(
                "storage_key must not be empty".to_string(),
            ));
        }

        let non_negative = [
            ("small_target_px", self.small_target_px),
            ("timing.settle_ms", self.timing.settle_ms),
            ("timing.pressed_ms", self.timing.pressed_ms),
            ("timing.direction_change_ms", self.timing.direction_change_ms),
            ("timing.pointer_activity_ms", self.timing.pointer_activity_ms),
            ("joystick.debounce_ms", self.joystick.debounce_ms),
            ("joystick.rate_limit_ms", self.joystick.rate_limit_ms),
            ("joystick.distance_threshold_px", self.joystick.distance_threshold_px),
            ("joystick.speed_threshold", self.joystick.speed_threshold),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(NavError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RouterConfig::default();
        config.validate().unwrap();
        assert_eq!(config.storage_key, "tvModeActive");
        assert_eq!(config.small_target_px, 40.0);
        assert!(config.focusable_selectors.contains(&"#close-preview".to_string()));
        assert!(config.focusable_selectors.contains(&".file-actions a".to_string()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RouterConfig::from_toml_str(
            r#"
storage_key = "otherKey"

[joystick]
distance_threshold_px = 45.0
"#,
        )
        .unwrap();
        assert_eq!(config.storage_key, "otherKey");
        assert_eq!(config.joystick.distance_threshold_px, 45.0);
        assert_eq!(config.joystick.rate_limit_ms, 300.0);
        assert_eq!(config.timing.settle_ms, 100.0);
        assert_eq!(config.classes.focus, "tv-focus");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RouterConfig::default();
        let toml = config.to_toml_string().unwrap();
        let parsed = RouterConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_malformed_selector_rejected() {
        let result = RouterConfig::from_toml_str(r#"focusable_selectors = ["a", "a["]"#);
        assert!(matches!(result, Err(NavError::InvalidSelector { .. })));

        let mut config = RouterConfig::default();
        config.focusable_selectors = vec!["button:enabled".into(), ".close >".into()];
        assert!(matches!(config.validate(), Err(NavError::InvalidSelector { .. })));
    }

    #[test]
    fn test_browser_selectors_accepted() {
        for extra in [
            "a:not(.disabled)",
            "button:enabled",
            ".toolbar + .btn-sm",
            "li:first-child a",
        ] {
            let config = RouterConfig::from_json(serde_json::json!({
                "focusable_selectors": ["a", extra]
            }))
            .unwrap();
            assert_eq!(config.focusable_selectors, vec!["a", extra]);
        }
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let mut config = RouterConfig::default();
        config.joystick.speed_threshold = -1.0;
        assert!(matches!(config.validate(), Err(NavError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_focusable_rejected() {
        let mut config = RouterConfig::default();
        config.focusable_selectors.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let config = RouterConfig::from_json(serde_json::json!({
            "small_target_px": 32.0,
            "classes": { "focus": "remote-focus" }
        }))
        .unwrap();
        assert_eq!(config.small_target_px, 32.0);
        assert_eq!(config.classes.focus, "remote-focus");
        assert_eq!(config.classes.focus_small, "tv-focus-small");
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = RouterConfig::from_toml_str("storage_key = ");
        assert!(matches!(result, Err(NavError::ConfigParse(_))));
    }
}
