#![forbid(unsafe_code)]

//! Versioned tuning for every gesture threshold, timing, and gain.
//!
//! All hold durations, gate fractions, fling thresholds, and follower gains
//! live in one [`GestureConfig`]. `GestureConfig::default()` is the tuning
//! the list UI ships with; hosts may override any field from TOML or JSON.
//!
//! # Loading
//!
//! ```toml
//! version = 1
//!
//! [swipe]
//! execute_distance = 96.0
//! hold_ms = 500
//!
//! [drag]
//! gate = 0.35
//! ```
//!
//! ```rust,ignore
//! let config = GestureConfig::from_toml_str(text)?;
//! let config = GestureConfig::from_json_str(json)?;
//! ```
//!
//! Missing sections and fields fall back to their defaults.

use std::time::Duration;

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::effect::HapticLevel;

/// Current configuration schema version.
pub const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Top-level GestureConfig
// ---------------------------------------------------------------------------

/// Top-level gesture tuning.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GestureConfig {
    /// Schema version; configs newer than [`CONFIG_VERSION`] are rejected.
    pub version: u32,
    /// Use the short reduced-motion duration for every swipe animation.
    pub reduced_motion: bool,
    /// Duration substituted for animations when `reduced_motion` is set.
    #[cfg_attr(feature = "serde", serde(rename = "reduced_motion_ms", with = "duration_ms"))]
    pub reduced_motion_duration: Duration,
    pub swipe: SwipeConfig,
    pub drag: DragConfig,
    pub follow: FollowConfig,
    pub autoscroll: AutoScrollConfig,
    pub feedback: FeedbackConfig,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            reduced_motion: false,
            reduced_motion_duration: Duration::from_millis(80),
            swipe: SwipeConfig::default(),
            drag: DragConfig::default(),
            follow: FollowConfig::default(),
            autoscroll: AutoScrollConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Swipe recognition and drawer physics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SwipeConfig {
    /// Sustained hold after capture that pins the drawer open (default: 600ms).
    #[cfg_attr(feature = "serde", serde(rename = "hold_ms", with = "duration_ms"))]
    pub hold: Duration,
    /// Movement from the capture point that cancels the pin timer (default: 8px).
    pub hold_tolerance: f64,
    /// Horizontal travel that confirms an intentional swipe (default: 40px).
    pub min_intent_distance: f64,
    /// Vertical travel that hands the gesture to page scroll (default: 12px).
    pub vertical_guard: f64,
    /// Page scroll drift that hands the gesture to page scroll (default: 2px).
    pub scroll_tolerance: f64,
    /// Minimum speed for a fling, in px/ms (default: 0.8).
    pub fling_velocity: f64,
    /// Minimum horizontal travel for a fling (default: 32px).
    pub fling_min_distance: f64,
    /// Velocity sample freshness window (default: 80ms).
    #[cfg_attr(feature = "serde", serde(rename = "fling_expiry_ms", with = "duration_ms"))]
    pub fling_expiry: Duration,
    /// Offset that executes a slow, deliberate swipe (default: 80px).
    pub execute_distance: f64,
    /// Fraction of a zone width that snaps the drawer open (default: 0.25).
    pub snap_fraction: f64,
    /// Snap open/closed animation (default: 150ms).
    #[cfg_attr(feature = "serde", serde(rename = "snap_ms", with = "duration_ms"))]
    pub snap_duration: Duration,
    /// Execute fly-out animation (default: 140ms).
    #[cfg_attr(feature = "serde", serde(rename = "execute_ms", with = "duration_ms"))]
    pub execute_duration: Duration,
    /// Damping applied to travel past the overextension stop (default: 0.3).
    pub resistance: f64,
    /// Overextension stop as a multiple of the zone width (default: 1.3).
    pub max_overextend: f64,
    /// Fly-out distance as a multiple of the zone width (default: 1.2).
    pub execute_travel: f64,
    /// Zone icon pulse scale on execute (default: 1.2).
    pub pulse_scale: f64,
    #[cfg_attr(feature = "serde", serde(rename = "pulse_ms", with = "duration_ms"))]
    pub pulse_duration: Duration,
    /// Zone widths used when a row does not report its own (default: 80/120px).
    pub default_left_zone: f64,
    pub default_right_zone: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(600),
            hold_tolerance: 8.0,
            min_intent_distance: 40.0,
            vertical_guard: 12.0,
            scroll_tolerance: 2.0,
            fling_velocity: 0.8,
            fling_min_distance: 32.0,
            fling_expiry: Duration::from_millis(80),
            execute_distance: 80.0,
            snap_fraction: 0.25,
            snap_duration: Duration::from_millis(150),
            execute_duration: Duration::from_millis(140),
            resistance: 0.3,
            max_overextend: 1.3,
            execute_travel: 1.2,
            pulse_scale: 1.2,
            pulse_duration: Duration::from_millis(180),
            default_left_zone: 80.0,
            default_right_zone: 120.0,
        }
    }
}

/// Drag-to-reorder recognition and placeholder gates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DragConfig {
    /// Press duration on a handle that arms a drag (default: 350ms).
    #[cfg_attr(feature = "serde", serde(rename = "hold_ms", with = "duration_ms"))]
    pub hold: Duration,
    /// Movement before arming that aborts the press (default: 8px, DPR-scaled).
    pub jitter: f64,
    /// Per-DPR floor for the jitter tolerance (default: 6px × DPR).
    pub jitter_per_dpr: f64,
    /// Manhattan travel from the armed point that starts the drag (default: 2px).
    pub start_distance: f64,
    /// Gate line as a fraction into a neighbour's height (default: 0.30).
    pub gate: f64,
    /// Forced swap after travelling this fraction of a row height (default: 0.70).
    pub force: f64,
    /// Reversal distance before task-card intent flips (default: 16px).
    pub card_sticky: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(350),
            jitter: 8.0,
            jitter_per_dpr: 6.0,
            start_distance: 2.0,
            gate: 0.30,
            force: 0.70,
            card_sticky: 16.0,
        }
    }
}

impl DragConfig {
    /// Jitter tolerance for a given device pixel ratio.
    #[must_use]
    pub fn jitter_for_dpr(&self, device_pixel_ratio: f64) -> f64 {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        self.jitter.max(self.jitter_per_dpr * dpr)
    }
}

/// Adaptive ghost follower gains.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FollowConfig {
    /// Lower bound of the interpolation factor (smoother).
    pub min: f64,
    /// Upper bound of the interpolation factor (tighter).
    pub max: f64,
    /// Influence of the remaining gap in px.
    pub gap_gain: f64,
    /// Influence of the follower speed in px/s.
    pub speed_gain: f64,
    /// Gap below which the follower lands exactly on its target.
    pub snap_epsilon: f64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            min: 0.38,
            max: 0.86,
            gap_gain: 0.020,
            speed_gain: 0.012,
            snap_epsilon: 0.25,
        }
    }
}

/// Edge auto-scroll while dragging.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AutoScrollConfig {
    /// Distance from a viewport edge where scrolling starts (default: 80px).
    pub edge_band: f64,
    /// Scroll step at the very edge, per frame (default: 16px).
    pub max_step: f64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            edge_band: 80.0,
            max_step: 16.0,
        }
    }
}

/// Vibration pulse lengths for each haptic level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeedbackConfig {
    #[cfg_attr(feature = "serde", serde(rename = "light_ms", with = "duration_ms"))]
    pub light: Duration,
    #[cfg_attr(feature = "serde", serde(rename = "medium_ms", with = "duration_ms"))]
    pub medium: Duration,
    #[cfg_attr(feature = "serde", serde(rename = "success_ms", with = "duration_ms"))]
    pub success: Duration,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            light: Duration::from_millis(5),
            medium: Duration::from_millis(8),
            success: Duration::from_millis(15),
        }
    }
}

impl FeedbackConfig {
    /// Pulse length for a haptic level.
    #[must_use]
    pub fn duration(&self, level: HapticLevel) -> Duration {
        match level {
            HapticLevel::Light => self.light,
            HapticLevel::Medium => self.medium,
            HapticLevel::Success => self.success,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl GestureConfig {
    /// Snap animation duration, honouring reduced motion.
    #[must_use]
    pub fn snap_duration(&self) -> Duration {
        if self.reduced_motion {
            self.reduced_motion_duration
        } else {
            self.swipe.snap_duration
        }
    }

    /// Execute animation duration, honouring reduced motion.
    #[must_use]
    pub fn execute_duration(&self) -> Duration {
        if self.reduced_motion {
            self.reduced_motion_duration
        } else {
            self.swipe.execute_duration
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Return `self` if valid, otherwise the list of problems.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.version == 0 || self.version > CONFIG_VERSION {
            errors.push(format!(
                "version must be in 1..={CONFIG_VERSION}, got {}",
                self.version
            ));
        }

        let s = &self.swipe;
        positive(&mut errors, "swipe.hold_tolerance", s.hold_tolerance);
        positive(&mut errors, "swipe.min_intent_distance", s.min_intent_distance);
        positive(&mut errors, "swipe.vertical_guard", s.vertical_guard);
        non_negative(&mut errors, "swipe.scroll_tolerance", s.scroll_tolerance);
        positive(&mut errors, "swipe.fling_velocity", s.fling_velocity);
        non_negative(&mut errors, "swipe.fling_min_distance", s.fling_min_distance);
        positive(&mut errors, "swipe.execute_distance", s.execute_distance);
        fraction(&mut errors, "swipe.snap_fraction", s.snap_fraction);
        fraction(&mut errors, "swipe.resistance", s.resistance);
        positive(&mut errors, "swipe.default_left_zone", s.default_left_zone);
        positive(&mut errors, "swipe.default_right_zone", s.default_right_zone);
        positive(&mut errors, "swipe.pulse_scale", s.pulse_scale);
        if !s.max_overextend.is_finite() || s.max_overextend < 1.0 {
            errors.push(format!(
                "swipe.max_overextend must be >= 1.0, got {}",
                s.max_overextend
            ));
        }
        positive(&mut errors, "swipe.execute_travel", s.execute_travel);
        if s.fling_expiry.is_zero() {
            errors.push("swipe.fling_expiry must be > 0".into());
        }
        if s.hold.is_zero() {
            errors.push("swipe.hold must be > 0".into());
        }

        let d = &self.drag;
        if d.hold.is_zero() {
            errors.push("drag.hold must be > 0".into());
        }
        positive(&mut errors, "drag.jitter", d.jitter);
        non_negative(&mut errors, "drag.jitter_per_dpr", d.jitter_per_dpr);
        non_negative(&mut errors, "drag.start_distance", d.start_distance);
        fraction(&mut errors, "drag.gate", d.gate);
        fraction(&mut errors, "drag.force", d.force);
        non_negative(&mut errors, "drag.card_sticky", d.card_sticky);

        let f = &self.follow;
        fraction(&mut errors, "follow.min", f.min);
        fraction(&mut errors, "follow.max", f.max);
        if f.min > f.max {
            errors.push(format!(
                "follow.min ({}) must not exceed follow.max ({})",
                f.min, f.max
            ));
        }
        non_negative(&mut errors, "follow.gap_gain", f.gap_gain);
        non_negative(&mut errors, "follow.speed_gain", f.speed_gain);
        non_negative(&mut errors, "follow.snap_epsilon", f.snap_epsilon);

        positive(&mut errors, "autoscroll.edge_band", self.autoscroll.edge_band);
        non_negative(&mut errors, "autoscroll.max_step", self.autoscroll.max_step);

        errors
    }
}

fn positive(errors: &mut Vec<String>, name: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(format!("{name} must be > 0, got {value}"));
    }
}

fn non_negative(errors: &mut Vec<String>, name: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(format!("{name} must be >= 0, got {value}"));
    }
}

fn fraction(errors: &mut Vec<String>, name: &str, value: f64) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(format!("{name} must be in (0, 1], got {value}"));
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating a [`GestureConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(GestureConfig::default().validate().is_empty());
    }

    #[test]
    fn default_matches_shipped_tuning() {
        let c = GestureConfig::default();
        assert_eq!(c.swipe.hold, Duration::from_millis(600));
        assert_eq!(c.swipe.min_intent_distance, 40.0);
        assert_eq!(c.swipe.vertical_guard, 12.0);
        assert_eq!(c.swipe.fling_velocity, 0.8);
        assert_eq!(c.swipe.fling_expiry, Duration::from_millis(80));
        assert_eq!(c.drag.hold, Duration::from_millis(350));
        assert_eq!(c.drag.gate, 0.30);
        assert_eq!(c.drag.force, 0.70);
        assert_eq!(c.follow.min, 0.38);
        assert_eq!(c.follow.max, 0.86);
    }

    #[test]
    fn future_version_rejected() {
        let c = GestureConfig {
            version: CONFIG_VERSION + 1,
            ..GestureConfig::default()
        };
        let errors = c.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("version"));
    }

    #[test]
    fn follow_bounds_must_be_ordered() {
        let mut c = GestureConfig::default();
        c.follow.min = 0.9;
        c.follow.max = 0.5;
        let errors = c.validate();
        assert!(errors.iter().any(|e| e.contains("follow.min")));
    }

    #[test]
    fn nan_distances_rejected() {
        let mut c = GestureConfig::default();
        c.swipe.execute_distance = f64::NAN;
        c.drag.gate = 0.0;
        let errors = c.validate();
        assert!(errors.iter().any(|e| e.contains("swipe.execute_distance")));
        assert!(errors.iter().any(|e| e.contains("drag.gate")));
    }

    #[test]
    fn validated_wraps_errors() {
        let mut c = GestureConfig::default();
        c.swipe.max_overextend = 0.5;
        match c.validated() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors[0].contains("max_overextend"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn overextend_must_be_finite_and_at_least_one() {
        for bad in [f64::NAN, f64::INFINITY, 0.9] {
            let mut c = GestureConfig::default();
            c.swipe.max_overextend = bad;
            let errors = c.validate();
            assert!(
                errors.iter().any(|e| e.contains("max_overextend")),
                "{bad} accepted: {errors:?}"
            );
        }
        let mut c = GestureConfig::default();
        c.swipe.max_overextend = 1.0;
        assert!(c.validate().is_empty());
    }

    #[test]
    fn jitter_scales_with_dpr() {
        let d = DragConfig::default();
        assert_eq!(d.jitter_for_dpr(1.0), 8.0);
        assert_eq!(d.jitter_for_dpr(3.0), 18.0);
        assert_eq!(d.jitter_for_dpr(f64::NAN), 8.0);
    }

    #[test]
    fn reduced_motion_shortens_animations() {
        let c = GestureConfig {
            reduced_motion: true,
            ..GestureConfig::default()
        };
        assert_eq!(c.snap_duration(), Duration::from_millis(80));
        assert_eq!(c.execute_duration(), Duration::from_millis(80));
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn toml_partial_override() {
        let c = GestureConfig::from_toml_str(
            r#"
            [swipe]
            execute_distance = 96.0
            hold_ms = 500

            [drag]
            gate = 0.35
            "#,
        )
        .unwrap();
        assert_eq!(c.swipe.execute_distance, 96.0);
        assert_eq!(c.swipe.hold, Duration::from_millis(500));
        assert_eq!(c.drag.gate, 0.35);
        assert_eq!(c.drag.force, 0.70);
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn json_invalid_value_is_validation_error() {
        let err = GestureConfig::from_json_str(r#"{"follow": {"min": 2.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn toml_file_roundtrip() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "reduced_motion = true").unwrap();
        let c = GestureConfig::from_toml_file(file.path()).unwrap();
        assert!(c.reduced_motion);
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn missing_file_is_io_error() {
        let err = GestureConfig::from_json_file("/nonexistent/listgrip.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
