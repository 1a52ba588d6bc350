//! Configuration for gestures, camera bounds and viewport transitions
//!
//! Every struct deserializes with `#[serde(default)]`, so a JSON document only
//! needs to carry the fields it wants to change. Out-of-range values are
//! clamped by `sanitized()` rather than rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    DEFAULT_DECELERATION_RATE, DEFAULT_MAX_PITCH, DEFAULT_MAX_ZOOM, DEFAULT_MIN_PITCH,
    DEFAULT_MIN_ZOOM, DEFAULT_TRANSITION_MAX_DURATION, PINCH_ROTATION_OVERRIDE_SCALE,
    TAP_ZOOM_DURATION,
};
use crate::Result;

/// Axes along which a pan is allowed to move the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PanScrollingMode {
    Horizontal,
    Vertical,
    #[default]
    HorizontalAndVertical,
}

/// Gesture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureOptions {
    /// Single and two-finger pan
    pub scroll_enabled: bool,
    /// Pinch, double-tap, double-touch and quick zoom
    pub zoom_enabled: bool,
    pub rotate_enabled: bool,
    pub pitch_enabled: bool,
    pub scrolling_mode: PanScrollingMode,
    /// Kept for the host to read, the engine has no haptics of its own
    pub haptic_feedback_enabled: bool,
    /// Velocity multiplier applied once per millisecond after a pan is released
    pub deceleration_rate: f64,
    /// Below this zoom, rotation is limited to a small range and snaps back on release
    pub rotation_min_zoom: f64,
    /// Pinch scale that lifts the rotation limit
    pub rotation_override_scale: f64,
    /// Duration of double-tap and double-touch zoom animations, in seconds
    pub tap_zoom_duration: f64,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            scroll_enabled: true,
            zoom_enabled: true,
            rotate_enabled: true,
            pitch_enabled: true,
            scrolling_mode: PanScrollingMode::default(),
            haptic_feedback_enabled: true,
            deceleration_rate: DEFAULT_DECELERATION_RATE,
            rotation_min_zoom: 0.0,
            rotation_override_scale: PINCH_ROTATION_OVERRIDE_SCALE,
            tap_zoom_duration: TAP_ZOOM_DURATION,
        }
    }
}

impl GestureOptions {
    /// Clamps out-of-range values to usable ones
    pub fn sanitized(mut self) -> Self {
        if !(self.deceleration_rate > 0.0 && self.deceleration_rate < 1.0) {
            log::warn!(
                "deceleration rate {} outside (0, 1), using {}",
                self.deceleration_rate,
                DEFAULT_DECELERATION_RATE
            );
            self.deceleration_rate = DEFAULT_DECELERATION_RATE;
        }
        if !self.rotation_min_zoom.is_finite() || self.rotation_min_zoom < 0.0 {
            self.rotation_min_zoom = 0.0;
        }
        if !self.rotation_override_scale.is_finite() || self.rotation_override_scale < 1.0 {
            self.rotation_override_scale = PINCH_ROTATION_OVERRIDE_SCALE;
        }
        if !self.tap_zoom_duration.is_finite() || self.tap_zoom_duration < 0.0 {
            self.tap_zoom_duration = TAP_ZOOM_DURATION;
        }
        self
    }
}

/// Limits the host applies to every committed camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraBoundsOptions {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
}

impl Default for CameraBoundsOptions {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            min_pitch: DEFAULT_MIN_PITCH,
            max_pitch: DEFAULT_MAX_PITCH,
        }
    }
}

impl CameraBoundsOptions {
    /// Orders the ranges and keeps them inside the supported limits
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        let mut min_zoom = finite_or(self.min_zoom, DEFAULT_MIN_ZOOM).max(0.0);
        let mut max_zoom = finite_or(self.max_zoom, DEFAULT_MAX_ZOOM).max(0.0);
        if min_zoom > max_zoom {
            log::warn!("min zoom {} above max zoom {}, swapping", min_zoom, max_zoom);
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        let mut min_pitch = finite_or(self.min_pitch, DEFAULT_MIN_PITCH).clamp(0.0, DEFAULT_MAX_PITCH);
        let mut max_pitch = finite_or(self.max_pitch, DEFAULT_MAX_PITCH).clamp(0.0, DEFAULT_MAX_PITCH);
        if min_pitch > max_pitch {
            std::mem::swap(&mut min_pitch, &mut max_pitch);
        }
        Self {
            min_zoom,
            max_zoom,
            min_pitch,
            max_pitch,
        }
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn clamp_pitch(&self, pitch: f64) -> f64 {
        pitch.clamp(self.min_pitch, self.max_pitch)
    }
}

/// Behaviour of the viewport manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    /// Go idle as soon as a gesture begins
    pub transitions_to_idle_upon_user_interaction: bool,
    /// Duration of the ease applied to each new target once a state is reached
    pub follow_update_duration: f64,
    /// Upper bound for the default transition
    pub default_transition: DefaultTransitionOptions,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            transitions_to_idle_upon_user_interaction: true,
            follow_update_duration: 0.0,
            default_transition: DefaultTransitionOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTransitionOptions {
    /// Longest the whole transition may take, in seconds
    pub max_duration: f64,
}

impl Default for DefaultTransitionOptions {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_TRANSITION_MAX_DURATION,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub gestures: GestureOptions,
    pub camera_bounds: CameraBoundsOptions,
    pub viewport: ViewportOptions,
}

impl EngineConfig {
    /// Parses a JSON document, missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn sanitized(mut self) -> Self {
        self.gestures = self.gestures.sanitized();
        self.camera_bounds = self.camera_bounds.sanitized();
        let max = self.viewport.default_transition.max_duration;
        if !max.is_finite() || max < 0.0 {
            self.viewport.default_transition.max_duration = DEFAULT_TRANSITION_MAX_DURATION;
        }
        if !self.viewport.follow_update_duration.is_finite()
            || self.viewport.follow_update_duration < 0.0
        {
            self.viewport.follow_update_duration = 0.0;
        }
        self
    }
}
