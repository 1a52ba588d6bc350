//! Engine-wide constants for camera math, gesture recognition and transitions.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Size of the world in screen points at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 22.0;
pub const DEFAULT_MIN_PITCH: f64 = 0.0;
pub const DEFAULT_MAX_PITCH: f64 = 85.0;

/// A two-finger drag whose touch line is tilted more than this from
/// horizontal can never become a pitch gesture.
pub const PITCH_TILT_TOLERANCE_DEGREES: f64 = 45.0;

/// Degrees of pitch per point of vertical drag.
pub const PITCH_DEGREES_PER_POINT: f64 = 0.5;

/// Rotation limit applied below the rotation minimum zoom.
pub const ROTATION_CLAMP_DEGREES: f64 = 30.0;

/// Pinch scale above which the rotation clamp is lifted.
pub const PINCH_ROTATION_OVERRIDE_SCALE: f64 = 10.0;

/// Vertical drag distance that changes quick zoom by one level.
pub const QUICK_ZOOM_POINTS_PER_LEVEL: f64 = 75.0;

/// Per-millisecond velocity multiplier (matches a normal scroll view).
pub const DEFAULT_DECELERATION_RATE: f64 = 0.998;

/// Deceleration stops once velocity drops below this (points per second).
pub const DECELERATION_VELOCITY_EPSILON: f64 = 20.0;

/// Pan release velocity needed to start a deceleration (points per second).
pub const DECELERATION_MIN_VELOCITY: f64 = 100.0;

// Recognizer slops, in screen points unless noted.
pub const PAN_SLOP: f64 = 10.0;
pub const PITCH_SLOP: f64 = 5.0;
pub const PINCH_SLOP: f64 = 8.0;
pub const ROTATE_SLOP_DEGREES: f64 = 5.0;
pub const TAP_SLOP: f64 = 10.0;
pub const DOUBLE_TAP_SLOP: f64 = 40.0;

/// Longest press still counted as a tap, in seconds.
pub const TAP_MAX_DURATION: f64 = 0.35;

/// Longest pause between the taps of a multi-tap, in seconds.
pub const DOUBLE_TAP_INTERVAL: f64 = 0.3;

/// Duration of the double-tap and double-touch zoom animations.
pub const TAP_ZOOM_DURATION: f64 = 0.3;

/// Duration of the bearing snap after a rotation below the rotation zoom.
pub const BEARING_SNAP_DURATION: f64 = 0.3;

/// Curvature of the fly-to path.
pub const FLY_TO_RHO: f64 = 1.42;

/// Default fly-to speed, in screenfuls per second along the path.
pub const FLY_TO_DEFAULT_SPEED: f64 = 1.2;

// Default viewport transition timings.
pub const DEFAULT_TRANSITION_MAX_DURATION: f64 = 3.5;
pub const TRANSITION_CENTER_SPEED: f64 = 500.0;
pub const TRANSITION_ZOOM_SPEED: f64 = 2.2;
pub const TRANSITION_MAX_COMPONENT_DURATION: f64 = 3.0;
pub const TRANSITION_BEARING_DURATION: f64 = 1.8;
pub const TRANSITION_PITCH_DURATION: f64 = 1.2;
pub const TRANSITION_PITCH_TRAILING: f64 = 0.1;
pub const TRANSITION_ZOOM_OUT_CENTER_DURATION: f64 = 1.0;
