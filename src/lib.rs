//! # mapmotion
//!
//! Camera animation, gesture arbitration and viewport transitions for
//! interactive maps.
//!
//! The crate never renders and never reads the clock on its own. A host map
//! implements [`CameraHost`], forwards touches to [`CameraEngine::handle_touch`]
//! and calls [`CameraEngine::update`] once per display refresh.

pub mod camera;
pub mod core;
pub mod engine;
pub mod input;
pub mod prelude;
pub mod viewport;
pub use crate::core::constants;

// Re-export public API
pub use camera::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorId, CameraAnimator,
    CameraAnimatorsRunner, CameraOptions, CameraState, CameraTransition, TimingCurve,
};

pub use core::{
    config::{EngineConfig, GestureOptions, PanScrollingMode, ViewportOptions},
    geo::{EdgeInsets, LatLng, Point},
    map::{CameraHost, HeadlessMap},
};

pub use engine::{AnimationHandle, CameraEngine};

pub use input::{GestureEvent, GestureManager, GestureType, TouchEvent, TouchPhase, TouchPoint};

pub use viewport::{
    FollowTargetOptions, Location, OverviewOptions, Viewport, ViewportAnimation, ViewportManager,
    ViewportState, ViewportStatus,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MotionError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Overview geometry has no coordinates")]
    EmptyGeometry,
}

/// Error type alias for convenience
pub type Error = MotionError;

/// Installs `env_logger`; later calls are no-ops
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::try_init();
}
