//! Prelude module for common mapmotion types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapmotion::prelude::*;`

pub use crate::core::{
    config::{
        CameraBoundsOptions, DefaultTransitionOptions, EngineConfig, GestureOptions,
        PanScrollingMode, ViewportOptions,
    },
    geo::{EdgeInsets, LatLng, LatLngBounds, Point},
    map::{CameraHost, HeadlessMap},
    projection::Projection,
};

pub use crate::camera::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorId, AnimatorState, AnimatorStatus,
    CameraAnimator, CameraAnimatorsRunner, CameraOptions, CameraState, CameraTransition,
    TimingCurve,
};

pub use crate::input::{
    FailRequirement, GestureEvent, GestureManager, GestureType, RecognizerState, TouchEvent,
    TouchPhase, TouchPoint, TouchSet,
};

pub use crate::viewport::{
    FollowBearing, FollowTargetOptions, Location, LocationHub, OverviewOptions, TargetStream,
    Viewport, ViewportAnimation, ViewportManager, ViewportState, ViewportStatus,
    ViewportStatusChangeReason,
};

pub use crate::engine::{AnimationHandle, CameraEngine};

pub use crate::{Error as MotionError, Result};

pub use std::time::Duration;

pub use instant::Instant;
