//! Declarative viewports and the transitions between them

pub mod manager;
pub mod state;
pub mod transition;

pub use manager::{Viewport, ViewportManager, ViewportStatus, ViewportStatusChangeReason};
pub use state::{
    FollowBearing, FollowTargetOptions, Location, LocationHub, OverviewOptions, TargetStream,
    ViewportState,
};
pub use transition::ViewportAnimation;
