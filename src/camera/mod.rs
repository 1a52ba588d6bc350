//! Camera state, interpolation and the animator runner

pub mod animator;
pub mod fly_to;
pub mod interpolation;
pub mod runner;
pub mod state;
pub mod timing;
pub mod transition;

pub use animator::{AnimatingPosition, AnimationOwner, AnimationType, AnimatorState, CameraAnimator};
pub use runner::{AnimatorId, AnimatorStatus, AnimatorStatusPayload, CameraAnimatorsRunner};
pub use state::{CameraOptions, CameraState};
pub use timing::TimingCurve;
pub use transition::CameraTransition;
