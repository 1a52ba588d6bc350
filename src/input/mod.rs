//! Touch input, gesture recognition and per-gesture camera math

pub mod events;
pub mod gestures;
pub mod handlers;
pub mod recognizers;

pub use events::{TouchEvent, TouchPhase, TouchPoint, TouchSet};
pub use gestures::{GestureEvent, GestureManager, GestureType};
pub use recognizers::{FailRequirement, RecognizerState};
