//! Per-gesture camera math
//!
//! Live gestures write the camera straight to the host; only the follow-up
//! motion after a gesture (deceleration, bearing snap, tap zoom) goes through
//! the animator runner.

use crossbeam_channel::Sender;

use crate::camera::animator::{AnimationOwner, AnimationType, CameraAnimator};
use crate::camera::runner::CameraAnimatorsRunner;
use crate::camera::state::CameraOptions;
use crate::camera::timing::TimingCurve;
use crate::core::config::{GestureOptions, PanScrollingMode};
use crate::core::constants::{
    BEARING_SNAP_DURATION, DECELERATION_MIN_VELOCITY, PITCH_DEGREES_PER_POINT,
    QUICK_ZOOM_POINTS_PER_LEVEL, ROTATION_CLAMP_DEGREES,
};
use crate::core::geo::Point;
use crate::core::map::CameraHost;
use crate::input::gestures::GestureType;
use crate::input::recognizers::{
    PanRecognizer, PinchRecognizer, PitchRecognizer, QuickZoomRecognizer, Recognize,
    RecognizerState, RotateRecognizer, TapRecognizer,
};

/// Everything a handler may touch while reacting to its recognizer
pub(crate) struct HandlerContext<'a> {
    pub host: &'a mut dyn CameraHost,
    pub runner: &'a mut CameraAnimatorsRunner,
    pub options: &'a GestureOptions,
    /// Scale of a simultaneous pinch, 1.0 when there is none
    pub pinch_scale: f64,
    pub animation_ended: &'a Sender<GestureType>,
}

impl<'a> HandlerContext<'a> {
    fn notify_on_completion(&self, gesture: GestureType, animator: CameraAnimator) -> CameraAnimator {
        let sender = self.animation_ended.clone();
        animator.with_completion(move |_| {
            // the manager may already be gone
            let _ = sender.send(gesture);
        })
    }

    fn run(&mut self, animator: CameraAnimator) {
        let id = self.runner.add(animator);
        self.runner.start(id);
    }
}

/// Zeroes the axes the scrolling mode does not allow
pub fn filter_scroll(mode: PanScrollingMode, delta: Point) -> Point {
    match mode {
        PanScrollingMode::Horizontal => Point::new(delta.x, 0.0),
        PanScrollingMode::Vertical => Point::new(0.0, delta.y),
        PanScrollingMode::HorizontalAndVertical => delta,
    }
}

/// Screen point a two-finger zoom or rotation pivots around
///
/// Follows the fingers only when scrolling is enabled. Otherwise it stays at
/// the midpoint where the gesture began and the map never translates.
pub fn two_finger_pivot(scroll_enabled: bool, began: Point, current: Point) -> Point {
    if scroll_enabled {
        current
    } else {
        began
    }
}

/// Bearing for a rotation gesture, limited when rotation is restricted
pub fn rotated_bearing(
    initial_bearing: f64,
    rotation: f64,
    restricted: bool,
    pinch_scale: f64,
    override_scale: f64,
) -> f64 {
    let rotation = if restricted && pinch_scale <= override_scale {
        rotation.clamp(-ROTATION_CLAMP_DEGREES, ROTATION_CLAMP_DEGREES)
    } else {
        rotation
    };
    initial_bearing - rotation
}

#[derive(Debug, Clone, Default)]
pub struct PanHandler {
    recognizer: PanRecognizer,
}

impl PanHandler {
    fn changed(&mut self, ctx: &mut HandlerContext<'_>) {
        let Some((previous, last)) = self.recognizer.translation() else {
            return;
        };
        let delta = filter_scroll(ctx.options.scrolling_mode, last.subtract(&previous));
        if delta.magnitude() == 0.0 {
            return;
        }
        let drag = ctx.host.projection().drag(&previous, &previous.add(&delta));
        ctx.host.set_camera(&drag);
    }

    fn ended(&mut self, ctx: &mut HandlerContext<'_>) -> bool {
        if self.recognizer.state() == RecognizerState::Cancelled {
            return false;
        }
        let velocity = filter_scroll(ctx.options.scrolling_mode, self.recognizer.velocity());
        let Some(location) = self.recognizer.location() else {
            return false;
        };
        if velocity.magnitude() < DECELERATION_MIN_VELOCITY {
            return false;
        }
        log::debug!(
            "pan released at {:.0} pt/s, decelerating",
            velocity.magnitude()
        );
        let animator = CameraAnimator::deceleration(
            location,
            velocity,
            ctx.options.deceleration_rate,
            |from, to, transition| {
                let drag = transition.projection().drag(&from, &to);
                transition.apply(&drag);
            },
        )
        .with_owner(AnimationOwner::GESTURE_DECELERATION);
        let animator = ctx.notify_on_completion(GestureType::Pan, animator);
        ctx.run(animator);
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct PinchHandler {
    recognizer: PinchRecognizer,
    initial_zoom: f64,
    initial_midpoint: Point,
}

impl PinchHandler {
    pub fn scale(&self) -> f64 {
        self.recognizer.scale()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RotateHandler {
    recognizer: RotateRecognizer,
    initial_bearing: f64,
    initial_midpoint: Point,
}

impl RotateHandler {
    fn restricted(ctx: &HandlerContext<'_>) -> bool {
        ctx.host.camera_state().zoom < ctx.options.rotation_min_zoom
    }

    fn changed(&mut self, ctx: &mut HandlerContext<'_>) {
        let bearing = rotated_bearing(
            self.initial_bearing,
            self.recognizer.rotation(),
            Self::restricted(ctx),
            ctx.pinch_scale,
            ctx.options.rotation_override_scale,
        );
        let pivot = two_finger_pivot(
            ctx.options.scroll_enabled,
            self.initial_midpoint,
            self.recognizer.midpoint(),
        );
        ctx.host
            .set_camera(&CameraOptions::new().with_bearing(bearing).with_anchor(pivot));
    }

    fn ended(&mut self, ctx: &mut HandlerContext<'_>) -> bool {
        let bearing = ctx.host.camera_state().bearing;
        if !Self::restricted(ctx) || bearing == 0.0 {
            return false;
        }
        log::debug!("rotation not allowed at this zoom, snapping bearing back to north");
        let animator = CameraAnimator::simple(
            CameraOptions::new().with_bearing(0.0),
            BEARING_SNAP_DURATION,
            TimingCurve::EaseOut,
        )
        .with_owner(AnimationOwner::GESTURE_ROTATE)
        .with_type(AnimationType::Rotate);
        let animator = ctx.notify_on_completion(GestureType::Rotate, animator);
        ctx.run(animator);
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct PitchHandler {
    recognizer: PitchRecognizer,
    initial_pitch: f64,
}

#[derive(Debug, Clone, Default)]
pub struct QuickZoomHandler {
    recognizer: QuickZoomRecognizer,
    initial_zoom: f64,
}

/// Animated zoom by a fixed step at the tap location
#[derive(Debug, Clone)]
pub struct TapZoomHandler {
    recognizer: TapRecognizer,
    zoom_delta: f64,
    owner: AnimationOwner,
}

impl TapZoomHandler {
    pub fn double_tap_zoom_in() -> Self {
        Self {
            recognizer: TapRecognizer::new(2, 1),
            zoom_delta: 1.0,
            owner: AnimationOwner::GESTURE_DOUBLE_TAP_ZOOM_IN,
        }
    }

    pub fn double_touch_zoom_out() -> Self {
        Self {
            recognizer: TapRecognizer::new(1, 2),
            zoom_delta: -1.0,
            owner: AnimationOwner::GESTURE_DOUBLE_TOUCH_ZOOM_OUT,
        }
    }

    fn fire(&mut self, gesture: GestureType, ctx: &mut HandlerContext<'_>) -> bool {
        let bounds = ctx.host.camera_bounds();
        let zoom = bounds.clamp_zoom(ctx.host.camera_state().zoom + self.zoom_delta);
        let target = CameraOptions::new()
            .with_zoom(zoom)
            .with_anchor(self.recognizer.location());
        let animator = CameraAnimator::simple(target, ctx.options.tap_zoom_duration, TimingCurve::EaseOut)
            .with_owner(self.owner.clone())
            .with_type(AnimationType::Zoom);
        let animator = ctx.notify_on_completion(gesture, animator);
        ctx.run(animator);
        true
    }
}

/// Recognizer plus the camera math it drives, one per gesture type
#[derive(Debug, Clone)]
pub enum GestureHandler {
    Pan(PanHandler),
    Pinch(PinchHandler),
    Rotate(RotateHandler),
    Pitch(PitchHandler),
    QuickZoom(QuickZoomHandler),
    TapZoom(TapZoomHandler),
}

impl GestureHandler {
    /// Handler for `gesture`, `None` for tap shapes without camera behavior
    pub fn for_gesture(gesture: GestureType) -> Option<Self> {
        match gesture {
            GestureType::Pan => Some(GestureHandler::Pan(PanHandler::default())),
            GestureType::Pinch => Some(GestureHandler::Pinch(PinchHandler::default())),
            GestureType::Rotate => Some(GestureHandler::Rotate(RotateHandler::default())),
            GestureType::Pitch => Some(GestureHandler::Pitch(PitchHandler::default())),
            GestureType::QuickZoom => Some(GestureHandler::QuickZoom(QuickZoomHandler::default())),
            GestureType::DOUBLE_TAP => Some(GestureHandler::TapZoom(TapZoomHandler::double_tap_zoom_in())),
            GestureType::DOUBLE_TOUCH => {
                Some(GestureHandler::TapZoom(TapZoomHandler::double_touch_zoom_out()))
            }
            GestureType::Tap { .. } => None,
        }
    }

    pub fn recognizer(&self) -> &dyn Recognize {
        match self {
            GestureHandler::Pan(h) => &h.recognizer,
            GestureHandler::Pinch(h) => &h.recognizer,
            GestureHandler::Rotate(h) => &h.recognizer,
            GestureHandler::Pitch(h) => &h.recognizer,
            GestureHandler::QuickZoom(h) => &h.recognizer,
            GestureHandler::TapZoom(h) => &h.recognizer,
        }
    }

    pub fn recognizer_mut(&mut self) -> &mut dyn Recognize {
        match self {
            GestureHandler::Pan(h) => &mut h.recognizer,
            GestureHandler::Pinch(h) => &mut h.recognizer,
            GestureHandler::Rotate(h) => &mut h.recognizer,
            GestureHandler::Pitch(h) => &mut h.recognizer,
            GestureHandler::QuickZoom(h) => &mut h.recognizer,
            GestureHandler::TapZoom(h) => &mut h.recognizer,
        }
    }

    /// Whether the gesture fires once instead of tracking touches
    pub fn is_discrete(&self) -> bool {
        matches!(self, GestureHandler::TapZoom(_))
    }

    /// Records the camera the gesture starts from
    pub(crate) fn began(&mut self, ctx: &mut HandlerContext<'_>) {
        let camera = ctx.host.camera_state();
        match self {
            GestureHandler::Pinch(h) => {
                h.initial_zoom = camera.zoom;
                h.initial_midpoint = h.recognizer.midpoint();
            }
            GestureHandler::Rotate(h) => {
                h.initial_bearing = camera.bearing;
                h.initial_midpoint = h.recognizer.midpoint();
            }
            GestureHandler::Pitch(h) => h.initial_pitch = camera.pitch,
            GestureHandler::QuickZoom(h) => h.initial_zoom = camera.zoom,
            GestureHandler::Pan(_) | GestureHandler::TapZoom(_) => {}
        }
    }

    pub(crate) fn changed(&mut self, ctx: &mut HandlerContext<'_>) {
        match self {
            GestureHandler::Pan(h) => h.changed(ctx),
            GestureHandler::Pinch(h) => {
                let zoom = h.initial_zoom + h.recognizer.scale().max(f64::EPSILON).log2();
                let pivot = two_finger_pivot(
                    ctx.options.scroll_enabled,
                    h.initial_midpoint,
                    h.recognizer.midpoint(),
                );
                ctx.host
                    .set_camera(&CameraOptions::new().with_zoom(zoom).with_anchor(pivot));
            }
            GestureHandler::Rotate(h) => h.changed(ctx),
            GestureHandler::Pitch(h) => {
                let pitch = h.initial_pitch - h.recognizer.translation_y() * PITCH_DEGREES_PER_POINT;
                ctx.host.set_camera(&CameraOptions::new().with_pitch(pitch));
            }
            GestureHandler::QuickZoom(h) => {
                let min_zoom = ctx.host.camera_bounds().min_zoom;
                let zoom = (h.initial_zoom + h.recognizer.translation_y() / QUICK_ZOOM_POINTS_PER_LEVEL)
                    .max(min_zoom);
                ctx.host.set_camera(
                    &CameraOptions::new()
                        .with_zoom(zoom)
                        .with_anchor(h.recognizer.anchor()),
                );
            }
            GestureHandler::TapZoom(_) => {}
        }
    }

    /// Returns whether an animation follows the gesture
    pub(crate) fn ended(&mut self, gesture: GestureType, ctx: &mut HandlerContext<'_>) -> bool {
        match self {
            GestureHandler::Pan(h) => h.ended(ctx),
            GestureHandler::Rotate(h) => h.ended(ctx),
            GestureHandler::TapZoom(h) => h.fire(gesture, ctx),
            GestureHandler::Pinch(_) | GestureHandler::Pitch(_) | GestureHandler::QuickZoom(_) => false,
        }
    }

    /// Pinch scale if this is a pinch handler
    pub fn pinch_scale(&self) -> Option<f64> {
        match self {
            GestureHandler::Pinch(h) => Some(h.scale()),
            _ => None,
        }
    }
}
