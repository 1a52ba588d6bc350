//! Camera animators and their lifecycle
//!
//! An animator is `Inactive` until started, `Active` while the runner advances
//! it, optionally `Paused`, and finally `Stopped`. Reaching `Stopped` runs the
//! completion handlers exactly once, with [`AnimatingPosition::End`] if the
//! animation ran to the end and [`AnimatingPosition::Current`] otherwise.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use instant::Instant;

use crate::camera::interpolation::CameraOptionsInterpolator;
use crate::camera::state::{CameraOptions, CameraState};
use crate::camera::timing::TimingCurve;
use crate::camera::transition::CameraTransition;
use crate::core::constants::DECELERATION_VELOCITY_EPSILON;
use crate::core::geo::Point;
use crate::core::map::CameraHost;

/// Tag naming the subsystem that created an animator, compared by equality only
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnimationOwner(Cow<'static, str>);

impl AnimationOwner {
    pub const UNSPECIFIED: AnimationOwner = AnimationOwner(Cow::Borrowed("unspecified"));
    pub const PROGRAMMATIC: AnimationOwner = AnimationOwner(Cow::Borrowed("programmatic"));
    pub const VIEWPORT: AnimationOwner = AnimationOwner(Cow::Borrowed("viewport"));
    pub const GESTURE_PAN: AnimationOwner = AnimationOwner(Cow::Borrowed("gesture.pan"));
    pub const GESTURE_PINCH: AnimationOwner = AnimationOwner(Cow::Borrowed("gesture.pinch"));
    pub const GESTURE_ROTATE: AnimationOwner = AnimationOwner(Cow::Borrowed("gesture.rotate"));
    pub const GESTURE_PITCH: AnimationOwner = AnimationOwner(Cow::Borrowed("gesture.pitch"));
    pub const GESTURE_DOUBLE_TAP_ZOOM_IN: AnimationOwner =
        AnimationOwner(Cow::Borrowed("gesture.double-tap-zoom-in"));
    pub const GESTURE_DOUBLE_TOUCH_ZOOM_OUT: AnimationOwner =
        AnimationOwner(Cow::Borrowed("gesture.double-touch-zoom-out"));
    pub const GESTURE_QUICK_ZOOM: AnimationOwner = AnimationOwner(Cow::Borrowed("gesture.quick-zoom"));
    pub const GESTURE_DECELERATION: AnimationOwner =
        AnimationOwner(Cow::Borrowed("gesture.deceleration"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnimationOwner {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl fmt::Display for AnimationOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of camera change, used only to cancel selectively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationType {
    Pan,
    Zoom,
    Rotate,
    Pitch,
    Fly,
    Ease,
    Deceleration,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Inactive,
    Active,
    Paused,
    Stopped,
}

/// Where the camera was left when an animator stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatingPosition {
    /// The animation ran to its end
    End,
    /// The animation was interrupted
    Current,
}

impl AnimatingPosition {
    pub fn did_finish(&self) -> bool {
        *self == AnimatingPosition::End
    }
}

/// Runs once when the animator stops
pub type AnimationCompletion = Box<dyn FnOnce(AnimatingPosition) + Send>;

/// Changes the working camera of a transition
pub type CameraMutation = Box<dyn FnMut(&mut CameraTransition) + Send>;

/// Receives the simulated location before and after a deceleration step
pub type DecelerationUpdate = Box<dyn FnMut(Point, Point, &mut CameraTransition) + Send>;

enum Driver {
    /// Runs the mutation with the eased fraction every tick
    Basic(CameraMutation),
    /// Interpolates from the start camera to a target that may be replaced
    Simple(CameraOptions),
    /// Simulates a point slowing down from an initial velocity
    Deceleration {
        location: Point,
        velocity: Point,
        factor: f64,
        on_update: DecelerationUpdate,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Running,
    Finished,
}

/// One scheduled camera animation
pub struct CameraAnimator {
    owner: AnimationOwner,
    animation_type: AnimationType,
    state: AnimatorState,
    driver: Driver,
    /// Seconds, ignored by decelerations
    duration: f64,
    delay: f64,
    curve: TimingCurve,
    elapsed: f64,
    last_tick: Option<Instant>,
    fraction_complete: f64,
    from: Option<CameraState>,
    completions: Vec<AnimationCompletion>,
}

impl CameraAnimator {
    fn with_driver(driver: Driver, duration: f64, curve: TimingCurve) -> Self {
        Self {
            owner: AnimationOwner::UNSPECIFIED,
            animation_type: AnimationType::Unspecified,
            state: AnimatorState::Inactive,
            driver,
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            delay: 0.0,
            curve,
            elapsed: 0.0,
            last_tick: None,
            fraction_complete: 0.0,
            from: None,
            completions: Vec::new(),
        }
    }

    /// Animator running `animation` every tick for `duration` seconds
    pub fn basic<F>(duration: f64, curve: TimingCurve, animation: F) -> Self
    where
        F: FnMut(&mut CameraTransition) + Send + 'static,
    {
        Self::with_driver(Driver::Basic(Box::new(animation)), duration, curve)
    }

    /// Animator moving toward `to`; the target can be replaced while running
    pub fn simple(to: CameraOptions, duration: f64, curve: TimingCurve) -> Self {
        Self::with_driver(Driver::Simple(to), duration, curve)
    }

    /// Animator decaying `velocity` (points per second) by `factor` every millisecond
    pub fn deceleration<F>(location: Point, velocity: Point, factor: f64, on_update: F) -> Self
    where
        F: FnMut(Point, Point, &mut CameraTransition) + Send + 'static,
    {
        let factor = if factor > 0.0 && factor < 1.0 {
            factor
        } else {
            log::warn!("deceleration factor {} outside (0, 1), velocity drops to zero", factor);
            0.0
        };
        let mut animator = Self::with_driver(
            Driver::Deceleration {
                location,
                velocity,
                factor,
                on_update: Box::new(on_update),
            },
            0.0,
            TimingCurve::Linear,
        );
        animator.animation_type = AnimationType::Deceleration;
        animator
    }

    pub fn with_owner(mut self, owner: AnimationOwner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_type(mut self, animation_type: AnimationType) -> Self {
        self.animation_type = animation_type;
        self
    }

    /// Seconds to wait after starting before the camera moves
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        self
    }

    pub fn with_completion<F>(mut self, completion: F) -> Self
    where
        F: FnOnce(AnimatingPosition) + Send + 'static,
    {
        self.add_completion(completion);
        self
    }

    /// Adds a completion handler; on a stopped animator it is dropped
    pub fn add_completion<F>(&mut self, completion: F)
    where
        F: FnOnce(AnimatingPosition) + Send + 'static,
    {
        if self.state == AnimatorState::Stopped {
            log::debug!("completion added to stopped animator owned by {}", self.owner);
            return;
        }
        self.completions.push(Box::new(completion));
    }

    pub fn owner(&self) -> &AnimationOwner {
        &self.owner
    }

    pub fn animation_type(&self) -> AnimationType {
        self.animation_type
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Share of the duration elapsed, before the timing curve
    pub fn fraction_complete(&self) -> f64 {
        self.fraction_complete
    }

    /// Target of a retargetable animator
    pub fn target(&self) -> Option<&CameraOptions> {
        match &self.driver {
            Driver::Simple(to) => Some(to),
            _ => None,
        }
    }

    /// Starts or resumes; no-op when active or stopped
    pub fn start(&mut self) -> bool {
        match self.state {
            AnimatorState::Inactive | AnimatorState::Paused => {
                self.state = AnimatorState::Active;
                self.last_tick = None;
                true
            }
            AnimatorState::Active | AnimatorState::Stopped => false,
        }
    }

    /// Pauses an active animator, keeping its progress
    pub fn pause(&mut self) -> bool {
        if self.state != AnimatorState::Active {
            return false;
        }
        self.state = AnimatorState::Paused;
        self.last_tick = None;
        true
    }

    /// Stops the animator and runs its completions; no-op once stopped
    pub fn stop(&mut self) -> bool {
        if self.state == AnimatorState::Stopped {
            return false;
        }
        let position = if self.fraction_complete >= 1.0 {
            AnimatingPosition::End
        } else {
            AnimatingPosition::Current
        };
        self.finish(position);
        true
    }

    /// Replaces the target of a retargetable animator, progress is kept
    pub fn retarget(&mut self, to: CameraOptions) -> bool {
        if self.state == AnimatorState::Stopped {
            return false;
        }
        match &mut self.driver {
            Driver::Simple(target) => {
                if target.fields() != to.fields() {
                    log::warn!(
                        "retargeting animator owned by {} with a different set of camera fields",
                        self.owner
                    );
                }
                *target = to;
                true
            }
            _ => false,
        }
    }

    fn finish(&mut self, position: AnimatingPosition) {
        self.state = AnimatorState::Stopped;
        for completion in self.completions.drain(..) {
            completion(position);
        }
    }

    /// Advances an active animator to `now` and commits its camera change
    pub(crate) fn tick(&mut self, host: &mut dyn CameraHost, now: Instant) -> TickOutcome {
        if self.state != AnimatorState::Active {
            return TickOutcome::Running;
        }
        let dt = match self.last_tick {
            Some(previous) if now > previous => now - previous,
            _ => Duration::ZERO,
        };
        self.last_tick = Some(now);
        self.elapsed += dt.as_secs_f64();

        let current = host.camera_state();
        let size = host.size();

        if let Driver::Deceleration {
            location,
            velocity,
            factor,
            on_update,
        } = &mut self.driver
        {
            let from = *self.from.get_or_insert(current);
            let seconds = dt.as_secs_f64();
            if seconds > 0.0 {
                let previous = *location;
                *location = location.add(&velocity.multiply(seconds));
                *velocity = velocity.multiply(factor.powf(seconds * 1000.0));
                let mut transition = CameraTransition::new(from, current, 0.0, size);
                on_update(previous, *location, &mut transition);
                commit(host, &transition);
            }
            if velocity.magnitude() < DECELERATION_VELOCITY_EPSILON {
                self.fraction_complete = 1.0;
                return TickOutcome::Finished;
            }
            return TickOutcome::Running;
        }

        let active_time = self.elapsed - self.delay;
        if active_time < 0.0 {
            return TickOutcome::Running;
        }
        let from = *self.from.get_or_insert(current);
        let fraction = if self.duration <= 0.0 {
            1.0
        } else {
            (active_time / self.duration).min(1.0)
        };
        self.fraction_complete = fraction;

        let mut transition = CameraTransition::new(from, current, self.curve.apply(fraction), size);
        match &mut self.driver {
            Driver::Basic(animation) => animation(&mut transition),
            Driver::Simple(to) => {
                let camera = CameraOptionsInterpolator::interpolate(
                    &CameraOptions::from(&from),
                    to,
                    transition.fraction_complete,
                );
                transition.apply(&camera);
            }
            Driver::Deceleration { .. } => {}
        }
        commit(host, &transition);

        if fraction >= 1.0 {
            TickOutcome::Finished
        } else {
            TickOutcome::Running
        }
    }

    /// Called by the runner after the final tick has been committed
    pub(crate) fn complete(&mut self) {
        self.finish(AnimatingPosition::End);
    }

    /// Current velocity of a deceleration
    pub fn velocity(&self) -> Option<Point> {
        match &self.driver {
            Driver::Deceleration { velocity, .. } => Some(*velocity),
            _ => None,
        }
    }
}

fn commit(host: &mut dyn CameraHost, transition: &CameraTransition) {
    let changes = transition.changes();
    if !changes.is_empty() {
        host.set_camera(&changes);
    }
}

impl fmt::Debug for CameraAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraAnimator")
            .field("owner", &self.owner)
            .field("animation_type", &self.animation_type)
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("fraction_complete", &self.fraction_complete)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::core::map::HeadlessMap;
    use std::sync::{Arc, Mutex};

    fn map() -> HeadlessMap {
        HeadlessMap::new(CameraState::new(LatLng::new(0.0, 0.0), 2.0), Point::new(400.0, 400.0))
    }

    fn recorder() -> (Arc<Mutex<Vec<AnimatingPosition>>>, impl FnOnce(AnimatingPosition) + Send) {
        let positions = Arc::new(Mutex::new(Vec::new()));
        let sink = positions.clone();
        (positions, move |p| sink.lock().unwrap().push(p))
    }

    #[test]
    fn test_redundant_lifecycle_calls_are_noops() {
        let mut animator = CameraAnimator::simple(CameraOptions::new().with_zoom(3.0), 1.0, TimingCurve::Linear);
        assert!(animator.start());
        assert!(!animator.start());
        assert!(animator.pause());
        assert!(!animator.pause());
        assert!(animator.start());
        assert!(animator.stop());
        assert!(!animator.stop());
        assert!(!animator.start());
        assert_eq!(animator.state(), AnimatorState::Stopped);
    }

    #[test]
    fn test_stop_before_start_reports_current() {
        let (positions, completion) = recorder();
        let mut animator = CameraAnimator::simple(CameraOptions::new().with_zoom(3.0), 1.0, TimingCurve::Linear)
            .with_completion(completion);
        animator.stop();
        assert_eq!(*positions.lock().unwrap(), vec![AnimatingPosition::Current]);
    }

    #[test]
    fn test_pause_preserves_progress() {
        let mut map = map();
        let t0 = Instant::now();
        let mut animator = CameraAnimator::simple(CameraOptions::new().with_zoom(4.0), 1.0, TimingCurve::Linear);
        animator.start();
        animator.tick(&mut map, t0);
        animator.tick(&mut map, t0 + Duration::from_millis(250));
        assert!((animator.fraction_complete() - 0.25).abs() < 1e-9);

        animator.pause();
        animator.tick(&mut map, t0 + Duration::from_millis(900));
        assert!((animator.fraction_complete() - 0.25).abs() < 1e-9);

        animator.start();
        animator.tick(&mut map, t0 + Duration::from_millis(1000));
        animator.tick(&mut map, t0 + Duration::from_millis(1250));
        assert!((animator.fraction_complete() - 0.5).abs() < 1e-9);
        assert!((map.camera_state().zoom - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_delay_holds_the_camera() {
        let mut map = map();
        let t0 = Instant::now();
        let mut animator = CameraAnimator::simple(CameraOptions::new().with_zoom(4.0), 1.0, TimingCurve::Linear)
            .with_delay(0.5);
        animator.start();
        animator.tick(&mut map, t0);
        animator.tick(&mut map, t0 + Duration::from_millis(400));
        assert_eq!(map.camera_state().zoom, 2.0);
        assert_eq!(animator.fraction_complete(), 0.0);
        animator.tick(&mut map, t0 + Duration::from_millis(1000));
        assert!((map.camera_state().zoom - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let mut map = map();
        let mut animator = CameraAnimator::simple(CameraOptions::new().with_zoom(7.0), 0.0, TimingCurve::EaseInOut);
        animator.start();
        assert_eq!(animator.tick(&mut map, Instant::now()), TickOutcome::Finished);
        assert_eq!(map.camera_state().zoom, 7.0);
    }

    #[test]
    fn test_retarget_keeps_progress() {
        let mut map = map();
        let t0 = Instant::now();
        let mut animator = CameraAnimator::simple(CameraOptions::new().with_zoom(4.0), 1.0, TimingCurve::Linear);
        animator.start();
        animator.tick(&mut map, t0);
        animator.tick(&mut map, t0 + Duration::from_millis(500));
        assert!(animator.retarget(CameraOptions::new().with_zoom(6.0)));
        animator.tick(&mut map, t0 + Duration::from_millis(750));
        assert!((animator.fraction_complete() - 0.75).abs() < 1e-9);
        assert!((map.camera_state().zoom - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_basic_animation_receives_eased_fraction() {
        let mut map = map();
        let t0 = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut animator = CameraAnimator::basic(1.0, TimingCurve::EaseIn, move |transition| {
            sink.lock().unwrap().push(transition.fraction_complete);
        });
        animator.start();
        animator.tick(&mut map, t0);
        animator.tick(&mut map, t0 + Duration::from_millis(500));
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], 0.0);
        assert!(seen[1] < 0.5);
    }
}
