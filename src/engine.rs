//! The camera engine
//!
//! [`CameraEngine`] ties the pieces together around one [`CameraHost`]: the
//! animator runner, the gesture manager, the viewport manager and the
//! location hub that feeds follow-target viewports. The host drives it with
//! one [`CameraEngine::update`] per display refresh and forwards touches to
//! [`CameraEngine::handle_touch`].

use instant::Instant;

use crate::camera::animator::{AnimatingPosition, AnimationOwner, AnimationType, CameraAnimator};
use crate::camera::fly_to::FlyToInterpolator;
use crate::camera::runner::{AnimatorId, CameraAnimatorsRunner};
use crate::camera::state::{CameraOptions, CameraState};
use crate::camera::timing::TimingCurve;
use crate::camera::transition::CameraTransition;
use crate::core::config::{EngineConfig, GestureOptions};
use crate::core::geo::Point;
use crate::core::map::CameraHost;
use crate::input::events::TouchEvent;
use crate::input::gestures::{GestureEvent, GestureManager};
use crate::viewport::manager::{TransitionCompletion, Viewport, ViewportManager, ViewportStatus};
use crate::viewport::state::{Location, LocationHub, ViewportState};
use crate::viewport::transition::ViewportAnimation;
use crate::Result;

/// Handle to an animation started through the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(AnimatorId);

impl AnimationHandle {
    pub fn id(&self) -> AnimatorId {
        self.0
    }
}

pub struct CameraEngine<H: CameraHost> {
    host: H,
    config: EngineConfig,
    runner: CameraAnimatorsRunner,
    gestures: GestureManager,
    viewport: ViewportManager,
    locations: LocationHub,
    /// Declarative viewport last assigned
    viewport_value: Viewport,
}

impl<H: CameraHost> CameraEngine<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: H, config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            host,
            runner: CameraAnimatorsRunner::new(),
            gestures: GestureManager::new(config.gestures.clone()),
            viewport: ViewportManager::new(config.viewport.clone()),
            locations: LocationHub::new(),
            viewport_value: Viewport::idle(),
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn camera_state(&self) -> CameraState {
        self.host.camera_state()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runner(&self) -> &CameraAnimatorsRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut CameraAnimatorsRunner {
        &mut self.runner
    }

    pub fn gestures(&self) -> &GestureManager {
        &self.gestures
    }

    pub fn gestures_mut(&mut self) -> &mut GestureManager {
        &mut self.gestures
    }

    pub fn viewport_manager(&self) -> &ViewportManager {
        &self.viewport
    }

    pub fn viewport_manager_mut(&mut self) -> &mut ViewportManager {
        &mut self.viewport
    }

    pub fn set_gesture_options(&mut self, options: GestureOptions) {
        self.gestures.set_options(options);
        self.config.gestures = self.gestures.options().clone();
    }

    /// One frame: viewport targets, animator ticks, then transition outcomes
    pub fn update(&mut self, now: Instant) -> Vec<GestureEvent> {
        self.viewport.update(&self.host, &mut self.runner, now);
        self.runner.update(&mut self.host, now);
        self.viewport.settle(&mut self.runner);
        if self.viewport.status() == &ViewportStatus::Idle && self.viewport_value != Viewport::idle() {
            self.viewport_value = Viewport::idle();
        }
        self.gestures.update(now)
    }

    /// Routes a touch event through the gesture manager
    pub fn handle_touch(&mut self, event: &TouchEvent) -> Vec<GestureEvent> {
        let events = self.gestures.handle_touch(event, &mut self.host, &mut self.runner);
        if events.iter().any(|e| matches!(e, GestureEvent::Began(_))) {
            self.viewport.handle_user_interaction(&mut self.runner);
            if self.viewport.status() == &ViewportStatus::Idle {
                self.viewport_value = Viewport::idle();
            }
        }
        events
    }

    /// Registers and starts an animator
    pub fn animate(&mut self, animator: CameraAnimator) -> AnimationHandle {
        let id = self.runner.add(animator);
        self.runner.start(id);
        AnimationHandle(id)
    }

    /// Eases to `to`; `None` as owner means unspecified
    pub fn ease(
        &mut self,
        to: CameraOptions,
        duration: f64,
        curve: TimingCurve,
        owner: Option<AnimationOwner>,
    ) -> AnimationHandle {
        let animator = CameraAnimator::simple(to, duration, curve)
            .with_owner(owner.unwrap_or_default())
            .with_type(AnimationType::Ease);
        self.animate(animator)
    }

    /// Flies to `to`; without a duration one is derived from the path length
    pub fn fly(&mut self, to: CameraOptions, duration: Option<f64>, curve: TimingCurve) -> AnimationHandle {
        let fly = FlyToInterpolator::new(
            &self.host.camera_state(),
            &to,
            self.host.size(),
            &self.host.camera_bounds(),
        );
        let duration = duration.unwrap_or_else(|| fly.default_duration());
        let animator = CameraAnimator::basic(duration, curve, move |transition| {
            let camera = fly.camera(transition.fraction_complete);
            transition.apply(&camera);
        })
        .with_type(AnimationType::Fly);
        self.animate(animator)
    }

    /// Moves a point from `location` at `velocity`, slowing by `factor` per millisecond
    pub fn decelerate<F, C>(
        &mut self,
        location: Point,
        velocity: Point,
        factor: f64,
        on_update: F,
        completion: C,
    ) -> AnimationHandle
    where
        F: FnMut(Point, Point, &mut CameraTransition) + Send + 'static,
        C: FnOnce(AnimatingPosition) + Send + 'static,
    {
        let animator = CameraAnimator::deceleration(location, velocity, factor, on_update).with_completion(completion);
        self.animate(animator)
    }

    /// Adds a completion handler to a running animation
    pub fn on_completion<F>(&mut self, handle: AnimationHandle, completion: F) -> bool
    where
        F: FnOnce(AnimatingPosition) + Send + 'static,
    {
        self.runner.add_completion(handle.0, completion)
    }

    pub fn is_animating(&self, handle: AnimationHandle) -> bool {
        self.runner.contains(handle.0)
    }

    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        self.runner.stop(handle.0)
    }

    pub fn cancel_animations(&mut self) {
        self.runner.cancel_animations();
    }

    pub fn cancel_animations_with(&mut self, owners: &[AnimationOwner], types: &[AnimationType]) {
        self.runner.cancel_animations_with(owners, types);
    }

    pub fn cancel_animations_with_owners(&mut self, owners: &[AnimationOwner]) {
        self.runner.cancel_animations_with_owners(owners);
    }

    /// Jumps to `camera` after cancelling every animation
    pub fn set_camera(&mut self, camera: &CameraOptions) {
        self.runner.cancel_animations();
        self.host.set_camera(camera);
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport_value
    }

    pub fn viewport_status(&self) -> &ViewportStatus {
        self.viewport.status()
    }

    /// Switches the viewport without animation
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.apply_viewport(viewport, ViewportAnimation::Immediate, None)
    }

    /// Runs `change` on the viewport and animates to the result
    pub fn with_viewport_animation<F, C>(
        &mut self,
        animation: ViewportAnimation,
        change: F,
        completion: Option<C>,
    ) -> Result<()>
    where
        F: FnOnce(&mut Viewport),
        C: FnOnce(bool) + Send + 'static,
    {
        let mut viewport = self.viewport_value.clone();
        change(&mut viewport);
        let completion = completion.map(|c| Box::new(c) as TransitionCompletion);
        self.apply_viewport(viewport, animation, completion)
    }

    fn apply_viewport(
        &mut self,
        viewport: Viewport,
        animation: ViewportAnimation,
        completion: Option<TransitionCompletion>,
    ) -> Result<()> {
        let state = viewport.make_state();
        self.viewport_value = viewport;
        self.transition_viewport(state, Some(animation), completion)
    }

    /// Transitions to `state`; without an animation the configured default is used
    pub fn transition_viewport(
        &mut self,
        state: ViewportState,
        animation: Option<ViewportAnimation>,
        completion: Option<TransitionCompletion>,
    ) -> Result<()> {
        self.viewport.transition(
            state,
            animation,
            &self.host,
            &mut self.locations,
            &mut self.runner,
            completion,
        )
    }

    pub fn idle_viewport(&mut self) {
        self.viewport.idle(&mut self.runner);
        self.viewport_value = Viewport::idle();
    }

    /// Publishes a new position of the tracked subject
    pub fn update_location(&mut self, location: Location) {
        self.locations.update(location);
    }

    pub fn latest_location(&self) -> Option<&Location> {
        self.locations.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::core::map::HeadlessMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn engine() -> CameraEngine<HeadlessMap> {
        CameraEngine::new(HeadlessMap::new(
            CameraState::new(LatLng::new(0.0, 0.0), 2.0),
            Point::new(400.0, 400.0),
        ))
    }

    #[test]
    fn test_ease_and_cancel() {
        let mut engine = engine();
        let handle = engine.ease(CameraOptions::new().with_zoom(6.0), 1.0, TimingCurve::Linear, None);
        let positions = Arc::new(Mutex::new(Vec::new()));
        let sink = positions.clone();
        assert!(engine.on_completion(handle, move |p| sink.lock().unwrap().push(p)));
        let t0 = Instant::now();
        engine.update(t0);
        engine.update(t0 + Duration::from_millis(250));
        assert!(engine.is_animating(handle));
        assert!(engine.cancel(handle));
        assert!(!engine.cancel(handle));
        assert_eq!(*positions.lock().unwrap(), vec![AnimatingPosition::Current]);
        assert!((engine.camera_state().zoom - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_viewport_is_immediate() {
        let mut engine = engine();
        engine
            .set_viewport(Viewport::camera(CameraOptions::new().with_zoom(9.0)))
            .unwrap();
        engine.update(Instant::now());
        assert_eq!(engine.camera_state().zoom, 9.0);
        assert!(matches!(engine.viewport_status(), ViewportStatus::State(_)));
    }

    #[test]
    fn test_with_viewport_animation() {
        let mut engine = engine();
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        engine
            .with_viewport_animation(
                ViewportAnimation::Ease {
                    duration: 0.5,
                    curve: TimingCurve::EaseOut,
                },
                |viewport| *viewport = Viewport::camera(CameraOptions::new().with_bearing(90.0)),
                Some(move |finished: bool| sink.lock().unwrap().push(finished)),
            )
            .unwrap();
        let t0 = Instant::now();
        engine.update(t0);
        engine.update(t0 + Duration::from_millis(600));
        assert_eq!(*results.lock().unwrap(), vec![true]);
        assert_eq!(engine.camera_state().bearing, 90.0);
    }
}
