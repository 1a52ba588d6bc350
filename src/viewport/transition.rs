//! Viewport transition strategies
//!
//! A transition reads targets from a [`TargetStream`] and drives the camera
//! toward them with animators owned by [`AnimationOwner::VIEWPORT`]. The
//! default strategy splits the move into per-field animators and chases new
//! targets by retargeting them, so elapsed progress survives a moving target.
//! The fly strategy computes one trajectory from the first target and ignores
//! later ones.

use crossbeam_channel::{Receiver, Sender};
use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::camera::animator::{AnimatingPosition, AnimationOwner, AnimationType, CameraAnimator};
use crate::camera::fly_to::FlyToInterpolator;
use crate::camera::runner::{AnimatorId, CameraAnimatorsRunner};
use crate::camera::state::{CameraOptions, CameraState};
use crate::camera::timing::TimingCurve;
use crate::core::constants::{
    DEFAULT_TRANSITION_MAX_DURATION, TRANSITION_BEARING_DURATION, TRANSITION_CENTER_SPEED,
    TRANSITION_MAX_COMPONENT_DURATION, TRANSITION_PITCH_DURATION, TRANSITION_PITCH_TRAILING,
    TRANSITION_ZOOM_OUT_CENTER_DURATION, TRANSITION_ZOOM_SPEED,
};
use crate::core::map::CameraHost;
use crate::core::projection::Projection;
use crate::viewport::state::TargetStream;

/// How the camera moves to a new viewport state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportAnimation {
    /// Per-field animators that follow a moving target
    Default { max_duration: f64 },
    Ease { duration: f64, curve: TimingCurve },
    Linear { duration: f64 },
    /// Zoom out, travel, zoom in; `None` picks a duration from the path length
    Fly { duration: Option<f64> },
    /// Jump on the next update
    Immediate,
}

impl Default for ViewportAnimation {
    fn default() -> Self {
        ViewportAnimation::Default {
            max_duration: DEFAULT_TRANSITION_MAX_DURATION,
        }
    }
}

impl ViewportAnimation {
    /// Whether targets emitted after the first one are followed
    pub fn follows_target(&self) -> bool {
        !matches!(self, ViewportAnimation::Fly { .. })
    }
}

/// Camera field animated by one animator of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Center,
    Zoom,
    Bearing,
    Pitch,
    Padding,
    /// Every field at once
    Whole,
}

impl Component {
    /// The part of `target` this component animates, `None` if it is not set
    pub fn extract(&self, target: &CameraOptions) -> Option<CameraOptions> {
        let options = CameraOptions::new();
        match self {
            Component::Center => target.center.map(|c| options.with_center(c)),
            Component::Zoom => target.zoom.map(|z| options.with_zoom(z)),
            Component::Bearing => target.bearing.map(|b| options.with_bearing(b)),
            Component::Pitch => target.pitch.map(|p| options.with_pitch(p)),
            Component::Padding => target.padding.map(|p| options.with_padding(p)),
            Component::Whole => (!target.is_empty()).then_some(*target),
        }
    }

    fn animation_type(&self) -> AnimationType {
        match self {
            Component::Center => AnimationType::Pan,
            Component::Zoom => AnimationType::Zoom,
            Component::Bearing => AnimationType::Rotate,
            Component::Pitch => AnimationType::Pitch,
            Component::Padding => AnimationType::Unspecified,
            Component::Whole => AnimationType::Ease,
        }
    }
}

/// Timing of one component animator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentSpec {
    pub component: Component,
    pub duration: f64,
    pub delay: f64,
}

impl ComponentSpec {
    fn new(component: Component, duration: f64, delay: f64) -> Self {
        Self {
            component,
            duration,
            delay,
        }
    }

    pub fn end(&self) -> f64 {
        self.delay + self.duration
    }
}

/// Screen distance between two centers at `zoom`, the short way around
fn center_distance(from: &CameraState, to: &CameraOptions) -> Option<f64> {
    let target = to.center?;
    let world = Projection::world_size(from.zoom);
    let mut delta = Projection::project(&target, from.zoom).subtract(&Projection::project(&from.center, from.zoom));
    delta.x -= world * (delta.x / world).round();
    Some(delta.magnitude())
}

/// Component timings for the default transition from `current` to `target`
///
/// When zooming in, the center leads and the zoom follows half way through
/// it; when zooming out, the zoom leads and the center lands with it. The
/// whole schedule is compressed to fit `max_duration`.
pub fn default_animation_specs(
    current: &CameraState,
    target: &CameraOptions,
    max_duration: f64,
) -> Vec<ComponentSpec> {
    let zoom_delta = target.zoom.map_or(0.0, |zoom| zoom - current.zoom);
    let zoom_duration = (zoom_delta.abs() / TRANSITION_ZOOM_SPEED).min(TRANSITION_MAX_COMPONENT_DURATION);

    let mut timings = Vec::with_capacity(5);
    if zoom_delta >= 0.0 {
        let center_duration = center_distance(current, target)
            .map_or(0.0, |d| (d / TRANSITION_CENTER_SPEED).min(TRANSITION_MAX_COMPONENT_DURATION));
        let zoom_delay = if target.center.is_some() {
            center_duration / 2.0
        } else {
            0.0
        };
        let zoom_end = zoom_delay + zoom_duration;
        timings.push(ComponentSpec::new(Component::Center, center_duration, 0.0));
        timings.push(ComponentSpec::new(Component::Zoom, zoom_duration, zoom_delay));
        timings.push(ComponentSpec::new(
            Component::Bearing,
            TRANSITION_BEARING_DURATION,
            (zoom_end - TRANSITION_BEARING_DURATION).max(0.0),
        ));
        let trailing = (zoom_end + TRANSITION_PITCH_TRAILING - TRANSITION_PITCH_DURATION).max(0.0);
        timings.push(ComponentSpec::new(Component::Pitch, TRANSITION_PITCH_DURATION, trailing));
        timings.push(ComponentSpec::new(Component::Padding, TRANSITION_PITCH_DURATION, trailing));
    } else {
        timings.push(ComponentSpec::new(Component::Zoom, zoom_duration, 0.0));
        timings.push(ComponentSpec::new(
            Component::Center,
            TRANSITION_ZOOM_OUT_CENTER_DURATION,
            (zoom_duration - TRANSITION_ZOOM_OUT_CENTER_DURATION).max(0.0),
        ));
        timings.push(ComponentSpec::new(Component::Bearing, TRANSITION_BEARING_DURATION, 0.0));
        timings.push(ComponentSpec::new(Component::Pitch, TRANSITION_PITCH_DURATION, 0.0));
        timings.push(ComponentSpec::new(Component::Padding, TRANSITION_PITCH_DURATION, 0.0));
    }
    timings.retain(|spec| spec.component.extract(target).is_some());

    let total = timings.iter().map(ComponentSpec::end).fold(0.0, f64::max);
    if max_duration >= 0.0 && total > max_duration {
        let factor = if total > 0.0 { max_duration / total } else { 0.0 };
        for spec in &mut timings {
            spec.duration *= factor;
            spec.delay *= factor;
        }
    }
    timings
}

/// Completion message from a transition animator
type Settled = (u64, AnimatingPosition);

/// A transition in progress
pub struct ViewportTransition {
    animation: ViewportAnimation,
    stream: TargetStream,
    target: Option<CameraOptions>,
    animators: Vec<(Component, AnimatorId)>,
    /// Bumped whenever the animators are replaced, so stale completions are ignored
    generation: u64,
    outstanding: usize,
    settled: (Sender<Settled>, Receiver<Settled>),
    total_duration: f64,
    elapsed: f64,
    last_tick: Option<Instant>,
}

impl ViewportTransition {
    pub fn new(animation: ViewportAnimation, stream: TargetStream) -> Self {
        Self {
            animation,
            stream,
            target: None,
            animators: Vec::new(),
            generation: 0,
            outstanding: 0,
            settled: crossbeam_channel::unbounded(),
            total_duration: 0.0,
            elapsed: 0.0,
            last_tick: None,
        }
    }

    pub fn animation(&self) -> ViewportAnimation {
        self.animation
    }

    /// Target currently animated toward
    pub fn target(&self) -> Option<&CameraOptions> {
        self.target.as_ref()
    }

    pub fn animator_ids(&self) -> Vec<AnimatorId> {
        self.animators.iter().map(|(_, id)| *id).collect()
    }

    /// Share of the schedule elapsed, 0 until the first target arrives
    pub fn fraction_complete(&self) -> f64 {
        if self.target.is_none() {
            0.0
        } else if self.total_duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.total_duration).min(1.0)
        }
    }

    /// Starts on the first target and follows later ones
    pub fn drive(&mut self, host: &dyn CameraHost, runner: &mut CameraAnimatorsRunner, now: Instant) {
        if self.target.is_some() {
            let dt = match self.last_tick {
                Some(previous) if now > previous => (now - previous).as_secs_f64(),
                _ => 0.0,
            };
            self.elapsed += dt;
            self.last_tick = Some(now);
        }

        let Some(next) = self.stream.latest() else {
            return;
        };
        let current = self.target;
        match current {
            None => {
                self.start(&next, host, runner);
                self.last_tick = Some(now);
            }
            Some(current) if current == next => {}
            Some(_) if !self.animation.follows_target() => {
                log::debug!("{:?} transition keeps its original target", self.animation);
            }
            Some(_) => self.retarget(next, host, runner),
        }
    }

    fn start(&mut self, target: &CameraOptions, host: &dyn CameraHost, runner: &mut CameraAnimatorsRunner) {
        self.stop_animators(runner);
        self.generation += 1;
        self.target = Some(*target);
        self.elapsed = 0.0;

        let current = host.camera_state();
        let planned: Vec<(Component, CameraAnimator, f64)> = match self.animation {
            ViewportAnimation::Default { max_duration } => {
                default_animation_specs(&current, target, max_duration)
                    .into_iter()
                    .filter_map(|spec| {
                        let part = spec.component.extract(target)?;
                        let animator = CameraAnimator::simple(part, spec.duration, TimingCurve::EaseInOut)
                            .with_delay(spec.delay);
                        Some((spec.component, animator, spec.end()))
                    })
                    .collect()
            }
            ViewportAnimation::Ease { duration, curve } => {
                vec![(Component::Whole, CameraAnimator::simple(*target, duration, curve), duration)]
            }
            ViewportAnimation::Linear { duration } => vec![(
                Component::Whole,
                CameraAnimator::simple(*target, duration, TimingCurve::Linear),
                duration,
            )],
            ViewportAnimation::Immediate => {
                vec![(Component::Whole, CameraAnimator::simple(*target, 0.0, TimingCurve::Linear), 0.0)]
            }
            ViewportAnimation::Fly { duration } => {
                let fly = FlyToInterpolator::new(&current, target, host.size(), &host.camera_bounds());
                let duration = duration.unwrap_or_else(|| fly.default_duration());
                let animator = CameraAnimator::basic(duration, TimingCurve::EaseInOut, move |transition| {
                    let camera = fly.camera(transition.fraction_complete);
                    transition.apply(&camera);
                })
                .with_type(AnimationType::Fly);
                vec![(Component::Whole, animator, duration)]
            }
        };

        self.total_duration = planned.iter().map(|(_, _, end)| *end).fold(0.0, f64::max);
        log::debug!(
            "viewport transition {:?} started, {} animators over {:.2}s",
            self.animation,
            planned.len(),
            self.total_duration
        );
        if planned.is_empty() {
            // nothing to animate, settles on the next check
            self.outstanding = 0;
            return;
        }
        for (component, animator, _) in planned {
            self.launch(component, animator, runner);
        }
    }

    fn launch(&mut self, component: Component, animator: CameraAnimator, runner: &mut CameraAnimatorsRunner) {
        let sender = self.settled.0.clone();
        let generation = self.generation;
        let mut animator = animator.with_owner(AnimationOwner::VIEWPORT).with_completion(move |position| {
            let _ = sender.send((generation, position));
        });
        if animator.animation_type() == AnimationType::Unspecified {
            animator = animator.with_type(component.animation_type());
        }
        let id = runner.add(animator);
        runner.start(id);
        self.animators.push((component, id));
        self.outstanding += 1;
    }

    fn retarget(&mut self, target: CameraOptions, host: &dyn CameraHost, runner: &mut CameraAnimatorsRunner) {
        let same_fields = self
            .target
            .map_or(false, |current| current.fields() == target.fields());
        if !same_fields {
            log::debug!("viewport target changed shape, restarting transition");
            self.start(&target, host, runner);
            return;
        }
        self.target = Some(target);
        let remaining = (self.total_duration - self.elapsed).max(0.0);
        let components: Vec<(Component, AnimatorId)> = self.animators.clone();
        for (component, id) in components {
            let Some(part) = component.extract(&target) else {
                continue;
            };
            if runner.retarget(id, part) {
                continue;
            }
            // this component already landed; move it again in the time left
            let animator = CameraAnimator::simple(part, remaining, TimingCurve::EaseInOut);
            self.animators.retain(|(_, existing)| *existing != id);
            self.launch(component, animator, runner);
        }
    }

    /// `Some(true)` once every animator ran to its end, `Some(false)` if any was interrupted
    pub fn poll_outcome(&mut self) -> Option<bool> {
        if self.target.is_none() {
            return None;
        }
        for (generation, position) in self.settled.1.try_iter() {
            if generation != self.generation {
                continue;
            }
            if !position.did_finish() {
                return Some(false);
            }
            self.outstanding = self.outstanding.saturating_sub(1);
        }
        (self.outstanding == 0).then_some(true)
    }

    fn stop_animators(&mut self, runner: &mut CameraAnimatorsRunner) {
        self.generation += 1;
        for (_, id) in self.animators.drain(..) {
            runner.stop(id);
        }
        self.outstanding = 0;
    }

    /// Stops the animators and the target stream
    pub fn cancel(&mut self, runner: &mut CameraAnimatorsRunner) {
        self.stop_animators(runner);
        self.stream.cancel();
    }

    /// Hands the stream over once the transition has finished
    pub fn into_stream(self) -> TargetStream {
        self.stream
    }
}

impl std::fmt::Debug for ViewportTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportTransition")
            .field("animation", &self.animation)
            .field("target", &self.target)
            .field("animators", &self.animators)
            .field("outstanding", &self.outstanding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::{EdgeInsets, LatLng, Point};
    use crate::core::map::HeadlessMap;
    use std::time::Duration;

    fn camera() -> CameraState {
        CameraState::new(LatLng::new(0.0, 0.0), 2.0)
    }

    fn spec(specs: &[ComponentSpec], component: Component) -> ComponentSpec {
        *specs.iter().find(|s| s.component == component).unwrap()
    }

    #[test]
    fn test_zoom_in_schedule() {
        let target = CameraOptions::new()
            .with_center(LatLng::new(0.0, 1.0))
            .with_zoom(4.2)
            .with_pitch(30.0);
        let specs = default_animation_specs(&camera(), &target, 10.0);
        let center = spec(&specs, Component::Center);
        let zoom = spec(&specs, Component::Zoom);
        let pitch = spec(&specs, Component::Pitch);
        assert_eq!(specs.len(), 3);
        assert!((zoom.duration - 1.0).abs() < 1e-9);
        assert!((zoom.delay - center.duration / 2.0).abs() < 1e-9);
        assert!((pitch.end() - (zoom.end() + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_out_schedule() {
        let target = CameraOptions::new()
            .with_center(LatLng::new(10.0, 10.0))
            .with_zoom(0.0)
            .with_bearing(90.0);
        let from = CameraState::new(LatLng::new(0.0, 0.0), 6.0);
        let specs = default_animation_specs(&from, &target, 10.0);
        let zoom = spec(&specs, Component::Zoom);
        let center = spec(&specs, Component::Center);
        assert_eq!(zoom.delay, 0.0);
        assert!((center.end() - zoom.end()).abs() < 1e-9);
        assert_eq!(spec(&specs, Component::Bearing).duration, TRANSITION_BEARING_DURATION);
    }

    #[test]
    fn test_schedule_fits_max_duration() {
        let target = CameraOptions::new()
            .with_center(LatLng::new(40.0, 100.0))
            .with_zoom(14.0)
            .with_padding(EdgeInsets::uniform(20.0));
        let specs = default_animation_specs(&camera(), &target, 1.5);
        let total = specs.iter().map(ComponentSpec::end).fold(0.0, f64::max);
        assert!((total - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_fly_ignores_new_targets() {
        let mut map = HeadlessMap::new(camera(), Point::new(400.0, 400.0));
        let mut runner = CameraAnimatorsRunner::new();
        let (sender, receiver) = crossbeam_channel::unbounded();
        let stream = TargetStream::from_receiver(receiver);
        let mut transition = ViewportTransition::new(ViewportAnimation::Fly { duration: Some(1.0) }, stream);

        let a = CameraOptions::new().with_center(LatLng::new(5.0, 5.0)).with_zoom(6.0);
        let b = CameraOptions::new().with_center(LatLng::new(9.0, 9.0)).with_zoom(6.0);
        let t0 = Instant::now();
        sender.send(a).unwrap();
        transition.drive(&map, &mut runner, t0);
        runner.update(&mut map, t0);
        sender.send(b).unwrap();
        transition.drive(&map, &mut runner, t0 + Duration::from_millis(500));
        assert_eq!(transition.target(), Some(&a));

        runner.update(&mut map, t0 + Duration::from_millis(1100));
        assert_eq!(transition.poll_outcome(), Some(true));
        let center = map.camera_state().center;
        assert!((center.lat - 5.0).abs() < 1e-6 && (center.lng - 5.0).abs() < 1e-6);
    }
}
