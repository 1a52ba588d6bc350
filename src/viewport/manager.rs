//! Viewport status machine
//!
//! The manager is `Idle`, in a `State`, or in a `Transition` toward a state.
//! Only one transition runs at a time: starting another one, going idle, or
//! an interrupted animator ends it with `false`. After a successful
//! transition into a follow-target state the manager keeps the camera on the
//! moving target.

use instant::Instant;

use crate::camera::animator::{AnimationOwner, AnimationType, CameraAnimator};
use crate::camera::runner::{AnimatorId, CameraAnimatorsRunner};
use crate::camera::state::CameraOptions;
use crate::camera::timing::TimingCurve;
use crate::core::config::ViewportOptions;
use crate::core::geo::EdgeInsets;
use crate::core::map::CameraHost;
use crate::viewport::state::{
    FollowTargetOptions, LocationHub, OverviewOptions, TargetStream, ViewportState,
};
use crate::viewport::transition::{ViewportAnimation, ViewportTransition};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportStatus {
    Idle,
    State(ViewportState),
    Transition {
        animation: ViewportAnimation,
        to: ViewportState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportStatusChangeReason {
    IdleRequested,
    TransitionStarted,
    TransitionSucceeded,
    TransitionFailed,
    UserInteraction,
}

/// Called with the previous status, the new one and why it changed
pub type StatusObserver =
    Box<dyn Fn(&ViewportStatus, &ViewportStatus, ViewportStatusChangeReason) + Send + Sync>;

/// Receives whether a transition ran to completion
pub type TransitionCompletion = Box<dyn FnOnce(bool) + Send>;

/// Declarative viewport: what to show plus the padding to keep around it
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    state: ViewportState,
    padding: EdgeInsets,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::idle()
    }
}

impl Viewport {
    fn with_state(state: ViewportState) -> Self {
        Self {
            state,
            padding: EdgeInsets::zero(),
        }
    }

    pub fn idle() -> Self {
        Self::with_state(ViewportState::Idle)
    }

    pub fn camera(camera: CameraOptions) -> Self {
        Self::with_state(ViewportState::Camera(camera))
    }

    pub fn overview(options: OverviewOptions) -> Self {
        Self::with_state(ViewportState::Overview(options))
    }

    pub fn follow_target(options: FollowTargetOptions) -> Self {
        Self::with_state(ViewportState::FollowTarget(options))
    }

    pub fn style_default() -> Self {
        Self::with_state(ViewportState::StyleDefault)
    }

    pub fn with_padding(mut self, padding: EdgeInsets) -> Self {
        self.padding = padding;
        self
    }

    pub fn padding(&self) -> EdgeInsets {
        self.padding
    }

    /// State with the viewport padding added to the state's own
    pub fn make_state(&self) -> ViewportState {
        let padding = self.padding;
        match self.state.clone() {
            ViewportState::Camera(mut camera) => {
                if padding != EdgeInsets::zero() {
                    camera.padding = Some(camera.padding.unwrap_or_default().add(&padding));
                }
                ViewportState::Camera(camera)
            }
            ViewportState::Overview(options) => {
                let combined = options.padding.add(&padding);
                ViewportState::Overview(options.with_padding(combined))
            }
            ViewportState::FollowTarget(options) => {
                let combined = options.padding.add(&padding);
                ViewportState::FollowTarget(options.with_padding(combined))
            }
            state @ (ViewportState::StyleDefault | ViewportState::Idle) => state,
        }
    }
}

struct Running {
    to: ViewportState,
    transition: ViewportTransition,
    completion: Option<TransitionCompletion>,
}

impl Running {
    fn complete(&mut self, finished: bool) {
        if let Some(completion) = self.completion.take() {
            completion(finished);
        }
    }
}

/// Keeps the camera on a follow-target state after its transition
struct Following {
    stream: TargetStream,
    animator: Option<AnimatorId>,
}

pub struct ViewportManager {
    options: ViewportOptions,
    status: ViewportStatus,
    running: Option<Running>,
    following: Option<Following>,
    observers: Vec<StatusObserver>,
}

impl Default for ViewportManager {
    fn default() -> Self {
        Self::new(ViewportOptions::default())
    }
}

impl ViewportManager {
    pub fn new(options: ViewportOptions) -> Self {
        Self {
            options,
            status: ViewportStatus::Idle,
            running: None,
            following: None,
            observers: Vec::new(),
        }
    }

    pub fn options(&self) -> &ViewportOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ViewportOptions) {
        self.options = options;
    }

    pub fn status(&self) -> &ViewportStatus {
        &self.status
    }

    pub fn on_status_change<F>(&mut self, observer: F)
    where
        F: Fn(&ViewportStatus, &ViewportStatus, ViewportStatusChangeReason) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Animation used when a transition names none
    pub fn default_animation(&self) -> ViewportAnimation {
        ViewportAnimation::Default {
            max_duration: self.options.default_transition.max_duration,
        }
    }

    /// Progress of the running transition
    pub fn transition_fraction_complete(&self) -> Option<f64> {
        self.running.as_ref().map(|r| r.transition.fraction_complete())
    }

    /// Animators of the running transition
    pub fn transition_animators(&self) -> Vec<AnimatorId> {
        self.running
            .as_ref()
            .map(|r| r.transition.animator_ids())
            .unwrap_or_default()
    }

    fn set_status(&mut self, status: ViewportStatus, reason: ViewportStatusChangeReason) {
        if status == self.status {
            return;
        }
        let previous = std::mem::replace(&mut self.status, status);
        log::debug!("viewport {:?} -> {:?} ({:?})", previous, self.status, reason);
        for observer in &self.observers {
            observer(&previous, &self.status, reason);
        }
    }

    /// Ends the running transition with `false` and stops following
    fn stop_current(&mut self, runner: &mut CameraAnimatorsRunner) {
        if let Some(mut running) = self.running.take() {
            running.transition.cancel(runner);
            running.complete(false);
        }
        if let Some(mut following) = self.following.take() {
            following.stream.cancel();
            if let Some(id) = following.animator {
                runner.stop(id);
            }
        }
    }

    pub fn idle(&mut self, runner: &mut CameraAnimatorsRunner) {
        self.go_idle(runner, ViewportStatusChangeReason::IdleRequested);
    }

    fn go_idle(&mut self, runner: &mut CameraAnimatorsRunner, reason: ViewportStatusChangeReason) {
        // status first, so the completion of an interrupted transition sees idle
        self.set_status(ViewportStatus::Idle, reason);
        self.stop_current(runner);
    }

    /// A gesture began; goes idle if configured to
    pub fn handle_user_interaction(&mut self, runner: &mut CameraAnimatorsRunner) {
        if self.options.transitions_to_idle_upon_user_interaction
            && self.status != ViewportStatus::Idle
        {
            self.go_idle(runner, ViewportStatusChangeReason::UserInteraction);
        }
    }

    /// Starts moving to `to`; `completion` learns whether it got there
    pub fn transition(
        &mut self,
        to: ViewportState,
        animation: Option<ViewportAnimation>,
        host: &dyn CameraHost,
        hub: &mut LocationHub,
        runner: &mut CameraAnimatorsRunner,
        completion: Option<TransitionCompletion>,
    ) -> Result<()> {
        let complete = |completion: Option<TransitionCompletion>, finished: bool| {
            if let Some(completion) = completion {
                completion(finished);
            }
        };
        match &self.status {
            ViewportStatus::State(current) if *current == to => {
                complete(completion, true);
                return Ok(());
            }
            ViewportStatus::Transition { to: pending, .. } if *pending == to => {
                complete(completion, false);
                return Ok(());
            }
            _ => {}
        }
        if to.is_idle() {
            self.go_idle(runner, ViewportStatusChangeReason::IdleRequested);
            complete(completion, true);
            return Ok(());
        }

        self.stop_current(runner);
        let stream = match to.make_target_stream(host, hub) {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("viewport transition failed: {}", err);
                self.set_status(ViewportStatus::Idle, ViewportStatusChangeReason::TransitionFailed);
                complete(completion, false);
                return Err(err);
            }
        };
        let animation = animation.unwrap_or_else(|| self.default_animation());
        self.running = Some(Running {
            to: to.clone(),
            transition: ViewportTransition::new(animation, stream),
            completion,
        });
        self.set_status(
            ViewportStatus::Transition { animation, to },
            ViewportStatusChangeReason::TransitionStarted,
        );
        Ok(())
    }

    /// Feeds new targets to the running transition or the followed state
    pub fn update(&mut self, host: &dyn CameraHost, runner: &mut CameraAnimatorsRunner, now: Instant) {
        if let Some(running) = &mut self.running {
            running.transition.drive(host, runner, now);
            return;
        }
        let duration = self.options.follow_update_duration;
        let Some(following) = &mut self.following else {
            return;
        };
        let Some(target) = following.stream.latest() else {
            return;
        };
        if let Some(id) = following.animator {
            if runner.retarget(id, target) {
                return;
            }
        }
        let animator = CameraAnimator::simple(target, duration, TimingCurve::Linear)
            .with_owner(AnimationOwner::VIEWPORT)
            .with_type(AnimationType::Ease);
        let id = runner.add(animator);
        runner.start(id);
        following.animator = Some(id);
    }

    /// Resolves the running transition after the runner has ticked
    pub fn settle(&mut self, runner: &mut CameraAnimatorsRunner) {
        let Some(outcome) = self.running.as_mut().and_then(|r| r.transition.poll_outcome()) else {
            return;
        };
        let Some(mut running) = self.running.take() else {
            return;
        };
        if outcome {
            self.set_status(
                ViewportStatus::State(running.to.clone()),
                ViewportStatusChangeReason::TransitionSucceeded,
            );
            running.complete(true);
            if running.to.is_continuous() {
                self.following = Some(Following {
                    stream: running.transition.into_stream(),
                    animator: None,
                });
            }
        } else {
            running.transition.cancel(runner);
            self.set_status(ViewportStatus::Idle, ViewportStatusChangeReason::TransitionFailed);
            running.complete(false);
        }
    }
}
