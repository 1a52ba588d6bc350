//! Registry and scheduler for camera animators
//!
//! The runner owns every registered animator. Each [`update`] advances the
//! active ones in registration order, so when two animators write the same
//! field in one tick the later registration wins. Animators that stop are
//! dropped after their final commit and completion handlers.
//!
//! [`update`]: CameraAnimatorsRunner::update

use instant::Instant;

use crate::camera::animator::{
    AnimatingPosition, AnimationOwner, AnimationType, AnimatorState, CameraAnimator, TickOutcome,
};
use crate::camera::state::CameraOptions;
use crate::core::map::CameraHost;

/// Handle to a registered animator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimatorId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorStatus {
    Started,
    Paused,
    Stopped { finished: bool },
}

/// Notification sent on every animator start, pause and stop
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorStatusPayload {
    pub id: AnimatorId,
    pub owner: AnimationOwner,
    pub animation_type: AnimationType,
    pub status: AnimatorStatus,
}

/// Status listener callback type
pub type StatusListener = Box<dyn Fn(&AnimatorStatusPayload) + Send + Sync>;

pub struct CameraAnimatorsRunner {
    animators: Vec<(AnimatorId, CameraAnimator)>,
    next_id: u64,
    enabled: bool,
    listeners: Vec<StatusListener>,
}

impl Default for CameraAnimatorsRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(listeners: &[StatusListener], id: AnimatorId, animator: &CameraAnimator, status: AnimatorStatus) {
    let payload = AnimatorStatusPayload {
        id,
        owner: animator.owner().clone(),
        animation_type: animator.animation_type(),
        status,
    };
    for listener in listeners {
        listener(&payload);
    }
}

impl CameraAnimatorsRunner {
    pub fn new() -> Self {
        Self {
            animators: Vec::new(),
            next_id: 0,
            enabled: true,
            listeners: Vec::new(),
        }
    }

    /// Register a status listener
    pub fn on_status<F>(&mut self, listener: F)
    where
        F: Fn(&AnimatorStatusPayload) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Registers an animator without starting it
    ///
    /// A disabled runner stops the animator right away.
    pub fn add(&mut self, mut animator: CameraAnimator) -> AnimatorId {
        let id = AnimatorId(self.next_id);
        self.next_id += 1;
        if !self.enabled {
            log::debug!("runner disabled, stopping animator owned by {}", animator.owner());
            animator.stop();
            return id;
        }
        self.animators.push((id, animator));
        id
    }

    fn find_mut(&mut self, id: AnimatorId) -> Option<&mut CameraAnimator> {
        self.animators
            .iter_mut()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, animator)| animator)
    }

    pub fn get(&self, id: AnimatorId) -> Option<&CameraAnimator> {
        self.animators
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, animator)| animator)
    }

    pub fn contains(&self, id: AnimatorId) -> bool {
        self.get(id).is_some()
    }

    /// State of a registered animator, `None` once it has been dropped
    pub fn state(&self, id: AnimatorId) -> Option<AnimatorState> {
        self.get(id).map(CameraAnimator::state)
    }

    pub fn fraction_complete(&self, id: AnimatorId) -> Option<f64> {
        self.get(id).map(CameraAnimator::fraction_complete)
    }

    /// Starts or resumes an animator
    pub fn start(&mut self, id: AnimatorId) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(animator) = self.animators.iter_mut().find(|(candidate, _)| *candidate == id) else {
            return false;
        };
        if !animator.1.start() {
            return false;
        }
        log::debug!(
            "animator {:?} started ({}, {:?})",
            id,
            animator.1.owner(),
            animator.1.animation_type()
        );
        emit(&self.listeners, id, &animator.1, AnimatorStatus::Started);
        true
    }

    pub fn pause(&mut self, id: AnimatorId) -> bool {
        let Some((_, animator)) = self.animators.iter_mut().find(|(candidate, _)| *candidate == id) else {
            return false;
        };
        if !animator.pause() {
            return false;
        }
        emit(&self.listeners, id, animator, AnimatorStatus::Paused);
        true
    }

    /// Stops an animator, runs its completions and drops it
    pub fn stop(&mut self, id: AnimatorId) -> bool {
        let stopped = self.stop_where(|candidate, _| candidate == id);
        stopped > 0
    }

    /// Replaces the target of a retargetable animator
    pub fn retarget(&mut self, id: AnimatorId, to: CameraOptions) -> bool {
        self.find_mut(id).map_or(false, |animator| animator.retarget(to))
    }

    /// Adds a completion handler to a registered animator
    pub fn add_completion<F>(&mut self, id: AnimatorId, completion: F) -> bool
    where
        F: FnOnce(AnimatingPosition) + Send + 'static,
    {
        let Some(animator) = self.find_mut(id) else {
            return false;
        };
        animator.add_completion(completion);
        true
    }

    /// Advances every active animator once; a disabled runner cancels instead
    pub fn update(&mut self, host: &mut dyn CameraHost, now: Instant) {
        if !self.enabled {
            self.cancel_animations();
            return;
        }
        for (id, animator) in self.animators.iter_mut() {
            if animator.state() != AnimatorState::Active {
                continue;
            }
            if animator.tick(host, now) == TickOutcome::Finished {
                animator.complete();
                log::debug!("animator {:?} finished ({})", id, animator.owner());
                emit(&self.listeners, *id, animator, AnimatorStatus::Stopped { finished: true });
            }
        }
        self.animators
            .retain(|(_, animator)| animator.state() != AnimatorState::Stopped);
    }

    /// Stops every animator
    pub fn cancel_animations(&mut self) {
        let stopped = self.stop_where(|_, _| true);
        if stopped > 0 {
            log::debug!("cancelled {} animators", stopped);
        }
    }

    /// Stops animators whose owner is listed and whose type is listed;
    /// an empty type list matches every type
    pub fn cancel_animations_with(&mut self, owners: &[AnimationOwner], types: &[AnimationType]) {
        let stopped = self.stop_where(|_, animator| {
            owners.contains(animator.owner())
                && (types.is_empty() || types.contains(&animator.animation_type()))
        });
        if stopped > 0 {
            log::debug!("cancelled {} animators owned by {:?}", stopped, owners);
        }
    }

    pub fn cancel_animations_with_owners(&mut self, owners: &[AnimationOwner]) {
        self.cancel_animations_with(owners, &[]);
    }

    fn stop_where<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(AnimatorId, &CameraAnimator) -> bool,
    {
        let mut stopped = 0;
        for (id, animator) in self.animators.iter_mut() {
            if !predicate(*id, animator) {
                continue;
            }
            let was_running = matches!(animator.state(), AnimatorState::Active | AnimatorState::Paused);
            if animator.stop() {
                stopped += 1;
                if was_running {
                    let finished = animator.fraction_complete() >= 1.0;
                    emit(&self.listeners, *id, animator, AnimatorStatus::Stopped { finished });
                }
            }
        }
        self.animators
            .retain(|(_, animator)| animator.state() != AnimatorState::Stopped);
        stopped
    }

    /// Disabling cancels every animator and stops new ones on arrival
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel_animations();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of animators currently running
    pub fn active_count(&self) -> usize {
        self.animators
            .iter()
            .filter(|(_, animator)| animator.state() == AnimatorState::Active)
            .count()
    }

    /// Number of registered animators, whatever their state
    pub fn len(&self) -> usize {
        self.animators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::state::CameraState;
    use crate::camera::timing::TimingCurve;
    use crate::core::geo::{LatLng, Point};
    use crate::core::map::HeadlessMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn map() -> HeadlessMap {
        HeadlessMap::new(CameraState::new(LatLng::new(0.0, 0.0), 2.0), Point::new(400.0, 400.0))
    }

    fn zoom_to(zoom: f64) -> CameraAnimator {
        CameraAnimator::simple(CameraOptions::new().with_zoom(zoom), 1.0, TimingCurve::Linear)
    }

    #[test]
    fn test_add_does_not_start() {
        let mut runner = CameraAnimatorsRunner::new();
        let id = runner.add(zoom_to(5.0));
        assert_eq!(runner.state(id), Some(AnimatorState::Inactive));
        assert_eq!(runner.active_count(), 0);
        assert!(runner.start(id));
        assert_eq!(runner.active_count(), 1);
    }

    #[test]
    fn test_later_registration_wins() {
        let mut map = map();
        let mut runner = CameraAnimatorsRunner::new();
        let first = runner.add(CameraAnimator::simple(CameraOptions::new().with_zoom(5.0), 0.0, TimingCurve::Linear));
        let second = runner.add(CameraAnimator::simple(CameraOptions::new().with_zoom(9.0), 0.0, TimingCurve::Linear));
        runner.start(first);
        runner.start(second);
        runner.update(&mut map, Instant::now());
        assert_eq!(map.camera_state().zoom, 9.0);
        assert!(runner.is_empty());
    }

    #[test]
    fn test_status_signal() {
        let mut map = map();
        let mut runner = CameraAnimatorsRunner::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        runner.on_status(move |payload| sink.lock().unwrap().push(payload.status));

        let id = runner.add(zoom_to(5.0));
        runner.start(id);
        runner.pause(id);
        runner.start(id);
        runner.stop(id);

        let quick = runner.add(CameraAnimator::simple(CameraOptions::new().with_zoom(3.0), 0.0, TimingCurve::Linear));
        runner.start(quick);
        runner.update(&mut map, Instant::now());

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                AnimatorStatus::Started,
                AnimatorStatus::Paused,
                AnimatorStatus::Started,
                AnimatorStatus::Stopped { finished: false },
                AnimatorStatus::Started,
                AnimatorStatus::Stopped { finished: true },
            ]
        );
    }

    #[test]
    fn test_natural_completion_reports_end() {
        let mut map = map();
        let mut runner = CameraAnimatorsRunner::new();
        let positions = Arc::new(Mutex::new(Vec::new()));
        let sink = positions.clone();
        let id = runner.add(zoom_to(6.0).with_completion(move |p| sink.lock().unwrap().push(p)));
        runner.start(id);
        let t0 = Instant::now();
        runner.update(&mut map, t0);
        runner.update(&mut map, t0 + Duration::from_millis(1200));
        assert_eq!(*positions.lock().unwrap(), vec![AnimatingPosition::End]);
        assert_eq!(map.camera_state().zoom, 6.0);
        assert!(!runner.contains(id));
    }

    #[test]
    fn test_disabled_runner() {
        let mut map = map();
        let mut runner = CameraAnimatorsRunner::new();
        let positions = Arc::new(Mutex::new(Vec::new()));

        let sink = positions.clone();
        let running = runner.add(zoom_to(6.0).with_completion(move |p| sink.lock().unwrap().push(p)));
        runner.start(running);
        runner.set_enabled(false);
        assert!(runner.is_empty());

        let sink = positions.clone();
        let late = runner.add(zoom_to(6.0).with_completion(move |p| sink.lock().unwrap().push(p)));
        assert!(!runner.start(late));
        runner.update(&mut map, Instant::now());
        assert_eq!(map.camera_state().zoom, 2.0);
        assert_eq!(
            *positions.lock().unwrap(),
            vec![AnimatingPosition::Current, AnimatingPosition::Current]
        );
    }

    #[test]
    fn test_retarget_unknown_animator() {
        let mut runner = CameraAnimatorsRunner::new();
        let id = runner.add(zoom_to(6.0));
        runner.stop(id);
        assert!(!runner.retarget(id, CameraOptions::new().with_zoom(1.0)));
    }
}
