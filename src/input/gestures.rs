//! Gesture arbitration
//!
//! [`GestureManager`] owns one handler per enabled [`GestureType`], feeds every
//! touch event to all recognizers, and then decides which of the recognizers
//! that are ready may begin. A recognizer begins only once every gesture it
//! requires to fail has failed, and only if it can run alongside the gestures
//! already active (pan, pinch and rotate combine; pitch and quick zoom run
//! alone). Animations are cancelled before the first camera change of any
//! gesture.

use crossbeam_channel::{Receiver, Sender};
use fxhash::FxHashMap;
use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::camera::runner::CameraAnimatorsRunner;
use crate::core::config::GestureOptions;
use crate::core::map::CameraHost;
use crate::input::events::{TouchEvent, TouchSet};
use crate::input::handlers::{GestureHandler, HandlerContext};
use crate::input::recognizers::{default_fail_requirements, FailRequirement, RecognizerState, TouchFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureType {
    Pan,
    Tap { taps: u8, touches: u8 },
    Pinch,
    Rotate,
    QuickZoom,
    Pitch,
}

impl GestureType {
    /// Two taps with one finger
    pub const DOUBLE_TAP: GestureType = GestureType::Tap { taps: 2, touches: 1 };
    /// One tap with two fingers
    pub const DOUBLE_TOUCH: GestureType = GestureType::Tap { taps: 1, touches: 2 };

    /// Gestures that may be active at the same time as each other
    pub fn allows_simultaneous(&self) -> bool {
        matches!(self, GestureType::Pan | GestureType::Pinch | GestureType::Rotate)
    }
}

/// Gesture lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Began(GestureType),
    Ended {
        gesture: GestureType,
        /// A follow-up animation (deceleration, snap, tap zoom) was started
        will_animate: bool,
    },
    /// The follow-up animation of a gesture stopped
    AnimationEnded(GestureType),
}

/// Gesture listener callback type
pub type GestureListener = Box<dyn Fn(&GestureEvent) + Send + Sync>;

enum RequirementStatus {
    Clear,
    Waiting,
    Blocked(GestureType),
}

/// Gesture types in arbitration order
const GESTURE_ORDER: [GestureType; 7] = [
    GestureType::Pitch,
    GestureType::Pan,
    GestureType::Pinch,
    GestureType::Rotate,
    GestureType::QuickZoom,
    GestureType::DOUBLE_TAP,
    GestureType::DOUBLE_TOUCH,
];

pub struct GestureManager {
    options: GestureOptions,
    handlers: FxHashMap<GestureType, GestureHandler>,
    order: Vec<GestureType>,
    requirements: Vec<FailRequirement>,
    touches: TouchSet,
    animation_ended: (Sender<GestureType>, Receiver<GestureType>),
    listeners: Vec<GestureListener>,
}

impl Default for GestureManager {
    fn default() -> Self {
        Self::new(GestureOptions::default())
    }
}

impl GestureManager {
    pub fn new(options: GestureOptions) -> Self {
        let mut manager = Self {
            options: GestureOptions::default(),
            handlers: FxHashMap::default(),
            order: Vec::new(),
            requirements: default_fail_requirements(),
            touches: TouchSet::new(),
            animation_ended: crossbeam_channel::unbounded(),
            listeners: Vec::new(),
        };
        manager.set_options(options);
        manager
    }

    /// Gesture types switched on by `options`
    pub fn enabled_gestures(options: &GestureOptions) -> Vec<GestureType> {
        GESTURE_ORDER
            .iter()
            .copied()
            .filter(|gesture| match gesture {
                GestureType::Pan => options.scroll_enabled,
                GestureType::Pinch | GestureType::QuickZoom | GestureType::Tap { .. } => {
                    options.zoom_enabled
                }
                GestureType::Rotate => options.rotate_enabled,
                GestureType::Pitch => options.pitch_enabled,
            })
            .collect()
    }

    /// Replaces the options and rebuilds the handlers; gestures in progress are dropped
    pub fn set_options(&mut self, options: GestureOptions) {
        let options = options.sanitized();
        self.order = Self::enabled_gestures(&options);
        self.handlers = self
            .order
            .iter()
            .filter_map(|gesture| GestureHandler::for_gesture(*gesture).map(|h| (*gesture, h)))
            .collect();
        self.touches.clear();
        log::debug!("gestures enabled: {:?}", self.order);
        self.options = options;
    }

    pub fn options(&self) -> &GestureOptions {
        &self.options
    }

    /// Adds a constraint on top of the built-in ones
    pub fn add_fail_requirement(&mut self, requirement: FailRequirement) {
        if !self.requirements.contains(&requirement) {
            self.requirements.push(requirement);
        }
    }

    pub fn fail_requirements(&self) -> &[FailRequirement] {
        &self.requirements
    }

    pub fn on_event<F>(&mut self, listener: F)
    where
        F: Fn(&GestureEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn is_enabled(&self, gesture: GestureType) -> bool {
        self.handlers.contains_key(&gesture)
    }

    pub fn recognizer_state(&self, gesture: GestureType) -> Option<RecognizerState> {
        self.handlers.get(&gesture).map(|h| h.recognizer().state())
    }

    /// Gestures currently driving the camera
    pub fn active_gestures(&self) -> Vec<GestureType> {
        self.order
            .iter()
            .copied()
            .filter(|g| self.recognizer_state(*g).map_or(false, |s| s.is_active()))
            .collect()
    }

    pub fn is_gesture_active(&self) -> bool {
        !self.active_gestures().is_empty()
    }

    /// Feeds one touch event through recognition, arbitration and the handlers
    pub fn handle_touch(
        &mut self,
        event: &TouchEvent,
        host: &mut dyn CameraHost,
        runner: &mut CameraAnimatorsRunner,
    ) -> Vec<GestureEvent> {
        for handler in self.handlers.values_mut() {
            handler.recognizer_mut().tick(event.timestamp);
        }
        if self.touches.apply(event) {
            for handler in self.handlers.values_mut() {
                let recognizer = handler.recognizer_mut();
                if recognizer.state().is_terminal() || !recognizer.spans_sequences() {
                    recognizer.reset();
                }
            }
        }

        let frame = TouchFrame {
            phase: event.phase,
            active: self.touches.touches(),
            timestamp: event.timestamp,
        };
        let before: FxHashMap<GestureType, RecognizerState> = self
            .handlers
            .iter()
            .map(|(gesture, handler)| (*gesture, handler.recognizer().state()))
            .collect();
        for handler in self.handlers.values_mut() {
            handler.recognizer_mut().handle(&frame);
        }
        let began = arbitrate(&self.order, &self.requirements, &mut self.handlers, &frame);

        let pinch_scale = self
            .handlers
            .get(&GestureType::Pinch)
            .and_then(GestureHandler::pinch_scale)
            .unwrap_or(1.0);
        let mut ctx = HandlerContext {
            host,
            runner,
            options: &self.options,
            pinch_scale,
            animation_ended: &self.animation_ended.0,
        };
        if !began.is_empty() {
            ctx.runner.cancel_animations();
        }

        let mut events = Vec::new();
        for gesture in &self.order {
            let Some(handler) = self.handlers.get_mut(gesture) else {
                continue;
            };
            let previous = before.get(gesture).copied().unwrap_or(RecognizerState::Possible);
            let state = handler.recognizer().state();

            if handler.is_discrete() {
                if previous == RecognizerState::Possible && state == RecognizerState::Ended {
                    log::debug!("{:?} recognized", gesture);
                    ctx.runner.cancel_animations();
                    events.push(GestureEvent::Began(*gesture));
                    let will_animate = handler.ended(*gesture, &mut ctx);
                    events.push(GestureEvent::Ended {
                        gesture: *gesture,
                        will_animate,
                    });
                }
                continue;
            }

            if began.contains(gesture) {
                log::debug!("{:?} began", gesture);
                handler.began(&mut ctx);
                events.push(GestureEvent::Began(*gesture));
            } else if previous.is_active() && state == RecognizerState::Changed {
                handler.changed(&mut ctx);
            } else if previous.is_active()
                && matches!(state, RecognizerState::Ended | RecognizerState::Cancelled)
            {
                let will_animate = handler.ended(*gesture, &mut ctx);
                log::debug!("{:?} ended ({:?}), will animate: {}", gesture, state, will_animate);
                events.push(GestureEvent::Ended {
                    gesture: *gesture,
                    will_animate,
                });
            }
        }

        self.notify(&events);
        events
    }

    /// Runs recognizer timeouts and reports follow-up animations that stopped
    pub fn update(&mut self, now: Instant) -> Vec<GestureEvent> {
        for handler in self.handlers.values_mut() {
            handler.recognizer_mut().tick(now);
        }
        let events: Vec<GestureEvent> = self
            .animation_ended
            .1
            .try_iter()
            .map(GestureEvent::AnimationEnded)
            .collect();
        self.notify(&events);
        events
    }

    fn notify(&self, events: &[GestureEvent]) {
        for event in events {
            for listener in &self.listeners {
                listener(event);
            }
        }
    }
}

fn requirement_status(
    gesture: GestureType,
    requirements: &[FailRequirement],
    handlers: &FxHashMap<GestureType, GestureHandler>,
) -> RequirementStatus {
    let mut status = RequirementStatus::Clear;
    for requirement in requirements.iter().filter(|r| r.gesture == gesture) {
        // a disabled gesture never recognizes, which counts as failing
        let Some(other) = handlers.get(&requirement.requires_failure_of) else {
            continue;
        };
        match other.recognizer().state() {
            RecognizerState::Failed => {}
            RecognizerState::Possible => status = RequirementStatus::Waiting,
            _ => return RequirementStatus::Blocked(requirement.requires_failure_of),
        }
    }
    status
}

fn conflicts(gesture: GestureType, handlers: &FxHashMap<GestureType, GestureHandler>) -> bool {
    handlers.iter().any(|(other, handler)| {
        *other != gesture
            && handler.recognizer().state().is_active()
            && !(gesture.allows_simultaneous() && other.allows_simultaneous())
    })
}

/// Begins the ready recognizers whose fail requirements are met, until nothing changes
fn arbitrate(
    order: &[GestureType],
    requirements: &[FailRequirement],
    handlers: &mut FxHashMap<GestureType, GestureHandler>,
    frame: &TouchFrame<'_>,
) -> Vec<GestureType> {
    let mut began = Vec::new();
    loop {
        let mut progressed = false;
        for gesture in order {
            let ready = handlers.get(gesture).map_or(false, |h| {
                let recognizer = h.recognizer();
                recognizer.state() == RecognizerState::Possible && recognizer.wants_to_begin()
            });
            if !ready {
                continue;
            }
            let decision = match requirement_status(*gesture, requirements, handlers) {
                RequirementStatus::Waiting => continue,
                RequirementStatus::Blocked(by) => {
                    log::debug!("{:?} failed, {:?} was recognized", gesture, by);
                    Some(false)
                }
                RequirementStatus::Clear if conflicts(*gesture, handlers) => {
                    log::debug!("{:?} failed, an exclusive gesture is active", gesture);
                    Some(false)
                }
                RequirementStatus::Clear => Some(true),
            };
            if let (Some(begin), Some(handler)) = (decision, handlers.get_mut(gesture)) {
                if begin {
                    handler.recognizer_mut().begin(frame);
                    began.push(*gesture);
                } else {
                    handler.recognizer_mut().fail();
                }
                progressed = true;
            }
        }
        if !progressed {
            return began;
        }
    }
}
