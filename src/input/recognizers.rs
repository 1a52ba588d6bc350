//! Platform-independent gesture recognizers
//!
//! Recognizers only look at touches. They report when they are ready to
//! begin; whether they actually begin is decided by the gesture manager,
//! which evaluates the fail-requirement graph and exclusivity rules.

use instant::Instant;

use crate::core::constants::{
    DOUBLE_TAP_INTERVAL, DOUBLE_TAP_SLOP, PAN_SLOP, PINCH_SLOP, PITCH_SLOP,
    PITCH_TILT_TOLERANCE_DEGREES, ROTATE_SLOP_DEGREES, TAP_MAX_DURATION, TAP_SLOP,
};
use crate::core::geo::Point;
use crate::input::events::{TouchPhase, TouchPoint};
use crate::input::gestures::GestureType;

/// Recognizer lifecycle
///
/// Continuous gestures go `Possible → Began → Changed* → Ended | Cancelled`.
/// Discrete ones (taps) go straight from `Possible` to `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    Possible,
    Began,
    Changed,
    Ended,
    Cancelled,
    Failed,
}

impl RecognizerState {
    pub fn is_active(&self) -> bool {
        matches!(self, RecognizerState::Began | RecognizerState::Changed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecognizerState::Ended | RecognizerState::Cancelled | RecognizerState::Failed
        )
    }
}

/// One touch event as seen by recognizers
#[derive(Debug, Clone, Copy)]
pub struct TouchFrame<'a> {
    pub phase: TouchPhase,
    /// Touches on screen after the event, in arrival order
    pub active: &'a [TouchPoint],
    pub timestamp: Instant,
}

impl<'a> TouchFrame<'a> {
    /// Positions of at most the first `limit` touches
    fn positions(&self, limit: usize) -> Vec<Point> {
        self.active.iter().take(limit).map(|t| t.position).collect()
    }

    fn centroid(&self, limit: usize) -> Option<Point> {
        Point::centroid(&self.positions(limit))
    }

    fn pair(&self) -> Option<(Point, Point)> {
        match self.active {
            [first, second, ..] => Some((first.position, second.position)),
            _ => None,
        }
    }

    fn position_of(&self, id: u64) -> Option<Point> {
        self.active.iter().find(|t| t.id == id).map(|t| t.position)
    }
}

/// "`gesture` may only begin once `requires_failure_of` has failed"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailRequirement {
    pub gesture: GestureType,
    pub requires_failure_of: GestureType,
}

impl FailRequirement {
    pub const fn new(gesture: GestureType, requires_failure_of: GestureType) -> Self {
        Self {
            gesture,
            requires_failure_of,
        }
    }
}

/// Fail requirements between the built-in gestures
pub fn default_fail_requirements() -> Vec<FailRequirement> {
    vec![
        FailRequirement::new(GestureType::Pan, GestureType::Pitch),
        FailRequirement::new(GestureType::Pan, GestureType::QuickZoom),
        FailRequirement::new(GestureType::Pinch, GestureType::Pitch),
        FailRequirement::new(GestureType::Rotate, GestureType::Pitch),
        FailRequirement::new(GestureType::QuickZoom, GestureType::DOUBLE_TAP),
    ]
}

/// Common recognizer interface
pub trait Recognize {
    fn state(&self) -> RecognizerState;

    /// The touches satisfy this recognizer; the manager decides if it begins
    fn wants_to_begin(&self) -> bool;

    fn handle(&mut self, frame: &TouchFrame<'_>);

    fn begin(&mut self, frame: &TouchFrame<'_>);

    fn fail(&mut self);

    /// Back to `Possible` with no history
    fn reset(&mut self);

    /// Timeouts
    fn tick(&mut self, _now: Instant) {}

    /// Whether the recognizer keeps its progress between touch sequences
    fn spans_sequences(&self) -> bool {
        false
    }
}

fn seconds_between(later: Instant, earlier: Instant) -> f64 {
    if later > earlier {
        (later - earlier).as_secs_f64()
    } else {
        0.0
    }
}

/// Signed difference between two angles in degrees, in [-180, 180)
fn angle_delta(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

fn line_angle(a: Point, b: Point) -> f64 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// State transition shared by continuous recognizers when touches lift
fn lift(state: &mut RecognizerState, phase: TouchPhase) {
    if state.is_active() {
        *state = if phase == TouchPhase::Cancel {
            RecognizerState::Cancelled
        } else {
            RecognizerState::Ended
        };
    } else if *state == RecognizerState::Possible {
        *state = RecognizerState::Failed;
    }
}

/// One or two finger drag
#[derive(Debug, Clone)]
pub struct PanRecognizer {
    state: RecognizerState,
    ready: bool,
    max_touches: usize,
    origin: Option<Point>,
    previous: Option<Point>,
    last: Option<Point>,
    last_time: Option<Instant>,
    velocity: Point,
}

impl Default for PanRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PanRecognizer {
    pub fn new() -> Self {
        Self {
            state: RecognizerState::Possible,
            ready: false,
            max_touches: 2,
            origin: None,
            previous: None,
            last: None,
            last_time: None,
            velocity: Point::default(),
        }
    }

    /// Centroid before and after the latest move
    pub fn translation(&self) -> Option<(Point, Point)> {
        Some((self.previous?, self.last?))
    }

    pub fn location(&self) -> Option<Point> {
        self.last
    }

    /// Points per second at the latest move
    pub fn velocity(&self) -> Point {
        self.velocity
    }

    fn anchor_to(&mut self, centroid: Point) {
        self.previous = Some(centroid);
        self.last = Some(centroid);
    }
}

impl Recognize for PanRecognizer {
    fn state(&self) -> RecognizerState {
        self.state
    }

    fn wants_to_begin(&self) -> bool {
        self.ready
    }

    fn handle(&mut self, frame: &TouchFrame<'_>) {
        if self.state.is_terminal() {
            return;
        }
        let centroid = frame.centroid(self.max_touches);
        match frame.phase {
            TouchPhase::Start => {
                if frame.active.len() > self.max_touches && self.state == RecognizerState::Possible {
                    self.state = RecognizerState::Failed;
                    return;
                }
                if let Some(centroid) = centroid {
                    // a new finger must not make the map jump
                    self.anchor_to(centroid);
                    if self.state == RecognizerState::Possible {
                        self.origin = Some(centroid);
                    }
                }
                self.last_time = Some(frame.timestamp);
            }
            TouchPhase::Move => {
                let Some(centroid) = centroid else {
                    return;
                };
                if let (Some(last), Some(time)) = (self.last, self.last_time) {
                    let dt = seconds_between(frame.timestamp, time);
                    if dt > 0.0 {
                        self.velocity = centroid.subtract(&last).multiply(1.0 / dt);
                    }
                }
                self.previous = self.last.or(Some(centroid));
                self.last = Some(centroid);
                self.last_time = Some(frame.timestamp);

                match self.state {
                    RecognizerState::Possible => {
                        let origin = *self.origin.get_or_insert(centroid);
                        if centroid.distance_to(&origin) > PAN_SLOP {
                            self.ready = true;
                        }
                    }
                    RecognizerState::Began | RecognizerState::Changed => {
                        self.state = RecognizerState::Changed;
                    }
                    _ => {}
                }
            }
            TouchPhase::End | TouchPhase::Cancel => match centroid {
                None => {
                    // a finger resting before lifting has no velocity left
                    if let Some(time) = self.last_time {
                        if seconds_between(frame.timestamp, time) > 0.1 {
                            self.velocity = Point::default();
                        }
                    }
                    lift(&mut self.state, frame.phase);
                }
                Some(centroid) => {
                    self.anchor_to(centroid);
                    if self.state == RecognizerState::Possible {
                        self.origin = Some(centroid);
                    }
                }
            },
        }
    }

    fn begin(&mut self, frame: &TouchFrame<'_>) {
        self.state = RecognizerState::Began;
        self.ready = false;
        if let Some(centroid) = frame.centroid(self.max_touches) {
            self.anchor_to(centroid);
        }
    }

    fn fail(&mut self) {
        self.state = RecognizerState::Failed;
        self.ready = false;
    }

    fn reset(&mut self) {
        *self = Self {
            max_touches: self.max_touches,
            ..Self::new()
        };
    }
}

/// Two fingers dragged vertically together
#[derive(Debug, Clone)]
pub struct PitchRecognizer {
    state: RecognizerState,
    ready: bool,
    single_origin: Option<Point>,
    /// Ids and start positions of the touch pair
    starts: Option<[(u64, Point); 2]>,
    angle_checked: bool,
    begin_y: f64,
    last_y: f64,
}

impl Default for PitchRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchRecognizer {
    pub fn new() -> Self {
        Self {
            state: RecognizerState::Possible,
            ready: false,
            single_origin: None,
            starts: None,
            angle_checked: false,
            begin_y: 0.0,
            last_y: 0.0,
        }
    }

    /// Vertical drag since the gesture began
    pub fn translation_y(&self) -> f64 {
        self.last_y - self.begin_y
    }

    /// Tilt of the line through `a` and `b` away from horizontal, in [0, 90]
    pub fn tilt(a: Point, b: Point) -> f64 {
        (b.y - a.y).abs().atan2((b.x - a.x).abs()).to_degrees()
    }

    fn decide(&mut self, frame: &TouchFrame<'_>) {
        let Some([(id0, start0), (id1, start1)]) = self.starts else {
            return;
        };
        if !self.angle_checked {
            self.angle_checked = true;
            let tilt = Self::tilt(start0, start1);
            if tilt > PITCH_TILT_TOLERANCE_DEGREES {
                log::debug!("pitch rejected, touch line tilted {:.1} degrees", tilt);
                self.state = RecognizerState::Failed;
                return;
            }
        }
        let (Some(now0), Some(now1)) = (frame.position_of(id0), frame.position_of(id1)) else {
            self.state = RecognizerState::Failed;
            return;
        };
        let d0 = now0.subtract(&start0);
        let d1 = now1.subtract(&start1);
        if d0.magnitude().max(d1.magnitude()) < PITCH_SLOP {
            return;
        }
        let vertical = |d: &Point| d.y != 0.0 && d.y.abs() > d.x.abs();
        if vertical(&d0) && vertical(&d1) && d0.y.signum() == d1.y.signum() {
            self.ready = true;
        } else {
            log::debug!("pitch rejected, touches not moving vertically together");
            self.state = RecognizerState::Failed;
        }
    }
}

impl Recognize for PitchRecognizer {
    fn state(&self) -> RecognizerState {
        self.state
    }

    fn wants_to_begin(&self) -> bool {
        self.ready
    }

    fn handle(&mut self, frame: &TouchFrame<'_>) {
        if self.state.is_terminal() {
            return;
        }
        let count = frame.active.len();
        match frame.phase {
            TouchPhase::Start => {
                if self.state.is_active() {
                    if count != 2 {
                        lift(&mut self.state, TouchPhase::End);
                    }
                    return;
                }
                match frame.active {
                    [only] => self.single_origin = Some(only.position),
                    [first, second] => {
                        self.starts = Some([(first.id, first.position), (second.id, second.position)]);
                        self.angle_checked = false;
                    }
                    _ => self.state = RecognizerState::Failed,
                }
            }
            TouchPhase::Move => match self.state {
                RecognizerState::Possible => match count {
                    1 => {
                        let moved = match (self.single_origin, frame.active.first()) {
                            (Some(origin), Some(touch)) => touch.position.distance_to(&origin),
                            _ => 0.0,
                        };
                        if moved > PAN_SLOP {
                            self.state = RecognizerState::Failed;
                        }
                    }
                    2 => self.decide(frame),
                    _ => self.state = RecognizerState::Failed,
                },
                RecognizerState::Began | RecognizerState::Changed => {
                    if let Some(centroid) = frame.centroid(2) {
                        self.last_y = centroid.y;
                    }
                    self.state = RecognizerState::Changed;
                }
                _ => {}
            },
            TouchPhase::End | TouchPhase::Cancel => {
                if count < 2 {
                    lift(&mut self.state, frame.phase);
                }
            }
        }
    }

    fn begin(&mut self, frame: &TouchFrame<'_>) {
        self.state = RecognizerState::Began;
        self.ready = false;
        let y = frame.centroid(2).map(|c| c.y).unwrap_or_default();
        self.begin_y = y;
        self.last_y = y;
    }

    fn fail(&mut self) {
        self.state = RecognizerState::Failed;
        self.ready = false;
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Two fingers moving apart or together
#[derive(Debug, Clone)]
pub struct PinchRecognizer {
    state: RecognizerState,
    ready: bool,
    initial_distance: Option<f64>,
    begin_distance: f64,
    scale: f64,
    midpoint: Point,
}

impl Default for PinchRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PinchRecognizer {
    pub fn new() -> Self {
        Self {
            state: RecognizerState::Possible,
            ready: false,
            initial_distance: None,
            begin_distance: 1.0,
            scale: 1.0,
            midpoint: Point::default(),
        }
    }

    /// Scale since the gesture began, 1.0 when inactive
    pub fn scale(&self) -> f64 {
        if self.state.is_active() {
            self.scale
        } else {
            1.0
        }
    }

    pub fn midpoint(&self) -> Point {
        self.midpoint
    }
}

impl Recognize for PinchRecognizer {
    fn state(&self) -> RecognizerState {
        self.state
    }

    fn wants_to_begin(&self) -> bool {
        self.ready
    }

    fn handle(&mut self, frame: &TouchFrame<'_>) {
        if self.state.is_terminal() {
            return;
        }
        match frame.phase {
            TouchPhase::Start => {
                if let Some((a, b)) = frame.pair() {
                    if self.initial_distance.is_none() {
                        self.initial_distance = Some(a.distance_to(&b));
                    }
                    self.midpoint = a.midpoint(&b);
                }
            }
            TouchPhase::Move => {
                let Some((a, b)) = frame.pair() else {
                    return;
                };
                let distance = a.distance_to(&b);
                self.midpoint = a.midpoint(&b);
                match self.state {
                    RecognizerState::Possible => {
                        let initial = *self.initial_distance.get_or_insert(distance);
                        if (distance - initial).abs() > PINCH_SLOP {
                            self.ready = true;
                        }
                    }
                    RecognizerState::Began | RecognizerState::Changed => {
                        self.scale = distance / self.begin_distance;
                        self.state = RecognizerState::Changed;
                    }
                    _ => {}
                }
            }
            TouchPhase::End | TouchPhase::Cancel => {
                if frame.active.len() < 2 {
                    lift(&mut self.state, frame.phase);
                }
            }
        }
    }

    fn begin(&mut self, frame: &TouchFrame<'_>) {
        self.state = RecognizerState::Began;
        self.ready = false;
        self.scale = 1.0;
        if let Some((a, b)) = frame.pair() {
            self.begin_distance = a.distance_to(&b).max(f64::EPSILON);
            self.midpoint = a.midpoint(&b);
        }
    }

    fn fail(&mut self) {
        self.state = RecognizerState::Failed;
        self.ready = false;
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Two fingers turning around each other
#[derive(Debug, Clone)]
pub struct RotateRecognizer {
    state: RecognizerState,
    ready: bool,
    initial_angle: Option<f64>,
    begin_angle: f64,
    rotation: f64,
    midpoint: Point,
}

impl Default for RotateRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RotateRecognizer {
    pub fn new() -> Self {
        Self {
            state: RecognizerState::Possible,
            ready: false,
            initial_angle: None,
            begin_angle: 0.0,
            rotation: 0.0,
            midpoint: Point::default(),
        }
    }

    /// Degrees turned clockwise on screen since the gesture began
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn midpoint(&self) -> Point {
        self.midpoint
    }
}

impl Recognize for RotateRecognizer {
    fn state(&self) -> RecognizerState {
        self.state
    }

    fn wants_to_begin(&self) -> bool {
        self.ready
    }

    fn handle(&mut self, frame: &TouchFrame<'_>) {
        if self.state.is_terminal() {
            return;
        }
        match frame.phase {
            TouchPhase::Start => {
                if let Some((a, b)) = frame.pair() {
                    if self.initial_angle.is_none() {
                        self.initial_angle = Some(line_angle(a, b));
                    }
                    self.midpoint = a.midpoint(&b);
                }
            }
            TouchPhase::Move => {
                let Some((a, b)) = frame.pair() else {
                    return;
                };
                let angle = line_angle(a, b);
                self.midpoint = a.midpoint(&b);
                match self.state {
                    RecognizerState::Possible => {
                        let initial = *self.initial_angle.get_or_insert(angle);
                        if angle_delta(initial, angle).abs() > ROTATE_SLOP_DEGREES {
                            self.ready = true;
                        }
                    }
                    RecognizerState::Began | RecognizerState::Changed => {
                        self.rotation = angle_delta(self.begin_angle, angle);
                        self.state = RecognizerState::Changed;
                    }
                    _ => {}
                }
            }
            TouchPhase::End | TouchPhase::Cancel => {
                if frame.active.len() < 2 {
                    lift(&mut self.state, frame.phase);
                }
            }
        }
    }

    fn begin(&mut self, frame: &TouchFrame<'_>) {
        self.state = RecognizerState::Began;
        self.ready = false;
        self.rotation = 0.0;
        if let Some((a, b)) = frame.pair() {
            self.begin_angle = line_angle(a, b);
            self.midpoint = a.midpoint(&b);
        }
    }

    fn fail(&mut self) {
        self.state = RecognizerState::Failed;
        self.ready = false;
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum QuickZoomPhase {
    Idle,
    FirstDown { at: Instant, origin: Point },
    AwaitingSecond { up_at: Instant, location: Point },
    SecondDown { origin: Point },
}

/// Tap, then touch again and drag vertically
#[derive(Debug, Clone)]
pub struct QuickZoomRecognizer {
    state: RecognizerState,
    ready: bool,
    phase: QuickZoomPhase,
    anchor: Point,
    begin_y: f64,
    last_y: f64,
}

impl Default for QuickZoomRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuickZoomRecognizer {
    pub fn new() -> Self {
        Self {
            state: RecognizerState::Possible,
            ready: false,
            phase: QuickZoomPhase::Idle,
            anchor: Point::default(),
            begin_y: 0.0,
            last_y: 0.0,
        }
    }

    /// Where the second touch went down
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Vertical drag since the gesture began, positive downwards
    pub fn translation_y(&self) -> f64 {
        self.last_y - self.begin_y
    }
}

impl Recognize for QuickZoomRecognizer {
    fn state(&self) -> RecognizerState {
        self.state
    }

    fn wants_to_begin(&self) -> bool {
        self.ready
    }

    fn handle(&mut self, frame: &TouchFrame<'_>) {
        if self.state.is_terminal() {
            return;
        }
        let position = match frame.active {
            [] => None,
            [only] => Some(only.position),
            _ => {
                if self.state.is_active() {
                    self.state = RecognizerState::Cancelled;
                } else {
                    self.fail();
                }
                return;
            }
        };

        match (frame.phase, self.phase, position) {
            (TouchPhase::Start, QuickZoomPhase::AwaitingSecond { up_at, location }, Some(p))
                if seconds_between(frame.timestamp, up_at) <= DOUBLE_TAP_INTERVAL
                    && p.distance_to(&location) <= DOUBLE_TAP_SLOP =>
            {
                self.phase = QuickZoomPhase::SecondDown { origin: p };
            }
            (TouchPhase::Start, _, Some(p)) => {
                self.phase = QuickZoomPhase::FirstDown {
                    at: frame.timestamp,
                    origin: p,
                };
            }
            (TouchPhase::Move, QuickZoomPhase::FirstDown { origin, .. }, Some(p)) => {
                if p.distance_to(&origin) > TAP_SLOP {
                    self.fail();
                }
            }
            (TouchPhase::Move, QuickZoomPhase::SecondDown { origin }, Some(p)) => match self.state {
                RecognizerState::Possible => {
                    let d = p.subtract(&origin);
                    if d.magnitude() > TAP_SLOP {
                        if d.y.abs() >= d.x.abs() {
                            self.anchor = origin;
                            self.ready = true;
                        } else {
                            self.fail();
                        }
                    }
                }
                RecognizerState::Began | RecognizerState::Changed => {
                    self.last_y = p.y;
                    self.state = RecognizerState::Changed;
                }
                _ => {}
            },
            (TouchPhase::End, QuickZoomPhase::FirstDown { at, origin }, None) => {
                if seconds_between(frame.timestamp, at) <= TAP_MAX_DURATION {
                    self.phase = QuickZoomPhase::AwaitingSecond {
                        up_at: frame.timestamp,
                        location: origin,
                    };
                } else {
                    self.fail();
                }
            }
            (TouchPhase::End | TouchPhase::Cancel, _, None) => {
                self.ready = false;
                lift(&mut self.state, frame.phase);
            }
            _ => {}
        }
    }

    fn begin(&mut self, frame: &TouchFrame<'_>) {
        self.state = RecognizerState::Began;
        self.ready = false;
        let y = frame.active.first().map(|t| t.position.y).unwrap_or(self.anchor.y);
        self.begin_y = y;
        self.last_y = y;
    }

    fn fail(&mut self) {
        self.state = RecognizerState::Failed;
        self.ready = false;
        self.phase = QuickZoomPhase::Idle;
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn tick(&mut self, now: Instant) {
        if let QuickZoomPhase::AwaitingSecond { up_at, .. } = self.phase {
            if self.state == RecognizerState::Possible
                && seconds_between(now, up_at) > DOUBLE_TAP_INTERVAL
            {
                self.fail();
            }
        }
    }

    fn spans_sequences(&self) -> bool {
        true
    }
}

/// `taps` quick taps with `touches` fingers each
#[derive(Debug, Clone)]
pub struct TapRecognizer {
    taps: u8,
    touches: u8,
    state: RecognizerState,
    completed_taps: u8,
    tap_started: Option<Instant>,
    last_up: Option<Instant>,
    origins: Vec<(u64, Point)>,
    max_touches_seen: usize,
    first_location: Option<Point>,
    location: Point,
}

impl TapRecognizer {
    pub fn new(taps: u8, touches: u8) -> Self {
        Self {
            taps: taps.max(1),
            touches: touches.max(1),
            state: RecognizerState::Possible,
            completed_taps: 0,
            tap_started: None,
            last_up: None,
            origins: Vec::new(),
            max_touches_seen: 0,
            first_location: None,
            location: Point::default(),
        }
    }

    /// Centroid of the final tap
    pub fn location(&self) -> Point {
        self.location
    }

    fn tap_centroid(&self) -> Option<Point> {
        let points: Vec<Point> = self.origins.iter().map(|(_, p)| *p).collect();
        Point::centroid(&points)
    }
}

impl Recognize for TapRecognizer {
    fn state(&self) -> RecognizerState {
        self.state
    }

    fn wants_to_begin(&self) -> bool {
        false
    }

    fn handle(&mut self, frame: &TouchFrame<'_>) {
        if self.state.is_terminal() {
            return;
        }
        match frame.phase {
            TouchPhase::Start => {
                if let Some(up) = self.last_up {
                    if seconds_between(frame.timestamp, up) > DOUBLE_TAP_INTERVAL {
                        self.fail();
                        return;
                    }
                }
                if frame.active.len() > self.touches as usize {
                    self.fail();
                    return;
                }
                if self.origins.is_empty() {
                    self.tap_started = Some(frame.timestamp);
                }
                for touch in frame.active {
                    if !self.origins.iter().any(|(id, _)| *id == touch.id) {
                        self.origins.push((touch.id, touch.position));
                    }
                }
                self.max_touches_seen = self.max_touches_seen.max(frame.active.len());
                if self.max_touches_seen == self.touches as usize {
                    if let (Some(first), Some(here)) = (self.first_location, self.tap_centroid()) {
                        if here.distance_to(&first) > DOUBLE_TAP_SLOP {
                            self.fail();
                        }
                    }
                }
            }
            TouchPhase::Move => {
                let moved = frame.active.iter().any(|touch| {
                    self.origins
                        .iter()
                        .find(|(id, _)| *id == touch.id)
                        .map_or(false, |(_, origin)| touch.position.distance_to(origin) > TAP_SLOP)
                });
                if moved {
                    self.fail();
                }
            }
            TouchPhase::Cancel => self.fail(),
            TouchPhase::End => {
                if !frame.active.is_empty() {
                    return;
                }
                let held = self
                    .tap_started
                    .map_or(0.0, |start| seconds_between(frame.timestamp, start));
                if self.max_touches_seen != self.touches as usize || held > TAP_MAX_DURATION {
                    self.fail();
                    return;
                }
                let centroid = self.tap_centroid().unwrap_or_default();
                self.first_location.get_or_insert(centroid);
                self.location = centroid;
                self.completed_taps += 1;
                self.last_up = Some(frame.timestamp);
                self.origins.clear();
                self.max_touches_seen = 0;
                if self.completed_taps >= self.taps {
                    self.state = RecognizerState::Ended;
                }
            }
        }
    }

    fn begin(&mut self, _frame: &TouchFrame<'_>) {}

    fn fail(&mut self) {
        self.state = RecognizerState::Failed;
    }

    fn reset(&mut self) {
        *self = Self::new(self.taps, self.touches);
    }

    fn tick(&mut self, now: Instant) {
        if self.state != RecognizerState::Possible || self.completed_taps == 0 {
            return;
        }
        if let Some(up) = self.last_up {
            if seconds_between(now, up) > DOUBLE_TAP_INTERVAL {
                self.fail();
            }
        }
    }

    fn spans_sequences(&self) -> bool {
        true
    }
}
