use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::core::geo::Point;

/// Phase of a touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Individual touch point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

/// A platform touch event: the touches that changed, and when
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
    pub timestamp: Instant,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, timestamp: Instant) -> Self {
        Self {
            phase,
            touches,
            timestamp,
        }
    }

    pub fn start(touches: Vec<TouchPoint>, timestamp: Instant) -> Self {
        Self::new(TouchPhase::Start, touches, timestamp)
    }

    pub fn moved(touches: Vec<TouchPoint>, timestamp: Instant) -> Self {
        Self::new(TouchPhase::Move, touches, timestamp)
    }

    pub fn end(touches: Vec<TouchPoint>, timestamp: Instant) -> Self {
        Self::new(TouchPhase::End, touches, timestamp)
    }

    pub fn cancel(touches: Vec<TouchPoint>, timestamp: Instant) -> Self {
        Self::new(TouchPhase::Cancel, touches, timestamp)
    }
}

/// Touches currently on screen, in the order they went down
#[derive(Debug, Clone, Default)]
pub struct TouchSet {
    touches: Vec<TouchPoint>,
}

impl TouchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event; returns true when it starts a new touch sequence
    pub fn apply(&mut self, event: &TouchEvent) -> bool {
        let was_empty = self.touches.is_empty();
        match event.phase {
            TouchPhase::Start => {
                for touch in &event.touches {
                    match self.touches.iter_mut().find(|t| t.id == touch.id) {
                        Some(existing) => existing.position = touch.position,
                        None => self.touches.push(*touch),
                    }
                }
            }
            TouchPhase::Move => {
                for touch in &event.touches {
                    if let Some(existing) = self.touches.iter_mut().find(|t| t.id == touch.id) {
                        existing.position = touch.position;
                    }
                }
            }
            TouchPhase::End | TouchPhase::Cancel => {
                self.touches
                    .retain(|t| !event.touches.iter().any(|lifted| lifted.id == t.id));
            }
        }
        was_empty && event.phase == TouchPhase::Start && !self.touches.is_empty()
    }

    pub fn touches(&self) -> &[TouchPoint] {
        &self.touches
    }

    pub fn len(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    pub fn clear(&mut self) {
        self.touches.clear();
    }
}
