use serde::{Deserialize, Serialize};

/// Pointer movement in pixels before a press becomes a drag
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Tracks a pointer press on a block handle.
///
/// The press only turns into a drag once the pointer has moved at least the
/// activation distance from where it went down; short presses stay clicks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragGesture {
    origin: Point,
    activation_distance: f64,
    active: bool,
}

impl DragGesture {
    pub fn start(origin: Point) -> Self {
        Self::with_activation_distance(origin, DEFAULT_ACTIVATION_DISTANCE)
    }

    pub fn with_activation_distance(origin: Point, activation_distance: f64) -> Self {
        Self {
            origin,
            activation_distance,
            active: false,
        }
    }

    /// Feed a pointer move; returns whether the gesture is now a drag
    pub fn update(&mut self, pointer: Point) -> bool {
        if !self.active && self.origin.distance_to(pointer) >= self.activation_distance {
            self.active = true;
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
