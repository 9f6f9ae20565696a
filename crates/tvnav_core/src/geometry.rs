//! Screen geometry and the directional search.
//!
//! Everything here is pure: rectangles come in as plain numbers (CSS pixels,
//! viewport-relative, as returned by `getBoundingClientRect()`), and the
//! search returns an index into the slice it was given. The router feeds it
//! the centers of its current candidate snapshot.
//!
//! # Directional distance
//!
//! A candidate is eligible for a move only if its center lies strictly on the
//! requested side of the current center. Among eligible candidates the winner
//! minimizes
//!
//! ```text
//! sqrt(dx² + dy²) + 0.5 * |perpendicular offset|
//! ```
//!
//! where the perpendicular offset is `dx` for vertical moves and `dy` for
//! horizontal ones. The penalty prefers elements aligned with the movement
//! axis over ones that are merely closer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Weight applied to the offset perpendicular to the movement axis.
pub const PERPENDICULAR_WEIGHT: f64 = 0.5;

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An element's on-screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Distance from the top of the viewport.
    pub top: f64,
    /// Distance from the left of the viewport.
    pub left: f64,
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
}

impl Rect {
    /// Create a rect from its top-left corner and size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Build a rect of the given size centered on `(x, y)`.
    pub fn centered(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x - width / 2.0, y - height / 2.0, width, height)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Center point `(left + width/2, top + height/2)`.
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Whether this rect lies fully inside a viewport of the given size
    /// anchored at the origin.
    pub fn is_within(&self, viewport: Size) -> bool {
        self.top >= 0.0
            && self.left >= 0.0
            && self.bottom() <= viewport.height
            && self.right() <= viewport.width
    }
}

/// A width/height pair (viewport or element client size).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl Size {
    /// Create a size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The axis a move travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Up/down.
    Vertical,
    /// Left/right.
    Horizontal,
}

/// One of the four directional signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward smaller y.
    Up,
    /// Toward larger y.
    Down,
    /// Toward smaller x.
    Left,
    /// Toward larger x.
    Right,
}

impl Direction {
    /// All directions, in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Parse `"up"`, `"down"`, `"left"` or `"right"` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// The axis this direction moves along.
    pub fn axis(&self) -> Axis {
        match self {
            Direction::Up | Direction::Down => Axis::Vertical,
            Direction::Left | Direction::Right => Axis::Horizontal,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `to` lies strictly on the `direction` side of `from`.
///
/// Points on the boundary (equal coordinate along the axis) are excluded.
pub fn is_in_direction(from: Point, to: Point, direction: Direction) -> bool {
    match direction {
        Direction::Up => to.y < from.y,
        Direction::Down => to.y > from.y,
        Direction::Left => to.x < from.x,
        Direction::Right => to.x > from.x,
    }
}

/// Euclidean distance plus the half-weighted perpendicular offset.
pub fn directional_distance(from: Point, to: Point, direction: Direction) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let euclidean = (dx * dx + dy * dy).sqrt();
    let perpendicular = match direction.axis() {
        Axis::Vertical => dx.abs(),
        Axis::Horizontal => dy.abs(),
    };
    euclidean + perpendicular * PERPENDICULAR_WEIGHT
}

/// Find the best candidate in `direction` from `centers[current]`.
///
/// Returns the index of the candidate with the smallest directional distance
/// among those strictly in `direction`. The current index itself is never
/// returned. Ties go to the earliest index. Returns `None` when nothing lies
/// in that direction (there is no wraparound).
pub fn find_closest_in_direction(
    centers: &[Point],
    current: usize,
    direction: Direction,
) -> Option<usize> {
    let origin = *centers.get(current)?;
    let mut best: Option<(usize, f64)> = None;

    for (index, &center) in centers.iter().enumerate() {
        if index == current || !is_in_direction(origin, center, direction) {
            continue;
        }
        let distance = directional_distance(origin, center, direction);
        if distance.is_nan() {
            continue;
        }
        // Strict `<` keeps the first of equal candidates.
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }

    best.map(|(index, _)| index)
}
