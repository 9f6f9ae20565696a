//! Discrete input events fed to the router.
//!
//! The host turns keyboard, pointer, click and mutation callbacks into
//! [`InputEvent`]s and hands them to [`Router::handle`](crate::router::Router::handle)
//! together with the current time. Deferred work is driven by
//! [`InputEvent::Tick`]. All debounce and rate-limit windows live in
//! [`PointerJoystick`] as plain numbers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::JoystickConfig;
use crate::geometry::Direction;

/// Milliseconds on the host's monotonic clock (`performance.now()`).
pub type Millis = f64;

/// Keys the router reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NavKey {
    /// An arrow key.
    Arrow(Direction),
    /// Enter.
    Enter,
    /// Space bar.
    Space,
    /// Escape.
    Escape,
    /// Anything else.
    Other,
}

impl NavKey {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_key_name(key: &str) -> Self {
        match key {
            "ArrowUp" => NavKey::Arrow(Direction::Up),
            "ArrowDown" => NavKey::Arrow(Direction::Down),
            "ArrowLeft" => NavKey::Arrow(Direction::Left),
            "ArrowRight" => NavKey::Arrow(Direction::Right),
            "Enter" => NavKey::Enter,
            " " | "Spacebar" => NavKey::Space,
            "Escape" | "Esc" => NavKey::Escape,
            _ => NavKey::Other,
        }
    }
}

/// What kind of DOM change a mutation record describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added or removed.
    ChildList,
    /// An attribute changed.
    Attributes {
        /// Attribute name (`style`, `class`, ...).
        name: String,
    },
}

/// One DOM mutation record.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<E> {
    /// Kind of change.
    pub kind: MutationKind,
    /// Node the change happened on.
    pub target: E,
}

impl<E> Mutation<E> {
    /// A child-list change on `target`.
    pub fn child_list(target: E) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
        }
    }

    /// An attribute change on `target`.
    pub fn attribute(target: E, name: &str) -> Self {
        Self {
            kind: MutationKind::Attributes {
                name: name.to_string(),
            },
            target,
        }
    }

    /// Whether this is a change of the inline `style` attribute.
    pub fn is_style_change(&self) -> bool {
        matches!(&self.kind, MutationKind::Attributes { name } if name == "style")
    }
}

/// Events the router handles.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent<E> {
    /// A key went down.
    Key(NavKey),
    /// The pointer entered the document.
    PointerEnter {
        /// Client x.
        x: f64,
        /// Client y.
        y: f64,
    },
    /// The pointer moved.
    PointerMove {
        /// Client x.
        x: f64,
        /// Client y.
        y: f64,
    },
    /// The pointer went over an element.
    PointerOver {
        /// Element under the pointer.
        target: E,
    },
    /// A click reached the document.
    Click {
        /// Original click target.
        target: E,
    },
    /// A batch of DOM mutations was observed.
    DomChanged {
        /// Records in the batch.
        mutations: Vec<Mutation<E>>,
    },
    /// Time passed; run any deferred work that is due.
    Tick,
}

/// How the host should treat the native event after the router saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Disposition {
    /// Call `preventDefault()`.
    pub prevent_default: bool,
    /// Call `stopPropagation()`.
    pub stop_propagation: bool,
}

impl Disposition {
    /// Let the event through untouched.
    pub const PASS: Disposition = Disposition {
        prevent_default: false,
        stop_propagation: false,
    };

    /// Suppress the default action only.
    pub const PREVENT: Disposition = Disposition {
        prevent_default: true,
        stop_propagation: false,
    };

    /// Suppress the default action and stop propagation.
    pub const CONSUME: Disposition = Disposition {
        prevent_default: true,
        stop_propagation: true,
    };
}

/// Interprets pointer motion as discrete directional signals.
///
/// Keeps the last reference sample (position + time) and the time of the last
/// emitted direction. A sample is classified only when
///
/// - at least `debounce_ms` passed since the reference sample,
/// - at least `rate_limit_ms` passed since the last emitted direction,
/// - the dominant-axis displacement exceeds `distance_threshold_px`, and
/// - the dominant-axis speed exceeds `speed_threshold`.
///
/// Samples dropped by the two time windows leave the reference untouched, so
/// slow drags accumulate displacement. Every other sample becomes the new
/// reference.
#[derive(Debug, Clone)]
pub struct PointerJoystick {
    config: JoystickConfig,
    last_x: f64,
    last_y: f64,
    last_sample_at: Millis,
    last_direction_at: Option<Millis>,
}

impl PointerJoystick {
    /// Create a joystick with the reference sample at the origin, time 0.
    pub fn new(config: JoystickConfig) -> Self {
        Self {
            config,
            last_x: 0.0,
            last_y: 0.0,
            last_sample_at: 0.0,
            last_direction_at: None,
        }
    }

    /// Reset the reference sample (pointer entered the page).
    pub fn seed(&mut self, x: f64, y: f64, now: Millis) {
        self.last_x = x;
        self.last_y = y;
        self.last_sample_at = now;
    }

    /// Feed one motion sample; returns the direction it signals, if any.
    pub fn sample(&mut self, x: f64, y: f64, now: Millis) -> Option<Direction> {
        let elapsed = now - self.last_sample_at;
        if elapsed < self.config.debounce_ms {
            return None;
        }
        if let Some(at) = self.last_direction_at
            && now - at < self.config.rate_limit_ms
        {
            return None;
        }

        let dx = x - self.last_x;
        let dy = y - self.last_y;
        self.last_x = x;
        self.last_y = y;
        self.last_sample_at = now;

        // Guard against a zero debounce window producing an infinite speed.
        let elapsed = elapsed.max(f64::EPSILON);
        let horizontal = dx.abs() > dy.abs();
        let (distance, signed) = if horizontal { (dx.abs(), dx) } else { (dy.abs(), dy) };
        let speed = distance / elapsed;

        if distance <= self.config.distance_threshold_px || speed <= self.config.speed_threshold {
            return None;
        }

        self.last_direction_at = Some(now);
        Some(match (horizontal, signed > 0.0) {
            (true, true) => Direction::Right,
            (true, false) => Direction::Left,
            (false, true) => Direction::Down,
            (false, false) => Direction::Up,
        })
    }

    /// Forget the last emitted direction, lifting the rate limit.
    pub fn reset(&mut self) {
        self.last_direction_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joystick() -> PointerJoystick {
        let mut js = PointerJoystick::new(JoystickConfig::default());
        js.seed(100.0, 100.0, 0.0);
        js
    }

    #[test]
    fn test_key_names() {
        assert_eq!(NavKey::from_key_name("ArrowUp"), NavKey::Arrow(Direction::Up));
        assert_eq!(NavKey::from_key_name("ArrowRight"), NavKey::Arrow(Direction::Right));
        assert_eq!(NavKey::from_key_name(" "), NavKey::Space);
        assert_eq!(NavKey::from_key_name("Enter"), NavKey::Enter);
        assert_eq!(NavKey::from_key_name("Escape"), NavKey::Escape);
        assert_eq!(NavKey::from_key_name("a"), NavKey::Other);
    }

    #[test]
    fn test_fast_rightward_move_signals_right() {
        let mut js = joystick();
        // 40px in 50ms = 0.8 px/ms
        assert_eq!(js.sample(140.0, 100.0, 50.0), Some(Direction::Right));
    }

    #[test]
    fn test_jitter_ignored() {
        let mut js = joystick();
        assert_eq!(js.sample(105.0, 100.0, 50.0), None);
    }

    #[test]
    fn test_slow_move_ignored() {
        let mut js = joystick();
        // 40px in 100ms = 0.4 px/ms
        assert_eq!(js.sample(140.0, 100.0, 100.0), None);
    }

    #[test]
    fn test_debounce_window() {
        let mut js = joystick();
        assert_eq!(js.sample(200.0, 100.0, 10.0), None);
        // Reference was not updated by the debounced sample.
        assert_eq!(js.sample(160.0, 100.0, 40.0), Some(Direction::Right));
    }

    #[test]
    fn test_rate_limit_window() {
        let mut js = joystick();
        assert_eq!(js.sample(100.0, 160.0, 50.0), Some(Direction::Down));
        assert_eq!(js.sample(100.0, 220.0, 100.0), None);
        assert_eq!(js.sample(100.0, 280.0, 349.0), None);
        // 300ms after the last emitted move, measured from the 160 reference.
        assert_eq!(js.sample(100.0, 0.0, 350.0), Some(Direction::Up));
    }

    #[test]
    fn test_dominant_axis_and_sign() {
        let mut js = joystick();
        assert_eq!(js.sample(60.0, 90.0, 50.0), Some(Direction::Left));
        js.reset();
        assert_eq!(js.sample(50.0, 10.0, 100.0), Some(Direction::Up));
    }

    #[test]
    fn test_equal_axes_count_as_vertical() {
        let mut js = joystick();
        assert_eq!(js.sample(140.0, 140.0, 50.0), Some(Direction::Down));
    }

    #[test]
    fn test_mutation_style_detection() {
        assert!(Mutation::attribute(1u32, "style").is_style_change());
        assert!(!Mutation::attribute(1u32, "class").is_style_change());
        assert!(!Mutation::child_list(1u32).is_style_change());
    }
}
