#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Error (common error types)
pub mod error;

/// Geometry and the directional search
pub mod geometry;

/// Input events, key mapping and the pointer joystick
pub mod input;

/// Host abstractions (document and key-value store)
pub mod port;

/// The focus router
pub mod router;

/// Deferred tasks
pub mod schedule;

/// CSS selector parsing and validation
pub mod selector;

pub use config::RouterConfig;
pub use error::{NavError, Result};
pub use geometry::Direction;
pub use input::{Disposition, InputEvent, NavKey};
pub use router::Router;
