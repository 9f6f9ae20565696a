//! Host abstractions the router depends on.
//!
//! The router never touches a browser directly. Everything it needs from the
//! page goes through [`DocumentPort`]; the on/off flag goes through
//! [`KeyValueStore`]. The wasm crate implements both over `web-sys`, and
//! [`InMemoryDocument`] / [`MemoryStore`] implement them for tests and for
//! non-browser hosts.
//!
//! All `DocumentPort` methods are infallible. A host that cannot honour a
//! request (no cursor control, restricted geometry, detached element) does
//! nothing, or answers with an empty/neutral value.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use crate::error::{NavError, Result};
use crate::geometry::{Rect, Size};

mod memory;

pub use memory::{DispatchedClick, ElementBuilder, ElementId, InMemoryDocument};

/// Abstraction over the host document.
///
/// `Element` is a non-owning handle to a node in the host document. Handles
/// compare equal when they refer to the same node.
pub trait DocumentPort {
    /// Handle to an element of the host document.
    type Element: Clone + PartialEq + Debug;

    /// All elements matching a comma-separated selector list, in document order.
    fn query_all(&self, selectors: &str) -> Vec<Self::Element>;

    /// Whether the element's computed display/visibility lets it render.
    fn is_rendered(&self, element: &Self::Element) -> bool;

    /// Whether the element carries the `disabled` attribute.
    fn is_disabled(&self, element: &Self::Element) -> bool;

    /// Nearest inclusive ancestor matching `selectors`.
    fn closest(&self, element: &Self::Element, selectors: &str) -> Option<Self::Element>;

    /// Whether the element itself matches `selectors`.
    fn matches(&self, element: &Self::Element, selectors: &str) -> bool;

    /// Whether any descendant (excluding the element) matches `selectors`.
    fn has_descendant_matching(&self, element: &Self::Element, selectors: &str) -> bool;

    /// Whether `node` is `ancestor` or lies inside it.
    fn contains(&self, ancestor: &Self::Element, node: &Self::Element) -> bool;

    /// On-screen rectangle, viewport-relative.
    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Inner (client) width and height.
    fn client_size(&self, element: &Self::Element) -> Size;

    /// Size of the visible viewport.
    fn viewport(&self) -> Size;

    /// Add a CSS class to an element.
    fn add_class(&self, element: &Self::Element, class: &str);

    /// Remove a CSS class from an element.
    fn remove_class(&self, element: &Self::Element, class: &str);

    /// Add or remove a class on the document root container (`<body>`).
    fn set_root_class(&self, class: &str, present: bool);

    /// Hide or restore the system pointer cursor.
    fn set_cursor_hidden(&self, hidden: bool);

    /// Smooth-scroll the element into view, nearest edge.
    fn scroll_into_view(&self, element: &Self::Element);

    /// Dispatch a bubbling, cancelable click event on the element.
    fn dispatch_click(&self, element: &Self::Element);

    /// Reflect the mode in the page's external toggle control.
    fn set_toggle_checked(&self, checked: bool);
}

/// Persistent string key-value store (e.g. `localStorage`).
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// An in-memory key-value store.
///
/// Clones share the same underlying map, so a test can keep a handle while the
/// router owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    read_only: bool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value (builder pattern).
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make every write fail, like a browser with storage disabled.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Current value for a key (for test assertions).
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.read().unwrap().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.read_only {
            return Err(NavError::Storage(format!(
                "store is read-only, cannot write '{}'",
                key
            )));
        }
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// Blanket implementation for references to KeyValueStore
impl<T: KeyValueStore> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (*self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (*self).set(key, value)
    }
}
