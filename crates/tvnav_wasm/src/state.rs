//! Global router state.

use std::cell::{Cell, RefCell};

use tvnav_core::Router;

use crate::dom::WebDocument;
use crate::storage::LocalStorage;

/// The router as wired to the browser.
pub type WebRouter = Router<WebDocument, LocalStorage>;

thread_local! {
    static ROUTER: RefCell<Option<WebRouter>> = const { RefCell::new(None) };
    static DEFERRED_MODE: Cell<Option<bool>> = const { Cell::new(None) };
}

/// Why the router could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// `startTvMode` has not run yet.
    NotStarted,
    /// The router is handling an event further up the stack.
    Busy,
}

/// Install the router. Replaces any previous one.
pub fn install(router: WebRouter) {
    ROUTER.with(|cell| *cell.borrow_mut() = Some(router));
}

/// Whether a router was installed.
pub fn is_started() -> bool {
    ROUTER.with(|cell| cell.try_borrow().map_or(true, |router| router.is_some()))
}

/// Execute a closure with mutable access to the router.
///
/// Events the router itself causes (its synthetic click, a toggle `change`
/// fired by that click) arrive while it is still borrowed; those report
/// [`Unavailable::Busy`] instead of panicking.
pub fn with_router<F, R>(f: F) -> Result<R, Unavailable>
where
    F: FnOnce(&mut WebRouter) -> R,
{
    ROUTER.with(|cell| {
        let mut guard = cell.try_borrow_mut().map_err(|_| Unavailable::Busy)?;
        guard.as_mut().map(f).ok_or(Unavailable::NotStarted)
    })
}

/// Remember a mode change requested while the router was busy.
pub fn defer_mode(enabled: bool) {
    DEFERRED_MODE.with(|mode| mode.set(Some(enabled)));
}

/// Take the most recent deferred mode change.
pub fn take_deferred_mode() -> Option<bool> {
    DEFERRED_MODE.with(|mode| mode.take())
}
