//! The directional focus router.
//!
//! [`Router`] owns the TV-mode state for one page: whether the mode is on,
//! which element holds logical focus, and the most recent snapshot of
//! focusable candidates. It reaches the page only through a
//! [`DocumentPort`] and persists its on/off flag through a [`KeyValueStore`].
//!
//! # Architecture
//!
//! ```text
//! keydown / mousemove / click / MutationObserver / setTimeout
//!            ↓ (host binding)
//!   InputEvent + now ──→ Router::handle ──→ Disposition
//!                           ↓        ↑
//!                     DocumentPort   DeferredQueue (settle, transient classes)
//! ```
//!
//! The candidate snapshot is rebuilt from scratch on every refresh and never
//! patched, so a move is always computed against what is on screen right now.

use serde::Serialize;
use ts_rs::TS;

use crate::config::RouterConfig;
use crate::geometry::{Direction, Point, Rect, find_closest_in_direction};
use crate::input::{Disposition, InputEvent, Millis, Mutation, NavKey, PointerJoystick};
use crate::port::{DocumentPort, KeyValueStore};
use crate::schedule::{DeferredQueue, Task};
use crate::selector;

/// One candidate for focus, valid until the next refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusableItem<E> {
    /// The element (non-owning handle).
    pub element: E,
    /// Bounding rect at refresh time.
    pub rect: Rect,
    /// Center of `rect`.
    pub center: Point,
}

/// Mode flag, current focus and candidate snapshot.
#[derive(Debug, Clone)]
struct RouterState<E> {
    active: bool,
    current: Option<E>,
    candidates: Vec<FocusableItem<E>>,
}

impl<E> Default for RouterState<E> {
    fn default() -> Self {
        Self {
            active: false,
            current: None,
            candidates: Vec::new(),
        }
    }
}

/// Summary of the router for the JS side.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RouterStatus {
    /// Whether the mode is on.
    pub active: bool,
    /// Whether some element holds focus.
    pub has_focus: bool,
    /// Size of the current snapshot.
    pub candidate_count: usize,
    /// Deferred tasks not yet run.
    pub pending_tasks: usize,
    /// When the host should tick next.
    pub next_deadline: Option<f64>,
}

/// Directional focus router over a host document.
pub struct Router<P: DocumentPort, S: KeyValueStore> {
    port: P,
    store: S,
    config: RouterConfig,
    /// Selector lists joined once, in the form the port expects.
    focusable: String,
    small_targets: String,
    hidden_containers: String,
    state: RouterState<P::Element>,
    joystick: PointerJoystick,
    deferred: DeferredQueue<P::Element>,
}

impl<P: DocumentPort, S: KeyValueStore> Router<P, S> {
    /// Create an inactive router. Nothing touches the page until
    /// [`restore`](Self::restore) or [`set_active`](Self::set_active).
    pub fn new(port: P, store: S, config: RouterConfig) -> Self {
        Self {
            focusable: selector::join(&config.focusable_selectors),
            small_targets: selector::join(&config.small_target_selectors),
            hidden_containers: selector::join(&config.hidden_container_selectors),
            joystick: PointerJoystick::new(config.joystick.clone()),
            state: RouterState::default(),
            deferred: DeferredQueue::new(),
            port,
            store,
            config,
        }
    }

    /// Create a router with [`RouterConfig::default`].
    pub fn with_defaults(port: P, store: S) -> Self {
        Self::new(port, store, RouterConfig::default())
    }

    /// Apply the persisted flag: if the mode was on, check the toggle and
    /// turn it back on. A missing or unreadable value means "off".
    pub fn restore(&mut self) {
        match self.store.get(&self.config.storage_key) {
            Ok(Some(value)) if value == "true" => {
                log::debug!("Router: restoring saved TV-mode state");
                self.port.set_toggle_checked(true);
                self.set_active(true);
            }
            Ok(_) => {}
            Err(e) => log::warn!("Router: failed to read saved TV-mode state: {}", e),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether the mode is on.
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Element holding logical focus.
    pub fn current(&self) -> Option<&P::Element> {
        self.state.current.as_ref()
    }

    /// Most recent candidate snapshot.
    pub fn candidates(&self) -> &[FocusableItem<P::Element>] {
        &self.state.candidates
    }

    /// When the host should next deliver [`InputEvent::Tick`].
    pub fn next_deadline(&self) -> Option<Millis> {
        self.deferred.next_due()
    }

    /// Summary for the JS side.
    pub fn status(&self) -> RouterStatus {
        RouterStatus {
            active: self.state.active,
            has_focus: self.state.current.is_some(),
            candidate_count: self.state.candidates.len(),
            pending_tasks: self.deferred.len(),
            next_deadline: self.next_deadline(),
        }
    }

    // ========================================================================
    // Mode
    // ========================================================================

    /// Turn directional navigation on or off and persist the flag.
    ///
    /// Calling with the current value only re-persists.
    pub fn set_active(&mut self, enabled: bool) {
        self.persist(enabled);
        if enabled == self.state.active {
            return;
        }

        log::debug!("Router: TV-mode {}", if enabled { "on" } else { "off" });
        self.state.active = enabled;
        self.port
            .set_root_class(&self.config.classes.mode_active, enabled);

        if enabled {
            self.refresh_candidates();
            if self.state.current.is_none() {
                self.focus_first();
            }
            self.port.set_cursor_hidden(true);
        } else {
            self.clear_focus();
            self.joystick.reset();
            self.port
                .set_root_class(&self.config.classes.pointer_moving, false);
            self.port.set_cursor_hidden(false);
        }
    }

    fn persist(&self, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.store.set(&self.config.storage_key, value) {
            log::warn!("Router: failed to persist TV-mode state: {}", e);
        }
    }

    // ========================================================================
    // Candidates
    // ========================================================================

    /// Rebuild the candidate snapshot from the document.
    ///
    /// Keeps elements that match the focusable selectors, render, are not
    /// disabled and do not sit inside a hidden container; records their
    /// geometry. Only the snapshot changes.
    pub fn refresh_candidates(&mut self) {
        let candidates: Vec<_> = self
            .port
            .query_all(&self.focusable)
            .into_iter()
            .filter(|element| self.is_candidate(element))
            .map(|element| {
                let rect = self.port.bounding_rect(&element);
                FocusableItem {
                    center: rect.center(),
                    rect,
                    element,
                }
            })
            .collect();

        log::debug!("Router: {} focusable candidates", candidates.len());
        self.state.candidates = candidates;
    }

    fn is_candidate(&self, element: &P::Element) -> bool {
        if !self.port.is_rendered(element) || self.port.is_disabled(element) {
            return false;
        }
        self.hidden_containers.is_empty()
            || self
                .port
                .closest(element, &self.hidden_containers)
                .is_none()
    }

    fn position_of(&self, element: &P::Element) -> Option<usize> {
        self.state
            .candidates
            .iter()
            .position(|item| item.element == *element)
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// Focus the first candidate of the snapshot, if any.
    pub fn focus_first(&mut self) {
        if let Some(first) = self.state.candidates.first() {
            let element = first.element.clone();
            self.set_focus(element);
        }
    }

    /// Drop logical focus and its indicator classes.
    pub fn clear_focus(&mut self) {
        if let Some(element) = self.state.current.take() {
            self.port.remove_class(&element, &self.config.classes.focus);
            self.port
                .remove_class(&element, &self.config.classes.focus_small);
        }
    }

    /// Move logical focus to `element`.
    ///
    /// Applies the focus indicator (plus the small-target variant for tiny
    /// controls) and scrolls the element into view unless it is already fully
    /// visible.
    pub fn set_focus(&mut self, element: P::Element) {
        self.clear_focus();

        self.port.add_class(&element, &self.config.classes.focus);
        if self.is_small_target(&element) {
            self.port
                .add_class(&element, &self.config.classes.focus_small);
        }

        let rect = self.port.bounding_rect(&element);
        if !rect.is_within(self.port.viewport()) {
            self.port.scroll_into_view(&element);
        }

        log::debug!("Router: focus -> {:?}", element);
        self.state.current = Some(element);
    }

    /// Small controls (close buttons and the like) get a stronger indicator.
    fn is_small_target(&self, element: &P::Element) -> bool {
        if !self.small_targets.is_empty()
            && (self.port.matches(element, &self.small_targets)
                || self
                    .port
                    .has_descendant_matching(element, &self.small_targets))
        {
            return true;
        }
        let size = self.port.client_size(element);
        size.width < self.config.small_target_px || size.height < self.config.small_target_px
    }

    /// Move focus to the best candidate in `direction`.
    ///
    /// Returns whether focus changed. Without a focused element (or with an
    /// empty snapshot) this focuses the first candidate instead of searching.
    /// When nothing lies in `direction`, focus stays put.
    pub fn move_focus(&mut self, direction: Direction) -> bool {
        let before = self.state.current.clone();

        if self.state.current.is_none() || self.state.candidates.is_empty() {
            self.refresh_candidates();
            self.focus_first();
            return self.state.current != before;
        }

        self.refresh_candidates();

        let Some(index) = before.as_ref().and_then(|current| self.position_of(current)) else {
            log::debug!("Router: focused element vanished, refocusing first candidate");
            self.clear_focus();
            self.focus_first();
            return self.state.current != before;
        };

        let centers: Vec<Point> = self.state.candidates.iter().map(|item| item.center).collect();
        match find_closest_in_direction(&centers, index, direction) {
            Some(next) => {
                let element = self.state.candidates[next].element.clone();
                self.set_focus(element);
                true
            }
            None => {
                log::debug!("Router: nothing {} of current focus", direction);
                false
            }
        }
    }

    /// Press the focused element: brief pressed indicator plus a synthetic
    /// click. Returns whether anything was focused.
    pub fn activate_current(&mut self, now: Millis) -> bool {
        let Some(element) = self.state.current.clone() else {
            return false;
        };

        let pressed = self.config.classes.pressed.clone();
        self.port.add_class(&element, &pressed);
        self.deferred.schedule(
            now + self.config.timing.pressed_ms,
            Task::RemoveClass {
                element: element.clone(),
                class: pressed,
            },
        );

        self.port.dispatch_click(&element);
        true
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Handle one input event at time `now`.
    ///
    /// Everything but `Tick` and `PointerEnter` is ignored while the mode is
    /// off.
    pub fn handle(&mut self, event: InputEvent<P::Element>, now: Millis) -> Disposition {
        match event {
            InputEvent::Tick => {
                self.run_due(now);
                Disposition::PASS
            }
            InputEvent::PointerEnter { x, y } => {
                self.joystick.seed(x, y, now);
                Disposition::PASS
            }
            _ if !self.state.active => Disposition::PASS,
            InputEvent::Key(key) => self.on_key(key, now),
            InputEvent::PointerMove { x, y } => self.on_pointer_move(x, y, now),
            InputEvent::PointerOver { target } => self.on_pointer_over(target, now),
            InputEvent::Click { target } => self.on_click(target, now),
            InputEvent::DomChanged { mutations } => self.on_dom_changed(&mutations, now),
        }
    }

    fn on_key(&mut self, key: NavKey, now: Millis) -> Disposition {
        match key {
            NavKey::Arrow(direction) => {
                self.move_focus(direction);
                Disposition::PREVENT
            }
            NavKey::Enter | NavKey::Space => {
                self.activate_current(now);
                Disposition::PREVENT
            }
            NavKey::Escape => {
                self.set_active(false);
                self.port.set_toggle_checked(false);
                Disposition::PASS
            }
            NavKey::Other => Disposition::PASS,
        }
    }

    fn mark_pointer_activity(&mut self, now: Millis) {
        self.port
            .set_root_class(&self.config.classes.pointer_moving, true);
        self.deferred.reschedule(
            now + self.config.timing.pointer_activity_ms,
            Task::EndPointerActivity,
        );
    }

    fn on_pointer_move(&mut self, x: f64, y: f64, now: Millis) -> Disposition {
        self.mark_pointer_activity(now);

        if let Some(direction) = self.joystick.sample(x, y, now) {
            log::debug!("Router: pointer gesture {}", direction);
            self.move_focus(direction);

            if let Some(element) = self.state.current.clone() {
                let class = self.config.classes.direction_change.clone();
                self.port.add_class(&element, &class);
                self.deferred.schedule(
                    now + self.config.timing.direction_change_ms,
                    Task::RemoveClass { element, class },
                );
            }
        }
        Disposition::PASS
    }

    fn on_pointer_over(&mut self, target: P::Element, now: Millis) -> Disposition {
        if self.position_of(&target).is_none() {
            return Disposition::PASS;
        }
        self.mark_pointer_activity(now);
        if self.state.current.as_ref() != Some(&target) {
            self.set_focus(target);
        }
        Disposition::PASS
    }

    fn on_click(&mut self, target: P::Element, now: Millis) -> Disposition {
        let Some(current) = self.state.current.clone() else {
            return Disposition::PASS;
        };
        if self.port.contains(&current, &target) {
            return Disposition::PASS;
        }
        self.activate_current(now);
        Disposition::CONSUME
    }

    fn on_dom_changed(&mut self, mutations: &[Mutation<P::Element>], now: Millis) -> Disposition {
        let relevant = mutations.iter().any(|mutation| {
            mutation.is_style_change()
                || self
                    .port
                    .closest(&mutation.target, &self.config.modal_selector)
                    .is_some()
        });
        if relevant {
            self.deferred
                .schedule(now + self.config.timing.settle_ms, Task::SettleRefresh);
        }
        Disposition::PASS
    }

    fn run_due(&mut self, now: Millis) {
        for task in self.deferred.take_due(now) {
            match task {
                Task::SettleRefresh => self.settle_refresh(),
                Task::RemoveClass { element, class } => self.port.remove_class(&element, &class),
                Task::EndPointerActivity => self
                    .port
                    .set_root_class(&self.config.classes.pointer_moving, false),
            }
        }
    }

    /// Post-mutation refresh: drop stale focus, pull focus into a newly
    /// opened modal, or make sure something is focused.
    fn settle_refresh(&mut self) {
        if !self.state.active {
            return;
        }
        self.refresh_candidates();

        let stale = self
            .state
            .current
            .as_ref()
            .is_some_and(|current| self.position_of(current).is_none());
        if stale {
            log::debug!("Router: focused element left the snapshot");
            self.clear_focus();
        }

        let open_modal = self
            .port
            .query_all(&self.config.open_modal_selector)
            .into_iter()
            .next();

        match open_modal {
            Some(modal) => {
                let modal_selector = &self.config.modal_selector;
                let owning_modal =
                    |element: &P::Element| self.port.closest(element, modal_selector);

                // Focus already inside this modal stays where the user put it.
                let already_inside = self
                    .state
                    .current
                    .as_ref()
                    .is_some_and(|current| owning_modal(current).as_ref() == Some(&modal));
                if already_inside {
                    return;
                }

                let first_in_modal = self
                    .state
                    .candidates
                    .iter()
                    .find(|item| owning_modal(&item.element).as_ref() == Some(&modal))
                    .map(|item| item.element.clone());
                if let Some(element) = first_in_modal {
                    self.set_focus(element);
                }
            }
            None => {
                if self.state.current.is_none() {
                    self.focus_first();
                }
            }
        }
    }
}

impl<P, S> std::fmt::Debug for Router<P, S>
where
    P: DocumentPort,
    S: KeyValueStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("active", &self.state.active)
            .field("current", &self.state.current)
            .field("candidates", &self.state.candidates.len())
            .field("pending_tasks", &self.deferred.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{ElementId, InMemoryDocument, MemoryStore};

    fn router(doc: &InMemoryDocument) -> Router<InMemoryDocument, MemoryStore> {
        Router::with_defaults(doc.clone(), MemoryStore::new())
    }

    #[test]
    fn test_refresh_filters_hidden_disabled_and_hidden_containers() {
        let doc = InMemoryDocument::new();
        let visible = doc.element("button").at(100.0, 100.0).build();
        doc.element("button").at(200.0, 100.0).disabled().build();
        doc.element("button").at(300.0, 100.0).style("display: none").build();
        let wrapper = doc.element("div").class("hidden").build();
        doc.element("a").child_of(wrapper).at(400.0, 100.0).build();
        let collapsed = doc.element("div").style("display: none").build();
        doc.element("a").child_of(collapsed).at(500.0, 100.0).build();
        doc.element("div").at(600.0, 100.0).build(); // not interactive

        let mut router = router(&doc);
        router.refresh_candidates();

        let elements: Vec<ElementId> = router.candidates().iter().map(|c| c.element).collect();
        assert_eq!(elements, vec![visible]);
        assert_eq!(router.candidates()[0].center, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_refresh_has_no_focus_side_effects() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").at(100.0, 100.0).build();
        let mut router = router(&doc);
        router.refresh_candidates();
        assert!(router.current().is_none());
        assert!(doc.classes(a).is_empty());
    }

    #[test]
    fn test_set_focus_moves_indicator() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").at(100.0, 100.0).build();
        let b = doc.element("a").at(300.0, 100.0).build();
        let mut router = router(&doc);

        router.set_focus(a);
        assert!(doc.has_class(a, "tv-focus"));
        router.set_focus(b);
        assert!(!doc.has_class(a, "tv-focus"));
        assert!(doc.has_class(b, "tv-focus"));
        assert_eq!(router.current(), Some(&b));
    }

    #[test]
    fn test_small_target_by_selector_by_size_and_by_descendant() {
        let doc = InMemoryDocument::new();
        let close = doc.element("span").class("close").at(100.0, 100.0).build();
        let tiny = doc.element("a").rect(Rect::new(0.0, 0.0, 24.0, 60.0)).build();
        let wrapper = doc.element("div").attr("role", "button").at(300.0, 300.0).build();
        doc.element("span").id("close-preview").child_of(wrapper).build();
        let regular = doc.element("button").at(500.0, 100.0).build();
        let mut router = router(&doc);

        for element in [close, tiny, wrapper] {
            router.set_focus(element);
            assert!(doc.has_class(element, "tv-focus-small"), "{:?}", element);
        }
        router.set_focus(regular);
        assert!(!doc.has_class(regular, "tv-focus-small"));
        // Previous target lost both classes.
        assert!(doc.classes(wrapper).is_empty());
    }

    #[test]
    fn test_client_size_drives_small_target_check() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").at(100.0, 100.0).client_size(80.0, 39.0).build();
        let mut router = router(&doc);
        router.set_focus(a);
        assert!(doc.has_class(a, "tv-focus-small"));
    }

    #[test]
    fn test_scroll_only_when_outside_viewport() {
        let doc = InMemoryDocument::with_viewport(800.0, 600.0);
        let inside = doc.element("a").at(100.0, 100.0).build();
        let below = doc.element("a").at(100.0, 900.0).build();
        let clipped = doc.element("a").at(100.0, 590.0).build();
        let mut router = router(&doc);

        router.set_focus(inside);
        router.set_focus(below);
        router.set_focus(clipped);
        assert_eq!(doc.scrolls(), vec![below, clipped]);
    }

    #[test]
    fn test_move_focus_without_focus_focuses_first() {
        let doc = InMemoryDocument::new();
        let first = doc.element("a").at(500.0, 500.0).build();
        doc.element("a").at(100.0, 100.0).build();
        let mut router = router(&doc);

        assert!(router.move_focus(Direction::Up));
        assert_eq!(router.current(), Some(&first));
    }

    #[test]
    fn test_move_focus_empty_document_is_noop() {
        let doc = InMemoryDocument::new();
        let mut router = router(&doc);
        for direction in Direction::ALL {
            assert!(!router.move_focus(direction));
        }
        assert!(router.current().is_none());
    }

    #[test]
    fn test_move_focus_recovers_from_vanished_element() {
        let doc = InMemoryDocument::new();
        let first = doc.element("a").at(100.0, 100.0).build();
        let second = doc.element("a").at(100.0, 300.0).build();
        let mut router = router(&doc);
        router.refresh_candidates();
        router.set_focus(second);

        doc.remove(second);
        assert!(router.move_focus(Direction::Down));
        assert_eq!(router.current(), Some(&first));
        assert!(!doc.has_class(second, "tv-focus"));
    }

    #[test]
    fn test_activate_without_focus_is_noop() {
        let doc = InMemoryDocument::new();
        let mut router = router(&doc);
        assert!(!router.activate_current(0.0));
        assert!(doc.clicks().is_empty());
        assert!(router.next_deadline().is_none());
    }

    #[test]
    fn test_pressed_indicator_is_transient() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").at(100.0, 100.0).build();
        let mut router = router(&doc);
        router.set_active(true);

        router.handle(InputEvent::Key(NavKey::Enter), 1000.0);
        assert!(doc.has_class(a, "tv-active"));
        assert_eq!(router.next_deadline(), Some(1200.0));

        router.handle(InputEvent::Tick, 1199.0);
        assert!(doc.has_class(a, "tv-active"));
        router.handle(InputEvent::Tick, 1200.0);
        assert!(!doc.has_class(a, "tv-active"));
    }

    #[test]
    fn test_events_ignored_while_inactive() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").at(100.0, 100.0).build();
        let mut router = router(&doc);

        let d = router.handle(InputEvent::Key(NavKey::Arrow(Direction::Down)), 0.0);
        assert_eq!(d, Disposition::PASS);
        let d = router.handle(InputEvent::Click { target: a }, 0.0);
        assert_eq!(d, Disposition::PASS);
        router.handle(InputEvent::DomChanged { mutations: vec![doc.set_style(a, "color: red")] }, 0.0);
        assert!(router.current().is_none());
        assert!(router.next_deadline().is_none());
    }

    #[test]
    fn test_status_summary() {
        let doc = InMemoryDocument::new();
        doc.element("a").at(100.0, 100.0).build();
        doc.element("a").at(300.0, 100.0).build();
        let mut router = router(&doc);
        router.set_active(true);
        router.activate_current(0.0);

        let status = router.status();
        assert!(status.active);
        assert!(status.has_focus);
        assert_eq!(status.candidate_count, 2);
        assert_eq!(status.pending_tasks, 1);
        assert_eq!(status.next_deadline, Some(200.0));
    }
}
