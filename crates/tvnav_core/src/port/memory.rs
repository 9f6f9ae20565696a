//! In-memory document for tests and headless hosts.
//!
//! [`InMemoryDocument`] is a small element tree with just enough state for the
//! router: tag, classes, attributes, a bounding rect, a stylesheet-level
//! "hidden" flag and the `<body>` root. It records every side effect the
//! router performs (clicks, scroll requests, cursor and toggle state) so tests
//! can assert on them.
//!
//! Clones share the same tree. Mutating helpers return the [`Mutation`]
//! record a `MutationObserver` would have delivered, ready to be fed to the
//! router as [`InputEvent::DomChanged`](crate::input::InputEvent::DomChanged).
//!
//! Selectors are matched with `scraper` against an HTML rendering of the
//! attached tree, so HTML content rules apply: children of void elements such
//! as `<input>` are never matched.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use scraper::{ElementRef, Html, Selector};

use super::DocumentPort;
use crate::geometry::{Rect, Size};
use crate::input::Mutation;
use crate::selector;

/// Attribute that carries an [`ElementId`] through the HTML snapshot.
const ID_ATTRIBUTE: &str = "data-tvnav-id";

/// Default size of elements placed with [`ElementBuilder::at`].
const DEFAULT_WIDTH: f64 = 80.0;
const DEFAULT_HEIGHT: f64 = 40.0;

/// Handle to an element of an [`InMemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// A click dispatched through [`DocumentPort::dispatch_click`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedClick {
    /// Event target.
    pub target: ElementId,
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether the event is cancelable.
    pub cancelable: bool,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    rect: Rect,
    client_size: Option<Size>,
    /// Hidden by a stylesheet rule rather than inline style.
    hidden: bool,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent: None,
            children: Vec::new(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            rect: Rect::default(),
            client_size: None,
            hidden: false,
        }
    }

    fn inline_style_hides(&self) -> bool {
        self.attributes.get("style").is_some_and(|style| {
            let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            compact.contains("display:none") || compact.contains("visibility:hidden")
        })
    }
}

#[derive(Debug)]
struct DocumentState {
    nodes: Vec<Node>,
    viewport: Size,
    cursor_hidden: bool,
    toggle_checked: bool,
    clicks: Vec<DispatchedClick>,
    scrolls: Vec<ElementId>,
}

impl DocumentState {
    fn node(&self, id: ElementId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: ElementId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn is_attached(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == InMemoryDocument::BODY {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    fn detach(&mut self, id: ElementId) -> Option<ElementId> {
        let parent = self.node_mut(id).parent.take()?;
        self.node_mut(parent).children.retain(|child| *child != id);
        Some(parent)
    }

    /// The attached tree as an HTML document, each element tagged with its id.
    fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html><html><head></head>");
        self.write_element(InMemoryDocument::BODY, &mut out);
        out.push_str("</html>");
        out
    }

    fn write_element(&self, id: ElementId, out: &mut String) {
        let node = self.node(id);
        out.push('<');
        out.push_str(&node.tag);
        write_attribute(out, ID_ATTRIBUTE, &id.0.to_string());
        if !node.classes.is_empty() {
            write_attribute(out, "class", &node.classes.join(" "));
        }
        for (name, value) in &node.attributes {
            if name != "class" && name != ID_ATTRIBUTE {
                write_attribute(out, name, value);
            }
        }
        out.push('>');
        for child in &node.children {
            self.write_element(*child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
    out.push('"');
}

fn element_id(element: ElementRef<'_>) -> Option<ElementId> {
    element.value().attr(ID_ATTRIBUTE)?.parse().ok().map(ElementId)
}

fn find(html: &Html, id: ElementId) -> Option<ElementRef<'_>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element_id(*element) == Some(id))
}

/// An in-memory element tree implementing [`DocumentPort`].
///
/// # Example
///
/// ```
/// use tvnav_core::port::{DocumentPort, InMemoryDocument};
///
/// let doc = InMemoryDocument::new();
/// let play = doc.element("button").class("btn-primary").at(100.0, 100.0).build();
/// assert_eq!(doc.query_all("button"), vec![play]);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryDocument {
    state: Arc<RwLock<DocumentState>>,
}

impl Default for InMemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocument {
    /// The `<body>` element every document starts with.
    pub const BODY: ElementId = ElementId(0);

    /// Create a document with an empty body and a 1280x720 viewport.
    pub fn new() -> Self {
        Self::with_viewport(1280.0, 720.0)
    }

    /// Create a document with an empty body and the given viewport.
    pub fn with_viewport(width: f64, height: f64) -> Self {
        let mut body = Node::new("body");
        body.rect = Rect::new(0.0, 0.0, width, height);
        Self {
            state: Arc::new(RwLock::new(DocumentState {
                nodes: vec![body],
                viewport: Size::new(width, height),
                cursor_hidden: false,
                toggle_checked: false,
                clicks: Vec::new(),
                scrolls: Vec::new(),
            })),
        }
    }

    /// The `<body>` element.
    pub fn body(&self) -> ElementId {
        Self::BODY
    }

    /// Start building an element; it is appended to `<body>` unless told otherwise.
    pub fn element(&self, tag: &str) -> ElementBuilder<'_> {
        ElementBuilder {
            doc: self,
            node: Node::new(tag),
            parent: Some(Self::BODY),
        }
    }

    fn insert(&self, mut node: Node, parent: Option<ElementId>) -> ElementId {
        let mut state = self.state.write().unwrap();
        let id = ElementId(state.nodes.len());
        node.parent = parent;
        state.nodes.push(node);
        if let Some(parent) = parent {
            state.node_mut(parent).children.push(id);
        }
        id
    }

    // ==================== Mutations ====================

    /// Replace the inline `style` attribute.
    pub fn set_style(&self, id: ElementId, style: &str) -> Mutation<ElementId> {
        self.set_attribute(id, "style", style)
    }

    /// Set an attribute.
    pub fn set_attribute(&self, id: ElementId, name: &str, value: &str) -> Mutation<ElementId> {
        let mut state = self.state.write().unwrap();
        state
            .node_mut(id)
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Mutation::attribute(id, name)
    }

    /// Remove an attribute.
    pub fn remove_attribute(&self, id: ElementId, name: &str) -> Mutation<ElementId> {
        let mut state = self.state.write().unwrap();
        state.node_mut(id).attributes.remove(&name.to_ascii_lowercase());
        Mutation::attribute(id, name)
    }

    /// Toggle stylesheet-level hiding (e.g. a class rule with `display: none`).
    pub fn set_hidden(&self, id: ElementId, hidden: bool) -> Mutation<ElementId> {
        self.state.write().unwrap().node_mut(id).hidden = hidden;
        Mutation::attribute(id, "class")
    }

    /// Move an element (and its subtree) under `parent`.
    pub fn append(&self, parent: ElementId, id: ElementId) -> Mutation<ElementId> {
        let mut state = self.state.write().unwrap();
        state.detach(id);
        state.node_mut(id).parent = Some(parent);
        state.node_mut(parent).children.push(id);
        Mutation::child_list(parent)
    }

    /// Detach an element (and its subtree) from the document.
    pub fn remove(&self, id: ElementId) -> Mutation<ElementId> {
        let mut state = self.state.write().unwrap();
        let parent = state.detach(id).unwrap_or(Self::BODY);
        Mutation::child_list(parent)
    }

    /// Move an element on screen. Layout changes produce no mutation record.
    pub fn set_rect(&self, id: ElementId, rect: Rect) {
        self.state.write().unwrap().node_mut(id).rect = rect;
    }

    // ==================== Inspection ====================

    /// Whether an element currently carries a class.
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .node(id)
            .classes
            .iter()
            .any(|c| c == class)
    }

    /// All classes of an element, in insertion order.
    pub fn classes(&self, id: ElementId) -> Vec<String> {
        self.state.read().unwrap().node(id).classes.clone()
    }

    /// Whether `<body>` carries a class.
    pub fn root_has_class(&self, class: &str) -> bool {
        self.has_class(Self::BODY, class)
    }

    /// Whether the router asked to hide the pointer.
    pub fn cursor_hidden(&self) -> bool {
        self.state.read().unwrap().cursor_hidden
    }

    /// State of the external toggle control.
    pub fn toggle_checked(&self) -> bool {
        self.state.read().unwrap().toggle_checked
    }

    /// Flip the external toggle control as a user would.
    pub fn set_toggle(&self, checked: bool) {
        self.state.write().unwrap().toggle_checked = checked;
    }

    /// Clicks dispatched so far.
    pub fn clicks(&self) -> Vec<DispatchedClick> {
        self.state.read().unwrap().clicks.clone()
    }

    /// Elements scrolled into view so far.
    pub fn scrolls(&self) -> Vec<ElementId> {
        self.state.read().unwrap().scrolls.clone()
    }

    /// Forget recorded clicks and scrolls.
    pub fn clear_records(&self) {
        let mut state = self.state.write().unwrap();
        state.clicks.clear();
        state.scrolls.clear();
    }

    fn parse(selectors: &str) -> Option<Selector> {
        match selector::parse(selectors) {
            Ok(selector) => Some(selector),
            Err(e) => {
                log::warn!("InMemoryDocument: {}", e);
                None
            }
        }
    }

    /// Parse the attached tree so `scraper` can match against it.
    fn snapshot(&self) -> Html {
        Html::parse_document(&self.state.read().unwrap().to_html())
    }
}

impl DocumentPort for InMemoryDocument {
    type Element = ElementId;

    fn query_all(&self, selectors: &str) -> Vec<ElementId> {
        let Some(selector) = Self::parse(selectors) else {
            return Vec::new();
        };
        let html = self.snapshot();
        html.select(&selector).filter_map(element_id).collect()
    }

    fn is_rendered(&self, element: &ElementId) -> bool {
        let state = self.state.read().unwrap();
        let node = state.node(*element);
        state.is_attached(*element) && !node.hidden && !node.inline_style_hides()
    }

    fn is_disabled(&self, element: &ElementId) -> bool {
        self.state
            .read()
            .unwrap()
            .node(*element)
            .attributes
            .contains_key("disabled")
    }

    fn closest(&self, element: &ElementId, selectors: &str) -> Option<ElementId> {
        let selector = Self::parse(selectors)?;
        let html = self.snapshot();
        let start = find(&html, *element)?;
        std::iter::once(*start)
            .chain(start.ancestors())
            .filter_map(ElementRef::wrap)
            .filter(|candidate| selector.matches(candidate))
            .find_map(element_id)
    }

    fn matches(&self, element: &ElementId, selectors: &str) -> bool {
        let Some(selector) = Self::parse(selectors) else {
            return false;
        };
        let html = self.snapshot();
        find(&html, *element).is_some_and(|found| selector.matches(&found))
    }

    fn has_descendant_matching(&self, element: &ElementId, selectors: &str) -> bool {
        let Some(selector) = Self::parse(selectors) else {
            return false;
        };
        let html = self.snapshot();
        find(&html, *element).is_some_and(|found| {
            found
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .any(|descendant| selector.matches(&descendant))
        })
    }

    fn contains(&self, ancestor: &ElementId, node: &ElementId) -> bool {
        let state = self.state.read().unwrap();
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            current = state.node(id).parent;
        }
        false
    }

    fn bounding_rect(&self, element: &ElementId) -> Rect {
        let state = self.state.read().unwrap();
        if !state.is_attached(*element) {
            return Rect::default();
        }
        state.node(*element).rect
    }

    fn client_size(&self, element: &ElementId) -> Size {
        let state = self.state.read().unwrap();
        let node = state.node(*element);
        node.client_size
            .unwrap_or(Size::new(node.rect.width, node.rect.height))
    }

    fn viewport(&self) -> Size {
        self.state.read().unwrap().viewport
    }

    fn add_class(&self, element: &ElementId, class: &str) {
        let mut state = self.state.write().unwrap();
        let classes = &mut state.node_mut(*element).classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, element: &ElementId, class: &str) {
        let mut state = self.state.write().unwrap();
        state.node_mut(*element).classes.retain(|c| c != class);
    }

    fn set_root_class(&self, class: &str, present: bool) {
        if present {
            self.add_class(&Self::BODY, class);
        } else {
            self.remove_class(&Self::BODY, class);
        }
    }

    fn set_cursor_hidden(&self, hidden: bool) {
        self.state.write().unwrap().cursor_hidden = hidden;
    }

    fn scroll_into_view(&self, element: &ElementId) {
        self.state.write().unwrap().scrolls.push(*element);
    }

    fn dispatch_click(&self, element: &ElementId) {
        self.state.write().unwrap().clicks.push(DispatchedClick {
            target: *element,
            bubbles: true,
            cancelable: true,
        });
    }

    fn set_toggle_checked(&self, checked: bool) {
        self.set_toggle(checked);
    }
}

/// Builder returned by [`InMemoryDocument::element`].
pub struct ElementBuilder<'a> {
    doc: &'a InMemoryDocument,
    node: Node,
    parent: Option<ElementId>,
}

impl ElementBuilder<'_> {
    /// Add a class.
    pub fn class(mut self, class: &str) -> Self {
        self.node.classes.push(class.to_string());
        self
    }

    /// Set the `id` attribute.
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Set an attribute.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.node
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Set the inline `style` attribute.
    pub fn style(self, style: &str) -> Self {
        self.attr("style", style)
    }

    /// Mark as `disabled`.
    pub fn disabled(self) -> Self {
        self.attr("disabled", "")
    }

    /// Hide through a stylesheet rule.
    pub fn hidden(mut self) -> Self {
        self.node.hidden = true;
        self
    }

    /// Set the bounding rect.
    pub fn rect(mut self, rect: Rect) -> Self {
        self.node.rect = rect;
        self
    }

    /// Place an 80x40 element centered on `(x, y)`.
    pub fn at(self, x: f64, y: f64) -> Self {
        self.rect(Rect::centered(x, y, DEFAULT_WIDTH, DEFAULT_HEIGHT))
    }

    /// Override the client size (defaults to the rect size).
    pub fn client_size(mut self, width: f64, height: f64) -> Self {
        self.node.client_size = Some(Size::new(width, height));
        self
    }

    /// Append under `parent` instead of `<body>`.
    pub fn child_of(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Create the element outside the document.
    pub fn detached(mut self) -> Self {
        self.parent = None;
        self
    }

    /// Insert the element and return its handle.
    pub fn build(self) -> ElementId {
        self.doc.insert(self.node, self.parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_all_document_order() {
        let doc = InMemoryDocument::new();
        let nav = doc.element("div").class("menu").build();
        let first = doc.element("a").child_of(nav).build();
        let button = doc.element("button").build();
        let second = doc.element("a").child_of(nav).build();

        assert_eq!(doc.query_all("a, button"), vec![first, second, button]);
        assert_eq!(doc.query_all(".menu a"), vec![first, second]);
    }

    #[test]
    fn test_query_all_skips_detached() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").build();
        let b = doc.element("a").detached().build();
        assert_eq!(doc.query_all("a"), vec![a]);
        assert!(!doc.is_rendered(&b));
        doc.append(doc.body(), b);
        assert_eq!(doc.query_all("a"), vec![a, b]);
    }

    #[test]
    fn test_is_rendered_inline_style_and_hidden_flag() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").style("display: none").build();
        let b = doc.element("a").style("visibility:hidden").build();
        let c = doc.element("a").hidden().build();
        let d = doc.element("a").style("display: block").build();
        assert!(!doc.is_rendered(&a));
        assert!(!doc.is_rendered(&b));
        assert!(!doc.is_rendered(&c));
        assert!(doc.is_rendered(&d));
    }

    #[test]
    fn test_closest_and_contains() {
        let doc = InMemoryDocument::new();
        let modal = doc.element("div").class("modal").build();
        let body = doc.element("div").class("modal-body").child_of(modal).build();
        let button = doc.element("button").child_of(body).build();

        assert_eq!(doc.closest(&button, ".modal"), Some(modal));
        assert_eq!(doc.closest(&modal, ".modal"), Some(modal));
        assert_eq!(doc.closest(&button, ".sidebar"), None);
        assert!(doc.contains(&modal, &button));
        assert!(doc.contains(&button, &button));
        assert!(!doc.contains(&button, &modal));
        assert!(doc.has_descendant_matching(&modal, "button"));
        assert!(!doc.has_descendant_matching(&button, "button"));
    }

    #[test]
    fn test_class_and_attribute_mutations() {
        let doc = InMemoryDocument::new();
        let modal = doc.element("div").class("modal").style("display: none").build();
        assert!(doc.matches(&modal, "[style*=\"display: none\"]"));

        let mutation = doc.set_style(modal, "display: block");
        assert!(mutation.is_style_change());
        assert!(doc.matches(&modal, ".modal[style*=\"display: block\"]"));

        doc.add_class(&modal, "tv-focus");
        doc.add_class(&modal, "tv-focus");
        assert_eq!(doc.classes(modal), vec!["modal", "tv-focus"]);
        doc.remove_class(&modal, "tv-focus");
        assert!(!doc.has_class(modal, "tv-focus"));
    }

    #[test]
    fn test_remove_zeroes_geometry() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").at(100.0, 100.0).build();
        assert_eq!(doc.bounding_rect(&a).center().x, 100.0);
        doc.remove(a);
        assert_eq!(doc.bounding_rect(&a), Rect::default());
        assert!(doc.query_all("a").is_empty());
    }

    #[test]
    fn test_records_side_effects() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").build();
        doc.dispatch_click(&a);
        doc.scroll_into_view(&a);
        doc.set_cursor_hidden(true);
        doc.set_root_class("tv-mode-active", true);
        doc.set_toggle_checked(true);

        assert_eq!(
            doc.clicks(),
            vec![DispatchedClick {
                target: a,
                bubbles: true,
                cancelable: true
            }]
        );
        assert_eq!(doc.scrolls(), vec![a]);
        assert!(doc.cursor_hidden());
        assert!(doc.root_has_class("tv-mode-active"));
        assert!(doc.toggle_checked());

        doc.clear_records();
        assert!(doc.clicks().is_empty());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = InMemoryDocument::new();
        doc.element("a").build();
        assert!(doc.query_all("a[").is_empty());
        assert!(doc.query_all("a:hover").is_empty());
    }

    #[test]
    fn test_structural_selectors() {
        let doc = InMemoryDocument::new();
        let toolbar = doc.element("div").class("toolbar").build();
        let first = doc.element("a").class("btn-sm").child_of(toolbar).build();
        let second = doc.element("a").class("btn-sm").class("disabled").child_of(toolbar).build();
        let sibling = doc.element("button").class("btn-sm").build();

        assert_eq!(doc.query_all("a:not(.disabled)"), vec![first]);
        assert_eq!(doc.query_all(".toolbar + .btn-sm"), vec![sibling]);
        assert_eq!(doc.query_all(".toolbar a:first-child"), vec![first]);
        assert_eq!(doc.query_all(".toolbar > a ~ a"), vec![second]);
        assert!(doc.matches(&second, "[class~=\"disabled\"]"));
        assert_eq!(doc.closest(&second, "div.toolbar"), Some(toolbar));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let doc = InMemoryDocument::new();
        let a = doc.element("a").attr("title", "say \"hi\" & <go>").build();
        assert!(doc.matches(&a, "[title=\"say \\\"hi\\\" & <go>\"]"));
    }
}
