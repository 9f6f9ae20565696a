//! `DocumentPort` over the live browser document.

use tvnav_core::geometry::{Rect, Size};
use tvnav_core::port::DocumentPort;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlElement, HtmlInputElement, MouseEvent, MouseEventInit, Node,
    ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, Window,
};

use crate::toggle::TOGGLE_ID;

/// Render a thrown JS value for logs and error messages.
pub(crate) fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn warn_on_err(result: Result<(), JsValue>, what: &str) {
    if let Err(e) = result {
        log::warn!("WebDocument: {} failed: {}", what, js_error(&e));
    }
}

/// The page the module was loaded into.
#[derive(Debug, Clone)]
pub struct WebDocument {
    window: Window,
    document: Document,
}

impl WebDocument {
    /// Wrap `window` and its document.
    pub fn new(window: Window) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self { window, document })
    }

    /// The current global window.
    pub fn from_global() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        Self::new(window)
    }

    /// The wrapped document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The wrapped window.
    pub fn window(&self) -> &Window {
        &self.window
    }

    fn root_style_target(&self) -> Option<HtmlElement> {
        self.document
            .document_element()
            .and_then(|root| root.dyn_into::<HtmlElement>().ok())
    }

    fn window_dimension(value: Result<JsValue, JsValue>) -> Option<f64> {
        value.ok().and_then(|v| v.as_f64()).filter(|v| *v > 0.0)
    }
}

impl DocumentPort for WebDocument {
    type Element = Element;

    fn query_all(&self, selectors: &str) -> Vec<Element> {
        match self.document.query_selector_all(selectors) {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.item(i))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(e) => {
                log::warn!("WebDocument: invalid selector '{}': {}", selectors, js_error(&e));
                Vec::new()
            }
        }
    }

    fn is_rendered(&self, element: &Element) -> bool {
        let Ok(Some(style)) = self.window.get_computed_style(element) else {
            return true;
        };
        let display = style.get_property_value("display").unwrap_or_default();
        let visibility = style.get_property_value("visibility").unwrap_or_default();
        display != "none" && visibility != "hidden"
    }

    fn is_disabled(&self, element: &Element) -> bool {
        element.has_attribute("disabled")
    }

    fn closest(&self, element: &Element, selectors: &str) -> Option<Element> {
        match element.closest(selectors) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("WebDocument: invalid selector '{}': {}", selectors, js_error(&e));
                None
            }
        }
    }

    fn matches(&self, element: &Element, selectors: &str) -> bool {
        element.matches(selectors).unwrap_or(false)
    }

    fn has_descendant_matching(&self, element: &Element, selectors: &str) -> bool {
        matches!(element.query_selector(selectors), Ok(Some(_)))
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &Node = node;
        ancestor.contains(Some(node))
    }

    fn bounding_rect(&self, element: &Element) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn client_size(&self, element: &Element) -> Size {
        Size::new(
            f64::from(element.client_width()),
            f64::from(element.client_height()),
        )
    }

    fn viewport(&self) -> Size {
        let root = self.document.document_element();
        let fallback_width = root.as_ref().map_or(0, |r| r.client_width());
        let fallback_height = root.as_ref().map_or(0, |r| r.client_height());
        Size::new(
            Self::window_dimension(self.window.inner_width())
                .unwrap_or_else(|| f64::from(fallback_width)),
            Self::window_dimension(self.window.inner_height())
                .unwrap_or_else(|| f64::from(fallback_height)),
        )
    }

    fn add_class(&self, element: &Element, class: &str) {
        warn_on_err(element.class_list().add_1(class), "classList.add");
    }

    fn remove_class(&self, element: &Element, class: &str) {
        warn_on_err(element.class_list().remove_1(class), "classList.remove");
    }

    fn set_root_class(&self, class: &str, present: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        let classes = body.class_list();
        let result = if present {
            classes.add_1(class)
        } else {
            classes.remove_1(class)
        };
        warn_on_err(result, "body classList update");
    }

    fn set_cursor_hidden(&self, hidden: bool) {
        let Some(root) = self.root_style_target() else {
            return;
        };
        let style = root.style();
        let result = if hidden {
            style.set_property("cursor", "none")
        } else {
            style.remove_property("cursor").map(|_| ())
        };
        warn_on_err(result, "cursor update");
    }

    fn scroll_into_view(&self, element: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Nearest);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn dispatch_click(&self, element: &Element) {
        let init = MouseEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_view(Some(&self.window));

        let result = MouseEvent::new_with_mouse_event_init_dict("click", &init)
            .and_then(|event| element.dispatch_event(&event))
            .map(|_| ());
        warn_on_err(result, "click dispatch");
    }

    fn set_toggle_checked(&self, checked: bool) {
        if let Some(input) = self
            .document
            .get_element_by_id(TOGGLE_ID)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_checked(checked);
        }
    }
}
