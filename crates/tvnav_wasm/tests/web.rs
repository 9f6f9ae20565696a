//! Browser tests for the web document port.
//!
//! Run with `wasm-pack test --headless --firefox crates/tvnav_wasm`.

#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use tvnav_core::geometry::Direction;
use tvnav_core::port::{DocumentPort, KeyValueStore};
use tvnav_core::Router;
use tvnav_wasm::{LocalStorage, WebDocument};
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use web_sys::{Element, MouseEvent};

wasm_bindgen_test_configure!(run_in_browser);

/// Fresh fixture container with absolutely positioned children.
fn fixture(doc: &WebDocument, html: &str) -> Element {
    let document = doc.document();
    if let Some(old) = document.get_element_by_id("fixture") {
        old.remove();
    }
    let root = document.create_element("div").unwrap();
    root.set_id("fixture");
    root.set_inner_html(html);
    document.body().unwrap().append_child(&root).unwrap();
    root
}

fn by_id(doc: &WebDocument, id: &str) -> Element {
    doc.document().get_element_by_id(id).unwrap()
}

const GRID: &str = r##"
<button id="a" style="position:fixed;left:60px;top:80px;width:80px;height:40px">a</button>
<button id="b" style="position:fixed;left:60px;top:280px;width:80px;height:40px">b</button>
<button id="c" style="position:fixed;left:260px;top:80px;width:80px;height:40px">c</button>
<button id="d" disabled style="position:fixed;left:460px;top:80px;width:80px;height:40px">d</button>
<a id="e" href="#" style="display:none">e</a>
<div class="hidden"><a id="f" href="#">f</a></div>
"##;

#[wasm_bindgen_test]
fn test_query_and_geometry() {
    let doc = WebDocument::from_global().unwrap();
    fixture(&doc, GRID);

    let a = by_id(&doc, "a");
    let rect = doc.bounding_rect(&a);
    assert_eq!(rect.left, 60.0);
    assert_eq!(rect.top, 80.0);
    assert_eq!(rect.center().x, 100.0);

    assert!(doc.is_rendered(&a));
    assert!(!doc.is_rendered(&by_id(&doc, "e")));
    assert!(doc.is_disabled(&by_id(&doc, "d")));
    assert!(doc.closest(&by_id(&doc, "f"), ".hidden").is_some());
    assert!(doc.query_all("#fixture button").len() == 4);
}

#[wasm_bindgen_test]
fn test_invalid_selector_matches_nothing() {
    let doc = WebDocument::from_global().unwrap();
    assert!(doc.query_all("a[").is_empty());
}

#[wasm_bindgen_test]
fn test_router_navigates_real_dom() {
    let doc = WebDocument::from_global().unwrap();
    fixture(&doc, GRID);
    let store = LocalStorage::from_window(doc.window());
    let mut router = Router::with_defaults(doc.clone(), store);

    router.refresh_candidates();
    router.set_focus(by_id(&doc, "a"));
    assert!(router.move_focus(Direction::Down));
    assert_eq!(router.current(), Some(&by_id(&doc, "b")));

    let b = by_id(&doc, "b");
    assert!(b.class_list().contains("tv-focus"));
    assert!(!by_id(&doc, "a").class_list().contains("tv-focus"));

    router.clear_focus();
}

#[wasm_bindgen_test]
fn test_dispatch_click_bubbles() {
    let doc = WebDocument::from_global().unwrap();
    let root = fixture(&doc, GRID);
    let clicks = Rc::new(Cell::new(0));

    let counter = Rc::clone(&clicks);
    let listener = Closure::wrap(Box::new(move |e: MouseEvent| {
        assert!(e.bubbles());
        assert!(e.cancelable());
        counter.set(counter.get() + 1);
    }) as Box<dyn FnMut(MouseEvent)>);
    root.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        .unwrap();

    doc.dispatch_click(&by_id(&doc, "c"));
    assert_eq!(clicks.get(), 1);

    root.remove_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        .unwrap();
}

#[wasm_bindgen_test]
fn test_root_class_and_cursor() {
    let doc = WebDocument::from_global().unwrap();
    let body = doc.document().body().unwrap();

    doc.set_root_class("tv-mode-active", true);
    assert!(body.class_list().contains("tv-mode-active"));
    doc.set_root_class("tv-mode-active", false);
    assert!(!body.class_list().contains("tv-mode-active"));

    doc.set_cursor_hidden(true);
    let root = doc.document().document_element().unwrap();
    assert!(root.get_attribute("style").unwrap_or_default().contains("cursor: none"));
    doc.set_cursor_hidden(false);
    assert!(!root.get_attribute("style").unwrap_or_default().contains("cursor"));
}

#[wasm_bindgen_test]
fn test_local_storage_roundtrip() {
    let doc = WebDocument::from_global().unwrap();
    let store = LocalStorage::from_window(doc.window());

    store.set("tvnavTestKey", "true").unwrap();
    assert_eq!(store.get("tvnavTestKey").unwrap().as_deref(), Some("true"));
    assert_eq!(store.get("tvnavMissingKey").unwrap(), None);
}
