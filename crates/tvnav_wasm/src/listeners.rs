//! Browser event wiring.
//!
//! Every DOM callback becomes an [`InputEvent`] for the router. After each
//! one a single `setTimeout` is (re)armed for the router's next deadline;
//! when it fires it delivers [`InputEvent::Tick`].

use std::cell::{Cell, RefCell};

use tvnav_core::input::{Disposition, InputEvent, Millis, Mutation, MutationKind, NavKey};
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventTarget, KeyboardEvent, MouseEvent, MutationObserver,
    MutationObserverInit, MutationRecord,
};

use crate::dom::js_error;
use crate::state::{self, Unavailable};

thread_local! {
    /// Pending timeout handle and the deadline it was armed for.
    static TIMER: Cell<Option<(i32, Millis)>> = const { Cell::new(None) };
    static TICK: RefCell<Option<Closure<dyn FnMut()>>> = const { RefCell::new(None) };
}

/// Milliseconds on the page clock.
pub fn now() -> Millis {
    web_sys::window()
        .and_then(|window| window.performance())
        .map_or_else(js_sys::Date::now, |performance| performance.now())
}

/// Feed one event to the router and re-arm the timer.
pub fn dispatch(event: InputEvent<Element>) -> Disposition {
    let now = now();
    let disposition = match state::with_router(|router| router.handle(event, now)) {
        Ok(disposition) => disposition,
        Err(Unavailable::Busy) => {
            log::trace!("listeners: re-entrant event passed through");
            Disposition::PASS
        }
        Err(Unavailable::NotStarted) => Disposition::PASS,
    };
    apply_deferred_mode();
    arm_timer();
    disposition
}

/// Apply a mode change that arrived while the router was busy.
pub fn apply_deferred_mode() {
    if let Some(enabled) = state::take_deferred_mode()
        && state::with_router(|router| router.set_active(enabled)).is_err()
    {
        state::defer_mode(enabled);
    }
}

/// Arm (or re-arm) the tick timer for the router's next deadline.
pub fn arm_timer() {
    let Ok(deadline) = state::with_router(|router| router.next_deadline()) else {
        return;
    };
    let Some(window) = web_sys::window() else {
        return;
    };

    if let Some((handle, armed_for)) = TIMER.get() {
        if deadline == Some(armed_for) {
            return;
        }
        window.clear_timeout_with_handle(handle);
        TIMER.set(None);
    }

    let Some(deadline) = deadline else {
        return;
    };
    let delay = (deadline - now()).max(0.0).ceil() as i32;

    TICK.with(|tick| {
        let mut tick = tick.borrow_mut();
        let callback = tick.get_or_insert_with(|| {
            Closure::wrap(Box::new(|| {
                TIMER.set(None);
                dispatch(InputEvent::Tick);
            }) as Box<dyn FnMut()>)
        });
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(handle) => TIMER.set(Some((handle, deadline))),
            Err(e) => log::warn!("listeners: setTimeout failed: {}", js_error(&e)),
        }
    });
}

/// Add a listener that lives as long as the page.
pub(crate) fn listen<T>(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(T) + 'static,
) -> Result<(), JsValue>
where
    T: FromWasmAbi + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(T)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn apply(event: &Event, disposition: Disposition) {
    if disposition.prevent_default {
        event.prevent_default();
    }
    if disposition.stop_propagation {
        event.stop_propagation();
    }
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

/// Install the keyboard, pointer and click listeners on `document` and the
/// mutation observer on `<body>`.
pub fn attach(document: &Document) -> Result<(), JsValue> {
    listen(document, "keydown", |e: KeyboardEvent| {
        let disposition = dispatch(InputEvent::Key(NavKey::from_key_name(&e.key())));
        apply(&e, disposition);
    })?;

    listen(document, "mouseenter", |e: MouseEvent| {
        dispatch(InputEvent::PointerEnter {
            x: f64::from(e.client_x()),
            y: f64::from(e.client_y()),
        });
    })?;

    listen(document, "mousemove", |e: MouseEvent| {
        dispatch(InputEvent::PointerMove {
            x: f64::from(e.client_x()),
            y: f64::from(e.client_y()),
        });
    })?;

    listen(document, "mouseover", |e: MouseEvent| {
        if let Some(target) = target_element(&e) {
            dispatch(InputEvent::PointerOver { target });
        }
    })?;

    listen(document, "click", |e: MouseEvent| {
        if let Some(target) = target_element(&e) {
            let disposition = dispatch(InputEvent::Click { target });
            apply(&e, disposition);
        }
    })?;

    observe_mutations(document)
}

fn to_mutation(record: MutationRecord) -> Option<Mutation<Element>> {
    let target = match record.target()?.dyn_into::<Element>() {
        Ok(element) => element,
        // Text node changes are attributed to their parent element.
        Err(node) => node.parent_element()?,
    };
    let kind = match record.type_().as_str() {
        "attributes" => MutationKind::Attributes {
            name: record.attribute_name().unwrap_or_default(),
        },
        "childList" => MutationKind::ChildList,
        _ => return None,
    };
    Some(Mutation { kind, target })
}

fn observe_mutations(document: &Document) -> Result<(), JsValue> {
    let Some(body) = document.body() else {
        log::warn!("listeners: no <body>, DOM changes will not be tracked");
        return Ok(());
    };

    let callback = Closure::wrap(Box::new(|records: js_sys::Array, _: MutationObserver| {
        let mutations: Vec<_> = records
            .iter()
            .filter_map(|record| record.dyn_into::<MutationRecord>().ok())
            .filter_map(to_mutation)
            .collect();
        if !mutations.is_empty() {
            dispatch(InputEvent::DomChanged { mutations });
        }
    }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_attributes(true);
    options.set_child_list(true);
    options.set_subtree(true);
    options.set_attribute_filter(&js_sys::Array::of2(
        &JsValue::from_str("style"),
        &JsValue::from_str("class"),
    ));
    observer.observe_with_options(&body, &options)?;
    callback.forget();
    Ok(())
}
