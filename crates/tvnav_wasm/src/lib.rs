//! WebAssembly bindings for tvnav.
//!
//! Wires [`tvnav_core::Router`] to the live page: [`WebDocument`] and
//! [`LocalStorage`] implement the core ports, `listeners` turns DOM events
//! into router input and `toggle` adds the toolbar switch.
//!
//! ```js
//! import init, { startTvMode, setTvMode } from "tvnav_wasm";
//!
//! await init();
//! startTvMode({ timing: { settle_ms: 150 } });
//! ```

use tvnav_core::error::NavError;
use tvnav_core::{Router, RouterConfig};
use wasm_bindgen::prelude::*;

mod dom;
mod listeners;
mod state;
mod storage;
mod toggle;

pub use dom::WebDocument;
pub use state::Unavailable;
pub use storage::LocalStorage;

// ============================================================================
// Initialization
// ============================================================================

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the WASM module. Called automatically on module load.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    // A host page may already have installed a logger.
    console_log::init_with_level(log::Level::Info).ok();
}

fn to_js_error(err: NavError) -> JsValue {
    serde_wasm_bindgen::to_value(&err.to_serializable())
        .unwrap_or_else(|_| JsValue::from_str(&err.to_string()))
}

/// A failed DOM call during setup.
fn host_error(err: JsValue) -> JsValue {
    to_js_error(NavError::Host(dom::js_error(&err)))
}

fn parse_config(config: JsValue) -> Result<RouterConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(RouterConfig::default());
    }
    let value: serde_json::Value = serde_wasm_bindgen::from_value(config)?;
    RouterConfig::from_json(value).map_err(to_js_error)
}

// ============================================================================
// Public API
// ============================================================================

/// Set up TV-mode on the current page.
///
/// Adds the toolbar toggle, installs the listeners and restores the saved
/// on/off state. `config` is an optional partial `RouterConfig` object.
/// Calling it again after a successful start does nothing.
#[wasm_bindgen(js_name = startTvMode)]
pub fn start_tv_mode(config: JsValue) -> Result<(), JsValue> {
    if state::is_started() {
        log::warn!("startTvMode: already started");
        return Ok(());
    }

    let config = parse_config(config)?;
    let document = WebDocument::from_global().map_err(host_error)?;
    let store = LocalStorage::from_window(document.window());

    toggle::install(document.document()).map_err(host_error)?;
    listeners::attach(document.document()).map_err(host_error)?;

    let dom = document.document().clone();
    state::install(Router::new(document, store, config));
    log::info!("TV-mode router started on {:?}", dom.url().unwrap_or_default());

    if let Err(e) = state::with_router(|router| router.restore()) {
        log::warn!("startTvMode: could not restore saved state: {:?}", e);
    }
    listeners::arm_timer();
    Ok(())
}

/// Turn TV-mode on or off.
#[wasm_bindgen(js_name = setTvMode)]
pub fn set_tv_mode(enabled: bool) {
    match state::with_router(|router| router.set_active(enabled)) {
        Ok(()) => listeners::arm_timer(),
        // Fired from inside the router (e.g. its synthetic click on the
        // toggle label); applied once the current event finishes.
        Err(Unavailable::Busy) => state::defer_mode(enabled),
        Err(Unavailable::NotStarted) => log::warn!("setTvMode: call startTvMode first"),
    }
}

/// Whether TV-mode is on.
#[wasm_bindgen(js_name = isTvModeActive)]
pub fn is_tv_mode_active() -> bool {
    state::with_router(|router| router.is_active()).unwrap_or(false)
}

/// Router summary (`RouterStatus`), or `null` before `startTvMode`.
#[wasm_bindgen(js_name = tvModeStatus)]
pub fn tv_mode_status() -> Result<JsValue, JsValue> {
    match state::with_router(|router| router.status()) {
        Ok(status) => Ok(serde_wasm_bindgen::to_value(&status)?),
        Err(_) => Ok(JsValue::NULL),
    }
}
