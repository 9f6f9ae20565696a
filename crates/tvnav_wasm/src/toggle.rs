//! Toolbar toggle and on-screen instructions.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlInputElement};

use crate::listeners::listen;

/// Id of the toggle checkbox.
pub const TOGGLE_ID: &str = "tv-mode-toggle";

const TOOLBAR_SELECTOR: &str = ".toolbar";

const TOGGLE_MARKUP: &str = r#"
<div class="tv-mode-toggle">
    <div class="toggle-label-text">
        <span data-i18n="tv_mode">TV mode</span>
    </div>
    <div class="toggle-switch">
        <input type="checkbox" id="tv-mode-toggle" class="toggle-input">
        <label for="tv-mode-toggle" class="toggle-label"></label>
    </div>
</div>
"#;

const INSTRUCTIONS_MARKUP: &str = r#"
<p>
    <i class="fa-solid fa-circle-info"></i>
    <span data-i18n="tv_mode_instructions">Use the arrow keys to navigate and Enter to select</span>
</p>
<p>
    <i class="fa-solid fa-check-circle"></i>
    <span data-i18n="all_elements_accessible">Every control can be reached, including close buttons</span>
</p>
"#;

/// Insert the toggle at the start of the page toolbar and append the
/// instructions block to `<body>`.
///
/// Pages without a toolbar get neither. Installing twice is a no-op.
pub fn install(document: &Document) -> Result<(), JsValue> {
    let Some(toolbar) = document.query_selector(TOOLBAR_SELECTOR)? else {
        log::debug!("toggle: no toolbar on this page");
        return Ok(());
    };
    if document.get_element_by_id(TOGGLE_ID).is_some() {
        return Ok(());
    }

    let wrapper = document.create_element("div")?;
    wrapper.set_class_name("tv-mode-wrapper");
    wrapper.set_inner_html(TOGGLE_MARKUP);
    toolbar.insert_before(&wrapper, toolbar.first_child().as_ref())?;

    if let Some(input) = document.get_element_by_id(TOGGLE_ID) {
        listen(&input, "change", |e: Event| {
            if let Some(input) = e
                .target()
                .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
            {
                crate::set_tv_mode(input.checked());
            }
        })?;
    }

    let instructions = document.create_element("div")?;
    instructions.set_class_name("tv-mode-instructions");
    instructions.set_inner_html(INSTRUCTIONS_MARKUP);
    if let Some(body) = document.body() {
        body.append_child(&instructions)?;
    }
    Ok(())
}
