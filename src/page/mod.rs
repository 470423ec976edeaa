//! Small page behaviors around the hero section: theme toggle, sticky
//! navbar, KPI count-up, scroll reveal and experience track tabs. The
//! decision logic is plain Rust; the DOM wiring only exists on `wasm32`.

pub mod counters;
pub mod navbar;
pub mod reveal;
pub mod theme;
pub mod tracks;

/// Wires every behavior whose elements exist on the current page.
#[cfg(target_arch = "wasm32")]
pub fn install() -> Result<(), wasm_bindgen::JsValue> {
    let window = web_sys::window().ok_or_else(|| wasm_bindgen::JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| wasm_bindgen::JsValue::from_str("no document"))?;

    theme::install(&window, &document)?;
    navbar::install(&window, &document)?;
    counters::install(&window, &document)?;
    reveal::install(&document)?;
    tracks::install(&document)?;
    log::info!("Page behaviors installed.");
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn elements(list: web_sys::NodeList) -> Vec<web_sys::Element> {
    use wasm_bindgen::JsCast;

    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|n| n.dyn_into::<web_sys::Element>().ok())
        .collect()
}

#[cfg(target_arch = "wasm32")]
fn query_all(document: &web_sys::Document, selector: &str) -> Result<Vec<web_sys::Element>, wasm_bindgen::JsValue> {
    Ok(elements(document.query_selector_all(selector)?))
}

#[cfg(target_arch = "wasm32")]
fn toggle_class(element: &web_sys::Element, class: &str, on: bool) {
    let classes = element.class_list();
    let result = if on { classes.add_1(class) } else { classes.remove_1(class) };
    if let Err(e) = result {
        log::warn!("Failed to toggle class {}: {:?}", class, e);
    }
}
