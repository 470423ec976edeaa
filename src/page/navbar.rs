pub const SCROLLED_CLASS: &str = "scrolled";
const SCROLL_THRESHOLD: f64 = 20.0;

pub fn is_scrolled(scroll_y: f64) -> bool {
    scroll_y > SCROLL_THRESHOLD
}

#[cfg(target_arch = "wasm32")]
pub(super) fn install(window: &web_sys::Window, document: &web_sys::Document) -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    let Some(navbar) = document.get_element_by_id("navbar") else { return Ok(()) };
    let scroll_source = window.clone();
    let on_scroll = Closure::<dyn FnMut()>::new(move || {
        let y = scroll_source.scroll_y().unwrap_or(0.0);
        super::toggle_class(&navbar, SCROLLED_CLASS, is_scrolled(y));
    });
    window.add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())?;
    on_scroll.forget();
    Ok(())
}
