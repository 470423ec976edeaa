pub const ACTIVE_CLASS: &str = "active";

/// Element id of the experience track a `data-track` button selects.
pub fn track_element_id(track: &str) -> String {
    format!("track-{track}")
}

#[cfg(target_arch = "wasm32")]
pub(super) fn install(document: &web_sys::Document) -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use super::{query_all, toggle_class};

    let buttons = query_all(document, ".track-btn")?;
    let tracks = query_all(document, ".experience-track")?;

    for button in &buttons {
        let all_buttons = buttons.clone();
        let tracks = tracks.clone();
        let clicked = button.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || {
            for b in &all_buttons {
                toggle_class(b, ACTIVE_CLASS, false);
            }
            toggle_class(&clicked, ACTIVE_CLASS, true);

            let target = clicked.get_attribute("data-track").unwrap_or_default();
            let wanted = track_element_id(&target);
            for track in &tracks {
                toggle_class(track, ACTIVE_CLASS, track.id() == wanted);
            }
        });
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }
    Ok(())
}
