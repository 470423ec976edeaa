/// Color themes understood by the page stylesheet via `<html data-theme>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Business,
    Data,
}

impl Theme {
    pub const STORAGE_KEY: &'static str = "theme";
    pub const ATTRIBUTE: &'static str = "data-theme";

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Business => "business",
            Theme::Data => "data",
        }
    }

    /// Theme after a toggle click. Anything but `data` (including no theme
    /// at all) switches to `data`.
    pub fn toggled_from(current: Option<&str>) -> Theme {
        match current {
            Some("data") => Theme::Business,
            _ => Theme::Data,
        }
    }
}

/// Attribute value to apply on load: the saved choice verbatim, else `data`
/// for a dark system preference, else leave the document alone.
pub fn initial_theme(saved: Option<&str>, prefers_dark: bool) -> Option<String> {
    match saved {
        Some(saved) => Some(saved.to_owned()),
        None if prefers_dark => Some(Theme::Data.as_str().to_owned()),
        None => None,
    }
}

#[cfg(target_arch = "wasm32")]
pub(super) fn install(window: &web_sys::Window, document: &web_sys::Document) -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    let Some(html) = document.document_element() else { return Ok(()) };
    let storage = window.local_storage().ok().flatten();

    let saved = storage.as_ref().and_then(|s| s.get_item(Theme::STORAGE_KEY).ok().flatten());
    let prefers_dark = window
        .match_media("(prefers-color-scheme: dark)")
        .ok()
        .flatten()
        .is_some_and(|m| m.matches());
    if let Some(theme) = initial_theme(saved.as_deref(), prefers_dark) {
        html.set_attribute(Theme::ATTRIBUTE, &theme)?;
    }

    let Some(toggle) = document.get_element_by_id("theme-toggle") else {
        log::debug!("No #theme-toggle on this page.");
        return Ok(());
    };
    let on_click = Closure::<dyn FnMut()>::new(move || {
        let next = Theme::toggled_from(html.get_attribute(Theme::ATTRIBUTE).as_deref());
        if let Err(e) = html.set_attribute(Theme::ATTRIBUTE, next.as_str()) {
            log::warn!("Failed to apply theme: {:?}", e);
        }
        if let Some(storage) = &storage {
            if let Err(e) = storage.set_item(Theme::STORAGE_KEY, next.as_str()) {
                log::warn!("Failed to save theme: {:?}", e);
            }
        }
    });
    toggle.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    // lives as long as the page
    on_click.forget();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_themes() {
        assert_eq!(Theme::toggled_from(Some("data")), Theme::Business);
        assert_eq!(Theme::toggled_from(Some("business")), Theme::Data);
        assert_eq!(Theme::toggled_from(None), Theme::Data);
        assert_eq!(Theme::toggled_from(Some("unknown")), Theme::Data);
    }

    #[test]
    fn saved_choice_beats_system_preference() {
        assert_eq!(initial_theme(Some("business"), true).as_deref(), Some("business"));
        assert_eq!(initial_theme(None, true).as_deref(), Some("data"));
        assert_eq!(initial_theme(None, false), None);
    }
}
