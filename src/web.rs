//! Browser glue: locating the container, mounting the canvas, cursor style.

use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, MouseEvent, Window};
use winit::event_loop::EventLoopProxy;

use crate::scene::highlight::CursorStyle;
use crate::ui_events::{UserCommand, pointer_from_client};

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// First element carrying `class`, if the page has one.
pub fn find_container(class: &str) -> Option<Element> {
    document()?.query_selector(&format!(".{class}")).ok().flatten()
}

/// Empties the container and appends a canvas that fills it. winit tracks
/// the canvas' CSS size from here on and reports resizes.
pub fn mount_canvas(container: &Element) -> Result<HtmlCanvasElement, JsValue> {
    let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
    container.set_inner_html("");

    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    let style = canvas.style();
    style.set_property("display", "block")?;
    style.set_property("width", "100%")?;
    style.set_property("height", "100%")?;

    let ratio = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
    canvas.set_width((container.client_width() as f64 * ratio).round().max(1.0) as u32);
    canvas.set_height((container.client_height() as f64 * ratio).round().max(1.0) as u32);

    container.append_child(&canvas)?;
    log::info!(
        "Mounted field canvas {}x{} (css {}x{}).",
        canvas.width(),
        canvas.height(),
        container.client_width(),
        container.client_height()
    );
    Ok(canvas)
}

pub fn set_document_cursor(style: CursorStyle) {
    let Some(body) = document().and_then(|d| d.body()) else { return };
    let value = match style {
        CursorStyle::Default => "default",
        CursorStyle::Pointer => "pointer",
    };
    if let Err(e) = HtmlElement::style(&body).set_property("cursor", value) {
        log::warn!("Failed to set document cursor: {:?}", e);
    }
}

/// Raw JSON override the page placed on the container, if any.
pub fn container_config(container: &Element) -> Option<String> {
    container.get_attribute("data-config").filter(|json| !json.trim().is_empty())
}

/// Window-wide `mousemove` listener feeding the field's pointer. Removed from
/// the window when dropped.
pub struct PointerListener {
    window: Window,
    callback: Closure<dyn FnMut(MouseEvent)>,
}

impl PointerListener {
    pub fn install(canvas: HtmlCanvasElement, proxy: EventLoopProxy<UserCommand>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let callback = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let rect = canvas.get_bounding_client_rect();
            let pointer = pointer_from_client(
                Vec2::new(event.client_x() as f32, event.client_y() as f32),
                Vec2::new(rect.left() as f32, rect.top() as f32),
                Vec2::new(rect.width() as f32, rect.height() as f32),
            );
            if proxy.send_event(UserCommand::PointerMoved(pointer)).is_err() {
                log::debug!("Pointer update dropped, the field has stopped.");
            }
        });
        window.add_event_listener_with_callback("mousemove", callback.as_ref().unchecked_ref())?;
        Ok(Self { window, callback })
    }
}

impl Drop for PointerListener {
    fn drop(&mut self) {
        if let Err(e) = self
            .window
            .remove_event_listener_with_callback("mousemove", self.callback.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove pointer listener: {:?}", e);
        }
    }
}
