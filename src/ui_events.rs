use glam::Vec2;
use winit::window::{CursorIcon, Window};

use crate::app_state::State;
use crate::camera::screen_to_ndc;
use crate::scene::Pointer;
use crate::scene::highlight::CursorStyle;

#[derive(Debug)]
pub enum UserCommand {
    StateInitialized, // Notifies App that State setup is complete
    LoadFont(Vec<u8>),
    /// Page-wide pointer position, already in the canvas' NDC.
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    PointerMoved(Pointer),
    Shutdown,
}

impl State {
    pub fn process_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::LoadFont(data) => {
                log::info!("Loading label font ({} bytes).", data.len());
                self.load_font(data);
            }
            UserCommand::PointerMoved(pointer) => self.pointer = pointer,
            UserCommand::StateInitialized | UserCommand::Shutdown => {
                // Lifecycle commands are handled in App::user_event
            }
        }
    }

    /// Pointer moved over the window; `position` is in surface pixels.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn pointer_moved(&mut self, position: Vec2) {
        self.pointer = pointer_from_screen(position, Vec2::new(self.config.width as f32, self.config.height as f32));
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn pointer_left(&mut self) {
        log::debug!("Pointer left the canvas.");
        self.pointer = Pointer::OFF_SCREEN;
    }
}

/// Converts a pointer position relative to the canvas into NDC. Positions
/// outside the canvas map outside `[-1, 1]`, which simply never hit a node.
pub fn pointer_from_screen(position: Vec2, surface_size: Vec2) -> Pointer {
    if surface_size.x <= 0.0 || surface_size.y <= 0.0 {
        return Pointer::OFF_SCREEN;
    }
    Pointer(screen_to_ndc(position, surface_size))
}

/// Converts a page (client) position into the NDC of a canvas whose bounding
/// box starts at `canvas_origin`. The page keeps steering the field while the
/// pointer is outside the canvas.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub fn pointer_from_client(client: Vec2, canvas_origin: Vec2, canvas_size: Vec2) -> Pointer {
    pointer_from_screen(client - canvas_origin, canvas_size)
}

/// Tracks the cursor style last pushed to the host so it is only changed on
/// transitions.
#[derive(Debug, Default)]
pub struct CursorState {
    current: Option<CursorStyle>,
}

impl CursorState {
    /// Returns the style to apply, or `None` when nothing changed.
    pub fn transition(&mut self, next: CursorStyle) -> Option<CursorStyle> {
        if self.current == Some(next) {
            return None;
        }
        self.current = Some(next);
        Some(next)
    }

    pub fn apply(&mut self, window: &Window, next: CursorStyle) {
        let Some(style) = self.transition(next) else { return };
        window.set_cursor(match style {
            CursorStyle::Default => CursorIcon::Default,
            CursorStyle::Pointer => CursorIcon::Pointer,
        });
        #[cfg(target_arch = "wasm32")]
        crate::web::set_document_cursor(style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_maps_canvas_to_ndc() {
        let size = Vec2::new(400.0, 200.0);
        assert_eq!(pointer_from_screen(Vec2::new(200.0, 100.0), size), Pointer(Vec2::ZERO));
        assert_eq!(pointer_from_screen(Vec2::new(400.0, 0.0), size), Pointer(Vec2::new(1.0, 1.0)));
        assert_eq!(pointer_from_screen(Vec2::new(0.0, 200.0), size), Pointer(Vec2::new(-1.0, -1.0)));
    }

    #[test]
    fn client_positions_are_relative_to_the_canvas() {
        let origin = Vec2::new(100.0, 50.0);
        let size = Vec2::new(400.0, 200.0);
        assert_eq!(pointer_from_client(Vec2::new(300.0, 150.0), origin, size), Pointer(Vec2::ZERO));
        // above and left of the canvas still yields a usable pointer
        assert_eq!(
            pointer_from_client(Vec2::new(100.0, 0.0), origin, size),
            Pointer(Vec2::new(-1.0, 1.5))
        );
    }

    #[test]
    fn degenerate_surface_gives_sentinel() {
        assert_eq!(pointer_from_screen(Vec2::new(5.0, 5.0), Vec2::ZERO), Pointer::OFF_SCREEN);
    }

    #[test]
    fn cursor_changes_only_on_transition() {
        let mut cursor = CursorState::default();
        assert_eq!(cursor.transition(CursorStyle::Default), Some(CursorStyle::Default));
        assert_eq!(cursor.transition(CursorStyle::Default), None);
        assert_eq!(cursor.transition(CursorStyle::Pointer), Some(CursorStyle::Pointer));
        assert_eq!(cursor.transition(CursorStyle::Pointer), None);
    }
}
