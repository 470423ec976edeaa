use std::sync::{Arc, Mutex};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};
#[cfg(not(target_arch = "wasm32"))]
use glam::Vec2;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use once_cell::sync::OnceCell;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::future_to_promise;
#[cfg(target_arch = "wasm32")]
use js_sys::Promise;

pub mod models;
pub mod camera;
pub mod color;
pub mod config;
pub mod scene;
pub mod page;
mod ui_events;
mod app_state;
#[cfg(target_arch = "wasm32")]
mod web;

use ui_events::{CursorState, UserCommand};
use app_state::State;
use scene::highlight::CursorStyle;

pub use config::FieldConfig;

#[cfg(target_arch = "wasm32")]
static FIELD_HANDLE: OnceCell<FieldHandle> = OnceCell::new();

#[cfg(target_arch = "wasm32")]
static FIELD_READY_CHANNEL: OnceCell<(flume::Sender<()>, flume::Receiver<()>)> = OnceCell::new();

struct App {
    window: Option<Arc<Window>>,
    state: Arc<Mutex<Option<State>>>,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: EventLoopProxy<UserCommand>,
    cursor: CursorState,
    field_config: FieldConfig,
    #[cfg(target_arch = "wasm32")]
    container: web_sys::Element,
    #[cfg(target_arch = "wasm32")]
    pointer_listener: Option<web::PointerListener>,
    stopped: bool,
}

impl App {
    fn new(
        event_loop: &EventLoop<UserCommand>,
        field_config: FieldConfig,
        #[cfg(target_arch = "wasm32")] container: web_sys::Element,
    ) -> Self {
        let proxy = event_loop.create_proxy();

        #[cfg(target_arch = "wasm32")]
        {
            if FIELD_HANDLE.set(FieldHandle { proxy: proxy.clone() }).is_err() {
                log::warn!("FIELD_HANDLE was already set. This should only happen once.");
            }
        }

        Self {
            window: None,
            state: Arc::new(Mutex::new(None)),
            proxy,
            cursor: CursorState::default(),
            field_config,
            #[cfg(target_arch = "wasm32")]
            container,
            #[cfg(target_arch = "wasm32")]
            pointer_listener: None,
            stopped: false,
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("Shutting down the field.");
        self.stopped = true;
        #[cfg(target_arch = "wasm32")]
        {
            self.pointer_listener = None;
        }
        match self.state.lock() {
            Ok(mut guard) => drop(guard.take()),
            Err(e) => log::error!("State lock poisoned during shutdown: {e}"),
        }
        if let Some(window) = self.window.take() {
            self.cursor.apply(&window, CursorStyle::Default);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<UserCommand> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.stopped {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("Neural Field");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            match web::mount_canvas(&self.container) {
                Ok(canvas) => {
                    match web::PointerListener::install(canvas.clone(), self.proxy.clone()) {
                        Ok(listener) => self.pointer_listener = Some(listener),
                        Err(e) => log::warn!("Pointer tracking unavailable: {:?}", e),
                    }
                    window_attributes = window_attributes.with_canvas(Some(canvas));
                }
                Err(e) => {
                    log::error!("Failed to mount the field canvas: {:?}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(State::new(window.clone(), self.field_config.clone())) {
                Ok(mut state) => {
                    let size = window.inner_size();
                    state.resize(size.width, size.height);
                    if let Ok(mut guard) = self.state.lock() {
                        guard.replace(state);
                    }
                    log::info!("State initialized.");
                    window.request_redraw();
                }
                Err(e) => {
                    log::error!("Failed to create State: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let state_for_spawn = self.state.clone();
            let window_for_state = window.clone();
            let proxy = self.proxy.clone();
            let field_config = self.field_config.clone();

            wasm_bindgen_futures::spawn_local(async move {
                match State::new(window_for_state.clone(), field_config).await {
                    Ok(mut state) => {
                        let size = window_for_state.inner_size();
                        state.resize(size.width, size.height);
                        match state_for_spawn.lock() {
                            Ok(mut guard) => {
                                guard.replace(state);
                            }
                            Err(e) => {
                                log::error!("State lock poisoned: {e}");
                                return;
                            }
                        }
                        log::info!("WASM State assigned to App. Sending initialization notification.");
                        if proxy.send_event(UserCommand::StateInitialized).is_err() {
                            log::error!("Failed to send StateInitialized; the event loop is gone.");
                        }
                    }
                    Err(e) => log::error!("Failed to create State in WASM: {:?}", e),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserCommand) {
        match event {
            UserCommand::StateInitialized => {
                log::info!("Field state initialized and ready.");
                #[cfg(target_arch = "wasm32")]
                if let Some((sender, _)) = FIELD_READY_CHANNEL.get() {
                    if let Err(e) = sender.send(()) {
                        log::error!("Failed to send field ready signal: {:?}", e);
                    }
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            UserCommand::Shutdown => self.shutdown(event_loop),
            _ => {
                let Ok(mut guard) = self.state.lock() else { return };
                if let Some(state) = guard.as_mut() {
                    state.process_command(event);
                } else {
                    log::warn!("Received a command before state was initialized. Ignoring: {:?}", event);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            self.shutdown(event_loop);
            return;
        }

        let Some(window) = self.window.clone() else { return };
        let Ok(mut guard) = self.state.lock() else {
            log::error!("State lock poisoned, dropping window event.");
            return;
        };
        let Some(state) = guard.as_mut() else {
            log::debug!("Window event received before State was initialized, ignoring.");
            return;
        };

        match event {
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.set_scale_factor(scale_factor as f32);
            }
            WindowEvent::RedrawRequested => {
                let report = state.update();
                self.cursor.apply(&window, report.cursor);
                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        state.resize(state.config.width, state.config.height)
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Surface out of memory, stopping.");
                        event_loop.exit();
                        return;
                    }
                    Err(e) => log::error!("{:?}", e),
                }
                // continuous animation
                window.request_redraw();
            }
            // On the web the page-wide listener in `web` owns the pointer.
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::CursorMoved { position, .. } => {
                state.pointer_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::CursorLeft { .. } => state.pointer_left(),
            _ => {}
        }
    }
}

/// Starts the field with the default configuration.
pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        env_logger::init();
    }
    run_with_config(FieldConfig::default())
}

/// Builds the event loop and runs the field until it is closed or disposed.
///
/// On the web the loop is handed to the browser and this returns right away;
/// a page without the configured container is left untouched.
pub fn run_with_config(field_config: FieldConfig) -> anyhow::Result<()> {
    field_config.validate()?;

    #[cfg(target_arch = "wasm32")]
    let Some(container) = web::find_container(&field_config.container_class) else {
        log::info!("No .{} container on this page, the field stays off.", field_config.container_class);
        return Ok(());
    };

    #[cfg(target_arch = "wasm32")]
    {
        if FIELD_READY_CHANNEL.set(flume::unbounded()).is_err() {
            anyhow::bail!("the field is already running");
        }
    }

    let event_loop = EventLoop::with_user_event().build()?;
    log::info!("Starting the field with {} nodes.", field_config.node_count());
    let app = App::new(
        &event_loop,
        field_config,
        #[cfg(target_arch = "wasm32")]
        container,
    );

    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut app = app;
        event_loop.run_app(&mut app)?;
    }
    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

    page::install()?;

    let default_config = FieldConfig::default();
    let field_config = web::find_container(&default_config.container_class)
        .and_then(|container| web::container_config(&container))
        .map_or(default_config, |json| {
            FieldConfig::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid data-config: {e:#}");
                FieldConfig::default()
            })
        });

    run_with_config(field_config).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

/// JS-side control over a running field.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
#[derive(Clone, Debug)]
pub struct FieldHandle {
    proxy: EventLoopProxy<UserCommand>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl FieldHandle {
    /// Stops the frame loop and releases every GPU resource.
    pub fn dispose(&self) -> Result<(), JsValue> {
        self.send(UserCommand::Shutdown)
    }

    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&self, bytes: Vec<u8>) -> Result<(), JsValue> {
        self.send(UserCommand::LoadFont(bytes))
    }

    fn send(&self, command: UserCommand) -> Result<(), JsValue> {
        self.proxy
            .send_event(command)
            .map_err(|_| JsValue::from_str("Failed to send command to event loop."))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getFieldHandle)]
pub fn get_field_handle() -> Result<FieldHandle, JsValue> {
    FIELD_HANDLE
        .get()
        .cloned()
        .ok_or_else(|| JsValue::from_str("The field is not running on this page."))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getFieldReadyPromise)]
pub fn get_field_ready_promise() -> Result<Promise, JsValue> {
    let (_, receiver) = FIELD_READY_CHANNEL
        .get()
        .ok_or_else(|| JsValue::from_str("The field is not running on this page."))?;

    Ok(future_to_promise(async move {
        receiver
            .recv_async()
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(JsValue::NULL)
    }))
}
