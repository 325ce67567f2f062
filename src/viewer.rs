//! Windowed viewer.
//!
//! Runs a [`Scene`] in a winit window with the wgpu [`Renderer`]. Gestures
//! come from the keyboard (see [`KeyboardGestures`]); left-drag orbits, the
//! wheel zooms and a click opens the gift under the cursor.
//!
//! | Key      | Action                           |
//! |----------|----------------------------------|
//! | `T`      | toggle tree / scattered          |
//! | `R`      | reset the camera                 |
//! | `Escape` | close the open gift              |

use std::sync::Arc;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::audio::NullPlayback;
use crate::camera::Camera;
use crate::config::SceneConfig;
use crate::error::ViewerError;
use crate::gpu::Renderer;
use crate::input::{Input, KeyCode, KeyboardGestures, MouseButton};
use crate::memory::{FileStore, MemoryStore, PendingLoads};
use crate::scene::Scene;
use crate::selection::SelectionEvent;
use crate::time::Time;

const TITLE: &str = "Arix Tree";

/// Open the viewer and block until the window closes.
pub fn run(
    config: SceneConfig,
    store: MemoryStore<FileStore>,
    pending: PendingLoads,
) -> Result<(), ViewerError> {
    let scene = Scene::new(config, NullPlayback)?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene, store, pending);
    event_loop.run_app(&mut app)?;
    app.result
}

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Scene<NullPlayback>,
    store: MemoryStore<FileStore>,
    pending: PendingLoads,
    memories_revision: Option<u64>,
    input: Input,
    keys: KeyboardGestures,
    time: Time,
    result: Result<(), ViewerError>,
}

impl App {
    fn new(scene: Scene<NullPlayback>, store: MemoryStore<FileStore>, pending: PendingLoads) -> Self {
        Self {
            window: None,
            renderer: None,
            scene,
            store,
            pending,
            memories_revision: None,
            input: Input::new(),
            keys: KeyboardGestures::new(),
            time: Time::new(),
            result: Ok(()),
        }
    }

    /// Land finished background loads and rebind the groups if the
    /// collection changed.
    fn sync_memories(&mut self) {
        if !self.pending.is_empty() {
            for outcome in self.store.apply_pending(&mut self.pending) {
                match outcome {
                    Ok(persisted) => {
                        if let Some(e) = persisted.error() {
                            warn!(error = %e, "Memory kept for this session only");
                        }
                    }
                    Err(e) => warn!(error = %e, "Memory could not be added"),
                }
            }
        }
        if self.memories_revision != Some(self.store.revision()) {
            self.scene.set_memories(self.store.memories());
            self.memories_revision = Some(self.store.revision());
        }
    }

    fn handle_input(&mut self) {
        if self.input.key_pressed(KeyCode::T) {
            self.scene.toggle_tree_shape();
        }
        if self.input.key_pressed(KeyCode::Escape) {
            if let Some(event) = self.scene.close_active() {
                self.report(&event);
            }
        }

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        if self.input.key_pressed(KeyCode::R) {
            renderer.camera = Camera::from_config(&self.scene.config().camera);
        }
        if self.input.mouse_held(MouseButton::Left) {
            renderer.camera.orbit(self.input.mouse_delta());
        }
        if self.input.scroll_delta() != 0.0 {
            renderer.camera.zoom(self.input.scroll_delta());
        }
        if self.input.clicked() {
            let (origin, direction) = renderer
                .camera
                .ray_through(self.input.mouse_position(), renderer.viewport());
            if let Some(event) = self.scene.click_ray(origin, direction) {
                self.report(&event);
            }
        }
    }

    fn report(&self, event: &SelectionEvent) {
        let title = match (event, self.scene.active()) {
            (SelectionEvent::Opened { .. }, Some((group, item))) => {
                info!(group, id = item.particle_id, memory = %item.memory.name, "Gift opened");
                format!("{TITLE} - {}", item.memory.name)
            }
            _ => {
                info!("Gift closed");
                TITLE.to_string()
            }
        };
        if let Some(window) = &self.window {
            window.set_title(&title);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.sync_memories();
        self.handle_input();

        let (elapsed, dt) = self.time.update();
        let frame = self.keys.frame(&self.input, self.time.elapsed_ms());
        self.scene.apply_gesture(&frame);

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        if self.scene.auto_rotate() {
            renderer.camera.auto_rotate(dt);
        }
        self.scene.set_viewer(renderer.camera.position());
        let events = self.scene.frame(dt, elapsed);
        self.scene.render(renderer);

        match renderer.take_error() {
            None => {}
            Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Some(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, closing viewer");
                event_loop.exit();
            }
            Some(e) => warn!(error = ?e, "Render error"),
        }
        for event in &events {
            self.report(event);
        }
        self.input.end_frame();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.result = Err(e.into());
                event_loop.exit();
                return;
            }
        };

        let config = self.scene.config();
        let camera = Camera::from_config(&config.camera);
        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            camera,
            self.scene.foliage().vertices(),
            config.foliage.breathe_threshold,
        ));
        match renderer {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                self.window = Some(window);
            }
            Err(e) => {
                self.result = Err(e.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
