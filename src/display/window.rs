use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowId};

use crate::config::DisplayConfig;
use crate::display::Screen;
use crate::display::frame::DisplayFrame;
use crate::foundation::error::{PosterError, PosterResult};

type Surface = softbuffer::Surface<Rc<Window>, Rc<Window>>;

const OPEN_ATTEMPTS: u32 = 500;

/// Borderless full-screen window presenting frames through a `softbuffer` surface.
pub struct WindowScreen {
    event_loop: EventLoop<()>,
    app: WindowApp,
    scratch: Vec<u32>,
}

struct WindowApp {
    title: String,
    size_override: Option<(u32, u32)>,
    hide_cursor: bool,
    window: Option<Rc<Window>>,
    surface: Option<Surface>,
    size: (u32, u32),
    quit: bool,
    init_error: Option<String>,
}

impl WindowScreen {
    /// Create the window and its surface.
    ///
    /// Fails when no display connection or surface can be acquired.
    pub fn open(cfg: &DisplayConfig) -> PosterResult<Self> {
        let mut event_loop = EventLoop::new()
            .map_err(|e| PosterError::display(format!("create event loop: {e}")))?;
        let mut app = WindowApp {
            title: cfg.window_title.clone(),
            size_override: cfg.size_override,
            hide_cursor: cfg.hide_cursor,
            window: None,
            surface: None,
            size: cfg.size_override.unwrap_or((0, 0)),
            quit: false,
            init_error: None,
        };

        for _ in 0..OPEN_ATTEMPTS {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut app);
            if app.surface.is_some() || app.init_error.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                app.init_error = Some(format!("event loop exited during startup ({code})"));
                break;
            }
        }
        if let Some(err) = app.init_error.take() {
            return Err(PosterError::display(err));
        }
        if app.surface.is_none() {
            return Err(PosterError::display("window was not created"));
        }

        tracing::info!(width = app.size.0, height = app.size.1, "display surface ready");
        Ok(Self {
            event_loop,
            app,
            scratch: Vec::new(),
        })
    }
}

impl WindowApp {
    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), String> {
        let mut attrs = Window::default_attributes().with_title(self.title.clone());
        attrs = match self.size_override {
            Some((w, h)) => attrs.with_inner_size(PhysicalSize::new(w, h)),
            None => attrs.with_fullscreen(Some(Fullscreen::Borderless(None))),
        };
        let window = Rc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| format!("create window: {e}"))?,
        );
        window.set_cursor_visible(!self.hide_cursor);

        self.size = match self.size_override {
            Some(size) => size,
            None => {
                let s = event_loop
                    .primary_monitor()
                    .map(|m| m.size())
                    .unwrap_or_else(|| window.inner_size());
                (s.width, s.height)
            }
        };
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err("display reports a zero-sized screen".to_string());
        }

        let context = softbuffer::Context::new(window.clone())
            .map_err(|e| format!("create softbuffer context: {e}"))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| format!("create softbuffer surface: {e}"))?;

        self.window = Some(window);
        self.surface = Some(surface);
        Ok(())
    }
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.create(event_loop) {
            self.init_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.quit = true,
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                self.quit = true;
            }
            WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                self.size = (size.width, size.height);
            }
            _ => {}
        }
    }
}

impl Screen for WindowScreen {
    fn size(&self) -> (u32, u32) {
        self.app.size
    }

    fn present(&mut self, frame: &DisplayFrame) -> PosterResult<()> {
        let surface = self
            .app
            .surface
            .as_mut()
            .ok_or_else(|| PosterError::display("surface is gone"))?;
        let (Some(w), Some(h)) = (
            NonZeroU32::new(frame.width()),
            NonZeroU32::new(frame.height()),
        ) else {
            return Err(PosterError::display("cannot present an empty frame"));
        };
        surface
            .resize(w, h)
            .map_err(|e| PosterError::display(format!("resize surface: {e}")))?;

        frame.write_xrgb(&mut self.scratch);
        let mut buffer = surface
            .buffer_mut()
            .map_err(|e| PosterError::display(format!("map surface buffer: {e}")))?;
        let n = buffer.len().min(self.scratch.len());
        buffer[..n].copy_from_slice(&self.scratch[..n]);
        buffer
            .present()
            .map_err(|e| PosterError::display(format!("present surface: {e}")))?;
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        if let PumpStatus::Exit(_) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.app)
        {
            self.app.quit = true;
        }
        self.app.quit
    }
}
