//! Safe entry points over the native SDL3 surface.
//!
//! [`Context`] validates arguments before anything crosses into native code,
//! turns SDL's `false`/null failure convention into [`SdlError::NativeCall`],
//! and routes every window and renderer through generation-checked arenas so
//! a released handle never reaches a native call. A context is `!Send`: all
//! native calls happen on the thread that created it. Other threads go
//! through [`crate::dispatch`].

mod event;
mod owned;

use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    ffi::CString,
    fmt,
};

pub use event::Event;
pub use owned::{Owned, Resource};

use crate::{
    backend::{Backend, RawRenderer, RawWindow},
    config::{LibraryConfig, WindowConfig},
    ffi::{FPoint, FRect, SdlBackend, SDL_INIT_VIDEO, SDL_WINDOW_RESIZABLE},
    handles::{Arena, HandleId, LifetimePolicy, ResourceCounts},
    library::LibraryHost,
    platform::LibraryResolver,
    Result, SdlError,
};

/// Tracked `SDL_Window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(HandleId);

/// Tracked `SDL_Renderer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(HandleId);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window {}", self.0)
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "renderer {}", self.0)
    }
}

/// `SDL_WindowFlags` subset exposed by the binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowFlags(u64);

impl WindowFlags {
    pub const RESIZABLE: WindowFlags = WindowFlags(SDL_WINDOW_RESIZABLE);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn from_config(config: &WindowConfig) -> Self {
        if config.resizable {
            Self::RESIZABLE
        } else {
            Self::empty()
        }
    }
}

/// Floating point draw color, one channel per component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::opaque(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::opaque(1.0, 1.0, 1.0);

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn inverse(self) -> Self {
        Self {
            r: 1.0 - self.r,
            g: 1.0 - self.g,
            b: 1.0 - self.b,
            a: self.a,
        }
    }

    /// Relative luminance using the Rec. 709 weights.
    pub fn luminance(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug)]
struct WindowEntry {
    raw: RawWindow,
}

#[derive(Debug)]
struct RendererEntry {
    raw: RawRenderer,
    window: WindowId,
}

/// An initialised SDL session bound to the creating thread.
///
/// At most one context may be live per native library: dropping a context
/// calls `SDL_Quit`, which would pull the state out from under any other.
pub struct Context {
    backend: Box<dyn Backend>,
    windows: RefCell<Arena<WindowEntry>>,
    renderers: RefCell<Arena<RendererEntry>>,
    /// Renderers released because their window was destroyed.
    cascaded: RefCell<HashSet<RendererId>>,
    policy: LifetimePolicy,
    active: Cell<bool>,
}

impl Context {
    /// Resolves and loads SDL3 through the process-wide [`LibraryHost`],
    /// binds every entry point and initialises the video subsystem.
    pub fn load(config: &LibraryConfig) -> Result<Self> {
        let resolver = LibraryResolver::new(config.clone())?;
        let library = LibraryHost::global().load_verified(&resolver, SdlBackend::verify)?;
        let backend = SdlBackend::new(library)?;
        Self::with_backend(Box::new(backend), SDL_INIT_VIDEO)
    }

    /// Initialises SDL through an already constructed backend.
    ///
    /// Fails with [`SdlError::SessionActive`] while another context holds the
    /// backend's session.
    pub fn with_backend(backend: Box<dyn Backend>, init_flags: u32) -> Result<Self> {
        if !backend.session().try_claim() {
            return Err(SdlError::SessionActive);
        }
        if !backend.init(init_flags) {
            let err = SdlError::native("SDL_Init", backend.last_error());
            backend.session().release();
            return Err(err);
        }
        tracing::info!(flags = init_flags, "SDL initialised");

        Ok(Self {
            backend,
            windows: RefCell::new(Arena::new("window")),
            renderers: RefCell::new(Arena::new("renderer")),
            cascaded: RefCell::new(HashSet::new()),
            policy: LifetimePolicy::default(),
            active: Cell::new(true),
        })
    }

    pub fn with_policy(mut self, policy: LifetimePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LifetimePolicy {
        self.policy
    }

    /// Wraps a handle so it is released when the guard drops.
    pub fn own<H: Resource>(&self, handle: H) -> Owned<'_, H> {
        Owned::new(self, handle)
    }

    pub fn create_window_and_renderer(
        &self,
        title: &str,
        width: i32,
        height: i32,
        flags: WindowFlags,
    ) -> Result<(WindowId, RendererId)> {
        let title = c_string("title", title)?;
        let width = positive("width", width)?;
        let height = positive("height", height)?;

        let (raw_window, raw_renderer) = self
            .backend
            .create_window_and_renderer(&title, width, height, flags.bits())
            .ok_or_else(|| self.native_failure("SDL_CreateWindowAndRenderer"))?;

        let window = WindowId(self.windows.borrow_mut().insert(WindowEntry { raw: raw_window }));
        let renderer = RendererId(self.renderers.borrow_mut().insert(RendererEntry {
            raw: raw_renderer,
            window,
        }));
        tracing::debug!(%window, %renderer, width, height, "created window and renderer");
        Ok((window, renderer))
    }

    pub fn create_window(&self, title: &str, width: i32, height: i32, flags: WindowFlags) -> Result<WindowId> {
        let title = c_string("title", title)?;
        let width = positive("width", width)?;
        let height = positive("height", height)?;

        let raw = self
            .backend
            .create_window(&title, width, height, flags.bits())
            .ok_or_else(|| self.native_failure("SDL_CreateWindow"))?;

        let window = WindowId(self.windows.borrow_mut().insert(WindowEntry { raw }));
        tracing::debug!(%window, width, height, "created window");
        Ok(window)
    }

    pub fn create_renderer(&self, window: WindowId) -> Result<RendererId> {
        let raw_window = self.raw_window(window)?;
        let raw = self
            .backend
            .create_renderer(raw_window)
            .ok_or_else(|| self.native_failure("SDL_CreateRenderer"))?;

        let renderer = RendererId(
            self.renderers
                .borrow_mut()
                .insert(RendererEntry { raw, window }),
        );
        tracing::debug!(%window, %renderer, "created renderer");
        Ok(renderer)
    }

    /// Destroys a window. Renderers created for it are destroyed first.
    pub fn destroy_window(&self, window: WindowId) -> Result<()> {
        let entry = self
            .windows
            .borrow_mut()
            .release(window.0)
            .map_err(|err| self.policy.enforce(err))?;

        let children: Vec<RendererId> = {
            let renderers = self.renderers.borrow();
            renderers
                .live_ids()
                .into_iter()
                .map(RendererId)
                .filter(|id| {
                    renderers
                        .get(id.0)
                        .map(|child| child.window == window)
                        .unwrap_or(false)
                })
                .collect()
        };
        for renderer in children {
            self.destroy_renderer(renderer)?;
            self.cascaded.borrow_mut().insert(renderer);
        }

        self.backend.destroy_window(entry.raw);
        tracing::debug!(%window, "destroyed window");
        Ok(())
    }

    pub fn destroy_renderer(&self, renderer: RendererId) -> Result<()> {
        let entry = self
            .renderers
            .borrow_mut()
            .release(renderer.0)
            .map_err(|err| self.policy.enforce(err))?;
        self.backend.destroy_renderer(entry.raw);
        tracing::debug!(%renderer, "destroyed renderer");
        Ok(())
    }

    /// Returns `true` once for a renderer released by destroying its window.
    pub(crate) fn take_cascaded(&self, renderer: RendererId) -> bool {
        self.cascaded.borrow_mut().remove(&renderer)
    }

    pub fn is_window_live(&self, window: WindowId) -> bool {
        self.windows.borrow().contains(window.0)
    }

    pub fn is_renderer_live(&self, renderer: RendererId) -> bool {
        self.renderers.borrow().contains(renderer.0)
    }

    /// The window a renderer draws into.
    pub fn renderer_window(&self, renderer: RendererId) -> Result<WindowId> {
        self.renderers
            .borrow()
            .get(renderer.0)
            .map(|entry| entry.window)
            .map_err(|err| self.policy.enforce(err))
    }

    pub fn window_size(&self, window: WindowId) -> Result<(i32, i32)> {
        let raw = self.raw_window(window)?;
        self.backend
            .window_size(raw)
            .ok_or_else(|| self.native_failure("SDL_GetWindowSize"))
    }

    pub fn set_window_title(&self, window: WindowId, title: &str) -> Result<()> {
        let title = c_string("title", title)?;
        let raw = self.raw_window(window)?;
        self.check(self.backend.set_window_title(raw, &title), "SDL_SetWindowTitle")
    }

    /// Takes the next pending event, if any.
    pub fn poll_event(&self) -> Option<Event> {
        let mut raw = crate::ffi::RawEvent::zeroed();
        self.backend
            .poll_event(&mut raw)
            .then(|| Event::decode(&raw))
    }

    /// Milliseconds since SDL was initialised.
    pub fn ticks(&self) -> u64 {
        self.backend.ticks()
    }

    pub fn set_draw_color(&self, renderer: RendererId, color: Color) -> Result<()> {
        let channels = color.to_array();
        if channels.iter().any(|c| !c.is_finite()) {
            return Err(SdlError::invalid("color", format!("channels must be finite, got {color:?}")));
        }
        let raw = self.raw_renderer(renderer)?;
        self.check(
            self.backend.set_draw_color(raw, channels),
            "SDL_SetRenderDrawColorFloat",
        )
    }

    pub fn clear(&self, renderer: RendererId) -> Result<()> {
        let raw = self.raw_renderer(renderer)?;
        self.check(self.backend.clear(raw), "SDL_RenderClear")
    }

    pub fn fill_rects(&self, renderer: RendererId, rects: &[FRect]) -> Result<()> {
        fits_i32("rects", rects.len())?;
        let raw = self.raw_renderer(renderer)?;
        if rects.is_empty() {
            return Ok(());
        }
        self.check(self.backend.fill_rects(raw, rects), "SDL_RenderFillRects")
    }

    pub fn draw_points(&self, renderer: RendererId, points: &[FPoint]) -> Result<()> {
        fits_i32("points", points.len())?;
        let raw = self.raw_renderer(renderer)?;
        if points.is_empty() {
            return Ok(());
        }
        self.check(self.backend.draw_points(raw, points), "SDL_RenderPoints")
    }

    pub fn present(&self, renderer: RendererId) -> Result<()> {
        let raw = self.raw_renderer(renderer)?;
        self.check(self.backend.present(raw), "SDL_RenderPresent")
    }

    /// Uniform random number in `[0, 1)` from SDL's generator.
    pub fn rand_f32(&self) -> f32 {
        self.backend.rand_f32()
    }

    /// Uniform random integer in `[0, n)`.
    pub fn rand_below(&self, n: i32) -> Result<i32> {
        if n <= 0 {
            return Err(SdlError::invalid("n", format!("bound must be positive, got {n}")));
        }
        Ok(self.backend.rand_below(n))
    }

    pub fn resource_counts(&self) -> ResourceCounts {
        self.window_counts().combine(self.renderer_counts())
    }

    pub fn window_counts(&self) -> ResourceCounts {
        self.windows.borrow().counts()
    }

    pub fn renderer_counts(&self) -> ResourceCounts {
        self.renderers.borrow().counts()
    }

    /// Releases every live handle, renderers before windows, then shuts SDL
    /// down.
    pub fn shutdown(self) -> ResourceCounts {
        self.teardown()
    }

    fn teardown(&self) -> ResourceCounts {
        if !self.active.replace(false) {
            return self.resource_counts();
        }

        let renderers = self.renderers.borrow_mut().drain();
        for (_, entry) in &renderers {
            self.backend.destroy_renderer(entry.raw);
        }
        let windows = self.windows.borrow_mut().drain();
        for (_, entry) in &windows {
            self.backend.destroy_window(entry.raw);
        }
        self.backend.quit();
        self.backend.session().release();
        self.cascaded.borrow_mut().clear();

        let counts = self.resource_counts();
        tracing::info!(
            leaked_renderers = renderers.len(),
            leaked_windows = windows.len(),
            created = counts.created,
            "SDL shut down"
        );
        counts
    }

    fn raw_window(&self, window: WindowId) -> Result<RawWindow> {
        self.windows
            .borrow()
            .get(window.0)
            .map(|entry| entry.raw)
            .map_err(|err| self.policy.enforce(err))
    }

    fn raw_renderer(&self, renderer: RendererId) -> Result<RawRenderer> {
        self.renderers
            .borrow()
            .get(renderer.0)
            .map(|entry| entry.raw)
            .map_err(|err| self.policy.enforce(err))
    }

    fn check(&self, ok: bool, call: &'static str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(self.native_failure(call))
        }
    }

    fn native_failure(&self, call: &'static str) -> SdlError {
        let err = SdlError::native(call, self.backend.last_error());
        tracing::warn!(error = %err, "native call failed");
        err
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("windows", &self.window_counts())
            .field("renderers", &self.renderer_counts())
            .field("policy", &self.policy)
            .field("active", &self.active.get())
            .finish()
    }
}

fn c_string(argument: &'static str, text: &str) -> Result<CString> {
    CString::new(text).map_err(|err| {
        SdlError::invalid(
            argument,
            format!("interior NUL byte at offset {}", err.nul_position()),
        )
    })
}

fn positive(argument: &'static str, value: i32) -> Result<i32> {
    if value > 0 {
        Ok(value)
    } else {
        Err(SdlError::invalid(argument, format!("must be positive, got {value}")))
    }
}

fn fits_i32(argument: &'static str, len: usize) -> Result<()> {
    if i32::try_from(len).is_ok() {
        Ok(())
    } else {
        Err(SdlError::invalid(argument, format!("{len} items exceed the native count limit")))
    }
}
