//! C-compatible types, constants, and the SDL3 function table.
//!
//! The function table and [`CALL_DESCRIPTORS`] are generated from the same
//! declaration, so every descriptor has exactly one resolved entry point.

use std::{
    cell::RefCell,
    ffi::{c_char, c_void, CStr},
    fmt,
    ptr,
    sync::Arc,
};

use crate::{
    backend::{Backend, RawRenderer, RawWindow, SessionFlag},
    library::NativeLibrary,
    Result,
};

pub const SDL_INIT_VIDEO: u32 = 0x0000_0020;
pub const SDL_WINDOW_RESIZABLE: u64 = 0x0000_0000_0000_0020;

pub const SDL_EVENT_QUIT: u32 = 0x100;
pub const SDL_EVENT_WINDOW_RESIZED: u32 = 0x206;
pub const SDL_EVENT_KEY_DOWN: u32 = 0x300;
pub const SDL_EVENT_KEY_UP: u32 = 0x301;

pub const SDL_SCANCODE_ESCAPE: u32 = 41;

/// `SDL_FPoint`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FPoint {
    pub x: f32,
    pub y: f32,
}

/// `SDL_FRect`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Storage for an `SDL_Event` union. Fields are read by byte offset in
/// [`crate::binding::Event::decode`].
#[repr(C, align(8))]
#[derive(Clone, Copy)]
pub struct RawEvent {
    pub bytes: [u8; 128],
}

impl RawEvent {
    pub fn zeroed() -> Self {
        Self { bytes: [0; 128] }
    }

    pub fn event_type(&self) -> u32 {
        self.u32_at(0)
    }

    pub fn u32_at(&self, offset: usize) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[offset..offset + 4]);
        u32::from_ne_bytes(word)
    }

    pub fn i32_at(&self, offset: usize) -> i32 {
        self.u32_at(offset) as i32
    }

    pub fn bool_at(&self, offset: usize) -> bool {
        self.bytes[offset] != 0
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
    }
}

impl Default for RawEvent {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEvent")
            .field("type", &format_args!("{:#x}", self.event_type()))
            .finish()
    }
}

/// Maps a binding entry point to its native symbol and C signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallDescriptor {
    pub symbol: &'static str,
    pub signature: &'static str,
}

macro_rules! native_calls {
    ($( $field:ident => $symbol:literal : fn($($arg:ty),*) $(-> $ret:ty)?; )*) => {
        /// Every native function the binding layer resolves.
        pub const CALL_DESCRIPTORS: &[CallDescriptor] = &[
            $( CallDescriptor {
                symbol: $symbol,
                signature: stringify!(fn($($arg),*) $(-> $ret)?),
            }, )*
        ];

        struct SdlFunctions {
            $( $field: unsafe extern "C" fn($($arg),*) $(-> $ret)?, )*
        }

        impl SdlFunctions {
            fn resolve(library: &NativeLibrary) -> Result<Self> {
                // SAFETY: each field type is the C signature of its symbol.
                unsafe {
                    Ok(Self {
                        $( $field: library.function($symbol)?, )*
                    })
                }
            }
        }
    };
}

native_calls! {
    init => "SDL_Init": fn(u32) -> bool;
    quit => "SDL_Quit": fn();
    get_error => "SDL_GetError": fn() -> *const c_char;
    create_window_and_renderer => "SDL_CreateWindowAndRenderer":
        fn(*const c_char, i32, i32, u64, *mut *mut c_void, *mut *mut c_void) -> bool;
    create_window => "SDL_CreateWindow": fn(*const c_char, i32, i32, u64) -> *mut c_void;
    create_renderer => "SDL_CreateRenderer": fn(*mut c_void, *const c_char) -> *mut c_void;
    destroy_window => "SDL_DestroyWindow": fn(*mut c_void);
    destroy_renderer => "SDL_DestroyRenderer": fn(*mut c_void);
    get_window_size => "SDL_GetWindowSize": fn(*mut c_void, *mut i32, *mut i32) -> bool;
    set_window_title => "SDL_SetWindowTitle": fn(*mut c_void, *const c_char) -> bool;
    poll_event => "SDL_PollEvent": fn(*mut RawEvent) -> bool;
    get_ticks => "SDL_GetTicks": fn() -> u64;
    set_render_draw_color_float => "SDL_SetRenderDrawColorFloat":
        fn(*mut c_void, f32, f32, f32, f32) -> bool;
    render_clear => "SDL_RenderClear": fn(*mut c_void) -> bool;
    render_fill_rects => "SDL_RenderFillRects": fn(*mut c_void, *const FRect, i32) -> bool;
    render_points => "SDL_RenderPoints": fn(*mut c_void, *const FPoint, i32) -> bool;
    render_present => "SDL_RenderPresent": fn(*mut c_void) -> bool;
    randf => "SDL_randf": fn() -> f32;
    rand => "SDL_rand": fn(i32) -> i32;
}

/// SDL keeps its state per process, so every [`SdlBackend`] shares one
/// session.
static SDL_SESSION: SessionFlag = SessionFlag::new();

/// [`Backend`] backed by a loaded SDL3 shared library.
pub struct SdlBackend {
    calls: SdlFunctions,
    library: Arc<NativeLibrary>,
    /// Failure detected on the Rust side, reported ahead of `SDL_GetError`.
    pending_error: RefCell<Option<String>>,
}

impl SdlBackend {
    /// Resolves every entry in [`CALL_DESCRIPTORS`]. A missing symbol is
    /// reported as a load error.
    pub fn new(library: Arc<NativeLibrary>) -> Result<Self> {
        let calls = SdlFunctions::resolve(&library)?;
        tracing::debug!(symbols = CALL_DESCRIPTORS.len(), "resolved SDL3 entry points");
        Ok(Self {
            calls,
            library,
            pending_error: RefCell::new(None),
        })
    }

    /// Checks that a library exports every descriptor without keeping it.
    pub fn verify(library: &NativeLibrary) -> Result<()> {
        SdlFunctions::resolve(library).map(|_| ())
    }
}

impl fmt::Debug for SdlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdlBackend")
            .field("library", &self.library)
            .finish()
    }
}

/// Pairs the out-pointers of `SDL_CreateWindowAndRenderer`. If only one of
/// them is non-null, that half is destroyed so it cannot leak.
fn pair_or_destroy(
    window: *mut c_void,
    renderer: *mut c_void,
    destroy_window: impl FnOnce(RawWindow),
    destroy_renderer: impl FnOnce(RawRenderer),
) -> std::result::Result<(RawWindow, RawRenderer), &'static str> {
    match (RawWindow::from_ptr(window), RawRenderer::from_ptr(renderer)) {
        (Some(window), Some(renderer)) => Ok((window, renderer)),
        (Some(window), None) => {
            destroy_window(window);
            Err("SDL_CreateWindowAndRenderer returned a null renderer")
        }
        (None, Some(renderer)) => {
            destroy_renderer(renderer);
            Err("SDL_CreateWindowAndRenderer returned a null window")
        }
        (None, None) => Err("SDL_CreateWindowAndRenderer returned no window or renderer"),
    }
}

fn slice_len<T>(items: &[T]) -> i32 {
    // Callers validate lengths before reaching the backend.
    i32::try_from(items.len()).unwrap_or(i32::MAX)
}

// SAFETY (all blocks below): pointers come from SDL or from live Rust
// references, and the binding layer guarantees window and renderer handles
// have not been destroyed.
impl Backend for SdlBackend {
    fn init(&self, flags: u32) -> bool {
        unsafe { (self.calls.init)(flags) }
    }

    fn quit(&self) {
        unsafe { (self.calls.quit)() }
    }

    fn session(&self) -> &SessionFlag {
        &SDL_SESSION
    }

    fn last_error(&self) -> String {
        if let Some(message) = self.pending_error.borrow_mut().take() {
            return message;
        }
        let message = unsafe { (self.calls.get_error)() };
        if message.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }

    fn create_window_and_renderer(
        &self,
        title: &CStr,
        width: i32,
        height: i32,
        flags: u64,
    ) -> Option<(RawWindow, RawRenderer)> {
        let mut window = ptr::null_mut();
        let mut renderer = ptr::null_mut();
        let ok = unsafe {
            (self.calls.create_window_and_renderer)(
                title.as_ptr(),
                width,
                height,
                flags,
                &mut window,
                &mut renderer,
            )
        };
        if !ok {
            return None;
        }
        pair_or_destroy(
            window,
            renderer,
            |window| self.destroy_window(window),
            |renderer| self.destroy_renderer(renderer),
        )
        .map_err(|message| {
            tracing::warn!(reason = message, "discarding half-created window and renderer");
            *self.pending_error.borrow_mut() = Some(message.to_string());
        })
        .ok()
    }

    fn create_window(&self, title: &CStr, width: i32, height: i32, flags: u64) -> Option<RawWindow> {
        RawWindow::from_ptr(unsafe { (self.calls.create_window)(title.as_ptr(), width, height, flags) })
    }

    fn create_renderer(&self, window: RawWindow) -> Option<RawRenderer> {
        RawRenderer::from_ptr(unsafe { (self.calls.create_renderer)(window.as_ptr(), ptr::null()) })
    }

    fn destroy_window(&self, window: RawWindow) {
        unsafe { (self.calls.destroy_window)(window.as_ptr()) }
    }

    fn destroy_renderer(&self, renderer: RawRenderer) {
        unsafe { (self.calls.destroy_renderer)(renderer.as_ptr()) }
    }

    fn window_size(&self, window: RawWindow) -> Option<(i32, i32)> {
        let (mut width, mut height) = (0, 0);
        let ok = unsafe { (self.calls.get_window_size)(window.as_ptr(), &mut width, &mut height) };
        ok.then_some((width, height))
    }

    fn set_window_title(&self, window: RawWindow, title: &CStr) -> bool {
        unsafe { (self.calls.set_window_title)(window.as_ptr(), title.as_ptr()) }
    }

    fn poll_event(&self, event: &mut RawEvent) -> bool {
        unsafe { (self.calls.poll_event)(event) }
    }

    fn ticks(&self) -> u64 {
        unsafe { (self.calls.get_ticks)() }
    }

    fn set_draw_color(&self, renderer: RawRenderer, [r, g, b, a]: [f32; 4]) -> bool {
        unsafe { (self.calls.set_render_draw_color_float)(renderer.as_ptr(), r, g, b, a) }
    }

    fn clear(&self, renderer: RawRenderer) -> bool {
        unsafe { (self.calls.render_clear)(renderer.as_ptr()) }
    }

    fn fill_rects(&self, renderer: RawRenderer, rects: &[FRect]) -> bool {
        unsafe { (self.calls.render_fill_rects)(renderer.as_ptr(), rects.as_ptr(), slice_len(rects)) }
    }

    fn draw_points(&self, renderer: RawRenderer, points: &[FPoint]) -> bool {
        unsafe { (self.calls.render_points)(renderer.as_ptr(), points.as_ptr(), slice_len(points)) }
    }

    fn present(&self, renderer: RawRenderer) -> bool {
        unsafe { (self.calls.render_present)(renderer.as_ptr()) }
    }

    fn rand_f32(&self) -> f32 {
        unsafe { (self.calls.randf)() }
    }

    fn rand_below(&self, n: i32) -> i32 {
        unsafe { (self.calls.rand)(n) }
    }
}
