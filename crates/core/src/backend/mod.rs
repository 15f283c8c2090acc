//! The raw native surface the binding layer calls into.
//!
//! [`Backend`] methods take already-validated arguments and report failure
//! the way SDL does (a `false`/`None` result plus [`Backend::last_error`]).
//! Translating that into [`crate::SdlError`] is the binding layer's job.

use std::{
    ffi::{c_void, CStr},
    ptr::NonNull,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::ffi::{FPoint, FRect, RawEvent};

#[cfg(test)]
pub(crate) mod recording;

/// Opaque `SDL_Window*` that is known to be non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawWindow(NonNull<c_void>);

/// Opaque `SDL_Renderer*` that is known to be non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRenderer(NonNull<c_void>);

impl RawWindow {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl RawRenderer {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Marks a native library as initialised by a live [`crate::Context`].
///
/// `SDL_Quit` tears down state shared by every caller, so only one context
/// may hold the session of a given library at a time.
#[derive(Debug, Default)]
pub struct SessionFlag(AtomicBool);

impl SessionFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns `false` when the session is already held.
    pub fn try_claim(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Native entry points used by [`crate::Context`].
///
/// Implementations may assume every pointer argument is live: the binding
/// layer never passes a window or renderer that its tracker has released.
pub trait Backend {
    /// Session shared by every backend driving the same native library.
    fn session(&self) -> &SessionFlag;

    fn init(&self, flags: u32) -> bool;
    fn quit(&self);
    /// Message describing the most recent native failure.
    fn last_error(&self) -> String;

    fn create_window_and_renderer(
        &self,
        title: &CStr,
        width: i32,
        height: i32,
        flags: u64,
    ) -> Option<(RawWindow, RawRenderer)>;
    fn create_window(&self, title: &CStr, width: i32, height: i32, flags: u64) -> Option<RawWindow>;
    fn create_renderer(&self, window: RawWindow) -> Option<RawRenderer>;
    fn destroy_window(&self, window: RawWindow);
    fn destroy_renderer(&self, renderer: RawRenderer);
    fn window_size(&self, window: RawWindow) -> Option<(i32, i32)>;
    fn set_window_title(&self, window: RawWindow, title: &CStr) -> bool;

    fn poll_event(&self, event: &mut RawEvent) -> bool;
    fn ticks(&self) -> u64;

    fn set_draw_color(&self, renderer: RawRenderer, rgba: [f32; 4]) -> bool;
    fn clear(&self, renderer: RawRenderer) -> bool;
    fn fill_rects(&self, renderer: RawRenderer, rects: &[FRect]) -> bool;
    fn draw_points(&self, renderer: RawRenderer, points: &[FPoint]) -> bool;
    fn present(&self, renderer: RawRenderer) -> bool;

    fn rand_f32(&self) -> f32;
    fn rand_below(&self, n: i32) -> i32;
}
