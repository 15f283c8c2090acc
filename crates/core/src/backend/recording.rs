use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    ffi::{c_void, CStr},
    rc::Rc,
};

use super::{Backend, RawRenderer, RawWindow, SessionFlag};
use crate::ffi::{FPoint, FRect, RawEvent};

/// Everything the recording backend observed, shared with the test.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub calls: Vec<&'static str>,
    pub live_windows: HashSet<usize>,
    pub live_renderers: HashSet<usize>,
    pub window_sizes: HashMap<usize, (i32, i32)>,
    pub titles: HashMap<usize, String>,
    /// Destroy calls on pointers that were not live.
    pub invalid_destroys: usize,
    pub fail_next: Option<&'static str>,
    pub events: VecDeque<RawEvent>,
    pub drawn_points: usize,
    pub initialized: bool,
    pub next_ptr: usize,
}

impl Journal {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    pub fn native_calls(&self) -> usize {
        self.calls.len()
    }
}

/// In-memory [`Backend`] that records calls and hands out fake pointers.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingBackend {
    pub journal: Rc<RefCell<Journal>>,
    /// Clones stand for the same native library and share its session.
    session: Rc<SessionFlag>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call to `call` report failure.
    pub fn fail_next(&self, call: &'static str) {
        self.journal.borrow_mut().fail_next = Some(call);
    }

    pub fn push_event(&self, event: RawEvent) {
        self.journal.borrow_mut().events.push_back(event);
    }

    fn record(&self, call: &'static str) -> bool {
        let mut journal = self.journal.borrow_mut();
        journal.calls.push(call);
        if journal.fail_next == Some(call) {
            journal.fail_next = None;
            return false;
        }
        true
    }

    fn fresh_ptr(&self) -> *mut c_void {
        let mut journal = self.journal.borrow_mut();
        journal.next_ptr += 16;
        journal.next_ptr as *mut c_void
    }

    fn new_window(&self, title: &CStr, width: i32, height: i32) -> Option<RawWindow> {
        let window = RawWindow::from_ptr(self.fresh_ptr())?;
        let key = window.as_ptr() as usize;
        let mut journal = self.journal.borrow_mut();
        journal.live_windows.insert(key);
        journal.window_sizes.insert(key, (width, height));
        journal
            .titles
            .insert(key, title.to_string_lossy().into_owned());
        Some(window)
    }

    fn new_renderer(&self) -> Option<RawRenderer> {
        let renderer = RawRenderer::from_ptr(self.fresh_ptr())?;
        self.journal
            .borrow_mut()
            .live_renderers
            .insert(renderer.as_ptr() as usize);
        Some(renderer)
    }
}

impl Backend for RecordingBackend {
    fn session(&self) -> &SessionFlag {
        &self.session
    }

    fn init(&self, _flags: u32) -> bool {
        let ok = self.record("SDL_Init");
        self.journal.borrow_mut().initialized = ok;
        ok
    }

    fn quit(&self) {
        self.record("SDL_Quit");
        self.journal.borrow_mut().initialized = false;
    }

    fn last_error(&self) -> String {
        "recorded failure".to_string()
    }

    fn create_window_and_renderer(
        &self,
        title: &CStr,
        width: i32,
        height: i32,
        _flags: u64,
    ) -> Option<(RawWindow, RawRenderer)> {
        if !self.record("SDL_CreateWindowAndRenderer") {
            return None;
        }
        Some((self.new_window(title, width, height)?, self.new_renderer()?))
    }

    fn create_window(&self, title: &CStr, width: i32, height: i32, _flags: u64) -> Option<RawWindow> {
        if !self.record("SDL_CreateWindow") {
            return None;
        }
        self.new_window(title, width, height)
    }

    fn create_renderer(&self, _window: RawWindow) -> Option<RawRenderer> {
        if !self.record("SDL_CreateRenderer") {
            return None;
        }
        self.new_renderer()
    }

    fn destroy_window(&self, window: RawWindow) {
        self.record("SDL_DestroyWindow");
        let mut journal = self.journal.borrow_mut();
        if !journal.live_windows.remove(&(window.as_ptr() as usize)) {
            journal.invalid_destroys += 1;
        }
    }

    fn destroy_renderer(&self, renderer: RawRenderer) {
        self.record("SDL_DestroyRenderer");
        let mut journal = self.journal.borrow_mut();
        if !journal.live_renderers.remove(&(renderer.as_ptr() as usize)) {
            journal.invalid_destroys += 1;
        }
    }

    fn window_size(&self, window: RawWindow) -> Option<(i32, i32)> {
        if !self.record("SDL_GetWindowSize") {
            return None;
        }
        self.journal
            .borrow()
            .window_sizes
            .get(&(window.as_ptr() as usize))
            .copied()
    }

    fn set_window_title(&self, window: RawWindow, title: &CStr) -> bool {
        if !self.record("SDL_SetWindowTitle") {
            return false;
        }
        self.journal
            .borrow_mut()
            .titles
            .insert(window.as_ptr() as usize, title.to_string_lossy().into_owned());
        true
    }

    fn poll_event(&self, event: &mut RawEvent) -> bool {
        self.record("SDL_PollEvent");
        match self.journal.borrow_mut().events.pop_front() {
            Some(next) => {
                *event = next;
                true
            }
            None => false,
        }
    }

    fn ticks(&self) -> u64 {
        self.record("SDL_GetTicks");
        16 * self.journal.borrow().count("SDL_GetTicks") as u64
    }

    fn set_draw_color(&self, _renderer: RawRenderer, _rgba: [f32; 4]) -> bool {
        self.record("SDL_SetRenderDrawColorFloat")
    }

    fn clear(&self, _renderer: RawRenderer) -> bool {
        self.record("SDL_RenderClear")
    }

    fn fill_rects(&self, _renderer: RawRenderer, _rects: &[FRect]) -> bool {
        self.record("SDL_RenderFillRects")
    }

    fn draw_points(&self, _renderer: RawRenderer, points: &[FPoint]) -> bool {
        let ok = self.record("SDL_RenderPoints");
        if ok {
            self.journal.borrow_mut().drawn_points += points.len();
        }
        ok
    }

    fn present(&self, _renderer: RawRenderer) -> bool {
        self.record("SDL_RenderPresent")
    }

    fn rand_f32(&self) -> f32 {
        self.record("SDL_randf");
        0.5
    }

    fn rand_below(&self, n: i32) -> i32 {
        self.record("SDL_rand");
        n - 1
    }
}
