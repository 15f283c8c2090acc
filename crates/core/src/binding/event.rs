use crate::ffi::{
    RawEvent, SDL_EVENT_KEY_DOWN, SDL_EVENT_KEY_UP, SDL_EVENT_QUIT, SDL_EVENT_WINDOW_RESIZED,
};

// Byte offsets inside `SDL_KeyboardEvent` and `SDL_WindowEvent`.
const KEY_SCANCODE: usize = 24;
const KEY_KEYCODE: usize = 28;
const KEY_REPEAT: usize = 37;
const WINDOW_DATA1: usize = 20;
const WINDOW_DATA2: usize = 24;

/// Decoded form of the events the binding understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Quit,
    KeyDown {
        scancode: u32,
        keycode: u32,
        repeat: bool,
    },
    KeyUp {
        scancode: u32,
        keycode: u32,
    },
    WindowResized {
        width: i32,
        height: i32,
    },
    /// Any other event, identified by its raw type code.
    Other(u32),
}

impl Event {
    pub fn decode(raw: &RawEvent) -> Self {
        match raw.event_type() {
            SDL_EVENT_QUIT => Self::Quit,
            SDL_EVENT_KEY_DOWN => Self::KeyDown {
                scancode: raw.u32_at(KEY_SCANCODE),
                keycode: raw.u32_at(KEY_KEYCODE),
                repeat: raw.bool_at(KEY_REPEAT),
            },
            SDL_EVENT_KEY_UP => Self::KeyUp {
                scancode: raw.u32_at(KEY_SCANCODE),
                keycode: raw.u32_at(KEY_KEYCODE),
            },
            SDL_EVENT_WINDOW_RESIZED => Self::WindowResized {
                width: raw.i32_at(WINDOW_DATA1),
                height: raw.i32_at(WINDOW_DATA2),
            },
            other => Self::Other(other),
        }
    }
}
