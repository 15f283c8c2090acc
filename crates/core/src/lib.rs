//! Safe, runtime-loaded bindings to the native SDL3 library.
//!
//! The crate is split along the boundary a native binding has to police:
//! locating and loading the shared library ([`platform`], [`library`]),
//! describing and resolving its entry points ([`ffi`]), tracking the
//! lifetime of every native handle ([`handles`]), and the validated,
//! single-threaded call surface built on top of them ([`binding`]).
//! [`dispatch`] lets other threads hand work to the thread that owns the
//! [`Context`].

pub mod backend;
pub mod binding;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ffi;
pub mod handles;
pub mod library;
pub mod platform;

pub use backend::{Backend, RawRenderer, RawWindow, SessionFlag};
pub use binding::{Color, Context, Event, Owned, RendererId, Resource, WindowFlags, WindowId};
pub use config::{BindingConfig, DemoConfig, LibraryConfig, WindowConfig};
pub use dispatch::{Dispatcher, JobQueue, Pending};
pub use error::{ErrorKind, Result, SdlError};
pub use ffi::{CallDescriptor, FPoint, FRect, SdlBackend, CALL_DESCRIPTORS};
pub use handles::{HandleId, LifetimePolicy, ResourceCounts};
pub use library::{LibraryHost, NativeLibrary};
pub use platform::{Candidate, LibraryResolver, Platform, TargetOs};
