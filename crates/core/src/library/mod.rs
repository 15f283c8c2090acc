//! Process-wide ownership of the loaded native library.
//!
//! [`LibraryHost::global`] is the single instance the binding layer uses.
//! It is initialised by the first successful [`LibraryHost::load`] and torn
//! down by [`LibraryHost::unload`]; the library stays mapped until the last
//! [`Arc<NativeLibrary>`] is dropped, so outstanding function tables remain
//! valid across an unload.

use std::{
    ffi::CString,
    fmt,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, OnceLock,
    },
};

use crate::{
    platform::{Candidate, LibraryResolver},
    Result, SdlError,
};

/// An opened shared library together with where it was loaded from.
pub struct NativeLibrary {
    origin: Candidate,
    inner: libloading::Library,
}

impl NativeLibrary {
    /// Opens the library at the given candidate location.
    pub fn open(candidate: &Candidate) -> Result<Self> {
        // SAFETY: SDL3 has no library constructors with preconditions on the
        // host process.
        let opened = unsafe {
            match candidate {
                Candidate::File(path) => libloading::Library::new(path),
                Candidate::System(name) => libloading::Library::new(name),
            }
        };

        let inner = opened.map_err(|err| SdlError::load(format!("{candidate}: {err}")))?;
        Ok(Self {
            origin: candidate.clone(),
            inner,
        })
    }

    pub fn origin(&self) -> &Candidate {
        &self.origin
    }

    /// The file the library was opened from, when it was found on disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Candidate::File(path) => Some(path),
            Candidate::System(_) => None,
        }
    }

    /// Resolves an exported function.
    ///
    /// # Safety
    ///
    /// `T` must be a function pointer type matching the native signature of
    /// `symbol`. The returned pointer is only valid while this library is
    /// loaded.
    pub unsafe fn function<T: Copy>(&self, symbol: &str) -> Result<T> {
        let name = CString::new(symbol)
            .map_err(|_| SdlError::invalid("symbol", "symbol names cannot contain NUL"))?;
        let resolved = self
            .inner
            .get::<T>(name.as_bytes_with_nul())
            .map_err(|err| SdlError::load(format!("missing symbol `{symbol}`: {err}")))?;
        Ok(*resolved)
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        // SAFETY: the pointer is only checked for presence and never called.
        unsafe { self.function::<*const ()>(symbol).is_ok() }
    }
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Holder of the loaded library handle.
#[derive(Debug, Default)]
pub struct LibraryHost {
    slot: Mutex<Option<Arc<NativeLibrary>>>,
    loads: AtomicUsize,
}

impl LibraryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide host used by [`crate::Context::load`].
    pub fn global() -> &'static LibraryHost {
        static GLOBAL: OnceLock<LibraryHost> = OnceLock::new();
        GLOBAL.get_or_init(LibraryHost::new)
    }

    /// Loads the first candidate that opens, or returns the library that is
    /// already loaded.
    pub fn load(&self, resolver: &LibraryResolver) -> Result<Arc<NativeLibrary>> {
        self.load_verified(resolver, |_| Ok(()))
    }

    /// Like [`LibraryHost::load`], but a candidate that opens is only kept
    /// when `verify` accepts it. Rejected candidates are closed and the next
    /// one is tried.
    pub fn load_verified<F>(&self, resolver: &LibraryResolver, verify: F) -> Result<Arc<NativeLibrary>>
    where
        F: Fn(&NativeLibrary) -> Result<()>,
    {
        let mut slot = self.lock()?;
        if let Some(library) = slot.as_ref() {
            return Ok(library.clone());
        }

        let candidates = resolver.candidates();
        if candidates.is_empty() {
            let searched = resolver
                .search_dirs()
                .iter()
                .map(|dir| dir.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SdlError::load(format!(
                "no file named {:?} found for {} (searched: {searched})",
                resolver.file_names(),
                resolver.platform(),
            )));
        }

        let mut failures = Vec::new();
        for candidate in &candidates {
            match NativeLibrary::open(candidate).and_then(|library| {
                verify(&library)?;
                Ok(library)
            }) {
                Ok(library) => {
                    tracing::info!(origin = %candidate, "loaded native library");
                    let library = Arc::new(library);
                    *slot = Some(library.clone());
                    self.loads.fetch_add(1, Ordering::SeqCst);
                    return Ok(library);
                }
                Err(err) => {
                    tracing::debug!(origin = %candidate, error = %err, "rejected library candidate");
                    failures.push(err.to_string());
                }
            }
        }

        Err(SdlError::load(format!(
            "every candidate failed to load: {}",
            failures.join("; ")
        )))
    }

    pub fn current(&self) -> Result<Option<Arc<NativeLibrary>>> {
        Ok(self.lock()?.clone())
    }

    pub fn is_loaded(&self) -> Result<bool> {
        Ok(self.current()?.is_some())
    }

    /// Drops the host's reference to the loaded library. Returns `false` when
    /// nothing was loaded.
    pub fn unload(&self) -> Result<bool> {
        let mut slot = self.lock()?;
        match slot.take() {
            Some(library) => {
                tracing::info!(origin = %library.origin(), "released native library");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of successful loads over the lifetime of this host.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Arc<NativeLibrary>>>> {
        self.slot
            .lock()
            .map_err(|_| SdlError::msg("library host has been poisoned"))
    }
}

/// Directory component of a loaded library, used for diagnostics.
pub fn library_dir(library: &NativeLibrary) -> Option<PathBuf> {
    library.path().and_then(Path::parent).map(Path::to_path_buf)
}
