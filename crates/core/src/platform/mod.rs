//! Locates the SDL3 shared library for the running platform.
//!
//! The working directory is searched first because that is where the
//! prebuilt library is copied for local runs. Configured directories follow,
//! then the system library directories, and finally the bare file names are
//! handed to the system loader.

use std::{
    collections::HashSet,
    env, fmt,
    path::{Path, PathBuf},
};

use crate::{config::LibraryConfig, Result};

/// Operating system family, as far as library naming is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl TargetOs {
    pub fn current() -> Self {
        match env::consts::OS {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }

    /// Default SDL3 library file names, most specific first.
    pub fn library_file_names(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["SDL3.dll"],
            Self::Linux => &["libSDL3.so", "libSDL3.so.0"],
            Self::MacOs => &["libSDL3.dylib", "libSDL3.0.dylib"],
            Self::Other => &[],
        }
    }

    /// Environment variables the system loader reads its search path from.
    fn path_variables(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["PATH"],
            Self::Linux => &["LD_LIBRARY_PATH"],
            Self::MacOs => &["DYLD_LIBRARY_PATH", "DYLD_FALLBACK_LIBRARY_PATH"],
            Self::Other => &[],
        }
    }

    fn well_known_dirs(self) -> &'static [&'static str] {
        match self {
            Self::Linux => &["/usr/local/lib", "/usr/lib", "/usr/lib64", "/lib"],
            Self::MacOs => &["/usr/local/lib", "/opt/homebrew/lib"],
            Self::Windows | Self::Other => &[],
        }
    }
}

/// Operating system and CPU architecture of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: TargetOs,
    pub arch: &'static str,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            os: TargetOs::current(),
            arch: env::consts::ARCH,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.os, self.arch)
    }
}

/// A location the library may be opened from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// An existing file found in one of the searched directories.
    File(PathBuf),
    /// A bare file name resolved by the system loader's own search rules.
    System(String),
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::System(name) => write!(f, "{name} (system loader)"),
        }
    }
}

/// Produces the ordered list of library candidates for a platform.
#[derive(Debug, Clone)]
pub struct LibraryResolver {
    platform: Platform,
    working_dir: PathBuf,
    config: LibraryConfig,
}

impl LibraryResolver {
    /// Creates a resolver rooted at the process's working directory.
    pub fn new(config: LibraryConfig) -> Result<Self> {
        let working_dir = env::current_dir()?;
        Ok(Self::with_working_dir(config, working_dir))
    }

    pub fn with_working_dir(config: LibraryConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform: Platform::current(),
            working_dir: working_dir.into(),
            config,
        }
    }

    /// Overrides the detected platform, mainly to inspect naming rules of
    /// other targets.
    pub fn for_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn file_names(&self) -> Vec<String> {
        match &self.config.file_names {
            Some(names) => names.clone(),
            None => self
                .platform
                .os
                .library_file_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    /// Directories searched, in order, before falling back to the system
    /// loader.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.working_dir.clone()];
        dirs.extend(self.config.search_dirs.iter().map(|dir| self.absolutize(dir)));

        if self.config.system_paths {
            for var in self.platform.os.path_variables() {
                if let Some(value) = env::var_os(var) {
                    dirs.extend(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
                }
            }
            dirs.extend(
                self.platform
                    .os
                    .well_known_dirs()
                    .iter()
                    .map(PathBuf::from),
            );
        }

        let mut seen = HashSet::new();
        dirs.retain(|dir| seen.insert(dir.clone()));
        dirs
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        let names = self.file_names();
        let mut candidates = Vec::new();

        for dir in self.search_dirs() {
            let mut roots = vec![dir.clone()];
            roots.extend(self.config.build_subdirs.iter().map(|sub| dir.join(sub)));

            for root in roots {
                for name in &names {
                    let path = root.join(name);
                    if path.is_file() && !candidates.contains(&Candidate::File(path.clone())) {
                        candidates.push(Candidate::File(path));
                    }
                }
            }
        }

        if self.config.system_paths {
            candidates.extend(names.into_iter().map(Candidate::System));
        }

        tracing::debug!(
            platform = %self.platform,
            count = candidates.len(),
            "resolved native library candidates"
        );
        candidates
    }

    fn absolutize(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.working_dir.join(dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated(file_names: &[&str]) -> LibraryConfig {
        LibraryConfig {
            file_names: Some(file_names.iter().map(|n| n.to_string()).collect()),
            system_paths: false,
            ..LibraryConfig::default()
        }
    }

    #[test]
    fn platform_file_names_follow_conventions() {
        assert_eq!(TargetOs::Windows.library_file_names(), &["SDL3.dll"]);
        assert!(TargetOs::Linux
            .library_file_names()
            .iter()
            .all(|name| name.starts_with("libSDL3.so")));
        assert!(TargetOs::MacOs
            .library_file_names()
            .iter()
            .all(|name| name.ends_with(".dylib")));
    }

    #[test]
    fn foreign_platforms_resolve_their_own_file_names() {
        let work = tempfile::tempdir().unwrap();
        for name in ["SDL3.dll", "libSDL3.dylib", "libSDL3.so"] {
            std::fs::write(work.path().join(name), b"").unwrap();
        }
        let config = LibraryConfig {
            system_paths: false,
            ..LibraryConfig::default()
        };
        let resolver = LibraryResolver::with_working_dir(config, work.path());

        let windows = resolver.clone().for_platform(Platform {
            os: TargetOs::Windows,
            arch: "x86_64",
        });
        assert_eq!(windows.file_names(), vec!["SDL3.dll".to_string()]);
        assert_eq!(
            windows.candidates(),
            vec![Candidate::File(work.path().join("SDL3.dll"))]
        );

        let mac = resolver.for_platform(Platform {
            os: TargetOs::MacOs,
            arch: "aarch64",
        });
        assert_eq!(mac.platform().to_string(), "MacOs/aarch64");
        assert_eq!(
            mac.candidates(),
            vec![Candidate::File(work.path().join("libSDL3.dylib"))]
        );
    }

    #[test]
    fn working_directory_comes_first() {
        let work = tempfile::tempdir().unwrap();
        let extra = tempfile::tempdir().unwrap();
        std::fs::write(work.path().join("SDL3.dll"), b"").unwrap();
        std::fs::write(extra.path().join("SDL3.dll"), b"").unwrap();

        let mut config = isolated(&["SDL3.dll"]);
        config.search_dirs.push(extra.path().to_path_buf());
        let resolver = LibraryResolver::with_working_dir(config, work.path());

        assert_eq!(
            resolver.candidates(),
            vec![
                Candidate::File(work.path().join("SDL3.dll")),
                Candidate::File(extra.path().join("SDL3.dll")),
            ]
        );
    }

    #[test]
    fn build_subdirectories_are_probed_in_order() {
        let work = tempfile::tempdir().unwrap();
        for sub in ["Debug", "Release"] {
            std::fs::create_dir(work.path().join(sub)).unwrap();
            std::fs::write(work.path().join(sub).join("SDL3.dll"), b"").unwrap();
        }

        let resolver = LibraryResolver::with_working_dir(isolated(&["SDL3.dll"]), work.path());
        let candidates = resolver.candidates();

        assert_eq!(
            candidates,
            vec![
                Candidate::File(work.path().join("Release").join("SDL3.dll")),
                Candidate::File(work.path().join("Debug").join("SDL3.dll")),
            ]
        );
    }

    #[test]
    fn empty_directories_yield_no_candidates_without_system_paths() {
        let work = tempfile::tempdir().unwrap();
        let resolver = LibraryResolver::with_working_dir(isolated(&["libSDL3.so"]), work.path());
        assert!(resolver.candidates().is_empty());
    }

    #[test]
    fn system_loader_names_come_last() {
        let work = tempfile::tempdir().unwrap();
        std::fs::write(work.path().join("libSDL3.so"), b"").unwrap();
        let config = LibraryConfig {
            file_names: Some(vec!["libSDL3.so".to_string()]),
            search_dirs: Vec::new(),
            ..LibraryConfig::default()
        };
        let resolver = LibraryResolver::with_working_dir(config, work.path());

        let candidates = resolver.candidates();
        assert_eq!(
            candidates.first(),
            Some(&Candidate::File(work.path().join("libSDL3.so")))
        );
        assert_eq!(
            candidates.last(),
            Some(&Candidate::System("libSDL3.so".to_string()))
        );
    }

    #[test]
    fn relative_search_dirs_are_anchored_at_the_working_directory() {
        let work = tempfile::tempdir().unwrap();
        let mut config = isolated(&["SDL3.dll"]);
        config.search_dirs.push(PathBuf::from("native"));
        let resolver = LibraryResolver::with_working_dir(config, work.path());

        assert_eq!(
            resolver.search_dirs(),
            vec![work.path().to_path_buf(), work.path().join("native")]
        );
    }
}
