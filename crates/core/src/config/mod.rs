use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the binding layer and demo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    pub library: LibraryConfig,
    pub window: WindowConfig,
    pub demo: DemoConfig,
}

impl BindingConfig {
    /// Reads a JSON configuration file. Missing sections fall back to their
    /// defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Where and how the native SDL3 library is looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directories searched after the working directory.
    pub search_dirs: Vec<PathBuf>,
    /// Subdirectories probed below every search directory. Windows builds
    /// place `SDL3.dll` under the build configuration name.
    pub build_subdirs: Vec<String>,
    /// Overrides the platform's default library file names.
    pub file_names: Option<Vec<String>>,
    /// Whether system library directories and the system loader are
    /// consulted once the explicit directories are exhausted.
    pub system_paths: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            build_subdirs: vec!["Release".to_string(), "Debug".to_string()],
            file_names: None,
            system_paths: true,
        }
    }
}

/// Configuration of the demo window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "sdl3 binding demo".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
        }
    }
}

/// Parameters of the drifting points scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub num_points: usize,
    pub min_pixels_per_sec: f32,
    pub max_pixels_per_sec: f32,
    pub rect_half_size: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            num_points: 500,
            min_pixels_per_sec: 30.0,
            max_pixels_per_sec: 120.0,
            rect_half_size: 3.0,
        }
    }
}
