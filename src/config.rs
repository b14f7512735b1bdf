//! Configuration loading.
//!
//! `Settings::load` tries an optional TOML file first (`JUKEFS_CONFIG_PATH`
//! or `$XDG_CONFIG_HOME/jukefs/config.toml`), then environment variables with
//! prefix `JUKEFS__`, and falls back to struct defaults. Positional CLI
//! arguments override the mount and source directories in `main`.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::track::Category;

/// The three fixed virtual directory names at the root of the mount.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CategoryDirs {
    pub year: String,
    pub album: String,
    pub artist: String,
}

impl Default for CategoryDirs {
    fn default() -> Self {
        Self {
            year: "Por_Ano".to_string(),
            album: "Por_Album".to_string(),
            artist: "Por_Artista".to_string(),
        }
    }
}

impl CategoryDirs {
    pub fn name(&self, category: Category) -> &str {
        match category {
            Category::Year => &self.year,
            Category::Album => &self.album,
            Category::Artist => &self.artist,
        }
    }

    /// Map a path segment to its category, or None for an unknown name.
    pub fn category_of(&self, segment: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|&c| self.name(c) == segment)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Real directory holding the audio files.
    pub source_dir: PathBuf,
    /// Where the virtual hierarchy is mounted.
    pub mount_dir: PathBuf,
    /// Names of the three category directories.
    pub dirs: CategoryDirs,
    /// Grace period between discovery and extraction, so the producing
    /// process has time to finish writing and close the file.
    pub settle_delay_ms: u64,
    /// File extensions treated as audio.
    pub extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("real"),
            mount_dir: PathBuf::from("virtual"),
            dirs: CategoryDirs::default(),
            settle_delay_ms: 200,
            extensions: ["mp3", "flac", "ogg", "m4a", "wav", "opus", "aac"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// Load settings from the optional config file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = resolve_config_path() {
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("JUKEFS")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Basic sanity checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.dirs.year == self.dirs.album
            || self.dirs.year == self.dirs.artist
            || self.dirs.album == self.dirs.artist
        {
            return Err("category directory names must be distinct".to_string());
        }
        if self.extensions.is_empty() {
            return Err("at least one audio extension is required".to_string());
        }
        Ok(())
    }

    /// Is this path one we would shelve? Hidden files never qualify.
    pub fn is_audio_file(&self, path: &std::path::Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(true);
        if hidden {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| {
                    e.trim().trim_start_matches('.').to_ascii_lowercase() == ext
                })
            })
            .unwrap_or(false)
    }
}

/// Resolve the config path from `JUKEFS_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("JUKEFS_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };
    config_home.map(|d| d.join("jukefs").join("config.toml"))
}
