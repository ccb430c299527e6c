//! Persisted user preferences.
//!
//! A small JSON file supplies configuration values to the conversion
//! core: the destination subfolder, the output filename prefix, and the
//! worker-pool bound. Preferences carry values only, never control flow;
//! a missing or unparseable file silently falls back to defaults.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::BatchOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Subfolder created under the chosen destination directory.
    #[serde(default = "default_dest_subfolder")]
    pub dest_subfolder: String,

    /// Output files are named `<output_prefix>_<original-filename>`.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Worker-pool bound for batch conversion.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dest_subfolder: default_dest_subfolder(),
            output_prefix: default_output_prefix(),
            workers: default_workers(),
        }
    }
}

fn default_dest_subfolder() -> String {
    "Generados".into()
}
fn default_output_prefix() -> String {
    "b".into()
}
fn default_workers() -> usize {
    4
}

impl Settings {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.workers,
            output_prefix: self.output_prefix.clone(),
        }
    }
}

/// Load settings from `path`, falling back to defaults when the file is
/// missing or unparseable.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "ignoring unparseable settings");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Persist settings as pretty-printed JSON.
pub fn save_settings(path: &Path, settings: &Settings) -> io::Result<()> {
    let raw = serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
    fs::write(path, raw)
}
