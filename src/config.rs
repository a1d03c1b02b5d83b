//! Persistent brewpy settings.
//!
//! The config file lives at `<working_dir>/config.json` and records its own
//! working directory. Loading searches the preferred working directory first
//! and the default `~/.brewpy` second; a default-location file that points
//! somewhere else is migrated to that place.
//!
//! Reads never fail the caller: a missing or corrupt file is logged and the
//! defaults are used. Writes (`save`, `init`, `migrate`) propagate errors.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::paths::{Paths, config_file, shims_dir};

/// Shell startup files probed in order of preference
pub const SHELL_RC_CANDIDATES: &[&str] = &[".zshrc", ".bashrc", ".config/fish/config.fish"];

/// Settings stored in `<working_dir>/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Shell startup file that receives the init block
    pub shell_rc: PathBuf,

    /// Directory holding `config.json` and `shims/`
    #[serde(rename = "brewpy_dir")]
    pub working_dir: PathBuf,
}

impl Config {
    /// Default location with the detected shell rc file
    pub fn defaults(paths: &Paths) -> Self {
        Self {
            shell_rc: detect_shell_rc(&paths.home),
            working_dir: paths.default_dir.clone(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        config_file(&self.working_dir)
    }

    pub fn shims_dir(&self) -> PathBuf {
        shims_dir(&self.working_dir)
    }

    /// Resolve the active configuration, initializing storage on first run
    pub fn load(paths: &Paths) -> Self {
        let mut config = Self::defaults(paths);
        config.working_dir = paths.preferred_dir().to_path_buf();

        let (path, found) = find_config_file(paths, &config.working_dir);
        if !found {
            log::debug!("No config file found, initializing {:?}", config.working_dir);
            if let Err(e) = config.init() {
                log::warn!("Failed to initialize config: {e:#}");
            }
            return config;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read config file {path:?}, using defaults: {e}");
                return config;
            }
        };

        let loaded: Self = match serde_json::from_str(&content) {
            Ok(loaded) => loaded,
            Err(e) => {
                log::warn!("Failed to parse config file {path:?}, using defaults: {e}");
                return config;
            }
        };

        if path == config_file(&paths.default_dir) && !paths.is_default_dir(&loaded.working_dir) {
            log::debug!("Migrating config from {:?} to {:?}", path, loaded.working_dir);
            if let Err(e) = loaded.migrate(paths, &path) {
                log::warn!("Failed to migrate config: {e:#}");
            }
        }

        loaded
    }

    /// Move storage to `self.working_dir`, dropping the default-location file
    ///
    /// Safe to repeat: a second run rewrites the same file and finds nothing
    /// left to delete.
    pub fn migrate(&self, paths: &Paths, old_path: &Path) -> Result<()> {
        self.init()?;

        if old_path == config_file(&paths.default_dir) && !paths.is_default_dir(&self.working_dir) {
            match fs::remove_file(old_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove old config file: {:?}", old_path)
                    });
                }
            }
        }

        Ok(())
    }

    /// Create the working and shims directories, then save
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.working_dir).with_context(|| {
            format!("Failed to create brewpy directory: {:?}", self.working_dir)
        })?;

        let shims = self.shims_dir();
        fs::create_dir_all(&shims)
            .with_context(|| format!("Failed to create shims directory: {:?}", shims))?;

        self.save()
    }

    /// Write the config as pretty JSON through a temp file and rename
    pub fn save(&self) -> Result<()> {
        let path = self.config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .with_context(|| format!("Failed to write temp config file: {:?}", temp_path))?;

        fs::rename(&temp_path, &path).with_context(|| {
            format!("Failed to rename config file: {:?} -> {:?}", temp_path, path)
        })
    }
}

/// Look for `config.json` in `working_dir`, then in the default location
///
/// Returns the path that was found, or the `working_dir` candidate with
/// `false` when neither exists.
pub fn find_config_file(paths: &Paths, working_dir: &Path) -> (PathBuf, bool) {
    let candidate = config_file(working_dir);
    if candidate.exists() {
        return (candidate, true);
    }

    if !paths.is_default_dir(working_dir) {
        let default_candidate = config_file(&paths.default_dir);
        if default_candidate.exists() {
            return (default_candidate, true);
        }
    }

    (candidate, false)
}

/// First existing shell rc file under `home`, `.zshrc` when none exist
pub fn detect_shell_rc(home: &Path) -> PathBuf {
    SHELL_RC_CANDIDATES
        .iter()
        .map(|rc| home.join(rc))
        .find(|p| p.exists())
        .unwrap_or_else(|| home.join(SHELL_RC_CANDIDATES[0]))
}
