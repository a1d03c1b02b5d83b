use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a relocated working directory
pub const WORKING_DIR_ENV: &str = "BREWPY_DIR";

/// Name of the working directory under the home directory
const DEFAULT_DIR_NAME: &str = ".brewpy";

/// Host-level locations brewpy resolves once at startup
#[derive(Debug, Clone)]
pub struct Paths {
    /// The user's home directory
    pub home: PathBuf,
    /// ~/.brewpy
    pub default_dir: PathBuf,
    /// $BREWPY_DIR, searched before the default location
    pub working_dir_hint: Option<PathBuf>,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let mut paths = Self::with_home(base_dirs.home_dir());

        paths.working_dir_hint = std::env::var_os(WORKING_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(|v| paths.expand(&v.to_string_lossy()));

        Ok(paths)
    }

    /// Build paths rooted at an explicit home directory (no env lookup)
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let default_dir = home.join(DEFAULT_DIR_NAME);
        Self {
            home,
            default_dir,
            working_dir_hint: None,
        }
    }

    /// The working directory searched first when loading the config
    pub fn preferred_dir(&self) -> &Path {
        self.working_dir_hint.as_deref().unwrap_or(&self.default_dir)
    }

    /// Expand a leading `~/` against the home directory
    pub fn expand(&self, input: &str) -> PathBuf {
        match input.strip_prefix("~/") {
            Some(rest) => self.home.join(rest),
            None if input == "~" => self.home.clone(),
            None => PathBuf::from(input),
        }
    }

    pub fn is_default_dir(&self, dir: &Path) -> bool {
        dir == self.default_dir
    }
}

/// `<working_dir>/config.json`
pub fn config_file(working_dir: &Path) -> PathBuf {
    working_dir.join("config.json")
}

/// `<working_dir>/shims`
pub fn shims_dir(working_dir: &Path) -> PathBuf {
    working_dir.join("shims")
}
