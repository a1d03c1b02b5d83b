//! Version discovery.
//!
//! Installed runtimes are recognised purely by file name: `python3.11` in the
//! binary directory yields the identifier `Python3.11`. Identifiers are kept
//! in plain string order, so `Python3.11` sorts before `Python3.9`.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::{self, Arch};

/// Naming scheme of a runtime and its package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Runtime {
    /// Prefix of version identifiers, e.g. `Python`
    pub name: &'static str,
    /// Binary base name, e.g. `python`
    pub binary: &'static str,
    /// Package manager base name, e.g. `pip`
    pub package_manager: &'static str,
}

impl Runtime {
    pub const PYTHON: Runtime = Runtime {
        name: "Python",
        binary: "python",
        package_manager: "pip",
    };

    /// Canonical identifier for a bare `<major>.<minor>` suffix
    pub fn identifier(&self, suffix: &str) -> String {
        format!("{}{}", self.name, suffix)
    }

    /// Strip the runtime name from an identifier, leaving `<major>.<minor>`
    pub fn suffix<'a>(&self, version: &'a str) -> Option<&'a str> {
        version
            .strip_prefix(self.name)
            .filter(|s| !s.is_empty())
    }
}

/// A runtime together with the directory its versioned binaries live in
#[derive(Debug, Clone)]
pub struct Installation {
    pub runtime: Runtime,
    pub bin_dir: PathBuf,
}

impl Installation {
    /// Python from the Homebrew prefix of the host architecture
    pub fn detect() -> Self {
        Self {
            runtime: Runtime::PYTHON,
            bin_dir: platform::bin_dir(Arch::current()),
        }
    }

    pub fn scan(&self) -> Result<Vec<String>> {
        scan(self.runtime, &self.bin_dir)
    }
}

/// File name matcher for one runtime's versioned binaries
#[derive(Debug, Clone)]
pub struct VersionMatcher {
    runtime: Runtime,
    exact: Regex,
    embedded: Regex,
}

impl VersionMatcher {
    pub fn new(runtime: Runtime) -> Result<Self> {
        let binary = regex::escape(runtime.binary);
        let exact = Regex::new(&format!(r"^{binary}(\d+\.\d+)$"))
            .with_context(|| format!("Invalid version pattern for {}", runtime.binary))?;
        let embedded = Regex::new(&format!(r"{binary}(\d+\.\d+)"))
            .with_context(|| format!("Invalid version pattern for {}", runtime.binary))?;
        Ok(Self {
            runtime,
            exact,
            embedded,
        })
    }

    /// Identifier for a directory entry named exactly `<binary><major>.<minor>`
    pub fn parse_entry(&self, file_name: &str) -> Option<String> {
        self.exact
            .captures(file_name)
            .map(|caps| self.runtime.identifier(&caps[1]))
    }

    /// Identifier for a link target's base name, allowing surrounding text
    pub fn parse_target(&self, base_name: &str) -> Option<String> {
        self.embedded
            .captures(base_name)
            .map(|caps| self.runtime.identifier(&caps[1]))
    }
}

/// List the installed versions found in `bin_dir`
///
/// An unreadable directory is an error; a readable one without matches
/// yields an empty list.
pub fn scan(runtime: Runtime, bin_dir: &Path) -> Result<Vec<String>> {
    let matcher = VersionMatcher::new(runtime)?;

    let entries = fs::read_dir(bin_dir)
        .with_context(|| format!("Failed to read binary directory: {:?}", bin_dir))?;

    let mut versions = BTreeSet::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read entry in binary directory: {:?}", bin_dir))?;
        let name = entry.file_name();
        if let Some(version) = name.to_str().and_then(|n| matcher.parse_entry(n)) {
            versions.insert(version);
        }
    }

    log::debug!("Found {} {} version(s) in {:?}", versions.len(), runtime.name, bin_dir);
    Ok(versions.into_iter().collect())
}
