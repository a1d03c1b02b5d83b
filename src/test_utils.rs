//! Test utilities shared across test modules

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Config;
use crate::paths::Paths;
use crate::versions::Runtime;

/// Paths rooted at `<temp>/home`, with no working directory hint
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    let home = temp_dir.path().join("home");
    fs::create_dir_all(&home).unwrap();
    Paths::with_home(home)
}

/// A config living outside the default location, not yet initialized
pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        shell_rc: temp_dir.path().join(".zshrc"),
        working_dir: temp_dir.path().join("relocated"),
    }
}

/// Runtime with neutral names so tests do not look like real Python installs
pub fn test_runtime() -> Runtime {
    Runtime {
        name: "Runtime",
        binary: "runtime",
        package_manager: "pkgmgr",
    }
}

/// Create `<temp>/bin` holding empty files with the given names
pub fn fake_bin_dir(temp_dir: &TempDir, names: &[&str]) -> PathBuf {
    let bin = temp_dir.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    for name in names {
        fs::write(bin.join(name), "").unwrap();
    }
    bin
}
