//! Host architecture and the Homebrew binary directory it implies.

use std::path::PathBuf;

/// CPU architecture families that decide where Homebrew installs binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Aarch64,
    X86_64,
    Other,
}

impl Arch {
    /// Architecture of the running binary
    pub fn current() -> Self {
        Self::from_name(std::env::consts::ARCH)
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "aarch64" | "arm64" => Self::Aarch64,
            "x86_64" | "amd64" => Self::X86_64,
            _ => Self::Other,
        }
    }
}

/// Directory holding the versioned runtime binaries for `arch`
pub fn bin_dir(arch: Arch) -> PathBuf {
    match arch {
        Arch::Aarch64 => PathBuf::from("/opt/homebrew/bin"),
        Arch::X86_64 | Arch::Other => PathBuf::from("/usr/local/bin"),
    }
}
