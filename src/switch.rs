//! Shim switching.
//!
//! A switch rewrites the four shims under `<working_dir>/shims`
//! (`python`, `python3`, `pip`, `pip3`) so they point at the chosen
//! version's binaries. Shims replaced before a failed link are left in
//! place: a failed switch can leave a mix of old and new targets.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::lock::WorkdirLock;
use crate::versions::{Runtime, VersionMatcher};

/// One link of the shim set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shim {
    pub name: String,
    pub link: PathBuf,
    pub target: PathBuf,
}

/// The four shims for `suffix` (`<major>.<minor>`)
pub fn shim_set(runtime: Runtime, suffix: &str, shims_dir: &Path, bin_dir: &Path) -> Vec<Shim> {
    let runtime_target = bin_dir.join(format!("{}{}", runtime.binary, suffix));
    let manager_target = bin_dir.join(format!("{}{}", runtime.package_manager, suffix));

    [
        (runtime.binary.to_string(), &runtime_target),
        (format!("{}3", runtime.binary), &runtime_target),
        (runtime.package_manager.to_string(), &manager_target),
        (format!("{}3", runtime.package_manager), &manager_target),
    ]
    .into_iter()
    .map(|(name, target)| Shim {
        link: shims_dir.join(&name),
        target: target.clone(),
        name,
    })
    .collect()
}

/// Point every shim at `version`'s binaries in `bin_dir`
///
/// The caller is expected to pass an identifier returned by
/// [`crate::versions::scan`]; target binaries are not checked here.
pub fn switch_version(
    runtime: Runtime,
    version: &str,
    config: &Config,
    bin_dir: &Path,
) -> Result<Vec<Shim>> {
    let Some(suffix) = runtime.suffix(version) else {
        bail!(
            "Invalid version identifier '{}'\nHint: Expected something like {}",
            version,
            runtime.identifier("3.12")
        );
    };

    let _lock = WorkdirLock::acquire(&config.working_dir)?;

    let shims_dir = config.shims_dir();
    fs::create_dir_all(&shims_dir)
        .with_context(|| format!("Failed to create shims directory: {:?}", shims_dir))?;

    let shims = shim_set(runtime, suffix, &shims_dir, bin_dir);
    for shim in &shims {
        remove_existing(&shim.link)?;
        make_symlink(&shim.target, &shim.link)?;
        log::debug!("Linked {:?} -> {:?}", shim.link, shim.target);
    }

    Ok(shims)
}

/// Version the primary shim currently points at, if any
pub fn current_version(runtime: Runtime, config: &Config) -> Option<String> {
    let link = config.shims_dir().join(runtime.binary);
    let target = match ShimStatus::detect(&link) {
        ShimStatus::Symlink { target } | ShimStatus::BrokenSymlink { target } => target,
        ShimStatus::Missing | ShimStatus::NotSymlink => return None,
    };

    let base = target.file_name()?.to_str()?;
    VersionMatcher::new(runtime).ok()?.parse_target(base)
}

/// What sits at a shim path
#[derive(Debug, PartialEq, Eq)]
pub enum ShimStatus {
    Missing,
    NotSymlink,
    Symlink { target: PathBuf },
    BrokenSymlink { target: PathBuf },
}

impl ShimStatus {
    pub fn detect(path: &Path) -> Self {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => match fs::read_link(path) {
                // exists() follows the link
                Ok(target) if path.exists() => Self::Symlink { target },
                Ok(target) => Self::BrokenSymlink { target },
                Err(_) => Self::BrokenSymlink {
                    target: PathBuf::from("?"),
                },
            },
            Ok(_) => Self::NotSymlink,
            Err(_) => Self::Missing,
        }
    }
}

fn remove_existing(link: &Path) -> Result<()> {
    match fs::remove_file(link) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove existing shim: {:?}", link)),
    }
}

fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link).with_context(|| {
        format!(
            "Failed to create symlink {} -> {}",
            link.display(),
            target.display()
        )
    })?;

    #[cfg(windows)]
    std::os::windows::fs::symlink_file(target, link).with_context(|| {
        format!(
            "Failed to create symlink {} -> {}",
            link.display(),
            target.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fake_bin_dir, test_config, test_runtime};
    use tempfile::TempDir;

    #[test]
    fn test_shim_set_names_and_targets() {
        let shims = shim_set(
            Runtime::PYTHON,
            "3.11",
            Path::new("/w/shims"),
            Path::new("/opt/homebrew/bin"),
        );

        let pairs: Vec<(&str, &Path)> = shims
            .iter()
            .map(|s| (s.name.as_str(), s.target.as_path()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("python", Path::new("/opt/homebrew/bin/python3.11")),
                ("python3", Path::new("/opt/homebrew/bin/python3.11")),
                ("pip", Path::new("/opt/homebrew/bin/pip3.11")),
                ("pip3", Path::new("/opt/homebrew/bin/pip3.11")),
            ]
        );
        assert_eq!(shims[0].link, PathBuf::from("/w/shims/python"));
    }

    #[test]
    fn test_switch_creates_links() {
        let temp_dir = TempDir::new().unwrap();
        let bin = fake_bin_dir(&temp_dir, &["runtime3.11", "pkgmgr3.11"]);
        let config = test_config(&temp_dir);

        switch_version(test_runtime(), "Runtime3.11", &config, &bin).unwrap();

        let shims = config.shims_dir();
        assert_eq!(fs::read_link(shims.join("runtime")).unwrap(), bin.join("runtime3.11"));
        assert_eq!(fs::read_link(shims.join("runtime3")).unwrap(), bin.join("runtime3.11"));
        assert_eq!(fs::read_link(shims.join("pkgmgr")).unwrap(), bin.join("pkgmgr3.11"));
        assert_eq!(fs::read_link(shims.join("pkgmgr3")).unwrap(), bin.join("pkgmgr3.11"));
        assert_eq!(fs::read_dir(&shims).unwrap().count(), 4);
    }

    #[test]
    fn test_switch_replaces_previous_version() {
        let temp_dir = TempDir::new().unwrap();
        let bin = fake_bin_dir(&temp_dir, &["runtime3.11", "runtime3.12"]);
        let config = test_config(&temp_dir);

        switch_version(test_runtime(), "Runtime3.11", &config, &bin).unwrap();
        switch_version(test_runtime(), "Runtime3.12", &config, &bin).unwrap();

        assert_eq!(
            fs::read_link(config.shims_dir().join("runtime3")).unwrap(),
            bin.join("runtime3.12")
        );
        assert_eq!(
            current_version(test_runtime(), &config),
            Some("Runtime3.12".to_string())
        );
    }

    #[test]
    fn test_switch_replaces_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let bin = fake_bin_dir(&temp_dir, &["runtime3.11"]);
        let config = test_config(&temp_dir);
        fs::create_dir_all(config.shims_dir()).unwrap();
        fs::write(config.shims_dir().join("runtime"), "stale").unwrap();

        switch_version(test_runtime(), "Runtime3.11", &config, &bin).unwrap();
        assert!(matches!(
            ShimStatus::detect(&config.shims_dir().join("runtime")),
            ShimStatus::Symlink { .. }
        ));
    }

    #[test]
    fn test_switch_creates_missing_shims_dir() {
        let temp_dir = TempDir::new().unwrap();
        let bin = fake_bin_dir(&temp_dir, &["runtime3.11"]);
        let config = test_config(&temp_dir);
        assert!(!config.shims_dir().exists());

        switch_version(test_runtime(), "Runtime3.11", &config, &bin).unwrap();
        assert!(config.shims_dir().is_dir());
    }

    #[test]
    fn test_switch_rejects_foreign_identifier() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let err = switch_version(test_runtime(), "Ruby3.3", &config, temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid version identifier"));
        assert!(!config.shims_dir().exists());
    }

    #[test]
    fn test_switch_reports_failing_shim() {
        let temp_dir = TempDir::new().unwrap();
        let bin = fake_bin_dir(&temp_dir, &["runtime3.11"]);
        let config = test_config(&temp_dir);
        // A non-empty directory where a shim should go cannot be replaced
        let blocker = config.shims_dir().join("pkgmgr");
        fs::create_dir_all(blocker.join("inner")).unwrap();

        let err = switch_version(test_runtime(), "Runtime3.11", &config, &bin).unwrap_err();
        assert!(format!("{err:#}").contains("pkgmgr"));

        // Shims handled before the failure keep their new targets
        assert_eq!(
            fs::read_link(config.shims_dir().join("runtime")).unwrap(),
            bin.join("runtime3.11")
        );
    }

    #[test]
    fn test_current_version_none_without_shim() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        assert_eq!(current_version(test_runtime(), &config), None);
    }

    #[test]
    fn test_current_version_reads_link_target() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::create_dir_all(config.shims_dir()).unwrap();
        // Broken links still report the version they point at
        make_symlink(
            Path::new("/nonexistent/bin/runtime3.12"),
            &config.shims_dir().join("runtime"),
        )
        .unwrap();

        assert_eq!(
            current_version(test_runtime(), &config),
            Some("Runtime3.12".to_string())
        );
    }

    #[test]
    fn test_current_version_ignores_unversioned_target() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::create_dir_all(config.shims_dir()).unwrap();
        make_symlink(Path::new("/usr/bin/runtime"), &config.shims_dir().join("runtime")).unwrap();

        assert_eq!(current_version(test_runtime(), &config), None);
    }

    #[test]
    fn test_shim_status_detect() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        assert_eq!(ShimStatus::detect(&dir.join("missing")), ShimStatus::Missing);

        fs::write(dir.join("file"), "").unwrap();
        assert_eq!(ShimStatus::detect(&dir.join("file")), ShimStatus::NotSymlink);

        make_symlink(&dir.join("file"), &dir.join("good")).unwrap();
        assert_eq!(
            ShimStatus::detect(&dir.join("good")),
            ShimStatus::Symlink {
                target: dir.join("file")
            }
        );

        make_symlink(&dir.join("gone"), &dir.join("broken")).unwrap();
        assert_eq!(
            ShimStatus::detect(&dir.join("broken")),
            ShimStatus::BrokenSymlink {
                target: dir.join("gone")
            }
        );
    }
}
