//! Shell profile integration.
//!
//! brewpy owns one marker-delimited block in the user's shell rc file:
//!
//! ```text
//! # >>> brewpy init >>>
//! eval "$(brewpy init)"
//! # <<< brewpy init <<<
//! ```
//!
//! Rewriting the profile removes every complete block and appends a fresh
//! one at the end. Unbalanced markers are reported instead of guessed at, so
//! a damaged file is never patched into holding two blocks.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::ErrorKind;

use crate::config::Config;
use crate::lock::WorkdirLock;
use crate::paths::{Paths, WORKING_DIR_ENV};

pub const START_MARKER: &str = "# >>> brewpy init >>>";
pub const END_MARKER: &str = "# <<< brewpy init <<<";
pub const INIT_DIRECTIVE: &str = r#"eval "$(brewpy init)""#;

/// The line `brewpy init` prints for the shell to `eval`
pub fn emit_path_export(config: &Config) -> String {
    format!("export PATH=\"{}:$PATH\"", config.shims_dir().display())
}

/// Lines of the init block, markers included
///
/// A relocated working directory is exported first so that the `eval`
/// line's `brewpy init` finds its config.
pub fn init_block(config: &Config, paths: &Paths) -> Vec<String> {
    let mut block = vec![START_MARKER.to_string()];
    if !paths.is_default_dir(&config.working_dir) {
        block.push(format!(
            "export {}=\"{}\"",
            WORKING_DIR_ENV,
            config.working_dir.display()
        ));
    }
    block.push(INIT_DIRECTIVE.to_string());
    block.push(END_MARKER.to_string());
    block
}

/// Make sure the shell rc file ends with exactly one up to date init block
pub fn ensure_init_block(config: &Config, paths: &Paths) -> Result<()> {
    let _lock = WorkdirLock::acquire(&config.working_dir)?;
    let rc = &config.shell_rc;

    let content = match fs::read_to_string(rc) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read shell profile: {:?}", rc)),
    };

    let updated = rewrite_profile(&content, &init_block(config, paths))
        .with_context(|| format!("Refusing to edit shell profile: {:?}", rc))?;

    if updated == content {
        log::debug!("Shell profile {:?} already up to date", rc);
        return Ok(());
    }

    if let Some(parent) = rc.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory for shell profile: {:?}", parent))?;
    }

    fs::write(rc, updated).with_context(|| format!("Failed to write shell profile: {:?}", rc))
}

/// Remove existing init blocks from `content` and append `block`
pub fn rewrite_profile(content: &str, block: &[String]) -> Result<String> {
    let mut kept: Vec<&str> = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;
        match line.trim() {
            START_MARKER => {
                if let Some(start) = open {
                    bail!(
                        "brewpy start marker on line {} is not closed before line {}\nHint: Remove the broken brewpy block by hand and retry.",
                        start,
                        lineno
                    );
                }
                open = Some(lineno);
            }
            END_MARKER => {
                if open.take().is_none() {
                    bail!(
                        "brewpy end marker on line {} has no start marker\nHint: Remove the broken brewpy block by hand and retry.",
                        lineno
                    );
                }
            }
            _ if open.is_none() => kept.push(line),
            _ => {}
        }
    }

    if let Some(start) = open {
        bail!(
            "brewpy start marker on line {} has no end marker\nHint: Remove the broken brewpy block by hand and retry.",
            start
        );
    }

    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    let mut lines: Vec<&str> = kept;
    if !lines.is_empty() {
        lines.push("");
    }
    lines.extend(block.iter().map(String::as_str));

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{setup_test_paths, test_config};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn block() -> Vec<String> {
        vec![
            START_MARKER.to_string(),
            INIT_DIRECTIVE.to_string(),
            END_MARKER.to_string(),
        ]
    }

    fn count_blocks(content: &str) -> usize {
        content.lines().filter(|l| *l == START_MARKER).count()
    }

    #[test]
    fn test_emit_path_export() {
        let config = Config {
            shell_rc: PathBuf::from("/home/a/.zshrc"),
            working_dir: PathBuf::from("/home/a/.brewpy"),
        };
        assert_eq!(
            emit_path_export(&config),
            r#"export PATH="/home/a/.brewpy/shims:$PATH""#
        );
    }

    #[test]
    fn test_rewrite_empty_profile() {
        let out = rewrite_profile("", &block()).unwrap();
        assert_eq!(
            out,
            format!("{START_MARKER}\n{INIT_DIRECTIVE}\n{END_MARKER}\n")
        );
    }

    #[test]
    fn test_rewrite_appends_after_existing_content() {
        let out = rewrite_profile("alias ll='ls -l'\n", &block()).unwrap();
        assert_eq!(
            out,
            format!("alias ll='ls -l'\n\n{START_MARKER}\n{INIT_DIRECTIVE}\n{END_MARKER}\n")
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_profile("export A=1\n", &block()).unwrap();
        let twice = rewrite_profile(&once, &block()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(count_blocks(&twice), 1);
    }

    #[test]
    fn test_rewrite_moves_block_to_end() {
        let content = format!("a\n{START_MARKER}\nold line\n{END_MARKER}\nb\n");
        let out = rewrite_profile(&content, &block()).unwrap();
        assert_eq!(
            out,
            format!("a\nb\n\n{START_MARKER}\n{INIT_DIRECTIVE}\n{END_MARKER}\n")
        );
        assert!(!out.contains("old line"));
    }

    #[test]
    fn test_rewrite_collapses_duplicate_blocks() {
        let stale = format!("{START_MARKER}\n{INIT_DIRECTIVE}\n{END_MARKER}\n");
        let content = format!("x\n{stale}\n{stale}");
        let out = rewrite_profile(&content, &block()).unwrap();
        assert_eq!(count_blocks(&out), 1);
    }

    #[test]
    fn test_rewrite_rejects_lone_start_marker() {
        let content = format!("a\n{START_MARKER}\n{INIT_DIRECTIVE}\n");
        let err = rewrite_profile(&content, &block()).unwrap_err();
        assert!(err.to_string().contains("line 2 has no end marker"));
    }

    #[test]
    fn test_rewrite_rejects_lone_end_marker() {
        let content = format!("{END_MARKER}\n");
        let err = rewrite_profile(&content, &block()).unwrap_err();
        assert!(err.to_string().contains("line 1 has no start marker"));
    }

    #[test]
    fn test_rewrite_rejects_swapped_markers() {
        let content = format!("{END_MARKER}\n{INIT_DIRECTIVE}\n{START_MARKER}\n");
        assert!(rewrite_profile(&content, &block()).is_err());
    }

    #[test]
    fn test_init_block_default_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let config = Config::defaults(&paths);
        assert_eq!(init_block(&config, &paths), block());
    }

    #[test]
    fn test_init_block_relocated_dir_exports_hint() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let config = test_config(&temp_dir);

        let lines = init_block(&config, &paths);
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            format!("export BREWPY_DIR=\"{}\"", config.working_dir.display())
        );
        assert_eq!(lines.iter().filter(|l| l.starts_with("eval ")).count(), 1);
    }

    #[test]
    fn test_ensure_init_block_twice() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let config = test_config(&temp_dir);
        fs::write(&config.shell_rc, "export EDITOR=vim\n").unwrap();

        ensure_init_block(&config, &paths).unwrap();
        let first = fs::read_to_string(&config.shell_rc).unwrap();
        ensure_init_block(&config, &paths).unwrap();
        let second = fs::read_to_string(&config.shell_rc).unwrap();

        assert_eq!(first, second);
        assert_eq!(count_blocks(&second), 1);
        assert!(second.starts_with("export EDITOR=vim\n"));
    }

    #[test]
    fn test_ensure_init_block_creates_missing_profile() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut config = test_config(&temp_dir);
        config.shell_rc = temp_dir.path().join(".config/fish/config.fish");

        ensure_init_block(&config, &paths).unwrap();
        let content = fs::read_to_string(&config.shell_rc).unwrap();
        assert_eq!(count_blocks(&content), 1);
    }

    #[test]
    fn test_ensure_init_block_leaves_malformed_profile_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let config = test_config(&temp_dir);
        let original = format!("a\n{START_MARKER}\n{INIT_DIRECTIVE}\n");
        fs::write(&config.shell_rc, &original).unwrap();

        assert!(ensure_init_block(&config, &paths).is_err());
        assert_eq!(fs::read_to_string(&config.shell_rc).unwrap(), original);
    }
}
