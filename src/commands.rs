//! Handlers for each CLI command (`versions`, `use`, `init`, ...).
//!
//! This is the only layer that prompts or prints. It loads the [`Config`]
//! once per command and hands it to the switching and shell modules.

use anstyle::AnsiColor;
use anyhow::{Context, Result, bail};
use inquire::validator::Validation;
use inquire::{Confirm, Select, Text};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::paths::{Paths, WORKING_DIR_ENV};
use crate::shell::{START_MARKER, emit_path_export, ensure_init_block};
use crate::switch::{ShimStatus, current_version, switch_version};
use crate::ui::Ui;
use crate::versions::Installation;

/// Shell rc files offered by `configure`, relative to home
const SHELL_RC_CHOICES: &[&str] = &[
    ".zshrc",
    ".bashrc",
    ".bash_profile",
    ".profile",
    ".dashrc",
    ".config/fish/config.fish",
];

/// List installed versions, marking the active one
pub fn versions(paths: &Paths, install: &Installation, ui: &Ui) -> Result<()> {
    let versions = install
        .scan()
        .with_context(|| format!("Error finding {} versions", install.runtime.name))?;

    ui.section(format!("Available {} Versions", install.runtime.name));

    if versions.is_empty() {
        ui.warn(format!(
            "No {} versions found in {}. Install {} via Homebrew first.",
            install.runtime.name,
            install.bin_dir.display(),
            install.runtime.name
        ));
        return Ok(());
    }

    let config = Config::load(paths);
    let current = current_version(install.runtime, &config);

    for row in version_rows(ui, &versions, current.as_deref()) {
        ui.println(row);
    }

    Ok(())
}

/// One line per version, with the active one marked and highlighted
fn version_rows(ui: &Ui, versions: &[String], current: Option<&str>) -> Vec<String> {
    versions
        .iter()
        .map(|version| {
            let active = current == Some(version.as_str());
            let label = if active {
                ui.colored(version, AnsiColor::Green)
            } else {
                version.clone()
            };
            format!("  {} {}", ui.version_marker(active), label)
        })
        .collect()
}

/// Switch the shims to `version`, prompting when none is given
pub fn use_version(
    paths: &Paths,
    install: &Installation,
    version: Option<String>,
    ui: &Ui,
) -> Result<()> {
    let versions = install
        .scan()
        .with_context(|| format!("Error finding {} versions", install.runtime.name))?;

    if versions.is_empty() {
        bail!(
            "No {} versions found in {}.\nHint: Install {} via Homebrew first.",
            install.runtime.name,
            install.bin_dir.display(),
            install.runtime.name
        );
    }

    let config = Config::load(paths);

    let version = match version {
        Some(v) => v,
        None => prompt_version(install, &versions, &config)?,
    };

    if !versions.contains(&version) {
        bail!(
            "Version not found: {}\nHint: Use 'brewpy versions' to see installed versions.",
            version
        );
    }

    let spinner = ui.spinner(format!("Switching to {}...", version));
    let switched = switch_version(install.runtime, &version, &config, &install.bin_dir)
        .context("Error creating symlinks")
        .and_then(|_| ensure_init_block(&config, paths).context("Error updating shell profile"));

    match switched {
        Ok(()) => {
            ui.spinner_finish_ok(&spinner, format!("Successfully switched to {}", version));
            ui.note(format!(
                "Restart your terminal or run 'source {}' to apply changes.",
                config.shell_rc.display()
            ));
            Ok(())
        }
        // main reports the error chain
        Err(e) => {
            spinner.finish_and_clear();
            Err(e.context(format!("Failed to switch to {}", version)))
        }
    }
}

fn prompt_version(install: &Installation, versions: &[String], config: &Config) -> Result<String> {
    let cursor = current_version(install.runtime, config)
        .and_then(|c| versions.iter().position(|v| *v == c))
        .unwrap_or(0);

    Select::new(
        &format!("Select {} version", install.runtime.name),
        versions.to_vec(),
    )
    .with_page_size(10)
    .with_starting_cursor(cursor)
    .prompt()
    .context("Version selection cancelled")
}

/// Print the PATH export line for `eval "$(brewpy init)"`
pub fn init(paths: &Paths, ui: &Ui) -> Result<()> {
    let config = Config::load(paths);
    ui.println(emit_path_export(&config));
    Ok(())
}

/// Show the version the shims currently point at
pub fn current(paths: &Paths, install: &Installation, ui: &Ui) -> Result<()> {
    let config = Config::load(paths);

    match current_version(install.runtime, &config) {
        Some(version) => ui.ok(format!("Current {} version: {}", install.runtime.name, version)),
        None => ui.warn(format!(
            "No {} version currently managed by brewpy (none)",
            install.runtime.name
        )),
    }

    Ok(())
}

/// Display the stored settings and whether their targets exist
pub fn config_show(paths: &Paths, install: &Installation, ui: &Ui) -> Result<()> {
    let config = Config::load(paths);

    ui.section("brewpy Configuration");
    ui.newline();
    ui.println(settings_table(ui, &config).to_string());
    ui.newline();

    ui.section("Status");
    let check = |exists: bool, what: &str| {
        if exists {
            ui.println(format!("  {} {} exists", ui.icon_ok(), what));
        } else {
            ui.println(format!("  {} {} does not exist", ui.icon_warn(), what));
        }
    };
    check(config.working_dir.is_dir(), "brewpy directory");
    check(config.shims_dir().is_dir(), "Shims directory");
    check(config.shell_rc.exists(), "Shell RC file");

    if profile_has_block(&config.shell_rc) {
        ui.println(format!("  {} Shell RC file loads brewpy", ui.icon_ok()));
    } else {
        ui.println(format!(
            "  {} Shell RC file does not load brewpy yet (run 'brewpy use')",
            ui.icon_warn()
        ));
    }

    let shim = config.shims_dir().join(install.runtime.binary);
    match ShimStatus::detect(&shim) {
        ShimStatus::Symlink { target } => {
            ui.println(format!("  {} Active shim -> {}", ui.icon_ok(), target.display()));
        }
        ShimStatus::BrokenSymlink { target } => ui.println(format!(
            "  {} Active shim is broken -> {}",
            ui.icon_warn(),
            target.display()
        )),
        ShimStatus::NotSymlink => ui.println(format!(
            "  {} {} is not a symlink",
            ui.icon_warn(),
            shim.display()
        )),
        ShimStatus::Missing => {
            ui.println(format!("  {} No version selected", ui.icon_warn()));
        }
    }

    Ok(())
}

fn settings_table(ui: &Ui, config: &Config) -> comfy_table::Table {
    let mut table = ui.simple_table();
    table.add_row(vec![
        ui.cell("Configuration file:"),
        ui.colored_cell(config.config_path().display().to_string(), AnsiColor::Cyan),
    ]);
    table.add_row(vec![
        ui.cell("brewpy directory:"),
        ui.cell(config.working_dir.display().to_string()),
    ]);
    table.add_row(vec![
        ui.cell("Shims directory:"),
        ui.cell(config.shims_dir().display().to_string()),
    ]);
    table.add_row(vec![
        ui.cell("Shell RC file:"),
        ui.cell(config.shell_rc.display().to_string()),
    ]);
    table
}

fn profile_has_block(rc: &Path) -> bool {
    fs::read_to_string(rc)
        .map(|content| content.lines().any(|l| l.trim() == START_MARKER))
        .unwrap_or(false)
}

// -----------------------------------------------------------------------------
// configure
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigChoice {
    WorkingDir,
    ShellRc,
    All,
    Reset,
    Cancel,
}

impl ConfigChoice {
    const ALL: [ConfigChoice; 5] = [
        Self::WorkingDir,
        Self::ShellRc,
        Self::All,
        Self::Reset,
        Self::Cancel,
    ];
}

impl fmt::Display for ConfigChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WorkingDir => "brewpy directory (where config and shims are stored)",
            Self::ShellRc => "Shell RC file (where 'brewpy init' will be added)",
            Self::All => "Configure all settings",
            Self::Reset => "Reset to defaults",
            Self::Cancel => "Cancel",
        })
    }
}

/// An entry of the shell rc picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRcOption {
    Keep(PathBuf),
    Custom,
    Candidate {
        name: &'static str,
        path: PathBuf,
        exists: bool,
    },
}

impl fmt::Display for ShellRcOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep(path) => {
                let name = path.file_name().map(|n| n.to_string_lossy());
                write!(f, "Keep current ({})", name.as_deref().unwrap_or("?"))
            }
            Self::Custom => f.write_str("Enter custom path..."),
            Self::Candidate { name, exists, .. } => {
                let status = if *exists { "exists" } else { "not found" };
                write!(f, "{} ({})", name, status)
            }
        }
    }
}

/// Picker entries: keep, custom, then every known rc file except the current one
pub fn shell_rc_options(home: &Path, current: &Path) -> Vec<ShellRcOption> {
    let mut options = vec![
        ShellRcOption::Keep(current.to_path_buf()),
        ShellRcOption::Custom,
    ];

    options.extend(
        SHELL_RC_CHOICES
            .iter()
            .map(|name| (*name, home.join(name)))
            .filter(|(_, path)| path != current)
            .map(|(name, path)| ShellRcOption::Candidate {
                name,
                exists: path.exists(),
                path,
            }),
    );

    options
}

/// Interactively edit the configuration
pub fn configure(paths: &Paths, install: &Installation, ui: &Ui) -> Result<()> {
    let previous = Config::load(paths);

    ui.section("brewpy Configuration");
    ui.println("Configure brewpy settings interactively.");
    ui.newline();
    ui.println(settings_table(ui, &previous).to_string());
    ui.newline();

    let choice = Select::new("What would you like to configure?", ConfigChoice::ALL.to_vec())
        .prompt()
        .context("Configuration cancelled")?;

    let mut config = previous.clone();
    match choice {
        ConfigChoice::WorkingDir => config.working_dir = prompt_working_dir(paths, &config)?,
        ConfigChoice::ShellRc => config.shell_rc = prompt_shell_rc(paths, &config)?,
        ConfigChoice::All => {
            config.working_dir = prompt_working_dir(paths, &config)?;
            config.shell_rc = prompt_shell_rc(paths, &config)?;
        }
        ConfigChoice::Reset => {
            let confirmed = Confirm::new("Reset all settings to defaults?")
                .with_default(false)
                .prompt()
                .context("Confirmation cancelled")?;
            if !confirmed {
                ui.warn("Configuration reset cancelled.");
                return Ok(());
            }
            config = Config::defaults(paths);
        }
        ConfigChoice::Cancel => {
            ui.warn("No changes made.");
            return Ok(());
        }
    }

    let carried = apply_config(paths, install, &previous, &config)
        .context("Failed to save configuration")?;

    ui.newline();
    ui.ok("Configuration saved successfully!");
    ui.println(settings_table(ui, &config).to_string());

    if let Some(version) = &carried {
        ui.ok(format!(
            "{} now links to {}",
            config.shims_dir().display(),
            version
        ));
    }

    // Open terminals still look in the old place until the hint changes
    if config.working_dir != paths.preferred_dir() {
        let step = if paths.is_default_dir(&config.working_dir) {
            format!("unset {}", WORKING_DIR_ENV)
        } else {
            format!(
                "export {}=\"{}\"",
                WORKING_DIR_ENV,
                config.working_dir.display()
            )
        };
        ui.warn(format!(
            "Before running any other brewpy command in this terminal, run '{}' or open a new terminal.",
            step
        ));
    }

    if carried.is_none() {
        ui.note("Run 'brewpy use' to select a Python version.");
    }
    ui.note(format!(
        "Restart your terminal or run 'source {}' to apply changes.",
        config.shell_rc.display()
    ));

    Ok(())
}

/// Persist `config`, relocating storage when the working directory moved
///
/// A move re-creates the active version's shims under the new working
/// directory and refreshes the shell profile block so new shells export
/// the directory `brewpy init` has to look in. Returns the version the
/// new shims point at, if one was active.
pub fn apply_config(
    paths: &Paths,
    install: &Installation,
    previous: &Config,
    config: &Config,
) -> Result<Option<String>> {
    if config.working_dir == previous.working_dir {
        config.init()?;
        return Ok(None);
    }

    config.migrate(paths, &previous.config_path())?;

    let active = current_version(install.runtime, previous);
    if let Some(version) = &active {
        switch_version(install.runtime, version, config, &install.bin_dir)
            .with_context(|| format!("Failed to re-create shims for {}", version))?;
    }

    ensure_init_block(config, paths)?;
    Ok(active)
}

fn prompt_working_dir(paths: &Paths, config: &Config) -> Result<PathBuf> {
    let current = config.working_dir.display().to_string();
    let input = Text::new("brewpy directory (stores config and shims)")
        .with_default(&current)
        .with_validator(parent_exists_validator(paths.clone(), true))
        .prompt()
        .context("Directory prompt cancelled")?;

    let input = input.trim();
    if input.is_empty() {
        return Ok(config.working_dir.clone());
    }
    Ok(paths.expand(input))
}

fn prompt_shell_rc(paths: &Paths, config: &Config) -> Result<PathBuf> {
    let options = shell_rc_options(&paths.home, &config.shell_rc);
    let selected = Select::new("Select shell RC file", options)
        .with_page_size(10)
        .prompt()
        .context("Shell RC selection cancelled")?;

    match selected {
        ShellRcOption::Keep(path) => Ok(path),
        ShellRcOption::Candidate { path, .. } => Ok(path),
        ShellRcOption::Custom => {
            let current = config.shell_rc.display().to_string();
            let input = Text::new("Shell RC file path")
                .with_default(&current)
                .with_validator(parent_exists_validator(paths.clone(), false))
                .prompt()
                .context("Shell RC prompt cancelled")?;
            Ok(paths.expand(input.trim()))
        }
    }
}

fn parent_exists_validator(
    paths: Paths,
    allow_empty: bool,
) -> impl Fn(&str) -> Result<Validation, inquire::CustomUserError> + Clone {
    move |input: &str| {
        let input = input.trim();
        if input.is_empty() {
            return Ok(if allow_empty {
                Validation::Valid
            } else {
                Validation::Invalid("Path cannot be empty".into())
            });
        }

        let expanded = paths.expand(input);
        match expanded.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => Ok(
                Validation::Invalid(format!("Parent directory {} does not exist", parent.display()).into()),
            ),
            _ => Ok(Validation::Valid),
        }
    }
}
