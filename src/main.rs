use anyhow::Result;
use clap::{Parser, Subcommand};

use brewpy::{
    commands,
    paths::Paths,
    ui::{ColorMode, Ui},
    versions::Installation,
};

#[derive(Parser)]
#[command(name = "brewpy")]
#[command(about = "BrewPy - Python version manager for Homebrew installs")]
#[command(version, arg_required_else_help = true)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed Python versions
    Versions,

    /// Set the active Python version (prompts when omitted)
    Use {
        /// Version to activate, e.g. Python3.11
        version: Option<String>,
    },

    /// Output shell configuration (use with eval)
    Init,

    /// Show the currently active Python version
    Current,

    /// Configure brewpy settings interactively
    Configure,

    /// Inspect brewpy settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the current configuration and its status
    Show,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let paths = Paths::new()?;
    let install = Installation::detect();
    let ui = Ui::new(cli.color, cli.no_color);

    match cli.command {
        Commands::Versions => commands::versions(&paths, &install, &ui),
        Commands::Use { version } => commands::use_version(&paths, &install, version, &ui),
        Commands::Init => commands::init(&paths, &ui),
        Commands::Current => commands::current(&paths, &install, &ui),
        Commands::Configure => commands::configure(&paths, &install, &ui),
        Commands::Config {
            action: ConfigAction::Show,
        } => commands::config_show(&paths, &install, &ui),
    }
}
