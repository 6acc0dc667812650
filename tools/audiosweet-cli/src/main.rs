//! AudioSweet CLI — Command-line interface for session files and render runs.
//!
//! Usage:
//!   audiosweet init <PATH>          Write a demo session file
//!   audiosweet validate <PATH>      Validate a session file
//!   audiosweet units <PATH>         Show detected units and the render plan
//!   audiosweet apply <PATH>         Run the render pipeline on a session
//!   audiosweet name <NAME> -t TOK   Show the output name for a clip
//!   audiosweet config [--write]     Show (or save) the effective configuration
//!
//! Bare session file names that do not exist in the working directory are
//! looked up in the configured sessions directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "audiosweet",
    about = "Render focused effects and effect chains into clips",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a demo session file
    Init {
        /// Session file to create
        path: PathBuf,

        /// Session name
        #[arg(short, long, default_value = "demo")]
        name: String,
    },

    /// Validate a session file
    Validate {
        /// Path to the session file
        path: PathBuf,
    },

    /// Show the units the selection compiles into and the chosen plan
    Units {
        /// Path to the session file
        path: PathBuf,
    },

    /// Run the render pipeline against a session file
    Apply {
        /// Path to the session file
        path: PathBuf,

        /// Operating mode: focused|chain
        #[arg(long)]
        mode: Option<String>,

        /// Action: apply|copy
        #[arg(long)]
        action: Option<String>,

        /// Channel mode: auto|mono|multi
        #[arg(long)]
        channel_mode: Option<String>,

        /// Channel policy: source-playback|source-track|target-track
        #[arg(long)]
        policy: Option<String>,

        /// Maximum effect tokens kept in output names
        #[arg(long)]
        cap: Option<usize>,

        /// Write the resulting session here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Make the Nth render call fail (1-based, repeatable)
        #[arg(long)]
        fail_render: Vec<usize>,

        /// Simulate an unavailable render engine
        #[arg(long)]
        engine_offline: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the output name for a clip name and effect tokens
    Name {
        /// Current clip name
        name: String,

        /// Effect token (repeatable)
        #[arg(short, long = "token")]
        tokens: Vec<String>,

        /// Maximum tokens kept
        #[arg(long, default_value = "8")]
        cap: usize,
    },

    /// Show the effective configuration
    Config {
        /// Save it to the config file (creates the file with defaults)
        #[arg(long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = audiosweet_common::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    audiosweet_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init { path, name } => commands::init::run(config.resolve_session_path(&path), name),
        Commands::Validate { path } => commands::validate::run(config.resolve_session_path(&path)),
        Commands::Units { path } => commands::units::run(config.resolve_session_path(&path)),
        Commands::Apply {
            path,
            mode,
            action,
            channel_mode,
            policy,
            cap,
            output,
            fail_render,
            engine_offline,
            json,
        } => commands::apply::run(
            config.resolve_session_path(&path),
            commands::apply::Overrides {
                mode,
                action,
                channel_mode,
                policy,
                cap,
            },
            config.render.clone(),
            commands::apply::Simulation {
                fail_render,
                engine_offline,
            },
            output,
            json,
        ),
        Commands::Name { name, tokens, cap } => commands::name::run(name, tokens, cap),
        Commands::Config { write } => commands::config::run(&config, write),
    }
}
