use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::config::ConfigAction;
use ppmm_ai::OutputFormat;

/// ppmm-ai - Python dependency conflict detection & resolution
/// Checks an upgrade against the project's pins and suggests compatible versions.
#[derive(Parser)]
#[command(name = "ppmm-ai")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect third-party packages imported by the project's sources
    Analyze {
        /// Project root
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Generate requirements.txt and requirements-dev.txt from detected imports
    Gen {
        /// Project root
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Write a dependency health report (outdated pins, known vulnerabilities)
    Dashboard {
        /// Project root
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Check an upgrade to the latest release for conflicts
    Upgrade {
        /// Package to upgrade
        package: String,

        /// Project root
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Upgrade a package and write requirements-resolved.txt with suggested fixes
    Resolve {
        /// Package to upgrade
        package: String,

        /// Project root
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Show what would be written without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// List available versions of a package
    Versions {
        /// Package name (e.g., "requests", "numpy")
        package: String,

        /// Show only versions matching a constraint list (e.g., ">=1.5,<2.5")
        #[arg(short, long)]
        constraint: Option<String>,

        /// Number of recent versions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Show all versions (ignore limit)
        #[arg(long)]
        all: bool,

        /// Project root (for registry configuration)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Show the project's current pins
    Pins {
        /// Project root
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,

        /// Project root
        #[arg(long, global = true, default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Create default .ppmm-ai.toml configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("PPMM_AI_LOG")
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let format = cli.format;
    let is_json = format == OutputFormat::Json;

    init_logging(cli.verbose);

    if !is_json {
        println!("{}", "⚡ ppmm-ai".bold().cyan());
        println!("{}", "Python dependency conflict detection & resolution".dimmed());
        println!();
    }

    let result = match cli.command {
        Commands::Analyze { path } => commands::analyze::run(&path, format),
        Commands::Gen { path } => commands::generate::run(&path, format),
        Commands::Dashboard { path } => commands::dashboard::run(&path, format),
        Commands::Upgrade { package, path } => commands::upgrade::run(&package, &path, format),
        Commands::Resolve {
            package,
            path,
            dry_run,
        } => commands::resolve::run(&package, &path, dry_run, format),
        Commands::Versions {
            package,
            constraint,
            limit,
            all,
            path,
        } => commands::versions::run(&package, constraint.as_deref(), limit, all, &path, format),
        Commands::Pins { path } => commands::pins::run(&path, format),
        Commands::Config { action, path } => {
            let config_action = match action {
                ConfigCommands::Init { force } => ConfigAction::Init { force },
                ConfigCommands::Validate => ConfigAction::Validate,
            };
            commands::config::run(config_action, &path, format)
        }
    };

    if let Err(e) = result {
        if is_json {
            let error_output = serde_json::json!({
                "success": false,
                "error": format!("{:#}", e),
                "timestamp": chrono::Utc::now().to_rfc3339()
            });
            eprintln!("{}", serde_json::to_string_pretty(&error_output).unwrap_or_default());
        } else {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        std::process::exit(1);
    }
}
