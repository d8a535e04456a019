mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "methodkit",
    about = "Methodology toolkit — validate, generate, and install workflow definitions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from namespaces/, .installed.yaml, or .git/)
    #[arg(long, global = true, env = "METHODKIT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize methodology tracking in the current project
    Init {
        /// Path to the methodology source repository
        #[arg(long)]
        source: PathBuf,

        /// Methodology namespace to track
        #[arg(long)]
        methodology: String,

        /// Bundle name
        #[arg(long, default_value = "standard")]
        bundle: String,
    },

    /// Validate a methodology's state machine and structure
    Validate {
        namespace: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Generate process files from the methodology document
    Generate {
        namespace: String,

        /// Output directory (default: the namespace's processes/ directory)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print generated JSON without writing files
        #[arg(long)]
        dry_run: bool,

        /// Overwrite files marked as manually modified
        #[arg(long)]
        force: bool,
    },

    /// Check persisted process files against the methodology document
    SyncCheck {
        namespace: String,

        /// Show processes that are in sync too
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Derive phase_defaults and declarative processes from persisted files
    ExtractDefaults {
        namespace: String,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: String,
    },

    /// Render the methodology as a diagram
    Visualize {
        namespace: String,

        /// Diagram syntax: mermaid or plantuml
        #[arg(long, default_value = "mermaid")]
        format: String,

        /// Diagram flavor: state, actors, or artifacts
        #[arg(long = "type", default_value = "state")]
        diagram_type: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Install a skill or process from the methodology source
    Install {
        /// namespace/type/id, or namespace/type with --all
        component: String,

        /// Install every component under namespace/type
        #[arg(long)]
        all: bool,
    },

    /// Show installed components and detect local modifications
    Status,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            source,
            methodology,
            bundle,
        } => cmd::init::run(&root, &source, &methodology, &bundle),
        Commands::Validate { namespace, strict } => {
            cmd::validate::run(&root, &namespace, strict, cli.json)
        }
        Commands::Generate {
            namespace,
            output,
            dry_run,
            force,
        } => cmd::generate::run(&root, &namespace, output.as_deref(), dry_run, force),
        Commands::SyncCheck { namespace, verbose } => {
            cmd::sync::run(&root, &namespace, verbose, cli.json)
        }
        Commands::ExtractDefaults { namespace, format } => {
            cmd::extract::run(&root, &namespace, &format)
        }
        Commands::Visualize {
            namespace,
            format,
            diagram_type,
            output,
        } => cmd::visualize::run(&root, &namespace, &format, &diagram_type, output.as_deref()),
        Commands::Install { component, all } => cmd::install::run(&root, &component, all),
        Commands::Status => cmd::status::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
