use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tracelane::logging::{self, LogTarget};
use tracelane::tui::{self, canvas::TerminalRenderer, tree_view};
use tracelane_core::{Config, JsonEventLog, SceneStore};

#[derive(Parser)]
#[command(name = "tracelane")]
#[command(about = "Lane view of traced process executions", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "tracelane.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive lane viewer on an event log
    View {
        log: PathBuf,
        /// Strip this prefix from binary paths (overrides config)
        #[arg(long)]
        project_root: Option<PathBuf>,
    },

    /// Print the reconstructed execution forest
    Tree {
        log: PathBuf,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },

    /// Print node, lane and failure counts for an event log
    Summary {
        log: PathBuf,
        #[arg(long)]
        project_root: Option<PathBuf>,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file_or_default(&cli.config)?;
    config.validate()?;

    match cli.command {
        Commands::View { log, project_root } => {
            logging::init_logging(&config.logging, LogTarget::Viewer)?;
            let source = open_log(&config, log, project_root);
            tui::launch_tui(config, source)?;
        }
        Commands::Tree { log, project_root } => {
            logging::init_logging(&config.logging, LogTarget::Stderr)?;
            let source = open_log(&config, log, project_root);
            let scene = SceneStore::new()
                .load(&source, &mut TerminalRenderer::new(), &config.layout)
                .context("Failed to load event log")?;

            for line in tree_view::build_tree(scene.forest()) {
                println!("{}", tree_view::format_line(&line));
            }
            if let Some(fault) = scene.layout().fault() {
                eprintln!("⚠️  {}", fault);
            }
        }
        Commands::Summary {
            log,
            project_root,
            json,
        } => {
            logging::init_logging(&config.logging, LogTarget::Stderr)?;
            let source = open_log(&config, log, project_root);
            let scene = SceneStore::new()
                .load(&source, &mut TerminalRenderer::new(), &config.layout)
                .context("Failed to load event log")?;
            let summary = scene.summary();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("📊 Events:   {}", summary.nodes);
                println!("   Roots:    {}", summary.roots);
                println!("   Lanes:    {}", summary.lanes);
                println!("   Markers:  {}", summary.markers);
                println!("   Failures: {}", summary.failures);
                match summary.fault {
                    Some(fault) => println!("⚠️  Layout: {}", fault),
                    None => println!("✅ Layout complete"),
                }
            }
        }
        Commands::Config => {
            print!("{}", Config::default_toml()?);
        }
    }

    Ok(())
}

fn open_log(config: &Config, log: PathBuf, project_root: Option<PathBuf>) -> JsonEventLog {
    let root = project_root.or_else(|| config.source.project_root.clone());
    JsonEventLog::from_path(log).with_project_root(root)
}
