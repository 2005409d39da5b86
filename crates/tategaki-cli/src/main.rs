//! Tategaki CLI
//!
//! Command-line interface for Tategaki - vertically typeset writing projects.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tategaki_core::{Config, Store};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "tategaki")]
#[command(about = "Tategaki - local-first vertical writing projects")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all projects
    #[command(alias = "ls")]
    List,
    /// Create a new project
    New {
        /// Project title
        title: String,
        /// Author name
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Show project details
    Show {
        /// Project ID (full UUID or prefix)
        id: String,
    },
    /// Rename a project
    Rename {
        /// Project ID (full UUID or prefix)
        id: String,
        /// New title
        title: String,
    },
    /// Duplicate a project
    Clone {
        /// Project ID (full UUID or prefix)
        id: String,
    },
    /// Delete a project
    #[command(alias = "rm")]
    Delete {
        /// Project ID (full UUID or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Import a project from an exported JSON file
    Import {
        /// Path to the exported file
        file: std::path::PathBuf,
    },
    /// Export a project as JSON
    Export {
        /// Project ID (full UUID or prefix)
        id: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<std::path::PathBuf>,
    },
    /// Export a project as a printable HTML document
    ExportHtml {
        /// Project ID (full UUID or prefix)
        id: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<std::path::PathBuf>,
    },
    /// Export a metadata catalog of every project
    Catalog {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<std::path::PathBuf>,
    },
    /// Show character counts for a project
    Count {
        /// Project ID (full UUID or prefix)
        id: String,
    },
    /// Manage chapters within a project
    Chapter {
        #[command(subcommand)]
        command: ChapterCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ChapterCommands {
    /// Append a new chapter
    #[command(alias = "add")]
    Create {
        /// Project ID (full UUID or prefix)
        project_id: String,
        /// Chapter title (auto-numbered if omitted)
        #[arg(short = 'T', long)]
        title: Option<String>,
    },
    /// List chapters in a project
    #[command(alias = "ls")]
    List {
        /// Project ID (full UUID or prefix)
        project_id: String,
    },
    /// Rename a chapter
    Rename {
        /// Project ID (full UUID or prefix)
        project_id: String,
        /// Chapter ID (full UUID or prefix)
        chapter_id: String,
        /// New title
        title: String,
    },
    /// Duplicate a chapter, inserting the copy after the source
    Clone {
        /// Project ID (full UUID or prefix)
        project_id: String,
        /// Chapter ID (full UUID or prefix)
        chapter_id: String,
    },
    /// Move a chapter up or down in reading order
    Move {
        /// Project ID (full UUID or prefix)
        project_id: String,
        /// Chapter ID (full UUID or prefix)
        chapter_id: String,
        /// Signed offset, e.g. -1 moves one place earlier
        #[arg(allow_hyphen_values = true)]
        offset: isize,
    },
    /// Delete a chapter
    #[command(alias = "rm")]
    Delete {
        /// Project ID (full UUID or prefix)
        project_id: String,
        /// Chapter ID (full UUID or prefix)
        chapter_id: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Logging goes to stderr so piped output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load()?;
    let mut store = Store::open(&config);

    match cli.command {
        Commands::List => commands::project::list(&store, &output),
        Commands::New { title, author } => {
            commands::project::create(&mut store, title, author, &output)
        }
        Commands::Show { id } => commands::project::show(&store, id, &output),
        Commands::Rename { id, title } => {
            commands::project::rename(&mut store, id, title, &output)
        }
        Commands::Clone { id } => commands::project::clone(&mut store, id, &output),
        Commands::Delete { id, force } => {
            commands::project::delete(&mut store, id, force, &output)
        }
        Commands::Import { file } => commands::project::import(&mut store, file, &output),
        Commands::Export { id, out } => commands::project::export(&store, id, out, &output),
        Commands::ExportHtml { id, out } => {
            commands::project::export_html(&store, id, out, &output)
        }
        Commands::Catalog { out } => commands::project::catalog(&store, out, &output),
        Commands::Count { id } => commands::project::count(&store, id, &output),
        Commands::Chapter { command } => handle_chapter_command(command, &mut store, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_chapter_command(
    command: ChapterCommands,
    store: &mut Store,
    output: &Output,
) -> Result<()> {
    match command {
        ChapterCommands::Create { project_id, title } => {
            commands::chapter::create(store, project_id, title, output)
        }
        ChapterCommands::List { project_id } => commands::chapter::list(store, project_id, output),
        ChapterCommands::Rename {
            project_id,
            chapter_id,
            title,
        } => commands::chapter::rename(store, project_id, chapter_id, title, output),
        ChapterCommands::Clone {
            project_id,
            chapter_id,
        } => commands::chapter::clone(store, project_id, chapter_id, output),
        ChapterCommands::Move {
            project_id,
            chapter_id,
            offset,
        } => commands::chapter::move_chapter(store, project_id, chapter_id, offset, output),
        ChapterCommands::Delete {
            project_id,
            chapter_id,
        } => commands::chapter::delete(store, project_id, chapter_id, output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}
