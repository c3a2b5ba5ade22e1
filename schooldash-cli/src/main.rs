//! schooldash CLI - school enrollment statistics dashboard

// Global invariants enforced:
// - Rendered data goes to stdout (or --output); diagnostics go to stderr
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Parser, Subcommand};
use schooldash_core::config::{self, ResolvedConfig};
use schooldash_core::html::render_html_dashboard;
use schooldash_core::{
    render_json, render_text, DashboardEvent, DashboardSession, FilterField, LoadError,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schooldash")]
#[command(about = "Filter, aggregate and page through school enrollment statistics")]
#[command(version = env!("SCHOOLDASH_VERSION"))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the dashboard for a dataset
    Show {
        /// Path to the JSON dataset
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Only records of this year (2020 or 2020年度)
        #[arg(long)]
        year: Option<String>,

        /// Only records of this installation type
        #[arg(long = "type")]
        install_type: Option<String>,

        /// Only records of this category
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text search across all fields
        #[arg(long)]
        search: Option<String>,

        /// Rows per table page (overrides config file)
        #[arg(long)]
        page_size: Option<usize>,

        /// Table page to show (1-based; stops at the last page)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Path to config file (default: auto-discover next to the dataset)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write output to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the filter options a dataset offers
    Options {
        /// Path to the JSON dataset
        path: PathBuf,

        /// Path to config file (default: auto-discover next to the dataset)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Html,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Show {
            path,
            format,
            year,
            install_type,
            category,
            search,
            page_size,
            page,
            config: config_path,
            output,
        } => {
            let resolved = load_config(&path, config_path.as_deref())?;
            let mut session = DashboardSession::new(resolved);
            if !load_dataset(&mut session, &path)? {
                return Ok(());
            }

            let mut events = Vec::new();
            for (field, value) in [
                (FilterField::Year, year),
                (FilterField::Type, install_type),
                (FilterField::Category, category),
            ] {
                if let Some(value) = value {
                    events.push(DashboardEvent::Filter { field, value });
                }
            }
            if let Some(term) = search {
                events.push(DashboardEvent::Search(term));
            }
            if let Some(size) = page_size {
                events.push(DashboardEvent::PageSize(size));
            }
            events.push(DashboardEvent::GoToPage(page));

            for event in events {
                session.handle(event)?;
            }

            let view = session.view().context("dataset was not loaded")?;
            let rendered = match format {
                OutputFormat::Text => render_text(&view, session.config()),
                OutputFormat::Json => render_json(&view)?,
                OutputFormat::Html => render_html_dashboard(&view, session.config()),
            };
            write_output(&rendered, output.as_deref())?;
        }
        Commands::Options {
            path,
            config: config_path,
        } => {
            let resolved = load_config(&path, config_path.as_deref())?;
            let mut session = DashboardSession::new(resolved);
            if !load_dataset(&mut session, &path)? {
                return Ok(());
            }

            let options = session.options();
            let years: Vec<String> = options
                .years
                .iter()
                .map(|y| session.config().year_label(*y))
                .collect();
            println!("years:      {}", years.join(", "));
            println!("types:      {}", options.types.join(", "));
            println!("categories: {}", options.categories.join(", "));
        }
        Commands::Config { action } => handle_config(action)?,
    }

    Ok(())
}

/// Install the stderr log subscriber
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve config for a dataset, searching the dataset's directory
fn load_config(dataset: &Path, config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let search_dir = dataset
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let resolved = config::load_and_resolve(&search_dir, config_path)
        .context("failed to load configuration")?;
    if let Some(path) = &resolved.config_path {
        info!(config = %path.display(), "using config");
    }
    Ok(resolved)
}

/// Load the dataset into the session.
///
/// Returns `Ok(false)` for the soft empty-dataset status (reported, not an error).
fn load_dataset(session: &mut DashboardSession, path: &Path) -> anyhow::Result<bool> {
    match session.load_file(path) {
        Ok(summary) => {
            eprintln!("{}", summary.status_message());
            Ok(true)
        }
        Err(err) => match err.downcast_ref::<LoadError>() {
            Some(load_err) if load_err.is_soft() => {
                warn!(path = %path.display(), "dataset has no records");
                eprintln!("データの読み込みに失敗しました: {}", load_err);
                Ok(false)
            }
            _ => Err(err),
        },
    }
}

fn write_output(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory: {}", parent.display()))?;
            }
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write output: {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn handle_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Validate { path } => {
            let cwd = std::env::current_dir()?;
            match path {
                Some(p) => {
                    config::load_config_file(&p)?;
                    println!("Config valid: {}", p.display());
                }
                None => match config::discover_config(&cwd)? {
                    Some((_, p)) => println!("Config valid: {}", p.display()),
                    None => println!("No config file found; defaults apply"),
                },
            }
        }
        ConfigAction::Show { path } => {
            let cwd = std::env::current_dir()?;
            let resolved = config::load_and_resolve(&cwd, path.as_deref())?;
            match &resolved.config_path {
                Some(p) => println!("Config: {}", p.display()),
                None => println!("Config: (defaults)"),
            }
            println!("page_size:         {}", resolved.page_size);
            println!("page_size_choices: {:?}", resolved.page_size_choices);
            println!("total_label:       {}", resolved.sentinels.total);
            println!("male_label:        {}", resolved.sentinels.male);
            println!("female_label:      {}", resolved.sentinels.female);
            println!("year_suffix:       {}", resolved.year_suffix);
        }
    }
    Ok(())
}
