//! pavdash CLI - Paving Production Dashboard
//!
//! Loads the daily production spreadsheets of every construction site and
//! serves the dashboard, checks the files, or renders one selection to disk.
//!
//! # Usage
//!
//! ```bash
//! # Serve the dashboard on 127.0.0.1:8050 from the current directory
//! pavdash
//!
//! # Serve another directory on all interfaces
//! pavdash serve --data-dir /srv/producao --host 0.0.0.0 --port 8080
//!
//! # Validate the spreadsheets
//! pavdash check --data-dir /srv/producao
//!
//! # Write the charts of one month to disk
//! pavdash render --project 12 --month 2024-03 --out-dir relatorio
//! ```

mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pavdash_core::options::options;
use pavdash_core::reshape::{daily_series, period_summary};
use pavdash_core::{DataContext, Renderer, Selection};
use pavdash_loader::{load_directory, LoaderOptions};
use pavdash_render::{DashboardPage, DashboardView};
use pavdash_web::AppState;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{FileConfig, Overrides, Settings};

#[derive(Parser)]
#[command(name = "pavdash")]
#[command(author, version, about = "Paving production dashboard", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ./pavdash.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the production spreadsheets
    #[arg(long, value_name = "DIR", env = "PAVDASH_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Address the server binds to
    #[arg(long, env = "PAVDASH_HOST", global = true)]
    host: Option<String>,

    /// Port the server listens on
    #[arg(short, long, env = "PORT", global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the spreadsheets and serve the dashboard (default)
    Serve {
        /// Use the dark theme
        #[arg(long)]
        dark: bool,
    },

    /// Load the spreadsheets and print a summary of each project
    Check,

    /// Write the charts and dashboard page of one selection to a directory
    Render {
        /// Project id, or "all"
        #[arg(long)]
        project: String,

        /// Month as YYYY-MM
        #[arg(long)]
        month: String,

        /// Week as YYYY-MM-DD/YYYY-MM-DD (or any day in it), or "all"
        #[arg(long)]
        week: Option<String>,

        /// Activity 1-5, or "all"
        #[arg(long)]
        activity: Option<String>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        out_dir: PathBuf,

        /// Use the dark theme
        #[arg(long)]
        dark: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();

    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(
        file,
        Overrides {
            data_dir: cli.data_dir,
            host: cli.host,
            port: cli.port,
        },
    )?;

    match cli.command.unwrap_or(Commands::Serve { dark: false }) {
        Commands::Serve { dark } => serve(&settings, dark).await,
        Commands::Check => check(&settings),
        Commands::Render {
            project,
            month,
            week,
            activity,
            out_dir,
            dark,
        } => {
            let selection = Selection::from_raw(
                activity.as_deref(),
                Some(project.as_str()),
                Some(month.as_str()),
                week.as_deref(),
            )
            .context("Invalid selection")?;
            render(&settings, &selection, &out_dir, dark)
        }
    }
}

fn load(settings: &Settings) -> Result<DataContext> {
    let options = LoaderOptions::new().file_prefix(settings.file_prefix.as_str());
    load_directory(&settings.data_dir, &options, settings.catalog.clone()).with_context(|| {
        format!(
            "Failed to load production data from {}",
            settings.data_dir.display()
        )
    })
}

fn page(dark: bool) -> DashboardPage {
    if dark {
        DashboardPage::new().dark_theme()
    } else {
        DashboardPage::new()
    }
}

async fn serve(settings: &Settings, dark: bool) -> Result<()> {
    let addr = settings.addr()?;
    let ctx = load(settings)?;
    info!(dir = %settings.data_dir.display(), projects = ctx.len(), "Production data loaded");

    let state = AppState::new(ctx).with_page(page(dark));
    pavdash_web::run_server(state, addr).await
}

fn check(settings: &Settings) -> Result<()> {
    let ctx = load(settings)?;
    if ctx.is_empty() {
        println!(
            "No production files found in {}",
            settings.data_dir.display()
        );
        return Ok(());
    }

    for dataset in ctx.projects() {
        let range = dataset
            .date_range()
            .map(|(first, last)| format!("{} .. {}", first, last))
            .unwrap_or_else(|| "no dates".to_string());
        let months = dataset
            .months()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{}: {} rows, {}, months [{}]",
            dataset.label(),
            dataset.len(),
            range,
            months
        );
    }
    println!("{} project(s) loaded", ctx.len());
    Ok(())
}

fn render(settings: &Settings, selection: &Selection, out_dir: &Path, dark: bool) -> Result<()> {
    let ctx = load(settings)?;
    let opts = options(&ctx, selection);
    let daily = daily_series(&ctx, selection);
    let summary = period_summary(&ctx, selection);
    let page = page(dark);

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let outputs = [
        ("daily.svg", page.line.render(&daily)?),
        ("summary.svg", page.bar.render(&summary)?),
        (
            "dashboard.html",
            page.render(&DashboardView {
                options: &opts,
                selection,
                daily: &daily,
                summary: &summary,
            })?,
        ),
    ];

    for (name, content) in outputs {
        let path = out_dir.join(name);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
