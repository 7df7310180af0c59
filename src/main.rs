//! Insightboard CLI - render dashboard pages as JSON

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use insightboard_lib::state::{load_config, AppState};
use insightboard_lib::types::SourceKind;
use insightboard_lib::watcher::start_workbook_watcher;
use insightboard_lib::{Dashboard, Page, PageResult};

#[derive(Parser)]
#[command(name = "insightboard")]
#[command(
    author,
    version,
    about = "Executive strategy dashboards from a Google Sheet or an Excel workbook"
)]
struct Cli {
    /// Config file (default: $INSIGHTBOARD_CONFIG or ~/.insightboard/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List dashboard pages
    Pages,

    /// List worksheets in the configured source
    Sheets,

    /// Render one page as JSON (a success view or an error state)
    Show {
        /// Page slug, e.g. executive_summary
        page: String,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Render a page, then re-render after every workbook change
    Watch {
        /// Page slug
        page: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pages => list_pages(),
        Commands::Sheets => {
            let state = build_state(cli.config)?;
            list_sheets(&state.dashboard()).await
        }
        Commands::Show { page, compact } => {
            let page = parse_page(&page)?;
            let state = build_state(cli.config)?;
            let result = state.dashboard().render(page).await;
            print_result(&result, compact)
        }
        Commands::Watch { page } => {
            let page = parse_page(&page)?;
            let state = build_state(cli.config)?;
            watch(&state, page).await
        }
    }
}

fn build_state(config_path: Option<PathBuf>) -> Result<AppState> {
    let config = load_config(config_path.as_deref()).context("Failed to load config")?;
    AppState::from_config(config).context("Failed to set up data source")
}

fn parse_page(slug: &str) -> Result<Page> {
    slug.parse::<Page>().map_err(anyhow::Error::from)
}

fn list_pages() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for page in Page::ALL {
        let companion = page
            .companion_worksheet()
            .map(|c| format!(" + {}", c))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<22} {:<34} {}{}",
            page.slug(),
            page.title(),
            page.worksheet(),
            companion
        )?;
    }
    Ok(())
}

async fn list_sheets(dashboard: &Dashboard) -> Result<()> {
    let names = dashboard
        .worksheet_names()
        .await
        .context("Failed to list worksheets")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for name in names {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

fn print_result(result: &PageResult, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(result)?
    } else {
        serde_json::to_string_pretty(result)?
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", json)?;
    Ok(())
}

async fn watch(state: &AppState, page: Page) -> Result<()> {
    if state.config.source_kind() != SourceKind::Workbook {
        anyhow::bail!("`watch` needs a local workbook source");
    }

    let dashboard = state.dashboard();
    print_result(&dashboard.render(page).await, false)?;

    let mut changes = start_workbook_watcher(&state.config.workbook_path(), state.cache.clone())
        .context("Failed to start workbook watcher")?;
    while let Some(summary) = changes.recv().await {
        for (worksheet, err) in &summary.failed {
            eprintln!("Refresh of '{}' failed: {}", worksheet, err);
        }
        print_result(&dashboard.render(page).await, false)?;
    }
    Ok(())
}
