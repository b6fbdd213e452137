use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mbank_history::browser::BrowserSession;
use mbank_history::clock::SystemClock;
use mbank_history::config::{default_config_path, Config};
use mbank_history::export::{
    cookie_header, normalize_export_csv, DownloadRequest, ExportClient, ExportRange,
};
use mbank_history::page::chromium::ChromiumPage;
use mbank_history::sink::TracingSink;
use mbank_history::Scraper;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mbank-history")]
#[command(about = "Scrape recent mBank transactions with running balances")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the transaction history table and print it as JSON
    Scrape {
        /// DevTools websocket of a running browser, instead of launching one
        #[arg(long)]
        ws_url: Option<String>,

        /// Start right away instead of waiting for Enter after login
        #[arg(long)]
        no_wait: bool,
    },
    /// Download the full history as CSV
    Export {
        /// First day (YYYY-MM-DD); defaults to export.from in the config
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        ws_url: Option<String>,
    },
    /// Normalize a CSV export saved from the website
    NormalizeCsv {
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show current configuration
    Config,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,chromiumoxide=warn,chromiumoxide::conn=off,chromiumoxide::handler=off")
    });
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn wait_for_login(url: &str) -> Result<()> {
    eprintln!("\n========================================");
    eprintln!("Log in to mBank in the browser window.");
    eprintln!("Make sure the tab ends up on {url}");
    eprintln!("then return here and press Enter.");
    eprintln!("========================================\n");

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    Ok(())
}

fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

async fn scrape(mut config: Config, ws_url: Option<String>, no_wait: bool) -> Result<ExitCode> {
    if ws_url.is_some() {
        config.browser.ws_url = ws_url;
    }
    let history_url = config.scrape.pages.history_url.clone();

    let session = BrowserSession::start(&config.browser, &config.profile_dir()?).await?;
    let tab = session.open(&history_url).await?;
    if !no_wait {
        wait_for_login(&history_url)?;
    }

    let page = ChromiumPage::new(tab);
    let sink = TracingSink::new();
    // Returns once the logout page has loaded or `logout_timeout` ran out.
    let outcome = Scraper::new(config.scrape).run(&page, &sink).await;
    drop(page);
    if let Err(err) = session.close().await {
        tracing::warn!(error = %err, "failed to close browser");
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn export(
    mut config: Config,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    output: Option<PathBuf>,
    ws_url: Option<String>,
) -> Result<ExitCode> {
    if ws_url.is_some() {
        config.browser.ws_url = ws_url;
    }
    let range = ExportRange::resolve(from, to, &config.export, &SystemClock)?;
    let history_url = config.scrape.pages.history_url.clone();

    let session = BrowserSession::start(&config.browser, &config.profile_dir()?).await?;
    let tab = session.open(&history_url).await?;
    wait_for_login(&history_url)?;
    let cookies = BrowserSession::cookies(&tab).await;
    drop(tab);
    if let Err(err) = session.close().await {
        tracing::warn!(error = %err, "failed to close browser");
    }
    let cookies = cookies?;
    tracing::info!(cookies = cookies.len(), "captured session cookies");

    let client = ExportClient::new(config.export.base_url.clone(), cookie_header(cookies))?;
    let request = DownloadRequest::new(config.export.product_id.clone(), range);
    let csv = client.fetch_csv(&request).await?;

    write_output(output.as_ref(), &csv)?;
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Scrape { ws_url, no_wait } => scrape(config, ws_url, no_wait).await,
        Command::Export {
            from,
            to,
            output,
            ws_url,
        } => export(config, from, to, output, ws_url).await,
        Command::NormalizeCsv { file, output } => {
            let raw = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let csv = normalize_export_csv(&raw)
                .with_context(|| format!("Failed to normalize {}", file.display()))?;
            write_output(output.as_ref(), &csv)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            println!("# Config file: {}", config_path.display());
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
