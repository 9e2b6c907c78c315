mod attempt;
mod browser;
mod cli;
mod config;
mod error;
mod filler;
mod lister;
mod openai;
mod orchestrator;
mod session_log;
mod ui;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use config::BotConfig;
use error::BotError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init => init(),
        Command::Report => report(),
        Command::Run => run(cli.headless, cli.max_jobs, cli.verbose).await,
    }
}

/// Write the commented configuration template, refusing to clobber an
/// existing file.
fn init() -> Result<()> {
    let path = Path::new("autoapply.toml");
    if path.exists() {
        anyhow::bail!("autoapply.toml already exists, not overwriting");
    }
    std::fs::write(path, BotConfig::template())?;
    println!("Wrote autoapply.toml — fill in your credentials and profile.");
    Ok(())
}

/// Print the final report of the most recent session.
fn report() -> Result<()> {
    let config = BotConfig::load()?;
    let (dir, report) = session_log::SessionLogger::latest_report(Path::new(&config.sessions_dir))?;
    println!("Session: {}", dir.display());
    ui::print_report(&report);
    Ok(())
}

async fn run(headless: bool, max_jobs: Option<usize>, verbose: bool) -> Result<()> {
    let mut config = BotConfig::load().context("failed to load autoapply.toml")?;
    if headless {
        config.headless = true;
    }
    config
        .validate_credentials()
        .map_err(BotError::Config)
        .context("run `autoapply init` and fill in autoapply.toml")?;

    let logger_root = Path::new(&config.sessions_dir).to_path_buf();
    let mut logger = session_log::SessionLogger::create(&logger_root)?;
    println!("Session directory: {}", logger.dir().display());

    let session = browser::ChromeSession::launch(config.headless)
        .await
        .context("failed to launch Chrome")?;
    let result = run_session(&session, &config, &mut logger, max_jobs, verbose).await;

    // Best-effort shutdown; the report has already been written.
    if let Err(e) = session.close().await {
        eprintln!("warning: browser shutdown failed: {e}");
    }

    result
}

async fn run_session(
    session: &browser::ChromeSession,
    config: &BotConfig,
    logger: &mut session_log::SessionLogger,
    max_jobs: Option<usize>,
    verbose: bool,
) -> Result<()> {
    let page = session.new_page().await?;

    browser::login(
        &page,
        &config.linkedin_email,
        &config.linkedin_password,
        Duration::from_secs(config.intervention_window_secs),
        Duration::from_secs(config.verification_poll_secs),
    )
    .await?;
    if verbose {
        println!("Logged in as {}", config.linkedin_email);
    }

    let model = openai::OpenAiClient::new(config.openai_api_key.clone());
    let app = orchestrator::ApplicationLoop::new(&page, &model, config);
    let report = app.run(logger, max_jobs).await?;

    ui::print_report(&report);
    Ok(())
}
