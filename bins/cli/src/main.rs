//! Deprecia command-line runner.
//!
//! Loads a scenario, validates every asset, posts the entries that are due and
//! prints each depreciation board followed by the depreciation table.
//!
//! Usage: `deprecia <scenario.json> [--json]`

mod render;
mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use deprecia_core::report::DepreciationReportService;
use deprecia_shared::{AppConfig, AppError};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use scenario::Scenario;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Exit code of the first application error in the chain.
fn exit_code(err: &anyhow::Error) -> u8 {
    let code = err.chain().find_map(|cause| {
        if let Some(app) = cause.downcast_ref::<AppError>() {
            Some(app.exit_code())
        } else if cause.is::<std::io::Error>() || cause.is::<serde_json::Error>() {
            Some(AppError::Input(String::new()).exit_code())
        } else {
            None
        }
    });
    code.and_then(|c| u8::try_from(c).ok()).unwrap_or(1)
}

fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()
        .map_err(AppError::from)
        .context("failed to load configuration")?;

    // Logs go to stderr, the tables to stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        return Err(AppError::Input("usage: deprecia <scenario.json> [--json]".to_string()).into());
    };
    let as_json = args.next().is_some_and(|flag| flag == "--json");

    let scenario = Scenario::load(&path)?;
    let (mut book, assets) = scenario.build(&config.engine)?;
    info!(path = %path.display(), assets = assets.len(), today = %book.today(), "Scenario loaded");

    for asset_id in &assets {
        book.validate(*asset_id)
            .map_err(AppError::from)
            .with_context(|| format!("failed to validate asset {asset_id}"))?;
    }
    let posted = book.post_due_entries().map_err(AppError::from)?;
    info!(count = posted.len(), "Due entries posted");

    let service = DepreciationReportService::with_cache_capacity(config.engine.rate_cache_capacity);
    let report = service
        .generate(&book, &scenario.report.options())
        .map_err(AppError::from)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for asset_id in &assets {
        println!("{}", render::board(&book, *asset_id)?);
    }
    print!("{}", render::report(&report)?);
    Ok(())
}
