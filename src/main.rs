use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use helios::app::{PublishOutcome, run_once};
use helios::cli::Cli;
use helios::config::Config;
use helios::error::{EXIT_FETCH, HeliosError};
use helios::inverter::{InverterClient, PageSource, StaticPage};
use helios::logging::init_logging;
use helios::pvoutput::{PvOutputClient, StatusPublisher};
use helios::report::render_text;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<HeliosError>()
                .map_or(EXIT_FETCH, HeliosError::exit_code);
            exit_code(code)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref()).context("Error loading config")?;
    config.validate().context("Invalid config")?;
    init_logging(&config.logging, cli.verbose)?;

    let source: Box<dyn PageSource> = match &cli.input {
        Some(path) => Box::new(StaticPage::from_file(path)?),
        None => Box::new(InverterClient::from_config(&config)),
    };

    let publisher = (config.pvoutput.publish && !cli.no_publish)
        .then(|| PvOutputClient::from_config(&config.pvoutput));

    let outcome = run_once(
        &config,
        source.as_ref(),
        publisher.as_ref().map(|p| p as &dyn StatusPublisher),
        Utc::now(),
    )
    .await?;

    if cli.json {
        println!("{}", outcome.report.to_json()?);
    } else {
        print!("{}", render_text(&outcome.report, &outcome.readings));
    }

    // Publish status never goes to stdout in JSON mode so the output stays parseable.
    match &outcome.publish {
        PublishOutcome::Skipped if cli.json => {}
        PublishOutcome::Skipped => println!("\nPublishing skipped (pvoutput.publish=no)."),
        PublishOutcome::Published { response } if cli.json => {
            eprintln!("PVOutput response: {}", response);
        }
        PublishOutcome::Published { response } => println!("\nPVOutput response: {}", response),
        PublishOutcome::Failed(e) => eprintln!("Error publishing to PVOutput: {}", e),
    }

    Ok(outcome.exit_code())
}
