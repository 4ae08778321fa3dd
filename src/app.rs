//! One read → aggregate → publish cycle
//!
//! A timer invokes the binary once per interval; this module is everything
//! that run does apart from argument parsing and printing.

use crate::aggregate::{Aggregate, aggregate};
use crate::config::Config;
use crate::error::{EXIT_OK, HeliosError, Result};
use crate::extract::FieldExtractor;
use crate::inverter::PageSource;
use crate::logging::{LogContext, get_logger_with_context};
use crate::pvoutput::{StatusPublisher, StatusUpdate};
use crate::reading::{Reading, read_inverter_page};
use crate::report::Report;
use chrono::{DateTime, FixedOffset, Local, Utc};

/// What happened to the optional publish step
#[derive(Debug)]
pub enum PublishOutcome {
    Skipped,
    Published { response: String },
    Failed(HeliosError),
}

/// Result of a run whose read succeeded
#[derive(Debug)]
pub struct RunOutcome {
    pub readings: Vec<Reading>,
    pub aggregate: Aggregate,
    pub report: Report,
    pub publish: PublishOutcome,
}

impl RunOutcome {
    /// Exit code for the whole run; only the publish step can still fail here.
    pub fn exit_code(&self) -> i32 {
        match &self.publish {
            PublishOutcome::Failed(e) => e.exit_code(),
            PublishOutcome::Skipped | PublishOutcome::Published { .. } => EXIT_OK,
        }
    }
}

/// `now` on the clock the report and PVOutput use.
pub fn local_timestamp(config: &Config, now: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
    Ok(match config.tz()? {
        Some(tz) => now.with_timezone(&tz).fixed_offset(),
        None => now.with_timezone(&Local).fixed_offset(),
    })
}

/// Read the inverter page, aggregate it and, when a publisher is given,
/// publish the result.
///
/// Errors before the report exists (configuration, fetch, table, empty rows)
/// are returned as `Err`. A publish failure is reported in the outcome next to
/// the finished report.
pub async fn run_once(
    config: &Config,
    source: &dyn PageSource,
    publisher: Option<&dyn StatusPublisher>,
    now: DateTime<Utc>,
) -> Result<RunOutcome> {
    let logger = get_logger_with_context(LogContext::new("app").with_host(&config.host));

    let policy = config.scaling_policy()?;
    let timestamp = local_timestamp(config, now)?;
    let extractor = FieldExtractor::new()?;

    let html = source.fetch_page().await?;
    let readings = read_inverter_page(&html, &extractor)?;
    let aggregate = aggregate(&readings, config.expected_panels(), policy);
    logger.info(&format!(
        "{} of {} inverter(s) reporting, total {} W",
        aggregate.received_count,
        readings.len(),
        aggregate.total_for_output
    ));
    if let Some(estimated) = aggregate.estimated_total {
        logger.info(&format!(
            "Scaled {} W to {} W for {} expected panel(s)",
            aggregate.total_raw,
            estimated,
            aggregate.expected_count.unwrap_or_default()
        ));
    }

    let report = Report::new(&source.source(), timestamp, &aggregate);

    let publish = match publisher {
        None => PublishOutcome::Skipped,
        Some(publisher) => {
            let update = StatusUpdate::from_aggregate(&aggregate, &timestamp);
            match publisher.publish(&update).await {
                Ok(response) => PublishOutcome::Published { response },
                Err(e) => {
                    logger.error(&format!("Publishing failed: {}", e));
                    PublishOutcome::Failed(e)
                }
            }
        }
    };

    Ok(RunOutcome {
        readings,
        aggregate,
        report,
        publish,
    })
}
