use chrono::{DateTime, Utc};
use helios::app::{PublishOutcome, run_once};
use helios::config::Config;
use helios::error::{EXIT_EMPTY, EXIT_FETCH, EXIT_OK, EXIT_PUBLISH, HeliosError, Result};
use helios::extract::FieldExtractor;
use helios::inverter::{PageSource, StaticPage};
use helios::pvoutput::{StatusPublisher, StatusUpdate};
use helios::reading::read_inverter_page;
use helios::report::{Report, render_text};
use std::path::Path;
use std::sync::Mutex;

const PAGE: &str = include_str!("fixtures/ecu_parameters.html");

fn config() -> Config {
    Config {
        host: "192.168.1.50".to_string(),
        timezone: Some("Europe/Amsterdam".to_string()),
        ..Config::default()
    }
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T10:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<StatusUpdate>>,
}

#[async_trait::async_trait]
impl StatusPublisher for RecordingPublisher {
    async fn publish(&self, update: &StatusUpdate) -> Result<String> {
        self.sent.lock().unwrap().push(update.clone());
        Ok("OK 200: Added Status".to_string())
    }
}

struct RejectingPublisher;

#[async_trait::async_trait]
impl StatusPublisher for RejectingPublisher {
    async fn publish(&self, _update: &StatusUpdate) -> Result<String> {
        Err(HeliosError::publish("HTTP 401: Unauthorized 401: Invalid API Key"))
    }
}

struct FailingSource;

#[async_trait::async_trait]
impl PageSource for FailingSource {
    fn source(&self) -> String {
        "http://192.168.1.50/cgi-bin/parameters".to_string()
    }

    async fn fetch_page(&self) -> Result<String> {
        Err(HeliosError::fetch("connection refused"))
    }
}

#[test]
fn saved_page_yields_all_inverter_rows() {
    let x = FieldExtractor::new().unwrap();
    let readings = read_inverter_page(PAGE, &x).unwrap();
    assert_eq!(readings.len(), 3);

    assert_eq!(readings[0].id, "408000012345-1");
    assert_eq!(readings[0].watts, Some(120));
    assert_eq!(readings[0].volt, Some(236.0));
    assert_eq!(readings[0].temp, Some(31.0));

    // Five cells only; the date cell spans from the row above.
    assert_eq!(readings[1].watts, Some(118));
    assert_eq!(readings[1].temp, Some(30.0));

    assert_eq!(readings[2].id, "408000067890-1");
    assert_eq!(readings[2].watts, None);
    assert_eq!(readings[2].volt, None);
    assert_eq!(readings[2].temp, None);
}

#[tokio::test]
async fn run_without_publisher_reports_raw_total() {
    let page = StaticPage::new("http://192.168.1.50/cgi-bin/parameters", PAGE);
    let outcome = run_once(&config(), &page, None, now()).await.unwrap();

    assert!(matches!(outcome.publish, PublishOutcome::Skipped));
    assert_eq!(outcome.exit_code(), EXIT_OK);

    let report = &outcome.report;
    assert_eq!(report.source, "http://192.168.1.50/cgi-bin/parameters");
    assert_eq!(report.timestamp.to_rfc3339(), "2024-06-01T12:30:00+02:00");
    assert_eq!(report.received_count, 2);
    assert_eq!(report.total_watts_raw, 238);
    assert_eq!(report.total_watts_for_output, 238);
    assert_eq!(report.total_watts_estimated, None);
    assert!(!report.scaled_due_to_missing);
    assert_eq!(report.avg_volt_v, Some(235.0));
    assert_eq!(report.avg_temp_c, Some(30.5));
    assert_eq!(report.panels.len(), 3);
    assert_eq!(report.panels["408000067890-1"], None);

    let text = render_text(report, &outcome.readings);
    assert!(text.contains("  408000012345-2: 118 W\n"));
    assert!(text.contains("  408000067890-1: n/a\n"));
    assert!(text.contains("Panels reporting: 2\n"));
    assert!(text.contains("Total power: 238 W\n"));
}

#[tokio::test]
async fn scaled_total_is_published() {
    let mut cfg = config();
    cfg.scale_missing = true;
    cfg.expected_count = Some(4);

    let page = StaticPage::new("saved", PAGE);
    let publisher = RecordingPublisher::default();
    let outcome = run_once(&cfg, &page, Some(&publisher as &dyn StatusPublisher), now()).await.unwrap();

    assert_eq!(outcome.report.total_watts_raw, 238);
    assert_eq!(outcome.report.total_watts_estimated, Some(476));
    assert_eq!(outcome.report.total_watts_for_output, 476);
    assert!(outcome.report.scaled_due_to_missing);
    assert_eq!(outcome.exit_code(), EXIT_OK);
    match &outcome.publish {
        PublishOutcome::Published { response } => assert!(response.starts_with("OK 200")),
        other => panic!("unexpected publish outcome: {other:?}"),
    }

    let sent = publisher.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].date, "20240601");
    assert_eq!(sent[0].time, "12:30");
    assert_eq!(sent[0].power_w, 476);
    // 30.5 rounds half to even.
    assert_eq!(sent[0].temperature_c, Some(30));
    assert_eq!(sent[0].voltage, Some(235.0));
}

#[tokio::test]
async fn publish_failure_keeps_report() {
    let page = StaticPage::new("saved", PAGE);
    let outcome = run_once(&config(), &page, Some(&RejectingPublisher as &dyn StatusPublisher), now())
        .await
        .unwrap();

    assert_eq!(outcome.report.total_watts_for_output, 238);
    assert!(matches!(outcome.publish, PublishOutcome::Failed(HeliosError::Publish { .. })));
    assert_eq!(outcome.exit_code(), EXIT_PUBLISH);
}

#[tokio::test]
async fn fetch_failure_is_returned_before_publishing() {
    let publisher = RecordingPublisher::default();
    let err = run_once(&config(), &FailingSource, Some(&publisher as &dyn StatusPublisher), now())
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), EXIT_FETCH);
    assert!(publisher.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn page_without_inverter_table_fails() {
    let page = StaticPage::new(
        "saved",
        "<html><body><table><tr><td>Lifetime generation</td><td>12 kWh</td></tr></table></body></html>",
    );
    let err = run_once(&config(), &page, None, now()).await.unwrap_err();
    assert!(matches!(err, HeliosError::TableNotFound { .. }));
    assert_eq!(err.exit_code(), EXIT_FETCH);
}

#[tokio::test]
async fn header_only_table_is_empty_result() {
    let page = StaticPage::new(
        "saved",
        "<table><tr><th>Inverter ID</th><th>Current Power</th></tr><tr><td>no data</td></tr></table>",
    );
    let err = run_once(&config(), &page, None, now()).await.unwrap_err();
    assert!(matches!(err, HeliosError::EmptyResult { .. }));
    assert_eq!(err.exit_code(), EXIT_EMPTY);
}

#[tokio::test]
async fn saved_page_file_round_trips_through_json() {
    let page = StaticPage::from_file(Path::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/ecu_parameters.html"
    )))
    .unwrap();
    assert!(page.source().starts_with("file://"));

    let outcome = run_once(&config(), &page, None, now()).await.unwrap();
    let json = outcome.report.to_json().unwrap();
    assert_eq!(Report::from_json(&json).unwrap(), outcome.report);
}
