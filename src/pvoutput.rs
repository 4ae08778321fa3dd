//! PVOutput publishing
//!
//! Sends one live status per run through the `addstatus.jsp` service:
//! `d`/`t` date and time, `v2` power, and optionally `v5` temperature and
//! `v6` voltage.

use crate::aggregate::Aggregate;
use crate::config::PvOutputConfig;
use crate::error::{HeliosError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use chrono::{DateTime, TimeZone};
use std::time::Duration;

const API_KEY_HEADER: &str = "X-Pvoutput-Apikey";
const SYSTEM_ID_HEADER: &str = "X-Pvoutput-SystemId";

/// Values for one PVOutput status
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// `YYYYMMDD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub power_w: i64,
    /// Whole degrees
    pub temperature_c: Option<i64>,
    /// Volts, one decimal
    pub voltage: Option<f64>,
}

impl StatusUpdate {
    /// Status for `aggregate` stamped with `at` in its own timezone.
    pub fn from_aggregate<Tz>(aggregate: &Aggregate, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        #[allow(clippy::cast_possible_truncation)]
        let temperature_c = aggregate.avg_temp.map(|t| t.round_ties_even() as i64);
        Self {
            date: at.format("%Y%m%d").to_string(),
            time: at.format("%H:%M").to_string(),
            power_w: aggregate.total_for_output,
            temperature_c,
            voltage: aggregate.avg_volt.map(|v| (v * 10.0).round() / 10.0),
        }
    }

    /// Form body fields in the order PVOutput documents them.
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("d", self.date.clone()),
            ("t", self.time.clone()),
            ("v2", self.power_w.to_string()),
        ];
        if let Some(t) = self.temperature_c {
            fields.push(("v5", t.to_string()));
        }
        if let Some(v) = self.voltage {
            fields.push(("v6", format!("{:.1}", v)));
        }
        fields
    }
}

/// Destination for status updates
#[async_trait::async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Publish one status; returns the service's response text.
    async fn publish(&self, update: &StatusUpdate) -> Result<String>;
}

/// PVOutput HTTP client
///
/// Credentials are checked when publishing, so a misconfigured publisher
/// fails the publish step only and never the read that precedes it.
pub struct PvOutputClient {
    api_key: Option<String>,
    system_id: Option<String>,
    url: String,
    timeout: Duration,
    logger: StructuredLogger,
}

fn credential(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl PvOutputClient {
    pub fn new(
        api_key: Option<&str>,
        system_id: Option<&str>,
        url: String,
        timeout: Duration,
    ) -> Self {
        let system_id = credential(system_id);
        let logger = get_logger_with_context(LogContext::new("pvoutput").with_field(
            "system_id",
            system_id.clone().unwrap_or_else(|| "unset".to_string()),
        ));
        Self {
            api_key: credential(api_key),
            system_id,
            url,
            timeout,
            logger,
        }
    }

    pub fn from_config(config: &PvOutputConfig) -> Self {
        Self::new(
            config.api_key.as_deref(),
            config.system_id.as_deref(),
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.api_key.as_deref(), self.system_id.as_deref()) {
            (Some(api_key), Some(system_id)) => Ok((api_key, system_id)),
            _ => Err(HeliosError::publish(
                "Missing PVOutput credentials (pvoutput.api_key, pvoutput.system_id)",
            )),
        }
    }
}

#[async_trait::async_trait]
impl StatusPublisher for PvOutputClient {
    async fn publish(&self, update: &StatusUpdate) -> Result<String> {
        use reqwest::header::USER_AGENT;

        let (api_key, system_id) = self.credentials()?;
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| HeliosError::publish(e.to_string()))?;
        let resp = client
            .post(&self.url)
            .header(API_KEY_HEADER, api_key)
            .header(SYSTEM_ID_HEADER, system_id)
            .header(USER_AGENT, concat!("helios/", env!("HELIOS_VERSION")))
            .form(&update.form())
            .send()
            .await
            .map_err(|e| HeliosError::publish(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| HeliosError::publish(e.to_string()))?;
        let body = body.trim().to_string();

        if !status.is_success() {
            self.logger
                .error(&format!("PVOutput rejected status: {} {}", status, body));
            return Err(HeliosError::publish(format!("HTTP {}: {}", status, body)));
        }

        self.logger.info(&format!(
            "Published {} W at {} {}",
            update.power_w, update.date, update.time
        ));
        Ok(body)
    }
}
