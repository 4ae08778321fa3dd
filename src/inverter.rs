//! Fetching the ECU status page

use crate::config::Config;
use crate::error::{HeliosError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use std::time::Duration;

/// Something that can produce the inverter status page HTML
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// URL reported as the data source
    fn source(&self) -> String;

    async fn fetch_page(&self) -> Result<String>;
}

/// HTTP client for the ECU web interface
pub struct InverterClient {
    url: String,
    timeout: Duration,
    logger: StructuredLogger,
}

impl InverterClient {
    pub fn new(url: String, timeout: Duration) -> Self {
        let logger = get_logger_with_context(LogContext::new("inverter").with_field("url", url.clone()));
        Self {
            url,
            timeout,
            logger,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.url(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait::async_trait]
impl PageSource for InverterClient {
    fn source(&self) -> String {
        self.url.clone()
    }

    async fn fetch_page(&self) -> Result<String> {
        use reqwest::header::USER_AGENT;

        self.logger.debug("Fetching status page");
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let resp = client
            .get(&self.url)
            .header(USER_AGENT, concat!("helios/", env!("HELIOS_VERSION")))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            self.logger
                .error(&format!("Status page request failed: {}", status));
            return Err(HeliosError::fetch(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        let body = resp.text().await?;
        self.logger
            .debug(&format!("Received {} bytes", body.len()));
        Ok(body)
    }
}

/// Fixed page contents; used for `--input` runs against a saved page.
pub struct StaticPage {
    source: String,
    html: String,
}

impl StaticPage {
    pub fn new(source: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            html: html.into(),
        }
    }

    /// Read a saved page from disk
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let html = std::fs::read_to_string(path)
            .map_err(|e| HeliosError::fetch(format!("Cannot read {}: {}", path.display(), e)))?;
        Ok(Self::new(format!("file://{}", path.display()), html))
    }
}

#[async_trait::async_trait]
impl PageSource for StaticPage {
    fn source(&self) -> String {
        self.source.clone()
    }

    async fn fetch_page(&self) -> Result<String> {
        Ok(self.html.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_uses_config_url_and_timeout() {
        let config = Config {
            host: "10.0.0.7".to_string(),
            timeout_secs: 3,
            ..Config::default()
        };
        let client = InverterClient::from_config(&config);
        assert_eq!(client.source(), "http://10.0.0.7/cgi-bin/parameters");
        assert_eq!(client.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unreachable_host_is_fetch_error() {
        // Port 9 on localhost is closed on CI hosts; the connect fails fast.
        let client = InverterClient::new(
            "http://127.0.0.1:9/cgi-bin/parameters".to_string(),
            Duration::from_secs(2),
        );
        let err = client.fetch_page().await.unwrap_err();
        assert!(matches!(err, HeliosError::Fetch { .. }));
    }

    #[test]
    fn static_page_from_missing_file_is_fetch_error() {
        let err = StaticPage::from_file(std::path::Path::new("/nonexistent/page.html"))
            .err()
            .unwrap();
        assert!(matches!(err, HeliosError::Fetch { .. }));
    }
}
