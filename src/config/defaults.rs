use super::*;

/// Status page path on APS ECU-R/ECU-C units
pub const DEFAULT_PATH: &str = "/cgi-bin/parameters";

/// ECU web servers are slow but local; anything longer means it is offline
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// PVOutput add-status endpoint
pub const DEFAULT_PVOUTPUT_URL: &str = "https://pvoutput.org/service/r2/addstatus.jsp";

const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 10;

impl Default for PvOutputConfig {
    fn default() -> Self {
        Self {
            publish: false,
            api_key: None,
            system_id: None,
            url: DEFAULT_PVOUTPUT_URL.to_string(),
            timeout_secs: DEFAULT_PUBLISH_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: None,
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            path: DEFAULT_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            timezone: None,
            scale_missing: false,
            expected_count: None,
            pvoutput: PvOutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
