use std::time::Duration;

use envconfig::Envconfig;

use crate::error::ConfigError;

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "CPSYNC_POLL_URL", default = "http://localhost:8100/api/crontabs")]
    pub poll_url: String,
    #[envconfig(from = "CPSYNC_STATUS_URL", default = "http://localhost:8100/api/status")]
    pub status_url: String,
    #[envconfig(from = "CPSYNC_INTERVAL_SECS", default = "5")]
    pub interval_secs: u64,
    #[envconfig(from = "CPSYNC_HTTP_ADDR", default = "0.0.0.0:8080")]
    pub http_addr: String,
    /// Zero leaves control-plane calls without a deadline.
    #[envconfig(from = "CPSYNC_REQUEST_TIMEOUT_SECS", default = "0")]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Checks the values that parse fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[derive(Envconfig, Debug, Clone)]
pub struct StubConfig {
    #[envconfig(from = "STUB_ADDR", default = "127.0.0.1:8100")]
    pub addr: String,
}
