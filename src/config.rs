use std::net::SocketAddr;

/// Connection settings for the accounting backend.
#[derive(Debug, Clone)]
pub struct AccountingApiConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

/// Tunables for report routing and caching.
#[derive(Debug, Clone)]
pub struct ReportServiceConfig {
    /// Cache lifetime used when a request does not set `cache_duration`
    pub default_cache_minutes: u32,
    /// Value returned by the data-volume estimator stub
    pub data_volume_estimate: u64,
}

impl Default for ReportServiceConfig {
    fn default() -> Self {
        Self {
            default_cache_minutes: 15,
            data_volume_estimate: 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub accounting_api: AccountingApiConfig,
    pub reports: ReportServiceConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let base_url = std::env::var("ACCOUNTING_API_URL")
            .map_err(|_| "ACCOUNTING_API_URL not set".to_string())?;

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BIND_ADDR: {}", e))?;

        let defaults = ReportServiceConfig::default();

        Ok(Self {
            bind_addr,
            accounting_api: AccountingApiConfig {
                base_url,
                api_token: std::env::var("ACCOUNTING_API_TOKEN").ok(),
                timeout_secs: parse_env("ACCOUNTING_API_TIMEOUT_SECS", 30)?,
            },
            reports: ReportServiceConfig {
                default_cache_minutes: parse_env(
                    "REPORT_CACHE_MINUTES",
                    defaults.default_cache_minutes,
                )?,
                data_volume_estimate: parse_env(
                    "REPORT_DATA_VOLUME_ESTIMATE",
                    defaults.data_volume_estimate,
                )?,
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("Invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}
