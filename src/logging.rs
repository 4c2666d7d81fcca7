//! Tracing setup: console output always, Loki shipping when configured.

use anyhow::anyhow;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,unified_reports=debug";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub service_name: String,
    pub environment: String,
    pub filter: String,
    /// Loki push endpoint; `None` keeps logs on the console only.
    pub loki_url: Option<url::Url>,
}

impl LoggingConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, rejecting a Loki switch without a URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let loki_enabled = lookup("LOKI_ENABLED")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let loki_url = if loki_enabled {
            let raw = lookup("LOKI_URL")
                .ok_or_else(|| anyhow!("LOKI_ENABLED is true but LOKI_URL is not set"))?;
            Some(url::Url::parse(&raw)?)
        } else {
            None
        };

        Ok(Self {
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "unified-reports".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            loki_url,
        })
    }
}

/// Installs the global subscriber. Must run inside the tokio runtime when Loki is on.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.filter)?)
        .with(tracing_subscriber::fmt::layer());

    #[cfg(feature = "loki")]
    {
        let loki = config
            .loki_url
            .clone()
            .map(|url| loki_layer(config, url))
            .transpose()?;
        registry.with(loki).try_init()?;
    }

    #[cfg(not(feature = "loki"))]
    {
        registry.try_init()?;
        if config.loki_url.is_some() {
            tracing::warn!("LOKI_URL set but the binary was built without the loki feature");
        }
    }

    match &config.loki_url {
        Some(url) => tracing::info!("📊 Logging to console and Loki at {} ({})", url, config.environment),
        None => tracing::info!("📊 Console logging initialized ({})", config.environment),
    }
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig, url: url::Url) -> anyhow::Result<tracing_loki::Layer> {
    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    tokio::spawn(task);
    Ok(layer)
}
