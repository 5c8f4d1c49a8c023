use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log sink settings, read from the environment before anything else starts.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    /// Print the emitting module next to each line.
    pub show_targets: bool,
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn".to_string()),
            show_targets: env_flag("LOG_TARGETS", true),
            loki_enabled: env_flag("LOKI_ENABLED", false),
            loki_url: std::env::var("LOKI_URL").ok().filter(|u| !u.trim().is_empty()),
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "pandu-terminal".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        EnvFilter::try_new(&self.filter)
            .map(|_| ())
            .map_err(|e| format!("invalid RUST_LOG '{}': {}", self.filter, e))
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Installs the global subscriber: console output always, plus a Loki
/// shipper when the `loki` feature is built and `LOKI_ENABLED` is set.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.filter)?)
        .with(fmt::layer().with_target(config.show_targets));

    #[cfg(feature = "loki")]
    let registry = registry.with(loki_layer(&config)?);

    registry.try_init()?;

    tracing::info!(
        "📊 Logging initialized for {} ({}), loki: {}",
        config.service_name,
        config.environment,
        config.loki_enabled
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig) -> Result<Option<tracing_loki::Layer>, Box<dyn std::error::Error>> {
    let Some(loki_url) = config.loki_url.as_deref().filter(|_| config.loki_enabled) else {
        return Ok(None);
    };

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url::Url::parse(loki_url)?)?;

    // ships buffered lines in the background
    tokio::spawn(task);
    Ok(Some(layer))
}
