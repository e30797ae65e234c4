use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;

/// Builds the process subscriber. Installed by the caller as a scoped
/// default, so nothing here touches global state.
pub fn subscriber(level: &str) -> Result<impl Subscriber + Send + Sync + 'static, ConfigError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| ConfigError::LogLevel(format!("{level}: {e}")))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish())
}
