mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::config::settings::PartialSettings;

pub use settings::{
    BrokerSettings, ClusterSettings, HeartbeatSettings, IdentitySettings, LoggingSettings,
    ServerSettings, Settings, VerifierSettings,
};

/// Prefix of the environment variables read by `load_config`, e.g.
/// `CONNLB_HEARTBEAT__TIMEOUT_SECS=60`.
pub const ENV_PREFIX: &str = "CONNLB";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values and validates the result
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = Settings::default().merge(partial);
    validate(&settings)?;
    Ok(settings)
}

/// Rejects settings the components cannot run with.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::Message(msg.to_string()));

    if settings.heartbeat.period_secs == 0 {
        return invalid("heartbeat.period_secs must be greater than zero");
    }
    if settings.heartbeat.timeout_secs == 0 {
        return invalid("heartbeat.timeout_secs must be greater than zero");
    }
    if settings.heartbeat.timeout_secs < settings.heartbeat.period_secs {
        return invalid("heartbeat.timeout_secs must not be shorter than heartbeat.period_secs");
    }
    if settings.verifier.capacity == 0 {
        return invalid("verifier.capacity must be greater than zero");
    }
    if settings.broker.deliveries == 0 {
        return invalid("broker.deliveries must be greater than zero");
    }
    if settings.cluster.instances == 0 {
        return invalid("cluster.instances must be greater than zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests;
