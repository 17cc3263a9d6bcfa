use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// The core never reads these directly: the binary converts them into
/// plain values (durations, counts, toggles) when wiring the components.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: ServerSettings,
    pub identity: IdentitySettings,
    pub heartbeat: HeartbeatSettings,
    pub verifier: VerifierSettings,
    pub broker: BrokerSettings,
    pub cluster: ClusterSettings,
    pub logging: LoggingSettings,
}

/// Address the WebSocket listener binds to.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Service group and instance id. Unset values fall back to `"Unknown"`
/// for the service and a fresh UUID for the instance.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IdentitySettings {
    pub service_id: Option<String>,
    pub instance_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HeartbeatSettings {
    pub period_secs: u64,
    pub timeout_secs: u64,
    /// Log a summary line on every sweep.
    pub logger: bool,
    /// Ping surviving connections on every sweep.
    pub ping: bool,
}

impl HeartbeatSettings {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Size and age bounds of the duplicate-suppression window.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl VerifierSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// In-process broker parameters.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub deliveries: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    pub instances: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub identity: Option<PartialIdentitySettings>,
    pub heartbeat: Option<PartialHeartbeatSettings>,
    pub verifier: Option<PartialVerifierSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub cluster: Option<PartialClusterSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialIdentitySettings {
    pub service_id: Option<String>,
    pub instance_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialHeartbeatSettings {
    pub period_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub logger: Option<bool>,
    pub ping: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialVerifierSettings {
    pub capacity: Option<usize>,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub deliveries: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialClusterSettings {
    pub instances: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            identity: IdentitySettings {
                service_id: None,
                instance_id: None,
            },
            heartbeat: HeartbeatSettings {
                period_secs: 10,
                timeout_secs: 30,
                logger: true,
                ping: true,
            },
            verifier: VerifierSettings {
                capacity: 10_000,
                ttl_secs: 300,
            },
            broker: BrokerSettings { deliveries: 1 },
            cluster: ClusterSettings { instances: 1 },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Applies every value present in `partial` on top of `self`.
    pub fn merge(self, partial: PartialSettings) -> Self {
        let server = partial.server.unwrap_or_default();
        let identity = partial.identity.unwrap_or_default();
        let heartbeat = partial.heartbeat.unwrap_or_default();
        let verifier = partial.verifier.unwrap_or_default();
        let broker = partial.broker.unwrap_or_default();
        let cluster = partial.cluster.unwrap_or_default();
        let logging = partial.logging.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(self.server.host),
                port: server.port.unwrap_or(self.server.port),
            },
            identity: IdentitySettings {
                service_id: identity.service_id.or(self.identity.service_id),
                instance_id: identity.instance_id.or(self.identity.instance_id),
            },
            heartbeat: HeartbeatSettings {
                period_secs: heartbeat.period_secs.unwrap_or(self.heartbeat.period_secs),
                timeout_secs: heartbeat.timeout_secs.unwrap_or(self.heartbeat.timeout_secs),
                logger: heartbeat.logger.unwrap_or(self.heartbeat.logger),
                ping: heartbeat.ping.unwrap_or(self.heartbeat.ping),
            },
            verifier: VerifierSettings {
                capacity: verifier.capacity.unwrap_or(self.verifier.capacity),
                ttl_secs: verifier.ttl_secs.unwrap_or(self.verifier.ttl_secs),
            },
            broker: BrokerSettings {
                deliveries: broker.deliveries.unwrap_or(self.broker.deliveries),
            },
            cluster: ClusterSettings {
                instances: cluster.instances.unwrap_or(self.cluster.instances),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(self.logging.level),
            },
        }
    }
}
