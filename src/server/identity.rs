use uuid::Uuid;

/// Placeholder used wherever a service or instance id is unset. Part of the
/// topic naming contract: every sibling must substitute the same literal.
pub const UNKNOWN: &str = "Unknown";

/// Immutable identity of the running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    service_id: Option<String>,
    instance_id: Option<String>,
}

impl ServerIdentity {
    pub fn new(service_id: Option<String>, instance_id: Option<String>) -> Self {
        Self {
            service_id: service_id.filter(|s| !s.is_empty()),
            instance_id: instance_id.filter(|s| !s.is_empty()),
        }
    }

    /// Identity for `service_id` with a freshly generated instance id.
    pub fn generate(service_id: impl Into<String>) -> Self {
        Self::new(Some(service_id.into()), Some(Uuid::new_v4().to_string()))
    }

    pub fn service_id(&self) -> &str {
        self.service_id.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn instance_id(&self) -> &str {
        self.instance_id.as_deref().unwrap_or(UNKNOWN)
    }
}
