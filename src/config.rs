//! Client configuration.

/// Connection settings for the identity service, injected at
/// construction rather than held in module-level state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    issuer: String,
}

impl ClientConfig {
    /// `issuer` is the service's base URL. A single trailing slash is
    /// trimmed so paths can always be appended verbatim.
    pub fn new(issuer: impl Into<String>) -> Self {
        let mut issuer = issuer.into();
        if issuer.ends_with('/') {
            issuer.pop();
        }
        Self { issuer }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}
