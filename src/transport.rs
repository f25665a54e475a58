//! HTTP plumbing for the identity service's response envelope.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{AuthError, FieldError};

/// Verb-level access to the identity service.
///
/// Implementations resolve the service's `{result, errors}` JSON
/// envelope: a success value (if any) comes back as raw JSON, and
/// field-tagged errors as [`AuthError::Validation`]. Credentials ride
/// along ambiently (the session cookie); callers never attach them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>, AuthError>;
    async fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<Option<Value>, AuthError>;
    async fn delete(&self, path: &str) -> Result<Option<Value>, AuthError>;
}

/// reqwest-backed [`Transport`] with a cookie jar for the session cookie.
///
/// POST bodies are form-encoded, per the service contract.
pub struct HttpTransport {
    client: reqwest::Client,
    issuer: String,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, AuthError> {
        if config.issuer().is_empty() {
            return Err(AuthError::Configuration("issuer not set".to_string()));
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| AuthError::Configuration(err.to_string()))?;
        Ok(Self {
            client,
            issuer: config.issuer().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.issuer)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>, AuthError> {
        let response = self.client.get(self.url(path)).query(query).send().await?;
        read_envelope(response).await
    }

    async fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<Option<Value>, AuthError> {
        let response = self.client.post(self.url(path)).form(form).send().await?;
        read_envelope(response).await
    }

    async fn delete(&self, path: &str) -> Result<Option<Value>, AuthError> {
        let response = self.client.delete(self.url(path)).send().await?;
        read_envelope(response).await
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<FieldError>>,
}

async fn read_envelope(response: reqwest::Response) -> Result<Option<Value>, AuthError> {
    let status = response.status();
    let body = response.text().await?;

    if body.len() > 1 {
        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|err| AuthError::Transport(format!("unparseable response body: {err}")))?;
        if let Some(result) = envelope.result {
            return Ok(Some(result));
        }
        if let Some(errors) = envelope.errors {
            tracing::debug!(
                status = status.as_u16(),
                count = errors.len(),
                "identity service rejected request"
            );
            return Err(AuthError::Validation(errors));
        }
    }

    // Bodyless (or envelope-less) responses fall back to the status line.
    if status.is_success() || status.is_redirection() {
        return Ok(None);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(AuthError::Unauthorized);
    }
    Err(AuthError::Transport(
        status
            .canonical_reason()
            .unwrap_or("connection failed")
            .to_string(),
    ))
}
