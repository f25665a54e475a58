//! Operation facade over the identity service endpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{AuthError, FieldError};
use crate::manager::SessionManager;
use crate::store::SessionStore;
use crate::transport::{HttpTransport, Transport};
use crate::types::{Credentials, PasswordScore, SignupForm, TokenResponse};

/// Client facade: one method per remote operation.
///
/// Successful authentication responses flow into the [`SessionManager`],
/// which persists the token and keeps it fresh in the background. The
/// facade never touches the store directly.
pub struct AuthnClient {
    transport: Arc<dyn Transport>,
    manager: Arc<SessionManager>,
    signup_inflight: AtomicBool,
}

impl AuthnClient {
    /// Build a client talking to `config.issuer()` over HTTP, persisting
    /// the session in `store`.
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, AuthError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(transport, store))
    }

    /// Build a client over a custom [`Transport`].
    pub fn with_transport(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Self {
        let manager = SessionManager::new(Arc::clone(&transport), store);
        Self {
            transport,
            manager,
            signup_inflight: AtomicBool::new(false),
        }
    }

    /// Load any persisted session and start background maintenance.
    pub async fn initialize(&self) -> Result<(), AuthError> {
        self.manager.initialize().await
    }

    /// Raw token of the live session, if any.
    pub async fn session(&self) -> Option<String> {
        self.manager.session().await
    }

    /// The session lifecycle manager, for direct inspection.
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Create an account and start a session.
    ///
    /// Single-flight: a second signup while one is outstanding rejects
    /// with [`AuthError::DuplicateRequest`] without reaching the wire.
    /// This guards against double form submits, not general rate limits.
    pub async fn signup(&self, form: &SignupForm) -> Result<(), AuthError> {
        let guard = InflightGuard::acquire(&self.signup_inflight)?;
        let result = self.transport.post("/accounts", &form.params()).await;
        drop(guard);
        let raw = token_from(result?)?;
        self.manager.update_and_maintain(&raw).await
    }

    /// Whether `email` is free to register.
    ///
    /// The service reports a taken address as a field error
    /// (`email=TAKEN`); that one answer maps to `Ok(false)`. Any other
    /// error propagates.
    pub async fn is_available(&self, email: &str) -> Result<bool, AuthError> {
        let result = self
            .transport
            .get("/accounts/available", &[("email", email)])
            .await;
        match result {
            Ok(Some(value)) => serde_json::from_value(value).map_err(|err| {
                AuthError::Transport(format!("unexpected availability result: {err}"))
            }),
            Ok(None) => Err(AuthError::Transport(
                "empty availability result".to_string(),
            )),
            Err(AuthError::Validation(errors)) if errors.iter().any(is_taken) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Log in with email and password.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let value = self
            .transport
            .post(
                "/session",
                &[
                    ("email", credentials.email.as_str()),
                    ("password", credentials.password.as_str()),
                ],
            )
            .await?;
        let raw = token_from(value)?;
        self.manager.update_and_maintain(&raw).await
    }

    /// End the session on the server, then locally.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.transport.delete("/session").await?;
        self.manager.end_session().await
    }

    /// Ask the service to email a password reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.transport
            .get("/password/reset", &[("email", email)])
            .await?;
        Ok(())
    }

    /// Change the password of the logged-in account.
    pub async fn change_password(
        &self,
        password: &str,
        current_password: &str,
    ) -> Result<(), AuthError> {
        let value = self
            .transport
            .post(
                "/password",
                &[("password", password), ("currentPassword", current_password)],
            )
            .await?;
        let raw = token_from(value)?;
        self.manager.update_and_maintain(&raw).await
    }

    /// Set a new password using a reset token from
    /// [`Self::request_password_reset`].
    pub async fn reset_password(&self, password: &str, token: &str) -> Result<(), AuthError> {
        let value = self
            .transport
            .post("/password", &[("password", password), ("token", token)])
            .await?;
        let raw = token_from(value)?;
        self.manager.update_and_maintain(&raw).await
    }

    /// Ask the service to email a one-time session token.
    pub async fn request_session_token(&self, email: &str) -> Result<(), AuthError> {
        self.transport
            .get("/session/token", &[("email", email)])
            .await?;
        Ok(())
    }

    /// Exchange an emailed one-time token for a session.
    pub async fn session_token_login(&self, token: &str) -> Result<(), AuthError> {
        let value = self
            .transport
            .post("/session/token", &[("token", token)])
            .await?;
        let raw = token_from(value)?;
        self.manager.update_and_maintain(&raw).await
    }

    /// Score a candidate password against the service's strength policy.
    pub async fn password_score(&self, password: &str) -> Result<PasswordScore, AuthError> {
        let value = self
            .transport
            .post("/password/score", &[("password", password)])
            .await?;
        match value {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| AuthError::Transport(format!("unexpected score result: {err}"))),
            None => Err(AuthError::Transport("empty score result".to_string())),
        }
    }
}

fn token_from(value: Option<Value>) -> Result<String, AuthError> {
    let value =
        value.ok_or_else(|| AuthError::Transport("response carried no token".to_string()))?;
    let response: TokenResponse = serde_json::from_value(value)
        .map_err(|err| AuthError::Transport(format!("unexpected token response: {err}")))?;
    Ok(response.id_token)
}

fn is_taken(error: &FieldError) -> bool {
    error.field.as_deref() == Some("email") && error.message == "TAKEN"
}

/// Clears the in-flight flag when the guarded call settles, success or
/// failure — including early returns and cancellation.
struct InflightGuard<'a>(&'a AtomicBool);

impl<'a> InflightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AuthError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(AuthError::DuplicateRequest);
        }
        Ok(Self(flag))
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
