#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};

use authn_client::{AuthError, Transport};

/// Build a compact three-segment token with the given timestamp claims.
pub fn raw_token(iat: i64, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "RS256", "typ": "JWT"}).to_string());
    let claims =
        URL_SAFE_NO_PAD.encode(json!({"iat": iat, "exp": exp, "sub": "account-1"}).to_string());
    format!("{header}.{claims}.signature")
}

/// Envelope success carrying a freshly issued token.
pub fn token_result(raw: &str) -> Result<Option<Value>, AuthError> {
    Ok(Some(json!({ "id_token": raw })))
}

/// Scripted [`Transport`]: responses are served in order and calls are
/// recorded as `(verb, path)` pairs. An exhausted script answers
/// `Ok(None)`.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Option<Value>, AuthError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, response: Result<Option<Value>, AuthError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, verb: &str, path: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((verb.to_string(), path.to_string()));
    }

    fn next(&self) -> Result<Option<Value>, AuthError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str, _query: &[(&str, &str)]) -> Result<Option<Value>, AuthError> {
        self.record("GET", path);
        self.next()
    }

    async fn post(&self, path: &str, _form: &[(&str, &str)]) -> Result<Option<Value>, AuthError> {
        self.record("POST", path);
        self.next()
    }

    async fn delete(&self, path: &str) -> Result<Option<Value>, AuthError> {
        self.record("DELETE", path);
        self.next()
    }
}
