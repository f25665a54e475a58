//! Bearer token decoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AuthError;

/// Decoded session token issued by the identity service.
///
/// The wire form is three dot-separated base64url segments (header,
/// claims, signature). Only the claims segment is decoded; the signature
/// is never verified here — the service is the authority, this client
/// just needs the timestamps.
#[derive(Debug, Clone)]
pub struct Token {
    raw: String,
    claims: Claims,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    iat: i64,
    exp: i64,
    #[serde(default)]
    sub: Option<Value>,
}

impl Token {
    /// Decode a raw compact token string.
    ///
    /// Fails with [`AuthError::MalformedToken`] when the string is not
    /// exactly three non-empty segments, when the claims segment is not
    /// base64url JSON, or when `iat`/`exp` are missing or non-integer.
    pub fn decode(raw: &str) -> Result<Self, AuthError> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(AuthError::MalformedToken("invalid structure".to_string()));
        }
        let payload = URL_SAFE_NO_PAD
            .decode(segments[1])
            .map_err(|_| AuthError::MalformedToken("invalid encoding".to_string()))?;
        let claims: Claims = serde_json::from_slice(&payload)
            .map_err(|_| AuthError::MalformedToken("invalid encoding".to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            claims,
        })
    }

    /// The compact string this token was decoded from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Issuance time, seconds since the epoch.
    pub fn issued_at(&self) -> i64 {
        self.claims.iat
    }

    /// Expiry time, seconds since the epoch.
    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    /// Subject claim, stringified. Services differ on string vs numeric
    /// account ids, so both are accepted.
    pub fn subject(&self) -> Option<String> {
        match &self.claims.sub {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Renewal interval in seconds: half the validity window, floored.
    /// The session is refreshed at `iat + half_life`, not at expiry.
    pub fn half_life(&self) -> i64 {
        (self.claims.exp - self.claims.iat).div_euclid(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    fn raw_token(claims: Value) -> String {
        let header = encode(&json!({"alg": "RS256", "typ": "JWT"}));
        format!("{header}.{}.signature", encode(&claims))
    }

    #[test]
    fn decodes_valid_token() {
        let raw = raw_token(json!({"iat": 1000, "exp": 4600, "sub": "account-1"}));
        let token = Token::decode(&raw).unwrap();
        assert_eq!(token.raw(), raw);
        assert_eq!(token.issued_at(), 1000);
        assert_eq!(token.expires_at(), 4600);
        assert_eq!(token.subject().as_deref(), Some("account-1"));
        assert_eq!(token.half_life(), 1800);
    }

    #[test]
    fn half_life_floors_odd_windows() {
        let raw = raw_token(json!({"iat": 0, "exp": 7}));
        assert_eq!(Token::decode(&raw).unwrap().half_life(), 3);
    }

    #[test]
    fn numeric_subject_is_stringified() {
        let raw = raw_token(json!({"iat": 0, "exp": 10, "sub": 42}));
        assert_eq!(Token::decode(&raw).unwrap().subject().as_deref(), Some("42"));
    }

    #[test]
    fn missing_subject_is_none() {
        let raw = raw_token(json!({"iat": 0, "exp": 10}));
        assert_eq!(Token::decode(&raw).unwrap().subject(), None);
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for raw in ["", "onesegment", "two.segments", "a.b.c.d"] {
            match Token::decode(raw) {
                Err(AuthError::MalformedToken(reason)) => {
                    assert_eq!(reason, "invalid structure", "input: {raw:?}");
                }
                other => panic!("expected MalformedToken for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_empty_segment() {
        match Token::decode("a..c") {
            Err(AuthError::MalformedToken(reason)) => assert_eq!(reason, "invalid structure"),
            other => panic!("expected MalformedToken, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_base64_payload() {
        match Token::decode("a.!!!.c") {
            Err(AuthError::MalformedToken(reason)) => assert_eq!(reason, "invalid encoding"),
            other => panic!("expected MalformedToken, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_json_payload() {
        let payload = URL_SAFE_NO_PAD.encode("not json");
        match Token::decode(&format!("a.{payload}.c")) {
            Err(AuthError::MalformedToken(reason)) => assert_eq!(reason, "invalid encoding"),
            other => panic!("expected MalformedToken, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_or_non_numeric_claims() {
        for claims in [
            json!({"exp": 10}),
            json!({"iat": 0}),
            json!({"iat": "soon", "exp": 10}),
            json!({"iat": 0, "exp": null}),
        ] {
            let raw = raw_token(claims.clone());
            match Token::decode(&raw) {
                Err(AuthError::MalformedToken(reason)) => {
                    assert_eq!(reason, "invalid encoding", "claims: {claims}");
                }
                other => panic!("expected MalformedToken for {claims}, got {other:?}"),
            }
        }
    }

    #[test]
    fn decode_is_deterministic() {
        let raw = raw_token(json!({"iat": 500, "exp": 900}));
        let first = Token::decode(&raw).unwrap();
        let second = Token::decode(&raw).unwrap();
        assert_eq!(first.issued_at(), second.issued_at());
        assert_eq!(first.expires_at(), second.expires_at());
        assert_eq!(first.half_life(), second.half_life());
    }
}
