//! Request and response value types.

use serde::Deserialize;

/// Registration form for account creation.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl SignupForm {
    pub(crate) fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
        ];
        if let Some(first_name) = &self.first_name {
            params.push(("first_name", first_name));
        }
        if let Some(last_name) = &self.last_name {
            params.push(("last_name", last_name));
        }
        if let Some(phone) = &self.phone {
            params.push(("phone", phone));
        }
        params
    }
}

/// Email/password login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Password strength verdict from the scoring endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordScore {
    pub score: u32,
    pub required_score: u32,
}

/// Successful authentication responses carry the session token here.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub id_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_params_skip_absent_fields() {
        let form = SignupForm {
            email: "me@example.com".to_string(),
            password: "hunter2".to_string(),
            first_name: Some("Sam".to_string()),
            ..Default::default()
        };
        assert_eq!(
            form.params(),
            vec![
                ("email", "me@example.com"),
                ("password", "hunter2"),
                ("first_name", "Sam"),
            ]
        );
    }

    #[test]
    fn password_score_uses_camel_case_wire_names() {
        let score: PasswordScore =
            serde_json::from_str(r#"{"score": 3, "requiredScore": 2}"#).unwrap();
        assert_eq!(
            score,
            PasswordScore {
                score: 3,
                required_score: 2,
            }
        );
    }
}
