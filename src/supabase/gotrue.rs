use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AuthIdentity, AuthService, AuthServiceError};

/// GoTrue password-grant client.
#[derive(Clone)]
pub struct GoTrueClient {
    http: Client,
    token_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct GrantResponse {
    user: GrantUser,
}

#[derive(Deserialize)]
struct GrantUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl GoTrueClient {
    pub fn with_client(http: Client, project_url: &str, api_key: &str) -> Self {
        Self {
            http,
            token_url: format!(
                "{}/auth/v1/token?grant_type=password",
                project_url.trim_end_matches('/')
            ),
            api_key: api_key.to_string(),
        }
    }
}

/// Error payload of the token endpoint. Newer servers send `error_code`,
/// older ones only `error_description`.
#[derive(Deserialize, Default)]
struct FailureBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

const REFUSAL_CODES: &[&str] = &["email_not_confirmed", "phone_not_confirmed", "user_banned"];

/// Refusal reason hidden inside a 400 answer, if any.
fn refusal_code(body: &str) -> Option<String> {
    let parsed: FailureBody = serde_json::from_str(body).unwrap_or_default();
    if let Some(code) = parsed
        .error_code
        .filter(|code| REFUSAL_CODES.contains(&code.as_str()))
    {
        return Some(code);
    }
    parsed
        .error_description
        .filter(|d| d.eq_ignore_ascii_case("email not confirmed"))
        .map(|_| "email_not_confirmed".to_string())
}

/// Maps a non-success status from the token endpoint.
fn classify_failure(status: StatusCode, body: String) -> AuthServiceError {
    match status {
        StatusCode::BAD_REQUEST => match refusal_code(&body) {
            Some(code) => AuthServiceError::Refused(code),
            None => AuthServiceError::InvalidCredentials,
        },
        StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => AuthServiceError::InvalidCredentials,
        StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => AuthServiceError::Refused(body),
        other => AuthServiceError::Provider(format!("{other}: {body}")),
    }
}

#[async_trait]
impl AuthService for GoTrueClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, AuthServiceError> {
        let res = self
            .http
            .post(&self.token_url)
            .header("apikey", &self.api_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, email, "password grant rejected");
            return Err(classify_failure(status, body));
        }

        let grant: GrantResponse = res
            .json()
            .await
            .map_err(|e| AuthServiceError::Provider(format!("malformed grant response: {e}")))?;
        debug!(provider_id = %grant.user.id, "password grant accepted");

        Ok(AuthIdentity {
            provider_id: grant.user.id,
            email: grant.user.email.unwrap_or_else(|| email.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_uses_password_grant() {
        let client = GoTrueClient::with_client(Client::new(), "https://abc.supabase.co/", "anon");
        assert_eq!(
            client.token_url,
            "https://abc.supabase.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn bad_credentials_statuses_are_not_provider_errors() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND] {
            assert!(matches!(
                classify_failure(status, String::new()),
                AuthServiceError::InvalidCredentials
            ));
        }
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, "banned".into()),
            AuthServiceError::Refused(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY, String::new()),
            AuthServiceError::Provider(_)
        ));
    }

    #[test]
    fn unconfirmed_email_in_a_400_is_a_refusal() {
        let body = r#"{"code":400,"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#;
        match classify_failure(StatusCode::BAD_REQUEST, body.into()) {
            AuthServiceError::Refused(code) => assert_eq!(code, "email_not_confirmed"),
            other => panic!("expected refusal, got {other:?}"),
        }

        let legacy = r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, legacy.into()),
            AuthServiceError::Refused(_)
        ));

        let wrong_password = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, wrong_password.into()),
            AuthServiceError::InvalidCredentials
        ));
    }
}
