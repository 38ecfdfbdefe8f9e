pub(crate) use crate::auth::claims::{Claims, TokenKind};
pub(crate) use crate::auth::dto::{JwtKeys, TokenResponse};
use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::supabase::AuthServiceError;
use crate::users::repo_types::{RecordId, User};
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, warn};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            algorithm,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_days,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_days.max(0) as u64) * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }
    pub fn sign_refresh(&self, user_id: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

/// Checks the credentials with the auth provider and resolves the caller's
/// `users.id`. Every credential problem yields the same message so the
/// response never tells which part was wrong.
pub async fn authenticate(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<RecordId, ApiError> {
    if !is_valid_email(email) || password.is_empty() {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    match state.auth.sign_in_with_password(email, password).await {
        Ok(identity) => {
            debug!(provider_id = %identity.provider_id, email = %identity.email, "credentials accepted");
        }
        Err(AuthServiceError::InvalidCredentials) => {
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }
        Err(AuthServiceError::Refused(reason)) => {
            warn!(email, %reason, "auth provider refused sign-in");
            return Err(ApiError::Forbidden(INVALID_CREDENTIALS));
        }
        Err(e) => {
            error!(email, error = %e, "auth provider unavailable during sign-in");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }
    }

    match User::find_id_by_email(state.data.as_ref(), email).await {
        Ok(Some(id)) => Ok(id),
        Ok(None) => {
            warn!(email, "authenticated account has no users row");
            Err(ApiError::Unauthorized(INVALID_CREDENTIALS))
        }
        Err(e) => Err(ApiError::internal("Login failed", e)),
    }
}

/// Signs a fresh token pair for `user_id` and attaches its profile.
pub async fn issue_tokens(state: &AppState, user_id: &str) -> Result<TokenResponse, ApiError> {
    const FAILED: &str = "Token generation failed";

    let user = User::find_by_id(state.data.as_ref(), user_id)
        .await
        .map_err(|e| ApiError::internal(FAILED, e))?
        .ok_or_else(|| {
            ApiError::internal(FAILED, anyhow::anyhow!("no users row for id {user_id}"))
        })?;

    let keys = JwtKeys::from_ref(state);
    let access_token = keys
        .sign_access(user_id)
        .map_err(|e| ApiError::internal(FAILED, e.context("sign access token")))?;
    let refresh_token = keys
        .sign_refresh(user_id)
        .map_err(|e| ApiError::internal(FAILED, e.context("sign refresh token")))?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        expires_in: keys.access_ttl.as_secs(),
        user,
    })
}
