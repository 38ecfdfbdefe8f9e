use std::str::FromStr;

use anyhow::Context;
use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Endpoint and keys of the managed database/auth project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Key used for table reads and writes; falls back to the anon key.
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub supabase: SupabaseConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} is not set"))
        };

        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: match lookup("APP_PORT") {
                Some(v) => v.parse().with_context(|| format!("invalid APP_PORT {v:?}"))?,
                None => 8080,
            },
        };

        let anon_key = required("SUPABASE_ANON_KEY")?;
        let supabase = SupabaseConfig {
            url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            service_key: lookup("SUPABASE_SERVICE_KEY")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| anon_key.clone()),
            anon_key,
        };

        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(v) => parse_hmac_algorithm(&v)?,
            None => Algorithm::HS256,
        };
        let jwt = JwtConfig {
            secret: required("JWT_SECRET_KEY")?,
            algorithm,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "staffdesk".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "staffdesk-users".into()),
            ttl_minutes: lookup("ACCESS_TOKEN_EXPIRE_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_days: lookup("REFRESH_TOKEN_EXPIRE_DAYS")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };

        Ok(Self {
            server,
            supabase,
            jwt,
        })
    }
}

/// Only shared-secret algorithms make sense with a single `JWT_SECRET_KEY`.
fn parse_hmac_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let alg = Algorithm::from_str(raw.trim())
        .map_err(|e| anyhow::anyhow!("invalid JWT_ALGORITHM {raw:?}: {e}"))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => anyhow::bail!("JWT_ALGORITHM {other:?} is not an HMAC algorithm"),
    }
}
