use crate::config::AppConfig;
use crate::supabase::{AuthService, DataService, GoTrueClient, PostgrestClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data: Arc<dyn DataService>,
    pub auth: Arc<dyn AuthService>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("staffdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let data = Arc::new(PostgrestClient::with_client(
            http.clone(),
            &config.supabase.url,
            &config.supabase.service_key,
        )) as Arc<dyn DataService>;

        let auth = Arc::new(GoTrueClient::with_client(
            http,
            &config.supabase.url,
            &config.supabase.anon_key,
        )) as Arc<dyn AuthService>;

        Ok(Self::from_parts(Arc::new(config), data, auth))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        data: Arc<dyn DataService>,
        auth: Arc<dyn AuthService>,
    ) -> Self {
        Self { config, data, auth }
    }
}

#[cfg(test)]
impl AppState {
    pub fn test_config() -> AppConfig {
        use crate::config::{JwtConfig, ServerConfig, SupabaseConfig};

        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            supabase: SupabaseConfig {
                url: "https://fake.supabase.local".into(),
                anon_key: "anon".into(),
                service_key: "service".into(),
            },
            jwt: JwtConfig {
                secret: "test".into(),
                algorithm: jsonwebtoken::Algorithm::HS256,
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_days: 1,
            },
        }
    }

    pub fn fake() -> Self {
        use crate::supabase::fake::{FakeAuthService, FakeDataService};

        Self::from_parts(
            Arc::new(Self::test_config()),
            Arc::new(FakeDataService::default()),
            Arc::new(FakeAuthService::default()),
        )
    }
}
