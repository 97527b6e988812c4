use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

/// Access guard switches. `bypass` lets every guarded request through
/// without a token and must only be enabled for automated testing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardConfig {
    pub bypass: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub guard: GuardConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let guard = GuardConfig {
            bypass: std::env::var("AUTH_GUARD_BYPASS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        };

        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ if guard.bypass => String::new(),
            _ => anyhow::bail!("JWT_SECRET must be set unless AUTH_GUARD_BYPASS is enabled"),
        };

        let jwt = JwtConfig {
            secret,
            issuer: non_empty_var("JWT_ISSUER"),
            audience: non_empty_var("JWT_AUDIENCE"),
        };

        let database_url = non_empty_var("DATABASE_URL");

        Ok(Self {
            database_url,
            jwt,
            guard,
        })
    }

    pub fn bind_addr() -> anyhow::Result<std::net::SocketAddr> {
        let addr = format!(
            "{}:{}",
            std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
        );
        addr.parse()
            .with_context(|| format!("invalid listen address {addr}"))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
