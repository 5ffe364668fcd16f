use anyhow::Context;
use serde::Deserialize;

pub const INSECURE_JWT_SECRET: &str = "your-secret-key-change-this-in-production";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Outbound SMTP settings. Only present when host, user and password are all set.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: Option<String>,
    pub jwt: JwtConfig,
    pub mail: Option<MailConfig>,
    pub ai: AiConfig,
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|&k| var(k));

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_name = var("DATABASE_NAME");

        let secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure placeholder secret");
            INSECURE_JWT_SECRET.into()
        });
        let jwt = JwtConfig {
            secret,
            ttl_hours: var("JWT_TTL_HOURS")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };

        let mail = match (
            first(&["EMAIL_HOST", "SMTP_HOST"]),
            var("EMAIL_USER"),
            var("EMAIL_PASS"),
        ) {
            (Some(host), Some(user), Some(password)) => Some(MailConfig {
                host,
                port: first(&["EMAIL_PORT", "SMTP_PORT"])
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(587),
                from: var("EMAIL_FROM").unwrap_or_else(|| user.clone()),
                user,
                password,
            }),
            _ => None,
        };

        let ai = AiConfig {
            api_key: var("GEMINI_API_KEY"),
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
        };

        Ok(Self {
            database_url,
            database_name,
            jwt,
            mail,
            ai,
        })
    }
}
