use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;
use validator::ValidateEmail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Postgres,
    Memory,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown session backend `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub backend: SessionBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    pub token_ttl_minutes: i64,
    pub default_origin: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from: String,
    pub reset_subject: String,
    pub template_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub output_len: usize,
    pub pepper: Option<String>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
            output_len: 32,
            pepper: None,
        }
    }
}

/// First administrator, ensured at startup when `ADMIN_EMAIL` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    pub handle: String,
}

impl AdminConfig {
    /// Both email and password or neither.
    pub fn from_values(
        email: Option<String>,
        password: Option<String>,
        handle: Option<String>,
    ) -> anyhow::Result<Option<Self>> {
        let (email, password) = match (email, password) {
            (None, None) => return Ok(None),
            (Some(email), Some(password)) => (email.trim().to_lowercase(), password),
            _ => anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };
        if !email.validate_email() {
            anyhow::bail!("ADMIN_EMAIL `{email}` is not a valid email");
        }
        if password.chars().count() < 4 {
            anyhow::bail!("ADMIN_PASSWORD must be at least 4 characters long");
        }
        let handle = handle.map(|h| h.trim().to_string()).unwrap_or_else(|| "admin".into());
        if !(2..=16).contains(&handle.chars().count()) {
            anyhow::bail!("ADMIN_HANDLE must be 2 to 16 characters long");
        }
        Ok(Some(Self {
            email,
            password,
            handle,
        }))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub reset: ResetConfig,
    pub mail: MailConfig,
    pub password: PasswordConfig,
    pub admin: Option<AdminConfig>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET is not set")?,
            issuer: env_string("SESSION_ISSUER", "blogd"),
            audience: env_string("SESSION_AUDIENCE", "blogd-web"),
            ttl_minutes: env_or("SESSION_TTL_MINUTES", 60 * 24),
            cookie_name: env_string("SESSION_COOKIE", "blogd_session"),
            cookie_secure: env_or("SESSION_COOKIE_SECURE", false),
            backend: match std::env::var("SESSION_BACKEND") {
                Ok(v) => v.parse()?,
                Err(_) => SessionBackend::Postgres,
            },
        };

        let reset = ResetConfig {
            token_ttl_minutes: env_or("RESET_TOKEN_TTL_MINUTES", 3 * 60),
            default_origin: env_string("RESET_DEFAULT_ORIGIN", "http://localhost:3000"),
            path: env_string("RESET_PATH", "/password/reset"),
        };

        let mail = MailConfig {
            from: env_string("MAIL_FROM", "no-reply@blogd.local"),
            reset_subject: env_string("MAIL_RESET_SUBJECT", "Reset your password"),
            template_path: std::env::var("MAIL_TEMPLATE_PATH").ok(),
        };

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: env_or("ARGON2_MEMORY_KIB", defaults.memory_kib),
            iterations: env_or("ARGON2_TIME", defaults.iterations),
            parallelism: env_or("ARGON2_PARALLELISM", defaults.parallelism),
            output_len: env_or("ARGON2_HASHLEN", defaults.output_len),
            pepper: std::env::var("PASSWORD_PEPPER").ok().filter(|p| !p.is_empty()),
        };

        let admin = AdminConfig::from_values(
            std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
            std::env::var("ADMIN_HANDLE").ok().filter(|v| !v.is_empty()),
        )?;

        Ok(Self {
            database_url,
            session,
            reset,
            mail,
            password,
            admin,
        })
    }
}
