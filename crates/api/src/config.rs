//! Service settings: built-in defaults, then an optional `dentlab.toml`,
//! then `DENTLAB_*` environment variables (`__` separates sections, e.g.
//! `DENTLAB_AUTH__JWT_SECRET`).

use config::{Config, ConfigError, Environment, File, FileFormat, Source};
use serde::Deserialize;

use dentlab_notifications::{SendGridSettings, TwilioSettings};

const DEV_JWT_SECRET: &str = "dev-secret";
const DEV_OWNER_PASSWORD: &str = "dev-owner";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: Option<String>,
    pub owner_password: Option<String>,
    pub token_ttl_minutes: i64,
}

impl AuthSettings {
    pub fn jwt_secret_or_dev_default(&self) -> String {
        non_empty(self.jwt_secret.as_deref()).unwrap_or_else(|| {
            tracing::warn!("auth.jwt_secret not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        })
    }

    pub fn owner_password_or_dev_default(&self) -> String {
        non_empty(self.owner_password.as_deref()).unwrap_or_else(|| {
            tracing::warn!("auth.owner_password not set; using insecure dev default");
            DEV_OWNER_PASSWORD.to_string()
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// In-memory storage when unset.
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Returned with database permission errors.
    pub permissions_help_url: String,
}

impl StorageSettings {
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabSettings {
    /// Lab-local offset from UTC used for day and month boundaries.
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub twilio: TwilioSettings,
    #[serde(default)]
    pub sendgrid: SendGridSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
    pub lab: LabSettings,
    pub notifications: NotificationSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(
            File::with_name("dentlab")
                .format(FileFormat::Toml)
                .required(false),
            environment(),
        )
    }

    fn build<S>(file: S, env: Environment) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .set_default("server.bind_addr", "0.0.0.0:8080")?
            .set_default("auth.token_ttl_minutes", 720)?
            .set_default("storage.max_connections", 5)?
            .set_default(
                "storage.permissions_help_url",
                "https://www.postgresql.org/docs/current/ddl-priv.html",
            )?
            .set_default("lab.utc_offset_minutes", 180)?
            .set_default("notifications.enabled", true)?
            .set_default("notifications.http_timeout_secs", 10)?
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("DENTLAB")
        .prefix_separator("_")
        .separator("__")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
