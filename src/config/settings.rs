//! Application settings and configuration structures.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port, public URL)
    pub server: ServerSettings,

    /// Storage backend and file storage
    pub storage: StorageSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Identity provider settings
    pub auth: AuthSettings,

    /// Admin allow-list
    pub admin: AdminSettings,

    /// Voice token credentials
    pub voice: VoiceSettings,

    pub typing: TypingSettings,

    /// Background job queue
    pub jobs: JobSettings,

    /// Keyword moderation
    pub moderation: ModerationSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,

    /// Where `GET /` redirects to
    pub default_view: String,

    /// Externally reachable base URL used in upload and file links
    pub public_url: String,
}

/// Which repository implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,

    /// Directory for uploaded files
    pub files_dir: PathBuf,

    /// Lifetime of a signed upload URL
    pub upload_ticket_ttl_secs: u64,

    /// Key for upload ticket signatures
    pub signing_secret: String,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HS256 key the provider signs session tokens with
    pub identity_secret: String,

    /// Expected `iss` claim, if any
    #[serde(default)]
    pub issuer: Option<String>,

    /// Key for webhook signatures
    pub webhook_secret: String,
}

/// Admin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSettings {
    /// Emails granted the admin role
    #[serde(default)]
    pub emails: Vec<String>,
}

/// Voice provider credentials; both keys are required to mint tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceSettings {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub api_secret: Option<String>,

    pub token_ttl_secs: u64,
}

impl VoiceSettings {
    /// `(api_key, api_secret)` when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.api_key.as_deref(), self.api_secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key, secret))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypingSettings {
    /// Lifetime of a typing indicator
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobSettings {
    /// Bounded queue size; submissions beyond it are dropped
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationSettings {
    /// Case-insensitive terms that flag a message
    #[serde(default)]
    pub blocked_terms: Vec<String>,

    /// Reason recorded on flagged messages
    pub reason: String,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Minimum required length for the identity secret (256 bits = 32 bytes)
pub const MIN_IDENTITY_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. `APP__SECTION__KEY` environment variables
    /// 5. a few plain environment variables (`DATABASE_URL`, ...)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a secret is too short.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let settings: Self = Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("admin.emails")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("moderation.blocked_terms")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("auth.identity_secret", std::env::var("IDENTITY_SECRET").ok())?
            .set_override_option("auth.webhook_secret", std::env::var("WEBHOOK_SECRET").ok())?
            .set_override_option("voice.api_key", std::env::var("LIVEKIT_API_KEY").ok())?
            .set_override_option("voice.api_secret", std::env::var("LIVEKIT_API_SECRET").ok())?
            .set_override_option(
                "admin.emails",
                std::env::var("ADMIN_EMAILS").ok().map(|raw| split_list(&raw)),
            )?
            .set_override_option(
                "snowflake.machine_id",
                std::env::var("SNOWFLAKE_MACHINE_ID").ok(),
            )?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Builder holding the built-in defaults.
    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.default_view", "/dms")?
            .set_default("server.public_url", "http://localhost:3000")?
            .set_default("storage.backend", "postgres")?
            .set_default("storage.files_dir", "data/files")?
            .set_default("storage.upload_ticket_ttl_secs", 900)?
            .set_default("database.url", "postgres://localhost/chat")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("admin.emails", Vec::<String>::new())?
            .set_default("voice.token_ttl_secs", 3600)?
            .set_default("typing.ttl_secs", 5)?
            .set_default("jobs.queue_capacity", 1024)?
            .set_default("moderation.blocked_terms", Vec::<String>::new())?
            .set_default("moderation.reason", "Removed by moderation")?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", 1420070400000_u64)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])
    }

    /// Reject secrets that are too short to be safe.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.identity_secret.len() < MIN_IDENTITY_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "Identity secret must be at least {} characters. Current length: {}",
                MIN_IDENTITY_SECRET_LENGTH,
                self.auth.identity_secret.len()
            )));
        }
        if self.auth.webhook_secret.is_empty() {
            return Err(ConfigError::Message("Webhook secret must be set".into()));
        }
        if self.storage.signing_secret.is_empty() {
            return Err(ConfigError::Message(
                "Storage signing secret must be set".into(),
            ));
        }
        if self.jobs.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Job queue capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".into(),
                port: 0,
                default_view: "/dms".into(),
                public_url: "http://localhost".into(),
            },
            storage: StorageSettings {
                backend: StorageBackend::Memory,
                files_dir: PathBuf::from("data/files"),
                upload_ticket_ttl_secs: 60,
                signing_secret: "signing".into(),
            },
            database: DatabaseSettings {
                url: "postgres://localhost/chat".into(),
                max_connections: 1,
                min_connections: 1,
                acquire_timeout: 1,
            },
            redis: RedisSettings {
                url: "redis://localhost".into(),
            },
            auth: AuthSettings {
                identity_secret: "x".repeat(MIN_IDENTITY_SECRET_LENGTH),
                issuer: None,
                webhook_secret: "hook".into(),
            },
            admin: AdminSettings::default(),
            voice: VoiceSettings {
                api_key: None,
                api_secret: None,
                token_ttl_secs: 3600,
            },
            typing: TypingSettings { ttl_secs: 5 },
            jobs: JobSettings { queue_capacity: 8 },
            moderation: ModerationSettings {
                blocked_terms: vec![],
                reason: "Removed".into(),
            },
            snowflake: SnowflakeSettings {
                machine_id: 1,
                epoch: 1420070400000,
            },
            cors: CorsSettings {
                allowed_origins: vec![],
            },
            environment: "test".into(),
        }
    }

    #[test]
    fn test_short_identity_secret_is_rejected() {
        let mut settings = sample();
        assert!(settings.validate().is_ok());

        settings.auth.identity_secret = "short".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_voice_credentials_need_both_keys() {
        let mut voice = sample().voice;
        assert_eq!(voice.credentials(), None);

        voice.api_key = Some("key".into());
        assert_eq!(voice.credentials(), None);

        voice.api_secret = Some("secret".into());
        assert_eq!(voice.credentials(), Some(("key", "secret")));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" a@x.com, ,b@x.com "),
            vec!["a@x.com".to_string(), "b@x.com".to_string()]
        );
    }
}
