use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub upload: UploadConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,  // in bytes
    pub storage_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
    pub reset_base_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    // Secrets must be present before the listener binds; a missing or empty
    // secret is fatal here rather than a per-request 500 later.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(config::ConfigError::Message(
                "auth.jwt_secret must not be empty (set APP_AUTH__JWT_SECRET)".into(),
            ));
        }
        if self.admin.api_key.is_empty() {
            return Err(config::ConfigError::Message(
                "admin.api_key must not be empty (set APP_ADMIN__API_KEY)".into(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(config::ConfigError::Message(
                "upload.max_file_size must be greater than zero".into(),
            ));
        }
        if self.auth.jwt_secret.starts_with("change-me") {
            tracing::warn!("auth.jwt_secret is still the development placeholder");
        }
        if self.admin.api_key.starts_with("change-me") {
            tracing::warn!("admin.api_key is still the development placeholder");
        }
        Ok(())
    }
}
