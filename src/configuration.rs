use std::sync::OnceLock;

use config::ConfigError;

use crate::auth::PasswordPolicy;
use crate::error::{AppError, ConfigError as AppConfigError};

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub password: PasswordSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    /// Let `register` set a role other than `user`. Turn off to keep
    /// privileged accounts out of self-service signup.
    #[serde(default = "default_allow_role_selection")]
    pub allow_role_selection: bool,
}

/// Deployment environment; decides how much detail 500 responses carry.
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

static CURRENT_ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

impl Environment {
    /// Record the environment for the lifetime of the process.
    /// Only the first call has an effect.
    pub fn install(self) {
        let _ = CURRENT_ENVIRONMENT.set(self);
    }

    pub fn current() -> Environment {
        CURRENT_ENVIRONMENT.get().copied().unwrap_or_default()
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Which user store backs the service.
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Longest token lifetime accepted from configuration (ten years)
const MAX_TOKEN_EXPIRY: i64 = 10 * 365 * 24 * 3600;

/// JWT authentication settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct JwtSettings {
    /// Signs access tokens
    pub access_secret: String,
    /// Signs refresh tokens; must differ from `access_secret`
    pub refresh_secret: String,
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry: i64, // seconds
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry: i64, // seconds
    pub issuer: String,
    /// Clock skew tolerated when checking `exp`, in seconds
    #[serde(default)]
    pub leeway: u64,
    /// Issue a new refresh token (and revoke the presented one) on every refresh
    #[serde(default)]
    pub rotate_refresh_tokens: bool,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(AppConfigError::MissingRequired("jwt signing secrets".to_string()).into());
        }
        if self.access_secret == self.refresh_secret {
            return Err(AppConfigError::InvalidValue(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            )
            .into());
        }
        let in_range = |expiry: i64| (1..=MAX_TOKEN_EXPIRY).contains(&expiry);
        if !in_range(self.access_token_expiry) || !in_range(self.refresh_token_expiry) {
            return Err(AppConfigError::InvalidValue(format!(
                "jwt token expiries must be between 1 and {} seconds",
                MAX_TOKEN_EXPIRY
            ))
            .into());
        }
        Ok(())
    }
}

/// Password hashing settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct PasswordSettings {
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    #[serde(default)]
    pub policy: PasswordPolicy,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            hash_cost: default_hash_cost(),
            policy: PasswordPolicy::default(),
        }
    }
}

impl PasswordSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(4..=31).contains(&self.hash_cost) {
            return Err(AppConfigError::InvalidValue(format!(
                "password.hash_cost must be between 4 and 31, got {}",
                self.hash_cost
            ))
            .into());
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        self.jwt.validate()?;
        self.password.validate()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_allow_role_selection() -> bool {
    true
}

fn default_db_port() -> u16 {
    5432
}

fn default_access_expiry() -> i64 {
    3600
}

fn default_refresh_expiry() -> i64 {
    7 * 24 * 3600
}

fn default_hash_cost() -> u32 {
    10
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> JwtSettings {
        JwtSettings {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
            leeway: 0,
            rotate_refresh_tokens: false,
        }
    }

    #[test]
    fn distinct_secrets_are_accepted() {
        assert!(jwt().validate().is_ok());
    }

    #[test]
    fn shared_secret_is_rejected() {
        let mut config = jwt();
        config.refresh_secret = config.access_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let mut config = jwt();
        config.access_secret.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn expiry_out_of_range_is_rejected() {
        let mut config = jwt();
        config.access_token_expiry = 0;
        assert!(config.validate().is_err());

        let mut config = jwt();
        config.refresh_token_expiry = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = jwt();
        config.refresh_token_expiry = MAX_TOKEN_EXPIRY;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hash_cost_out_of_range_is_rejected() {
        let settings = PasswordSettings {
            hash_cost: 3,
            ..PasswordSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(PasswordSettings::default().validate().is_ok());
    }

    #[test]
    fn default_environment_is_production() {
        assert_eq!(Environment::default(), Environment::Production);
        assert!(Environment::Development.is_development());
    }
}
