use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Wallet credit granted per booking, in minor units
    #[serde(default = "default_wallet_credit")]
    pub wallet_credit_per_booking: i64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self { wallet_credit_per_booking: default_wallet_credit() }
    }
}

fn default_wallet_credit() -> i64 { 7500 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_seconds: u64,
    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_seconds: u64,
    #[serde(default = "default_otp_length")]
    pub otp_length: usize,
}

fn default_jwt_expiration() -> u64 { 1800 }
fn default_otp_ttl() -> u64 { 300 }
fn default_otp_length() -> usize { 6 }

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Empty selects the in-memory store
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub seed_demo: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: None, max_connections: default_max_connections(), seed_demo: false }
    }
}

fn default_max_connections() -> u32 { 5 }

impl DatabaseConfig {
    pub fn postgres_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `BUSLY__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("BUSLY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 8080\n[auth]\njwt_secret = \"s\"\n[database]\nurl = \"\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.jwt_expiration_seconds, 1800);
        assert_eq!(cfg.auth.otp_length, 6);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.database.postgres_url(), None);
        assert_eq!(cfg.business_rules.wallet_credit_per_booking, 7500);
    }
}
