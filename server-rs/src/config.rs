use std::env;

use crate::models::BoostType;

const PLACEHOLDER_JWT_SECRET: &str = "change-me-to-a-secure-random-string";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SUPABASE_JWT_SECRET or JWT_SECRET must be set when APP_ENV=production")]
    MissingJwtSecret,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub app_env: String,
    pub cors_origins: Vec<String>,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub boosts: BoostConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub audience: String,
}

#[derive(Clone, Debug)]
pub struct BoostConfig {
    pub default_type: BoostType,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Outside production a missing secret falls back to a placeholder.
fn jwt_secret(production: bool, configured: Option<String>) -> Result<String, ConfigError> {
    match configured.filter(|s| !s.trim().is_empty() && s.as_str() != PLACEHOLDER_JWT_SECRET) {
        Some(secret) => Ok(secret),
        None if production => Err(ConfigError::MissingJwtSecret),
        None => {
            tracing::warn!("No JWT secret configured, using the development placeholder");
            Ok(PLACEHOLDER_JWT_SECRET.to_string())
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_env = env_or("APP_ENV", "development");
        let secret = jwt_secret(
            app_env == "production",
            env::var("SUPABASE_JWT_SECRET").or_else(|_| env::var("JWT_SECRET")).ok(),
        )?;

        Ok(Self {
            port: env_or_parse("PORT", 3000),
            app_env,
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:5173,http://localhost:8080")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "postgres"),
                user: env_or("DB_USER", "postgres"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 1),
                pool_max: env_or_parse("DB_POOL_MAX", 10),
                acquire_timeout_secs: env_or_parse("DB_ACQUIRE_TIMEOUT_SECS", 10),
            },
            jwt: JwtConfig {
                secret,
                audience: env_or("JWT_AUDIENCE", "authenticated"),
            },
            boosts: BoostConfig {
                default_type: env_or_parse("DEFAULT_BOOST_TYPE", BoostType::Profile),
            },
        })
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        if let Ok(url) = env::var("SUPABASE_DB_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            app_env: "test".to_string(),
            cors_origins: Vec::new(),
            db: DbConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "postgres".to_string(),
                user: "postgres".to_string(),
                password: String::new(),
                pool_min: 1,
                pool_max: 1,
                acquire_timeout_secs: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                audience: "authenticated".to_string(),
            },
            boosts: BoostConfig {
                default_type: BoostType::Profile,
            },
        }
    }
}
