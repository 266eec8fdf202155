/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, AUTHORIZER_MODE, DB_* など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Postgres connection settings for the totem lookup.
#[derive(Clone)]
pub struct DbConfig {
    pub connect_options: PgConnectOptions,
    pub max_connections: u32,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print credentials
        f.debug_struct("DbConfig")
            .field("host", &self.connect_options.get_host())
            .field("port", &self.connect_options.get_port())
            .field("database", &self.connect_options.get_database())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Which authorization strategy the service runs with.
#[derive(Clone)]
pub enum StrategyConfig {
    /// Resolve tokens against the `totems` table.
    Totem(DbConfig),
    /// Compare tokens against a single configured secret.
    SharedSecret { key: String },
}

impl fmt::Debug for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totem(db) => f.debug_tuple("Totem").field(db).finish(),
            Self::SharedSecret { .. } => f.write_str("SharedSecret"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    /// Abort the process on any panic instead of answering the request with a denial.
    pub abort_on_panic: bool,
    pub strategy: StrategyConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key/value source.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| source(key).filter(|v| !v.trim().is_empty());

        let port: u16 = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let abort_on_panic = match var("PANIC_ABORT") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::Invalid("PANIC_ABORT")),
            },
            None => false,
        };

        let mode = var("AUTHORIZER_MODE").unwrap_or_else(|| "totem".to_string());
        let strategy = match mode.to_ascii_lowercase().replace('-', "_").as_str() {
            "totem" | "database" | "db" => StrategyConfig::Totem(db_config(&var)?),
            "shared_secret" | "secret" | "static" => {
                let key = source("AUTHORIZER_KEY").ok_or(ConfigError::Missing("AUTHORIZER_KEY"))?;
                if key.is_empty() {
                    return Err(ConfigError::Invalid("AUTHORIZER_KEY"));
                }
                StrategyConfig::SharedSecret { key }
            }
            _ => return Err(ConfigError::Invalid("AUTHORIZER_MODE")),
        };

        Ok(Self {
            addr,
            app_env,
            abort_on_panic,
            strategy,
        })
    }
}

fn db_config<F>(var: &F) -> Result<DbConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Only an explicit DB_SSLMODE overrides the sslmode carried by DATABASE_URL.
    let ssl_mode = var("DB_SSLMODE")
        .map(|raw| PgSslMode::from_str(&raw).map_err(|_| ConfigError::Invalid("DB_SSLMODE")))
        .transpose()?;

    let connect_options = match var("DATABASE_URL") {
        Some(url) => {
            let options = PgConnectOptions::from_str(&url)
                .map_err(|_| ConfigError::Invalid("DATABASE_URL"))?;
            match ssl_mode {
                Some(mode) => options.ssl_mode(mode),
                None => options,
            }
        }
        None => {
            let host = var("DB_HOST").ok_or(ConfigError::Missing("DB_HOST"))?;
            let port: u16 = var("DB_PORT")
                .ok_or(ConfigError::Missing("DB_PORT"))?
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("DB_PORT"))?;
            let user = var("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
            let password = var("DB_PASSWORD").ok_or(ConfigError::Missing("DB_PASSWORD"))?;
            let database = var("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;

            PgConnectOptions::new()
                .host(&host)
                .port(port)
                .username(&user)
                .password(&password)
                .database(&database)
                .ssl_mode(ssl_mode.unwrap_or(PgSslMode::Prefer))
        }
    };

    let max_connections = match var("DB_MAX_CONNECTIONS") {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid("DB_MAX_CONNECTIONS"))?,
        None => 5,
    };

    Ok(DbConfig {
        connect_options,
        max_connections,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    const DB_VARS: [(&str, &str); 5] = [
        ("DB_HOST", "localhost"),
        ("DB_PORT", "5432"),
        ("DB_USER", "test_user"),
        ("DB_PASSWORD", "test_password"),
        ("DB_NAME", "test_db"),
    ];

    #[test]
    fn defaults_to_totem_mode_with_db_parts() {
        let config = config_from(&DB_VARS).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        match config.strategy {
            StrategyConfig::Totem(db) => {
                assert_eq!(db.connect_options.get_host(), "localhost");
                assert_eq!(db.connect_options.get_port(), 5432);
                assert_eq!(db.connect_options.get_username(), "test_user");
                assert_eq!(db.connect_options.get_database(), Some("test_db"));
                assert_eq!(db.max_connections, 5);
            }
            other => panic!("unexpected strategy: {other:?}"),
        }
    }

    #[test]
    fn missing_db_part_is_reported_by_key() {
        let vars: Vec<_> = DB_VARS
            .iter()
            .copied()
            .filter(|(k, _)| *k != "DB_USER")
            .collect();

        assert_eq!(
            config_from(&vars).unwrap_err(),
            ConfigError::Missing("DB_USER")
        );
    }

    #[test]
    fn non_numeric_db_port_is_invalid() {
        let mut vars = DB_VARS.to_vec();
        vars[1] = ("DB_PORT", "invalid-port");

        assert_eq!(
            config_from(&vars).unwrap_err(),
            ConfigError::Invalid("DB_PORT")
        );
    }

    #[test]
    fn database_url_overrides_parts() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://prod_user:pw@prod.example.com:6543/prod_db"),
            ("DB_HOST", "ignored"),
        ])
        .unwrap();

        let StrategyConfig::Totem(db) = config.strategy else {
            panic!("expected totem strategy");
        };
        assert_eq!(db.connect_options.get_host(), "prod.example.com");
        assert_eq!(db.connect_options.get_port(), 6543);
        assert_eq!(db.connect_options.get_database(), Some("prod_db"));
    }

    #[test]
    fn shared_secret_mode_requires_key() {
        assert_eq!(
            config_from(&[("AUTHORIZER_MODE", "shared_secret")]).unwrap_err(),
            ConfigError::Missing("AUTHORIZER_KEY")
        );

        let config = config_from(&[
            ("AUTHORIZER_MODE", "shared-secret"),
            ("AUTHORIZER_KEY", "abc123"),
        ])
        .unwrap();
        match config.strategy {
            StrategyConfig::SharedSecret { key } => assert_eq!(key, "abc123"),
            other => panic!("unexpected strategy: {other:?}"),
        }
    }

    #[test]
    fn unknown_mode_and_bad_sslmode_are_invalid() {
        assert_eq!(
            config_from(&[("AUTHORIZER_MODE", "jwt")]).unwrap_err(),
            ConfigError::Invalid("AUTHORIZER_MODE")
        );

        let mut vars = DB_VARS.to_vec();
        vars.push(("DB_SSLMODE", "sometimes"));
        assert_eq!(
            config_from(&vars).unwrap_err(),
            ConfigError::Invalid("DB_SSLMODE")
        );
    }

    #[test]
    fn port_and_env_overrides() {
        let mut vars = DB_VARS.to_vec();
        vars.push(("PORT", "8080"));
        vars.push(("APP_ENV", "PROD"));
        vars.push(("DB_MAX_CONNECTIONS", "12"));

        let config = config_from(&vars).unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert!(config.app_env.is_production());
        let StrategyConfig::Totem(db) = config.strategy else {
            panic!("expected totem strategy");
        };
        assert_eq!(db.max_connections, 12);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = config_from(&[
            ("AUTHORIZER_MODE", "shared_secret"),
            ("AUTHORIZER_KEY", "super-secret-value"),
        ])
        .unwrap();

        assert!(!format!("{config:?}").contains("super-secret-value"));

        let config = config_from(&DB_VARS).unwrap();
        assert!(!format!("{config:?}").contains("test_password"));
    }

    #[test]
    fn url_sslmode_is_kept_unless_overridden() {
        let url = ("DATABASE_URL", "postgres://u:p@db.example.com:5432/x?sslmode=require");

        let StrategyConfig::Totem(db) = config_from(&[url]).unwrap().strategy else {
            panic!("expected totem strategy");
        };
        assert!(matches!(
            db.connect_options.get_ssl_mode(),
            PgSslMode::Require
        ));

        let StrategyConfig::Totem(db) = config_from(&[url, ("DB_SSLMODE", "verify-full")])
            .unwrap()
            .strategy
        else {
            panic!("expected totem strategy");
        };
        assert!(matches!(
            db.connect_options.get_ssl_mode(),
            PgSslMode::VerifyFull
        ));
    }

    #[test]
    fn db_parts_default_to_prefer_sslmode() {
        let StrategyConfig::Totem(db) = config_from(&DB_VARS).unwrap().strategy else {
            panic!("expected totem strategy");
        };
        assert!(matches!(
            db.connect_options.get_ssl_mode(),
            PgSslMode::Prefer
        ));

        let mut vars = DB_VARS.to_vec();
        vars.push(("DB_SSLMODE", "require"));
        let StrategyConfig::Totem(db) = config_from(&vars).unwrap().strategy else {
            panic!("expected totem strategy");
        };
        assert!(matches!(
            db.connect_options.get_ssl_mode(),
            PgSslMode::Require
        ));
    }

    #[test]
    fn panic_abort_is_opt_in() {
        // Development by default, yet panics must still end as denials.
        let config = config_from(&DB_VARS).unwrap();
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(!config.abort_on_panic);

        let mut vars = DB_VARS.to_vec();
        vars.push(("PANIC_ABORT", "1"));
        assert!(config_from(&vars).unwrap().abort_on_panic);

        let mut vars = DB_VARS.to_vec();
        vars.push(("APP_ENV", "production"));
        vars.push(("PANIC_ABORT", "false"));
        assert!(!config_from(&vars).unwrap().abort_on_panic);

        let mut vars = DB_VARS.to_vec();
        vars.push(("PANIC_ABORT", "maybe"));
        assert_eq!(
            config_from(&vars).unwrap_err(),
            ConfigError::Invalid("PANIC_ABORT")
        );
    }
}
