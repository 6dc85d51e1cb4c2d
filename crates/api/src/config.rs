use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
    /// JWT signing configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `LOG_FORMAT`           | `pretty` (or `json`)       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let log_format = LogFormat::from_env_value(
            &std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()),
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            log_format,
            jwt,
        }
    }
}

/// Database pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Load database settings.
    ///
    /// `DATABASE_URL` wins when present; otherwise the URL is composed from
    /// the individual variables.
    ///
    /// | Env Var                  | Default     |
    /// |--------------------------|-------------|
    /// | `DATABASE_URL`           | --          |
    /// | `DB_HOST`                | `localhost` |
    /// | `DB_PORT`                | `3306`      |
    /// | `DB_USER`                | `root`      |
    /// | `DB_PASS`                | empty       |
    /// | `DB_NAME`                | `almacen`   |
    /// | `DB_MAX_CONNECTIONS`     | `10`        |
    /// | `DB_ACQUIRE_TIMEOUT_SECS`| `30`        |
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            let host = std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into());
            let port = std::env::var("DB_PORT").unwrap_or_else(|_| "3306".into());
            let user = std::env::var("DB_USER").unwrap_or_else(|_| "root".into());
            let pass = std::env::var("DB_PASS").unwrap_or_default();
            let name = std::env::var("DB_NAME").unwrap_or_else(|_| "almacen".into());
            compose_mysql_url(&host, &port, &user, &pass, &name)
        });

        let max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let acquire_timeout_secs: u64 = std::env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("DB_ACQUIRE_TIMEOUT_SECS must be a valid u64");

        Self {
            url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        }
    }
}

fn compose_mysql_url(host: &str, port: &str, user: &str, pass: &str, name: &str) -> String {
    if pass.is_empty() {
        format!("mysql://{user}@{host}:{port}/{name}")
    } else {
        format!("mysql://{user}:{pass}@{host}:{port}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_url_with_and_without_password() {
        assert_eq!(
            compose_mysql_url("db", "3306", "almacen", "s3cret", "inventario"),
            "mysql://almacen:s3cret@db:3306/inventario"
        );
        assert_eq!(
            compose_mysql_url("localhost", "3307", "root", "", "almacen"),
            "mysql://root@localhost:3307/almacen"
        );
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_env_value("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_env_value("whatever"), LogFormat::Pretty);
    }
}
