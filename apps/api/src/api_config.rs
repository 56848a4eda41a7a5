use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use formloom_core::AppError;
use tracing_subscriber::EnvFilter;

/// Storage backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Postgres { database_url: String },
    InMemory { snapshot_path: Option<PathBuf> },
}

/// Outbound api column client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiWidgetClientConfig {
    pub timeout: Duration,
    pub max_attempts: u8,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub storage: StorageConfig,
    pub offline: bool,
    pub api_widget_client: ApiWidgetClientConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(
            env::args().nth(1).as_deref() == Some("migrate"),
            |name| env::var(name).ok(),
        )
    }

    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let frontend_url =
            non_empty("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = non_empty("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_env(&non_empty, "API_PORT", 3001_u16)?;

        let storage = match non_empty("DATABASE_URL") {
            Some(database_url) => StorageConfig::Postgres { database_url },
            None if migrate_only => {
                return Err(AppError::Validation(
                    "DATABASE_URL is required to run migrations".to_owned(),
                ));
            }
            None => StorageConfig::InMemory {
                snapshot_path: non_empty("FORMLOOM_SNAPSHOT_PATH").map(PathBuf::from),
            },
        };

        let offline = match non_empty("FORMLOOM_OFFLINE") {
            None => false,
            Some(value) if value.eq_ignore_ascii_case("true") => true,
            Some(value) if value.eq_ignore_ascii_case("false") => false,
            Some(value) => {
                return Err(AppError::Validation(format!(
                    "FORMLOOM_OFFLINE must be 'true' or 'false', got '{value}'"
                )));
            }
        };

        let timeout_secs = parse_env(&non_empty, "API_WIDGET_TIMEOUT_SECS", 15_u64)?;
        if timeout_secs == 0 {
            return Err(AppError::Validation(
                "API_WIDGET_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            frontend_url,
            api_host,
            api_port,
            storage,
            offline,
            api_widget_client: ApiWidgetClientConfig {
                timeout: Duration::from_secs(timeout_secs),
                max_attempts: parse_env(&non_empty, "API_WIDGET_MAX_ATTEMPTS", 3_u8)?,
                retry_backoff_ms: parse_env(&non_empty, "API_WIDGET_RETRY_BACKOFF_MS", 250_u64)?,
            },
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use formloom_core::AppError;

    use super::{ApiConfig, StorageConfig};

    fn load(vars: &[(&str, &str)], migrate_only: bool) -> Result<ApiConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(migrate_only, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_select_in_memory_storage() {
        let config = load(&[], false).unwrap_or_else(|_| unreachable!());

        assert_eq!(config.api_port, 3001);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(
            config.storage,
            StorageConfig::InMemory {
                snapshot_path: None
            }
        );
        assert!(!config.offline);
        assert_eq!(config.api_widget_client.timeout, Duration::from_secs(15));
        assert_eq!(config.api_widget_client.max_attempts, 3);
        assert_eq!(config.api_widget_client.retry_backoff_ms, 250);
        assert!(config.socket_address().is_ok());
    }

    #[test]
    fn database_url_selects_postgres_storage() {
        let config = load(
            &[
                ("DATABASE_URL", "postgres://localhost/formloom"),
                ("FORMLOOM_SNAPSHOT_PATH", "seed.json"),
                ("FORMLOOM_OFFLINE", "TRUE"),
            ],
            false,
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            config.storage,
            StorageConfig::Postgres {
                database_url: "postgres://localhost/formloom".to_owned()
            }
        );
        assert!(config.offline);
    }

    #[test]
    fn snapshot_path_seeds_in_memory_storage() {
        let config = load(&[("FORMLOOM_SNAPSHOT_PATH", "seed.json")], false)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            config.storage,
            StorageConfig::InMemory {
                snapshot_path: Some(PathBuf::from("seed.json"))
            }
        );
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let error = load(&[("API_WIDGET_MAX_ATTEMPTS", "many")], false).err();
        assert!(matches!(
            error,
            Some(AppError::Validation(message)) if message.contains("API_WIDGET_MAX_ATTEMPTS")
        ));

        assert!(load(&[("FORMLOOM_OFFLINE", "maybe")], false).is_err());
        assert!(load(&[("API_WIDGET_TIMEOUT_SECS", "0")], false).is_err());
    }

    #[test]
    fn migrate_requires_database_url() {
        assert!(matches!(load(&[], true), Err(AppError::Validation(_))));
    }
}
