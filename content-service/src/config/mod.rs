use crate::query::{PageDefaults, DEFAULT_PAGE_LIMIT};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Service settings, resolved from the environment by [`ContentConfig::load`].
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub mongodb: MongoConfig,
    pub query: QueryConfig,
    pub solar: SolarConfig,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON seed file loaded by the in-memory backend.
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub default_limit: u64,
    pub max_limit: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct SolarConfig {
    /// Region table overriding the built-in one.
    pub regions_path: Option<String>,
}

impl QueryConfig {
    pub fn page_defaults(&self) -> PageDefaults {
        PageDefaults {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: None,
        }
    }
}

impl Default for ContentConfig {
    /// In-memory store with the built-in region table.
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            store: StoreConfig {
                backend: StoreBackend::Memory,
                seed_path: None,
            },
            mongodb: MongoConfig {
                uri: String::new(),
                database: DEFAULT_DATABASE.to_string(),
            },
            query: QueryConfig::default(),
            solar: SolarConfig::default(),
        }
    }
}

const DEFAULT_DATABASE: &str = "solar_site";

impl ContentConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Builds the service config from `lookup`, which resolves a variable
    /// name to its value.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let get = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let backend: StoreBackend = get("STORE_BACKEND", Some("mongo"))?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The URI is only needed when MongoDB actually backs the store.
        let uri = match backend {
            StoreBackend::Mongo => get("MONGODB_URI", None)?,
            StoreBackend::Memory => lookup("MONGODB_URI").unwrap_or_default(),
        };

        let default_limit = parse_limit("QUERY_DEFAULT_LIMIT", lookup("QUERY_DEFAULT_LIMIT"))?
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        let max_limit = parse_limit("QUERY_MAX_LIMIT", lookup("QUERY_MAX_LIMIT"))?;

        Ok(ContentConfig {
            common,
            store: StoreConfig {
                backend,
                seed_path: lookup("MEMORY_SEED_PATH"),
            },
            mongodb: MongoConfig {
                uri,
                database: get("MONGODB_DATABASE", Some(DEFAULT_DATABASE))?,
            },
            query: QueryConfig {
                default_limit,
                max_limit,
            },
            solar: SolarConfig {
                regions_path: lookup("SOLAR_REGIONS_PATH"),
            },
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_limit(key: &str, raw: Option<String>) -> Result<Option<u64>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value >= 1 => Ok(Some(value)),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a positive integer, got '{}'",
            key,
            raw
        ))),
    }
}
