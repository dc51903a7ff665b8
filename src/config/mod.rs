use std::env;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub cache: CacheConfig,
    pub dashboard: DashboardConfig,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_seconds: u64,
}

// Настройки Redis
#[derive(Debug, Clone)]
pub struct RedisConfig {
    // None только при выключенном кеше
    pub url: Option<String>,
}

// Кеш ленты событий
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub feed_ttl_seconds: u64,
}

// Ограничения дашборда и реестра сессий
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub max_search_len: usize,
    pub max_sessions: usize,
    pub session_idle_seconds: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    // Источник переменных подставляется снаружи, чтобы тестировать без env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let cache = CacheConfig {
            enabled: vars.parse_or("ENABLE_FEED_CACHE", true)?,
            feed_ttl_seconds: vars.parse_or("FEED_CACHE_TTL_SECONDS", 60)?,
        };

        let redis_url = vars.get("REDIS_URL");
        if cache.enabled && redis_url.is_none() {
            return Err(ConfigError::Missing("REDIS_URL"));
        }

        Ok(Config {
            app: AppConfig {
                host: vars.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: vars.parse_or("PORT", 8000)?,
                environment: vars
                    .get("ENVIRONMENT")
                    .unwrap_or_else(|| "development".to_string()),
                rust_log: vars
                    .get("RUST_LOG")
                    .unwrap_or_else(|| "club_dashboard=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: vars.require("DATABASE_URL")?,
                pool_size: vars.parse_or("DB_POOL_SIZE", 20)?,
                acquire_timeout_seconds: vars.parse_or("DB_ACQUIRE_TIMEOUT_SECONDS", 5)?,
            },
            redis: RedisConfig { url: redis_url },
            cache,
            dashboard: DashboardConfig {
                max_search_len: vars.parse_or("DASHBOARD_MAX_SEARCH_LEN", 200)?,
                max_sessions: vars.parse_or("DASHBOARD_MAX_SESSIONS", 10_000)?,
                session_idle_seconds: vars.parse_or("DASHBOARD_SESSION_IDLE_SECONDS", 1800)?,
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    // Пустые значения считаем отсутствующими
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
        }
    }
}
