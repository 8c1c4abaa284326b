use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::pricing::{PricingPolicy, MAX_SEAT_PRICE};

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
    pub pricing: PricingPolicy,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Где живут брони.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    File { path: PathBuf },
    Postgres { url: String, pool_size: u32 },
}

// Откуда брать каталог, если в хранилище его нет
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Сборка конфигурации из произвольного источника переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let app = AppConfig {
            host: vars.string_or("HOST", "0.0.0.0"),
            port: vars.parse_or("PORT", 8000)?,
            environment: vars.string_or("ENVIRONMENT", "development"),
            rust_log: vars.string_or("RUST_LOG", "movie_tickets=debug,tower_http=debug"),
            log_format: vars.parse_or("LOG_FORMAT", LogFormat::Text)?,
        };

        let storage = match vars.string_or("STORAGE", "memory").to_ascii_lowercase().as_str() {
            "memory" => StorageConfig::Memory,
            "file" => StorageConfig::File {
                path: PathBuf::from(vars.string_or("BOOKINGS_FILE", "bookings.json")),
            },
            "postgres" => StorageConfig::Postgres {
                url: vars.get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                pool_size: vars.parse_or("DB_POOL_SIZE", 20)?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORAGE",
                    value: other.to_string(),
                })
            }
        };

        let catalog = CatalogConfig {
            path: vars.get("CATALOG_FILE").map(PathBuf::from),
        };

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            base_price: vars.parse_or("BASE_PRICE", defaults.base_price)?,
            front_row_surcharge: vars.parse_or("FRONT_ROW_SURCHARGE", defaults.front_row_surcharge)?,
            student_discount_percent: vars.parse_or("STUDENT_DISCOUNT_PERCENT", defaults.student_discount_percent)?,
        };
        if pricing.student_discount_percent > 100 {
            return Err(ConfigError::Invalid {
                var: "STUDENT_DISCOUNT_PERCENT",
                value: pricing.student_discount_percent.to_string(),
            });
        }
        if !(0..=MAX_SEAT_PRICE).contains(&pricing.base_price) {
            return Err(ConfigError::Invalid {
                var: "BASE_PRICE",
                value: pricing.base_price.to_string(),
            });
        }
        // база уже не больше MAX_SEAT_PRICE, сумма не переполнится
        if pricing.front_row_surcharge < 0
            || pricing.front_row_surcharge > MAX_SEAT_PRICE - pricing.base_price
        {
            return Err(ConfigError::Invalid {
                var: "FRONT_ROW_SURCHARGE",
                value: pricing.front_row_surcharge.to_string(),
            });
        }

        Ok(Config {
            app,
            storage,
            catalog,
            pricing,
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var: key, value: raw }),
            None => Ok(default),
        }
    }
}
