use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::season::{FIRST_TRACKED_SEASON, SeasonBounds};

const CACHE_DIR: &str = "hoops_metrics";
const DB_FILE: &str = "stats.sqlite";
const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub first_season: i32,
    pub pool_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            first_season: FIRST_TRACKED_SEASON,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let db_path = lookup("HOOPS_DB")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
            .or(defaults.db_path);
        let first_season = lookup("HOOPS_FIRST_SEASON")
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .unwrap_or(defaults.first_season);
        let pool_size = lookup("HOOPS_DB_POOL")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(defaults.pool_size)
            .max(1);
        Self {
            db_path,
            first_season,
            pool_size,
        }
    }

    pub fn season_bounds(&self) -> SeasonBounds {
        SeasonBounds::starting_at(self.first_season)
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(DB_FILE),
    )
}

/// Installs the fmt subscriber. `HOOPS_LOG` takes an `EnvFilter` directive;
/// the default only shows warnings.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("HOOPS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
