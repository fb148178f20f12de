//! Runtime settings and catalog loading
//!
//! Settings come from the process environment (after `.env` is loaded by
//! `dotenvy`):
//!   DATABASE_URL             : PostgreSQL connection string (required)
//!   DATABASE_MAX_CONNECTIONS : pool size (default 10)
//!   LESSON_CATALOG_PATH      : JSON catalog file; built-in catalog if unset
//!   PK_QUESTION_COUNT        : questions per PK match (default 5)
//!   PK_OPPONENT_ACCURACY     : simulated opponent hit rate in [0, 1] (default 0.6)

use std::path::PathBuf;
use std::str::FromStr;

use historia_core::{Catalog, DEFAULT_OPPONENT_ACCURACY, DEFAULT_QUESTION_COUNT};
use tracing::info;

use crate::error::{Result, ServiceError};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub catalog_path: Option<PathBuf>,
    pub pk_question_count: usize,
    pub pk_opponent_accuracy: f64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ServiceError::Config("DATABASE_URL must be set".to_string()))?;

        let max_connections = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let pk_question_count = parse_var(&lookup, "PK_QUESTION_COUNT", DEFAULT_QUESTION_COUNT)?;
        if pk_question_count == 0 {
            return Err(ServiceError::Config(
                "PK_QUESTION_COUNT must be at least 1".to_string(),
            ));
        }

        let pk_opponent_accuracy =
            parse_var(&lookup, "PK_OPPONENT_ACCURACY", DEFAULT_OPPONENT_ACCURACY)?;
        if !(0.0..=1.0).contains(&pk_opponent_accuracy) {
            return Err(ServiceError::Config(format!(
                "PK_OPPONENT_ACCURACY must be within [0, 1], got {}",
                pk_opponent_accuracy
            )));
        }

        Ok(Self {
            database_url,
            max_connections,
            catalog_path: lookup("LESSON_CATALOG_PATH").map(PathBuf::from),
            pk_question_count,
            pk_opponent_accuracy,
        })
    }

    /// Load the configured catalog, falling back to the built-in one.
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    ServiceError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let catalog = Catalog::from_json_str(&json)?;
                info!(path = %path.display(), lessons = catalog.lesson_count(), "Loaded lesson catalog");
                Ok(catalog)
            }
            None => {
                let catalog = builtin_catalog()?;
                info!(lessons = catalog.lesson_count(), "Using built-in lesson catalog");
                Ok(catalog)
            }
        }
    }
}

/// The catalog shipped with the backend.
pub fn builtin_catalog() -> Result<Catalog> {
    Ok(Catalog::from_json_str(BUILTIN_CATALOG)?)
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ServiceError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
