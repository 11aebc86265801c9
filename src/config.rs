// ⚙️ Runtime configuration from the environment

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    pub flag_pantry_staples: bool,
}

impl Config {
    /// GROCERY_DB_PATH, GROCERY_PORT, GROCERY_FLAG_PANTRY
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a closure over a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            db_path: try_load(&lookup, "GROCERY_DB_PATH", "grocery.db")?,
            port: try_load(&lookup, "GROCERY_PORT", "3000")?,
            flag_pantry_staples: try_load(&lookup, "GROCERY_FLAG_PANTRY", "false")?,
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow::anyhow!("{e}")
        })
        .with_context(|| format!("Environment variable {key} is misconfigured"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("grocery.db"));
        assert_eq!(config.port, 3000);
        assert!(!config.flag_pantry_staples);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GROCERY_DB_PATH", "/tmp/house.db"),
            ("GROCERY_PORT", " 8080 "),
            ("GROCERY_FLAG_PANTRY", "true"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/house.db"));
        assert_eq!(config.port, 8080);
        assert!(config.flag_pantry_staples);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = Config::from_lookup(lookup(&[("GROCERY_PORT", "lots")])).unwrap_err();
        assert!(err.to_string().contains("GROCERY_PORT"));
    }
}
