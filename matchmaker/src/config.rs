use std::env;
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Context, Result, anyhow};
use common::{DEFAULT_DISCOVERY_TIMEOUT_MS, DEFAULT_MATCH_CAPACITY, DEFAULT_PLAYERS_PER_MATCH};

const DEFAULT_DISCOVERY_URL: &str = "http://localhost:8081";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the game server discovery service
    pub discovery_url: String,
    /// Target players per match for backfill matching
    pub players_per_match: i32,
    /// Tickets per match for fixed capacity matching
    pub match_capacity: usize,
    pub discovery_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            players_per_match: DEFAULT_PLAYERS_PER_MATCH,
            match_capacity: DEFAULT_MATCH_CAPACITY,
            discovery_timeout: Duration::from_millis(DEFAULT_DISCOVERY_TIMEOUT_MS),
        }
    }
}

impl Config {
    /// Read `MATCHMAKER_*` variables, falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let discovery_url = lookup("MATCHMAKER_DISCOVERY_URL").unwrap_or(defaults.discovery_url);
        let players_per_match = parse_var(&lookup, "MATCHMAKER_PLAYERS_PER_MATCH")?
            .unwrap_or(defaults.players_per_match);
        let match_capacity = parse_var(&lookup, "MATCHMAKER_MATCH_CAPACITY")?
            .unwrap_or(defaults.match_capacity);
        let discovery_timeout = parse_var::<u64>(&lookup, "MATCHMAKER_DISCOVERY_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.discovery_timeout);

        let config = Self {
            discovery_url,
            players_per_match,
            match_capacity,
            discovery_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.players_per_match <= 0 {
            return Err(anyhow!("players per match must be positive, got {}", self.players_per_match));
        }
        if self.match_capacity == 0 {
            return Err(anyhow!("match capacity must be positive"));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has an invalid value '{}'", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MATCHMAKER_DISCOVERY_URL", "http://discover:8081"),
            ("MATCHMAKER_PLAYERS_PER_MATCH", "4"),
            ("MATCHMAKER_MATCH_CAPACITY", " 6 "),
            ("MATCHMAKER_DISCOVERY_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.discovery_url, "http://discover:8081");
        assert_eq!(config.players_per_match, 4);
        assert_eq!(config.match_capacity, 6);
        assert_eq!(config.discovery_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("MATCHMAKER_MATCH_CAPACITY", "lots")])).unwrap_err();
        assert!(err.to_string().contains("MATCHMAKER_MATCH_CAPACITY"));

        assert!(Config::from_lookup(lookup(&[("MATCHMAKER_PLAYERS_PER_MATCH", "0")])).is_err());
    }
}
