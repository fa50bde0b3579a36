// config.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// When absent the server keeps everything in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Session lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Capacity of the change-event broadcast channel.
    pub event_buffer: usize,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let jwt_secret = lookup("JWT_SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let jwt_maxage = parse_or(&lookup, "JWT_MAXAGE", 60i64)?;
        let port = parse_or(&lookup, "PORT", 8000u16)?;
        let event_buffer = parse_or(&lookup, "EVENT_BUFFER", 256usize)?;
        if event_buffer == 0 {
            return Err(ConfigError::Invalid {
                name: "EVENT_BUFFER",
                value: "0".to_string(),
            });
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            cors_origins,
            event_buffer,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET_KEY", "secret")]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.jwt_maxage, 60);
        assert_eq!(config.port, 8000);
        assert_eq!(config.event_buffer, 256);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = load(&[("PORT", "9000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET_KEY")));
    }

    #[test]
    fn bad_number_is_reported_with_its_name() {
        let err = load(&[("JWT_SECRET_KEY", "secret"), ("JWT_MAXAGE", "soon")]).unwrap_err();
        assert_eq!(err.to_string(), "JWT_MAXAGE has an invalid value: soon");
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let config = load(&[
            ("JWT_SECRET_KEY", "secret"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
        ])
        .unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }
}
