use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Randomly perturb system statuses on every poll.
    #[serde(default)]
    pub simulate_status: bool,
    /// Number of undelivered notifications a slow WebSocket client may lag behind.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }
}

fn default_port() -> u16 {
    8080
}

fn default_notification_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        config::Environment::default().source(Some(source))
    }

    #[test]
    fn can_apply_defaults_when_only_db_url_is_set() {
        let config = Config::from_environment(environment(&[("DB_URL", "sqlite::memory:")]))
            .expect("config should load");

        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(config.port, 8080);
        assert!(!config.simulate_status);
        assert_eq!(config.notification_capacity, 64);
    }

    #[test]
    fn can_read_overrides_from_environment() {
        let config = Config::from_environment(environment(&[
            ("DB_URL", "postgres://localhost/patterns"),
            ("PORT", "9000"),
            ("SIMULATE_STATUS", "true"),
            ("NOTIFICATION_CAPACITY", "8"),
        ]))
        .expect("config should load");

        assert_eq!(config.port, 9000);
        assert!(config.simulate_status);
        assert_eq!(config.notification_capacity, 8);
    }

    #[test]
    fn cannot_load_without_db_url() {
        assert!(Config::from_environment(environment(&[("PORT", "9000")])).is_err());
    }
}
