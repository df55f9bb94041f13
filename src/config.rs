use serde::Deserialize;

use crate::similarity::ScoreMode;

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    9001
}

/// Service settings, read from `HOST`, `PORT` and `SCORE_MODE`.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub score_mode: ScoreMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            score_mode: ScoreMode::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::default().try_parsing(true))
    }

    pub fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
