//! Configuration loading and typed config structures for the Agora simulation.
//!
//! The canonical configuration lives in `agora-config.yaml` in the working
//! directory. Every section and field has a default, so a missing file or an
//! empty one yields a runnable setup.
//!
//! Environment variables override the listener address:
//! - `AGORA_HOST` overrides `server.host`
//! - `AGORA_PORT` overrides `server.port`

use std::path::Path;

use agora_engine::EngineConfig;
use serde::Deserialize;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "agora-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An override variable held a value of the wrong type.
    #[error("invalid value {value:?} for {name}")]
    InvalidOverride {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgoraConfig {
    /// Engine mailbox and protocol settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Workload driver settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// HTTP gateway listener.
    #[serde(default)]
    pub server: ServerConfig,
}

impl AgoraConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if an override variable is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. Env overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    ///
    /// Env overrides apply in both cases.
    ///
    /// # Errors
    ///
    /// As [`from_file`](Self::from_file).
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.server.apply_env_overrides()?;
        Ok(config)
    }
}

/// Workload driver parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Number of simulated clients, named `user0` upward.
    #[serde(default = "default_num_clients")]
    pub num_clients: usize,

    /// Communities created at the start of a run, in order.
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,

    /// Probability that a client sends one direct message.
    #[serde(default = "default_direct_message_chance")]
    pub direct_message_chance: f64,

    /// Probability that a client votes on an earlier post in its community.
    #[serde(default = "default_vote_chance")]
    pub vote_chance: f64,

    /// RNG seed. Unset means seeded from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_clients: default_num_clients(),
            subreddits: default_subreddits(),
            direct_message_chance: default_direct_message_chance(),
            vote_chance: default_vote_chance(),
            seed: None,
        }
    }
}

/// HTTP gateway listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override the listener with `AGORA_HOST` / `AGORA_PORT` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if `AGORA_PORT` is not a port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if `AGORA_PORT` is not a port.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("AGORA_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("AGORA_PORT") {
            self.port = port.parse().map_err(|_parse_err| ConfigError::InvalidOverride {
                name: "AGORA_PORT",
                value: port.clone(),
            })?;
        }
        Ok(())
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

const fn default_num_clients() -> usize {
    1000
}

fn default_subreddits() -> Vec<String> {
    [
        "AskReddit",
        "worldnews",
        "funny",
        "gaming",
        "aww",
        "todayilearned",
        "science",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

const fn default_direct_message_chance() -> f64 {
    0.1
}

const fn default_vote_chance() -> f64 {
    0.5
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use agora_engine::{IdProviderKind, VoteAckPolicy};

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AgoraConfig::default();
        assert_eq!(config.simulation.num_clients, 1000);
        assert_eq!(config.simulation.subreddits.len(), 7);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.engine.vote_ack, VoteAckPolicy::Single);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
engine:
  mailbox_capacity: 64
  readiness_timeout_ms: 250
  vote_ack: double
  id_provider: sequential
  node_tag: 9

simulation:
  num_clients: 12
  subreddits:
    - rust
    - golang
  direct_message_chance: 0.5
  vote_chance: 0.25
  seed: 42

server:
  host: "127.0.0.1"
  port: 9090
"#;
        let config = AgoraConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.engine.mailbox_capacity, 64);
        assert_eq!(config.engine.vote_ack, VoteAckPolicy::Double);
        assert_eq!(config.engine.id_provider, IdProviderKind::Sequential);
        assert_eq!(config.engine.node_tag, 9);
        assert_eq!(config.simulation.num_clients, 12);
        assert_eq!(config.simulation.subreddits, vec!["rust", "golang"]);
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.server.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = AgoraConfig::parse("simulation:\n  num_clients: 3\n");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.simulation.num_clients, 3);
        assert_eq!(config.simulation.subreddits.len(), 7);
        assert_eq!(config.engine.readiness_timeout_ms, 5000);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(AgoraConfig::parse("").is_ok());
    }

    #[test]
    fn overrides_replace_listener() {
        let mut server = ServerConfig::default();
        let result = server.apply_overrides(|name| match name {
            "AGORA_HOST" => Some("10.0.0.1".to_owned()),
            "AGORA_PORT" => Some("7000".to_owned()),
            _ => None,
        });
        assert!(result.is_ok());
        assert_eq!(server.bind_addr(), "10.0.0.1:7000");
    }

    #[test]
    fn malformed_port_override_is_rejected() {
        let mut server = ServerConfig::default();
        let result = server.apply_overrides(|name| {
            (name == "AGORA_PORT").then(|| "not-a-port".to_owned())
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOverride {
                name: "AGORA_PORT",
                ..
            })
        ));
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("does-not-exist.yaml");
        let config = AgoraConfig::load_or_default(&path);
        assert!(config.is_ok());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(DEFAULT_CONFIG_PATH);
        if path.exists() {
            let config = AgoraConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
