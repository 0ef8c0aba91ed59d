//! YAML agent roster.
//!
//! The configuration resource is a document with a top-level `agents`
//! sequence. A document without the key loads as an empty roster.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ConfigError;

/// Default path of the configuration resource.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub agents: Vec<AgentDefinition>,
}

/// One persona entry from the roster.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentDefinition {
    pub name: String,
    pub system_message: String,
}

impl Config {
    /// Load the roster from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        info!(
            "Loaded {} agent definition(s) from {}",
            config.agents.len(),
            path.display()
        );
        Ok(config)
    }

    /// Write a starter roster to `path`. Refuses to overwrite.
    pub fn create_starter(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!(
                    "config file already exists at {}, edit it directly",
                    path.display()
                ),
            )));
        }

        // The "Ptolmey" spelling is the registry key the demo looks up;
        // downstream lookups depend on the exact string.
        let template = r#"agents:
  - name: Ptolmey
    system_message: "You are Greek Astronomer Ptolemy, known for your geocentric model of the universe."
  - name: Aryabhata
    system_message: "Act as Indian astronomer Aryabhata, known for your contributions to mathematics and astronomy, including the approximation of pi and heliocentric ideas."
"#;

        std::fs::write(path, template)?;
        info!("Created starter config at {}", path.display());
        Ok(())
    }
}
