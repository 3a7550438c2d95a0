//! Configuration types for crudbox.
//!
//! Every section is optional; a missing file section falls back to defaults.
//! Command-line flags are applied on top by the binary.

mod limits;
mod listen;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use limits::{LimitsConfig, ProjectsConfig, StoreConfig};
pub use listen::{AdminConfig, MockConfig, DEFAULT_ADMIN_PORT, DEFAULT_MOCK_PORT};

/// Accepted range for generated project codes.
pub const CODE_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 4..=16;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.admin.port != 0 && self.admin.port == self.mock.port {
            anyhow::bail!(
                "Admin API and mock listener cannot share port {}",
                self.admin.port
            );
        }

        if !CODE_LENGTH_RANGE.contains(&self.projects.code_length) {
            anyhow::bail!(
                "projects.code_length must be between {} and {}, got {}",
                CODE_LENGTH_RANGE.start(),
                CODE_LENGTH_RANGE.end(),
                self.projects.code_length
            );
        }

        if self.limits.max_document_bytes == 0 {
            anyhow::bail!("limits.max_document_bytes must be greater than zero");
        }
        if self.limits.max_response_body_bytes == 0 {
            anyhow::bail!("limits.max_response_body_bytes must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.admin.port, 2525);
        assert_eq!(config.mock.port, 8080);
        assert_eq!(config.projects.code_length, 5);
        assert!(config.store.snapshot_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
admin:
  host: 127.0.0.1
  port: 9000
mock:
  port: 9001
store:
  snapshot_path: /var/lib/crudbox/state.json
projects:
  code_length: 8
limits:
  max_document_bytes: 1048576
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.admin.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.admin.port, 9000);
        assert_eq!(config.mock.port, 9001);
        assert_eq!(config.mock.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(
            config.store.snapshot_path,
            Some(PathBuf::from("/var/lib/crudbox/state.json"))
        );
        assert_eq!(config.projects.code_length, 8);
        assert_eq!(config.limits.max_document_bytes, 1048576);
        assert_eq!(config.limits.max_response_body_bytes, 1024 * 1024);
        assert_eq!(config.admin.socket_addr().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.mock.port = config.admin.port;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.admin.port = 0;
        config.mock.port = 0;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.projects.code_length = 3;
        assert!(config.validate().is_err());
        config.projects.code_length = 17;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.limits.max_document_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mock:\n  port: 18080").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.mock.port, 18080);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "projects:\n  code_length: 99").unwrap();
        assert!(Config::from_file(bad.path()).is_err());

        assert!(Config::from_file("/definitely/not/here.yaml").is_err());
    }
}
