use common::types::config::Config;
use log::info;
use std::fmt;
use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use crate::bootstrap_config::BootstrapConfig;

pub(super) fn load_config(bootstrap_config: &BootstrapConfig) -> Result<Config, ConfigError> {
    let path = Path::new(&bootstrap_config.config_file);

    let config = File::open(path)
        .map_err(|err| ConfigError::File(path.to_path_buf(), err))
        .and_then(|file| read_config(file, path))?;

    info!(target: "main", "Config read successfully from '{}'", path.display());

    Ok(config)
}

/// Read through a plain `Value` first; the version tag alone loses nested sections otherwise.
fn read_config(reader: impl Read, path: &Path) -> Result<Config, ConfigError> {
    let value: serde_yml::Value = serde_yml::from_reader(reader)
        .map_err(|err| ConfigError::Parse(path.to_path_buf(), err))?;

    serde_yml::from_value(value).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    File(PathBuf, std::io::Error),
    Parse(PathBuf, serde_yml::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::File(path, err) => write!(f, "Could not open '{}': {}", path.display(), err),
            ConfigError::Parse(path, err) => write!(f, "Could not parse '{}': {}", path.display(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::config::{NamedResolver, OutputFormat, ResolverConfig};

    const CONFIG: &str = r#"
version: "1"
engine:
  port: 5001
  profile: car
  require_healthy: true
  resolver: hostname
  request_timeout: 10s
  execution_units: 8
dataset:
  id: nyc-taxi
  src:
    path: ./data/nyc_taxi.csv
  format: csv
  prepare:
    spanning: 2016-01-01T00:00:00
    derive_ground_truth: true
tables:
  enabled: true
  window: 1
output:
  format: ipc
  route_lines: true
"#;

    #[test]
    fn test_read_config() {
        let Config::Version1 { engine, dataset, routes, tables, output } =
            read_config(CONFIG.as_bytes(), Path::new("config.yaml")).unwrap();

        assert_eq!(engine.port, 5001);
        assert_eq!(engine.profile, "car");
        assert!(engine.require_healthy);
        assert_eq!(engine.resolver, ResolverConfig::Named(NamedResolver::Hostname));
        assert_eq!(engine.request_timeout.0, 10.0);
        assert_eq!(engine.connect_timeout.0, 5.0);
        assert_eq!(engine.execution_units, Some(8));
        assert_eq!(dataset.id, "nyc-taxi");
        assert!(routes.enabled);
        assert!(tables.enabled);
        assert_eq!(output.format, OutputFormat::Ipc);
        assert!(output.route_lines);
    }

    #[test]
    fn test_engine_after_dataset() {
        let yaml = r#"
version: "1"
dataset:
  id: trips
  src:
    path: trips.csv
  format: parquet
engine:
  port: 5002
  request_timeout: 2.5s
"#;
        let Config::Version1 { engine, dataset, .. } =
            read_config(yaml.as_bytes(), Path::new("config.yaml")).unwrap();

        assert_eq!(engine.port, 5002);
        assert_eq!(engine.profile, "driving");
        assert_eq!(engine.request_timeout.0, 2.5);
        assert_eq!(dataset.id, "trips");
    }

    #[test]
    fn test_missing_file() {
        let bootstrap_config = BootstrapConfig {
            config_file: "./does/not/exist.yaml".into(),
            log_level: Default::default(),
        };
        let err = load_config(&bootstrap_config).unwrap_err();
        assert!(err.to_string().starts_with("Could not open './does/not/exist.yaml'"));
    }

    #[test]
    fn test_unknown_version() {
        let err = read_config("version: \"2\"\n".as_bytes(), Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }
}
