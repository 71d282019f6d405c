use log::LevelFilter;
use clap::Parser;

/// Settings needed before the config file can be read
#[derive(Parser, Clone)]
#[command(version, about)]
pub struct BootstrapConfig {
    #[clap(short('c'), long("config"), env("ROUTESHARD_CONFIG"), default_value_os = "config.yaml")]
    pub config_file: String,
    #[clap(short('l'), long("log-level"), env("ROUTESHARD_LOG_LEVEL"), default_value_t, value_enum)]
    pub log_level: LogLevel,
}

impl BootstrapConfig {
    pub fn read() -> Self {
        BootstrapConfig::parse()
    }
}


#[derive(clap::ValueEnum, Clone, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::try_parse_from(["routeshard"]).unwrap();
        assert_eq!(config.config_file, "config.yaml");
        assert_eq!(LevelFilter::from(config.log_level), LevelFilter::Info);
    }

    #[test]
    fn test_flags() {
        let config = BootstrapConfig::try_parse_from(["routeshard", "-c", "nyc.yaml", "--log-level", "debug"]).unwrap();
        assert_eq!(config.config_file, "nyc.yaml");
        assert_eq!(LevelFilter::from(config.log_level), LevelFilter::Debug);
    }
}
