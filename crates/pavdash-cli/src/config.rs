//! Process configuration.
//!
//! Settings come from four layers, highest first: command line, environment
//! (both handled by clap), an optional TOML file, and built-in defaults.

use anyhow::{Context, Result};
use pavdash_core::ActivityCatalog;
use pavdash_loader::DEFAULT_FILE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "pavdash.toml";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8050;

/// HTTP server section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Activity naming section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivitiesConfig {
    /// Exactly five labels, in spreadsheet column order
    pub labels: Option<Vec<String>>,
}

/// Contents of `pavdash.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
    pub server: ServerConfig,
    pub activities: ActivitiesConfig,
}

impl FileConfig {
    /// Loads the config file.
    ///
    /// An explicit path must exist. Without one, `pavdash.toml` in the current
    /// directory is used if present, otherwise every setting is left unset.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub file_prefix: String,
    pub host: String,
    pub port: u16,
    pub catalog: ActivityCatalog,
}

impl Settings {
    /// Merge overrides over the file config over the defaults.
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let catalog = match file.activities.labels {
            Some(labels) => {
                ActivityCatalog::new(labels).context("Invalid [activities] labels in config")?
            }
            None => ActivityCatalog::default(),
        };

        Ok(Self {
            data_dir: overrides
                .data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            file_prefix: file
                .file_prefix
                .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string()),
            host: overrides
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            catalog,
        })
    }

    /// Socket address the server binds to.
    pub fn addr(&self) -> Result<SocketAddr> {
        // Bracket bare IPv6 hosts
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{}:{}", host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address: {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavdash_core::Activity;
    use pretty_assertions::assert_eq;

    const FULL: &str = r#"
data_dir = "/srv/producao"
file_prefix = "Obra_"

[server]
host = "0.0.0.0"
port = 9000

[activities]
labels = ["Fresagem", "Rachão", "Base", "Imprimação", "CBUQ"]
"#;

    #[test]
    fn parses_full_file() {
        let config = FileConfig::parse(FULL).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/producao")));
        assert_eq!(config.file_prefix.as_deref(), Some("Obra_"));
        assert_eq!(config.server.port, Some(9000));
        assert_eq!(config.activities.labels.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let settings = Settings::resolve(FileConfig::parse("").unwrap(), Overrides::default()).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("."));
        assert_eq!(settings.file_prefix, DEFAULT_FILE_PREFIX);
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.catalog, ActivityCatalog::default());
    }

    #[test]
    fn overrides_beat_file() {
        let overrides = Overrides {
            data_dir: Some(PathBuf::from("dados")),
            host: None,
            port: Some(8100),
        };
        let settings = Settings::resolve(FileConfig::parse(FULL).unwrap(), overrides).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("dados"));
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8100);
        assert_eq!(settings.catalog.label(Activity::new(2).unwrap()), "Rachão");
    }

    #[test]
    fn wrong_label_count_is_rejected() {
        let config = FileConfig::parse("[activities]\nlabels = [\"A\", \"B\"]\n").unwrap();
        let err = Settings::resolve(config, Overrides::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("activity labels"));
    }

    #[test]
    fn repeated_labels_are_rejected() {
        let config = FileConfig::parse(
            "[activities]\nlabels = [\"Base\", \"Base\", \"C\", \"D\", \"E\"]\n",
        )
        .unwrap();
        let err = Settings::resolve(config, Overrides::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Activity 2 repeats the label"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("porta = 80\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn bind_address() {
        let mut settings = Settings::resolve(FileConfig::default(), Overrides::default()).unwrap();
        assert_eq!(settings.addr().unwrap().to_string(), "127.0.0.1:8050");
        settings.host = "::1".into();
        assert_eq!(settings.addr().unwrap().to_string(), "[::1]:8050");
        settings.host = "not a host".into();
        assert!(settings.addr().is_err());
    }
}
