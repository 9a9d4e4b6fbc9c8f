use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::home_dir::resolve_home_dir;

/// Server-wide settings plus one raw section per module (`modules.taskboard`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Required by `run` unless `--mock` is given.
    pub database: Option<DatabaseConfig>,
    /// Falls back to [`default_logging_config`] when absent.
    pub logging: Option<LoggingConfig>,
    /// Decoded lazily by [`AppConfig::module_config`].
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base for log files and relative sqlite paths; absolute after loading.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout in seconds; 0 disables the timeout layer.
    #[serde(default)]
    pub timeout_sec: u64,
    /// Origin allowed to call `/api/**` cross-site; None disables CORS headers.
    #[serde(default)]
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://<path>` relative to `home_dir`, or `sqlite::memory:`.
    pub url: String,
    /// Pool size; 10 when unset.
    pub max_conns: Option<u32>,
    pub busy_timeout_ms: Option<u32>,
}

/// Log sinks keyed by tracing target prefix (`taskboard`, `sea_orm`, ...).
/// `default` receives every event no other key claims.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    /// `off` silences the console for this target.
    pub console_level: String,
    /// Relative to `home_dir`; empty disables the file sink.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => $HOME/.taskboard (%APPDATA%/.taskboard on Windows)
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8087,
            timeout_sec: 0,
            cors_allowed_origin: None,
        }
    }
}

/// Console at info, `logs/taskboard.log` at debug.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/taskboard.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(DatabaseConfig {
                url: "sqlite://database/taskboard.db".to_string(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Read `config_path` over the built-in server defaults, then `APP__*`
    /// environment overrides. `server.home_dir` comes back absolute and created.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // figment treats a missing file as an empty provider.
        if !config_path.as_ref().is_file() {
            anyhow::bail!(
                "config file not found: {}",
                config_path.as_ref().display()
            );
        }

        // database/logging stay None unless the file or env sets them.
        let base = AppConfig {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules: HashMap::new(),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path.as_ref()))
            // APP__SERVER__PORT=8087 maps to server.port
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .context("Failed to extract config from figment")?;

        normalize_home_dir_inplace(&mut config.server)
            .context("Failed to resolve server.home_dir")?;

        Ok(config)
    }

    /// Without a path the server runs on [`AppConfig::default`].
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.server)
                    .context("Failed to resolve server.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Rendering used by `--print-config` and `check`.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed view of one module's configuration; defaults when the module has no entry.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(module_name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid configuration for module '{module_name}'")),
            None => Ok(T::default()),
        }
    }

    /// `--port` wins over the file; each `-v` raises console verbosity one step.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(),
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }
}

/// Flags of `taskboard-server` the configuration layer cares about.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}

const DEFAULT_SUBDIR: &str = ".taskboard";

fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let opt = if server.home_dir.trim().is_empty() {
        None
    } else {
        Some(server.home_dir.clone())
    };

    let resolved: PathBuf =
        resolve_home_dir(opt, DEFAULT_SUBDIR, true).context("home_dir normalization failed")?;

    server.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn is_normalized_path(p: &str) -> bool {
        PathBuf::from(p).is_absolute() && !p.starts_with('~')
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct PagingSection {
        #[serde(default)]
        default_page_size: u32,
    }

    #[test]
    fn defaults_point_at_local_sqlite_and_log_file() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8087);
        assert_eq!(config.server.home_dir, "");

        let db = config.database.as_ref().unwrap();
        assert_eq!(db.url, "sqlite://database/taskboard.db");
        assert_eq!(db.max_conns, Some(10));

        let logging = config.logging.as_ref().unwrap();
        assert_eq!(logging["default"].file, "logs/taskboard.log");
        assert!(config.modules.is_empty());
    }

    #[test]
    fn yaml_values_override_defaults_and_home_dir_is_created() {
        let tmp = tempdir().unwrap();
        let home = tmp.path().join("taskboard-home");
        let cfg_path = tmp.path().join("cfg.yaml");

        let yaml = format!(
            r#"
server:
  home_dir: "{}"
  host: "0.0.0.0"
  port: 9090
  timeout_sec: 30

database:
  url: "sqlite::memory:"
  max_conns: 1

logging:
  default:
    console_level: debug
    file: "logs/default.log"
"#,
            home.to_string_lossy().replace('\\', "/")
        );
        fs::write(&cfg_path, yaml).unwrap();

        let config = AppConfig::load_layered(&cfg_path).unwrap();

        assert!(is_normalized_path(&config.server.home_dir));
        assert!(home.is_dir());
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.timeout_sec, 30);
        assert_eq!(config.database.as_ref().unwrap().url, "sqlite::memory:");
        assert_eq!(config.logging.as_ref().unwrap()["default"].console_level, "debug");
    }

    #[test]
    fn server_only_yaml_leaves_optional_sections_empty() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        let yaml = format!(
            "server:\n  home_dir: \"{}\"\n  host: \"localhost\"\n  port: 8080\n",
            tmp.path().join("minimal").to_string_lossy().replace('\\', "/")
        );
        fs::write(&cfg_path, yaml).unwrap();

        let config = AppConfig::load_layered(&cfg_path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.database.is_none());
        assert!(config.logging.is_none());
        assert!(config.modules.is_empty());
    }

    #[test]
    fn port_flag_and_verbosity_override_file_values() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (3, "trace")] {
            let mut config = AppConfig::default();
            let args = CliArgs {
                port: Some(3000),
                verbose,
                ..Default::default()
            };
            config.apply_cli_overrides(&args);

            assert_eq!(config.server.port, 3000);
            let logging = config.logging.as_ref().unwrap();
            assert_eq!(logging["default"].console_level, expected);
        }
    }

    #[test]
    fn taskboard_section_is_decoded_on_demand() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        let yaml = format!(
            r#"
server:
  home_dir: "{}"
  host: "127.0.0.1"
  port: 8087
modules:
  taskboard:
    default_page_size: 7
"#,
            tmp.path().join("home").to_string_lossy().replace('\\', "/")
        );
        fs::write(&cfg_path, yaml).unwrap();

        let config = AppConfig::load_layered(&cfg_path).unwrap();
        let paging: PagingSection = config.module_config("taskboard").unwrap();
        let missing: PagingSection = config.module_config("reports").unwrap();
        assert_eq!(paging.default_page_size, 7);
        assert_eq!(missing, PagingSection::default());
    }

    #[test]
    fn malformed_module_section_names_the_module() {
        let mut config = AppConfig::default();
        config
            .modules
            .insert("taskboard".into(), serde_json::json!({ "default_page_size": "many" }));
        let err = config.module_config::<PagingSection>("taskboard").unwrap_err();
        assert!(err.to_string().contains("taskboard"));
    }

    #[test]
    fn printed_config_shows_cors_origin() {
        let mut config = AppConfig::default();
        config.server.cors_allowed_origin = Some("http://localhost:3000".into());
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("cors_allowed_origin:"), "{yaml}");
        assert!(yaml.contains("http://localhost:3000"), "{yaml}");
        assert!(yaml.contains("sqlite://database/taskboard.db"), "{yaml}");
    }

    #[test]
    fn unknown_server_key_is_rejected() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        let yaml = format!(
            "server:\n  home_dir: \"{}\"\n  port: 8087\n  listen: all\n",
            tmp.path().join("home").to_string_lossy().replace('\\', "/")
        );
        fs::write(&cfg_path, yaml).unwrap();
        assert!(AppConfig::load_layered(&cfg_path).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let err = AppConfig::load_layered(tmp.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
