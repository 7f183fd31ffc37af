use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub documents: DocumentsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentsConfig {
    /// Directory rendered proposals are written to.
    pub output_dir: PathBuf,
    /// URL path prefix the server mounts `output_dir` under.
    pub public_path: String,
    /// Explicit wkhtmltopdf binary; discovered on PATH when unset.
    pub wkhtmltopdf_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://roofline.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
                busy_timeout_ms: 5_000,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            documents: DocumentsConfig {
                output_dir: PathBuf::from("documents"),
                public_path: "/documents".to_string(),
                wkhtmltopdf_path: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    /// Defaults, then `roofline.toml` (or an explicit path), then
    /// `ROOFLINE_*` environment overrides; validated fail-fast.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(explicit_path) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
            if let Some(busy_timeout_ms) = database.busy_timeout_ms {
                self.database.busy_timeout_ms = busy_timeout_ms;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(documents) = patch.documents {
            if let Some(output_dir) = documents.output_dir {
                self.documents.output_dir = PathBuf::from(output_dir);
            }
            if let Some(public_path) = documents.public_path {
                self.documents.public_path = public_path;
            }
            if let Some(wkhtmltopdf_path) = documents.wkhtmltopdf_path {
                self.documents.wkhtmltopdf_path = Some(wkhtmltopdf_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ROOFLINE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ROOFLINE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("ROOFLINE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ROOFLINE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ROOFLINE_DATABASE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("ROOFLINE_DATABASE_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = parse_u64("ROOFLINE_DATABASE_BUSY_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("ROOFLINE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ROOFLINE_SERVER_PORT") {
            self.server.port = parse_u16("ROOFLINE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("ROOFLINE_DOCUMENTS_OUTPUT_DIR") {
            self.documents.output_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("ROOFLINE_DOCUMENTS_PUBLIC_PATH") {
            self.documents.public_path = value;
        }
        if let Some(value) = read_env("ROOFLINE_WKHTMLTOPDF_PATH") {
            self.documents.wkhtmltopdf_path = Some(value);
        }
        if let Some(value) = read_env("ROOFLINE_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("ROOFLINE_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        let sqlite_url =
            url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
        if !sqlite_url {
            return Err(ConfigError::Validation(
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                    .to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if self.database.timeout_secs == 0 || self.database.timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "database.timeout_secs must be in range 1..=300".to_string(),
            ));
        }
        if self.database.busy_timeout_ms == 0 || self.database.busy_timeout_ms > 60_000 {
            return Err(ConfigError::Validation(
                "database.busy_timeout_ms must be in range 1..=60000".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be greater than zero".to_string(),
            ));
        }
        if self.documents.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "documents.output_dir must not be empty".to_string(),
            ));
        }
        if !self.documents.public_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "documents.public_path must start with `/`".to_string(),
            ));
        }
        let level = self.logging.level.trim().to_ascii_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Validation(
                "logging.level must be one of trace|debug|info|warn|error".to_string(),
            )),
        }
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("roofline.toml"), PathBuf::from("config/roofline.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    documents: Option<DocumentsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
    busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    output_dir: Option<String>,
    public_path: Option<String>,
    wkhtmltopdf_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_validate() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars(&["ROOFLINE_DATABASE_URL", "ROOFLINE_LOG_LEVEL", "ROOFLINE_LOG_FORMAT"]);

        let config = AppConfig::load(None).expect("load defaults");
        assert_eq!(config.database.url, "sqlite://roofline.db");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.documents.public_path, "/documents");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let _guard = env_lock().lock().expect("env lock");

        env::set_var("ROOFLINE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("ROOFLINE_LOG_LEVEL", "warn");

        let result = (|| {
            let dir = TempDir::new().expect("tempdir");
            let path = dir.path().join("roofline.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[server]
port = 9090

[logging]
level = "debug"
format = "json"
"#,
            )
            .expect("write config");

            let config = AppConfig::load(Some(&path)).expect("load");
            assert_eq!(config.database.url, "sqlite://from-env.db");
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.logging.level, "warn");
            assert_eq!(config.logging.format, LogFormat::Json);
        })();

        clear_vars(&["ROOFLINE_DATABASE_URL", "ROOFLINE_LOG_LEVEL"]);
        result
    }

    #[test]
    fn non_sqlite_url_fails_validation() {
        let _guard = env_lock().lock().expect("env lock");

        env::set_var("ROOFLINE_DATABASE_URL", "postgres://nope");
        let error = AppConfig::load(None).expect_err("should fail validation");
        clear_vars(&["ROOFLINE_DATABASE_URL"]);

        assert!(matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("database.url")
        ));
    }

    #[test]
    fn invalid_env_number_is_reported_with_key() {
        let _guard = env_lock().lock().expect("env lock");

        env::set_var("ROOFLINE_SERVER_PORT", "not-a-port");
        let error = AppConfig::load(None).expect_err("should fail parse");
        clear_vars(&["ROOFLINE_SERVER_PORT"]);

        assert!(matches!(
            error,
            ConfigError::InvalidEnvOverride { ref key, .. } if key == "ROOFLINE_SERVER_PORT"
        ));
    }
}
