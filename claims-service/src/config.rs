use crate::coerce::CoercionMode;
use crate::error::ClaimsResult;
use ::config::{Config, Environment, File};
use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `CLAIMTRACK__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "CLAIMTRACK";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub coercion: CoercionMode,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            coercion: CoercionMode::Lenient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a multipart upload request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// ClaimTrack configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Directory searched for `claims.json` / `claims.csv`
    pub data_dir: PathBuf,
    pub import: ImportConfig,
    pub server: ServerConfig,
    pub logging: LoggerConfig,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            data_dir: PathBuf::from("data"),
            import: ImportConfig::default(),
            server: ServerConfig::default(),
            logging: LoggerConfig::default(),
        }
    }
}

impl ClaimsConfig {
    /// Load from an optional file and `CLAIMTRACK__*` environment variables.
    ///
    /// Without an explicit path, `claimtrack.{toml,yaml,json}` in the working
    /// directory is used if present.
    ///
    /// # Errors
    ///
    /// Fails when an explicit file is missing or any source has invalid values.
    pub fn load(path: Option<&Path>) -> ClaimsResult<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("claimtrack").required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// `host:port` the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logger_redacted::LogFormat;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClaimsConfig::default();
        assert_eq!(config.import.coercion, CoercionMode::Lenient);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/srv/claims"

[import]
coercion = "strict"

[server]
port = 9090

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = ClaimsConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/claims"));
        assert_eq!(config.import.coercion, CoercionMode::Strict);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        assert!(ClaimsConfig::load(Some(Path::new("/nonexistent/claimtrack.toml"))).is_err());
    }
}
