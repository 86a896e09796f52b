//! Server configuration
//!
//! Each setting is taken from the first source that provides it: command
//! line flag, environment variable, TOML config file, built-in default.

use docqr_connection::RetryPolicy;
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::cli::GlobalOptions;

pub const DEFAULT_DATABASE_URI: &str = "mongodb://localhost:27017/pdfLibrary";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPLOAD_DIR: &str = "public/pdfs";

/// Legacy name of `MONGODB_URI`, still honored
const LEGACY_DATABASE_URI_VAR: &str = "MONGO_URI";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: impl Into<String>, reason: impl Display) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database_uri: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upload_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
    pub public_url: Option<String>,
    pub retry: RetryFileConfig,
    pub log: LogFileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryFileConfig {
    pub attempts: Option<u32>,
    pub delay_secs: Option<u64>,
    pub exponential: Option<bool>,
    pub max_delay_secs: Option<u64>,
    pub attempt_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogFileConfig {
    pub json: Option<bool>,
    /// Directory for daily rolling JSON log files
    pub dir: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is not set
    pub filter: Option<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings of one `docqr` invocation.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_uri: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Base URL for download codes; derived per request when unset
    pub public_url: Option<String>,
    pub retry: RetryPolicy,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
    /// Warnings found while loading, logged once logging is up
    pub notices: Vec<String>,
}

impl ServerConfig {
    /// Load from the process environment and the config file named by
    /// `--config` / `DOCQR_CONFIG`.
    pub fn load(options: &GlobalOptions) -> Result<Self, ConfigError> {
        let file = match &options.config {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(options, file, &|key: &str| std::env::var(key).ok())
    }

    /// Merge the sources. `env` looks up an environment variable.
    pub fn resolve(
        options: &GlobalOptions,
        file: FileConfig,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let mut notices = Vec::new();

        let database_uri = match options.database_uri.clone().or_else(|| env("MONGODB_URI")) {
            Some(uri) => uri,
            None => match env(LEGACY_DATABASE_URI_VAR) {
                Some(uri) => {
                    notices.push(format!(
                        "{LEGACY_DATABASE_URI_VAR} is deprecated, set MONGODB_URI instead"
                    ));
                    uri
                }
                None => file
                    .database_uri
                    .unwrap_or_else(|| DEFAULT_DATABASE_URI.to_string()),
            },
        };

        let host = options
            .host
            .clone()
            .or_else(|| env("HOST"))
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match options.port {
            Some(port) => port,
            None => parsed(&env, "PORT")?.or(file.port).unwrap_or(DEFAULT_PORT),
        };

        let upload_dir = options
            .upload_dir
            .clone()
            .or_else(|| env("UPLOAD_DIR").map(PathBuf::from))
            .or(file.upload_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));

        let max_upload_bytes = match options.max_upload_bytes {
            Some(bytes) => bytes,
            None => parsed(&env, "MAX_UPLOAD_BYTES")?
                .or(file.max_upload_bytes)
                .unwrap_or(docqr_services::DEFAULT_MAX_UPLOAD_BYTES),
        };
        if max_upload_bytes == 0 {
            return Err(ConfigError::invalid(
                "max_upload_bytes",
                "0",
                "must be greater than zero",
            ));
        }

        let public_url = options
            .public_url
            .clone()
            .or_else(|| env("PUBLIC_URL"))
            .or(file.public_url)
            .map(|url| normalize_public_url(&url))
            .transpose()?;

        let retry = resolve_retry(options, &file.retry, &env)?;

        let log_json = options.log_json
            || flag(&env, "DOCQR_LOG_JSON")?
                .or(file.log.json)
                .unwrap_or(false);
        let log_dir = env("DOCQR_LOG_DIR").map(PathBuf::from).or(file.log.dir);

        Ok(Self {
            database_uri,
            host,
            port,
            upload_dir,
            max_upload_bytes,
            public_url,
            retry,
            log_json,
            log_dir,
            log_filter: file.log.filter,
            notices,
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL for codes generated outside of a request
    pub fn base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.clone(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// Warning for servers that build code URLs from request headers.
    ///
    /// Codes are cached on first render, so without a public URL the first
    /// client's `Host` header ends up in every later viewer's code.
    pub fn public_url_warning(&self) -> Option<String> {
        match self.public_url {
            Some(_) => None,
            None => Some(
                "PUBLIC_URL is not set; download codes use the Host header of the request \
                 that first renders them"
                    .to_string(),
            ),
        }
    }
}

fn resolve_retry(
    options: &GlobalOptions,
    file: &RetryFileConfig,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<RetryPolicy, ConfigError> {
    let defaults = RetryPolicy::default();

    let attempts = match options.retry_attempts {
        Some(attempts) => attempts,
        None => parsed(env, "DOCQR_RETRY_ATTEMPTS")?
            .or(file.attempts)
            .unwrap_or(defaults.max_attempts()),
    };
    let delay = match options.retry_delay_secs {
        Some(secs) => Duration::from_secs(secs),
        None => parsed(env, "DOCQR_RETRY_DELAY_SECS")?
            .or(file.delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.base_delay()),
    };
    let exponential = options.retry_exponential
        || flag(env, "DOCQR_RETRY_EXPONENTIAL")?
            .or(file.exponential)
            .unwrap_or(false);

    Ok(RetryPolicy::new(attempts, delay)
        .exponential(exponential)
        .with_max_delay(
            file.max_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_delay()),
        )
        .with_attempt_timeout(
            file.attempt_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.attempt_timeout()),
        ))
}

fn parsed<T>(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    env(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(key, value.as_str(), e))
        })
        .transpose()
}

fn flag(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>, ConfigError> {
    env(key)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, value.as_str(), "expected true or false")),
        })
        .transpose()
}

fn normalize_public_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ConfigError::invalid("public_url", raw, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "public_url",
            raw,
            "scheme must be http or https",
        ));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests;
