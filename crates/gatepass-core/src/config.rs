use crate::endpoint::{Endpoint, EndpointError};
use crate::mapping::{CredentialMapping, MappingEntry, MappingError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no delivery endpoint configured (set GATEPASS_ENDPOINT or `endpoint`)")]
    MissingEndpoint,
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("no credential mapping configured (set GATEPASS_MAPPING_PATH, `mapping.path` or `mapping.entries`)")]
    MissingMapping,
    #[error("`mapping.path` and `mapping.entries` are mutually exclusive")]
    ConflictingMapping,
}

/// Where the label → credential table is populated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingSource {
    /// A `.toml` or `.json` mapping file.
    Path(PathBuf),
    /// Entries embedded in the config file.
    Inline(Vec<MappingEntry>),
}

impl MappingSource {
    /// Resolve only the mapping source from `GATEPASS_CONFIG` and
    /// `GATEPASS_MAPPING_PATH`. No endpoint is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        match read_config_file(lookup)? {
            Some((src, path)) => Self::from_parts(Some((src.as_str(), path.parent())), lookup),
            None => Self::from_parts(None, lookup),
        }
    }

    /// Like [`Config::from_parts`], reading nothing but the mapping keys.
    pub fn from_parts(
        file: Option<(&str, Option<&Path>)>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (file_cfg, base_dir) = parse_file(file)?;
        mapping_source(file_cfg.mapping, base_dir, &env)
    }

    pub fn load(&self) -> Result<CredentialMapping, MappingError> {
        match self {
            MappingSource::Path(path) => CredentialMapping::load(path),
            MappingSource::Inline(entries) => {
                let mapping = CredentialMapping::from_entries(entries.iter().cloned())?;
                tracing::info!(labels = mapping.len(), "inline credential mapping loaded");
                Ok(mapping)
            }
        }
    }
}

/// Runtime configuration, loaded from an optional TOML file with
/// `GATEPASS_*` environment overrides.
#[derive(Debug, Clone)]
pub struct Config {
    /// Delivery target for resolved credentials.
    pub endpoint: Endpoint,
    /// Whole-request timeout for a delivery attempt.
    pub timeout_secs: u64,
    /// Treat non-2xx responses as delivery failures.
    pub strict_status: bool,
    /// Whether `http://` endpoints were permitted.
    pub allow_insecure_http: bool,
    pub mapping: MappingSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    strict_status: Option<bool>,
    allow_insecure_http: Option<bool>,
    mapping: Option<FileMapping>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileMapping {
    path: Option<PathBuf>,
    entries: Option<Vec<MappingEntry>>,
}

impl Config {
    /// Load configuration from the file named by `GATEPASS_CONFIG` (if any)
    /// and `GATEPASS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        match read_config_file(lookup)? {
            Some((src, path)) => Self::from_parts(Some((src.as_str(), path.parent())), lookup),
            None => Self::from_parts(None, lookup),
        }
    }

    /// Build a config from optional file contents (with the directory that
    /// relative paths are resolved against) and an environment lookup.
    pub fn from_parts(
        file: Option<(&str, Option<&Path>)>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (file_cfg, base_dir) = parse_file(file)?;

        let allow_insecure_http = match env("GATEPASS_ALLOW_INSECURE_HTTP") {
            Some(v) => parse_bool("GATEPASS_ALLOW_INSECURE_HTTP", &v)?,
            None => file_cfg.allow_insecure_http.unwrap_or(false),
        };

        let strict_status = match env("GATEPASS_STRICT_STATUS") {
            Some(v) => parse_bool("GATEPASS_STRICT_STATUS", &v)?,
            None => file_cfg.strict_status.unwrap_or(false),
        };

        let timeout_secs = match env("GATEPASS_TIMEOUT_SECS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "GATEPASS_TIMEOUT_SECS",
                value: v.clone(),
                reason: "expected whole seconds",
            })?,
            None => file_cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                value: "0".into(),
                reason: "must be greater than zero",
            });
        }

        let raw_endpoint = env("GATEPASS_ENDPOINT")
            .or(file_cfg.endpoint)
            .ok_or(ConfigError::MissingEndpoint)?;
        let endpoint = Endpoint::parse(&raw_endpoint, allow_insecure_http)?;

        let mapping = mapping_source(file_cfg.mapping, base_dir, &env)?;

        Ok(Self {
            endpoint,
            timeout_secs,
            strict_status,
            allow_insecure_http,
            mapping,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn read_config_file(
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<(String, PathBuf)>, ConfigError> {
    let Some(path) = env("GATEPASS_CONFIG").map(PathBuf::from) else {
        return Ok(None);
    };
    let src = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some((src, path)))
}

fn parse_file<'a>(
    file: Option<(&str, Option<&'a Path>)>,
) -> Result<(FileConfig, Option<&'a Path>), ConfigError> {
    match file {
        Some((src, dir)) => Ok((toml::from_str::<FileConfig>(src)?, dir)),
        None => Ok((FileConfig::default(), None)),
    }
}

/// `GATEPASS_MAPPING_PATH` wins; otherwise exactly one of `mapping.path`
/// (relative to the config file) and `mapping.entries`.
fn mapping_source(
    section: Option<FileMapping>,
    base_dir: Option<&Path>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<MappingSource, ConfigError> {
    if let Some(path) = env("GATEPASS_MAPPING_PATH") {
        return Ok(MappingSource::Path(PathBuf::from(path)));
    }
    let section = section.unwrap_or_default();
    match (section.path, section.entries) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingMapping),
        (Some(path), None) => Ok(MappingSource::Path(match base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        })),
        (None, Some(entries)) => Ok(MappingSource::Inline(entries)),
        (None, None) => Err(ConfigError::MissingMapping),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}
