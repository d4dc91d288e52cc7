//! Credential mapping: the read-only label → credential table.
//!
//! Built once at startup from a TOML or JSON source and never mutated.
//! Lookups are exact string matches with no normalization.

use crate::types::{CredentialPair, ResolutionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("failed to read mapping file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid TOML mapping: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON mapping: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate label in mapping: {0:?}")]
    DuplicateLabel(String),
    #[error("unsupported mapping file extension: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),
}

/// One row of a mapping source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub label: String,
    pub person_id: String,
    pub person_code: String,
}

/// On-disk shape shared by the TOML and JSON formats.
#[derive(Debug, Deserialize)]
struct MappingFile {
    #[serde(default)]
    entries: Vec<MappingEntry>,
}

/// Immutable label → credential table.
#[derive(Debug, Clone, Default)]
pub struct CredentialMapping {
    entries: BTreeMap<String, CredentialPair>,
}

impl CredentialMapping {
    /// Build a mapping from entries. Duplicate labels are rejected.
    pub fn from_entries(
        entries: impl IntoIterator<Item = MappingEntry>,
    ) -> Result<Self, MappingError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let pair = CredentialPair::new(entry.person_id, entry.person_code);
            if map.insert(entry.label.clone(), pair).is_some() {
                return Err(MappingError::DuplicateLabel(entry.label));
            }
        }
        if map.is_empty() {
            tracing::warn!("credential mapping is empty; every label will be unresolved");
        }
        Ok(Self { entries: map })
    }

    /// Parse a TOML document of `[[entries]]` tables.
    pub fn from_toml_str(src: &str) -> Result<Self, MappingError> {
        let file: MappingFile = toml::from_str(src)?;
        Self::from_entries(file.entries)
    }

    /// Parse a JSON document of the form `{"entries": [...]}`.
    pub fn from_json_str(src: &str) -> Result<Self, MappingError> {
        let file: MappingFile = serde_json::from_str(src)?;
        Self::from_entries(file.entries)
    }

    /// Load a mapping file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let read = || {
            std::fs::read_to_string(path).map_err(|source| MappingError::Io {
                path: path.display().to_string(),
                source,
            })
        };

        let mapping = match ext.as_str() {
            "toml" => Self::from_toml_str(&read()?)?,
            "json" => Self::from_json_str(&read()?)?,
            other => return Err(MappingError::UnsupportedFormat(other.to_string())),
        };

        tracing::info!(
            path = %path.display(),
            labels = mapping.len(),
            "credential mapping loaded"
        );
        Ok(mapping)
    }

    /// Exact-match lookup. Has no side effects.
    pub fn resolve(&self, label: &str) -> ResolutionResult {
        match self.entries.get(label) {
            Some(pair) => ResolutionResult::Resolved(pair.clone()),
            None => ResolutionResult::Unresolved(label.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels with their credential pairs, in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CredentialPair)> {
        self.entries.iter().map(|(label, pair)| (label.as_str(), pair))
    }
}
