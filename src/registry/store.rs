use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::signature::Signature;
use crate::extraction::{compute_signature_with, list_images, ExtractionConfig};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("Failed to list {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Snapshot version for compatibility checking
pub const REGISTRY_VERSION: &str = "1.0.0";

/// One named reference in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub signature: Signature,
}

/// Serializable registry format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryData {
    pub version: String,
    pub created_at: String,
    pub entries: Vec<RegistryEntry>,
}

/// Reference signatures keyed by name.
///
/// Iteration is in lexicographic name order, which also decides ties during
/// matching.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, Signature>,
    extraction: ExtractionConfig,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that extracts with a custom configuration
    #[must_use]
    pub fn with_extraction(extraction: ExtractionConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            extraction,
        }
    }

    /// Register every supported image directly inside `folder`.
    ///
    /// Files whose signature could not be fully extracted are skipped with a
    /// warning. Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder does not exist or cannot be listed.
    pub fn register(&mut self, folder: &Path) -> Result<usize, RegistryError> {
        if !folder.exists() {
            return Err(RegistryError::FolderNotFound(folder.to_path_buf()));
        }

        let paths = list_images(folder).map_err(|source| RegistryError::ReadDir {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut added = 0;
        for path in paths {
            let signature = compute_signature_with(&path, &self.extraction);
            if let Some(error) = &signature.error {
                warn!("Skipping {}: {error}", path.display());
                continue;
            }

            debug!(
                "Registered {} ({} templates)",
                signature.file_name,
                signature.template_count()
            );
            self.insert(signature.file_name.clone(), signature);
            added += 1;
        }

        info!("Registered {added} images from {}", folder.display());
        Ok(added)
    }

    /// Add or replace a single entry
    pub fn insert(&mut self, name: impl Into<String>, signature: Signature) {
        let name = name.into();
        if self.entries.contains_key(&name) {
            warn!("Replacing existing registry entry '{name}'");
        }
        self.entries.insert(name, signature);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.entries.get(name)
    }

    /// Entry names in iteration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Signature)> {
        self.entries.iter().map(|(name, sig)| (name.as_str(), sig))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a snapshot written by [`Registry::save`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a snapshot from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a registry.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let data: RegistryData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != REGISTRY_VERSION {
            warn!(
                "Registry version mismatch (expected {REGISTRY_VERSION}, found {})",
                data.version
            );
        }

        let mut registry = Self::new();
        for entry in data.entries {
            registry.insert(entry.name, entry.signature);
        }
        Ok(registry)
    }

    /// Export the registry, template pixels included, to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        let data = RegistryData {
            version: REGISTRY_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            entries: self
                .entries
                .iter()
                .map(|(name, signature)| RegistryEntry {
                    name: name.clone(),
                    signature: signature.clone(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Write the JSON snapshot to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
