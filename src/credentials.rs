//! Persistent key/value storage for the text-transform API key and model name.

use crate::config::Config;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Key holding the API key.
pub const API_KEY: &str = "openai_api_key";
/// Key holding the preferred model name.
pub const MODEL_KEY: &str = "openai_model";

/// Failure to read or write stored credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The backing file could not be read or written.
    #[error("credential store I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("credential store is malformed: {0}")]
    Malformed(String),
}

/// Key/value persistence for credentials.
pub trait CredentialStore {
    /// Returns the stored value for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CredentialError>;
}

#[derive(Clone, Debug)]
/// Credentials kept as a JSON object in one file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    /// Store backed by `path`; the file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| CredentialError::Malformed(e.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&values)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
/// Credentials held in memory only.
pub struct MemoryCredentialStore {
    values: BTreeMap<String, String>,
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CredentialError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Everything a text-transform request needs besides the text.
pub struct ApiConfig {
    /// API key; requests are refused while this is empty.
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// Chat-completion endpoint.
    pub endpoint: String,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl ApiConfig {
    /// Stored values layered over the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn from_store(
        store: &impl CredentialStore,
        config: &Config,
    ) -> Result<Self, CredentialError> {
        let api_key = store.get(API_KEY)?.filter(|k| !k.trim().is_empty());
        let model = store
            .get(MODEL_KEY)?
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| config.model.clone());
        Ok(Self {
            api_key,
            model,
            endpoint: config.endpoint.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    #[must_use]
    /// Whether an API key is available.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
#[path = "tests/credentials.rs"]
mod tests;
