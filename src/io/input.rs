use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

use super::DocumentFormat;
use crate::config::CompanyConfig;

/// Retry budget for transient configuration reads. After this many retries
/// the failure is terminal; the UI never starts on a partial configuration.
pub const CONFIG_FETCH_RETRIES: usize = 2;

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => serde_json::from_str::<Value>(contents)
            .with_context(|| "failed to parse JSON document"),
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(contents)
            .with_context(|| "failed to parse YAML document"),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => contents
            .parse::<toml::Value>()
            .with_context(|| "failed to parse TOML document")
            .and_then(|value| {
                serde_json::to_value(value).context("failed to convert TOML to JSON")
            }),
    }
}

/// Parse and shape-check a configuration document. Fail closed: a document
/// that does not match the `CompanyConfig` contract is rejected whole.
pub fn parse_company_config_str(contents: &str, format: DocumentFormat) -> Result<CompanyConfig> {
    let value = parse_document_str(contents, format)?;
    CompanyConfig::from_value(&value)
}

/// Where the configuration document comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    File(PathBuf),
    Stdin,
    Inline(String),
}

impl ConfigSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        ConfigSource::File(path.as_ref().to_path_buf())
    }

    fn read(&self) -> Result<String> {
        match self {
            ConfigSource::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            ConfigSource::Stdin => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("failed to read configuration from stdin")?;
                Ok(buffer)
            }
            ConfigSource::Inline(text) => Ok(text.clone()),
        }
    }

    /// Read the document, retrying file reads a small fixed number of times.
    /// Stdin cannot be replayed and inline content cannot fail, so neither
    /// retries.
    pub fn fetch(&self) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.read() {
                Ok(contents) => return Ok(contents),
                Err(err) => {
                    let retryable = matches!(self, ConfigSource::File(_));
                    if !retryable || attempt >= CONFIG_FETCH_RETRIES {
                        return Err(err);
                    }
                    attempt += 1;
                    warn!(attempt, "retrying configuration read: {err:#}");
                }
            }
        }
    }
}

/// Owns the fetched configuration for the session: fetched once, read-only
/// afterwards, invalidated only by an explicit `refresh`.
#[derive(Debug)]
pub struct ConfigCache {
    source: ConfigSource,
    format: DocumentFormat,
    cached: Option<CompanyConfig>,
}

impl ConfigCache {
    pub fn new(source: ConfigSource, format: DocumentFormat) -> Self {
        Self {
            source,
            format,
            cached: None,
        }
    }

    /// The cached configuration, fetching it on first use.
    pub fn get(&mut self) -> Result<&CompanyConfig> {
        if self.cached.is_none() {
            let contents = self.source.fetch()?;
            self.cached = Some(parse_company_config_str(&contents, self.format)?);
        }
        self.cached
            .as_ref()
            .context("configuration cache is empty")
    }

    /// Discard the cached document and fetch it again.
    pub fn refresh(&mut self) -> Result<&CompanyConfig> {
        self.cached = None;
        self.get()
    }
}
