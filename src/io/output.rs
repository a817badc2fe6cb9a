use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};

use super::DocumentFormat;

/// Where a submitted record goes once the form hands it off.
#[derive(Debug, Clone)]
pub enum RecordSink {
    Stdout,
    File(PathBuf),
}

impl RecordSink {
    pub fn file(path: impl AsRef<Path>) -> Self {
        RecordSink::File(path.as_ref().to_path_buf())
    }

    fn write(&self, payload: &str) -> Result<()> {
        match self {
            RecordSink::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{payload}").context("failed to write to stdout")?;
                stdout.flush().context("failed to flush stdout")
            }
            RecordSink::File(path) => {
                let mut file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                writeln!(file, "{payload}")
                    .with_context(|| format!("failed to write {}", path.display()))
            }
        }
    }
}

/// Serialization choices for the submission hand-off.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub format: DocumentFormat,
    pub pretty: bool,
    /// Wrap the record as `{"company": ..., "record": ...}` so downstream
    /// consumers know which form produced it.
    pub envelope: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            format: DocumentFormat::Json,
            pretty: true,
            envelope: false,
        }
    }
}

impl EmitOptions {
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_envelope(mut self, envelope: bool) -> Self {
        self.envelope = envelope;
        self
    }
}

/// Hand a validated record to the configured sinks. This is the boundary of
/// the system: nothing is persisted or transmitted beyond this call.
pub fn emit_record(
    company: &str,
    record: &Map<String, Value>,
    sinks: &[RecordSink],
    options: &EmitOptions,
) -> Result<()> {
    if sinks.is_empty() {
        return Ok(());
    }
    let value = if options.envelope {
        json!({ "company": company, "record": record })
    } else {
        Value::Object(record.clone())
    };
    let payload = render(&value, options)?;
    for sink in sinks {
        sink.write(&payload)?;
    }
    Ok(())
}

fn render(value: &Value, options: &EmitOptions) -> Result<String> {
    match options.format {
        DocumentFormat::Json => {
            if options.pretty {
                serde_json::to_string_pretty(value).context("failed to serialize JSON")
            } else {
                serde_json::to_string(value).context("failed to serialize JSON")
            }
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("failed to serialize YAML"),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => {
            if options.pretty {
                toml::to_string_pretty(value).context("failed to serialize TOML")
            } else {
                toml::to_string(value).context("failed to serialize TOML")
            }
        }
    }
}
