use std::fmt;
use std::path::Path;

/// Supported data formats for configuration input and submission output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => "yaml",
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => "toml",
        }
    }

    /// Infer the format from a file extension. Unknown or missing extensions
    /// fall back to JSON, the only format that is always compiled in.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "yaml")]
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            #[cfg(feature = "toml")]
            Some("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unknown_extensions_default_to_json() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("config.conf")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("config")),
            DocumentFormat::Json
        );
    }

    #[test]
    fn json_extension_is_recognized() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("companies.json")),
            DocumentFormat::Json
        );
    }
}
