//! Configuration and constants for the recorder.

use super::error::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable overriding the artifact path
pub const OUTPUT_ENV_VAR: &str = "CALLTRACE_OUTPUT";

/// Environment variable selecting the serialization variant
pub const FORMAT_ENV_VAR: &str = "CALLTRACE_FORMAT";

/// Artifact file stem used when no path is configured
pub const DEFAULT_OUTPUT_STEM: &str = "perfdata";

/// Write buffer in front of the artifact file (bytes)
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

// Section markers of the plain text artifact
pub const METHODS_MARKER: &str = "methods:";
pub const THREADS_MARKER: &str = "threads:";
pub const DURATION_MARKER: &str = "duration:";

// Entry names of the container artifact
pub const DATA_ENTRY: &str = "data";
pub const METHODS_ENTRY: &str = "methods";
pub const HEADER_ENTRY: &str = "header";

/// Serialization variant of the trace artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceFormat {
    /// Single pipe-delimited text stream with trailing sections
    #[default]
    Text,
    /// Zip archive with `data`, `methods` and `header` entries
    Container,
}

impl TraceFormat {
    /// File extension used for the default artifact path
    pub fn extension(self) -> &'static str {
        match self {
            TraceFormat::Text => "trace",
            TraceFormat::Container => "zip",
        }
    }
}

impl FromStr for TraceFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(TraceFormat::Text),
            "container" | "zip" => Ok(TraceFormat::Container),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceFormat::Text => write!(f, "text"),
            TraceFormat::Container => write!(f, "container"),
        }
    }
}

/// Settings for a recording session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Where the artifact is written
    pub output_path: PathBuf,

    /// Which serialization variant to use
    pub format: TraceFormat,

    /// Capacity of the buffered writer in front of the artifact
    pub buffer_capacity: usize,
}

impl RecorderConfig {
    /// Config for `format` at its default path (`perfdata.<ext>`)
    pub fn new(format: TraceFormat) -> Self {
        Self {
            output_path: default_output_path(format),
            format,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Override the artifact path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Resolve configuration from `CALLTRACE_FORMAT` and `CALLTRACE_OUTPUT`
    ///
    /// **Public** - used by hosts that have no command line of their own
    ///
    /// # Errors
    /// * `ConfigError::UnknownFormat` - unrecognised `CALLTRACE_FORMAT`
    /// * `ConfigError::EmptyPath` - `CALLTRACE_OUTPUT` is set but empty
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup(FORMAT_ENV_VAR) {
            Some(value) => value.parse()?,
            None => TraceFormat::default(),
        };

        let mut config = Self::new(format);
        if let Some(path) = lookup(OUTPUT_ENV_VAR) {
            if path.trim().is_empty() {
                return Err(ConfigError::EmptyPath);
            }
            config.output_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::new(TraceFormat::default())
    }
}

/// Default artifact path for a format
pub fn default_output_path(format: TraceFormat) -> PathBuf {
    PathBuf::from(format!("{}.{}", DEFAULT_OUTPUT_STEM, format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RecorderConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.format, TraceFormat::Text);
        assert_eq!(config.output_path, PathBuf::from("perfdata.trace"));
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn test_container_default_extension() {
        let config =
            RecorderConfig::from_lookup(lookup_from(&[(FORMAT_ENV_VAR, "container")])).unwrap();
        assert_eq!(config.output_path, PathBuf::from("perfdata.zip"));
    }

    #[test]
    fn test_output_override_kept_verbatim() {
        let config = RecorderConfig::from_lookup(lookup_from(&[
            (FORMAT_ENV_VAR, "ZIP"),
            (OUTPUT_ENV_VAR, "/tmp/run/profile.bin"),
        ]))
        .unwrap();
        assert_eq!(config.format, TraceFormat::Container);
        assert_eq!(config.output_path, PathBuf::from("/tmp/run/profile.bin"));
    }

    #[test]
    fn test_unknown_format() {
        let result = RecorderConfig::from_lookup(lookup_from(&[(FORMAT_ENV_VAR, "parquet")]));
        assert_eq!(result, Err(ConfigError::UnknownFormat("parquet".to_string())));
    }

    #[test]
    fn test_empty_output_rejected() {
        let result = RecorderConfig::from_lookup(lookup_from(&[(OUTPUT_ENV_VAR, "  ")]));
        assert_eq!(result, Err(ConfigError::EmptyPath));
    }
}
