use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration, usually read from a TOML file.
///
/// Every section is optional; an empty document yields the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Options forwarded to the foreign front end
    #[serde(default)]
    pub compile: CompileOptions,

    /// Limits and debugging switches for the managed heap
    #[serde(default)]
    pub heap: HeapSettings,

    /// Checks applied while linking a stencil into a script
    #[serde(default)]
    pub link: LinkSettings,
}

/// Options consumed by the foreign front end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Do not keep the value of the last top-level expression statement
    #[serde(default)]
    pub no_result_value: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeapSettings {
    /// Heap size (bytes) above which an allocation first runs a collection
    #[serde(default = "default_gc_threshold")]
    pub gc_threshold: usize,

    /// Hard heap size limit (bytes); allocations beyond it fail
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Collect before every allocation
    #[serde(default)]
    pub gc_zeal: bool,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            gc_threshold: default_gc_threshold(),
            max_bytes: default_max_bytes(),
            gc_zeal: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LinkSettings {
    /// Re-check the structural consistency of every stencil before linking
    #[serde(default)]
    pub validate_stencils: bool,
}

pub fn default_gc_threshold() -> usize {
    1024 * 1024
}

pub fn default_max_bytes() -> usize {
    64 * 1024 * 1024
}

impl EngineConfig {
    /// Parses a configuration document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        log::debug!("Loaded engine configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Checks settings that can contradict each other. Runs on every load;
    /// call it directly for a config built in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heap.gc_threshold > self.heap.max_bytes {
            return Err(ConfigError::InvalidHeapLimits {
                gc_threshold: self.heap.gc_threshold,
                max_bytes: self.heap.max_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(!config.compile.no_result_value);
        assert_eq!(config.heap.gc_threshold, 1024 * 1024);
        assert!(!config.link.validate_stencils);
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
[compile]
no_result_value = true

[heap]
gc_zeal = true
"#,
        )
        .unwrap();
        assert!(config.compile.no_result_value);
        assert!(config.heap.gc_zeal);
        assert_eq!(config.heap.max_bytes, default_max_bytes());
    }

    #[test]
    fn test_threshold_above_limit_is_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
[heap]
gc_threshold = 4096
max_bytes = 1024
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeapLimits { .. }));
    }

    #[test]
    fn test_config_built_in_code_validates() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());
        config.heap.gc_threshold = config.heap.max_bytes + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHeapLimits { .. })
        ));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = EngineConfig::from_toml_str("[link]\nvalidate_stencils = \"yes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
