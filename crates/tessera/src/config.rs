//! Code-generation options.

use anyhow::Result;
use serde::Deserialize;

/// Options consumed by the statement renderer.
///
/// The surrounding build pipeline loads these from its TOML configuration;
/// defaults match the bundle runtime shipped with tessera.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Name of the module-require function in emitted code.
    pub require_function: String,
    /// Emit explanatory comments ahead of generated statements.
    pub emit_comments: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            require_function: "__tessera_require__".to_string(),
            emit_comments: true,
        }
    }
}

impl CodegenConfig {
    /// Parse options from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodegenConfig::default();
        assert_eq!(config.require_function, "__tessera_require__");
        assert!(config.emit_comments);
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = CodegenConfig::from_toml(
            r#"
require_function = "__require__"
emit_comments = false
"#,
        )
        .unwrap();
        assert_eq!(config.require_function, "__require__");
        assert!(!config.emit_comments);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CodegenConfig::from_toml("emit_comments = false\n").unwrap();
        assert_eq!(config.require_function, "__tessera_require__");
        assert!(!config.emit_comments);
    }
}
