//! Layout configuration.
//!
//! [`LayoutConfig`] collects the settings a tree view usually reads from its
//! settings file: row height mode, root visibility and the sizes used by
//! [`UniformDimensions`](crate::layout::UniformDimensions).
//!
//! # Example
//!
//! ```
//! use arbor::config::LayoutConfig;
//!
//! let config = LayoutConfig::from_toml_str(r#"
//!     row_height = 20
//!     root_visible = false
//! "#).unwrap();
//!
//! assert!(config.is_fixed_row_height());
//! assert!(!config.root_visible);
//! assert_eq!(config.indent, LayoutConfig::default().indent);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::UniformDimensions;

/// Settings applied by
/// [`VariableHeightLayoutCache::with_config`](crate::layout::VariableHeightLayoutCache::with_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Fixed row height; zero or negative selects variable heights.
    pub row_height: i32,
    /// Whether the model root occupies row 0.
    pub root_visible: bool,
    /// Horizontal offset per depth level.
    pub indent: i32,
    /// Width given to every node by the uniform measurer.
    pub node_width: i32,
    /// Height given to every node by the uniform measurer.
    pub default_row_height: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_height: 0,
            root_visible: true,
            indent: 16,
            node_width: 100,
            default_row_height: 18,
        }
    }
}

impl LayoutConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(
            target: arbor_core::logging::targets::LAYOUT,
            path = %path.display(),
            ?config,
            "loaded layout configuration"
        );
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the configuration to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|e| Error::io(path, e))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.indent < 0 {
            return Err(Error::config(format!(
                "indent must not be negative, got {}",
                self.indent
            )));
        }
        if self.node_width < 0 {
            return Err(Error::config(format!(
                "node_width must not be negative, got {}",
                self.node_width
            )));
        }
        if self.default_row_height <= 0 {
            return Err(Error::config(format!(
                "default_row_height must be positive, got {}",
                self.default_row_height
            )));
        }
        Ok(())
    }

    /// Returns `true` when `row_height` selects fixed-height rows.
    pub fn is_fixed_row_height(&self) -> bool {
        self.row_height > 0
    }

    /// The uniform measurer described by this configuration.
    pub fn uniform_dimensions(&self) -> UniformDimensions {
        UniformDimensions::new(self.indent, self.node_width, self.default_row_height)
    }
}
