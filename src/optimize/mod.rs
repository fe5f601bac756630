//! Per-file SVG optimization.
//!
//! The sprite assembler treats optimization as a black box behind the
//! [`Optimizer`] trait: markup goes in together with the path it came
//! from, optimized markup (or an error) comes out. [`SvgOptimizer`] is the
//! built-in implementation, driven by an [`OptimizerConfig`].

mod shapes;
mod svg;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use shapes::shape_to_path_data;
pub use svg::SvgOptimizer;

/// A transform applied to every icon before it joins the sprite.
///
/// `path` is the file the markup was read from, so implementations can
/// resolve relative resources and report errors against it.
pub trait Optimizer: Send + Sync {
    fn optimize(&self, source: &str, path: &Path) -> Result<String>;
}

/// Options for the built-in [`SvgOptimizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Attributes removed from the root `<svg>` element.
    pub remove_attrs: Vec<String>,

    /// Remove `id` attributes from every element.
    pub remove_ids: bool,

    /// Remove `<style>` elements and their content.
    pub remove_style_elements: bool,

    /// Declare the SVG namespace on the root element when missing.
    pub add_xmlns: bool,

    /// Remove the `<?xml ...?>` declaration.
    pub remove_xml_decl: bool,

    /// Remove other processing instructions.
    pub remove_processing_instructions: bool,

    /// Remove comments.
    pub remove_comments: bool,

    /// Remove `<!DOCTYPE ...>`.
    pub remove_doctype: bool,

    /// Convert `rect`, `line`, `polyline` and `polygon` into `path`.
    pub convert_shapes: bool,

    /// Drop whitespace between elements.
    pub compact: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            remove_attrs: vec!["width".to_string(), "height".to_string(), "id".to_string()],
            remove_ids: true,
            remove_style_elements: true,
            add_xmlns: true,
            remove_xml_decl: true,
            remove_processing_instructions: true,
            remove_comments: true,
            remove_doctype: true,
            convert_shapes: true,
            compact: true,
        }
    }
}

impl OptimizerConfig {
    /// A configuration that leaves the markup untouched apart from parsing
    /// and re-serializing it.
    pub fn passthrough() -> Self {
        Self {
            remove_attrs: vec![],
            remove_ids: false,
            remove_style_elements: false,
            add_xmlns: false,
            remove_xml_decl: false,
            remove_processing_instructions: false,
            remove_comments: false,
            remove_doctype: false,
            convert_shapes: false,
            compact: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OptimizerConfig::default();
        assert_eq!(config.remove_attrs, vec!["width", "height", "id"]);
        assert!(config.remove_style_elements);
        assert!(config.convert_shapes);
        assert!(config.compact);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: OptimizerConfig = serde_yaml::from_str("convert_shapes: false").unwrap();
        assert!(!config.convert_shapes);
        assert!(config.remove_comments);
        assert_eq!(config.remove_attrs.len(), 3);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: std::result::Result<OptimizerConfig, _> =
            serde_yaml::from_str("remove_everything: true");
        assert!(result.is_err());
    }
}
