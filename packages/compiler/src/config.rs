//! Compiler configuration

use serde::Deserialize;

/// Attribute written onto every host node in compiled markup.
pub const HOST_MARKER_ATTR: &str = "data-poirot";

/// Attribute carrying the `name args` identity of a block container.
pub const BLOCK_MARKER_ATTR: &str = "data-poirot-block";

/// Options steering how templates are compiled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Trace every compiler step through the logger at debug level.
    pub verbose: bool,
    /// Tag of the element wrapping fragment templates.
    pub root_tag: String,
    /// Class of the element wrapping fragment templates.
    pub root_class: String,
    /// Tag of the elements created around interpolations inside mixed text.
    pub wrapper_tag: String,
    /// Accept `{{^name}}` as an opening block token.
    pub alternate_block_open: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            verbose: false,
            root_tag: "div".to_string(),
            root_class: "poirot-rendered".to_string(),
            wrapper_tag: "span".to_string(),
            alternate_block_open: false,
        }
    }
}

impl CompilerConfig {
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_alternate_block_open(mut self, enabled: bool) -> Self {
        self.alternate_block_open = enabled;
        self
    }

    pub fn with_wrapper_tag(mut self, tag: impl Into<String>) -> Self {
        self.wrapper_tag = tag.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{"verbose": true, "wrapperTag": "em"}"#).unwrap();
        assert!(config.verbose);
        assert_eq!(config.wrapper_tag, "em");
        assert_eq!(config.root_tag, "div");
        assert!(!config.alternate_block_open);
    }
}
