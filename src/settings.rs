use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::document::TagTable;

pub const DEFAULT_BLOCK_TAG: &str = "p";

/// Options read once per key press.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Tag used for new blocks. Empty means soft breaks are preferred.
    pub forced_root_block: String,
    pub break_in_preformatted: bool,
    pub split_container_on_empty_block: bool,
    /// Empty blocks collapse to zero height unless they carry a `<br>`.
    pub pad_empty_blocks: bool,
    /// Add a second `<br>` when breaking at the very end of a block so the
    /// new line is visible.
    pub extra_trailing_break: bool,
    /// Put a `\r` text node in front of breaks inside `<pre>`.
    pub pre_line_separator: bool,
    pub undo_levels: usize,
    #[serde(skip)]
    pub tags: TagTable,
}

impl Settings {
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).context("invalid settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&source).with_context(|| format!("in {}", path.display()))
    }

    pub fn with_forced_root_block(mut self, tag: &str) -> Self {
        self.forced_root_block = tag.to_string();
        self
    }

    /// Normalized forced block tag, `None` when soft breaks are preferred.
    pub fn block_tag(&self) -> Option<String> {
        let tag = self.forced_root_block.trim();
        if tag.is_empty() {
            None
        } else {
            Some(tag.to_ascii_lowercase())
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            forced_root_block: DEFAULT_BLOCK_TAG.to_string(),
            break_in_preformatted: true,
            split_container_on_empty_block: false,
            pad_empty_blocks: true,
            extra_trailing_break: true,
            pre_line_separator: false,
            undo_levels: 100,
            tags: TagTable::html(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = Settings::from_json_str(r#"{ "forced_root_block": "DIV" }"#).unwrap();
        assert_eq!(settings.block_tag().as_deref(), Some("div"));
        assert!(settings.break_in_preformatted);
        assert!(!settings.split_container_on_empty_block);
        assert_eq!(settings.undo_levels, 100);
    }

    #[test]
    fn empty_block_tag_means_soft_breaks() {
        let settings = Settings::from_json_str(r#"{ "forced_root_block": "" }"#).unwrap();
        assert_eq!(settings.block_tag(), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_json_str(r#"{ "forced_root_blok": "p" }"#).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }
}
