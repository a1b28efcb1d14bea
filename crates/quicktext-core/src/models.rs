use crate::error::QuickTextError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CATEGORY: &str = "General";

/// How the engine decides that a typed keyword should be expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Expand the last typed word when Ctrl+Space is pressed.
    #[default]
    #[serde(rename = "hotkey")]
    Hotkey,
    /// Expand as soon as a keyword is followed by Space, Enter or Tab.
    #[serde(rename = "auto")]
    AutoExpand,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Hotkey => "hotkey",
            Mode::AutoExpand => "auto",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Mode::Hotkey => "Hotkey (Ctrl+Space)",
            Mode::AutoExpand => "Auto-Expand",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = QuickTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hotkey" => Ok(Mode::Hotkey),
            "auto" | "auto-expand" | "autoexpand" => Ok(Mode::AutoExpand),
            other => Err(QuickTextError::InvalidConfig(format!(
                "unknown mode '{}', expected 'hotkey' or 'auto'",
                other
            ))),
        }
    }
}

/// A persisted keyword → phrase association.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub keyword: String,
    pub phrase: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default = "now_rfc3339")]
    pub created_at: String,
    #[serde(default = "now_rfc3339")]
    pub updated_at: String,
}

impl ShortcutEntry {
    pub fn new(keyword: String, phrase: String, category: String) -> Self {
        let timestamp = now_rfc3339();
        Self {
            keyword,
            phrase,
            category,
            usage_count: 0,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

pub(crate) fn now_rfc3339() -> String {
    Local::now().to_rfc3339()
}

/// Trim and lower-case a keyword, rejecting empty input and internal whitespace.
pub fn normalize_keyword(keyword: &str) -> Result<String, QuickTextError> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(QuickTextError::InvalidKeyword(keyword.to_string()));
    }
    Ok(trimmed.to_lowercase())
}
