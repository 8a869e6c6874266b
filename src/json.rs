//! JSON serialization with caller-supplied settings
//!
//! Toolkit types serialize their fields in camelCase through serde
//! attributes; formatting and HTML escaping are chosen per call through
//! [`JsonSettings`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Whitespace layout of serialized JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonFormatting {
    #[default]
    Indented,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSettings {
    pub formatting: JsonFormatting,
    /// Emit `<`, `>`, `&` and `'` as unicode escapes so output can be embedded in HTML
    pub escape_html: bool,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self {
            formatting: JsonFormatting::Indented,
            escape_html: true,
        }
    }
}

impl JsonSettings {
    pub fn compact() -> Self {
        Self {
            formatting: JsonFormatting::Compact,
            ..Self::default()
        }
    }
}

pub fn serialize<T: Serialize + ?Sized>(value: &T, settings: &JsonSettings) -> Result<String> {
    let text = match settings.formatting {
        JsonFormatting::Indented => serde_json::to_string_pretty(value)?,
        JsonFormatting::Compact => serde_json::to_string(value)?,
    };

    if settings.escape_html {
        Ok(escape_html(&text))
    } else {
        Ok(text)
    }
}

pub fn deserialize<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

// These characters never appear in JSON structure, so any occurrence is inside a string literal.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\'' => escaped.push_str("\\u0027"),
            _ => escaped.push(c),
        }
    }
    escaped
}
