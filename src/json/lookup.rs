use serde_json::Value;

use super::path::{JsonPath, Segment};

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid JSON at byte {index}: {message}")]
pub struct JsonError {
    index: usize,
    message: String,
}

impl JsonError {
    /// Byte index of the first parse error within the loaded text.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A parsed JSON document addressed by [`JsonPath`].
#[derive(Debug, Clone, PartialEq)]
pub struct JsonLookup {
    root: Value,
}

impl JsonLookup {
    /// Parse `text`, tolerating a leading byte order mark.
    pub fn load(text: &str) -> Result<Self, JsonError> {
        let skipped = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };
        let body = &text[skipped..];

        serde_json::from_str(body)
            .map(|root| Self { root })
            .map_err(|err| JsonError {
                index: skipped + byte_index(body, err.line(), err.column()),
                message: err.to_string(),
            })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    #[cfg(test)]
    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, path: &JsonPath) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Text form of the value at `path`. Strings come back unquoted, other
    /// scalars in their canonical form and containers as compact JSON.
    /// `null`, empty strings and empty containers count as absent.
    pub fn text(&self, path: &JsonPath) -> Option<String> {
        let value = self.get(path)?;
        let text = match value {
            Value::Null => return None,
            Value::String(text) => text.clone(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::Array(items) if items.is_empty() => return None,
            Value::Object(map) if map.is_empty() => return None,
            container => container.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn has(&self, path: &JsonPath) -> bool {
        self.text(path).is_some()
    }
}

fn byte_index(text: &str, line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        text.match_indices('\n')
            .nth(line - 2)
            .map(|(index, _)| index + 1)
            .unwrap_or(text.len())
    };
    (line_start + column.saturating_sub(1)).min(text.len())
}
