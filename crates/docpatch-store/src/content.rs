//! Byte rendering of document sub-values.
//!
//! Strings and text are exposed raw, numbers as decimal text, everything
//! else as pretty-printed JSON.

use crate::error::{Result, StoreError};
use docpatch_core::Value;
use serde::{Deserialize, Serialize};

/// How a sub-value is rendered to bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Number,
    Object,
}

impl ContentKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) | Value::Text(_) => ContentKind::Text,
            Value::Number(_) => ContentKind::Number,
            _ => ContentKind::Object,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Text => write!(f, "text"),
            ContentKind::Number => write!(f, "number"),
            ContentKind::Object => write!(f, "object"),
        }
    }
}

pub fn render(value: &Value) -> Result<(ContentKind, Vec<u8>)> {
    let kind = ContentKind::of(value);
    let bytes = match value {
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Text(text) => text.to_string().into_bytes(),
        Value::Number(n) => n.to_string().into_bytes(),
        other => serde_json::to_vec_pretty(other)?,
    };
    Ok((kind, bytes))
}

pub fn parse(kind: ContentKind, bytes: &[u8]) -> Result<Value> {
    let content =
        std::str::from_utf8(bytes).map_err(|e| StoreError::InvalidContent(e.to_string()))?;

    match kind {
        ContentKind::Text => Ok(Value::from(content)),
        ContentKind::Number => {
            let trimmed = content.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Value::from(n));
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::from(n)),
                _ => Err(StoreError::InvalidContent(format!(
                    "not a number: {}",
                    trimmed
                ))),
            }
        }
        ContentKind::Object => {
            let value: Value = serde_json::from_str(content)?;
            match value {
                Value::Map(_) => Ok(value),
                other => Err(StoreError::NotAnObject(other.kind().to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_by_kind() {
        assert_eq!(
            render(&Value::from("raw text")).unwrap(),
            (ContentKind::Text, b"raw text".to_vec())
        );
        assert_eq!(
            render(&Value::text("r1", "live")).unwrap(),
            (ContentKind::Text, b"live".to_vec())
        );
        assert_eq!(
            render(&Value::from(2.5)).unwrap(),
            (ContentKind::Number, b"2.5".to_vec())
        );

        let (kind, bytes) = render(&Value::from(json!({"a": [1]}))).unwrap();
        assert_eq!(kind, ContentKind::Object);
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n  \"a\": [\n    1\n  ]\n}");

        assert_eq!(render(&Value::Null).unwrap().0, ContentKind::Object);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse(ContentKind::Number, b" 42\n").unwrap(), Value::from(42i64));
        assert_eq!(parse(ContentKind::Number, b"0.5").unwrap(), Value::from(0.5));
        assert!(matches!(
            parse(ContentKind::Number, b"NaN"),
            Err(StoreError::InvalidContent(_))
        ));
    }

    #[test]
    fn test_parse_object_only() {
        assert_eq!(
            parse(ContentKind::Object, br#"{"a": 1}"#).unwrap(),
            Value::from(json!({"a": 1}))
        );
        assert!(matches!(
            parse(ContentKind::Object, b"[1, 2]"),
            Err(StoreError::NotAnObject(_))
        ));
        assert!(matches!(
            parse(ContentKind::Object, b"{oops"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        assert!(matches!(
            parse(ContentKind::Text, &[0xff, 0xfe]),
            Err(StoreError::InvalidContent(_))
        ));
    }
}
