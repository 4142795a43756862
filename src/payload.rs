use serde_json::Value;

/// An Upptime webhook body. The sender does not guarantee a shape, so the
/// body is classified once and then matched on.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertPayload {
    /// A bare JSON string, or a body that was not JSON at all
    Text(String),
    /// `{"data": {"message": "..."}}`
    NestedMessage(String),
    /// `{"message": "..."}`
    Message(String),
    /// Anything else
    Other(Value),
}

impl AlertPayload {
    /// Classify a raw request body. Never fails: non-JSON text becomes
    /// `Text`, and an empty or non-UTF-8 body becomes an empty object.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => match std::str::from_utf8(body) {
                Ok(text) if !text.trim().is_empty() => Self::Text(text.to_string()),
                _ => Self::Other(Value::Object(serde_json::Map::new())),
            },
        }
    }

    pub fn from_value(value: Value) -> Self {
        if let Value::String(text) = value {
            return Self::Text(text);
        }
        if let Some(nested) = value
            .get("data")
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str)
        {
            return Self::NestedMessage(nested.to_string());
        }
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return Self::Message(message.to_string());
        }
        Self::Other(value)
    }

    /// Human-readable alert text with surrounding quote characters removed.
    pub fn message(&self) -> String {
        let raw = match self {
            Self::Text(text) | Self::NestedMessage(text) | Self::Message(text) => text.clone(),
            Self::Other(value) => value.to_string(),
        };
        raw.trim_matches('"').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification() {
        let cases: [(&[u8], AlertPayload); 9] = [
            (
                br#""Site (https://a.example.com) is down""#,
                AlertPayload::Text("Site (https://a.example.com) is down".into()),
            ),
            (
                br#"{"data": {"message": "nested"}, "message": "top"}"#,
                AlertPayload::NestedMessage("nested".into()),
            ),
            (
                br#"{"message": "top"}"#,
                AlertPayload::Message("top".into()),
            ),
            (
                br#"{"data": {"message": 42}, "message": "top"}"#,
                AlertPayload::Message("top".into()),
            ),
            (
                br#"{"status": "down"}"#,
                AlertPayload::Other(json!({"status": "down"})),
            ),
            (b"[1, 2]", AlertPayload::Other(json!([1, 2]))),
            (
                b"Site (https://a.example.com) is down",
                AlertPayload::Text("Site (https://a.example.com) is down".into()),
            ),
            (b"", AlertPayload::Other(json!({}))),
            (b"\xff\xfe\xfd", AlertPayload::Other(json!({}))),
        ];
        for (body, expected) in cases {
            assert_eq!(
                AlertPayload::from_body(body),
                expected,
                "body: {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_message_extraction() {
        assert_eq!(
            AlertPayload::from_body(br#"{"message": "\"quoted\""}"#).message(),
            "quoted"
        );
        assert_eq!(
            AlertPayload::from_body(br#"{"data": {"message": "inner"}}"#).message(),
            "inner"
        );
        assert_eq!(AlertPayload::from_body(b"").message(), "{}");
        assert_eq!(
            AlertPayload::from_body(br#"{"status":"down"}"#).message(),
            r#"{"status":"down"}"#
        );
        assert_eq!(AlertPayload::from_body(b"null").message(), "null");
        assert_eq!(AlertPayload::from_body(b"not json {").message(), "not json {");
    }
}
