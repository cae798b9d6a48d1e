use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error payload returned by the backend on non-2xx responses.
///
/// Only `message` is read. It may be a string or a list of strings; any other
/// field, such as a `code` of whatever shape, is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

impl ErrorBody {
    /// Parses a response body leniently. Non-JSON bodies yield an empty payload.
    pub fn parse(raw: &[u8]) -> Self {
        serde_json::from_slice(raw).unwrap_or_default()
    }

    pub fn message(&self) -> Option<String> {
        let text = match self.message.as_ref()? {
            Value::String(message) => message.trim().to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            _ => return None,
        };
        Some(text).filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_only_payload() {
        let body = ErrorBody::parse(br#"{"message":"Receiver not found"}"#);
        assert_eq!(body.message().as_deref(), Some("Receiver not found"));
    }

    #[test]
    fn code_of_any_shape_keeps_message() {
        let body = ErrorBody::parse(br#"{"code":"conflict","message":"Activity already exists"}"#);
        assert_eq!(body.message().as_deref(), Some("Activity already exists"));

        let body = ErrorBody::parse(br#"{"code":400,"message":"Brief is required"}"#);
        assert_eq!(body.message().as_deref(), Some("Brief is required"));
    }

    #[test]
    fn message_list_is_joined() {
        let body = ErrorBody::parse(
            br#"{"statusCode":400,"message":["date must be a date"," ","time is required"]}"#,
        );
        assert_eq!(
            body.message().as_deref(),
            Some("date must be a date, time is required")
        );
    }

    #[test]
    fn unstructured_body_yields_no_message() {
        assert_eq!(ErrorBody::parse(b"<html>502 Bad Gateway</html>").message(), None);
        assert_eq!(ErrorBody::parse(b"").message(), None);
        assert_eq!(ErrorBody::parse(br#"{"message":"   "}"#).message(), None);
        assert_eq!(ErrorBody::parse(br#"{"message":{"detail":"x"}}"#).message(), None);
    }
}
