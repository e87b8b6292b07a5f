//! HTTP response handling.

use serde::de::DeserializeOwned;

use crate::FetchError;

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// The server's own error text.
    ///
    /// Looks for a `message` or `error` string in a JSON body and falls back
    /// to a short plain-text body. HTML error pages are ignored.
    pub fn error_message(&self) -> Option<String> {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            return ["message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()))
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
        }

        let text = String::from_utf8_lossy(&self.body);
        let text = text.trim();
        if text.is_empty() || text.starts_with('<') || text.len() > 200 {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::HttpError {
                status: self.status,
                message: self.error_message(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_json() {
        let resp = Response::new(422, br#"{"message":"Invalid phone number"}"#.to_vec());
        assert_eq!(resp.error_message().as_deref(), Some("Invalid phone number"));

        let resp = Response::new(500, br#"{"error":"stock out"}"#.to_vec());
        assert_eq!(resp.error_message().as_deref(), Some("stock out"));

        let resp = Response::new(500, br#"{"status":"bad"}"#.to_vec());
        assert_eq!(resp.error_message(), None);
    }

    #[test]
    fn test_error_message_ignores_html() {
        let resp = Response::new(502, b"<html>Bad Gateway</html>".to_vec());
        assert_eq!(resp.error_message(), None);

        let resp = Response::new(503, b"maintenance".to_vec());
        assert_eq!(resp.error_message().as_deref(), Some("maintenance"));
    }

    #[test]
    fn test_error_for_status() {
        let ok = Response::new(201, b"{}".to_vec());
        assert!(ok.error_for_status().is_ok());

        let err = Response::new(400, br#"{"message":"nope"}"#.to_vec())
            .error_for_status()
            .unwrap_err();
        match err {
            FetchError::HttpError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("nope"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_json_parse_error() {
        let resp = Response::new(200, b"not json".to_vec());
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, FetchError::ParseError(_)));
    }
}
