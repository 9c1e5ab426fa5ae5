use thiserror::Error;

/// Why a weather fetch did not produce a record.
///
/// Every variant is recoverable; the controller keeps the last one in its observable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The city name was rejected before any request was sent.
    #[error("Invalid city name: {0}")]
    Validation(String),

    /// The request never produced an HTTP response (DNS, connect, timeout, body read).
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// The provider answered with a non-2xx status.
    #[error("Provider returned HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    HttpStatus { status: u16, message: Option<String> },

    /// The provider answered 2xx with a body that is not a current-weather document.
    #[error("Malformed provider response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    HttpStatus,
    Decode,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Validation(_) => ErrorKind::Validation,
            FetchError::Transport { .. } => ErrorKind::Transport,
            FetchError::HttpStatus { .. } => ErrorKind::HttpStatus,
            FetchError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Short text for the user, naming what went wrong.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Validation(_) => "please enter a city name",
            FetchError::Transport { timed_out: true, .. } => "request timed out",
            FetchError::Transport { .. } => "network unavailable",
            FetchError::HttpStatus { status: 404, .. } => "city not found",
            FetchError::HttpStatus { status: 401, .. } => "invalid API key",
            FetchError::HttpStatus { status: 429, .. } => "too many requests, try again later",
            FetchError::HttpStatus { status, .. } if *status >= 500 => "weather service unavailable",
            FetchError::HttpStatus { .. } => "weather request rejected",
            FetchError::Decode(_) => "unexpected response from weather service",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> FetchError {
        FetchError::HttpStatus { status, message: None }
    }

    #[test]
    fn http_status_display_includes_provider_message() {
        let err = FetchError::HttpStatus {
            status: 404,
            message: Some("city not found".to_string()),
        };
        assert_eq!(err.to_string(), "Provider returned HTTP 404: city not found");
        assert_eq!(http(500).to_string(), "Provider returned HTTP 500");
    }

    #[test]
    fn user_messages_name_the_failure() {
        assert_eq!(http(404).user_message(), "city not found");
        assert_eq!(http(401).user_message(), "invalid API key");
        assert_eq!(http(429).user_message(), "too many requests, try again later");
        assert_eq!(http(503).user_message(), "weather service unavailable");
        assert_eq!(http(400).user_message(), "weather request rejected");

        let offline = FetchError::Transport {
            message: "dns error".to_string(),
            timed_out: false,
        };
        assert_eq!(offline.user_message(), "network unavailable");

        let slow = FetchError::Transport {
            message: "operation timed out".to_string(),
            timed_out: true,
        };
        assert_eq!(slow.user_message(), "request timed out");
    }

    #[test]
    fn kinds() {
        assert_eq!(FetchError::Validation(String::new()).kind(), ErrorKind::Validation);
        assert_eq!(FetchError::Decode(String::new()).kind(), ErrorKind::Decode);
        assert_eq!(http(418).kind(), ErrorKind::HttpStatus);
    }
}
