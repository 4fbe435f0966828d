use serde_json::Value;
use thiserror::Error;

/// Failure of one Sequence API call. Every operation either resolves with
/// typed data or rejects with exactly one of these; the client never
/// retries or recovers internally.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        payload: Option<Value>,
    },
    /// The server answered 2xx but the body did not match the envelope
    /// this operation expects.
    #[error("{expected}")]
    MalformedResponse {
        expected: &'static str,
        payload: Option<Value>,
    },
    /// The request never produced a response (connect/DNS/body read).
    #[error("request failed to send: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub(crate) fn http(status: u16, payload: Option<Value>) -> Self {
        let message = derive_message(status, payload.as_ref());
        Self::Http {
            status,
            message,
            payload,
        }
    }

    pub(crate) fn malformed(expected: &'static str, payload: Option<Value>) -> Self {
        Self::MalformedResponse { expected, payload }
    }

    /// Status code as observed by callers: the real code for HTTP errors,
    /// 200 for shape failures (the exchange itself succeeded), 0 when no
    /// response came back at all.
    pub fn status(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            Self::MalformedResponse { .. } => 200,
            Self::Transport(_) => 0,
        }
    }

    /// Raw parsed body kept for diagnostics.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Http { payload, .. } | Self::MalformedResponse { payload, .. } => {
                payload.as_ref()
            }
            Self::Transport(_) => None,
        }
    }
}

/// Lenient body parse: empty text is an absent payload, invalid JSON
/// degrades to a raw string payload. Never fails.
pub(crate) fn parse_body(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(text.to_string())),
    }
}

fn derive_message(status: u16, payload: Option<&Value>) -> String {
    match payload.and_then(|body| body.get("message")) {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => format!("Request failed ({status})"),
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
