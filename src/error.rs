use thiserror::Error;

/// Failures of the webhook → metrics → DingTalk pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("network: {0}")]
    Network(String),

    #[error("delivery rejected (errcode {code}): {message}")]
    Delivery { code: i64, message: String },
}

impl RelayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
