//! Error types for product image generation.

use std::path::PathBuf;

/// Errors that can occur while generating a product image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration (the API key) is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// The source image or prompt cannot be used.
    #[error("invalid input: {0}")]
    Input(String),

    /// API key rejected by the remote service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Response arrived but had no usable image in the expected place.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the generated image failed.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of [`Error`] for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential; detected before any I/O.
    Config,
    /// Unreadable or undecodable source image, empty prompt.
    Input,
    /// Transport failure or non-success response.
    Remote,
    /// Response received without extractable image data.
    ResponseShape,
    /// Destination file could not be written.
    Output,
}

impl Error {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Input(_) => ErrorKind::Input,
            Self::Auth(_) | Self::Api { .. } | Self::Network(_) => ErrorKind::Remote,
            Self::ContentBlocked(_)
            | Self::UnexpectedResponse(_)
            | Self::Decode(_)
            | Self::Json(_) => ErrorKind::ResponseShape,
            Self::Output { .. } => ErrorKind::Output,
        }
    }
}

/// Result type alias for product image generation.
pub type Result<T> = std::result::Result<T, Error>;

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Cleans an API error body before it is surfaced to the user.
///
/// Redacts anything that looks like a Google API key and caps the length so
/// an HTML error page does not flood the terminal.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_inclusive(|c: char| c.is_whitespace() || c == '"' || c == '=' || c == '&')
        .map(|token| {
            if let Some(pos) = token.find("AIza") {
                let end = token[pos..]
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
                    .map(|e| pos + e)
                    .unwrap_or(token.len());
                format!("{}[REDACTED]{}", &token[..pos], &token[end..])
            } else {
                token.to_string()
            }
        })
        .collect();
    let joined = redacted.concat();
    let trimmed = joined.trim();

    if trimmed.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let cut: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}
