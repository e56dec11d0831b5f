//! Credential resolution and runtime settings.
//!
//! Nothing in here is read implicitly by the generation code: the binary
//! resolves a [`Credential`] up front and hands it to the provider builder.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable overriding the Gemini API base URL.
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

/// Seeds the process environment from `.env` in the working directory.
///
/// Variables already set in the environment are left alone. A missing file
/// is not an error; returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded .env");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("ignoring unreadable .env: {e}");
            None
        }
    }
}

/// An opaque API key. Never shown in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps an explicit key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Resolves the key through `lookup`, treating blank values as absent.
    pub fn resolve<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(API_KEY_ENV)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(Self)
            .ok_or_else(|| {
                Error::Config(format!(
                    "{API_KEY_ENV} not found in .env file or environment variables"
                ))
            })
    }

    /// Resolves the key from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Returns the raw key for request signing.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Optional settings that come from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Alternative API root, mainly for testing against a local server.
    pub base_url: Option<String>,
}

impl Settings {
    /// Reads settings through `lookup`.
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            base_url: lookup(BASE_URL_ENV)
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        }
    }

    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }
}
