//! API key handling for the search and model backends.
//!
//! Tavily and OpenAI keys are wrapped in [`SecretString`] from the moment
//! they are read in [`Settings`](crate::config::Settings) until a backend
//! writes them into a request header, so `Debug` output and tracing fields
//! never carry them.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// An API key. Formats as `[REDACTED]`.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// The raw key, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<&str> for SecretString {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}
