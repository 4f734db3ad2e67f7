use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Per-field validation messages, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MarketError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A submission is already in progress")]
    Busy,

    #[error("Request cancelled because the view was closed")]
    Cancelled,

    #[error("Not logged in")]
    Unauthenticated,
}

impl MarketError {
    /// The single message a view shows for this error.
    ///
    /// API and transport failures read the same from the caller's side:
    /// the server-provided text when there is one, a generic line otherwise.
    pub fn user_message(&self) -> String {
        match self {
            MarketError::Api { message, .. } => message.clone(),
            MarketError::Transport(_) => "Something went wrong. Please try again.".to_string(),
            MarketError::Validation(errors) => errors.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        MarketError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
