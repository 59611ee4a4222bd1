//! How command results reach stdout.
//!
//! With `--json` a command prints its payload verbatim, in the same shape
//! the HTTP surface returns, and a failure prints a [`JsonError`] envelope.

use serde::Serialize;

use crate::error::MentorError;
use crate::io::exit_code::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        *self == Self::Json
    }

    /// Prints `value` as pretty JSON, or whatever `render` makes of it.
    pub fn emit<T, F>(&self, value: &T, render: F) -> serde_json::Result<()>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        let out = match self {
            Self::Json => serde_json::to_string_pretty(value)?,
            Self::Text => render(value),
        };
        println!("{out}");
        Ok(())
    }
}

/// Error envelope printed for failed `--json` commands.
#[derive(Debug, Serialize)]
pub struct JsonError {
    /// Always `"error"`.
    pub status: &'static str,
    /// See [`MentorError::status_code`].
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<&'static str>,
    pub exit_code: u8,
}

impl JsonError {
    pub fn from_error(error: &MentorError) -> Self {
        Self {
            status: "error",
            code: error.status_code(),
            message: error.to_string(),
            suggestions: error.recovery_suggestions(),
            exit_code: ExitCode::from_error(error) as u8,
        }
    }
}
