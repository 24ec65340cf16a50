//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};

/// Colour of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Progress or neutral information.
    Info,
    /// Confirmed outcome.
    Success,
    /// Refusal or failure.
    Error,
}

/// Text shown next to the control that triggered an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Presentation hint.
    pub tone: Tone,
    /// Message body.
    pub text: String,
}

impl StatusMessage {
    /// Neutral message.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            text: text.into(),
        }
    }

    /// Success message.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
        }
    }

    /// Error message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
        }
    }

    /// Whether this reports a failure.
    pub fn is_error(&self) -> bool {
        self.tone == Tone::Error
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
