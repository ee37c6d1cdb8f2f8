//! Session-level domain types: engine variants, generation modes, and
//! runtime error reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which generation engine a session uses. Fixed at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineVariant {
    /// Default engine. Larger conversation window, no reasoning frames.
    Classic,
    /// Reasoning-capable engine. Smaller window, emits reasoning deltas.
    Beta,
}

impl Default for EngineVariant {
    fn default() -> Self {
        EngineVariant::Classic
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineVariant::Classic => write!(f, "classic"),
            EngineVariant::Beta => write!(f, "beta"),
        }
    }
}

impl FromStr for EngineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(EngineVariant::Classic),
            "beta" => Ok(EngineVariant::Beta),
            other => Err(format!("invalid engine variant: '{other}'")),
        }
    }
}

/// Generation mode of a session.
///
/// Sessions begin in `New` and transition to `Edit` after the first
/// successful commit, or immediately when loading an existing artifact.
/// The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    New,
    Edit,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::New => write!(f, "new"),
            SessionMode::Edit => write!(f, "edit"),
        }
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(SessionMode::New),
            "edit" => Ok(SessionMode::Edit),
            other => Err(format!("invalid session mode: '{other}'")),
        }
    }
}

/// A runtime error reported from executing a generated artifact.
///
/// Reports replace one another: only the most recent unconsumed report
/// is ever fed back into a fix request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub reported_at: DateTime<Utc>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            reported_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, line: Option<u32>, column: Option<u32>) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// Render the report as the text block embedded in a fix prompt.
    pub fn describe(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                format!("{} (line {line}, column {column})", self.message)
            }
            (Some(line), None) => format!("{} (line {line})", self.message),
            _ => self.message.clone(),
        }
    }
}
