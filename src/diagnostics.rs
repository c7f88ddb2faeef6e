//! Records of best-effort steps that were skipped during an export.
//!
//! A rejected field value or an undecodable drawing never aborts an export.
//! Each such step leaves a [`Diagnostic`] behind so callers that want a
//! partial-success report can get one.

use serde::Serialize;

use crate::error::Error;

/// Which part of the pipeline produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Filling an interactive form field
    Field,
    /// Drawing the "Form Data:" block
    TextOverlay,
    /// Stamping the drawing asset
    ImageOverlay,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Field => write!(f, "field"),
            Stage::TextOverlay => write!(f, "text overlay"),
            Stage::ImageOverlay => write!(f, "image overlay"),
        }
    }
}

/// A step that was skipped, or only partly applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Pipeline stage
    pub stage: Stage,
    /// Field name, overlay name or asset path
    pub subject: String,
    /// Human-readable reason
    pub message: String,
}

/// Diagnostics collected over one export, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped step and log it.
    pub fn push(&mut self, stage: Stage, subject: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            stage,
            subject: subject.into(),
            message: message.into(),
        };
        log::warn!(
            "Skipped {} '{}': {}",
            diagnostic.stage,
            diagnostic.subject,
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    /// Record an error from a best-effort step.
    pub fn record(&mut self, stage: Stage, subject: impl Into<String>, error: &Error) {
        self.push(stage, subject, error.to_string());
    }

    /// Fold in diagnostics from a sub-step.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// All diagnostics.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Diagnostics for one stage.
    pub fn for_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.stage == stage)
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether every step succeeded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
