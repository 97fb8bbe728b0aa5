//! Persisted per-exercise answer snapshot.

use core_types::TimestampMs;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Durable snapshot of one exercise's answer.
///
/// Serialized as a flat JSON object:
/// `{"submitted": true, "selectedAlternativeIndex": 2, "answerText": "...", "timestamp": 0}`.
/// Absent payload fields are omitted; `null` is read back as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedAnswerRecord {
    pub submitted: bool,
    /// Zero-based alternative index (choice exercises only).
    #[serde(alias = "selectedAnswer", skip_serializing_if = "Option::is_none")]
    pub selected_alternative_index: Option<i64>,
    /// Answer text (text exercises only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    pub timestamp: TimestampMs,
}

/// A stored record that cannot be surfaced.
#[derive(Debug)]
pub enum RecordError {
    /// Not JSON, or JSON of the wrong shape.
    Malformed(serde_json::Error),
    /// Submitted choice record without a selection.
    MissingSelection,
    /// Submitted choice record whose selection does not name an alternative.
    SelectionOutOfRange { index: i64, alternatives: usize },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Malformed(err) => write!(f, "malformed answer record: {err}"),
            RecordError::MissingSelection => {
                f.write_str("submitted choice record has no selected alternative")
            }
            RecordError::SelectionOutOfRange {
                index,
                alternatives,
            } => write!(
                f,
                "selected alternative {index} out of range for {alternatives} alternatives"
            ),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

impl PersistedAnswerRecord {
    pub fn submitted_choice(index: usize, timestamp: TimestampMs) -> Self {
        Self {
            submitted: true,
            selected_alternative_index: Some(index as i64),
            answer_text: None,
            timestamp,
        }
    }

    pub fn submitted_text(text: impl Into<String>, timestamp: TimestampMs) -> Self {
        Self {
            submitted: true,
            selected_alternative_index: None,
            answer_text: Some(text.into()),
            timestamp,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        serde_json::from_str(raw).map_err(RecordError::Malformed)
    }

    pub fn encode(&self) -> Result<String, RecordError> {
        serde_json::to_string(self).map_err(RecordError::Malformed)
    }

    /// The selection as an index into `alternatives` alternatives, if it is one.
    pub fn selection_in_range(&self, alternatives: usize) -> Option<usize> {
        let index = self.selected_alternative_index?;
        usize::try_from(index).ok().filter(|i| *i < alternatives)
    }

    /// Checks the choice-record invariant: a submitted record must select an existing
    /// alternative. Unsubmitted records always pass.
    pub fn validate_choice(&self, alternatives: usize) -> Result<(), RecordError> {
        if !self.submitted {
            return Ok(());
        }
        let Some(index) = self.selected_alternative_index else {
            return Err(RecordError::MissingSelection);
        };
        match self.selection_in_range(alternatives) {
            Some(_) => Ok(()),
            None => Err(RecordError::SelectionOutOfRange {
                index,
                alternatives,
            }),
        }
    }

    /// `true` if the record carries any answer payload.
    pub fn has_payload(&self) -> bool {
        self.selected_alternative_index.is_some()
            || self.answer_text.as_deref().is_some_and(|t| !t.is_empty())
    }
}
