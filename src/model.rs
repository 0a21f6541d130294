//! Core data types shared by the session, the services and the UI.
//!
//! Everything here is plain data: sentences are immutable once loaded,
//! evaluations are immutable once produced, and a [`PerformanceRecord`] is
//! replaced wholesale when a sentence is re-attempted.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sentence
// ---------------------------------------------------------------------------

/// Difficulty rating attached to each practice sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Lowercase label used by the UI badge.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// One line of the practice script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Unique, stable identifier within the session.
    pub id: i64,
    /// Target text the user shadows.
    pub text: String,
    /// Translation shown under the target text.
    pub translation: String,
    pub difficulty: Difficulty,
}

/// Output of the content-ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedContent {
    pub title: String,
    pub sentences: Vec<Sentence>,
}

// ---------------------------------------------------------------------------
// Recording / Evaluation
// ---------------------------------------------------------------------------

/// A finalized microphone capture, ready to be scored.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Encoded audio bytes (see `content_type`).
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `"audio/wav"`.
    pub content_type: String,
    /// Duration of the captured audio in seconds.
    pub duration_secs: f32,
}

/// Pronunciation score and feedback for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Accuracy score in `0..=100`.
    pub score: u8,
    pub feedback: String,
    pub pronunciation_tips: String,
}

/// Colour band for a score, shared by the session view and the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        if score >= 80 {
            ScoreBand::Good
        } else if score >= 60 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

// ---------------------------------------------------------------------------
// PerformanceRecord
// ---------------------------------------------------------------------------

/// Stored outcome of the latest attempt at one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub sentence_id: i64,
    pub recording: Option<Recording>,
    pub evaluation: Option<Evaluation>,
}

impl PerformanceRecord {
    /// Score of the attached evaluation, if any.
    pub fn score(&self) -> Option<u8> {
        self.evaluation.as_ref().map(|e| e.score)
    }
}

// ---------------------------------------------------------------------------
// SessionReview
// ---------------------------------------------------------------------------

/// Narrative summary produced by the review collaborator after a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionReview {
    pub overall_score: Option<u32>,
    pub strengths: String,
    pub improvements: String,
    pub motivational_message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
