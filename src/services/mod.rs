//! Remote collaborators used around a practice session.
//!
//! This module provides:
//! * [`ContentIngestor`]: turns pasted text or an uploaded file into a
//!   titled list of practice sentences.
//! * [`SpeechSynthesizer`]: reads a sentence aloud (decoded PCM clip).
//! * [`PronunciationScorer`]: scores one recorded attempt against its target.
//! * [`SessionReviewer`]: narrative summary after the last sentence.
//! * [`GeminiClient`]: one REST client implementing all four.
//! * [`ServiceError`]: error variants for every remote call.
//!
//! The session core only ever sees the traits, held as `Arc<dyn …>`, so
//! tests swap in local doubles without touching the network.

pub mod content;
pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::audio::SpeechClip;
use crate::config::API_KEY_ENV;
use crate::model::{Evaluation, ProcessedContent, Recording, SessionReview};

pub use content::ContentSource;
pub use gemini::GeminiClient;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to a remote collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The response could not be parsed as the expected JSON.
    #[error("failed to parse service response: {0}")]
    Parse(String),

    /// The service answered but carried no usable content.
    #[error("service returned an empty response")]
    EmptyResponse,

    /// No API key in the settings file or the environment.
    #[error("no API key configured (set {API_KEY_ENV} or api.api_key)")]
    MissingApiKey,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Builds the practice script from raw material.
#[async_trait]
pub trait ContentIngestor: Send + Sync {
    async fn process(&self, source: &ContentSource) -> Result<ProcessedContent, ServiceError>;
}

/// Text-to-speech.  The clip must be playable as-is by the output context.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SpeechClip, ServiceError>;
}

/// Compares a recorded attempt with its target sentence.
#[async_trait]
pub trait PronunciationScorer: Send + Sync {
    async fn score(&self, target_text: &str, recording: &Recording)
        -> Result<Evaluation, ServiceError>;
}

/// One line of the history sent for the end-of-session review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewEntry {
    pub text: String,
    pub score: u8,
}

/// Summarises a finished session.
#[async_trait]
pub trait SessionReviewer: Send + Sync {
    async fn review(&self, history: &[ReviewEntry]) -> Result<SessionReview, ServiceError>;
}
