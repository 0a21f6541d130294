//! Scoring of finished recordings.
//!
//! A capture is tagged with an [`EvaluationTicket`] the moment it starts.
//! The ticket travels with the recording to the scorer and back, and the
//! result is stored under the ticket's index, whatever sentence is on screen
//! when it arrives.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::model::{Evaluation, Recording};
use crate::services::PronunciationScorer;

use super::error::SessionError;
use super::events::SessionEvent;

/// Which sentence a capture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluationTicket {
    pub index: usize,
    pub sentence_id: i64,
}

/// Score one recording against its target text.  Exactly one attempt.
pub async fn evaluate(
    scorer: &dyn PronunciationScorer,
    target_text: &str,
    recording: &Recording,
) -> Result<Evaluation, SessionError> {
    let mut evaluation = scorer
        .score(target_text, recording)
        .await
        .map_err(|e| SessionError::EvaluationFailure(e.to_string()))?;

    if evaluation.score > 100 {
        log::warn!(
            "session: scorer returned {} for \"{target_text}\", clamped to 100",
            evaluation.score
        );
        evaluation.score = 100;
    }
    Ok(evaluation)
}

pub struct EvaluationPipeline {
    scorer: Arc<dyn PronunciationScorer>,
    events: UnboundedSender<SessionEvent>,
    runtime: Handle,
}

impl EvaluationPipeline {
    pub fn new(
        scorer: Arc<dyn PronunciationScorer>,
        events: UnboundedSender<SessionEvent>,
        runtime: Handle,
    ) -> Self {
        Self {
            scorer,
            events,
            runtime,
        }
    }

    /// Hand `recording` to the scorer in the background.  The outcome comes
    /// back as [`SessionEvent::EvaluationDone`].
    pub fn submit(&self, ticket: EvaluationTicket, target_text: String, recording: Recording) {
        let scorer = Arc::clone(&self.scorer);
        let events = self.events.clone();

        log::debug!(
            "session: evaluating sentence {} ({} bytes)",
            ticket.sentence_id,
            recording.bytes.len()
        );

        self.runtime.spawn(async move {
            let result = evaluate(scorer.as_ref(), &target_text, &recording).await;
            // The session may already be gone; its result is then moot.
            let _ = events.send(SessionEvent::EvaluationDone {
                ticket,
                recording,
                result,
            });
        });
    }
}
