//! Messages delivered back to the session by its background tasks.

use crate::audio::SpeechClip;
use crate::model::{Evaluation, Recording};
use crate::services::ServiceError;

use super::error::SessionError;
use super::evaluation::EvaluationTicket;
use super::playback::PlaybackTicket;

/// Completion of an asynchronous collaborator call.
///
/// Applied only by [`Session::handle_event`](super::Session::handle_event).
#[derive(Debug)]
pub enum SessionEvent {
    /// Speech synthesis for a playback request finished.
    SpeechReady {
        ticket: PlaybackTicket,
        result: Result<SpeechClip, ServiceError>,
    },

    /// The scorer answered for the capture identified by `ticket`.
    EvaluationDone {
        ticket: EvaluationTicket,
        recording: Recording,
        result: Result<Evaluation, SessionError>,
    },
}
