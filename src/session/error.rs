//! User-facing session errors.
//!
//! None of these is fatal: every variant leaves the session in a state from
//! which the same action can simply be tried again.

use thiserror::Error;

use crate::audio::AudioError;

use super::state::Action;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Microphone access refused.  The session stays idle.
    #[error("microphone access is required; allow it and try again")]
    PermissionDenied,

    /// No capture hardware.  The session stays idle.
    #[error("no microphone available: {0}")]
    DeviceUnavailable(String),

    /// Speech could not be synthesized or played.
    #[error("could not play the sentence: {0}")]
    SynthesisFailure(String),

    /// The scorer failed or there was nothing to score.  The sentence keeps
    /// whatever record it had.
    #[error("could not evaluate the recording: {0}")]
    EvaluationFailure(String),

    /// Ingestion failed; no session is created.
    #[error("could not process the content: {0}")]
    ContentProcessingFailure(String),

    /// The request is not legal in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: Action, state: &'static str },

    /// Jump target outside the sentence list.
    #[error("sentence {index} does not exist (session has {len})")]
    InvalidIndex { index: usize, len: usize },
}

impl From<AudioError> for SessionError {
    fn from(e: AudioError) -> Self {
        match e {
            AudioError::PermissionDenied => SessionError::PermissionDenied,
            AudioError::DeviceUnavailable(msg) | AudioError::Stream(msg) => {
                SessionError::DeviceUnavailable(msg)
            }
            AudioError::Output(msg) => SessionError::SynthesisFailure(msg),
            AudioError::EmptyRecording => SessionError::EvaluationFailure(e.to_string()),
            AudioError::Encode(_) => SessionError::EvaluationFailure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_errors_map_onto_taxonomy() {
        assert_eq!(
            SessionError::from(AudioError::PermissionDenied),
            SessionError::PermissionDenied
        );
        assert_eq!(
            SessionError::from(AudioError::Stream("busy".into())),
            SessionError::DeviceUnavailable("busy".into())
        );
        assert_eq!(
            SessionError::from(AudioError::EmptyRecording),
            SessionError::EvaluationFailure("nothing was recorded".into())
        );
        assert!(matches!(
            SessionError::from(AudioError::Output("gone".into())),
            SessionError::SynthesisFailure(_)
        ));
    }

    #[test]
    fn invalid_transition_reads_naturally() {
        let e = SessionError::InvalidTransition {
            action: Action::Navigate,
            state: "recording",
        };
        assert_eq!(e.to_string(), "cannot change sentence while recording");
    }
}
