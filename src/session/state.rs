//! Session state machine states and the user actions gated by them.
//!
//! [`SessionState`] drives the orchestrator.  Each state carries the cursor
//! (index of the active sentence), so "which sentence" and "what is
//! happening" can never disagree, and at most one of speaking, recording and
//! evaluating can hold at a time.
//!
//! ```text
//! Idle(i) ──play──────────▶ AgentSpeaking(i) ──ended / pre-empted──▶ Idle(i)
//! Idle(i) ──start record──▶ Recording(i) ──stop──▶ Evaluating(i) ──result──▶ Idle(i)
//! Idle(i) | AgentSpeaking(i) ──next / jump──▶ Idle(j)
//! Idle(last) | AgentSpeaking(last) ──next──▶ Complete
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A user request the state machine may accept or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Play,
    StartRecording,
    StopRecording,
    Navigate,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Play => "play the sentence",
            Action::StartRecording => "start recording",
            Action::StopRecording => "stop recording",
            Action::Navigate => "change sentence",
        })
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the user; the cursor's sentence is shown.
    Idle(usize),

    /// Synthesized speech is being fetched or played.
    AgentSpeaking(usize),

    /// The microphone is open and chunks are accumulating.
    Recording(usize),

    /// The finished recording is with the scorer.
    Evaluating(usize),

    /// "Next" was taken at the last sentence.  Terminal.
    Complete,
}

impl SessionState {
    /// Index of the active sentence; `None` once complete.
    pub fn cursor(&self) -> Option<usize> {
        match *self {
            SessionState::Idle(i)
            | SessionState::AgentSpeaking(i)
            | SessionState::Recording(i)
            | SessionState::Evaluating(i) => Some(i),
            SessionState::Complete => None,
        }
    }

    /// `true` while a capture or its evaluation is in flight.  Navigation is
    /// refused in these states.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Recording(_) | SessionState::Evaluating(_))
    }

    /// Whether `action` is a legal request in this state.
    ///
    /// `StartRecording` while already recording is handled by the caller as
    /// a no-op, so it is not listed here.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Play | Action::Navigate => matches!(
                self,
                SessionState::Idle(_) | SessionState::AgentSpeaking(_)
            ),
            Action::StartRecording => matches!(self, SessionState::Idle(_)),
            Action::StopRecording => matches!(self, SessionState::Recording(_)),
        }
    }

    /// Short label for the status line and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle(_) => "idle",
            SessionState::AgentSpeaking(_) => "speaking",
            SessionState::Recording(_) => "recording",
            SessionState::Evaluating(_) => "evaluating",
            SessionState::Complete => "complete",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionState; 5] = [
        SessionState::Idle(2),
        SessionState::AgentSpeaking(2),
        SessionState::Recording(2),
        SessionState::Evaluating(2),
        SessionState::Complete,
    ];

    #[test]
    fn cursor_survives_every_active_state() {
        for state in &ALL[..4] {
            assert_eq!(state.cursor(), Some(2), "{state:?}");
        }
        assert_eq!(SessionState::Complete.cursor(), None);
    }

    #[test]
    fn only_capture_states_are_busy() {
        let busy: Vec<_> = ALL.iter().filter(|s| s.is_busy()).collect();
        assert_eq!(
            busy,
            vec![&SessionState::Recording(2), &SessionState::Evaluating(2)]
        );
    }

    #[test]
    fn play_forbidden_while_capturing() {
        assert!(SessionState::Idle(0).allows(Action::Play));
        assert!(SessionState::AgentSpeaking(0).allows(Action::Play));
        assert!(!SessionState::Recording(0).allows(Action::Play));
        assert!(!SessionState::Evaluating(0).allows(Action::Play));
        assert!(!SessionState::Complete.allows(Action::Play));
    }

    #[test]
    fn recording_only_from_idle() {
        assert!(SessionState::Idle(0).allows(Action::StartRecording));
        assert!(!SessionState::AgentSpeaking(0).allows(Action::StartRecording));
        assert!(!SessionState::Evaluating(0).allows(Action::StartRecording));
        assert!(SessionState::Recording(0).allows(Action::StopRecording));
        assert!(!SessionState::Idle(0).allows(Action::StopRecording));
    }

    #[test]
    fn navigation_gated_by_capture() {
        assert!(SessionState::Idle(0).allows(Action::Navigate));
        assert!(SessionState::AgentSpeaking(0).allows(Action::Navigate));
        assert!(!SessionState::Recording(0).allows(Action::Navigate));
        assert!(!SessionState::Evaluating(0).allows(Action::Navigate));
        assert!(!SessionState::Complete.allows(Action::Navigate));
    }

    #[test]
    fn labels() {
        let labels: Vec<_> = ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec!["idle", "speaking", "recording", "evaluating", "complete"]
        );
    }
}
