//! Session orchestrator: sequences playback, recording, evaluation and
//! navigation over one practice script.
//!
//! [`Session`] lives on the UI thread and owns every piece of session state,
//! including the [`AudioResourceManager`].  User actions are plain method
//! calls; results of background work (speech synthesis, scoring) come back
//! as [`SessionEvent`]s and are applied by [`Session::handle_event`], the
//! only place that reacts to them.
//!
//! # Frame loop
//!
//! ```text
//! on_frame(now)
//!   ├─ apply queued SessionEvents      (SpeechReady → play, EvaluationDone → store)
//!   ├─ pump capture chunks             (Recording)
//!   └─ advance playback progress       (AgentSpeaking; drained output → Idle)
//! ```
//!
//! All hardware is released when the session completes, exits or is dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::audio::{AudioResourceManager, VisualizationFeed};
use crate::config::AudioConfig;
use crate::model::{PerformanceRecord, ProcessedContent, Sentence};
use crate::services::{PronunciationScorer, SpeechSynthesizer};

use super::capture::CaptureController;
use super::error::SessionError;
use super::evaluation::{EvaluationPipeline, EvaluationTicket};
use super::events::SessionEvent;
use super::playback::PlaybackController;
use super::records::PerformanceLog;
use super::state::{Action, SessionState};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Remote collaborators the session calls while running.
#[derive(Clone)]
pub struct SessionServices {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub scorer: Arc<dyn PronunciationScorer>,
}

/// Everything the results screen needs, emitted once on completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSession {
    pub title: String,
    pub sentences: Vec<Sentence>,
    /// One entry per sentence; `None` where no evaluation was stored.
    pub records: Vec<Option<PerformanceRecord>>,
}

/// Outcome of [`Session::next`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The cursor moved to this index.
    Moved(usize),
    /// The last sentence was passed; the session is over.
    Completed(CompletedSession),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    title: String,
    sentences: Vec<Sentence>,
    state: SessionState,
    records: PerformanceLog,

    resources: AudioResourceManager,
    playback: PlaybackController,
    capture: CaptureController,
    evaluation: EvaluationPipeline,
    synthesizer: Arc<dyn SpeechSynthesizer>,

    runtime: Handle,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,

    /// Ticket of the capture whose evaluation the machine is waiting for.
    pending_evaluation: Option<EvaluationTicket>,
    /// Whether the active sentence's stored record is on display.
    show_result: bool,
    last_error: Option<SessionError>,
    waveform_bars: usize,
}

impl Session {
    /// Start a session at the first sentence.
    ///
    /// # Errors
    ///
    /// [`SessionError::ContentProcessingFailure`] if `content` has no
    /// sentences.
    pub fn new(
        content: ProcessedContent,
        resources: AudioResourceManager,
        services: SessionServices,
        audio: &AudioConfig,
        runtime: Handle,
    ) -> Result<Self, SessionError> {
        if content.sentences.is_empty() {
            return Err(SessionError::ContentProcessingFailure(
                "the script contains no sentences".into(),
            ));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let evaluation = EvaluationPipeline::new(services.scorer, events_tx.clone(), runtime.clone());

        log::info!(
            "session: \"{}\" started with {} sentences",
            content.title,
            content.sentences.len()
        );

        Ok(Self {
            records: PerformanceLog::new(content.sentences.len()),
            title: content.title,
            sentences: content.sentences,
            state: SessionState::Idle(0),
            resources,
            playback: PlaybackController::new(),
            capture: CaptureController::new(audio.recording_sample_rate),
            evaluation,
            synthesizer: services.synthesizer,
            runtime,
            events_tx,
            events_rx,
            pending_evaluation: None,
            show_result: false,
            last_error: None,
            waveform_bars: audio.waveform_bars,
        })
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Speak the active sentence.  Pre-empts a playback already running.
    pub fn play(&mut self) -> Result<(), SessionError> {
        let index = match self.state {
            SessionState::Idle(i) | SessionState::AgentSpeaking(i) => i,
            _ => return Err(self.reject(Action::Play)),
        };

        let ticket = self.playback.request(&mut self.resources);
        self.show_result = false;
        self.transition(SessionState::AgentSpeaking(index));

        let synthesizer = Arc::clone(&self.synthesizer);
        let events = self.events_tx.clone();
        let text = self.sentences[index].text.clone();
        self.runtime.spawn(async move {
            let result = synthesizer.synthesize(&text).await;
            let _ = events.send(SessionEvent::SpeechReady { ticket, result });
        });
        Ok(())
    }

    /// Open the microphone for the active sentence.  A no-op while already
    /// recording.
    pub fn start_recording(&mut self) -> Result<(), SessionError> {
        let index = match self.state {
            SessionState::Recording(_) => {
                log::debug!("session: already recording");
                return Ok(());
            }
            SessionState::Idle(i) => i,
            _ => return Err(self.reject(Action::StartRecording)),
        };

        // A drained clip may still hold the output; silence it first.
        self.resources.stop_output();

        let ticket = EvaluationTicket {
            index,
            sentence_id: self.sentences[index].id,
        };
        match self.capture.start(ticket, &mut self.resources) {
            Ok(_) => {
                self.transition(SessionState::Recording(index));
                Ok(())
            }
            Err(e) => {
                let err = SessionError::from(e);
                log::warn!("session: cannot record: {err}");
                Err(err)
            }
        }
    }

    /// Stop recording and send the result to the scorer.  A no-op when not
    /// recording.
    pub fn stop_recording(&mut self) -> Result<(), SessionError> {
        let SessionState::Recording(index) = self.state else {
            log::debug!("session: stop ignored, not recording");
            return Ok(());
        };

        let Some((ticket, finalized)) = self.capture.stop(&mut self.resources) else {
            self.transition(SessionState::Idle(index));
            return Ok(());
        };

        match finalized {
            Ok(recording) => {
                let target = self.sentences[ticket.index].text.clone();
                self.pending_evaluation = Some(ticket);
                self.transition(SessionState::Evaluating(index));
                self.evaluation.submit(ticket, target, recording);
                Ok(())
            }
            Err(e) => {
                self.transition(SessionState::Idle(index));
                let err = SessionError::from(e);
                log::warn!("session: recording discarded: {err}");
                Err(err)
            }
        }
    }

    /// Move to the following sentence, or complete the session from the
    /// last one.  Allowed while speaking (the playback is pre-empted).
    pub fn next(&mut self) -> Result<Advance, SessionError> {
        let index = match self.state {
            SessionState::Idle(i) | SessionState::AgentSpeaking(i) => i,
            _ => return Err(self.reject(Action::Navigate)),
        };

        self.playback.preempt(&mut self.resources);

        if index + 1 < self.sentences.len() {
            self.show_result = false;
            self.transition(SessionState::Idle(index + 1));
            return Ok(Advance::Moved(index + 1));
        }

        self.transition(SessionState::Complete);
        self.capture.abort(&mut self.resources);
        self.resources.release_all();

        log::info!(
            "session: complete, {}/{} sentences evaluated",
            self.records.evaluated(),
            self.sentences.len()
        );
        Ok(Advance::Completed(CompletedSession {
            title: self.title.clone(),
            sentences: self.sentences.clone(),
            records: self.records.as_slice().to_vec(),
        }))
    }

    /// Make `index` the active sentence and show its stored record.  Jumping
    /// to the active sentence does nothing.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        let current = match self.state {
            SessionState::Idle(i) | SessionState::AgentSpeaking(i) => i,
            _ => return Err(self.reject(Action::Navigate)),
        };
        if index >= self.sentences.len() {
            return Err(SessionError::InvalidIndex {
                index,
                len: self.sentences.len(),
            });
        }
        if index == current {
            return Ok(());
        }

        self.playback.preempt(&mut self.resources);
        self.show_result = true;
        self.transition(SessionState::Idle(index));
        Ok(())
    }

    /// Leave the session from any state, releasing all hardware.
    pub fn exit(mut self) {
        self.playback.preempt(&mut self.resources);
        self.capture.abort(&mut self.resources);
        self.resources.release_all();
        log::info!("session: exited from {}", self.state.label());
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Per-frame tick.  Applies finished background work, collects captured
    /// audio and advances playback progress.
    pub fn on_frame(&mut self, now: Instant) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        self.capture.pump();

        if let Some(ticket) = self.playback.on_frame(now, &self.resources) {
            if let SessionState::AgentSpeaking(i) = self.state {
                log::debug!("session: playback {ticket:?} finished");
                self.transition(SessionState::Idle(i));
            }
        }
    }

    /// Wait for the next background result without applying it.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// The transition function for asynchronous results.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SpeechReady { ticket, result } => {
                if !self.playback.is_current(ticket) {
                    log::debug!("session: stale speech {ticket:?} dropped");
                    return;
                }
                let started = result
                    .map_err(|e| SessionError::SynthesisFailure(e.to_string()))
                    .and_then(|clip| {
                        self.playback
                            .begin(ticket, &clip, &mut self.resources, Instant::now())
                            .map_err(|e| SessionError::SynthesisFailure(e.to_string()))
                    });
                if let Err(err) = started {
                    self.playback.fail(ticket);
                    if let SessionState::AgentSpeaking(i) = self.state {
                        self.transition(SessionState::Idle(i));
                    }
                    self.surface(err);
                }
            }

            SessionEvent::EvaluationDone {
                ticket,
                recording,
                result,
            } => {
                let succeeded = match result {
                    Ok(evaluation) => {
                        log::info!(
                            "session: sentence {} scored {}",
                            ticket.sentence_id,
                            evaluation.score
                        );
                        self.records.store(
                            ticket.index,
                            PerformanceRecord {
                                sentence_id: ticket.sentence_id,
                                recording: Some(recording),
                                evaluation: Some(evaluation),
                            },
                        );
                        true
                    }
                    Err(err) => {
                        self.surface(err);
                        false
                    }
                };

                if self.pending_evaluation != Some(ticket) {
                    log::debug!("session: evaluation {ticket:?} is not the pending one");
                    return;
                }
                self.pending_evaluation = None;
                if let SessionState::Evaluating(i) = self.state {
                    self.show_result = succeeded && i == ticket.index;
                    self.transition(SessionState::Idle(i));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state.cursor()
    }

    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.sentences.get(self.cursor()?)
    }

    pub fn is_last(&self) -> bool {
        self.cursor() == Some(self.sentences.len() - 1)
    }

    /// Playback progress of the active sentence, `[0, 100]`.
    pub fn progress(&self) -> f32 {
        self.playback.progress()
    }

    /// The record shown under the active sentence, if any.
    pub fn current_result(&self) -> Option<&PerformanceRecord> {
        if !self.show_result {
            return None;
        }
        self.records.get(self.cursor()?)
    }

    pub fn record(&self, index: usize) -> Option<&PerformanceRecord> {
        self.records.get(index)
    }

    pub fn score(&self, index: usize) -> Option<u8> {
        self.records.score(index)
    }

    /// Length of the running capture.
    pub fn recording_elapsed(&self, now: Instant) -> Option<Duration> {
        self.capture.elapsed(now)
    }

    /// Latest failure from background work, cleared on read.
    pub fn take_error(&mut self) -> Option<SessionError> {
        self.last_error.take()
    }

    /// A fresh amplitude feed for the running capture.  `None` unless
    /// recording; the feed ends when the capture stops.
    pub fn visualization_feed(&self) -> Option<VisualizationFeed> {
        if !matches!(self.state, SessionState::Recording(_)) {
            return None;
        }
        self.capture
            .monitor()
            .map(|tap| VisualizationFeed::new(tap, self.waveform_bars))
    }

    pub fn has_microphone(&self) -> bool {
        self.resources.has_microphone()
    }

    pub fn has_output(&self) -> bool {
        self.resources.has_output()
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: SessionState) {
        log::debug!("session: {:?} → {:?}", self.state, next);
        self.state = next;
    }

    fn reject(&self, action: Action) -> SessionError {
        log::debug!("session: {action} refused while {}", self.state.label());
        SessionError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }

    fn surface(&mut self, err: SessionError) {
        log::warn!("session: {err}");
        self.last_error = Some(err);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
