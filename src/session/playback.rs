//! "Agent speaks the sentence": synthesis request, playback, progress.
//!
//! Every request gets a fresh [`PlaybackTicket`].  Only the ticket of the
//! latest request is current; a synthesis result carrying an older ticket
//! arrived after it was pre-empted and is ignored.
//!
//! Progress is computed from wall-clock elapsed time over the clip duration
//! and is only advanced by [`PlaybackController::on_frame`], i.e. once per
//! rendered frame.

use std::time::{Duration, Instant};

use crate::audio::{AudioError, AudioResourceManager, SpeechClip};

/// Identifies one playback request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackTicket(u64);

/// One clip in flight through the shared output context.
#[derive(Debug)]
pub struct PlaybackHandle {
    ticket: PlaybackTicket,
    started: Instant,
    duration: Duration,
}

impl PlaybackHandle {
    fn percent_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 100.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32() * 100.0).min(100.0)
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    /// Waiting for synthesis.
    Pending(PlaybackTicket),
    Playing(PlaybackHandle),
}

#[derive(Debug)]
pub struct PlaybackController {
    generation: u64,
    phase: Phase,
    progress: f32,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            generation: 0,
            phase: Phase::Idle,
            progress: 0.0,
        }
    }

    /// Pre-empt anything in flight and open a new request.
    pub fn request(&mut self, resources: &mut AudioResourceManager) -> PlaybackTicket {
        self.preempt(resources);
        self.generation += 1;
        let ticket = PlaybackTicket(self.generation);
        self.phase = Phase::Pending(ticket);
        ticket
    }

    /// Stop the current source and discard its handle.  The ended signal is
    /// not raised for a pre-empted playback.
    pub fn preempt(&mut self, resources: &mut AudioResourceManager) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Pending(ticket) => {
                log::debug!("playback: request {ticket:?} pre-empted before audio arrived");
            }
            Phase::Playing(handle) => {
                resources.stop_output();
                log::debug!("playback: {:?} pre-empted", handle.ticket);
            }
        }
        self.progress = 0.0;
    }

    /// `true` if `ticket` is the request still waiting for synthesis.
    pub fn is_current(&self, ticket: PlaybackTicket) -> bool {
        matches!(self.phase, Phase::Pending(t) if t == ticket)
    }

    /// Start playing the synthesized clip for `ticket`.
    ///
    /// Returns `Ok(false)` for a stale ticket (nothing happens).  On a device
    /// error the request is dropped and the error returned.
    pub fn begin(
        &mut self,
        ticket: PlaybackTicket,
        clip: &SpeechClip,
        resources: &mut AudioResourceManager,
        now: Instant,
    ) -> Result<bool, AudioError> {
        if !self.is_current(ticket) {
            return Ok(false);
        }

        if let Err(e) = resources
            .acquire_playback_context()
            .and_then(|output| output.play(clip))
        {
            self.phase = Phase::Idle;
            return Err(e);
        }

        let duration = clip.duration();
        log::debug!("playback: {ticket:?} started ({:.2}s)", duration.as_secs_f32());
        self.progress = 0.0;
        self.phase = Phase::Playing(PlaybackHandle {
            ticket,
            started: now,
            duration,
        });
        Ok(true)
    }

    /// Drop a request whose synthesis failed.  Returns `false` for a stale
    /// ticket.
    pub fn fail(&mut self, ticket: PlaybackTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = Phase::Idle;
        self.progress = 0.0;
        true
    }

    /// Advance progress for this frame.
    ///
    /// Returns the ticket exactly once, on the frame where the output drains.
    pub fn on_frame(
        &mut self,
        now: Instant,
        resources: &AudioResourceManager,
    ) -> Option<PlaybackTicket> {
        let Phase::Playing(handle) = &self.phase else {
            return None;
        };

        self.progress = self.progress.max(handle.percent_at(now));

        if resources.output_idle() {
            let ticket = handle.ticket;
            self.progress = 100.0;
            self.phase = Phase::Idle;
            log::debug!("playback: {ticket:?} ended");
            return Some(ticket);
        }
        None
    }

    /// Playback progress in `[0, 100]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// `true` while a request is pending or a clip is playing.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::MockBackend;

    fn setup() -> (MockBackend, AudioResourceManager, PlaybackController) {
        let backend = MockBackend::new();
        let resources = AudioResourceManager::new(Box::new(backend.clone()), 64);
        (backend, resources, PlaybackController::new())
    }

    /// Two seconds at 24 kHz.
    fn clip() -> SpeechClip {
        SpeechClip {
            samples: vec![0.0; 48_000],
            sample_rate: 24_000,
            channels: 1,
        }
    }

    #[test]
    fn progress_follows_elapsed_time() {
        let (_backend, mut res, mut pb) = setup();
        let t0 = Instant::now();
        let ticket = pb.request(&mut res);
        assert!(pb.begin(ticket, &clip(), &mut res, t0).unwrap());

        assert_eq!(pb.on_frame(t0 + Duration::from_millis(500), &res), None);
        assert!((pb.progress() - 25.0).abs() < 0.5);

        assert_eq!(pb.on_frame(t0 + Duration::from_secs(1), &res), None);
        assert!((pb.progress() - 50.0).abs() < 0.5);
    }

    #[test]
    fn progress_is_monotonic_and_capped() {
        let (_backend, mut res, mut pb) = setup();
        let t0 = Instant::now();
        let ticket = pb.request(&mut res);
        pb.begin(ticket, &clip(), &mut res, t0).unwrap();

        pb.on_frame(t0 + Duration::from_secs(1), &res);
        let mid = pb.progress();
        pb.on_frame(t0, &res);
        assert_eq!(pb.progress(), mid);

        pb.on_frame(t0 + Duration::from_secs(10), &res);
        assert_eq!(pb.progress(), 100.0);
    }

    #[test]
    fn ended_fires_exactly_once() {
        let (backend, mut res, mut pb) = setup();
        let t0 = Instant::now();
        let ticket = pb.request(&mut res);
        pb.begin(ticket, &clip(), &mut res, t0).unwrap();

        backend.finish_playback();
        assert_eq!(pb.on_frame(t0, &res), Some(ticket));
        assert_eq!(pb.progress(), 100.0);
        assert_eq!(pb.on_frame(t0, &res), None);
        assert!(!pb.is_active());
    }

    #[test]
    fn preemption_discards_without_ending() {
        let (backend, mut res, mut pb) = setup();
        let t0 = Instant::now();
        let first = pb.request(&mut res);
        pb.begin(first, &clip(), &mut res, t0).unwrap();

        let second = pb.request(&mut res);
        assert_ne!(first, second);
        assert_eq!(backend.count("stop_output"), 1);
        assert_eq!(pb.progress(), 0.0);

        // Nothing is playing any more, but the discarded handle never ends.
        assert_eq!(pb.on_frame(t0, &res), None);
        assert!(pb.is_current(second));
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let (backend, mut res, mut pb) = setup();
        let first = pb.request(&mut res);
        let second = pb.request(&mut res);

        assert!(!pb.begin(first, &clip(), &mut res, Instant::now()).unwrap());
        assert!(!pb.fail(first));
        assert_eq!(backend.count("play"), 0);

        assert!(pb.begin(second, &clip(), &mut res, Instant::now()).unwrap());
        assert_eq!(backend.count("play"), 1);
    }

    #[test]
    fn device_error_drops_request() {
        let (backend, mut res, mut pb) = setup();
        backend.fail_play(Some(AudioError::Output("underrun".into())));
        let ticket = pb.request(&mut res);

        let err = pb.begin(ticket, &clip(), &mut res, Instant::now()).unwrap_err();
        assert_eq!(err, AudioError::Output("underrun".into()));
        assert!(!pb.is_active());
    }

    #[test]
    fn empty_clip_is_instantly_complete() {
        let (_backend, mut res, mut pb) = setup();
        let ticket = pb.request(&mut res);
        let empty = SpeechClip {
            samples: Vec::new(),
            sample_rate: 24_000,
            channels: 1,
        };
        let t0 = Instant::now();
        pb.begin(ticket, &empty, &mut res, t0).unwrap();
        pb.on_frame(t0, &res);
        assert_eq!(pb.progress(), 100.0);
    }
}
