//! "User records an attempt": microphone lease, chunk accumulation and
//! finalization into one [`Recording`].
//!
//! # Flow
//!
//! ```text
//! start()  → AudioResourceManager::acquire_microphone → CaptureSession
//! pump()   → move delivered chunks into the session buffer (every frame)
//! stop()   → release microphone → drain remaining chunks
//!          → concat → downmix → resample → WAV → Recording
//! ```
//!
//! Chunks are kept in arrival order and never dropped; the lossy monitor
//! window used for the waveform is a separate buffer.

use std::time::{Duration, Instant};

use crate::audio::{
    downmix_to_mono, encode_wav, resample, AudioChunk, AudioError, AudioResourceManager,
    MicrophoneLease, MonitorTap, WAV_CONTENT_TYPE,
};
use crate::model::Recording;

use super::evaluation::EvaluationTicket;

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// One in-flight recording: the microphone lease and everything it has
/// delivered so far.
pub struct CaptureSession {
    lease: MicrophoneLease,
    chunks: Vec<AudioChunk>,
    ticket: EvaluationTicket,
    started: Instant,
}

impl CaptureSession {
    fn drain(&mut self) -> usize {
        let before = self.chunks.len();
        self.chunks.extend(self.lease.chunks.try_iter());
        self.chunks.len() - before
    }
}

// ---------------------------------------------------------------------------
// CaptureController
// ---------------------------------------------------------------------------

pub struct CaptureController {
    active: Option<CaptureSession>,
    target_rate: u32,
}

impl CaptureController {
    /// `target_rate` is the sample rate of finalized recordings.
    pub fn new(target_rate: u32) -> Self {
        Self {
            active: None,
            target_rate,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Open the microphone and start accumulating.
    ///
    /// Returns `Ok(false)` without touching anything if a capture is already
    /// running.  On error nothing is held.
    pub fn start(
        &mut self,
        ticket: EvaluationTicket,
        resources: &mut AudioResourceManager,
    ) -> Result<bool, AudioError> {
        if self.active.is_some() {
            log::debug!("capture: start ignored, already capturing");
            return Ok(false);
        }

        let lease = resources.acquire_microphone()?;
        log::debug!("capture: started for sentence {}", ticket.sentence_id);
        self.active = Some(CaptureSession {
            lease,
            chunks: Vec::new(),
            ticket,
            started: Instant::now(),
        });
        Ok(true)
    }

    /// Collect chunks delivered since the last call.
    pub fn pump(&mut self) -> usize {
        self.active.as_mut().map_or(0, CaptureSession::drain)
    }

    /// Tap for the live waveform, while capturing.
    pub fn monitor(&self) -> Option<MonitorTap> {
        self.active.as_ref().map(|s| s.lease.monitor.clone())
    }

    /// Time since the capture started.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.active
            .as_ref()
            .map(|s| now.saturating_duration_since(s.started))
    }

    /// Stop capturing and finalize.
    ///
    /// The microphone is released before the buffer is finalized, so no
    /// chunk can arrive afterwards.  Returns `None` when nothing was being
    /// captured.
    pub fn stop(
        &mut self,
        resources: &mut AudioResourceManager,
    ) -> Option<(EvaluationTicket, Result<Recording, AudioError>)> {
        let mut session = self.active.take()?;
        resources.release_microphone();
        session.drain();

        log::debug!(
            "capture: stopped with {} chunks for sentence {}",
            session.chunks.len(),
            session.ticket.sentence_id
        );
        Some((session.ticket, finalize(&session.chunks, self.target_rate)))
    }

    /// Drop an in-flight capture without producing a recording.
    pub fn abort(&mut self, resources: &mut AudioResourceManager) {
        if self.active.take().is_some() {
            resources.release_microphone();
            log::debug!("capture: aborted");
        }
    }
}

// ---------------------------------------------------------------------------
// Finalization
// ---------------------------------------------------------------------------

/// Concatenate `chunks` in order and encode them as a mono WAV recording at
/// `target_rate`.
///
/// # Errors
///
/// [`AudioError::EmptyRecording`] when the chunks hold no samples,
/// [`AudioError::Encode`] if WAV encoding fails.
pub fn finalize(chunks: &[AudioChunk], target_rate: u32) -> Result<Recording, AudioError> {
    let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
    let Some(first) = chunks.first().filter(|_| total > 0) else {
        return Err(AudioError::EmptyRecording);
    };

    let mut interleaved = Vec::with_capacity(total);
    for chunk in chunks {
        interleaved.extend_from_slice(&chunk.samples);
    }

    // A zero target keeps the device rate rather than writing a 0 Hz file.
    let target_rate = if target_rate == 0 { first.sample_rate } else { target_rate };
    let mono = downmix_to_mono(&interleaved, first.channels);
    let samples = resample(&mono, first.sample_rate, target_rate);
    if samples.is_empty() {
        return Err(AudioError::EmptyRecording);
    }

    let bytes = encode_wav(&samples, target_rate)?;
    Ok(Recording {
        bytes,
        content_type: WAV_CONTENT_TYPE.to_string(),
        duration_secs: samples.len() as f32 / target_rate as f32,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{MockBackend, MOCK_MIC_RATE};
    use std::io::Cursor;

    const TICKET: EvaluationTicket = EvaluationTicket {
        index: 0,
        sentence_id: 1,
    };

    fn setup() -> (MockBackend, AudioResourceManager, CaptureController) {
        let backend = MockBackend::new();
        let resources = AudioResourceManager::new(Box::new(backend.clone()), 64);
        (backend, resources, CaptureController::new(MOCK_MIC_RATE))
    }

    fn wav_samples(bytes: &[u8]) -> Vec<i16> {
        hound::WavReader::new(Cursor::new(bytes))
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn chunks_are_concatenated_in_order() {
        let (backend, mut res, mut cap) = setup();
        assert!(cap.start(TICKET, &mut res).unwrap());

        backend.feed(&[0.1, 0.2]);
        cap.pump();
        backend.feed(&[0.3]);
        backend.feed(&[0.4, 0.5]);

        let (ticket, result) = cap.stop(&mut res).unwrap();
        let recording = result.unwrap();

        assert_eq!(ticket, TICKET);
        assert_eq!(recording.content_type, "audio/wav");
        let expected: Vec<i16> = [0.1_f32, 0.2, 0.3, 0.4, 0.5]
            .iter()
            .map(|s| (s * i16::MAX as f32) as i16)
            .collect();
        assert_eq!(wav_samples(&recording.bytes), expected);
    }

    #[test]
    fn stop_releases_microphone() {
        let (backend, mut res, mut cap) = setup();
        cap.start(TICKET, &mut res).unwrap();
        let tap = cap.monitor().unwrap();
        backend.feed(&[0.5; 4]);

        cap.stop(&mut res).unwrap();

        assert_eq!(backend.open_microphones(), 0);
        assert!(!tap.is_alive());
        assert!(!cap.is_capturing());
        assert!(cap.monitor().is_none());
    }

    #[test]
    fn second_start_is_noop() {
        let (backend, mut res, mut cap) = setup();
        assert!(cap.start(TICKET, &mut res).unwrap());
        assert!(!cap.start(TICKET, &mut res).unwrap());
        assert_eq!(backend.count("open_mic"), 1);
    }

    #[test]
    fn stop_without_capture_is_none() {
        let (_backend, mut res, mut cap) = setup();
        assert!(cap.stop(&mut res).is_none());
    }

    #[test]
    fn denied_start_holds_nothing() {
        let (backend, mut res, mut cap) = setup();
        backend.deny_microphone(Some(AudioError::PermissionDenied));
        assert_eq!(
            cap.start(TICKET, &mut res).unwrap_err(),
            AudioError::PermissionDenied
        );
        assert!(!cap.is_capturing());
        assert!(!res.has_microphone());
    }

    #[test]
    fn zero_length_capture_is_empty_recording() {
        let (_backend, mut res, mut cap) = setup();
        cap.start(TICKET, &mut res).unwrap();
        let (_, result) = cap.stop(&mut res).unwrap();
        assert_eq!(result.unwrap_err(), AudioError::EmptyRecording);
    }

    #[test]
    fn abort_discards_capture() {
        let (backend, mut res, mut cap) = setup();
        cap.start(TICKET, &mut res).unwrap();
        backend.feed(&[0.2; 8]);
        cap.abort(&mut res);
        assert!(!cap.is_capturing());
        assert_eq!(backend.open_microphones(), 0);
    }

    #[test]
    fn finalize_downmixes_and_resamples() {
        let chunks = vec![AudioChunk {
            samples: vec![0.25; 96_000],
            sample_rate: 48_000,
            channels: 2,
        }];
        let recording = finalize(&chunks, 16_000).unwrap();
        assert!((recording.duration_secs - 1.0).abs() < 1e-3);
        assert_eq!(wav_samples(&recording.bytes).len(), 16_000);
    }

    #[test]
    fn finalize_rejects_empty_chunks() {
        assert_eq!(finalize(&[], 16_000), Err(AudioError::EmptyRecording));
        let silent = vec![AudioChunk {
            samples: Vec::new(),
            sample_rate: 16_000,
            channels: 1,
        }];
        assert_eq!(finalize(&silent, 16_000), Err(AudioError::EmptyRecording));
    }

    #[test]
    fn finalize_with_zero_target_keeps_device_rate() {
        let chunks = vec![AudioChunk {
            samples: vec![0.1; 8_000],
            sample_rate: 16_000,
            channels: 1,
        }];
        let recording = finalize(&chunks, 0).unwrap();
        assert!(recording.duration_secs.is_finite());
        assert!((recording.duration_secs - 0.5).abs() < 1e-3);
        assert_eq!(wav_samples(&recording.bytes).len(), 8_000);
    }
}
