//! Hardware seam between the session and the audio devices.
//!
//! [`AudioBackend`] opens the two kinds of hardware resource the session
//! uses: an [`OutputContext`] for synthesized speech and a
//! [`MicrophoneStream`] for capture.  [`DeviceBackend`] is the production
//! implementation (rodio output, cpal input); tests substitute an in-memory
//! backend so the orchestration can be exercised without a sound card.
//!
//! Nothing outside [`AudioResourceManager`](super::AudioResourceManager)
//! calls a backend directly.

use std::time::Duration;

use thiserror::Error;

use super::capture::{open_default_microphone, ChunkSink};
use super::output::RodioOutput;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Errors raised by audio hardware or by recording finalization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The user or the OS refused microphone access.
    #[error("microphone access was denied")]
    PermissionDenied,

    /// No usable device exists (or it disappeared).
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The input stream could not be built or started.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// The output context could not be opened or could not play a clip.
    #[error("audio output error: {0}")]
    Output(String),

    /// The capture produced no audio at all.
    #[error("nothing was recorded")]
    EmptyRecording,

    /// The finalized recording could not be encoded.
    #[error("failed to encode recording: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// SpeechClip
// ---------------------------------------------------------------------------

/// Decoded synthesized speech, ready to be played through an
/// [`OutputContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechClip {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl SpeechClip {
    /// Playback length of the clip.
    pub fn duration(&self) -> Duration {
        let frames_per_sec = self.sample_rate as f64 * self.channels.max(1) as f64;
        if frames_per_sec == 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / frames_per_sec)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The shared playback context.  Holds at most one in-flight source.
pub trait OutputContext {
    /// Start playing `clip`, replacing whatever source was playing.
    fn play(&mut self, clip: &SpeechClip) -> Result<(), AudioError>;

    /// Stop the in-flight source, if any.
    fn stop(&mut self);

    /// `true` when no source is playing (never started, stopped, or drained).
    fn is_idle(&self) -> bool;

    /// Stop and release the underlying device.  Further `play` calls fail.
    fn close(&mut self);
}

/// An open microphone.  Chunks flow into the [`ChunkSink`] it was opened with
/// until [`stop`](MicrophoneStream::stop) is called.
pub trait MicrophoneStream {
    /// Native sample rate of the delivered chunks.
    fn sample_rate(&self) -> u32;

    /// Number of interleaved channels in each chunk.
    fn channels(&self) -> u16;

    /// Stop all tracks.  No chunk is delivered after this returns.
    fn stop(&mut self);
}

/// Opens audio hardware on behalf of the resource manager.
pub trait AudioBackend {
    fn open_output(&self) -> Result<Box<dyn OutputContext>, AudioError>;

    fn open_microphone(&self, sink: ChunkSink) -> Result<Box<dyn MicrophoneStream>, AudioError>;
}

// ---------------------------------------------------------------------------
// DeviceBackend
// ---------------------------------------------------------------------------

/// System default output (rodio) and input (cpal) devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceBackend;

impl AudioBackend for DeviceBackend {
    fn open_output(&self) -> Result<Box<dyn OutputContext>, AudioError> {
        Ok(Box::new(RodioOutput::open_default()?))
    }

    fn open_microphone(&self, sink: ChunkSink) -> Result<Box<dyn MicrophoneStream>, AudioError> {
        Ok(Box::new(open_default_microphone(sink)?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_duration_mono() {
        let clip = SpeechClip {
            samples: vec![0.0; 24_000],
            sample_rate: 24_000,
            channels: 1,
        };
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn clip_duration_stereo_counts_frames() {
        let clip = SpeechClip {
            samples: vec![0.0; 48_000],
            sample_rate: 24_000,
            channels: 2,
        };
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn clip_duration_zero_rate() {
        let clip = SpeechClip {
            samples: vec![0.0; 10],
            sample_rate: 0,
            channels: 1,
        };
        assert_eq!(clip.duration(), Duration::ZERO);
    }

    #[test]
    fn audio_error_display() {
        assert!(AudioError::PermissionDenied.to_string().contains("denied"));
        assert!(AudioError::DeviceUnavailable("no input".into())
            .to_string()
            .contains("no input"));
    }
}
