//! Ownership of the hardware resources a practice session uses.
//!
//! [`AudioResourceManager`] is the single owner of
//!
//! * the shared output context (created lazily, reused for every clip), and
//! * the microphone stream plus its monitor window (at most one at a time).
//!
//! Everything else sees these resources only through what the manager hands
//! out: a `&mut` borrow of the output context, or a [`MicrophoneLease`]
//! carrying the chunk receiver and a weak [`MonitorTap`].  Releasing the
//! microphone drops the only strong reference to the monitor, so every tap
//! (and every visualization feed built on one) goes dead with it.

use std::sync::{mpsc, Arc, Mutex, Weak};

use super::backend::{AudioBackend, AudioError, MicrophoneStream, OutputContext};
use super::buffer::RingBuffer;
use super::capture::{AudioChunk, ChunkSink};

// ---------------------------------------------------------------------------
// MonitorTap
// ---------------------------------------------------------------------------

/// Weak read handle onto the live microphone window.
#[derive(Clone, Default)]
pub struct MonitorTap(Weak<Mutex<RingBuffer<f32>>>);

impl MonitorTap {
    /// Chronological copy of the most recent mono samples, or `None` once the
    /// microphone has been released.
    pub fn snapshot(&self) -> Option<Vec<f32>> {
        let monitor = self.0.upgrade()?;
        let window = monitor.lock().ok()?;
        Some(window.snapshot())
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

// ---------------------------------------------------------------------------
// MicrophoneLease
// ---------------------------------------------------------------------------

/// What a capture session receives when the microphone is acquired.
pub struct MicrophoneLease {
    /// Every chunk the microphone delivers, in order.
    pub chunks: mpsc::Receiver<AudioChunk>,
    pub sample_rate: u32,
    pub channels: u16,
    pub monitor: MonitorTap,
}

// ---------------------------------------------------------------------------
// AudioResourceManager
// ---------------------------------------------------------------------------

pub struct AudioResourceManager {
    backend: Box<dyn AudioBackend>,
    output: Option<Box<dyn OutputContext>>,
    microphone: Option<Box<dyn MicrophoneStream>>,
    monitor: Option<Arc<Mutex<RingBuffer<f32>>>>,
    monitor_capacity: usize,
}

impl AudioResourceManager {
    /// `monitor_capacity` is the number of mono samples kept for the live
    /// waveform.
    pub fn new(backend: Box<dyn AudioBackend>, monitor_capacity: usize) -> Self {
        Self {
            backend,
            output: None,
            microphone: None,
            monitor: None,
            monitor_capacity: monitor_capacity.max(1),
        }
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// The shared output context, opened on first use.
    ///
    /// # Errors
    ///
    /// Whatever the backend reports when the output device cannot be opened.
    /// A failed open leaves nothing cached, so the next call retries.
    pub fn acquire_playback_context(&mut self) -> Result<&mut Box<dyn OutputContext>, AudioError> {
        let output = match self.output.take() {
            Some(output) => output,
            None => {
                log::debug!("resources: opening output context");
                self.backend.open_output()?
            }
        };
        Ok(self.output.insert(output))
    }

    /// Stop whatever the output context is playing.  No-op before first use.
    pub fn stop_output(&mut self) {
        if let Some(output) = self.output.as_mut() {
            output.stop();
        }
    }

    /// `true` when nothing is playing (including when no context exists).
    pub fn output_idle(&self) -> bool {
        self.output.as_ref().map_or(true, |o| o.is_idle())
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    // -----------------------------------------------------------------------
    // Microphone
    // -----------------------------------------------------------------------

    /// Open the microphone.  Any stream already held is released first, so at
    /// most one is ever open.
    ///
    /// # Errors
    ///
    /// [`AudioError::PermissionDenied`] or [`AudioError::DeviceUnavailable`]
    /// (or a stream error) from the backend.  Nothing is held on failure.
    pub fn acquire_microphone(&mut self) -> Result<MicrophoneLease, AudioError> {
        self.release_microphone();

        let monitor = Arc::new(Mutex::new(RingBuffer::new(self.monitor_capacity)));
        let (tx, rx) = mpsc::channel();
        let sink = ChunkSink::new(tx, Arc::downgrade(&monitor));

        let microphone = self.backend.open_microphone(sink)?;
        let lease = MicrophoneLease {
            chunks: rx,
            sample_rate: microphone.sample_rate(),
            channels: microphone.channels(),
            monitor: MonitorTap(Arc::downgrade(&monitor)),
        };

        log::info!(
            "resources: microphone acquired ({} Hz, {} ch)",
            lease.sample_rate,
            lease.channels
        );
        self.microphone = Some(microphone);
        self.monitor = Some(monitor);
        Ok(lease)
    }

    /// Stop all microphone tracks and drop the monitor.  Safe to call when
    /// nothing is held.
    pub fn release_microphone(&mut self) {
        if let Some(mut microphone) = self.microphone.take() {
            microphone.stop();
            log::info!("resources: microphone released");
        }
        self.monitor = None;
    }

    pub fn has_microphone(&self) -> bool {
        self.microphone.is_some()
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Release the microphone and close the output context.  Idempotent.
    pub fn release_all(&mut self) {
        self.release_microphone();
        if let Some(mut output) = self.output.take() {
            output.close();
            log::debug!("resources: output context closed");
        }
    }
}

impl Drop for AudioResourceManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
