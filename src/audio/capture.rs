//! Microphone capture via `cpal`.
//!
//! [`open_default_microphone`] builds an input stream on the system default
//! device and forwards every hardware buffer to a [`ChunkSink`].  The sink
//! fans each chunk out to two consumers:
//!
//! ```text
//! cpal callback ──▶ ChunkSink::deliver ──▶ mpsc::Sender<AudioChunk>  (capture session, lossless)
//!                                     └──▶ RingBuffer monitor        (waveform, lossy)
//! ```
//!
//! The returned [`CpalMicrophone`] owns the `cpal::Stream`; stopping or
//! dropping it ends delivery.

use std::sync::{mpsc, Mutex, Weak};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::backend::{AudioError, MicrophoneStream};
use super::buffer::RingBuffer;
use super::resample::downmix_to_mono;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the input callback.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// ChunkSink
// ---------------------------------------------------------------------------

/// Destination for microphone chunks.
///
/// The monitor is held weakly: once the resource manager releases the
/// microphone, late callbacks stop feeding the waveform even if the sink is
/// still alive somewhere.
#[derive(Clone)]
pub struct ChunkSink {
    tx: mpsc::Sender<AudioChunk>,
    monitor: Weak<Mutex<RingBuffer<f32>>>,
}

impl ChunkSink {
    pub(crate) fn new(tx: mpsc::Sender<AudioChunk>, monitor: Weak<Mutex<RingBuffer<f32>>>) -> Self {
        Self { tx, monitor }
    }

    /// Forward one chunk.  Empty chunks are ignored; send errors (receiver
    /// gone) are dropped so the audio thread never panics.
    pub fn deliver(&self, chunk: AudioChunk) {
        if chunk.samples.is_empty() {
            return;
        }
        if let Some(monitor) = self.monitor.upgrade() {
            if let Ok(mut window) = monitor.lock() {
                window.push_slice(&downmix_to_mono(&chunk.samples, chunk.channels));
            }
        }
        let _ = self.tx.send(chunk);
    }
}

// ---------------------------------------------------------------------------
// CpalMicrophone
// ---------------------------------------------------------------------------

/// An open cpal input stream.
pub struct CpalMicrophone {
    stream: Option<cpal::Stream>,
    sample_rate: u32,
    channels: u16,
}

impl MicrophoneStream for CpalMicrophone {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("capture: pause before drop failed: {e}");
            }
            // Dropping the stream joins the callback; no chunk follows.
            drop(stream);
            log::debug!("capture: microphone stream closed");
        }
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open the system default input device and start streaming into `sink`.
///
/// # Errors
///
/// * [`AudioError::DeviceUnavailable`]: no input device, or it vanished.
/// * [`AudioError::PermissionDenied`]: the platform refused access.
/// * [`AudioError::Stream`]: any other build/start failure.
pub fn open_default_microphone(sink: ChunkSink) -> Result<CpalMicrophone, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no input device found".into()))?;

    let supported = device.default_input_config().map_err(|e| match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => {
            AudioError::DeviceUnavailable("input device disconnected".into())
        }
        cpal::DefaultStreamConfigError::BackendSpecific { err } => classify(err.description),
        other => AudioError::Stream(other.to_string()),
    })?;

    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sink.deliver(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("capture: cpal stream error: {err}");
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                AudioError::DeviceUnavailable("input device disconnected".into())
            }
            cpal::BuildStreamError::BackendSpecific { err } => classify(err.description),
            other => AudioError::Stream(other.to_string()),
        })?;

    stream.play().map_err(|e| match e {
        cpal::PlayStreamError::DeviceNotAvailable => {
            AudioError::DeviceUnavailable("input device disconnected".into())
        }
        cpal::PlayStreamError::BackendSpecific { err } => classify(err.description),
    })?;

    log::info!("capture: microphone open ({sample_rate} Hz, {channels} ch)");

    Ok(CpalMicrophone {
        stream: Some(stream),
        sample_rate,
        channels,
    })
}

/// Backend-specific errors are free text; access refusals are recognised by
/// wording.
fn classify(description: String) -> AudioError {
    let lower = description.to_lowercase();
    if ["permission", "denied", "not authorized", "not permitted"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        AudioError::PermissionDenied
    } else {
        AudioError::Stream(description)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
