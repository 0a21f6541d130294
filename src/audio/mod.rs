//! Audio layer: device access, capture buffering and playback.
//!
//! # Data flow
//!
//! ```text
//! Microphone → cpal callback → ChunkSink ─┬─▶ mpsc<AudioChunk> → capture session
//!                                         └─▶ RingBuffer monitor → VisualizationFeed
//!
//! SpeechClip → AudioResourceManager::acquire_playback_context → rodio Sink
//! ```
//!
//! Finished captures are mixed down with [`downmix_to_mono`], brought to the
//! recording rate with [`resample`] and encoded by [`encode_wav`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shadow_practice::audio::{AudioResourceManager, DeviceBackend, VisualizationFeed};
//!
//! let mut resources = AudioResourceManager::new(Box::new(DeviceBackend), 4_096);
//! let lease = resources.acquire_microphone().unwrap();
//! let mut feed = VisualizationFeed::new(lease.monitor.clone(), 30);
//! if let Some(frame) = feed.next() {
//!     println!("peak level {:.2}", frame.peak());
//! }
//! resources.release_all();
//! ```

pub mod backend;
pub mod buffer;
pub mod capture;
pub mod output;
pub mod resample;
pub mod resources;
pub mod visualizer;
pub mod waveform;
pub mod wav;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{AudioBackend, AudioError, DeviceBackend, MicrophoneStream, OutputContext, SpeechClip};
pub use buffer::RingBuffer;
pub use capture::{AudioChunk, ChunkSink};
pub use resample::{downmix_to_mono, resample};
pub use resources::{AudioResourceManager, MicrophoneLease, MonitorTap};
pub use visualizer::VisualizationFeed;
pub use waveform::WaveformData;
pub use wav::{encode_wav, WAV_CONTENT_TYPE};
