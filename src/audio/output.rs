//! Playback of synthesized speech via `rodio`.
//!
//! [`RodioOutput`] is the shared output context: one `OutputStream` for the
//! lifetime of the session, one `Sink` per clip.  Starting a new clip stops
//! and discards the previous sink.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::backend::{AudioError, OutputContext, SpeechClip};

/// Default output device wrapped as an [`OutputContext`].
pub struct RodioOutput {
    // Field order matters: the sink must drop before the stream.
    sink: Option<Sink>,
    handle: Option<OutputStreamHandle>,
    stream: Option<OutputStream>,
}

impl RodioOutput {
    /// Open the system default output device.
    ///
    /// # Errors
    ///
    /// [`AudioError::DeviceUnavailable`] when no output device exists,
    /// [`AudioError::Output`] for any other stream failure.
    pub fn open_default() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| match e {
            rodio::StreamError::NoDevice => {
                AudioError::DeviceUnavailable("no output device found".into())
            }
            other => AudioError::Output(other.to_string()),
        })?;
        log::debug!("audio: output context opened");
        Ok(Self {
            sink: None,
            handle: Some(handle),
            stream: Some(stream),
        })
    }
}

impl OutputContext for RodioOutput {
    fn play(&mut self, clip: &SpeechClip) -> Result<(), AudioError> {
        self.stop();

        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| AudioError::Output("output context is closed".into()))?;
        let sink = Sink::try_new(handle).map_err(|e| AudioError::Output(e.to_string()))?;
        sink.append(SamplesBuffer::new(
            clip.channels.max(1),
            clip.sample_rate,
            clip.samples.clone(),
        ));
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_idle(&self) -> bool {
        self.sink.as_ref().map_or(true, |s| s.empty())
    }

    fn close(&mut self) {
        self.stop();
        self.handle = None;
        if self.stream.take().is_some() {
            log::debug!("audio: output context closed");
        }
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.close();
    }
}
