//! In-memory [`AudioBackend`] for unit tests.
//!
//! Records every hardware call in a shared log, lets the test push audio
//! through the open microphone, and lets it decide when playback drains.

use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::{AudioBackend, AudioError, MicrophoneStream, OutputContext, SpeechClip};
use super::capture::{AudioChunk, ChunkSink};

pub(crate) const MOCK_MIC_RATE: u32 = 16_000;

#[derive(Default)]
struct MockState {
    log: Vec<&'static str>,
    played: Vec<SpeechClip>,
    output_idle: bool,
    fail_output: Option<AudioError>,
    fail_play: Option<AudioError>,
    deny_microphone: Option<AudioError>,
    sink: Option<ChunkSink>,
    open_microphones: usize,
}

#[derive(Clone)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        let state = MockState {
            output_idle: true,
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn log(&self) -> Vec<&'static str> {
        self.lock().log.clone()
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.lock().log.iter().filter(|e| **e == entry).count()
    }

    pub(crate) fn played(&self) -> Vec<SpeechClip> {
        self.lock().played.clone()
    }

    pub(crate) fn open_microphones(&self) -> usize {
        self.lock().open_microphones
    }

    pub(crate) fn fail_output(&self, err: Option<AudioError>) {
        self.lock().fail_output = err;
    }

    pub(crate) fn fail_play(&self, err: Option<AudioError>) {
        self.lock().fail_play = err;
    }

    pub(crate) fn deny_microphone(&self, err: Option<AudioError>) {
        self.lock().deny_microphone = err;
    }

    /// Pretend the current clip finished draining.
    pub(crate) fn finish_playback(&self) {
        self.lock().output_idle = true;
    }

    /// Deliver one mono chunk through the open microphone, if any.
    pub(crate) fn feed(&self, samples: &[f32]) {
        let sink = self.lock().sink.clone();
        if let Some(sink) = sink {
            sink.deliver(AudioChunk {
                samples: samples.to_vec(),
                sample_rate: MOCK_MIC_RATE,
                channels: 1,
            });
        }
    }
}

impl AudioBackend for MockBackend {
    fn open_output(&self) -> Result<Box<dyn OutputContext>, AudioError> {
        let mut state = self.lock();
        if let Some(err) = state.fail_output.clone() {
            return Err(err);
        }
        state.log.push("open_output");
        Ok(Box::new(MockOutput {
            state: Arc::clone(&self.state),
        }))
    }

    fn open_microphone(&self, sink: ChunkSink) -> Result<Box<dyn MicrophoneStream>, AudioError> {
        let mut state = self.lock();
        if let Some(err) = state.deny_microphone.clone() {
            return Err(err);
        }
        state.log.push("open_mic");
        state.sink = Some(sink);
        state.open_microphones += 1;
        Ok(Box::new(MockMicrophone {
            state: Arc::clone(&self.state),
            stopped: false,
        }))
    }
}

struct MockOutput {
    state: Arc<Mutex<MockState>>,
}

impl OutputContext for MockOutput {
    fn play(&mut self, clip: &SpeechClip) -> Result<(), AudioError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_play.clone() {
            return Err(err);
        }
        state.log.push("play");
        state.played.push(clip.clone());
        state.output_idle = false;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        if !state.output_idle {
            state.log.push("stop_output");
        }
        state.output_idle = true;
    }

    fn is_idle(&self) -> bool {
        self.state.lock().unwrap().output_idle
    }

    fn close(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.log.push("close_output");
        state.output_idle = true;
    }
}

struct MockMicrophone {
    state: Arc<Mutex<MockState>>,
    stopped: bool,
}

impl MicrophoneStream for MockMicrophone {
    fn sample_rate(&self) -> u32 {
        MOCK_MIC_RATE
    }

    fn channels(&self) -> u16 {
        1
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        let mut state = self.state.lock().unwrap();
        state.log.push("stop_mic");
        state.sink = None;
        state.open_microphones -= 1;
    }
}

impl Drop for MockMicrophone {
    fn drop(&mut self) {
        self.stop();
    }
}
