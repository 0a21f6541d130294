//! Live amplitude feed for the recording display.
//!
//! A [`VisualizationFeed`] is pulled once per rendered frame.  Each pull
//! reads the current microphone window through a [`MonitorTap`] and reduces
//! it to a [`WaveformData`].  When the microphone is released the tap goes
//! dead and the feed ends for good.

use std::iter::FusedIterator;

use super::resources::MonitorTap;
use super::waveform::WaveformData;

pub struct VisualizationFeed {
    tap: MonitorTap,
    bars: usize,
    finished: bool,
}

impl VisualizationFeed {
    pub fn new(tap: MonitorTap, bars: usize) -> Self {
        Self {
            tap,
            bars,
            finished: false,
        }
    }

    /// `true` once the feed has stopped producing frames.
    pub fn is_finished(&self) -> bool {
        self.finished || !self.tap.is_alive()
    }
}

impl Iterator for VisualizationFeed {
    type Item = WaveformData;

    fn next(&mut self) -> Option<WaveformData> {
        if self.finished {
            return None;
        }
        match self.tap.snapshot() {
            Some(window) => Some(WaveformData::compute(&window, self.bars)),
            None => {
                self.finished = true;
                None
            }
        }
    }
}

impl FusedIterator for VisualizationFeed {}
