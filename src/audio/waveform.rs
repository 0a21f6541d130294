//! Amplitude bars for the live recording display.
//!
//! One [`WaveformData`] is one visualization frame: the recent microphone
//! window split into equal buckets, each reduced to its RMS level.
//!
//! ```rust
//! use shadow_practice::audio::WaveformData;
//!
//! let window: Vec<f32> = (0..4_096).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
//! let frame = WaveformData::compute(&window, 20);
//! assert_eq!(frame.bars.len(), 20);
//! assert!(frame.bars.iter().all(|&b| (0.0..=1.0).contains(&b)));
//! ```

/// Amplitude snapshot for the waveform bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformData {
    /// RMS amplitude per bar, clamped to `[0.0, 1.0]`.
    pub bars: Vec<f32>,
}

impl WaveformData {
    /// Compute `num_bars` RMS values from `window`.
    ///
    /// Short windows are padded with `0.0` bars; `num_bars == 0` yields an
    /// empty frame.
    pub fn compute(window: &[f32], num_bars: usize) -> Self {
        if num_bars == 0 {
            return Self { bars: Vec::new() };
        }

        let bucket = (window.len() / num_bars).max(1);
        let mut bars: Vec<f32> = window
            .chunks(bucket)
            .take(num_bars)
            .map(|chunk| {
                let mean_sq = chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32;
                mean_sq.sqrt().min(1.0)
            })
            .collect();
        bars.resize(num_bars, 0.0);

        Self { bars }
    }

    /// A frame of `num_bars` silent bars.
    pub fn silent(num_bars: usize) -> Self {
        Self {
            bars: vec![0.0; num_bars],
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Loudest bar in the frame.
    pub fn peak(&self) -> f32 {
        self.bars.iter().cloned().fold(0.0_f32, f32::max)
    }
}
