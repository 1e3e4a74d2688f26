//! Continuous day-long station recordings.

use std::collections::HashMap;

use crate::correlate::sliding_norm;
use crate::waveform::ThreeComponent;

/// One day of three-component data for a station.
#[derive(Debug, Clone)]
pub struct StationStream {
    /// Continuous waveforms, E, N, Z.
    pub waveforms: ThreeComponent,
    /// Sliding-window L2 norm of each channel for the template length in
    /// use (see [`crate::correlate::sliding_norm`]). `None` = computed on
    /// demand during correlation.
    pub data_norms: Option<[Vec<f32>; 3]>,
    /// Start of the day covered by the correlation traces (POSIX seconds).
    pub day_start: f64,
    /// Station time correction in seconds, added when aligning this
    /// station's correlation to the network time frame.
    pub time_correction: f64,
}

impl StationStream {
    pub fn new(waveforms: ThreeComponent, day_start: f64, time_correction: f64) -> Self {
        Self {
            waveforms,
            data_norms: None,
            day_start,
            time_correction,
        }
    }

    /// Precompute the sliding data norms for templates of `template_len`
    /// samples. Worth doing once when many templates share a length.
    pub fn with_norms(mut self, template_len: usize) -> Self {
        let ch = &self.waveforms.channels;
        self.data_norms = Some([
            sliding_norm(&ch[0].data, template_len),
            sliding_norm(&ch[1].data, template_len),
            sliding_norm(&ch[2].data, template_len),
        ]);
        self
    }

    /// Precomputed norm of one channel, if any.
    pub fn data_norm(&self, channel: usize) -> Option<&[f32]> {
        self.data_norms.as_ref().map(|n| n[channel].as_slice())
    }

    pub fn station(&self) -> &str {
        self.waveforms.station()
    }
}

/// Station id → day of continuous data.
pub type ContinuousStream = HashMap<String, StationStream>;
