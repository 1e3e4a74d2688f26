//! Single-channel waveforms and three-component station recordings.
//!
//! Times are POSIX seconds (`f64`). At the sample rates used for local
//! seismicity (≤ 1 kHz) this keeps sub-microsecond resolution for any
//! date in the instrumental era.

use std::fmt;

/// One of the three orthogonal recording components.
///
/// Channel triplets are always stored in `E`, `N`, `Z` order, so
/// `channel as usize` indexes a `[_; 3]` triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// East (or first horizontal) component.
    E = 0,
    /// North (or second horizontal) component.
    N = 1,
    /// Vertical component.
    Z = 2,
}

impl Channel {
    /// All channels in triplet order.
    pub const ALL: [Channel; 3] = [Channel::E, Channel::N, Channel::Z];

    /// Position of this channel within a triplet.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Channel::E => "E",
            Channel::N => "N",
            Channel::Z => "Z",
        };
        f.write_str(s)
    }
}

/// A uniformly sampled single-channel recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Station identifier (e.g. `"XJ.AKS"` or just `"AKS"`).
    pub station: String,
    /// Recording component.
    pub channel: Channel,
    /// Absolute time of the first sample, POSIX seconds.
    pub start_time: f64,
    /// Samples per second.
    pub sample_rate: f64,
    /// Sample values.
    pub data: Vec<f32>,
}

impl Waveform {
    pub fn new(
        station: impl Into<String>,
        channel: Channel,
        start_time: f64,
        sample_rate: f64,
        data: Vec<f32>,
    ) -> Self {
        Self {
            station: station.into(),
            channel,
            start_time,
            sample_rate,
            data,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Time of the last sample. Equals `start_time` for an empty waveform.
    pub fn end_time(&self) -> f64 {
        let n = self.data.len().saturating_sub(1);
        self.start_time + n as f64 / self.sample_rate
    }

    /// Cut the samples lying within `[t0, t1]`.
    ///
    /// Both ends snap to the nearest sample (ties rounded away from zero),
    /// and the cut is clipped to the recorded span. Returns `None` when the
    /// waveform does not overlap the requested window or the cut is empty.
    pub fn slice(&self, t0: f64, t1: f64) -> Option<Waveform> {
        if self.data.is_empty() || t1 < t0 || self.end_time() < t0 || self.start_time > t1 {
            return None;
        }
        let n = self.data.len();
        let head = ((t0 - self.start_time) * self.sample_rate).round().max(0.0) as usize;
        let tail = ((self.end_time() - t1) * self.sample_rate).round().max(0.0) as usize;
        let stop = n.saturating_sub(tail);
        if head >= stop {
            return None;
        }
        Some(Waveform {
            station: self.station.clone(),
            channel: self.channel,
            start_time: self.start_time + head as f64 / self.sample_rate,
            sample_rate: self.sample_rate,
            data: self.data[head..stop].to_vec(),
        })
    }
}

/// A three-component recording of one station, in `E`, `N`, `Z` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreeComponent {
    pub channels: [Waveform; 3],
}

impl ThreeComponent {
    /// Build from three waveforms. Each waveform's `channel` must match its
    /// position in the triplet and all three must belong to one station.
    pub fn new(channels: [Waveform; 3]) -> anyhow::Result<Self> {
        for (i, w) in channels.iter().enumerate() {
            anyhow::ensure!(
                w.channel.index() == i,
                "channel {} stored at triplet position {} (expected E, N, Z order)",
                w.channel,
                i
            );
            anyhow::ensure!(
                w.station == channels[0].station,
                "mixed stations in one triplet: {} and {}",
                channels[0].station,
                w.station
            );
            anyhow::ensure!(
                w.sample_rate > 0.0,
                "non-positive sample rate {} on {}.{}",
                w.sample_rate,
                w.station,
                w.channel
            );
        }
        Ok(Self { channels })
    }

    pub fn station(&self) -> &str {
        &self.channels[0].station
    }

    pub fn channel(&self, channel: Channel) -> &Waveform {
        &self.channels[channel.index()]
    }

    /// Cut all channels to `[t0, t1]`, dropping those that do not overlap.
    ///
    /// A complete cut has exactly three waveforms; fewer means a data gap
    /// on at least one component.
    pub fn slice(&self, t0: f64, t1: f64) -> Vec<Waveform> {
        self.channels
            .iter()
            .filter_map(|w| w.slice(t0, t1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Waveform {
        Waveform::new("STA", Channel::Z, 100.0, 10.0, (0..n).map(|i| i as f32).collect())
    }

    #[test]
    fn test_end_time() {
        let w = ramp(11);
        assert!((w.end_time() - 101.0).abs() < 1e-12);
        let empty = Waveform::new("STA", Channel::Z, 5.0, 10.0, vec![]);
        assert_eq!(empty.end_time(), 5.0);
    }

    #[test]
    fn test_slice_inside() {
        let w = ramp(100);
        let cut = w.slice(101.0, 102.0).unwrap();
        assert_eq!(cut.data.first().copied(), Some(10.0));
        assert_eq!(cut.data.last().copied(), Some(20.0));
        assert_eq!(cut.len(), 11);
        assert!((cut.start_time - 101.0).abs() < 1e-9);
    }

    #[test]
    fn test_slice_nearest_sample() {
        let w = ramp(100);
        // 101.04 snaps to sample 10, 101.96 snaps to sample 20
        let cut = w.slice(101.04, 101.96).unwrap();
        assert_eq!(cut.data[0], 10.0);
        assert_eq!(*cut.data.last().unwrap(), 20.0);
    }

    #[test]
    fn test_slice_clipped_at_edges() {
        let w = ramp(100);
        let cut = w.slice(90.0, 100.5).unwrap();
        assert_eq!(cut.data[0], 0.0);
        assert_eq!(cut.len(), 6);
        assert_eq!(cut.start_time, 100.0);

        let cut = w.slice(109.0, 200.0).unwrap();
        assert_eq!(cut.data[0], 90.0);
        assert_eq!(*cut.data.last().unwrap(), 99.0);
    }

    #[test]
    fn test_slice_outside() {
        let w = ramp(100);
        assert!(w.slice(0.0, 99.0).is_none());
        assert!(w.slice(111.0, 120.0).is_none());
        assert!(w.slice(105.0, 104.0).is_none());
    }

    #[test]
    fn test_three_component_order_checked() {
        let z = ramp(10);
        let mut e = ramp(10);
        e.channel = Channel::E;
        let mut n = ramp(10);
        n.channel = Channel::N;
        assert!(ThreeComponent::new([e.clone(), n.clone(), z.clone()]).is_ok());
        assert!(ThreeComponent::new([z, n, e]).is_err());
    }

    #[test]
    fn test_three_component_partial_cut() {
        let mut e = ramp(100);
        e.channel = Channel::E;
        // North channel starts later (gap at the beginning of the day)
        let mut n = ramp(100);
        n.channel = Channel::N;
        n.start_time = 200.0;
        let z = ramp(100);
        let st = ThreeComponent::new([e, n, z]).unwrap();
        assert_eq!(st.slice(101.0, 102.0).len(), 2);
        assert_eq!(st.slice(101.0, 102.0)[1].channel, Channel::Z);
    }
}
