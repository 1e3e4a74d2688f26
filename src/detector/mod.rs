//! Matched-filter detection over one day of network data.
//!
//! The detector works in three coordinate frames that must stay consistent:
//!
//! 1. **Kernel frame**: correlation lag `i` of a channel corresponds to the
//!    data window starting at sample `i + 1` of that channel's day.
//! 2. **Network frame**: each station's combined correlation is shifted by
//!    `time_correction + origin_offset` so that index `i` of every station
//!    trace corresponds to origin time `day_start + i / sample_rate`.
//! 3. **Absolute time**: detections and picks are reported in POSIX seconds.
//!
//! Processing steps:
//!
//! 1. **Combine & align** ([`shift`]): average the three channel correlations
//!    of a station and shift them into the network frame.
//! 2. **Mask** ([`mask`]): keep locally dominant peaks above the trigger
//!    threshold and flatten their neighborhoods.
//! 3. **Fan-out** ([`driver`]): run 1–2 for every station in parallel.
//! 4. **Stack & detect** ([`stack`]): sum station traces and scan the stack
//!    for event origin times.
//! 5. **Pick** ([`pick`]): refine P and S arrival times per station around
//!    each detection and measure S amplitude.
//!
//! [`scan`] chains all of the above for one template set.

pub mod driver;
pub mod mask;
pub mod pick;
pub mod scan;
pub mod shift;
pub mod stack;

// ── Trace layout ────────────────────────────────────────────────────────────

/// Length and sampling of a network-frame correlation trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceLayout {
    /// Time span covered by a trace, in seconds. Default 86400 (one day).
    pub duration: f64,
    /// Samples per second. Default 100.
    pub sample_rate: f64,
}

impl Default for TraceLayout {
    fn default() -> Self {
        Self {
            duration: 86400.0,
            sample_rate: 100.0,
        }
    }
}

impl TraceLayout {
    pub fn new(duration: f64, sample_rate: f64) -> Self {
        Self {
            duration,
            sample_rate,
        }
    }

    /// Number of samples in a trace.
    pub fn len(&self) -> usize {
        (self.duration * self.sample_rate) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.sample_rate.is_finite() && self.sample_rate > 0.0,
            "sample rate must be positive, got {}",
            self.sample_rate
        );
        anyhow::ensure!(
            self.duration.is_finite() && self.duration >= 0.0,
            "trace duration must be non-negative, got {}",
            self.duration
        );
        Ok(())
    }
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Parameters of the per-station trigger stage (combine, align, mask).
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Correlation a station trace must exceed to trigger. Default 0.3.
    pub trig_thres: f32,
    /// Mask length in samples. Retained peaks are at least `2 * mask_len`
    /// apart and flattened over `mask_len` samples. Default 100.
    pub mask_len: usize,
    /// Network-frame trace layout.
    pub layout: TraceLayout,
    /// Upper bound on worker threads. `None` = one worker per station.
    pub max_workers: Option<usize>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            trig_thres: 0.3,
            mask_len: 100,
            layout: TraceLayout::default(),
            max_workers: None,
        }
    }
}

impl TriggerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.layout.validate()?;
        anyhow::ensure!(self.mask_len > 0, "mask_len must be at least one sample");
        anyhow::ensure!(
            self.max_workers != Some(0),
            "max_workers must be at least one when set"
        );
        Ok(())
    }
}

/// How the stack scan moves its cursor after a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorAdvance {
    /// Resume at `window start + local max index + 2 * mask_len`, i.e.
    /// `2 * mask_len` past the detection.
    #[default]
    Global,
    /// Resume at `window-local max index + 2 * mask_len`, i.e. relative to
    /// the start of the trace rather than the detection. Reproduces catalogs
    /// produced by the historical implementation; after the first detection
    /// it re-finds earlier triggers.
    WindowLocal,
}

/// Parameters of the network stack scan.
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Stacked correlation a sample must exceed to be a detection
    /// candidate. The stack is a sum over stations, so this scales with
    /// the station count. Default 0.3.
    pub det_thres: f32,
    /// Mask length in samples; the detection window spans `2 * mask_len`.
    /// Default 100.
    pub mask_len: usize,
    /// Cursor advance rule. Default [`CursorAdvance::Global`].
    pub cursor: CursorAdvance,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            det_thres: 0.3,
            mask_len: 100,
            cursor: CursorAdvance::Global,
        }
    }
}

/// Parameters of P/S refinement.
#[derive(Debug, Clone)]
pub struct PickConfig {
    /// Seconds before / after the predicted P arrival to search. Default [0.5, 1.5].
    pub win_p: [f64; 2],
    /// Seconds before / after the predicted S arrival to search. Default [0.2, 2.5].
    pub win_s: [f64; 2],
    /// Mask length in samples used upstream; widens the search windows to
    /// absorb the plateau uncertainty. Default 100.
    pub mask_len: usize,
    /// Samples per second of the continuous data. Default 100.
    pub sample_rate: f64,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            win_p: [0.5, 1.5],
            win_s: [0.2, 2.5],
            mask_len: 100,
            sample_rate: 100.0,
        }
    }
}

impl PickConfig {
    /// Mask length in seconds.
    pub fn mask_secs(&self) -> f64 {
        self.mask_len as f64 / self.sample_rate
    }
}

/// Full configuration for scanning one template set over one day.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub trigger: TriggerConfig,
    pub stack: StackConfig,
    pub pick: PickConfig,
}

impl ScanConfig {
    /// Consistent configuration for the given sample rate and mask length
    /// (seconds); everything else at defaults.
    pub fn new(sample_rate: f64, mask_len_secs: f64) -> Self {
        let mask_len = (sample_rate * mask_len_secs).round() as usize;
        Self {
            trigger: TriggerConfig {
                mask_len,
                layout: TraceLayout {
                    sample_rate,
                    ..Default::default()
                },
                ..Default::default()
            },
            stack: StackConfig {
                mask_len,
                ..Default::default()
            },
            pick: PickConfig {
                mask_len,
                sample_rate,
                ..Default::default()
            },
        }
    }

    /// Check that the stages agree on sampling and masking.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.trigger.validate()?;
        anyhow::ensure!(self.stack.mask_len > 0, "stack mask_len must be at least one sample");
        anyhow::ensure!(
            self.pick.sample_rate == self.trigger.layout.sample_rate,
            "pick sample rate {} differs from trace sample rate {}",
            self.pick.sample_rate,
            self.trigger.layout.sample_rate
        );
        anyhow::ensure!(
            self.pick.win_p.iter().chain(&self.pick.win_s).all(|w| w.is_finite()),
            "pick windows must be finite"
        );
        Ok(())
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

/// Masked, network-frame correlation trace of one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationTrace {
    pub station: String,
    /// Correlation trace, `TraceLayout::len()` samples.
    pub trace: Vec<f32>,
    /// Number of peaks retained by masking.
    pub num_triggers: usize,
}

/// A network detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Origin time (POSIX seconds).
    pub origin_time: f64,
    /// Peak value of the stacked correlation.
    pub peak_cc: f32,
}

/// Refined phase arrivals of one station for one detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub station: String,
    /// P arrival (POSIX seconds).
    pub p_time: f64,
    /// S arrival (POSIX seconds).
    pub s_time: f64,
    /// Three-component S amplitude.
    pub s_amplitude: f64,
    /// Peak correlation of the P refinement.
    pub p_cc: f32,
    /// Mean peak correlation of the two horizontal S refinements.
    pub s_cc: f32,
}

pub use driver::calc_masked_cc;
pub use mask::{mask_cc, MaskedTrace};
pub use pick::ppk_cc;
pub use scan::{scan_template, DetectedEvent};
pub use shift::{calc_shifted_cc, shift_into_layout};
pub use stack::{detect_stack, stack_traces};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_len() {
        assert_eq!(TraceLayout::default().len(), 8_640_000);
        assert_eq!(TraceLayout::new(60.0, 50.0).len(), 3000);
        assert!(TraceLayout::new(60.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_scan_config_consistent() {
        let cfg = ScanConfig::new(50.0, 1.5);
        assert_eq!(cfg.trigger.mask_len, 75);
        assert_eq!(cfg.stack.mask_len, 75);
        assert_eq!(cfg.pick.mask_len, 75);
        assert!(cfg.validate().is_ok());
        assert!((cfg.pick.mask_secs() - 1.5).abs() < 1e-12);

        // 100 * 0.29 is 28.999... in floating point
        assert_eq!(ScanConfig::new(100.0, 0.29).trigger.mask_len, 29);

        let mut bad = cfg.clone();
        bad.pick.sample_rate = 100.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_trigger_config_rejects_zero_mask() {
        let cfg = TriggerConfig {
            mask_len: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
