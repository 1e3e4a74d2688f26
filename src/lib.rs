//! # mft
//!
//! A **matched-filter earthquake detector** for continuous seismic network data.
//!
//! Given the waveforms of a known event (a *template*) recorded at several
//! stations, `mft` scans a day of continuous three-component data for repeats
//! of that event: it correlates each station's data against the template,
//! aligns and stacks the station correlations in origin-time frame, detects
//! peaks of the network stack, and refines P and S arrivals at every station.
//!
//! ## Features
//!
//! - **Normalized cross-correlation**: sliding-window Pearson correlation with
//!   an FFT path for long traces and optional precomputed norms
//! - **Parallel per-station processing**: every station runs on a bounded
//!   rayon pool; results come back in template order
//! - **Peak masking**: non-maximum suppression with flattened plateaus so
//!   stacks tolerate a few samples of inter-station jitter
//! - **Phase picking**: P and S arrival refinement and three-component S
//!   amplitude per detection
//! - **Template libraries** serialize with [rkyv](https://docs.rs/rkyv)
//!
//! ## Example
//!
//! ```no_run
//! use mft::{scan_template, write_det_ppk, ContinuousStream, PeakAmplitude, ScanConfig, TemplateSet};
//!
//! let templates = TemplateSet::load_from_file("templates/2019-07-04.rkyv").unwrap();
//! let streams: ContinuousStream = load_day(); // caller-provided data loading
//!
//! // 100 Hz data, 1 s mask
//! let config = ScanConfig::new(100.0, 1.0);
//! let events = scan_template(&templates, &streams, &config, &PeakAmplitude).unwrap();
//!
//! let mut catalog = std::io::stdout();
//! let mut phase = Vec::new();
//! for event in &events {
//!     write_det_ppk(&mut catalog, &mut phase, event, &templates.hypocenter).unwrap();
//! }
//! # fn load_day() -> ContinuousStream { ContinuousStream::new() }
//! ```
//!
//! ## Processing overview
//!
//! 1. **Correlate**: normalized cross-correlation of each channel against
//!    the template ([`correlate::calc_cc`])
//! 2. **Combine & align**: average the three channels and shift by the
//!    template's origin offset and the station time correction
//!    ([`detector::calc_shifted_cc`])
//! 3. **Mask**: keep dominant peaks above the trigger threshold
//!    ([`detector::mask_cc`])
//! 4. **Stack & detect**: sum station traces and scan the stack for origin
//!    times ([`detector::detect_stack`])
//! 5. **Pick**: refine phase arrivals around each detection
//!    ([`detector::ppk_cc`])

pub mod amplitude;
pub mod catalog;
pub mod correlate;
pub mod detector;
pub mod stream;
pub mod template;
pub mod time;
pub mod waveform;

pub use amplitude::{AmplitudeEstimator, PeakAmplitude};
pub use catalog::{catalog_line, pick_line, write_det_ppk};
pub use correlate::{calc_cc, KernelNorms};
pub use detector::{
    calc_masked_cc, calc_shifted_cc, detect_stack, mask_cc, ppk_cc, scan_template,
    stack_traces, CursorAdvance, DetectedEvent, Detection, Pick, PickConfig, ScanConfig,
    StackConfig, StationTrace, TraceLayout, TriggerConfig,
};
pub use stream::{ContinuousStream, StationStream};
pub use template::{Hypocenter, StationTemplate, TemplateSet};
pub use waveform::{Channel, ThreeComponent, Waveform};
