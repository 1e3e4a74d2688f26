//! Python bindings for mft via PyO3.
//!
//! Exposes the correlation and detection kernels to Python as the `mftrs`
//! module, operating on numpy arrays.

mod helpers;

use numpy::PyArray1;
use pyo3::prelude::*;

use mft::correlate::KernelNorms;
use mft::detector::{CursorAdvance, StackConfig, TraceLayout};

use crate::helpers::{array_to_f32, parse_triplet, runtime_err};

// ═══════════════════════════════════════════════════════════════════════════
// Correlation
// ═══════════════════════════════════════════════════════════════════════════

/// Normalized cross-correlation of a template against a data trace.
///
/// Args:
///     data: 1D data array.
///     temp: 1D template array.
///     norm_temp: L2 norm of the template. None = computed.
///     norm_data: Sliding-window norm of the data for the template length.
///         None = computed.
///
/// Returns:
///     float32 array of len(data) - len(temp) correlation values in [-1, 1].
#[pyfunction]
#[pyo3(signature = (data, temp, norm_temp = None, norm_data = None))]
fn calc_cc<'py>(
    py: Python<'py>,
    data: &Bound<'py, PyAny>,
    temp: &Bound<'py, PyAny>,
    norm_temp: Option<f64>,
    norm_data: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyArray1<f32>>> {
    let data = array_to_f32(data)?;
    let temp = array_to_f32(temp)?;
    let norm_data = norm_data.map(array_to_f32).transpose()?;
    let norms = KernelNorms::new(norm_temp, norm_data.as_deref());
    Ok(PyArray1::from_vec(py, mft::calc_cc(&data, &temp, &norms)))
}

/// Mean 3-channel correlation shifted into the origin-time frame.
///
/// Args:
///     temps: Three template arrays (E, N, Z).
///     data: Three data arrays (E, N, Z), equally long.
///     norm_temp: Three template norms.
///     dt: Shift in seconds (station correction + origin offset).
///     samp_rate: Samples per second.
///     duration: Output length in seconds. Default 86400.
#[pyfunction]
#[pyo3(signature = (temps, data, norm_temp, dt, samp_rate, duration = 86400.0))]
fn calc_shifted_cc<'py>(
    py: Python<'py>,
    temps: &Bound<'py, PyAny>,
    data: &Bound<'py, PyAny>,
    norm_temp: [f64; 3],
    dt: f64,
    samp_rate: f64,
    duration: f64,
) -> PyResult<Bound<'py, PyArray1<f32>>> {
    let temps = parse_triplet(temps)?;
    let data = parse_triplet(data)?;
    let layout = TraceLayout::new(duration, samp_rate);
    layout.validate().map_err(runtime_err)?;
    let trace = mft::calc_shifted_cc(
        [&temps[0], &temps[1], &temps[2]],
        [&data[0], &data[1], &data[2]],
        &norm_temp,
        [None, None, None],
        dt,
        &layout,
    )
    .map_err(runtime_err)?;
    Ok(PyArray1::from_vec(py, trace))
}

// ═══════════════════════════════════════════════════════════════════════════
// Masking & detection
// ═══════════════════════════════════════════════════════════════════════════

/// Suppress non-maximal peaks of a correlation trace.
///
/// Returns:
///     (masked_trace, num_peaks)
#[pyfunction]
fn mask_cc<'py>(
    py: Python<'py>,
    cc: &Bound<'py, PyAny>,
    trig_thres: f32,
    mask_len: usize,
) -> PyResult<(Bound<'py, PyArray1<f32>>, usize)> {
    let masked = mft::mask_cc(array_to_f32(cc)?, trig_thres, mask_len);
    Ok((PyArray1::from_vec(py, masked.trace), masked.num_peaks))
}

/// Detect events on a stacked correlation trace.
///
/// Args:
///     cc_stack: Stacked correlation trace.
///     trig_thres: Detection threshold.
///     mask_len: Mask length in samples.
///     day_start: POSIX time of sample 0.
///     samp_rate: Samples per second.
///     window_local: Advance the scan cursor from the window-local maximum
///         (historical catalogs). Default False.
///
/// Returns:
///     list of (origin_time, peak_cc)
#[pyfunction]
#[pyo3(signature = (cc_stack, trig_thres, mask_len, day_start, samp_rate, window_local = false))]
fn det_cc_stack(
    cc_stack: &Bound<'_, PyAny>,
    trig_thres: f32,
    mask_len: usize,
    day_start: f64,
    samp_rate: f64,
    window_local: bool,
) -> PyResult<Vec<(f64, f32)>> {
    let config = StackConfig {
        det_thres: trig_thres,
        mask_len,
        cursor: if window_local {
            CursorAdvance::WindowLocal
        } else {
            CursorAdvance::Global
        },
    };
    let stack = array_to_f32(cc_stack)?;
    Ok(mft::detect_stack(&stack, &config, day_start, samp_rate)
        .into_iter()
        .map(|d| (d.origin_time, d.peak_cc))
        .collect())
}

// ═══════════════════════════════════════════════════════════════════════════
// Module definition
// ═══════════════════════════════════════════════════════════════════════════

/// mftrs: matched-filter earthquake detection kernels
///
/// A Rust implementation of matched-filter correlation, masking and
/// stack detection, exposed to Python via PyO3.
#[pymodule]
fn mftrs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(calc_cc, m)?)?;
    m.add_function(wrap_pyfunction!(calc_shifted_cc, m)?)?;
    m.add_function(wrap_pyfunction!(mask_cc, m)?)?;
    m.add_function(wrap_pyfunction!(det_cc_stack, m)?)?;
    Ok(())
}
