//! Combine the three channel correlations of a station and shift the result
//! into the network time frame.

use crate::correlate::{calc_cc, KernelNorms};
use crate::stream::StationStream;
use crate::template::StationTemplate;

use super::TraceLayout;

/// Average the E, N, Z correlations of a station and align them to origin
/// time.
///
/// `dt` is the total shift in seconds (station correction plus the
/// template-to-origin offset). The returned trace has `layout.len()`
/// samples and is zero wherever the shifted correlation does not reach.
///
/// Fails if the channels produce correlations of different lengths, which
/// happens when the day waveforms of a station are not equally long.
pub fn calc_shifted_cc(
    templates: [&[f32]; 3],
    data: [&[f32]; 3],
    norm_temp: &[f64; 3],
    norm_data: [Option<&[f32]>; 3],
    dt: f64,
    layout: &TraceLayout,
) -> anyhow::Result<Vec<f32>> {
    let per_channel: Vec<Vec<f32>> = (0..3)
        .map(|c| {
            let norms = KernelNorms::new(Some(norm_temp[c]), norm_data[c]);
            calc_cc(data[c], templates[c], &norms)
        })
        .collect();

    let n = per_channel[0].len();
    anyhow::ensure!(
        per_channel.iter().all(|t| t.len() == n),
        "channel correlation lengths differ: E={} N={} Z={}",
        per_channel[0].len(),
        per_channel[1].len(),
        per_channel[2].len()
    );

    let combined: Vec<f32> = (0..n)
        .map(|i| {
            let sum: f64 = per_channel.iter().map(|t| t[i] as f64).sum();
            (sum / 3.0) as f32
        })
        .collect();

    Ok(shift_into_layout(&combined, dt, layout))
}

/// [`calc_shifted_cc`] for a station template against its day stream.
pub fn station_shifted_cc(
    template: &StationTemplate,
    stream: &StationStream,
    layout: &TraceLayout,
) -> anyhow::Result<Vec<f32>> {
    let ch = &stream.waveforms.channels;
    calc_shifted_cc(
        [&template.trigger[0], &template.trigger[1], &template.trigger[2]],
        [&ch[0].data, &ch[1].data, &ch[2].data],
        &template.trigger_norms,
        [stream.data_norm(0), stream.data_norm(1), stream.data_norm(2)],
        stream.time_correction + template.origin_offset,
        layout,
    )
}

/// Place `trace` into a zero buffer of `layout.len()` samples, shifted by
/// `dt` seconds.
///
/// The shift is truncated toward zero to whole samples. A positive shift
/// starts the trace at that index; a negative one drops that many leading
/// samples and starts at 0. Anything past the buffer end is cut.
pub fn shift_into_layout(trace: &[f32], dt: f64, layout: &TraceLayout) -> Vec<f32> {
    let mut holder = vec![0.0_f32; layout.len()];
    let shift = (dt * layout.sample_rate) as i64;

    let skip = (shift.min(0).unsigned_abs() as usize).min(trace.len());
    let src = &trace[skip..];
    let dst_start = shift.max(0) as usize;
    if dst_start < holder.len() {
        let count = src.len().min(holder.len() - dst_start);
        holder[dst_start..dst_start + count].copy_from_slice(&src[..count]);
    }
    holder
}
