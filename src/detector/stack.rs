//! Network stacking and detection.

use tracing::info;

use super::{CursorAdvance, Detection, StackConfig, StationTrace};

/// Element-wise sum of station traces.
///
/// All traces must share one layout. No traces gives an empty stack.
pub fn stack_traces(traces: &[StationTrace]) -> anyhow::Result<Vec<f32>> {
    let Some(first) = traces.first() else {
        return Ok(Vec::new());
    };
    let n = first.trace.len();
    let mut stack = vec![0.0_f32; n];
    for st in traces {
        anyhow::ensure!(
            st.trace.len() == n,
            "trace of station {} has {} samples, expected {}",
            st.station,
            st.trace.len(),
            n
        );
        for (s, &v) in stack.iter_mut().zip(&st.trace) {
            *s += v;
        }
    }
    Ok(stack)
}

/// Scan a stacked correlation trace for event origin times.
///
/// Candidates are samples strictly above `det_thres`. For each candidate
/// the maximum over the next `2 * mask_len` samples gives the origin time
/// (`day_start + index / sample_rate`); ties pick the median of the tied
/// positions. Scanning stops when the detection window would run past the
/// end of the trace. Detections are in scan order.
pub fn detect_stack(
    cc_stack: &[f32],
    config: &StackConfig,
    day_start: f64,
    sample_rate: f64,
) -> Vec<Detection> {
    let det_idxs: Vec<usize> = cc_stack
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > config.det_thres)
        .map(|(i, _)| i)
        .collect();
    let Some(&last_det) = det_idxs.last() else {
        return Vec::new();
    };
    let win = 2 * config.mask_len;
    if win == 0 {
        return Vec::new();
    }

    let mut detections = Vec::new();
    let mut slide_idx = 0;
    for _ in 0..det_idxs.len() {
        let pos = det_idxs.partition_point(|&i| i < slide_idx);
        let Some(&det_idx) = det_idxs.get(pos) else {
            break;
        };
        if det_idx + win > cc_stack.len().saturating_sub(1) {
            break;
        }

        let window = &cc_stack[det_idx..det_idx + win];
        let (local_max, cc_max) = median_argmax(window);
        let origin_time = day_start + (det_idx + local_max) as f64 / sample_rate;
        info!(
            "detection: {} {:.2}",
            crate::time::format_time(origin_time),
            cc_max
        );
        detections.push(Detection {
            origin_time,
            peak_cc: cc_max,
        });

        slide_idx = match config.cursor {
            CursorAdvance::Global => det_idx + local_max + win,
            CursorAdvance::WindowLocal => local_max + win,
        };
        if slide_idx > last_det {
            break;
        }
    }
    detections
}

/// Position and value of the maximum; ties resolve to the median of the
/// tied positions (mean of the two middle ones for an even count, truncated).
fn median_argmax(window: &[f32]) -> (usize, f32) {
    let best = crate::correlate::argmax(window);
    let cc_max = window.get(best).copied().unwrap_or(0.0);
    let ties: Vec<usize> = window
        .iter()
        .enumerate()
        .filter(|(_, &v)| v == cc_max)
        .map(|(i, _)| i)
        .collect();
    if ties.is_empty() {
        return (best, cc_max);
    }
    let mid = ties.len() / 2;
    let idx = if ties.len() % 2 == 1 {
        ties[mid]
    } else {
        (ties[mid - 1] + ties[mid]) / 2
    };
    (idx, cc_max)
}
