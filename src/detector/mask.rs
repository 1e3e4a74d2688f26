//! Non-maximum suppression of a station correlation trace.
//!
//! The masker walks the above-threshold samples with a cursor. At each stop
//! it takes the maximum of the next `mask_len` samples, flattens the
//! `mask_len` samples centered on that maximum to its value, and jumps
//! `2 * mask_len` past it. Flattened plateaus keep peaks aligned when traces
//! from several stations are summed, even with a few samples of jitter.

/// Masked correlation trace and the number of retained peaks.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedTrace {
    pub trace: Vec<f32>,
    pub num_peaks: usize,
}

/// Suppress non-maximal correlation peaks.
///
/// Retained peaks are at least `2 * mask_len` samples apart. Each retained
/// peak overwrites `[max(0, i - mask_len / 2), i + mask_len / 2)` with its
/// value. Samples are candidates only when strictly above `trig_thres`.
pub fn mask_cc(mut trace: Vec<f32>, trig_thres: f32, mask_len: usize) -> MaskedTrace {
    let trig_idxs: Vec<usize> = trace
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > trig_thres)
        .map(|(i, _)| i)
        .collect();
    let Some(&last_trig) = trig_idxs.last() else {
        return MaskedTrace {
            trace,
            num_peaks: 0,
        };
    };
    if mask_len == 0 {
        return MaskedTrace {
            trace,
            num_peaks: 0,
        };
    }

    let n = trace.len();
    let mut slide_idx = 0;
    let mut num_peaks = 0;
    // At most one stop per trigger sample
    for _ in 0..trig_idxs.len() {
        let pos = trig_idxs.partition_point(|&i| i < slide_idx);
        let Some(&trig_idx) = trig_idxs.get(pos) else {
            break;
        };
        num_peaks += 1;

        let window = &trace[trig_idx..(trig_idx + mask_len).min(n)];
        let local = crate::correlate::argmax(window);
        let cc_max = window[local];
        let idx_max = trig_idx + local;

        let lo = idx_max.saturating_sub(mask_len / 2);
        let hi = (idx_max + mask_len / 2).min(n);
        trace[lo..hi].fill(cc_max);

        slide_idx = idx_max + 2 * mask_len;
        if slide_idx > last_trig {
            break;
        }
    }

    MaskedTrace { trace, num_peaks }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Triangle peak of half-width `w` centered at `center` with height `h`.
    fn add_peak(trace: &mut [f32], center: usize, w: usize, h: f32) {
        for k in 0..=w {
            let v = h * (1.0 - k as f32 / (w + 1) as f32);
            if let Some(x) = trace.get_mut(center + k) {
                *x = x.max(v);
            }
            if k <= center {
                trace[center - k] = trace[center - k].max(v);
            }
        }
    }

    #[test]
    fn test_empty_and_quiet() {
        let m = mask_cc(vec![], 0.5, 10);
        assert_eq!(m.num_peaks, 0);
        let m = mask_cc(vec![0.1; 100], 0.5, 10);
        assert_eq!(m.num_peaks, 0);
        assert_eq!(m.trace, vec![0.1; 100]);
    }

    #[test]
    fn test_single_peak_plateau() {
        let mut trace = vec![0.0_f32; 200];
        add_peak(&mut trace, 100, 4, 0.9);
        let m = mask_cc(trace, 0.5, 20);
        assert_eq!(m.num_peaks, 1);
        // plateau [90, 110) at the maximum
        assert!(m.trace[90..110].iter().all(|&v| v == 0.9));
        assert_eq!(m.trace[89], 0.0);
        assert_eq!(m.trace[110], 0.0);
    }

    #[test]
    fn test_close_peaks_merge() {
        let mut trace = vec![0.0_f32; 300];
        add_peak(&mut trace, 100, 2, 0.9);
        add_peak(&mut trace, 125, 2, 0.7);
        let m = mask_cc(trace, 0.5, 20);
        assert_eq!(m.num_peaks, 1);
        assert!(m.trace[90..110].iter().all(|&v| v == 0.9));
    }

    #[test]
    fn test_distant_peaks_survive() {
        let mut trace = vec![0.0_f32; 400];
        add_peak(&mut trace, 100, 2, 0.9);
        add_peak(&mut trace, 150, 2, 0.7);
        let m = mask_cc(trace, 0.5, 20);
        assert_eq!(m.num_peaks, 2);
        assert!(m.trace[90..110].iter().all(|&v| v == 0.9));
        assert!(m.trace[140..160].iter().all(|&v| v == 0.7));
    }

    #[test]
    fn test_max_found_within_window() {
        // Rising edge crosses the threshold before the maximum
        let mut trace = vec![0.0_f32; 100];
        for (i, v) in trace[40..50].iter_mut().enumerate() {
            *v = 0.55 + 0.04 * i as f32;
        }
        let m = mask_cc(trace, 0.5, 16);
        assert_eq!(m.num_peaks, 1);
        let peak = 0.55 + 0.04 * 9.0;
        assert!(m.trace[41..57].iter().all(|&v| (v - peak).abs() < 1e-6));
    }

    #[test]
    fn test_plateau_clipped_at_edges() {
        let mut trace = vec![0.0_f32; 30];
        trace[2] = 0.8;
        trace[28] = 0.9;
        let m = mask_cc(trace, 0.5, 10);
        assert_eq!(m.num_peaks, 2);
        assert!(m.trace[0..7].iter().all(|&v| v == 0.8));
        assert!(m.trace[23..30].iter().all(|&v| v == 0.9));
    }

    #[test]
    fn test_threshold_is_strict() {
        let m = mask_cc(vec![0.0, 0.5, 0.0], 0.5, 2);
        assert_eq!(m.num_peaks, 0);
    }
}
