//! Normalized cross-correlation of a template against a data segment.
//!
//! The kernel follows the usual matched-filter convention: the raw "valid"
//! correlation is divided by the template L2 norm and by the L2 norm of the
//! data window under the template. Window norms come from a cumulative sum
//! of squares, which is why the output is shifted by one sample: entry `i`
//! corresponds to the data window starting at sample `i + 1`.
//!
//! Long inputs are correlated with an FFT overlap-save scheme; short ones
//! directly. Both paths accumulate in `f64`.

use std::borrow::Cow;
use std::sync::Arc;

use realfft::{ComplexToReal, FftError, RealFftPlanner, RealToComplex};

/// Templates at least this long are correlated in the frequency domain.
const FFT_MIN_TEMPLATE_LEN: usize = 64;
/// Minimum number of output lags before the FFT path pays off.
const FFT_MIN_OUTPUT_LEN: usize = 1024;
/// Smallest FFT block used by overlap-save.
const FFT_MIN_BLOCK_LEN: usize = 4096;

/// Optional precomputed normalization terms for [`calc_cc`].
///
/// Anything left as `None` is computed on demand, with the same result as
/// the precomputed path.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelNorms<'a> {
    /// L2 norm of the whole template, see [`template_norm`].
    pub template: Option<f64>,
    /// Sliding L2 norm of the data, see [`sliding_norm`]. Ignored (and
    /// recomputed) unless its length is `ndata - ntemp`.
    pub data: Option<&'a [f32]>,
}

impl<'a> KernelNorms<'a> {
    pub fn new(template: Option<f64>, data: Option<&'a [f32]>) -> Self {
        Self { template, data }
    }

    pub fn with_template(template: f64) -> Self {
        Self {
            template: Some(template),
            data: None,
        }
    }
}

/// Scalar L2 norm of a template.
pub fn template_norm(template: &[f32]) -> f64 {
    template
        .iter()
        .map(|&x| x as f64 * x as f64)
        .sum::<f64>()
        .sqrt()
}

/// Sliding-window L2 norm of `data` for windows of `window_len` samples.
///
/// Entry `i` is the norm of `data[i + 1 ..= i + window_len]`, giving
/// `data.len() - window_len` entries (none if the window is longer than the
/// data). Computed as the difference of a cumulative sum of squares.
pub fn sliding_norm(data: &[f32], window_len: usize) -> Vec<f32> {
    if window_len > data.len() {
        return Vec::new();
    }
    let mut cumsum = Vec::with_capacity(data.len());
    let mut acc = 0.0_f64;
    for &x in data {
        acc += x as f64 * x as f64;
        cumsum.push(acc);
    }
    cumsum[window_len..]
        .iter()
        .zip(cumsum.iter())
        .map(|(&hi, &lo)| (hi - lo).max(0.0).sqrt() as f32)
        .collect()
}

/// Normalized cross-correlation between `data` and `template`.
///
/// Returns `data.len() - template.len()` values in `[-1, 1]`; entry `i`
/// correlates the template with the data window starting at `i + 1`.
/// Windows with zero energy produce 0 rather than NaN/Inf.
///
/// A template longer than the data yields the single-element trace `[0.0]`.
/// Callers must check the length before relying on per-sample semantics.
pub fn calc_cc(data: &[f32], template: &[f32], norms: &KernelNorms<'_>) -> Vec<f32> {
    let ntemp = template.len();
    let ndata = data.len();
    if ntemp > ndata {
        return vec![0.0];
    }
    if ntemp == 0 {
        return vec![0.0; ndata];
    }
    let norm_temp = norms.template.unwrap_or_else(|| template_norm(template));
    let norm_data: Cow<'_, [f32]> = match norms.data {
        Some(n) if n.len() == ndata - ntemp => Cow::Borrowed(n),
        _ => Cow::Owned(sliding_norm(data, ntemp)),
    };

    let raw = correlate_valid(data, template);
    raw[1..]
        .iter()
        .zip(norm_data.iter())
        .map(|(&c, &nd)| {
            let v = c / norm_temp / nd as f64;
            if v.is_finite() {
                v.clamp(-1.0, 1.0) as f32
            } else {
                0.0
            }
        })
        .collect()
}

/// Index of the first maximum of `values` (0 for an empty slice).
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Maximum of `values` (0 for an empty slice).
pub fn max_value(values: &[f32]) -> f32 {
    values.get(argmax(values)).copied().unwrap_or(0.0)
}

/// Un-normalized "valid" cross-correlation: `data.len() - template.len() + 1`
/// lags, lag `k` being `Σ_j data[k + j] · template[j]`.
pub(crate) fn correlate_valid(data: &[f32], template: &[f32]) -> Vec<f64> {
    if template.is_empty() || template.len() > data.len() {
        return Vec::new();
    }
    let nvalid = data.len() - template.len() + 1;
    if template.len() >= FFT_MIN_TEMPLATE_LEN && nvalid >= FFT_MIN_OUTPUT_LEN {
        correlate_fft(data, template).unwrap_or_else(|_| correlate_direct(data, template))
    } else {
        correlate_direct(data, template)
    }
}

fn correlate_direct(data: &[f32], template: &[f32]) -> Vec<f64> {
    let nvalid = data.len() - template.len() + 1;
    (0..nvalid)
        .map(|k| {
            data[k..k + template.len()]
                .iter()
                .zip(template)
                .map(|(&x, &t)| x as f64 * t as f64)
                .sum()
        })
        .collect()
}

/// Overlap-save correlation. Each block of `nfft` data samples yields
/// `nfft - ntemp + 1` alias-free lags.
fn correlate_fft(data: &[f32], template: &[f32]) -> Result<Vec<f64>, FftError> {
    let ntemp = template.len();
    let nvalid = data.len() - ntemp + 1;
    let nfft = (4 * ntemp).next_power_of_two().max(FFT_MIN_BLOCK_LEN);
    let step = nfft - ntemp + 1;
    let scale = 1.0 / nfft as f64;

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c: Arc<dyn RealToComplex<f64>> = planner.plan_fft_forward(nfft);
    let c2r: Arc<dyn ComplexToReal<f64>> = planner.plan_fft_inverse(nfft);

    let mut block = r2c.make_input_vec();
    for (b, &t) in block.iter_mut().zip(template) {
        *b = t as f64;
    }
    let mut template_spectrum = r2c.make_output_vec();
    r2c.process(&mut block, &mut template_spectrum)?;

    let mut spectrum = r2c.make_output_vec();
    let mut lags = c2r.make_output_vec();
    let mut out = vec![0.0; nvalid];

    let mut start = 0;
    while start < nvalid {
        let stop = (start + nfft).min(data.len());
        block.fill(0.0);
        for (b, &x) in block.iter_mut().zip(&data[start..stop]) {
            *b = x as f64;
        }
        r2c.process(&mut block, &mut spectrum)?;
        for (s, t) in spectrum.iter_mut().zip(&template_spectrum) {
            *s *= t.conj();
        }
        // DC and Nyquist bins of a real signal's spectrum are real
        spectrum[0].im = 0.0;
        if let Some(last) = spectrum.last_mut() {
            last.im = 0.0;
        }
        c2r.process(&mut spectrum, &mut lags)?;

        let count = step.min(nvalid - start);
        for (o, &v) in out[start..start + count].iter_mut().zip(&lags) {
            *o = v * scale;
        }
        start += step;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noise(n: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0_f32, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn test_output_length_and_range() {
        let data = noise(500, 1);
        let temp = noise(40, 2);
        let cc = calc_cc(&data, &temp, &KernelNorms::default());
        assert_eq!(cc.len(), 460);
        assert!(cc.iter().all(|v| v.is_finite() && (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_template_longer_than_data() {
        let cc = calc_cc(&[1.0, 2.0], &[1.0, 2.0, 3.0], &KernelNorms::default());
        assert_eq!(cc, vec![0.0]);
    }

    #[test]
    fn test_equal_lengths_is_empty() {
        let cc = calc_cc(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], &KernelNorms::default());
        assert!(cc.is_empty());
    }

    #[test]
    fn test_embedded_copy_peaks_at_offset() {
        let mut data = noise(2000, 3);
        let temp = noise(50, 4);
        let offset = 700;
        data[offset..offset + 50].copy_from_slice(&temp);
        let cc = calc_cc(&data, &temp, &KernelNorms::default());
        // entry i is the window starting at i + 1
        let peak = argmax(&cc);
        assert_eq!(peak, offset - 1);
        assert!((cc[peak] - 1.0).abs() < 1e-5, "peak = {}", cc[peak]);
        let rest = cc
            .iter()
            .enumerate()
            .filter(|(i, _)| i.abs_diff(peak) > 50)
            .map(|(_, v)| v.abs())
            .fold(0.0_f32, f32::max);
        assert!(rest < 0.7, "off-peak max = {}", rest);
    }

    #[test]
    fn test_zero_data_gives_zero() {
        let data = vec![0.0_f32; 300];
        let temp = noise(30, 5);
        let cc = calc_cc(&data, &temp, &KernelNorms::default());
        assert_eq!(cc.len(), 270);
        assert!(cc.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_precomputed_norms_match_on_demand() {
        let data = noise(3000, 6);
        let temp = noise(120, 7);
        let on_demand = calc_cc(&data, &temp, &KernelNorms::default());
        let dn = sliding_norm(&data, temp.len());
        let norms = KernelNorms::new(Some(template_norm(&temp)), Some(&dn));
        let precomputed = calc_cc(&data, &temp, &norms);
        assert_eq!(on_demand, precomputed);
    }

    #[test]
    fn test_wrong_length_data_norm_is_recomputed() {
        let data = noise(400, 8);
        let temp = noise(20, 9);
        let bogus = vec![1.0_f32; 10];
        let norms = KernelNorms::new(None, Some(&bogus));
        assert_eq!(
            calc_cc(&data, &temp, &norms),
            calc_cc(&data, &temp, &KernelNorms::default())
        );
    }

    #[test]
    fn test_fft_matches_direct() {
        let data = noise(20_000, 10);
        let temp = noise(200, 11);
        let fft = correlate_fft(&data, &temp).unwrap();
        let direct = correlate_direct(&data, &temp);
        assert_eq!(fft.len(), direct.len());
        for (a, b) in fft.iter().zip(&direct) {
            assert!((a - b).abs() < 1e-8, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_sliding_norm_windows() {
        let data = [1.0_f32, 2.0, 2.0, 1.0, 0.0];
        let n = sliding_norm(&data, 2);
        assert_eq!(n.len(), 3);
        // windows start at 1: [2,2], [2,1], [1,0]
        assert!((n[0] - 8.0_f32.sqrt()).abs() < 1e-6);
        assert!((n[1] - 5.0_f32.sqrt()).abs() < 1e-6);
        assert!((n[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_first_occurrence() {
        assert_eq!(argmax(&[0.1, 0.5, 0.5, 0.2]), 1);
        assert_eq!(argmax(&[]), 0);
        assert_eq!(max_value(&[]), 0.0);
        assert_eq!(max_value(&[-0.3, -0.1]), -0.1);
    }
}
