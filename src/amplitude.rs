//! Amplitude measurement used by the phase picker.
//!
//! The picker treats amplitude estimation as a black box: anything that
//! maps a waveform window to a scalar can be plugged in, including closures.

/// Measures the amplitude of a single-channel waveform window.
pub trait AmplitudeEstimator {
    fn get_amp(&self, data: &[f32]) -> f64;
}

impl<F> AmplitudeEstimator for F
where
    F: Fn(&[f32]) -> f64,
{
    fn get_amp(&self, data: &[f32]) -> f64 {
        self(data)
    }
}

/// Largest absolute deviation from the window mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakAmplitude;

impl AmplitudeEstimator for PeakAmplitude {
    fn get_amp(&self, data: &[f32]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let mean = data.iter().map(|&x| x as f64).sum::<f64>() / data.len() as f64;
        data.iter()
            .map(|&x| (x as f64 - mean).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_amplitude_removes_mean() {
        let amp = PeakAmplitude.get_amp(&[10.0, 12.0, 8.0, 10.0]);
        assert!((amp - 2.0).abs() < 1e-12);
        assert_eq!(PeakAmplitude.get_amp(&[]), 0.0);
    }

    #[test]
    fn test_closure_estimator() {
        let count = |d: &[f32]| d.len() as f64;
        assert_eq!(count.get_amp(&[1.0, 2.0, 3.0]), 3.0);
    }
}
