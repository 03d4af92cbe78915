//! # Fast Fourier Transform (FFT) Module
//!
//! This module provides the FFT plumbing behind the pitch detector.
//! Autocorrelation over a full analysis frame is quadratic when done
//! directly; going through a zero-padded FFT round trip brings it down
//! to O(n log n), which is what keeps per-frame analysis real-time.
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - DC offset removal for accurate analysis
//! - Linear (non-circular) autocorrelation via zero padding

use rustfft::{num_complex::Complex, FftPlanner};

/// Removes the DC offset from a signal by making its average value zero.
///
/// DC offset shows up as a large constant term in the autocorrelation
/// and can drown out the periodic peaks we are looking for. This function
/// centers the signal around zero before analysis.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
pub fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Computes the linear autocorrelation of a signal.
///
/// Returns `r` where `r[tau] = sum(signal[i] * signal[i + tau])` for
/// `i` in `0..len - tau`. The signal is zero-padded to twice its length
/// (rounded up to a power of two) before the forward FFT so the result
/// is the linear autocorrelation, not the circular one.
///
/// # Arguments
/// * `signal` - Input audio signal
///
/// # Returns
/// * `Vec<f32>` - Autocorrelation values, one per lag, same length as the input
pub fn autocorrelate(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    // Pad to at least 2n so wrap-around products vanish.
    let padded_len = (2 * n).next_power_of_two();

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(padded_len);
    let inverse = planner.plan_fft_inverse(padded_len);

    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .chain(std::iter::repeat(Complex { re: 0.0, im: 0.0 }).take(padded_len - n))
        .collect();

    forward.process(&mut buffer);

    // Power spectrum: X * conj(X).
    for value in buffer.iter_mut() {
        *value = Complex { re: value.norm_sqr(), im: 0.0 };
    }

    inverse.process(&mut buffer);

    // RustFFT does not normalize; divide the inverse transform by its length.
    let scale = 1.0 / padded_len as f32;
    buffer
        .iter()
        .take(n)
        .map(|c| c.re * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct O(n^2) autocorrelation, the definition the FFT path must match.
    fn autocorrelate_naive(signal: &[f32]) -> Vec<f32> {
        (0..signal.len())
            .map(|tau| {
                (0..signal.len() - tau)
                    .map(|i| signal[i] * signal[i + tau])
                    .sum()
            })
            .collect()
    }

    #[test]
    fn dc_offset_is_removed() {
        let mut signal = vec![1.5, 2.5, 0.5, 1.5];
        remove_dc_offset(&mut signal);
        let avg = signal.iter().sum::<f32>() / signal.len() as f32;
        assert!(avg.abs() < 1e-6);
        assert!((signal[0] - 0.0).abs() < 1e-6);
        assert!((signal[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_mean_signal_is_untouched() {
        let mut signal = vec![1.0, -1.0, 1.0, -1.0];
        remove_dc_offset(&mut signal);
        assert_eq!(signal, vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn fft_autocorrelation_matches_direct_computation() {
        let signal: Vec<f32> = (0..64)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 16.0).sin())
            .collect();

        let fast = autocorrelate(&signal);
        let naive = autocorrelate_naive(&signal);

        assert_eq!(fast.len(), naive.len());
        for (a, b) in fast.iter().zip(naive.iter()) {
            assert!((a - b).abs() < 1e-3, "fft {a} vs direct {b}");
        }
    }

    #[test]
    fn empty_signal_yields_empty_result() {
        assert!(autocorrelate(&[]).is_empty());
    }

    #[test]
    fn periodic_signal_peaks_at_its_period() {
        // Period of 16 samples; r[16] should be a strong local maximum.
        let signal: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 16.0).sin())
            .collect();
        let r = autocorrelate(&signal);
        assert!(r[16] > r[8]);
        assert!(r[16] > r[24]);
    }
}
