//! # Pitch Detection Module
//!
//! This module implements the fundamental-frequency estimator for the tuner.
//! It uses the normalized square difference function (McLeod/NSDF), an
//! autocorrelation-family method that holds up well on plucked strings.
//!
//! ## Features
//! - FFT-accelerated autocorrelation (see [`crate::fft`])
//! - Amplitude gating to filter out silence
//! - Clarity checking to reject noise and ambiguous frames
//! - Parabolic interpolation for sub-sample accuracy
//! - Instrument-range gating (guitar fundamentals only)

use crate::audio::BUFFER_SIZE;
use crate::fft;

/// Minimum RMS amplitude for a frame to be considered at all.
/// Below this the frame is treated as silence.
pub const AMPLITUDE_THRESHOLD: f32 = 0.01;

/// Minimum clarity (normalized peak strength, 0.0 to 1.0) for an
/// estimate to be considered reliable.
pub const CLARITY_THRESHOLD: f32 = 0.7;

/// A candidate peak must reach this fraction of the strongest peak to be
/// picked. Preferring the first such peak over the absolute maximum is
/// what prevents octave errors on string harmonics.
const PEAK_THRESHOLD: f32 = 0.9;

/// Lowest fundamental the tuner will report, in Hz. A guitar's low E
/// sits at 82.41 Hz even in drop tunings' neighborhood.
pub const MIN_FREQUENCY: f32 = 60.0;

/// Highest fundamental the tuner will report, in Hz.
pub const MAX_FREQUENCY: f32 = 1000.0;

/// A single-frame pitch estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Detected fundamental frequency in Hz.
    pub frequency: f32,
    /// Normalized strength of the detected periodicity (0.0 to 1.0).
    pub clarity: f32,
}

/// Estimates the fundamental frequency of one audio frame.
///
/// The frame is analyzed in isolation; no state is carried between calls.
/// Frames that carry no reliable pitch (silence, noise, frequencies
/// outside the instrument range) yield `None` rather than an error, and
/// degenerate input (wrong frame length, all zeros) does the same — this
/// function never panics.
///
/// # Arguments
/// * `signal` - Input audio frame, exactly [`BUFFER_SIZE`] samples
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
/// * `Some(PitchEstimate)` - Detected frequency and clarity
/// * `None` - No reliable pitch in this frame
pub fn estimate(signal: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
    if signal.len() != BUFFER_SIZE {
        return None;
    }

    // --- Noise gate: reject silence before doing any real work ---
    let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt();
    if rms < AMPLITUDE_THRESHOLD {
        return None;
    }

    let mut frame = signal.to_vec();
    fft::remove_dc_offset(&mut frame);

    let nsdf = normalized_square_difference(&frame);

    // --- Peak picking: first key maximum close enough to the global one ---
    let maxima = key_maxima(&nsdf);
    let global_max = maxima
        .iter()
        .map(|&(_, value)| value)
        .fold(0.0_f32, f32::max);
    if global_max <= 0.0 {
        return None;
    }

    let threshold = PEAK_THRESHOLD * global_max;
    let (period, peak_value) = maxima
        .into_iter()
        .find(|&(_, value)| value >= threshold)?;

    let clarity = peak_value.min(1.0);
    if clarity < CLARITY_THRESHOLD || period <= 0.0 {
        return None;
    }

    let frequency = sample_rate as f32 / period;

    // Out-of-range results are "no pitch", not an error.
    if frequency.is_finite() && (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency) {
        Some(PitchEstimate { frequency, clarity })
    } else {
        None
    }
}

/// Computes the NSDF over lags `0..len/2`.
///
/// `nsdf[tau] = 2 * r(tau) / m(tau)` where `r` is the linear
/// autocorrelation and `m(tau)` is the sum of squared samples of both
/// windows at lag `tau`. Values fall in [-1.0, 1.0]; a perfectly periodic
/// signal reaches 1.0 at its period.
fn normalized_square_difference(frame: &[f32]) -> Vec<f32> {
    let n = frame.len();
    let r = fft::autocorrelate(frame);

    let mut nsdf = vec![0.0; n / 2];
    // m(tau) is maintained incrementally: each lag increment drops one
    // sample from the front of one window and the back of the other.
    let mut m = 2.0 * r[0];
    for tau in 0..n / 2 {
        if tau > 0 {
            m -= frame[tau - 1] * frame[tau - 1] + frame[n - tau] * frame[n - tau];
        }
        nsdf[tau] = if m > f32::EPSILON { 2.0 * r[tau] / m } else { 0.0 };
    }
    nsdf
}

/// Finds the key maxima of the NSDF: the highest point of every positive
/// region after the zero-lag lobe, each refined by parabolic interpolation.
///
/// # Returns
/// * `Vec<(period, value)>` - Interpolated lag and NSDF value per maximum,
///   in ascending lag order
fn key_maxima(nsdf: &[f32]) -> Vec<(f32, f32)> {
    let mut maxima = Vec::new();
    let mut tau = 1;

    // Walk off the zero-lag lobe; every NSDF starts at 1.0.
    while tau < nsdf.len() && nsdf[tau] > 0.0 {
        tau += 1;
    }

    while tau < nsdf.len() {
        while tau < nsdf.len() && nsdf[tau] <= 0.0 {
            tau += 1;
        }
        if tau >= nsdf.len() {
            break;
        }
        let mut best = tau;
        while tau < nsdf.len() && nsdf[tau] > 0.0 {
            if nsdf[tau] > nsdf[best] {
                best = tau;
            }
            tau += 1;
        }
        maxima.push(interpolate_peak(nsdf, best));
    }
    maxima
}

/// Refines a discrete peak position with a parabola through the peak and
/// its two neighbors, for sub-sample lag accuracy.
fn interpolate_peak(nsdf: &[f32], index: usize) -> (f32, f32) {
    if index == 0 || index + 1 >= nsdf.len() {
        return (index as f32, nsdf[index]);
    }

    let y1 = nsdf[index - 1];
    let y2 = nsdf[index];
    let y3 = nsdf[index + 1];

    let denominator = y1 - 2.0 * y2 + y3;
    if denominator.abs() < 1e-9 {
        return (index as f32, y2);
    }

    let shift = (y1 - y3) / (2.0 * denominator);
    let peak_value = y2 - 0.25 * (y1 - y3) * shift;
    (index as f32 + shift, peak_value)
}
