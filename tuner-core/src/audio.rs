//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform
//! Audio Library). It owns device selection and stream setup, and delivers
//! fixed-size sample frames to the analysis loop over a channel. The
//! analysis core never touches device lifecycle; dropping the returned
//! stream stops capture.
//!
//! ## Features
//! - Automatic input device selection
//! - Mono 32-bit float capture at 44.1 kHz
//! - Frame-sized delivery that never blocks the audio callback

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;
use anyhow::{Result, anyhow};

/// Number of samples per analysis frame.
///
/// 2048 samples at 44.1 kHz is ~46 ms of signal, enough to cover several
/// periods of the guitar's low E (82.41 Hz) for stable period detection.
pub const BUFFER_SIZE: usize = 2048;

/// Target capture rate in Hz.
const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts audio capture from the default input device.
///
/// Sets up a mono f32 input stream and a callback that accumulates
/// incoming samples, forwarding exact [`BUFFER_SIZE`]-sample frames over
/// `sender`. Frames are sent with `try_send`: if the analysis loop falls
/// behind, frames are dropped rather than stalling the audio thread.
///
/// # Arguments
/// * `sender` - Channel sender carrying frames to the analysis loop
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Live stream handle and its sample rate
/// * `Err(e)` - Device or stream setup failure (collaborator-level; the
///   tuning session simply receives no frames)
pub fn start_audio_capture(sender: Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    eprintln!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable mono f32 input format found"))?;

    let config = supported_config.with_sample_rate(cpal::SampleRate(TARGET_SAMPLE_RATE));
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    eprintln!("[AUDIO] Capturing at {} Hz", sample_rate);

    let err_fn = |err| eprintln!("[AUDIO] Stream error: {}", err);

    // Accumulates callback data until a full frame is available.
    let mut pending = Vec::with_capacity(BUFFER_SIZE * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            pending.extend_from_slice(data);

            while pending.len() >= BUFFER_SIZE {
                let frame: Vec<f32> = pending[..BUFFER_SIZE].to_vec();
                // Drop the frame if the channel is full; never block here.
                let _ = sender.try_send(frame);
                pending.drain(..BUFFER_SIZE);
            }
        },
        err_fn,
        None
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the input configuration closest to the target sample rate among
/// those that offer mono f32 capture.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}
