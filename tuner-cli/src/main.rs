//! # Guitar Tuner - Terminal Frontend
//!
//! Wires the capture, analysis, and session pieces of `tuner-core`
//! together behind a small CLI. One thread owns the cpal input stream;
//! the main thread runs the frame loop: receive a frame, estimate its
//! pitch, feed the session, print the display line, and hand any events
//! to the feedback player.

mod feedback;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use crossbeam_channel::bounded;
use tuner_core::{audio, pitch, SessionEvent, TuningPreset, TuningSession};

/// How many frames may sit between the capture callback and the frame
/// loop before capture starts dropping them.
const FRAME_QUEUE_DEPTH: usize = 8;

#[derive(Parser)]
#[command(name = "tuner", about = "Real-time guitar tuner")]
struct Args {
    /// Tuning preset to work toward
    #[arg(long, value_enum, default_value = "standard")]
    tuning: Tuning,

    /// Disable confirmation and completion tones
    #[arg(long)]
    mute: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tuning {
    /// E A D G B E
    Standard,
    /// D A D G B E
    DropD,
    /// D G D G B D
    OpenG,
}

impl From<Tuning> for TuningPreset {
    fn from(tuning: Tuning) -> Self {
        match tuning {
            Tuning::Standard => TuningPreset::Standard,
            Tuning::DropD => TuningPreset::DropD,
            Tuning::OpenG => TuningPreset::OpenG,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (sender, receiver) = bounded::<Vec<f32>>(FRAME_QUEUE_DEPTH);
    // Binding the stream keeps capture alive; dropping it stops capture.
    let (_stream, sample_rate) = audio::start_audio_capture(sender)?;

    let mut session = TuningSession::new(args.tuning.into());
    let target_names: Vec<String> = session
        .preset()
        .notes()
        .iter()
        .map(|note| note.to_string())
        .collect();
    eprintln!("[MAIN] Tuning toward: {}", target_names.join(" "));
    eprintln!("[MAIN] Play one string at a time. Ctrl-C to quit.");

    for frame in receiver.iter() {
        let Some(estimate) = pitch::estimate(&frame, sample_rate) else {
            continue;
        };

        let events = session.on_estimate(estimate.frequency);
        print_display(&session);

        for event in events {
            match event {
                SessionEvent::StringConfirmed(note) => {
                    eprintln!("[SESSION] String {} confirmed in tune", note);
                }
                SessionEvent::SessionComplete => {
                    eprintln!("[SESSION] All strings in tune!");
                }
            }
            if !args.mute {
                feedback::play(event);
            }
        }
    }

    Ok(())
}

/// Prints one display line for the last processed frame: detected pitch,
/// deviation with the direction to turn the peg, and per-string markers.
fn print_display(session: &TuningSession) {
    let Some(current) = session.current() else {
        return;
    };

    let guidance = match current.deviation {
        Some(_) if current.is_in_tune() => "in tune".to_string(),
        Some(d) if d < 0.0 => format!("{:+.2} Hz, tune up", d),
        Some(d) => format!("{:+.2} Hz, tune down", d),
        None => "between targets".to_string(),
    };

    let markers: Vec<String> = session
        .preset()
        .notes()
        .iter()
        .map(|&note| {
            if session.is_string_tuned(note) {
                format!("[{}]", note)
            } else {
                format!(" {} ", note)
            }
        })
        .collect();

    println!(
        "{}{}  {:7.2} Hz  {:<22}  {}",
        current.note,
        current.octave,
        current.frequency,
        guidance,
        markers.join(" ")
    );
}
