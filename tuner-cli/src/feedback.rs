//! Audible feedback for session events.
//!
//! Maps each [`SessionEvent`] to a short tone sequence and plays it on
//! the default output device via rodio. Playback is best-effort and runs
//! on its own thread so the frame loop never waits on the speaker.

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};
use std::time::Duration;
use tuner_core::SessionEvent;

/// One synthesized sine tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub duration: Duration,
}

const TONE_DURATION: Duration = Duration::from_millis(200);

/// Frequencies of the completion arpeggio: C4, E4, G4, C5.
const COMPLETION_MELODY: [f32; 4] = [261.63, 329.63, 392.00, 523.25];

/// The tone sequence a given event maps to.
///
/// A confirmed string gets a single A4 blip; a completed session gets a
/// rising C-major arpeggio.
pub fn tones_for(event: SessionEvent) -> Vec<Tone> {
    match event {
        SessionEvent::StringConfirmed(_) => vec![Tone {
            frequency: 440.0,
            duration: TONE_DURATION,
        }],
        SessionEvent::SessionComplete => COMPLETION_MELODY
            .iter()
            .map(|&frequency| Tone {
                frequency,
                duration: TONE_DURATION,
            })
            .collect(),
    }
}

/// Plays the tones for an event without blocking the caller.
/// Output-device failures are logged and swallowed.
pub fn play(event: SessionEvent) {
    let tones = tones_for(event);
    std::thread::spawn(move || {
        if let Err(e) = play_tones(&tones) {
            eprintln!("[FEEDBACK] Playback failed: {}", e);
        }
    });
}

fn play_tones(tones: &[Tone]) -> anyhow::Result<()> {
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    for tone in tones {
        sink.append(
            SineWave::new(tone.frequency)
                .take_duration(tone.duration)
                .amplify(0.20),
        );
    }
    sink.sleep_until_end();
    Ok(())
}
