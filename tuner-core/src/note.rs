//! # Note Classification Module
//!
//! This module maps detected frequencies onto the chromatic scale and
//! provides the reference frequencies the tuner targets. All calculations
//! use equal temperament with A4 = 440 Hz.
//!
//! ## Features
//! - Frequency to (note, octave) classification
//! - Open-string reference frequency table
//! - Signed deviation measurement against a target

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A detected frequency is "in tune" when its deviation from the target
/// stays within this many Hz.
pub const TUNE_TOLERANCE_HZ: f32 = 1.0;

/// The twelve pitch classes, in chromatic order starting at C.
///
/// A bare `Note` carries no octave: tuning targets are compared by pitch
/// class only, since a preset does not pin which octave a string rings at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Note {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

/// Chromatic ordering used for index arithmetic; C is index 0, A index 9.
const CHROMATIC: [Note; 12] = [
    Note::C,
    Note::CSharp,
    Note::D,
    Note::DSharp,
    Note::E,
    Note::F,
    Note::FSharp,
    Note::G,
    Note::GSharp,
    Note::A,
    Note::ASharp,
    Note::B,
];

/// Reference frequencies for the open-string notes used by the guitar's
/// tuning presets, each at its lowest standard octave on the instrument.
///
/// Accidentals are deliberately absent: no preset targets them, and a
/// lookup for one is a contract violation (see [`UndefinedNote`]).
static REFERENCE_FREQUENCIES: Lazy<BTreeMap<Note, f32>> = Lazy::new(|| {
    BTreeMap::from([
        (Note::E, 82.41),
        (Note::A, 110.00),
        (Note::D, 146.83),
        (Note::G, 196.00),
        (Note::B, 246.94),
        (Note::C, 130.81),
        (Note::F, 174.61),
    ])
});

/// Error returned when a reference frequency is requested for a note the
/// open-string table does not define. Reaching this from session code
/// means a preset was built with a note outside the instrument's targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no open-string reference frequency defined for {0}")]
pub struct UndefinedNote(pub Note);

impl Note {
    /// Classifies a frequency as the nearest note in equal temperament.
    ///
    /// Uses A4 = 440 Hz as the anchor, with A at chromatic index 9.
    /// The half-step count is rounded half-up, which fixes the boundary
    /// between adjacent notes at the quarter-tone.
    ///
    /// # Arguments
    /// * `frequency` - Input frequency in Hz, must be positive
    ///
    /// # Returns
    /// * `(Note, octave)` - Nearest pitch class and its octave number
    pub fn from_frequency(frequency: f32) -> (Note, i32) {
        // round(12 * log2(f / 440)), half-up.
        let half_steps = (12.0 * (frequency / 440.0).log2() + 0.5).floor() as i32;

        // Shift so the count is relative to C4 (A is 9 semitones above C).
        let from_c4 = half_steps + 9;
        let note = CHROMATIC[from_c4.rem_euclid(12) as usize];
        let octave = 4 + from_c4.div_euclid(12);
        (note, octave)
    }

    /// Looks up the open-string reference frequency this note is tuned
    /// toward.
    ///
    /// # Returns
    /// * `Ok(frequency)` - Reference frequency in Hz
    /// * `Err(UndefinedNote)` - The note has no open-string target
    pub fn reference_frequency(self) -> Result<f32, UndefinedNote> {
        REFERENCE_FREQUENCIES
            .get(&self)
            .copied()
            .ok_or(UndefinedNote(self))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Note::C => "C",
            Note::CSharp => "C#",
            Note::D => "D",
            Note::DSharp => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::FSharp => "F#",
            Note::G => "G",
            Note::GSharp => "G#",
            Note::A => "A",
            Note::ASharp => "A#",
            Note::B => "B",
        };
        f.write_str(name)
    }
}

/// Calculates the signed deviation of a detected frequency from a target.
///
/// The result is in Hz: negative means the string rings below the target
/// (flat, needs tightening), positive means above it (sharp).
pub fn deviation(detected: f32, target: f32) -> f32 {
    detected - target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_a_classifies_as_a4() {
        assert_eq!(Note::from_frequency(440.0), (Note::A, 4));
    }

    #[test]
    fn low_e_string_classifies_as_e2() {
        assert_eq!(Note::from_frequency(82.41), (Note::E, 2));
    }

    #[test]
    fn octave_above_concert_a_classifies_as_a5() {
        assert_eq!(Note::from_frequency(880.0), (Note::A, 5));
    }

    #[test]
    fn middle_c_classifies_as_c4() {
        assert_eq!(Note::from_frequency(261.63), (Note::C, 4));
    }

    #[test]
    fn octave_boundary_stays_below_c() {
        // B3 is just under the C4 boundary.
        assert_eq!(Note::from_frequency(246.94), (Note::B, 3));
    }

    #[test]
    fn quarter_tone_boundary_rounds_half_up() {
        // The A4 / A#4 boundary sits at 440 * 2^(1/24) ~= 452.89 Hz.
        let boundary = 440.0 * 2.0_f32.powf(1.0 / 24.0);
        assert_eq!(Note::from_frequency(boundary - 0.05), (Note::A, 4));
        assert_eq!(Note::from_frequency(boundary + 0.05), (Note::ASharp, 4));
    }

    #[test]
    fn open_string_references_match_the_table() {
        assert_eq!(Note::E.reference_frequency(), Ok(82.41));
        assert_eq!(Note::A.reference_frequency(), Ok(110.00));
        assert_eq!(Note::D.reference_frequency(), Ok(146.83));
        assert_eq!(Note::G.reference_frequency(), Ok(196.00));
        assert_eq!(Note::B.reference_frequency(), Ok(246.94));
        assert_eq!(Note::C.reference_frequency(), Ok(130.81));
        assert_eq!(Note::F.reference_frequency(), Ok(174.61));
    }

    #[test]
    fn accidental_lookup_is_a_typed_error() {
        assert_eq!(
            Note::FSharp.reference_frequency(),
            Err(UndefinedNote(Note::FSharp))
        );
    }

    #[test]
    fn deviation_is_signed_hz() {
        assert_eq!(deviation(108.0, 110.0), -2.0);
        assert_eq!(deviation(112.5, 110.0), 2.5);
    }

    #[test]
    fn note_names_render_with_sharps() {
        assert_eq!(Note::FSharp.to_string(), "F#");
        assert_eq!(Note::E.to_string(), "E");
    }
}
