//! # Tuning Session Module
//!
//! This module tracks progress toward a full-instrument tuning goal. A
//! session holds the active tuning preset, remembers which target notes
//! have already been confirmed in tune, and reports the per-frame
//! classification that a display collaborator renders.
//!
//! The session is frame-driven and single-threaded: it is only ever
//! touched from the frame-processing path, so it carries no locking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::note::{deviation, Note, TUNE_TOLERANCE_HZ};

/// Number of strings on the instrument; every preset targets exactly
/// this many notes, duplicates included.
pub const STRING_COUNT: usize = 6;

/// The selectable guitar tunings, each an ordered six-note target
/// sequence from low string to high.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuningPreset {
    /// E A D G B E
    #[default]
    Standard,
    /// D A D G B E
    DropD,
    /// D G D G B D
    OpenG,
}

impl TuningPreset {
    /// The ordered target notes, one per string.
    pub fn notes(self) -> [Note; STRING_COUNT] {
        match self {
            TuningPreset::Standard => [Note::E, Note::A, Note::D, Note::G, Note::B, Note::E],
            TuningPreset::DropD => [Note::D, Note::A, Note::D, Note::G, Note::B, Note::E],
            TuningPreset::OpenG => [Note::D, Note::G, Note::D, Note::G, Note::B, Note::D],
        }
    }

    /// The distinct pitch classes the preset targets. Completion is
    /// measured against this set: two strings tuned to the same pitch
    /// class count as one target.
    pub fn distinct_notes(self) -> BTreeSet<Note> {
        self.notes().into_iter().collect()
    }
}

/// The per-frame classification exposed to the display collaborator.
/// Overwritten on every processed frame, without smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentEstimate {
    /// Nearest pitch class.
    pub note: Note,
    /// Octave of the detected pitch.
    pub octave: i32,
    /// Detected frequency in Hz.
    pub frequency: f32,
    /// Signed distance from the note's open-string reference, in Hz.
    /// `None` when the detected note has no reference (an accidental
    /// passed through while bending toward a target).
    pub deviation: Option<f32>,
}

impl CurrentEstimate {
    /// Whether this frame's pitch sits within the tuning tolerance.
    pub fn is_in_tune(&self) -> bool {
        self.deviation
            .is_some_and(|d| d.abs() < TUNE_TOLERANCE_HZ)
    }

    /// Whether the string rings below its target and needs tightening.
    /// Meaningless when there is no deviation to compare.
    pub fn is_flat(&self) -> bool {
        self.deviation.is_some_and(|d| d <= -TUNE_TOLERANCE_HZ)
    }
}

/// Discrete events the session emits for feedback collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A target note was confirmed in tune for the first time this session.
    StringConfirmed(Note),
    /// Every distinct target note of the preset has been confirmed.
    /// Fires exactly once per session; only a reset re-arms it.
    SessionComplete,
}

/// Tracks one tuning run: which targets are confirmed, what the last
/// frame classified as, and whether the goal has been reached.
///
/// Invariant: `tuned` is always a subset of the preset's distinct notes.
#[derive(Debug, Clone)]
pub struct TuningSession {
    preset: TuningPreset,
    targets: BTreeSet<Note>,
    tuned: BTreeSet<Note>,
    current: Option<CurrentEstimate>,
    complete: bool,
}

impl TuningSession {
    /// Starts a session for the given preset, with nothing confirmed yet.
    pub fn new(preset: TuningPreset) -> Self {
        Self {
            preset,
            targets: preset.distinct_notes(),
            tuned: BTreeSet::new(),
            current: None,
            complete: false,
        }
    }

    /// Feeds one reliable frame estimate into the session.
    ///
    /// The caller must only pass frequencies that survived the pitch
    /// detector's gates (confidence, range); the session classifies the
    /// frequency, refreshes the display state, and confirms targets.
    ///
    /// # Returns
    /// The events this frame produced, in order: a possible
    /// [`SessionEvent::StringConfirmed`] followed by a possible
    /// [`SessionEvent::SessionComplete`]. Most frames produce none.
    pub fn on_estimate(&mut self, frequency: f32) -> Vec<SessionEvent> {
        let (note, octave) = Note::from_frequency(frequency);
        let dev = note.reference_frequency().ok().map(|target| deviation(frequency, target));

        // Display state is overwritten every frame; responsiveness is
        // preferred over stability here.
        let estimate = CurrentEstimate {
            note,
            octave,
            frequency,
            deviation: dev,
        };
        self.current = Some(estimate);

        let mut events = Vec::new();
        if estimate.is_in_tune() && self.targets.contains(&note) && self.tuned.insert(note) {
            events.push(SessionEvent::StringConfirmed(note));

            if !self.complete && self.tuned.len() == self.targets.len() {
                self.complete = true;
                events.push(SessionEvent::SessionComplete);
            }
        }
        events
    }

    /// Clears all confirmed targets, the display state, and the
    /// completion latch. Called on preset change and on stop/start.
    pub fn reset(&mut self) {
        self.tuned.clear();
        self.current = None;
        self.complete = false;
    }

    /// Replaces the target sequence wholesale and resets the session.
    pub fn set_preset(&mut self, preset: TuningPreset) {
        self.preset = preset;
        self.targets = preset.distinct_notes();
        self.reset();
    }

    /// The active preset.
    pub fn preset(&self) -> TuningPreset {
        self.preset
    }

    /// The last processed frame's classification, if any frame has been
    /// processed since the last reset.
    pub fn current(&self) -> Option<CurrentEstimate> {
        self.current
    }

    /// The target notes confirmed in tune so far this session.
    pub fn tuned(&self) -> &BTreeSet<Note> {
        &self.tuned
    }

    /// Whether this particular target note has been confirmed.
    pub fn is_string_tuned(&self, note: Note) -> bool {
        self.tuned.contains(&note)
    }

    /// Whether every distinct target of the preset has been confirmed.
    /// Latched: later detuning does not clear it, only [`reset`](Self::reset).
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_six_strings() {
        for preset in [TuningPreset::Standard, TuningPreset::DropD, TuningPreset::OpenG] {
            assert_eq!(preset.notes().len(), STRING_COUNT);
        }
    }

    #[test]
    fn standard_tuning_has_five_distinct_targets() {
        // Two E strings collapse into one target.
        assert_eq!(TuningPreset::Standard.distinct_notes().len(), 5);
        assert_eq!(TuningPreset::DropD.distinct_notes().len(), 5);
        assert_eq!(TuningPreset::OpenG.distinct_notes().len(), 3);
    }

    #[test]
    fn in_tune_frame_confirms_the_string_once() {
        let mut session = TuningSession::new(TuningPreset::Standard);

        let events = session.on_estimate(82.41);
        assert_eq!(events, vec![SessionEvent::StringConfirmed(Note::E)]);
        assert!(session.is_string_tuned(Note::E));

        // Same in-tune note again: no repeated event.
        assert!(session.on_estimate(82.41).is_empty());
        assert!(session.on_estimate(82.6).is_empty());
    }

    #[test]
    fn out_of_tune_frame_updates_display_but_confirms_nothing() {
        let mut session = TuningSession::new(TuningPreset::Standard);

        let events = session.on_estimate(108.0);
        assert!(events.is_empty());
        assert!(session.tuned().is_empty());

        let current = session.current().expect("display state after a frame");
        assert_eq!(current.note, Note::A);
        assert_eq!(current.octave, 2);
        assert_eq!(current.deviation, Some(-2.0));
        assert!(!current.is_in_tune());
        assert!(current.is_flat());
    }

    #[test]
    fn sharp_frame_is_never_reported_flat() {
        let mut session = TuningSession::new(TuningPreset::Standard);
        session.on_estimate(112.0);
        let current = session.current().unwrap();
        assert_eq!(current.deviation, Some(2.0));
        assert!(!current.is_flat());
    }

    #[test]
    fn in_tune_note_outside_the_preset_confirms_nothing() {
        let mut session = TuningSession::new(TuningPreset::Standard);

        // F is in the reference table but not a standard-tuning target.
        let events = session.on_estimate(174.61);
        assert!(events.is_empty());
        assert!(session.tuned().is_empty());
        assert!(session.current().unwrap().is_in_tune());
    }

    #[test]
    fn accidental_updates_display_without_deviation() {
        let mut session = TuningSession::new(TuningPreset::Standard);

        // F#2 while bending the low string toward G.
        let events = session.on_estimate(92.5);
        assert!(events.is_empty());

        let current = session.current().unwrap();
        assert_eq!(current.note, Note::FSharp);
        assert_eq!(current.deviation, None);
        assert!(!current.is_in_tune());
    }

    #[test]
    fn completion_fires_once_at_distinct_coverage() {
        let mut session = TuningSession::new(TuningPreset::Standard);

        // E A D G confirmed, one string at a time.
        for frequency in [82.41, 110.0, 146.83, 196.0] {
            let events = session.on_estimate(frequency);
            assert_eq!(events.len(), 1);
            assert!(!session.is_complete());
        }

        // The fifth distinct target completes the session, even though
        // only five of six strings have been played.
        let events = session.on_estimate(246.94);
        assert_eq!(
            events,
            vec![
                SessionEvent::StringConfirmed(Note::B),
                SessionEvent::SessionComplete,
            ]
        );
        assert!(session.is_complete());

        // Further in-tune frames never re-fire completion.
        assert!(session.on_estimate(82.41).is_empty());
        assert!(session.on_estimate(246.94).is_empty());
        assert!(session.is_complete());
    }

    #[test]
    fn completion_does_not_decay_on_later_detuning() {
        let mut session = TuningSession::new(TuningPreset::OpenG);
        for frequency in [146.83, 196.0, 246.94] {
            session.on_estimate(frequency);
        }
        assert!(session.is_complete());

        // A badly flat D afterward leaves the completion latch alone.
        session.on_estimate(143.0);
        assert!(session.is_complete());
    }

    #[test]
    fn reset_returns_a_completed_session_to_incomplete() {
        let mut session = TuningSession::new(TuningPreset::OpenG);
        for frequency in [146.83, 196.0, 246.94] {
            session.on_estimate(frequency);
        }
        assert!(session.is_complete());

        session.reset();
        assert!(!session.is_complete());
        assert!(session.tuned().is_empty());
        assert_eq!(session.current(), None);

        // Confirmation and completion are re-armed.
        let events = session.on_estimate(146.83);
        assert_eq!(events, vec![SessionEvent::StringConfirmed(Note::D)]);
    }

    #[test]
    fn preset_change_replaces_targets_and_resets() {
        let mut session = TuningSession::new(TuningPreset::Standard);
        session.on_estimate(82.41);
        assert!(session.is_string_tuned(Note::E));

        session.set_preset(TuningPreset::OpenG);
        assert_eq!(session.preset(), TuningPreset::OpenG);
        assert!(session.tuned().is_empty());

        // E is not an Open G target anymore.
        let events = session.on_estimate(82.41);
        assert!(events.is_empty());
        assert!(session.tuned().is_empty());
    }

    #[test]
    fn tuned_set_stays_within_the_preset_targets() {
        let mut session = TuningSession::new(TuningPreset::OpenG);
        for frequency in [82.41, 110.0, 146.83, 174.61, 196.0, 246.94, 130.81] {
            session.on_estimate(frequency);
        }
        assert!(session.tuned().is_subset(&TuningPreset::OpenG.distinct_notes()));
    }
}
