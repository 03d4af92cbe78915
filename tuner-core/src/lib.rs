// tuner-core/src/lib.rs

//! The core logic for the guitar tuner.
//! This crate is responsible for audio capture, pitch detection,
//! note classification, and tuning-session tracking. It is completely
//! headless and contains no GUI code.

pub mod audio;
pub mod fft;
pub mod note;
pub mod pitch;
pub mod session;

pub use note::{Note, UndefinedNote};
pub use pitch::PitchEstimate;
pub use session::{CurrentEstimate, SessionEvent, TuningPreset, TuningSession};
