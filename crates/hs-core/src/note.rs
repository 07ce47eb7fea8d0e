use serde::Serialize;

use crate::instrument::Program;

/// Un événement de note à temps absolu, en secondes.
///
/// `start_step`/`end_step` count quantized samples from the beginning of
/// the voice; `start`/`end` are derived from them as
/// `step × unit_duration`, so two contiguous events share the exact same
/// boundary value.
///
/// # Example
/// ```
/// use hs_core::note::NoteEvent;
/// use hs_core::instrument::Program;
/// let ev = NoteEvent::from_steps(60, 2, 5, 0.25, 100, Program::default());
/// assert_eq!(ev.start, 0.5);
/// assert_eq!(ev.end, 1.25);
/// assert_eq!(ev.steps(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NoteEvent {
    /// Pitch symbol (MIDI note number once offsets are applied).
    pub pitch: i32,
    /// Onset, seconds from the start of the voice.
    pub start: f64,
    /// Release, seconds from the start of the voice.
    pub end: f64,
    /// Note-on velocity.
    pub velocity: u8,
    /// Instrument program of the owning voice.
    pub program: Program,
    /// Onset in sample steps.
    pub start_step: u64,
    /// Release in sample steps.
    pub end_step: u64,
}

impl NoteEvent {
    /// Build an event from step boundaries and the unit duration.
    #[must_use]
    pub fn from_steps(
        pitch: i32,
        start_step: u64,
        end_step: u64,
        unit_duration: f64,
        velocity: u8,
        program: Program,
    ) -> Self {
        Self {
            pitch,
            start: step_to_secs(start_step, unit_duration),
            end: step_to_secs(end_step, unit_duration),
            velocity,
            program,
            start_step,
            end_step,
        }
    }

    /// Length in sample steps.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.end_step - self.start_step
    }

    /// Length in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Convert a step count to seconds. Single conversion point for every
/// boundary so equal steps always yield bit-identical times.
#[inline]
#[must_use]
pub fn step_to_secs(step: u64, unit_duration: f64) -> f64 {
    step as f64 * unit_duration
}

/// Note events of one voice, ready for a score writer.
#[derive(Clone, Debug, Serialize)]
pub struct VoiceNotes {
    /// Voice index, 0-based.
    pub voice: usize,
    /// Gauge identifier the voice was built from.
    pub series_id: String,
    /// Instrument program.
    pub program: Program,
    /// Seconds per quantized sample.
    pub unit_duration: f64,
    /// Total number of quantized samples covered.
    pub total_steps: u64,
    /// Contiguous note events.
    pub events: Vec<NoteEvent>,
}

impl VoiceNotes {
    /// Total duration of the voice in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        step_to_secs(self.total_steps, self.unit_duration)
    }
}

/// Overall piece duration: the longest voice.
///
/// # Example
/// ```
/// use hs_core::note::{VoiceNotes, piece_duration};
/// use hs_core::instrument::Program;
/// let v = |steps| VoiceNotes {
///     voice: 0, series_id: "g".into(), program: Program::default(),
///     unit_duration: 0.5, total_steps: steps, events: vec![],
/// };
/// assert_eq!(piece_duration(&[v(4), v(10)]), 5.0);
/// assert_eq!(piece_duration(&[]), 0.0);
/// ```
#[must_use]
pub fn piece_duration(voices: &[VoiceNotes]) -> f64 {
    voices
        .iter()
        .map(VoiceNotes::duration)
        .fold(0.0, f64::max)
}
