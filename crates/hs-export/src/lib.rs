// Score writers for hydrosong: Standard MIDI File output and a JSON note dump.

pub mod error;
pub mod json;
pub mod midi;

pub use error::ExportError;
pub use json::{JsonWriter, PieceSummary, VoiceSummary, notes_to_json};
pub use midi::{MidiWriter, TICKS_PER_QUARTER, build_smf, ticks_per_step};
