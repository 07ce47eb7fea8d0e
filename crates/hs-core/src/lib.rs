/// Configuration, types, and shared structures for hydrosong.
///
/// This crate contains the scale and instrument tables, the time-indexed
/// series type, note events, piece configuration, and the traits that
/// the ingestion, geo-metadata and score-writer collaborators implement.

pub mod config;
pub mod error;
pub mod instrument;
pub mod note;
pub mod scale;
pub mod series;
pub mod traits;

pub use config::{PieceConfig, VoiceConfig};
pub use error::CoreError;
pub use instrument::Program;
pub use note::{NoteEvent, VoiceNotes};
pub use scale::Scale;
pub use series::Series;
