// Sonification mapping engine for hydrosong.
//
// series ──quantize──▶ pitches ──encode──▶ runs ──assemble──▶ note events
//
// Every stage is a pure function of its inputs; voices never share state.

pub mod assemble;
pub mod error;
pub mod quantize;
pub mod runs;
pub mod voice;

pub use assemble::{UnitDuration, assemble};
pub use error::{ErrorKind, MapError, RenderError, Stage, VoiceError};
pub use quantize::{BinEdges, QuantizeOptions, quantize};
pub use runs::{Run, RunSequence, encode};
pub use voice::{PipelineParams, RenderedVoice, VoiceInput, render_voice, render_voices};
