use hs_core::config::{EdgeLayout, PieceConfig};
use hs_core::instrument::Program;
use hs_core::note::VoiceNotes;
use rayon::prelude::*;

use crate::assemble::{UnitDuration, assemble, check_velocity};
use crate::error::{MapError, RenderError, Stage, VoiceError};
use crate::quantize::{QuantizeOptions, quantize};
use crate::runs::encode;

/// Parameters shared by every voice of a piece.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineParams {
    /// Seconds per quantized sample (one tempo grid for all voices).
    pub unit_duration: f64,
    /// Note-on velocity.
    pub velocity: u8,
    /// Bin edges in log space.
    pub log_scale: bool,
    /// Placement of the bin edges.
    pub edge_layout: EdgeLayout,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self::from(&PieceConfig::default())
    }
}

impl From<&PieceConfig> for PipelineParams {
    fn from(config: &PieceConfig) -> Self {
        Self {
            unit_duration: config.unit_duration,
            velocity: config.velocity,
            log_scale: config.log_scale,
            edge_layout: config.edge_layout,
        }
    }
}

/// Everything one voice needs: its samples and its mapping settings.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceInput {
    /// Gauge identifier, carried through to the output.
    pub series_id: String,
    /// Fully defined samples.
    pub values: Vec<f64>,
    /// Scale pitches, in scale order.
    pub scale: Vec<i32>,
    /// Raw instrument program number.
    pub program: u8,
    /// Use the scale in reverse order.
    pub invert: bool,
    /// Pitch offset applied after lookup.
    pub offset: i32,
}

/// Output of one voice pipeline.
#[derive(Clone, Debug)]
pub struct RenderedVoice {
    /// Per-sample pitches, aligned with the input samples.
    pub quantized: Vec<i32>,
    /// Number of runs after compression.
    pub run_count: usize,
    /// Note events handed to the score writer.
    pub notes: VoiceNotes,
}

/// Validated shared parameters.
struct Checked {
    unit: UnitDuration,
    velocity: u8,
}

fn check_params(params: &PipelineParams) -> Result<Checked, MapError> {
    Ok(Checked {
        unit: UnitDuration::new(params.unit_duration)?,
        velocity: check_velocity(params.velocity)?,
    })
}

fn check_program(program: u8) -> Result<Program, MapError> {
    Program::new(program).map_err(|_| MapError::InvalidProgram { value: program })
}

fn run_pipeline(
    index: usize,
    input: &VoiceInput,
    params: &PipelineParams,
    checked: &Checked,
    program: Program,
) -> Result<RenderedVoice, VoiceError> {
    let options = QuantizeOptions {
        log_scale: params.log_scale,
        invert: input.invert,
        offset: input.offset,
        edge_layout: params.edge_layout,
    };
    let quantized = quantize(&input.values, &input.scale, &options)
        .map_err(|e| VoiceError::new(index, Stage::Quantize, e))?;
    let runs = encode(&quantized).map_err(|e| VoiceError::new(index, Stage::Encode, e))?;
    let events = assemble(&runs, checked.unit, program, checked.velocity)
        .map_err(|e| VoiceError::new(index, Stage::Assemble, e))?;

    log::debug!(
        "Voix {} ({}) : {} échantillons → {} notes",
        index + 1,
        input.series_id,
        quantized.len(),
        runs.len()
    );

    Ok(RenderedVoice {
        run_count: runs.len(),
        notes: VoiceNotes {
            voice: index,
            series_id: input.series_id.clone(),
            program,
            unit_duration: checked.unit.secs(),
            total_steps: runs.total_count() as u64,
            events,
        },
        quantized,
    })
}

/// Run quantize → encode → assemble for a single voice.
///
/// Parameters are checked before any computation.
///
/// # Errors
/// Returns a `VoiceError` carrying `index` and the failing stage.
///
/// # Example
/// ```
/// use hs_map::voice::{PipelineParams, VoiceInput, render_voice};
/// let input = VoiceInput {
///     series_id: "05484900".into(),
///     values: vec![120.0, 130.0, 900.0, 880.0],
///     scale: vec![60, 62, 64],
///     program: 0,
///     invert: false,
///     offset: 0,
/// };
/// let voice = render_voice(0, &input, &PipelineParams::default()).unwrap();
/// assert_eq!(voice.quantized, vec![60, 60, 64, 64]);
/// assert_eq!(voice.notes.events.len(), 2);
/// ```
pub fn render_voice(
    index: usize,
    input: &VoiceInput,
    params: &PipelineParams,
) -> Result<RenderedVoice, VoiceError> {
    let checked = check_params(params).map_err(|e| VoiceError::new(index, Stage::Configure, e))?;
    let program =
        check_program(input.program).map_err(|e| VoiceError::new(index, Stage::Configure, e))?;
    run_pipeline(index, input, params, &checked, program)
}

/// Render every voice, in parallel, in input order.
///
/// All parameters and programs are checked before the fan-out. Voices
/// share no state; the result is identical to rendering them one by one,
/// and on failure the error of the lowest-indexed failing voice is
/// returned.
///
/// # Errors
/// Returns `RenderError::Params` for a bad duration or velocity, otherwise
/// the first `VoiceError` in voice order.
pub fn render_voices(
    inputs: &[VoiceInput],
    params: &PipelineParams,
) -> Result<Vec<RenderedVoice>, RenderError> {
    let checked = check_params(params).map_err(RenderError::Params)?;
    let programs = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            check_program(input.program).map_err(|e| VoiceError::new(i, Stage::Configure, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let results: Vec<Result<RenderedVoice, VoiceError>> = inputs
        .par_iter()
        .zip(programs.par_iter())
        .enumerate()
        .map(|(i, (input, program))| run_pipeline(i, input, params, &checked, *program))
        .collect();

    Ok(results.into_iter().collect::<Result<_, _>>()?)
}
