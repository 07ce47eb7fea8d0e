use thiserror::Error;

/// Errors originating from the mapping engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// Nothing to quantize.
    #[error("empty series")]
    EmptySeries,

    /// NaN or infinite sample; missing values must be handled upstream.
    #[error("undefined sample at index {index}")]
    UndefinedSample {
        /// Position in the series.
        index: usize,
    },

    /// Zero or negative sample under log-space binning.
    #[error("sample {value} at index {index} is not strictly positive (log binning)")]
    NonPositiveLog {
        /// Position in the series.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Scale with fewer than 2 pitches.
    #[error("scale has {len} pitch(es), at least 2 required")]
    ScaleTooShort {
        /// Number of pitches supplied.
        len: usize,
    },

    /// Scale listing the same pitch twice.
    #[error("pitch {pitch} appears more than once in the scale")]
    DuplicatePitch {
        /// Repeated pitch.
        pitch: i32,
    },

    /// Nothing to run-length encode.
    #[error("empty quantized sequence")]
    EmptyQuantized,

    /// Run with a zero repeat count.
    #[error("run {index} has a zero repeat count")]
    EmptyRun {
        /// Position in the run sequence.
        index: usize,
    },

    /// Offset pushing a pitch outside the `i32` range.
    #[error("offset {offset} overflows the pitch at index {index}")]
    PitchOverflow {
        /// Position in the series.
        index: usize,
        /// Offset that was applied.
        offset: i32,
    },

    /// Unit duration not a positive finite number.
    #[error("unit duration {value} must be a positive number of seconds")]
    InvalidDuration {
        /// Supplied duration.
        value: f64,
    },

    /// Instrument program outside 0..=127.
    #[error("instrument program {value} outside 0..=127")]
    InvalidProgram {
        /// Supplied program.
        value: u8,
    },

    /// Velocity outside 1..=127.
    #[error("velocity {value} outside 1..=127")]
    InvalidVelocity {
        /// Supplied velocity.
        value: u8,
    },
}

/// Error taxonomy surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The data cannot be sonified as given.
    InvalidInput,
    /// A parameter is malformed; detected before any computation.
    Configuration,
}

impl MapError {
    /// Taxonomy bucket of this error.
    ///
    /// # Example
    /// ```
    /// use hs_map::error::{ErrorKind, MapError};
    /// assert_eq!(MapError::EmptySeries.kind(), ErrorKind::InvalidInput);
    /// assert_eq!(MapError::InvalidDuration { value: 0.0 }.kind(), ErrorKind::Configuration);
    /// ```
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDuration { .. }
            | Self::InvalidProgram { .. }
            | Self::InvalidVelocity { .. } => ErrorKind::Configuration,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Pipeline stage of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Parameter checks, before any computation.
    Configure,
    /// Scale quantization.
    Quantize,
    /// Run-length encoding.
    Encode,
    /// Note-event assembly.
    Assemble,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configure => "configure",
            Self::Quantize => "quantize",
            Self::Encode => "encode",
            Self::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

/// A `MapError` tagged with the voice and stage that raised it.
///
/// # Example
/// ```
/// use hs_map::error::{MapError, Stage, VoiceError};
/// let err = VoiceError::new(1, Stage::Quantize, MapError::EmptySeries);
/// assert_eq!(err.to_string(), "voice 2 (quantize): empty series");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[error("voice {} ({stage}): {source}", .voice + 1)]
pub struct VoiceError {
    /// Voice index, 0-based.
    pub voice: usize,
    /// Stage that failed.
    pub stage: Stage,
    /// Underlying error.
    #[source]
    pub source: MapError,
}

impl VoiceError {
    /// Tag an error with its voice and stage.
    #[must_use]
    pub fn new(voice: usize, stage: Stage, source: MapError) -> Self {
        Self {
            voice,
            stage,
            source,
        }
    }

    /// Taxonomy bucket of the underlying error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Failure of a whole-piece render.
///
/// Shared parameters belong to no voice and are reported on their own;
/// everything else carries the failing voice.
///
/// # Example
/// ```
/// use hs_map::error::{ErrorKind, MapError, RenderError};
/// let err = RenderError::Params(MapError::InvalidVelocity { value: 0 });
/// assert!(err.voice().is_none());
/// assert_eq!(err.kind(), ErrorKind::Configuration);
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Unit duration or velocity rejected before any voice ran.
    #[error("piece parameters: {0}")]
    Params(#[source] MapError),

    /// A single voice failed.
    #[error(transparent)]
    Voice(#[from] VoiceError),
}

impl RenderError {
    /// Index of the failing voice, if the error belongs to one.
    #[must_use]
    pub fn voice(&self) -> Option<usize> {
        match self {
            Self::Params(_) => None,
            Self::Voice(e) => Some(e.voice),
        }
    }

    /// Taxonomy bucket of the underlying error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Params(e) => e.kind(),
            Self::Voice(e) => e.kind(),
        }
    }
}
