use thiserror::Error;

/// Errors raised while encoding a score.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Pitch outside the MIDI key range once offsets were applied.
    #[error("Voix {voice} : hauteur {pitch} hors de 0..=127")]
    PitchOutOfRange {
        /// Voice index, 1-based.
        voice: usize,
        /// Offending pitch.
        pitch: i32,
    },

    /// More voices than free MIDI channels (channel 10 is reserved for drums).
    #[error("{count} voix demandées, 15 canaux MIDI disponibles")]
    TooManyVoices {
        /// Number of voices supplied.
        count: usize,
    },

    /// Event gap longer than a MIDI delta-time can hold.
    #[error("Voix {voice} : écart de {ticks} ticks trop long pour le format MIDI")]
    DeltaOverflow {
        /// Voice index, 1-based.
        voice: usize,
        /// Requested delta in ticks.
        ticks: u64,
    },

    /// Unit duration not a positive finite number.
    #[error("Durée unitaire invalide : {value}")]
    InvalidDuration {
        /// Supplied duration.
        value: f64,
    },

    /// Voices disagreeing on the unit duration.
    #[error("Durées unitaires divergentes : {first} et {other}")]
    MixedDurations {
        /// Unit duration of the first voice.
        first: f64,
        /// First differing duration.
        other: f64,
    },

    /// Underlying write failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
