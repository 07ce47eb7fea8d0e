use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// General MIDI programs offered for voices, program number → display name.
pub const GM_INSTRUMENTS: &[(u8, &str)] = &[
    (0, "Acoustic Grand Piano"),
    (1, "Bright Acoustic Piano"),
    (2, "Electric Grand Piano"),
    (3, "Honky-tonk Piano"),
    (4, "Electric Piano 1"),
    (5, "Electric Piano 2"),
    (6, "Harpsichord"),
    (7, "Clavinet"),
    (8, "Celesta"),
    (9, "Glockenspiel"),
    (10, "Music Box"),
    (11, "Vibraphone"),
    (12, "Marimba"),
    (13, "Xylophone"),
    (14, "Tubular Bells"),
    (15, "Dulcimer"),
    (16, "Drawbar Organ"),
    (17, "Percussive Organ"),
    (18, "Rock Organ"),
    (19, "Church Organ"),
    (20, "Reed Organ"),
    (21, "Accordion"),
    (22, "Harmonica"),
    (23, "Tango Accordion"),
    (24, "Acoustic Guitar (nylon)"),
    (25, "Acoustic Guitar (steel)"),
    (26, "Electric Guitar (jazz)"),
    (27, "Electric Guitar (clean)"),
    (40, "Violin"),
    (41, "Viola"),
    (42, "Cello"),
    (43, "Contrabass"),
    (46, "Orchestral Harp"),
    (47, "Timpani"),
    (48, "String Ensemble 1"),
    (49, "String Ensemble 2"),
    (56, "Trumpet"),
    (57, "Trombone"),
    (58, "Tuba"),
    (60, "French Horn"),
    (64, "Soprano Sax"),
    (65, "Alto Sax"),
    (66, "Tenor Sax"),
    (67, "Baritone Sax"),
    (68, "Oboe"),
    (69, "English Horn"),
    (70, "Bassoon"),
    (71, "Clarinet"),
    (73, "Flute"),
    (74, "Recorder"),
    (75, "Pan Flute"),
    (80, "Lead 1 (square)"),
    (81, "Lead 2 (sawtooth)"),
    (88, "Pad 1 (new age)"),
    (89, "Pad 2 (warm)"),
    (98, "FX 3 (crystal)"),
    (99, "FX 4 (atmosphere)"),
];

/// Display name of a General MIDI program, if it is in the offered table.
///
/// # Example
/// ```
/// use hs_core::instrument::program_name;
/// assert_eq!(program_name(42), Some("Cello"));
/// assert_eq!(program_name(30), None);
/// ```
#[must_use]
pub fn program_name(program: u8) -> Option<&'static str> {
    GM_INSTRUMENTS
        .iter()
        .find(|(p, _)| *p == program)
        .map(|(_, name)| *name)
}

/// Instrument program number, guaranteed within `0..=127`.
///
/// # Example
/// ```
/// use hs_core::instrument::Program;
/// assert_eq!(Program::new(73).unwrap().get(), 73);
/// assert!(Program::new(128).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Program(u8);

impl Program {
    /// Highest valid program number.
    pub const MAX: u8 = 127;

    /// Validate a program number.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if `program` exceeds 127.
    pub fn new(program: u8) -> Result<Self, CoreError> {
        if program > Self::MAX {
            return Err(CoreError::Config(format!(
                "instrument program {program} outside 0..=127"
            )));
        }
        Ok(Self(program))
    }

    /// Raw program number.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// General MIDI display name, when known.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        program_name(self.0)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self(0)
    }
}

impl TryFrom<u8> for Program {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Program> for u8 {
    fn from(value: Program) -> Self {
        value.0
    }
}
