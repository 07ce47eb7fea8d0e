use std::collections::HashSet;

use crate::error::CoreError;

/// Chromatic: every semitone from C2 to B5.
pub const SCALE_CHROMATIC: &[i32] = &[
    36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59,
    60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 79, 80, 81, 82, 83,
];

/// C majeur pentatonique, C3 → C6.
pub const SCALE_C_MAJOR_PENTATONIC: &[i32] = &[
    48, 50, 52, 55, 57, 60, 62, 64, 67, 69, 72, 74, 76, 79, 81, 84,
];

/// C majeur diatonique, C2 → C6.
pub const SCALE_C_MAJOR_DIATONIC: &[i32] = &[
    36, 38, 40, 41, 43, 45, 47, 48, 50, 52, 53, 55, 57, 59, 60, 62, 64, 65, 67, 69, 71, 72, 74,
    76, 77, 79, 81, 84,
];

/// A mineur pentatonique, A2 → C6.
pub const SCALE_A_MINOR_PENTATONIC: &[i32] = &[
    45, 48, 50, 52, 55, 57, 60, 62, 64, 67, 69, 72, 74, 76, 79, 81, 84,
];

/// Double harmonic on C, C3 → C5.
pub const SCALE_ARAB_DOUBLE_HARMONIC: &[i32] = &[
    48, 49, 52, 53, 55, 56, 59, 60, 61, 64, 65, 67, 68, 71, 72,
];

/// Built-in scale table, name → ordered pitches (MIDI note numbers).
///
/// Every entry is strictly increasing.
pub const BUILTIN_SCALES: &[(&str, &[i32])] = &[
    ("Arab Double Harmonic", SCALE_ARAB_DOUBLE_HARMONIC),
    ("Chromatic", SCALE_CHROMATIC),
    ("C Major Pentatonic", SCALE_C_MAJOR_PENTATONIC),
    ("C Major Diatonic", SCALE_C_MAJOR_DIATONIC),
    ("A Minor Pentatonic", SCALE_A_MINOR_PENTATONIC),
];

/// Ordered set of distinct pitch symbols used as quantization targets.
///
/// Immutable once built: `inverted()` and `shifted()` derive new scales.
///
/// # Example
/// ```
/// use hs_core::scale::Scale;
/// let scale = Scale::new(vec![60, 64, 67]).unwrap();
/// assert_eq!(scale.len(), 3);
/// assert_eq!(scale.inverted().pitches(), &[67, 64, 60]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scale {
    pitches: Vec<i32>,
}

impl Scale {
    /// Build a scale from an ordered pitch list.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidInput` if fewer than 2 pitches are given
    /// or a pitch appears twice.
    pub fn new(pitches: Vec<i32>) -> Result<Self, CoreError> {
        if pitches.len() < 2 {
            return Err(CoreError::InvalidInput(format!(
                "a scale needs at least 2 pitches, got {}",
                pitches.len()
            )));
        }
        let mut seen = HashSet::with_capacity(pitches.len());
        if let Some(dup) = pitches.iter().find(|p| !seen.insert(**p)) {
            return Err(CoreError::InvalidInput(format!(
                "pitch {dup} appears more than once in the scale"
            )));
        }
        Ok(Self { pitches })
    }

    /// Look up a built-in scale by name (case-insensitive).
    ///
    /// # Errors
    /// Returns `CoreError::UnknownScale` if no built-in scale has that name.
    ///
    /// # Example
    /// ```
    /// use hs_core::scale::Scale;
    /// let scale = Scale::by_name("c major pentatonic").unwrap();
    /// assert_eq!(scale.pitches()[0], 48);
    /// assert!(Scale::by_name("Lydian Dominant").is_err());
    /// ```
    pub fn by_name(name: &str) -> Result<Self, CoreError> {
        BUILTIN_SCALES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, pitches)| Self {
                pitches: pitches.to_vec(),
            })
            .ok_or_else(|| CoreError::UnknownScale {
                name: name.to_string(),
            })
    }

    /// Names of every built-in scale, in table order.
    #[must_use]
    pub fn builtin_names() -> Vec<&'static str> {
        BUILTIN_SCALES.iter().map(|(n, _)| *n).collect()
    }

    /// Same pitches in reverse order.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            pitches: self.pitches.iter().rev().copied().collect(),
        }
    }

    /// Every pitch shifted by a constant offset.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidInput` if a shifted pitch overflows `i32`.
    ///
    /// # Example
    /// ```
    /// use hs_core::scale::Scale;
    /// let scale = Scale::new(vec![60, 62]).unwrap();
    /// assert_eq!(scale.shifted(-12).unwrap().pitches(), &[48, 50]);
    /// assert!(scale.shifted(i32::MAX).is_err());
    /// ```
    pub fn shifted(&self, offset: i32) -> Result<Self, CoreError> {
        let pitches = self
            .pitches
            .iter()
            .map(|p| {
                p.checked_add(offset).ok_or_else(|| {
                    CoreError::InvalidInput(format!("offset {offset} overflows pitch {p}"))
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { pitches })
    }

    /// Lowest and highest pitch.
    #[must_use]
    pub fn range(&self) -> (i32, i32) {
        let lo = self.pitches.iter().copied().min().unwrap_or_default();
        let hi = self.pitches.iter().copied().max().unwrap_or_default();
        (lo, hi)
    }

    /// Pitches in scale order.
    #[must_use]
    pub fn pitches(&self) -> &[i32] {
        &self.pitches
    }

    /// Number of pitches (always ≥ 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    /// Always `false`; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// `true` when pitches increase strictly from first to last.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.pitches.windows(2).all(|w| w[0] < w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scales_are_strictly_increasing() {
        for (name, _) in BUILTIN_SCALES {
            let scale = Scale::by_name(name).unwrap();
            assert!(scale.len() >= 2, "{name} trop courte");
            assert!(scale.is_ascending(), "{name} non monotone");
        }
    }

    #[test]
    fn builtin_scales_stay_in_midi_range() {
        for (name, pitches) in BUILTIN_SCALES {
            assert!(
                pitches.iter().all(|p| (0..=127).contains(p)),
                "{name} hors plage MIDI"
            );
        }
    }

    #[test]
    fn rejects_short_and_duplicate_scales() {
        assert!(matches!(
            Scale::new(vec![60]),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            Scale::new(vec![60, 62, 60]),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_name_reports_the_name() {
        let err = Scale::by_name("Bebop").unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownScale {
                name: "Bebop".into()
            }
        );
    }

    #[test]
    fn inversion_then_shift_composes() {
        let scale = Scale::new(vec![60, 64, 67]).unwrap();
        let derived = scale.inverted().shifted(2).unwrap();
        assert_eq!(derived.pitches(), &[69, 66, 62]);
        assert!(!derived.is_ascending());
        assert_eq!(derived.range(), (62, 69));
    }

    #[test]
    fn shift_overflow_is_an_error() {
        let scale = Scale::new(vec![-5, 5]).unwrap();
        assert!(matches!(
            scale.shifted(i32::MAX),
            Err(CoreError::InvalidInput(ref m)) if m.contains("pitch 5")
        ));
        assert!(scale.shifted(i32::MIN).is_err());
        assert_eq!(scale.shifted(i32::MAX - 5).unwrap().range(), (i32::MAX - 10, i32::MAX));
    }
}
