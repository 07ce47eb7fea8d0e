use hs_core::instrument::Program;
use hs_core::note::NoteEvent;

use crate::error::MapError;
use crate::runs::RunSequence;

/// Seconds per quantized sample, guaranteed positive and finite.
///
/// # Example
/// ```
/// use hs_map::assemble::UnitDuration;
/// assert!(UnitDuration::new(0.2).is_ok());
/// assert!(UnitDuration::new(0.0).is_err());
/// assert!(UnitDuration::new(f64::NAN).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitDuration(f64);

impl UnitDuration {
    /// Validate a duration.
    ///
    /// # Errors
    /// Returns `MapError::InvalidDuration` unless `secs` is finite and > 0.
    pub fn new(secs: f64) -> Result<Self, MapError> {
        if secs.is_finite() && secs > 0.0 {
            Ok(Self(secs))
        } else {
            Err(MapError::InvalidDuration { value: secs })
        }
    }

    /// Duration in seconds.
    #[must_use]
    pub fn secs(self) -> f64 {
        self.0
    }
}

/// Check a note-on velocity.
///
/// # Errors
/// Returns `MapError::InvalidVelocity` outside `1..=127`.
pub fn check_velocity(velocity: u8) -> Result<u8, MapError> {
    if (1..=127).contains(&velocity) {
        Ok(velocity)
    } else {
        Err(MapError::InvalidVelocity { value: velocity })
    }
}

/// Turn runs into contiguous, absolute-timed note events.
///
/// Time is accumulated as an integer step count and converted to seconds
/// at each boundary, so `events[i].end == events[i + 1].start` holds
/// bit-for-bit and the last `end` is `total_count × unit_duration`,
/// however many events there are.
///
/// # Errors
/// Returns `MapError::InvalidVelocity` for a velocity outside `1..=127`.
///
/// # Example
/// ```
/// use hs_core::instrument::Program;
/// use hs_map::assemble::{UnitDuration, assemble};
/// use hs_map::runs::encode;
/// let runs = encode(&[60, 60, 62]).unwrap();
/// let unit = UnitDuration::new(0.5).unwrap();
/// let events = assemble(&runs, unit, Program::default(), 100).unwrap();
/// assert_eq!(events.len(), 2);
/// assert_eq!((events[0].start, events[0].end), (0.0, 1.0));
/// assert_eq!((events[1].start, events[1].end), (1.0, 1.5));
/// ```
pub fn assemble(
    runs: &RunSequence,
    unit_duration: UnitDuration,
    program: Program,
    velocity: u8,
) -> Result<Vec<NoteEvent>, MapError> {
    let velocity = check_velocity(velocity)?;
    let mut current_step: u64 = 0;
    let events = runs
        .iter()
        .map(|run| {
            let start_step = current_step;
            current_step += run.count as u64;
            NoteEvent::from_steps(
                run.pitch,
                start_step,
                current_step,
                unit_duration.secs(),
                velocity,
                program,
            )
        })
        .collect();
    Ok(events)
}
