use crate::error::MapError;

/// A pitch held for `count` consecutive samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    /// Pitch symbol.
    pub pitch: i32,
    /// Number of samples, always ≥ 1.
    pub count: usize,
}

/// Ordered runs whose counts sum to the source sequence length.
///
/// # Example
/// ```
/// use hs_map::runs::encode;
/// let runs = encode(&[60, 60, 64, 60]).unwrap();
/// assert_eq!(runs.len(), 3);
/// assert_eq!(runs.total_count(), 4);
/// assert_eq!(runs.expand(), vec![60, 60, 64, 60]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSequence {
    runs: Vec<Run>,
}

impl RunSequence {
    /// Build a sequence from explicit runs.
    ///
    /// Adjacent runs may share a pitch; only non-empty input and non-zero
    /// counts are required.
    ///
    /// # Errors
    /// Returns `MapError::EmptyQuantized` for an empty list and
    /// `MapError::EmptyRun` for a zero count.
    pub fn from_runs(runs: Vec<Run>) -> Result<Self, MapError> {
        if runs.is_empty() {
            return Err(MapError::EmptyQuantized);
        }
        if let Some(index) = runs.iter().position(|r| r.count == 0) {
            return Err(MapError::EmptyRun { index });
        }
        Ok(Self { runs })
    }

    /// Runs in order.
    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Iterate over the runs.
    pub fn iter(&self) -> std::slice::Iter<'_, Run> {
        self.runs.iter()
    }

    /// Number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Never `true` for a constructed sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Sum of all counts = length of the source sequence.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.runs.iter().map(|r| r.count).sum()
    }

    /// Repeat each pitch by its count.
    #[must_use]
    pub fn expand(&self) -> Vec<i32> {
        let mut out = Vec::with_capacity(self.total_count());
        for run in &self.runs {
            out.extend(std::iter::repeat_n(run.pitch, run.count));
        }
        out
    }
}

impl<'a> IntoIterator for &'a RunSequence {
    type Item = &'a Run;
    type IntoIter = std::slice::Iter<'a, Run>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}

/// Compress consecutive repeated pitches into runs.
///
/// Single left-to-right scan; one run per maximal constant stretch.
///
/// # Errors
/// Returns `MapError::EmptyQuantized` for an empty input.
pub fn encode(quantized: &[i32]) -> Result<RunSequence, MapError> {
    let mut runs: Vec<Run> = Vec::new();
    for &pitch in quantized {
        match runs.last_mut() {
            Some(last) if last.pitch == pitch => last.count += 1,
            _ => runs.push(Run { pitch, count: 1 }),
        }
    }
    if runs.is_empty() {
        return Err(MapError::EmptyQuantized);
    }
    Ok(RunSequence { runs })
}
