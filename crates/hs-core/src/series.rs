use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// What to do with missing samples before quantization.
///
/// Missing samples are never quantized: they either abort the voice or
/// are removed explicitly, with the removal logged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum MissingPolicy {
    /// Fail on the first missing sample.
    #[default]
    Reject,
    /// Remove missing samples and keep the defined ones in order.
    Drop,
}

/// Une série numérique indexée par date (un débit journalier par jauge).
///
/// Dates are strictly increasing; `values[i]` is `None` when the sample
/// at `dates[i]` is missing.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use hs_core::series::Series;
/// let d = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
/// let series = Series::new(
///     "05484900",
///     vec![d("2020-01-01"), d("2020-01-02")],
///     vec![Some(310.0), None],
/// ).unwrap();
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.missing_count(), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    /// Gauge identifier.
    pub id: String,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl Series {
    /// Build a series, checking index alignment and date order.
    ///
    /// Non-finite values are stored as missing.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidInput` if the lengths differ or the dates
    /// are not strictly increasing.
    pub fn new(
        id: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, CoreError> {
        let id = id.into();
        if dates.len() != values.len() {
            return Err(CoreError::InvalidInput(format!(
                "series {id}: {} dates for {} values",
                dates.len(),
                values.len()
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoreError::InvalidInput(format!(
                "series {id}: dates not strictly increasing at {}",
                w[1]
            )));
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(Self { id, dates, values })
    }

    /// Number of samples, missing ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// `true` when the series has no samples at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Sample dates.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Raw samples, `None` for missing.
    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of missing samples.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// First and last date, if any.
    #[must_use]
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// Sous-série sur la plage de dates `[start, end]`, bornes incluses.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use hs_core::series::Series;
    /// let d = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    /// let series = Series::new(
    ///     "g",
    ///     vec![d("2020-01-01"), d("2020-01-02"), d("2020-01-03")],
    ///     vec![Some(1.0), Some(2.0), Some(3.0)],
    /// ).unwrap();
    /// let sub = series.between(d("2020-01-02"), d("2020-01-03"));
    /// assert_eq!(sub.values(), &[Some(2.0), Some(3.0)]);
    /// ```
    #[must_use]
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end).max(lo);
        Self {
            id: self.id.clone(),
            dates: self.dates[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }

    /// Fully defined samples, ready for quantization.
    ///
    /// # Errors
    /// With `MissingPolicy::Reject`, returns `CoreError::InvalidInput`
    /// naming the first missing date.
    pub fn defined_values(&self, policy: MissingPolicy) -> Result<Vec<f64>, CoreError> {
        match policy {
            MissingPolicy::Reject => self
                .values
                .iter()
                .zip(&self.dates)
                .map(|(v, d)| {
                    v.ok_or_else(|| {
                        CoreError::InvalidInput(format!(
                            "series {}: missing sample on {d}",
                            self.id
                        ))
                    })
                })
                .collect(),
            MissingPolicy::Drop => {
                let dropped = self.missing_count();
                if dropped > 0 {
                    log::warn!(
                        "Série {} : {dropped} échantillon(s) manquant(s) retiré(s)",
                        self.id
                    );
                }
                Ok(self.values.iter().flatten().copied().collect())
            }
        }
    }
}
