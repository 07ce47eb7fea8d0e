use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use hs_core::error::CoreError;
use hs_core::series::Series;
use hs_core::traits::SeriesSource;
use serde_json::Value;

/// Gauge series loaded from a JSON document.
///
/// Layout: `{ "<gauge id>": { "<YYYY-MM-DD>": <sample>, ... }, ... }` where
/// a sample is a number, a numeric string, or a blank string / `null` for
/// a missing day.
///
/// # Example
/// ```
/// use hs_core::traits::SeriesSource;
/// use hs_source::dataset::JsonDataset;
/// let text = r#"{ "05484900": { "2012-06-01": 410.0, "2012-06-02": "" } }"#;
/// let dataset = JsonDataset::parse(text, &[]).unwrap();
/// let series = dataset.series("05484900").unwrap();
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.missing_count(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonDataset {
    series: BTreeMap<String, Series>,
}

impl JsonDataset {
    /// Parse a dataset, skipping the gauges listed in `exclude`.
    ///
    /// # Errors
    /// Returns an error on malformed JSON, unparseable dates or samples,
    /// or duplicated dates within a gauge.
    pub fn parse(text: &str, exclude: &[String]) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, Value>> =
            serde_json::from_str(text).context("Dataset JSON invalide")?;

        let mut series = BTreeMap::new();
        for (id, samples) in raw {
            if exclude.iter().any(|e| e == &id) {
                log::debug!("Jauge {id} exclue");
                continue;
            }
            let mut rows = Vec::with_capacity(samples.len());
            for (date, value) in &samples {
                let date = parse_date(date).with_context(|| format!("Jauge {id}"))?;
                let value = parse_sample(value)
                    .with_context(|| format!("Jauge {id}, date {date}"))?;
                rows.push((date, value));
            }
            rows.sort_by_key(|(d, _)| *d);
            let (dates, values) = rows.into_iter().unzip();
            let s = Series::new(id.clone(), dates, values)?;
            series.insert(id, s);
        }
        log::info!("{} jauge(s) chargée(s)", series.len());
        Ok(Self { series })
    }

    /// Number of gauges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// `true` when no gauge was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl SeriesSource for JsonDataset {
    fn series(&self, id: &str) -> Option<&Series> {
        self.series.get(id)
    }

    fn ids(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }
}

/// Charge un dataset JSON depuis le disque.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_dataset(path: &Path, exclude: &[String]) -> Result<JsonDataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    JsonDataset::parse(&text, exclude)
        .with_context(|| format!("Dataset rejeté : {}", path.display()))
}

/// Fetch one gauge and restrict it to `[start, end]` (inclusive, open
/// when `None`).
///
/// # Errors
/// Returns `CoreError::UnknownSeries` if the source lacks the gauge and
/// `CoreError::InvalidInput` if no sample falls in the range.
pub fn select_series(
    source: &dyn SeriesSource,
    id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Series, CoreError> {
    let full = source
        .series(id)
        .ok_or_else(|| CoreError::UnknownSeries { id: id.to_string() })?;
    let (first, last) = full
        .span()
        .ok_or_else(|| CoreError::InvalidInput(format!("series {id} has no samples")))?;
    let selected = full.between(start.unwrap_or(first), end.unwrap_or(last));
    if selected.is_empty() {
        return Err(CoreError::InvalidInput(format!(
            "series {id} has no samples between {} and {}",
            start.unwrap_or(first),
            end.unwrap_or(last)
        )));
    }
    Ok(selected)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(text: &str) -> Result<NaiveDate> {
    let day = text.trim().get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .with_context(|| format!("Date invalide : {text:?}"))
}

fn parse_sample(value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("Échantillon non numérique : {s:?}")),
        other => bail!("Échantillon de type inattendu : {other}"),
    }
}
