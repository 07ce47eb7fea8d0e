use std::collections::HashSet;

use hs_core::config::EdgeLayout;

use crate::error::MapError;

/// Options of the scale quantizer.
///
/// # Example
/// ```
/// use hs_map::quantize::QuantizeOptions;
/// let opts = QuantizeOptions::default();
/// assert!(!opts.log_scale);
/// assert_eq!(opts.offset, 0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuantizeOptions {
    /// Place bin edges in natural-log space.
    pub log_scale: bool,
    /// Use the scale in reverse order.
    pub invert: bool,
    /// Added to every resulting pitch, after the scale lookup.
    pub offset: i32,
    /// Placement of the bin edges over `[min, max]`.
    pub edge_layout: EdgeLayout,
}

/// Bin edges fitted to one series, with a right-open bin rule.
///
/// Bin index = number of edges `≤ x`: a value equal to an edge falls into
/// the higher bin, a value below the first edge falls into bin 0, a value
/// above the last edge falls into the last bin.
///
/// A zero-width range (constant series) has no usable edges; every value
/// then maps to the middle bin `(bins − 1) / 2`.
///
/// # Example
/// ```
/// use hs_core::config::EdgeLayout;
/// use hs_map::quantize::BinEdges;
/// let edges = BinEdges::new(0.0, 10.0, 5, EdgeLayout::Interior);
/// assert_eq!(edges.edges(), &[2.0, 4.0, 6.0, 8.0]);
/// assert_eq!(edges.index_of(0.0), 0);
/// assert_eq!(edges.index_of(4.0), 2);
/// assert_eq!(edges.index_of(10.0), 4);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
    bins: usize,
    degenerate: bool,
}

impl BinEdges {
    /// Build `bins − 1` edges over `[min, max]`.
    ///
    /// `bins` must be at least 2; callers validate the scale first.
    #[must_use]
    pub fn new(min: f64, max: f64, bins: usize, layout: EdgeLayout) -> Self {
        debug_assert!(bins >= 2, "BinEdges needs at least 2 bins");
        if min >= max {
            return Self {
                edges: Vec::new(),
                bins,
                degenerate: true,
            };
        }
        let edges = match layout {
            EdgeLayout::Interior => {
                let points = linspace(min, max, bins + 1);
                points[1..bins].to_vec()
            }
            EdgeLayout::Spanning => linspace(min, max, bins - 1),
        };
        Self {
            edges,
            bins,
            degenerate: false,
        }
    }

    /// Fit edges to a (transformed) series.
    ///
    /// # Errors
    /// Returns `MapError::EmptySeries` if `values` is empty.
    pub fn fit(values: &[f64], bins: usize, layout: EdgeLayout) -> Result<Self, MapError> {
        let (min, max) = min_max(values).ok_or(MapError::EmptySeries)?;
        Ok(Self::new(min, max, bins, layout))
    }

    /// Edge values, ascending. Empty for a degenerate range.
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// `true` when the fitted range had zero width.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Bin index of a value, in `0..bins`.
    #[inline]
    #[must_use]
    pub fn index_of(&self, value: f64) -> usize {
        if self.degenerate {
            return (self.bins - 1) / 2;
        }
        self.edges.partition_point(|e| *e <= value)
    }
}

/// `num` evenly spaced points from `start` to `stop`, both included.
///
/// Points are interpolated as `start·(1 − t) + stop·t` so that no
/// intermediate exceeds the magnitude of the bounds, even when
/// `stop − start` is not representable. The last point is pinned to
/// `stop` exactly.
fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = (num - 1) as f64;
            let mut points: Vec<f64> = (0..num)
                .map(|i| {
                    let t = i as f64 / last;
                    start * (1.0 - t) + stop * t
                })
                .collect();
            points[num - 1] = stop;
            points
        }
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Check the scale contract: ≥ 2 distinct pitches.
fn check_scale(scale: &[i32]) -> Result<(), MapError> {
    if scale.len() < 2 {
        return Err(MapError::ScaleTooShort { len: scale.len() });
    }
    let mut seen = HashSet::with_capacity(scale.len());
    if let Some(dup) = scale.iter().find(|p| !seen.insert(**p)) {
        return Err(MapError::DuplicatePitch { pitch: *dup });
    }
    Ok(())
}

/// Validate the samples and move them into binning space.
fn binning_space(series: &[f64], log_scale: bool) -> Result<Vec<f64>, MapError> {
    if series.is_empty() {
        return Err(MapError::EmptySeries);
    }
    series
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if !value.is_finite() {
                return Err(MapError::UndefinedSample { index });
            }
            if log_scale {
                if value <= 0.0 {
                    return Err(MapError::NonPositiveLog { index, value });
                }
                Ok(value.ln())
            } else {
                Ok(value)
            }
        })
        .collect()
}

/// Bin index of every sample, before any scale lookup.
///
/// # Errors
/// Same conditions as [`quantize`], minus the scale checks.
pub fn bin_indices(
    series: &[f64],
    bins: usize,
    log_scale: bool,
    layout: EdgeLayout,
) -> Result<Vec<usize>, MapError> {
    if bins < 2 {
        return Err(MapError::ScaleTooShort { len: bins });
    }
    let values = binning_space(series, log_scale)?;
    let edges = BinEdges::fit(&values, bins, layout)?;
    if edges.is_degenerate() {
        log::debug!(
            "Série constante ({} échantillons) : repli sur le bin central {}",
            values.len(),
            (bins - 1) / 2
        );
    }
    Ok(values.iter().map(|v| edges.index_of(*v)).collect())
}

/// Quantize a numeric series onto a scale.
///
/// Each sample is binned (see [`BinEdges`]), the bin index selects a pitch
/// of the scale (reversed first when `invert` is set), and `offset` is
/// added last. The output has the same length and order as `series`.
///
/// # Errors
/// - `MapError::EmptySeries` for an empty series
/// - `MapError::UndefinedSample` for a NaN or infinite sample
/// - `MapError::NonPositiveLog` for a sample `≤ 0` under log binning
/// - `MapError::ScaleTooShort` / `MapError::DuplicatePitch` for a bad scale
/// - `MapError::PitchOverflow` when `offset` pushes a pitch past `i32`
///
/// # Example
/// ```
/// use hs_map::quantize::{QuantizeOptions, quantize};
/// let opts = QuantizeOptions { log_scale: true, ..QuantizeOptions::default() };
/// let pitches = quantize(&[1.0, 2.0, 4.0, 8.0, 16.0], &[0, 1, 2, 3, 4], &opts).unwrap();
/// assert_eq!(pitches, vec![0, 1, 2, 3, 4]);
/// ```
pub fn quantize(
    series: &[f64],
    scale: &[i32],
    options: &QuantizeOptions,
) -> Result<Vec<i32>, MapError> {
    check_scale(scale)?;
    let last = scale.len() - 1;
    let indices = bin_indices(series, scale.len(), options.log_scale, options.edge_layout)?;
    indices
        .into_iter()
        .enumerate()
        .map(|(index, i)| {
            let idx = if options.invert { last - i } else { i };
            scale[idx]
                .checked_add(options.offset)
                .ok_or(MapError::PitchOverflow {
                    index,
                    offset: options.offset,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(log_scale: bool) -> QuantizeOptions {
        QuantizeOptions {
            log_scale,
            ..QuantizeOptions::default()
        }
    }

    #[test]
    fn constant_series_maps_to_middle_entry() {
        let out = quantize(&[5.0, 5.0, 5.0], &[60, 64, 67], &opts(false)).unwrap();
        assert_eq!(out, vec![64, 64, 64]);
        let out = quantize(&[5.0, 5.0, 5.0], &[60, 64, 67], &opts(true)).unwrap();
        assert_eq!(out, vec![64, 64, 64]);
    }

    #[test]
    fn constant_series_with_two_entries_maps_to_first() {
        let out = quantize(&[3.0, 3.0], &[60, 72], &opts(false)).unwrap();
        assert_eq!(out, vec![60, 60]);
    }

    #[test]
    fn constant_series_with_even_scale_uses_lower_middle() {
        let out = quantize(&[1.0], &[10, 20, 30, 40], &opts(false)).unwrap();
        assert_eq!(out, vec![20]);
    }

    #[test]
    fn constant_series_respects_inversion_and_offset() {
        let o = QuantizeOptions {
            invert: true,
            offset: 1,
            ..opts(false)
        };
        let out = quantize(&[2.0, 2.0], &[10, 20, 30, 40], &o).unwrap();
        // inverted scale [40, 30, 20, 10], middle index 1 → 30, +1
        assert_eq!(out, vec![31, 31]);
    }

    #[test]
    fn log_example_pins_extremes() {
        let out = quantize(&[1.0, 2.0, 4.0, 8.0, 16.0], &[0, 1, 2, 3, 4], &opts(true)).unwrap();
        assert_eq!(out[0], 0);
        assert_eq!(out[4], 4);
        assert!(out.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn edge_values_fall_into_higher_bin() {
        let edges = BinEdges::new(0.0, 4.0, 4, EdgeLayout::Interior);
        assert_eq!(edges.edges(), &[1.0, 2.0, 3.0]);
        assert_eq!(edges.index_of(0.999), 0);
        assert_eq!(edges.index_of(1.0), 1);
        assert_eq!(edges.index_of(2.0), 2);
        assert_eq!(edges.index_of(3.0), 3);
        assert_eq!(edges.index_of(-5.0), 0);
        assert_eq!(edges.index_of(99.0), 3);
    }

    #[test]
    fn spanning_layout_matches_classic_digitization() {
        // edges = [0, 5, 10]: min sits on the first edge → bin 1, max → bin 3
        let edges = BinEdges::new(0.0, 10.0, 4, EdgeLayout::Spanning);
        assert_eq!(edges.edges(), &[0.0, 5.0, 10.0]);
        let o = QuantizeOptions {
            edge_layout: EdgeLayout::Spanning,
            ..opts(false)
        };
        let out = quantize(&[0.0, 4.9, 5.0, 10.0], &[60, 62, 64, 65], &o).unwrap();
        assert_eq!(out, vec![62, 62, 64, 65]);
    }

    #[test]
    fn spanning_layout_with_two_entries_has_single_edge() {
        let edges = BinEdges::new(1.0, 2.0, 2, EdgeLayout::Spanning);
        assert_eq!(edges.edges(), &[1.0]);
    }

    #[test]
    fn increasing_series_yields_non_decreasing_indices() {
        let series: Vec<f64> = (0..200).map(|i| f64::from(i) * 0.37 + 12.0).collect();
        let scale: Vec<i32> = (0..11).collect();
        let out = quantize(&series, &scale, &opts(false)).unwrap();
        assert!(out.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(out[0], 0);
        assert_eq!(out[199], 10);
    }

    #[test]
    fn outputs_are_members_of_the_scale() {
        let series = [310.0, 42.5, 1200.0, 87.0, 87.0, 5400.0, 13.2];
        let scale = [48, 50, 52, 55, 57, 60, 62, 64];
        for log_scale in [false, true] {
            let out = quantize(&series, &scale, &opts(log_scale)).unwrap();
            assert_eq!(out.len(), series.len());
            assert!(out.iter().all(|p| scale.contains(p)));
        }
    }

    #[test]
    fn inversion_equals_reversed_scale() {
        let series = [3.0, 9.0, 1.0, 27.0, 4.0, 11.0];
        let scale = [45, 48, 50, 52, 55];
        let reversed: Vec<i32> = scale.iter().rev().copied().collect();
        let inverted = quantize(
            &series,
            &scale,
            &QuantizeOptions {
                invert: true,
                ..opts(true)
            },
        )
        .unwrap();
        let plain = quantize(&series, &reversed, &opts(true)).unwrap();
        assert_eq!(inverted, plain);
    }

    #[test]
    fn offset_shifts_every_pitch() {
        let series = [3.0, 9.0, 1.0, 27.0];
        let scale = [60, 62, 64];
        let base = quantize(&series, &scale, &opts(false)).unwrap();
        let shifted = quantize(
            &series,
            &scale,
            &QuantizeOptions {
                offset: -7,
                ..opts(false)
            },
        )
        .unwrap();
        let expected: Vec<i32> = base.iter().map(|p| p - 7).collect();
        assert_eq!(shifted, expected);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let o = opts(false);
        assert_eq!(quantize(&[], &[1, 2], &o), Err(MapError::EmptySeries));
        assert_eq!(
            quantize(&[1.0, f64::NAN], &[1, 2], &o),
            Err(MapError::UndefinedSample { index: 1 })
        );
        assert_eq!(
            quantize(&[1.0], &[1], &o),
            Err(MapError::ScaleTooShort { len: 1 })
        );
        assert_eq!(
            quantize(&[1.0], &[1, 2, 1], &o),
            Err(MapError::DuplicatePitch { pitch: 1 })
        );
    }

    #[test]
    fn offset_overflow_is_an_error() {
        let o = QuantizeOptions {
            offset: i32::MAX,
            ..opts(false)
        };
        assert_eq!(
            quantize(&[1.0, 2.0], &[60, 61], &o),
            Err(MapError::PitchOverflow {
                index: 0,
                offset: i32::MAX
            })
        );
        let o = QuantizeOptions {
            offset: i32::MIN,
            ..opts(false)
        };
        assert_eq!(
            quantize(&[1.0, 2.0], &[-1, 0], &o),
            Err(MapError::PitchOverflow {
                index: 0,
                offset: i32::MIN
            })
        );
        assert_eq!(
            MapError::PitchOverflow { index: 0, offset: 1 }.kind(),
            crate::error::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn extreme_finite_range_keeps_extremes_pinned() {
        let out = quantize(&[-1e308, 0.0, 1e308], &[1, 2, 3], &opts(false)).unwrap();
        assert_eq!(out, vec![1, 2, 3]);

        let edges = BinEdges::new(-f64::MAX, f64::MAX, 64, EdgeLayout::Interior);
        assert!(edges.edges().iter().all(|e| e.is_finite()));
        assert!(edges.edges().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(edges.index_of(f64::MAX), 63);
        assert_eq!(edges.index_of(-f64::MAX), 0);

        let spanning = BinEdges::new(-f64::MAX, f64::MAX, 4, EdgeLayout::Spanning);
        assert_eq!(spanning.edges(), &[-f64::MAX, 0.0, f64::MAX]);
    }

    #[test]
    fn log_mode_rejects_non_positive_samples() {
        assert_eq!(
            quantize(&[4.0, 0.0, 2.0], &[1, 2, 3], &opts(true)),
            Err(MapError::NonPositiveLog {
                index: 1,
                value: 0.0
            })
        );
        assert!(quantize(&[4.0, 0.0, 2.0], &[1, 2, 3], &opts(false)).is_ok());
    }
}
