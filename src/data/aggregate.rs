//! Aggregates over a [`FilteredView`].
//!
//! Nothing here returns an error. An empty view or a degenerate column
//! produces a "no data" value (`None`, an empty map) and a logged
//! [`AggregateWarning`]. All accumulation runs in source row order so the
//! same view always produces bit-identical results.

use std::collections::BTreeMap;

use super::filter::FilteredView;
use super::model::{EnrichedRecord, FieldValue, GroupField, NumericField};
use crate::error::AggregateWarning;

fn warn_empty(aggregate: &'static str) {
    log::warn!("{}", AggregateWarning::EmptyAggregate { aggregate });
}

/// Sum of `count` in `u128`; cannot overflow for any realistic view.
fn count_sum<'a>(records: impl Iterator<Item = &'a EnrichedRecord>) -> u128 {
    records.map(|r| u128::from(r.raw.count)).sum()
}

// ---------------------------------------------------------------------------
// Scalar metrics
// ---------------------------------------------------------------------------

/// Sum of `count`; 0 for an empty view. Saturates at `u64::MAX`.
pub fn total_rentals(view: &FilteredView<'_>) -> u64 {
    let sum = count_sum(view.iter());
    u64::try_from(sum).unwrap_or_else(|_| {
        log::warn!(
            "{}",
            AggregateWarning::Overflow {
                aggregate: "total rentals"
            }
        );
        u64::MAX
    })
}

/// Mean of `count`, or `None` for an empty view.
pub fn average_rentals_per_hour(view: &FilteredView<'_>) -> Option<f64> {
    if view.is_empty() {
        warn_empty("average rentals per hour");
        return None;
    }
    Some(count_sum(view.iter()) as f64 / view.len() as f64)
}

/// Max of `count`, or `None` for an empty view.
pub fn max_rentals_per_hour(view: &FilteredView<'_>) -> Option<u64> {
    let max = view.iter().map(|r| r.raw.count).max();
    if max.is_none() {
        warn_empty("max rentals per hour");
    }
    max
}

/// The three headline metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub rows: usize,
    pub total_rentals: u64,
    pub average_rentals_per_hour: Option<f64>,
    pub max_rentals_per_hour: Option<u64>,
}

pub fn summarize(view: &FilteredView<'_>) -> Summary {
    Summary {
        rows: view.len(),
        total_rentals: total_rentals(view),
        average_rentals_per_hour: average_rentals_per_hour(view),
        max_rentals_per_hour: max_rentals_per_hour(view),
    }
}

// ---------------------------------------------------------------------------
// Group means
// ---------------------------------------------------------------------------

/// A group: the primary value plus the optional split value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub primary: FieldValue,
    pub secondary: Option<FieldValue>,
}

/// Mean `count` per group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMeans {
    pub by: GroupField,
    pub split: Option<GroupField>,
    pub means: BTreeMap<GroupKey, f64>,
}

impl GroupMeans {
    /// Mean for an unsplit group.
    pub fn get(&self, primary: FieldValue) -> Option<f64> {
        self.means
            .get(&GroupKey {
                primary,
                secondary: None,
            })
            .copied()
    }

    /// One series per split value, each ordered by primary value.
    pub fn series(&self) -> BTreeMap<Option<FieldValue>, Vec<(FieldValue, f64)>> {
        let mut out: BTreeMap<Option<FieldValue>, Vec<(FieldValue, f64)>> = BTreeMap::new();
        for (key, mean) in &self.means {
            out.entry(key.secondary)
                .or_default()
                .push((key.primary, *mean));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// Mean `count` grouped by `by`, optionally split by a second field.
pub fn group_mean(view: &FilteredView<'_>, by: GroupField, split: Option<GroupField>) -> GroupMeans {
    let mut acc: BTreeMap<GroupKey, (u128, u64)> = BTreeMap::new();
    for rec in view.iter() {
        let key = GroupKey {
            primary: by.value(rec),
            secondary: split.map(|f| f.value(rec)),
        };
        let (sum, n) = acc.entry(key).or_default();
        *sum += u128::from(rec.raw.count);
        *n += 1;
    }
    if acc.is_empty() {
        warn_empty("group mean");
    }

    let means = acc
        .into_iter()
        .map(|(key, (sum, n))| (key, sum as f64 / n as f64))
        .collect();
    GroupMeans { by, split, means }
}

// ---------------------------------------------------------------------------
// Distributions (box plot statistics)
// ---------------------------------------------------------------------------

/// Five-number summary with 1.5 × IQR whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub n: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest observation ≥ q1 − 1.5·IQR.
    pub lower_whisker: f64,
    /// Largest observation ≤ q3 + 1.5·IQR.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Linear-interpolated quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl BoxStats {
    /// `None` for empty input.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let q1 = quantile(&values, 0.25);
        let median = quantile(&values, 0.5);
        let q3 = quantile(&values, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = values.iter().filter(|v| (lo_fence..=hi_fence).contains(*v));
        let lower_whisker = inside.clone().next().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);
        let outliers = values
            .iter()
            .copied()
            .filter(|v| !(lo_fence..=hi_fence).contains(v))
            .collect();

        Some(BoxStats {
            n: values.len(),
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Distribution of `count` per value of `by`.
pub fn distribution(view: &FilteredView<'_>, by: GroupField) -> BTreeMap<FieldValue, BoxStats> {
    let mut groups: BTreeMap<FieldValue, Vec<f64>> = BTreeMap::new();
    for rec in view.iter() {
        groups.entry(by.value(rec)).or_default().push(rec.raw.count as f64);
    }
    if groups.is_empty() {
        warn_empty("distribution");
    }
    groups
        .into_iter()
        .filter_map(|(k, v)| Some((k, BoxStats::from_values(v)?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Symmetric matrix of pairwise Pearson coefficients.
///
/// A `None` cell means the coefficient is undefined: fewer than two
/// complete pairs, or a field with zero variance over those pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub fields: Vec<NumericField>,
    /// Rows in the view the matrix was computed over.
    pub rows: usize,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values[i][j]
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields whose own variance is zero (undefined diagonal).
    ///
    /// Empty for a matrix over no rows: nothing is undefined by variance there.
    pub fn zero_variance_fields(&self) -> Vec<&NumericField> {
        if self.rows == 0 {
            return Vec::new();
        }
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, _)| self.values[*i][*i].is_none())
            .map(|(_, f)| f)
            .collect()
    }
}

/// Pearson coefficient over the rows where both values are finite.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let constant = |pick: fn(&(f64, f64)) -> f64| pairs.iter().all(|p| pick(p) == pick(&pairs[0]));
    if constant(|p| p.0) || constant(|p| p.1) {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Pairwise correlation of `fields` over the view.
///
/// The upper triangle is computed and mirrored, so the matrix is exactly
/// symmetric. The diagonal is 1.0 unless the field has zero variance.
pub fn correlation(view: &FilteredView<'_>, fields: &[NumericField]) -> CorrelationMatrix {
    let k = fields.len();
    if view.is_empty() {
        warn_empty("correlation");
        return CorrelationMatrix {
            fields: fields.to_vec(),
            rows: 0,
            values: vec![vec![None; k]; k],
        };
    }

    let columns: Vec<Vec<Option<f64>>> = fields
        .iter()
        .map(|f| view.iter().map(|r| f.value(r)).collect())
        .collect();

    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        values[i][i] = pearson(&columns[i], &columns[i]).map(|_| 1.0);
        if values[i][i].is_none() {
            log::warn!(
                "{}",
                AggregateWarning::ZeroVariance {
                    field: fields[i].to_string()
                }
            );
        }
        for j in (i + 1)..k {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        fields: fields.to_vec(),
        rows: view.len(),
        values,
    }
}
