//! Weighted object selection over a bell-shaped distribution
//!
//! Objects are assigned disjoint sub-ranges of the uniform draw space `[0, 1]`
//! whose widths equal their normalized weights, so classifying uniform draws
//! reproduces the configured relative frequencies. Each range is also mapped
//! through the inverse of a precomputed bell-curve CDF, which lets a
//! bell-distributed input (noise intensity, distance) pick objects at the
//! same relative frequencies.

use thiserror::Error;

/// Number of intervals in the precomputed CDF table
pub const TABLE_RESOLUTION: usize = 10_000;

/// Center of the bell curve
const BELL_MEAN: f64 = 0.5;

/// Spread of the bell curve
const BELL_SIGMA: f64 = 0.15;

/// Errors raised when a weight list cannot be normalized
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplerError {
    #[error("weight list is empty")]
    Empty,

    #[error("weight at index {index} is invalid: {weight}")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("total weight is zero")]
    ZeroTotal,
}

/// Monotonic cumulative distribution of a Gaussian bell centered at 0.5,
/// truncated and renormalized to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct BellCurveTable {
    cdf: Vec<f64>,
}

impl Default for BellCurveTable {
    fn default() -> Self {
        Self::new(TABLE_RESOLUTION)
    }
}

impl BellCurveTable {
    /// Build the table with `resolution` trapezoid intervals
    pub fn new(resolution: usize) -> Self {
        let n = resolution.max(2);
        let density = |x: f64| {
            let d = (x - BELL_MEAN) / BELL_SIGMA;
            (-0.5 * d * d).exp()
        };

        let step = 1.0 / n as f64;
        let mut cdf = Vec::with_capacity(n + 1);
        cdf.push(0.0);
        let mut total = 0.0;
        let mut prev = density(0.0);
        for k in 1..=n {
            let cur = density(k as f64 * step);
            total += (prev + cur) * 0.5 * step;
            cdf.push(total);
            prev = cur;
        }
        for v in cdf.iter_mut() {
            *v /= total;
        }
        // Normalization leaves the last entry within an ulp of 1
        cdf[n] = 1.0;

        Self { cdf }
    }

    fn resolution(&self) -> usize {
        self.cdf.len() - 1
    }

    /// Cumulative probability of `x` (clamped to `[0, 1]`)
    pub fn cdf(&self, x: f64) -> f64 {
        let n = self.resolution();
        let pos = x.clamp(0.0, 1.0) * n as f64;
        let k = (pos.floor() as usize).min(n - 1);
        let frac = pos - k as f64;
        self.cdf[k] + (self.cdf[k + 1] - self.cdf[k]) * frac
    }

    /// Value whose cumulative probability is `p` (clamped to `[0, 1]`)
    pub fn inverse(&self, p: f64) -> f64 {
        let n = self.resolution();
        let p = p.clamp(0.0, 1.0);
        // First table index whose cdf >= p
        let hi = self.cdf.partition_point(|&c| c < p).clamp(1, n);
        let lo = hi - 1;
        let span = self.cdf[hi] - self.cdf[lo];
        let frac = if span > 0.0 { (p - self.cdf[lo]) / span } else { 0.0 };
        (lo as f64 + frac) / n as f64
    }
}

/// One item's slice of the draw space, and the matching slice of value space
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRange<T> {
    pub item: T,
    /// Start of the range in uniform draw space
    pub start: f64,
    /// End of the range in uniform draw space (exclusive, except for the last range)
    pub end: f64,
    /// `start` mapped through the inverse bell CDF
    pub value_start: f64,
    /// `end` mapped through the inverse bell CDF
    pub value_end: f64,
}

impl<T> WeightedRange<T> {
    /// Width of the range in draw space, equal to the item's normalized weight
    pub fn measure(&self) -> f64 {
        self.end - self.start
    }
}

/// Partition `[0, 1]` among weighted items.
///
/// Ranges are contiguous, in input order, and cover `[0, 1]` exactly. Items with
/// zero weight get an empty range and are never selected.
pub fn map_weights<T: Clone>(
    table: &BellCurveTable,
    weights: &[(T, f64)],
) -> Result<Vec<WeightedRange<T>>, SamplerError> {
    if weights.is_empty() {
        return Err(SamplerError::Empty);
    }
    for (index, &(_, weight)) in weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(SamplerError::InvalidWeight { index, weight });
        }
    }
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(SamplerError::ZeroTotal);
    }

    let last = weights.len() - 1;
    let mut ranges = Vec::with_capacity(weights.len());
    let mut start = 0.0;
    for (i, (item, weight)) in weights.iter().enumerate() {
        let end = if i == last { 1.0 } else { (start + weight / total).min(1.0) };
        ranges.push(WeightedRange {
            item: item.clone(),
            start,
            end,
            value_start: table.inverse(start),
            value_end: table.inverse(end),
        });
        start = end;
    }
    Ok(ranges)
}

/// Pick the item whose draw-space range contains the uniform draw `u`
pub fn classify<T>(ranges: &[WeightedRange<T>], u: f64) -> Option<&T> {
    let u = u.clamp(0.0, 1.0);
    ranges
        .iter()
        .find(|r| r.start < r.end && u >= r.start && u < r.end)
        // u == 1.0 belongs to the last non-empty range
        .or_else(|| ranges.iter().rev().find(|r| r.start < r.end && u >= r.start))
        .map(|r| &r.item)
}

/// Pick the item for a bell-distributed value `v` in `[0, 1]`
pub fn classify_value<'a, T>(
    table: &BellCurveTable,
    ranges: &'a [WeightedRange<T>],
    v: f64,
) -> Option<&'a T> {
    classify(ranges, table.cdf(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simple hash-based RNG for deterministic draws
    struct SimpleHash(u64);

    impl SimpleHash {
        fn float(&mut self) -> f64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    fn counts(ranges: &[WeightedRange<&'static str>], draws: impl Iterator<Item = Option<&'static str>>) -> [usize; 3] {
        let mut out = [0; 3];
        for item in draws.flatten() {
            let idx = ranges.iter().position(|r| r.item == item).unwrap();
            out[idx] += 1;
        }
        out
    }

    #[test]
    fn test_table_is_monotonic_and_symmetric() {
        let table = BellCurveTable::default();
        assert_eq!(table.cdf(0.0), 0.0);
        assert_eq!(table.cdf(1.0), 1.0);
        assert!((table.cdf(0.5) - 0.5).abs() < 1e-9);

        let mut prev = 0.0;
        for i in 0..=100 {
            let c = table.cdf(i as f64 / 100.0);
            assert!(c >= prev);
            prev = c;
        }
        // Peaked: the middle fifth holds far more than a fifth of the mass
        assert!(table.cdf(0.6) - table.cdf(0.4) > 0.45);
    }

    #[test]
    fn test_inverse_undoes_cdf() {
        let table = BellCurveTable::default();
        for i in 1..20 {
            let x = i as f64 / 20.0;
            assert!((table.inverse(table.cdf(x)) - x).abs() < 1e-6);
        }
        assert_eq!(table.inverse(0.0), 0.0);
        assert_eq!(table.inverse(1.0), 1.0);
    }

    #[test]
    fn test_ranges_partition_unit_interval() {
        let table = BellCurveTable::default();
        let ranges = map_weights(&table, &[("a", 1.0), ("b", 1.0), ("c", 2.0)]).unwrap();

        assert_eq!(ranges[0].start, 0.0);
        assert_eq!(ranges[2].end, 1.0);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!((ranges[0].measure() - 0.25).abs() < 1e-12);
        assert!((ranges[1].measure() - 0.25).abs() < 1e-12);
        assert!((ranges[2].measure() - 0.5).abs() < 1e-12);
        assert!(ranges[0].value_end < ranges[1].value_end);
    }

    #[test]
    fn test_uniform_draws_follow_weights() {
        let table = BellCurveTable::default();
        let ranges = map_weights(&table, &[("a", 1.0), ("b", 1.0), ("c", 2.0)]).unwrap();
        let mut rng = SimpleHash(0x5EED);

        let n = 100_000;
        let c = counts(&ranges, (0..n).map(|_| classify(&ranges, rng.float()).copied()));
        assert_eq!(c.iter().sum::<usize>(), n);

        let (fa, fb, fc) = (c[0] as f64 / n as f64, c[1] as f64 / n as f64, c[2] as f64 / n as f64);
        assert!((fa - 0.25).abs() < 0.01, "a: {}", fa);
        assert!((fb - 0.25).abs() < 0.01, "b: {}", fb);
        assert!((fc - 0.5).abs() < 0.01, "c: {}", fc);
    }

    #[test]
    fn test_bell_values_follow_weights() {
        let table = BellCurveTable::default();
        let ranges = map_weights(&table, &[("a", 1.0), ("b", 1.0), ("c", 2.0)]).unwrap();
        let mut rng = SimpleHash(99);

        // Values drawn from the bell distribution itself
        let n = 50_000;
        let c = counts(
            &ranges,
            (0..n).map(|_| classify_value(&table, &ranges, table.inverse(rng.float())).copied()),
        );
        let fc = c[2] as f64 / n as f64;
        assert!((fc - 0.5).abs() < 0.015, "c: {}", fc);
    }

    #[test]
    fn test_zero_weight_item_never_selected() {
        let table = BellCurveTable::default();
        let ranges = map_weights(&table, &[("a", 0.0), ("b", 3.0)]).unwrap();
        assert_eq!(classify(&ranges, 0.0), Some(&"b"));
        assert_eq!(classify(&ranges, 1.0), Some(&"b"));
    }

    #[test]
    fn test_rejects_bad_weights() {
        let table = BellCurveTable::default();
        assert_eq!(map_weights::<u8>(&table, &[]), Err(SamplerError::Empty));
        assert_eq!(map_weights(&table, &[(1, 0.0), (2, 0.0)]), Err(SamplerError::ZeroTotal));
        assert_eq!(
            map_weights(&table, &[(1, 1.0), (2, -1.0)]),
            Err(SamplerError::InvalidWeight { index: 1, weight: -1.0 })
        );
        assert!(map_weights(&table, &[(1, f64::NAN)]).is_err());
    }

    #[test]
    fn test_deterministic() {
        let weights = [("x", 0.3), ("y", 0.7)];
        let a = map_weights(&BellCurveTable::default(), &weights).unwrap();
        let b = map_weights(&BellCurveTable::default(), &weights).unwrap();
        assert_eq!(a, b);
    }
}
