use std::fmt;

use super::ObjectGroup;

/// Summary statistics for the number of measurements per object group.
///
/// Fields
/// -----------------
/// * `min` – smallest number of measurements in any group.
/// * `p25` – 25th percentile (first quartile).
/// * `median` – 50th percentile.
/// * `p95` – 95th percentile, indicating the upper tail of the distribution.
/// * `max` – largest number of measurements in any group.
///
/// Percentiles use the *nearest-rank* method: the index is `round(q × (N-1))` for
/// `q ∈ [0,1]`, clamped to the valid range. Counts are integers so no interpolation is done.
///
/// Display
/// -----------------
/// * `format!("{}", stats)` – compact single-line summary:
///   ```text
///   min=2, p25=4, median=8, p95=15, max=20
///   ```
/// * `format!("{:#}", stats)` – multi-line table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementCountStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl MeasurementCountStats {
    /// Compute the statistics over a sequence of groups, `None` if there is no group.
    pub fn from_groups(groups: &[ObjectGroup]) -> Option<Self> {
        let mut counts: Vec<usize> = groups.iter().map(ObjectGroup::len).collect();
        if counts.is_empty() {
            return None;
        }
        counts.sort_unstable();

        #[inline]
        fn q_index(n: usize, q: f64) -> usize {
            let pos = q * (n as f64 - 1.0);
            let idx = pos.round() as isize;
            idx.clamp(0, (n as isize) - 1) as usize
        }

        let n = counts.len();
        Some(MeasurementCountStats {
            min: counts[0],
            p25: counts[q_index(n, 0.25)],
            median: counts[q_index(n, 0.50)],
            p95: counts[q_index(n, 0.95)],
            max: counts[n - 1],
        })
    }
}

impl fmt::Display for MeasurementCountStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Measurement count per object - summary")?;
            writeln!(f, "--------------------------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "min={}, p25={}, median={}, p95={}, max={}",
                self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

#[cfg(test)]
mod count_stats_test {
    use super::*;
    use crate::catalog::MeasurementRecord;

    fn group_of(object: u64, n: usize) -> ObjectGroup {
        ObjectGroup::from_records(
            object,
            (0..n).map(|i| MeasurementRecord::new(i as u64, i as u64, 0., 0., [20.0])),
        )
    }

    #[test]
    fn test_empty() {
        assert_eq!(MeasurementCountStats::from_groups(&[]), None);
    }

    #[test]
    fn test_nearest_rank() {
        let groups: Vec<_> = [5, 1, 3, 2, 4]
            .iter()
            .enumerate()
            .map(|(i, &n)| group_of(i as u64, n))
            .collect();
        let stats = MeasurementCountStats::from_groups(&groups).unwrap();
        assert_eq!(
            stats,
            MeasurementCountStats {
                min: 1,
                p25: 2,
                median: 3,
                p95: 5,
                max: 5
            }
        );
        assert_eq!(format!("{stats}"), "min=1, p25=2, median=3, p95=5, max=5");
        assert!(format!("{stats:#}").starts_with("Measurement count per object"));
    }
}
