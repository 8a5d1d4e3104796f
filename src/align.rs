//! Join alignment of peak lists across runs.
//!
//! Peak lists are merged one file at a time into a growing table of rows,
//! each row holding at most one peak per source file plus an anchor
//! coordinate, the plain mean m/z and retention time of its contributing
//! peaks. Candidate (row, peak) pairs inside both tolerance windows are
//! scored by their Euclidean distance in tolerance-normalized coordinates
//! and assigned greedily in ascending `(score, row index, peak index)`
//! order, which makes the assignment fully deterministic. Peaks that match
//! no row open new singleton rows.
use log::debug;

use mzpeaks::Tolerance;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::params::{check_all, ParameterError, Value, JOIN_ALIGNER};
use crate::peak::{ChromatographicPeak, PeakList};
use crate::task::{Algorithm, CancelToken, TaskError};

/// One aligned feature: at most one peak per source file, plus the mean
/// m/z and retention time of the peaks present.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignmentRow {
    mz: f64,
    retention_time: f64,
    slots: Vec<Option<ChromatographicPeak>>,
}

impl AlignmentRow {
    fn singleton(n_sources: usize, source_index: usize, peak: ChromatographicPeak) -> Self {
        let mut slots = vec![None; n_sources];
        slots[source_index] = Some(peak);
        Self {
            mz: peak.mz,
            retention_time: peak.retention_time,
            slots,
        }
    }

    fn assign(&mut self, source_index: usize, peak: ChromatographicPeak) {
        self.slots[source_index] = Some(peak);
    }

    /// Recompute the anchor as the plain mean over the contributing peaks
    fn update_anchor(&mut self) {
        let mut n = 0usize;
        let mut mz = 0.0;
        let mut rt = 0.0;
        for peak in self.slots.iter().flatten() {
            n += 1;
            mz += peak.mz;
            rt += peak.retention_time;
        }
        if n > 0 {
            self.mz = mz / n as f64;
            self.retention_time = rt / n as f64;
        }
    }

    /// The anchor m/z
    pub fn mz(&self) -> f64 {
        self.mz
    }

    /// The anchor retention time in seconds
    pub fn retention_time(&self) -> f64 {
        self.retention_time
    }

    /// One slot per source file, in [`AlignmentResult::sources`] order
    pub fn slots(&self) -> &[Option<ChromatographicPeak>] {
        &self.slots
    }

    /// The peak contributed by the source at `source_index`, if any
    pub fn peak_for(&self, source_index: usize) -> Option<&ChromatographicPeak> {
        self.slots.get(source_index)?.as_ref()
    }

    /// How many sources contributed a peak to this row
    pub fn occupancy(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

/// The rows produced by one alignment, ordered by ascending anchor
/// retention time and then m/z. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignmentResult {
    sources: Vec<String>,
    rows: Vec<AlignmentRow>,
}

impl AlignmentResult {
    /// The source file ids, in the order their peak lists were merged.
    /// Row slots are indexed identically.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn rows(&self) -> &[AlignmentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlignmentRow> {
        self.rows.iter()
    }
}

struct Candidate {
    score: f64,
    row: usize,
    peak: usize,
}

#[derive(Debug, Clone)]
pub struct JoinAligner {
    /// Maximum allowed m/z distance between a row anchor and a matched peak
    pub mz_tolerance: Tolerance,
    /// Maximum allowed retention time distance between a row anchor and a
    /// matched peak, in seconds
    pub rt_tolerance: f64,
}

impl Default for JoinAligner {
    fn default() -> Self {
        Self {
            mz_tolerance: Tolerance::Da(0.1),
            rt_tolerance: 15.0,
        }
    }
}

impl JoinAligner {
    pub fn new(mz_tolerance: Tolerance, rt_tolerance: f64) -> Self {
        Self {
            mz_tolerance,
            rt_tolerance,
        }
    }

    /// The m/z error normalized to the tolerance half-width at `reference`
    fn mz_error(&self, reference: f64, value: f64) -> f64 {
        let width = match self.mz_tolerance {
            Tolerance::Da(tol) => tol,
            Tolerance::PPM(tol) => reference.abs() * tol * 1e-6,
        };
        if width > 0.0 {
            (value - reference).abs() / width
        } else {
            0.0
        }
    }

    fn rt_error(&self, reference: f64, value: f64) -> f64 {
        if self.rt_tolerance > 0.0 {
            (value - reference).abs() / self.rt_tolerance
        } else {
            0.0
        }
    }

    /// Merge the peaks of one file into the row table
    fn merge(
        &self,
        rows: &mut Vec<AlignmentRow>,
        list: &PeakList,
        source_index: usize,
        n_sources: usize,
    ) {
        let mut candidates: Vec<Candidate> = Vec::new();
        for (row_index, row) in rows.iter().enumerate() {
            for (peak_index, peak) in list.iter().enumerate() {
                if (peak.retention_time - row.retention_time).abs() > self.rt_tolerance {
                    continue;
                }
                if !self.mz_tolerance.test(row.mz, peak.mz) {
                    continue;
                }
                let mz_error = self.mz_error(row.mz, peak.mz);
                let rt_error = self.rt_error(row.retention_time, peak.retention_time);
                candidates.push(Candidate {
                    score: (mz_error * mz_error + rt_error * rt_error).sqrt(),
                    row: row_index,
                    peak: peak_index,
                });
            }
        }
        candidates.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then(a.row.cmp(&b.row))
                .then(a.peak.cmp(&b.peak))
        });

        let mut row_taken = vec![false; rows.len()];
        let mut peak_taken = vec![false; list.len()];
        for candidate in candidates {
            if row_taken[candidate.row] || peak_taken[candidate.peak] {
                continue;
            }
            row_taken[candidate.row] = true;
            peak_taken[candidate.peak] = true;
            rows[candidate.row].assign(source_index, list.peaks()[candidate.peak]);
        }

        for (peak_index, peak) in list.iter().enumerate() {
            if !peak_taken[peak_index] {
                rows.push(AlignmentRow::singleton(n_sources, source_index, *peak));
            }
        }

        for row in rows.iter_mut() {
            row.update_anchor();
        }
    }

    pub fn align(
        &self,
        lists: &[PeakList],
        token: &CancelToken,
    ) -> Result<AlignmentResult, TaskError> {
        if lists.is_empty() {
            return Err(TaskError::Computation(
                "no peak lists to align".to_string(),
            ));
        }
        let n_sources = lists.len();
        let mut rows: Vec<AlignmentRow> = Vec::new();
        for (source_index, list) in lists.iter().enumerate() {
            token.checkpoint()?;
            self.merge(&mut rows, list, source_index, n_sources);
        }
        rows.sort_by(|a, b| {
            a.retention_time
                .total_cmp(&b.retention_time)
                .then(a.mz.total_cmp(&b.mz))
        });
        debug!("aligned {} peak lists into {} rows", n_sources, rows.len());
        Ok(AlignmentResult {
            sources: lists.iter().map(|l| l.source().to_string()).collect(),
            rows,
        })
    }
}

impl Algorithm for JoinAligner {
    type Input = Vec<PeakList>;
    type Output = AlignmentResult;

    fn name(&self) -> &'static str {
        "join aligner"
    }

    fn validate(&self) -> Result<(), ParameterError> {
        check_all(
            JOIN_ALIGNER,
            &[
                Value::Float(self.mz_tolerance.tol()),
                Value::Float(self.rt_tolerance),
            ],
        )
    }

    fn run(&self, input: &Self::Input, token: &CancelToken) -> Result<Self::Output, TaskError> {
        self.align(input, token)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn peak(mz: f64, rt: f64) -> ChromatographicPeak {
        ChromatographicPeak::new(mz, 500.0, rt, rt - 5.0, rt + 5.0, 2500.0, 0.3)
    }

    fn list(source: &str, peaks: &[(f64, f64)]) -> PeakList {
        PeakList::new(
            source,
            peaks.iter().map(|(mz, rt)| peak(*mz, *rt)).collect(),
        )
    }

    #[test_log::test]
    fn test_matching_is_order_insensitive() {
        let a = list("a", &[(300.0, 50.0), (400.0, 100.0)]);
        let b = list("b", &[(300.05, 55.0), (500.0, 200.0)]);
        let aligner = JoinAligner::default();
        let token = CancelToken::new();

        let forward = aligner.align(&[a.clone(), b.clone()], &token).unwrap();
        let backward = aligner.align(&[b, a], &token).unwrap();

        assert_eq!(forward.len(), 3);
        assert_eq!(backward.len(), 3);
        for result in [&forward, &backward] {
            let shared = result
                .iter()
                .find(|row| row.occupancy() == 2)
                .expect("expected one fully matched row");
            let mzs: Vec<f64> = shared.slots().iter().flatten().map(|p| p.mz).collect();
            assert!(mzs.contains(&300.0) && mzs.contains(&300.05));
        }
    }

    #[test]
    fn test_closed_tolerance_boundaries() {
        let aligner = JoinAligner::new(Tolerance::Da(0.25), 15.0);
        let token = CancelToken::new();

        // Exactly at both tolerances: still a match
        let a = list("a", &[(100.0, 50.0)]);
        let b = list("b", &[(100.25, 65.0)]);
        let result = aligner.align(&[a.clone(), b], &token).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].occupancy(), 2);

        // Just past the RT tolerance: two singleton rows
        let b = list("b", &[(100.0, 65.1)]);
        let result = aligner.align(&[a.clone(), b], &token).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|row| row.occupancy() == 1));

        // Just past the m/z tolerance: likewise unmatched
        let b = list("b", &[(100.2501, 50.0)]);
        let result = aligner.align(&[a, b], &token).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|row| row.occupancy() == 1));
    }

    #[test]
    fn test_tie_breaks_on_row_index() {
        // Both rows are equidistant from the incoming peak
        let a = list("a", &[(300.0, 40.0), (300.0, 60.0)]);
        let b = list("b", &[(300.0, 50.0)]);
        let result = JoinAligner::default()
            .align(&[a, b], &CancelToken::new())
            .unwrap();
        assert_eq!(result.len(), 2);
        let matched = result.iter().find(|row| row.occupancy() == 2).unwrap();
        // The earlier row (RT 40) wins the tie; its anchor is the mean
        assert_eq!(matched.peak_for(0).unwrap().retention_time, 40.0);
        assert_eq!(matched.retention_time(), 45.0);
    }

    #[test]
    fn test_anchor_is_mean_of_contributors() {
        let a = list("a", &[(300.0, 50.0)]);
        let b = list("b", &[(300.08, 58.0)]);
        let result = JoinAligner::default()
            .align(&[a, b], &CancelToken::new())
            .unwrap();
        let row = &result.rows()[0];
        assert!((row.mz() - 300.04).abs() < 1e-9);
        assert_eq!(row.retention_time(), 54.0);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = JoinAligner::default()
            .align(&[], &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TaskError::Computation(_)));
    }

    #[test]
    fn test_sources_follow_merge_order() {
        let a = list("a", &[(300.0, 50.0)]);
        let b = list("b", &[(700.0, 400.0)]);
        let result = JoinAligner::default()
            .align(&[a, b], &CancelToken::new())
            .unwrap();
        assert_eq!(result.sources(), &["a".to_string(), "b".to_string()]);
        assert_eq!(result.len(), 2);
        assert!(result.rows()[0].peak_for(0).is_some());
        assert!(result.rows()[0].peak_for(1).is_none());
        assert!(result.rows()[1].peak_for(1).is_some());
    }
}
