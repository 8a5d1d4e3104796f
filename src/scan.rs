//! Read-only models of centroided raw LC-MS data.
//!
//! A [`RawRun`] is an ordered sequence of [`RawScan`]s, each holding parallel
//! m/z and intensity arrays for one acquisition. Both types are validated on
//! construction and never mutated afterwards; every downstream algorithm
//! produces new, derived values instead of editing a run in place.
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All the ways raw data construction can fail
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("The m/z and intensity arrays do not match in length ({0} vs {1})")]
    ArrayLengthMismatch(usize, usize),
    #[error("The m/z array is not sorted in ascending order")]
    MZNotSorted,
    #[error("MS level must be 1 or greater")]
    InvalidMSLevel,
    #[error("Scans are not ordered by retention time")]
    TimeNotSorted,
}

/// One centroided scan: an MS level, a retention time in seconds, and
/// parallel m/z and intensity arrays sorted by m/z.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawScan {
    ms_level: u8,
    retention_time: f64,
    mz_array: Vec<f64>,
    intensity_array: Vec<f32>,
}

impl RawScan {
    pub fn new(
        ms_level: u8,
        retention_time: f64,
        mz_array: Vec<f64>,
        intensity_array: Vec<f32>,
    ) -> Result<Self, ScanError> {
        if ms_level < 1 {
            return Err(ScanError::InvalidMSLevel);
        }
        if mz_array.len() != intensity_array.len() {
            return Err(ScanError::ArrayLengthMismatch(
                mz_array.len(),
                intensity_array.len(),
            ));
        }
        if !mz_array.windows(2).all(|w| w[0] <= w[1]) {
            return Err(ScanError::MZNotSorted);
        }
        Ok(Self {
            ms_level,
            retention_time,
            mz_array,
            intensity_array,
        })
    }

    pub fn ms_level(&self) -> u8 {
        self.ms_level
    }

    pub fn retention_time(&self) -> f64 {
        self.retention_time
    }

    pub fn mz_array(&self) -> &[f64] {
        &self.mz_array
    }

    pub fn intensity_array(&self) -> &[f32] {
        &self.intensity_array
    }

    /// The number of centroids in this scan
    pub fn len(&self) -> usize {
        self.mz_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz_array.is_empty()
    }

    /// Iterate over (m/z, intensity) pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.mz_array
            .iter()
            .copied()
            .zip(self.intensity_array.iter().copied())
    }

    /// Copy out the centroids in the half-open index range `[start, end)`,
    /// preserving the scan's level and retention time. Sortedness of the
    /// parent guarantees sortedness of the slice.
    pub(crate) fn sliced(&self, start: usize, end: usize) -> Self {
        Self {
            ms_level: self.ms_level,
            retention_time: self.retention_time,
            mz_array: self.mz_array[start..end].to_vec(),
            intensity_array: self.intensity_array[start..end].to_vec(),
        }
    }
}

/// A named, retention-time-ordered sequence of scans: the read-only view of
/// one raw data file that the extraction algorithms consume.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawRun {
    id: String,
    scans: Vec<RawScan>,
}

impl RawRun {
    pub fn new(id: impl Into<String>, scans: Vec<RawScan>) -> Result<Self, ScanError> {
        if !scans
            .windows(2)
            .all(|w| w[0].retention_time <= w[1].retention_time)
        {
            return Err(ScanError::TimeNotSorted);
        }
        Ok(Self {
            id: id.into(),
            scans,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scans(&self) -> &[RawScan] {
        &self.scans
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawScan> {
        self.scans.iter()
    }

    /// Iterate over only the scans acquired at `ms_level`
    pub fn scans_of_level(&self, ms_level: u8) -> impl Iterator<Item = &RawScan> {
        self.scans.iter().filter(move |s| s.ms_level == ms_level)
    }

    /// The smallest and largest m/z observed across all scans at `ms_level`,
    /// or `None` when no centroid exists at that level.
    pub fn mz_extent(&self, ms_level: u8) -> Option<(f64, f64)> {
        let mut extent: Option<(f64, f64)> = None;
        for scan in self.scans_of_level(ms_level) {
            if let (Some(first), Some(last)) = (scan.mz_array.first(), scan.mz_array.last()) {
                extent = match extent {
                    Some((lo, hi)) => Some((lo.min(*first), hi.max(*last))),
                    None => Some((*first, *last)),
                };
            }
        }
        extent
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scan_validation() {
        assert!(RawScan::new(1, 0.0, vec![100.0, 200.0], vec![1.0, 2.0]).is_ok());
        assert_eq!(
            RawScan::new(1, 0.0, vec![100.0], vec![1.0, 2.0]),
            Err(ScanError::ArrayLengthMismatch(1, 2))
        );
        assert_eq!(
            RawScan::new(1, 0.0, vec![200.0, 100.0], vec![1.0, 2.0]),
            Err(ScanError::MZNotSorted)
        );
        assert_eq!(
            RawScan::new(0, 0.0, vec![], vec![]),
            Err(ScanError::InvalidMSLevel)
        );
    }

    #[test]
    fn test_run_validation() {
        let s1 = RawScan::new(1, 10.0, vec![], vec![]).unwrap();
        let s2 = RawScan::new(1, 5.0, vec![], vec![]).unwrap();
        assert_eq!(
            RawRun::new("run", vec![s1, s2]).unwrap_err(),
            ScanError::TimeNotSorted
        );
    }

    #[test]
    fn test_mz_extent() {
        let s1 = RawScan::new(1, 0.0, vec![100.0, 450.0], vec![1.0, 2.0]).unwrap();
        let s2 = RawScan::new(2, 1.0, vec![50.0, 900.0], vec![1.0, 2.0]).unwrap();
        let s3 = RawScan::new(1, 2.0, vec![120.0, 500.0], vec![1.0, 2.0]).unwrap();
        let run = RawRun::new("run", vec![s1, s2, s3]).unwrap();
        assert_eq!(run.mz_extent(1), Some((100.0, 500.0)));
        assert_eq!(run.mz_extent(2), Some((50.0, 900.0)));
        assert_eq!(run.mz_extent(3), None);
    }

    #[test]
    fn test_scan_slicing() {
        let scan = RawScan::new(1, 3.5, vec![100.0, 150.0, 200.0], vec![1.0, 2.0, 3.0]).unwrap();
        let inner = scan.sliced(1, 3);
        assert_eq!(inner.mz_array(), &[150.0, 200.0]);
        assert_eq!(inner.retention_time(), 3.5);
    }
}
