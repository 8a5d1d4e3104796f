//! Extracted ion chromatograms and the builder that slices a raw run into
//! them, binned by m/z.
//!
//! Bin lower edges are `mz_min + k * bin_size` over the run's global m/z
//! extent, a pure function of the bin width and the extent, so identical
//! inputs always produce identical bins. Every chromatogram carries exactly
//! one sample per scan of the run: a scan with no centroid in the bin
//! contributes a zero-intensity sample holding the bin center as its m/z.
//! No interpolation is performed.
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::gridspace;
use crate::params::{check_all, ParameterError, Value, CHROMATOGRAM_BUILDER};
use crate::scan::{RawRun, RawScan};
use crate::task::{Algorithm, CancelToken, TaskError};

/// An intensity-over-retention-time trace for one m/z bin, with the observed
/// m/z statistics of each sample alongside.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chromatogram {
    mz: f64,
    half_width: f64,
    time_array: Vec<f64>,
    intensity_array: Vec<f32>,
    mz_array: Vec<f64>,
    mz_low_array: Vec<f64>,
    mz_high_array: Vec<f64>,
}

impl Chromatogram {
    pub fn new(
        mz: f64,
        half_width: f64,
        time_array: Vec<f64>,
        intensity_array: Vec<f32>,
        mz_array: Vec<f64>,
        mz_low_array: Vec<f64>,
        mz_high_array: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(time_array.len(), intensity_array.len());
        debug_assert_eq!(time_array.len(), mz_array.len());
        debug_assert_eq!(time_array.len(), mz_low_array.len());
        debug_assert_eq!(time_array.len(), mz_high_array.len());
        Self {
            mz,
            half_width,
            time_array,
            intensity_array,
            mz_array,
            mz_low_array,
            mz_high_array,
        }
    }

    /// Build a trace whose every sample sits exactly on the bin center,
    /// useful for synthetic signals.
    pub fn from_time_intensity(
        mz: f64,
        half_width: f64,
        time_array: Vec<f64>,
        intensity_array: Vec<f32>,
    ) -> Self {
        let n = time_array.len();
        Self::new(
            mz,
            half_width,
            time_array,
            intensity_array,
            vec![mz; n],
            vec![mz; n],
            vec![mz; n],
        )
    }

    /// The bin center m/z
    pub fn mz(&self) -> f64 {
        self.mz
    }

    /// Half of the m/z bin width
    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn time_array(&self) -> &[f64] {
        &self.time_array
    }

    pub fn intensity_array(&self) -> &[f32] {
        &self.intensity_array
    }

    /// The intensity-weighted mean m/z of the centroids contributing to each
    /// sample, or the bin center for empty samples
    pub fn mz_array(&self) -> &[f64] {
        &self.mz_array
    }

    pub fn mz_low_array(&self) -> &[f64] {
        &self.mz_low_array
    }

    pub fn mz_high_array(&self) -> &[f64] {
        &self.mz_high_array
    }

    /// The number of samples, one per scan of the source run
    pub fn len(&self) -> usize {
        self.time_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_array.is_empty()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.time_array.first().copied()
    }

    pub fn end_time(&self) -> Option<f64> {
        self.time_array.last().copied()
    }

    /// The index and intensity of the most intense sample. The first sample
    /// wins on ties, keeping the result deterministic.
    pub fn apex(&self) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, intensity) in self.intensity_array.iter().copied().enumerate() {
            match best {
                Some((_, current)) if intensity <= current => {}
                _ => best = Some((i, intensity)),
            }
        }
        best
    }
}

/// The chromatograms extracted from one run, tagged with the run id. The
/// unit of work the filters and detectors operate on.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChromatogramSet {
    source: String,
    chromatograms: Vec<Chromatogram>,
}

impl ChromatogramSet {
    pub fn new(source: impl Into<String>, chromatograms: Vec<Chromatogram>) -> Self {
        Self {
            source: source.into(),
            chromatograms,
        }
    }

    /// The id of the run these chromatograms were extracted from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn chromatograms(&self) -> &[Chromatogram] {
        &self.chromatograms
    }

    pub fn len(&self) -> usize {
        self.chromatograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromatograms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chromatogram> {
        self.chromatograms.iter()
    }
}

/// Sparse accumulator for one m/z bin; sample arrays are allocated on the
/// first centroid that lands in the bin.
#[derive(Default)]
struct BinTrace {
    intensity: Vec<f32>,
    weighted_mz: Vec<f64>,
    low: Vec<f64>,
    high: Vec<f64>,
}

impl BinTrace {
    fn add(&mut self, scan_index: usize, n_scans: usize, mz: f64, intensity: f32) {
        if self.intensity.is_empty() {
            self.intensity = vec![0.0; n_scans];
            self.weighted_mz = vec![0.0; n_scans];
            self.low = vec![f64::INFINITY; n_scans];
            self.high = vec![f64::NEG_INFINITY; n_scans];
        }
        self.intensity[scan_index] += intensity;
        self.weighted_mz[scan_index] += mz * intensity as f64;
        self.low[scan_index] = self.low[scan_index].min(mz);
        self.high[scan_index] = self.high[scan_index].max(mz);
    }

    fn is_occupied(&self) -> bool {
        !self.intensity.is_empty()
    }

    fn into_chromatogram(self, center: f64, half_width: f64, time_axis: &[f64]) -> Chromatogram {
        let n = time_axis.len();
        let mut mz_array = Vec::with_capacity(n);
        let mut mz_low_array = Vec::with_capacity(n);
        let mut mz_high_array = Vec::with_capacity(n);
        for i in 0..n {
            if self.intensity[i] > 0.0 {
                mz_array.push(self.weighted_mz[i] / self.intensity[i] as f64);
                mz_low_array.push(self.low[i]);
                mz_high_array.push(self.high[i]);
            } else {
                mz_array.push(center);
                mz_low_array.push(center);
                mz_high_array.push(center);
            }
        }
        Chromatogram::new(
            center,
            half_width,
            time_axis.to_vec(),
            self.intensity,
            mz_array,
            mz_low_array,
            mz_high_array,
        )
    }
}

/// Partitions the centroids of every scan at one MS level into m/z bins of
/// width `bin_size` and assembles one [`Chromatogram`] per non-empty bin.
#[derive(Debug, Clone)]
pub struct ChromatogramBuilder {
    /// Width of the m/z range covered by each chromatogram, in Da
    pub bin_size: f64,
    /// MS level of the scans to extract from
    pub ms_level: u8,
}

impl Default for ChromatogramBuilder {
    fn default() -> Self {
        Self {
            bin_size: 0.25,
            ms_level: 1,
        }
    }
}

impl ChromatogramBuilder {
    pub fn new(bin_size: f64) -> Self {
        Self {
            bin_size,
            ..Default::default()
        }
    }

    pub fn build(&self, run: &RawRun, token: &CancelToken) -> Result<ChromatogramSet, TaskError> {
        let (mz_min, mz_max) = run.mz_extent(self.ms_level).ok_or_else(|| {
            TaskError::Computation(format!(
                "no MS level {} centroids in \"{}\"",
                self.ms_level,
                run.id()
            ))
        })?;

        let edges = gridspace(mz_min, mz_max, self.bin_size);
        let n_bins = edges.len();

        let scans: Vec<&RawScan> = run.scans_of_level(self.ms_level).collect();
        let n_scans = scans.len();
        let time_axis: Vec<f64> = scans.iter().map(|s| s.retention_time()).collect();

        let mut bins: Vec<BinTrace> = Vec::new();
        bins.resize_with(n_bins, BinTrace::default);

        for (scan_index, scan) in scans.iter().enumerate() {
            token.checkpoint()?;
            for (mz, intensity) in scan.iter() {
                let k = (((mz - mz_min) / self.bin_size) as usize).min(n_bins - 1);
                bins[k].add(scan_index, n_scans, mz, intensity);
            }
        }

        let half_width = self.bin_size / 2.0;
        let chromatograms: Vec<Chromatogram> = bins
            .into_iter()
            .zip(edges.iter())
            .filter(|(bin, _)| bin.is_occupied())
            .map(|(bin, edge)| bin.into_chromatogram(edge + half_width, half_width, &time_axis))
            .collect();

        debug!(
            "extracted {} chromatograms from {} scans of \"{}\"",
            chromatograms.len(),
            n_scans,
            run.id()
        );
        Ok(ChromatogramSet::new(run.id(), chromatograms))
    }
}

impl Algorithm for ChromatogramBuilder {
    type Input = RawRun;
    type Output = ChromatogramSet;

    fn name(&self) -> &'static str {
        "chromatogram builder"
    }

    fn validate(&self) -> Result<(), ParameterError> {
        check_all(CHROMATOGRAM_BUILDER, &[Value::Float(self.bin_size)])
    }

    fn run(&self, input: &Self::Input, token: &CancelToken) -> Result<Self::Output, TaskError> {
        self.build(input, token)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scan::RawScan;

    fn three_scan_run() -> RawRun {
        let scans = vec![
            RawScan::new(1, 0.0, vec![100.05, 100.5, 300.0], vec![10.0, 20.0, 5.0]).unwrap(),
            RawScan::new(1, 1.0, vec![100.1, 300.1], vec![40.0, 6.0]).unwrap(),
            RawScan::new(1, 2.0, vec![100.5], vec![30.0]).unwrap(),
        ];
        RawRun::new("run-a", scans).unwrap()
    }

    #[test]
    fn test_one_sample_per_scan() {
        let run = three_scan_run();
        let builder = ChromatogramBuilder::new(0.25);
        let set = builder.build(&run, &CancelToken::new()).unwrap();
        assert!(!set.is_empty());
        for chromatogram in set.iter() {
            assert_eq!(chromatogram.len(), run.len());
            assert_eq!(chromatogram.time_array(), &[0.0, 1.0, 2.0]);
        }
    }

    #[test]
    fn test_zero_fill_policy() {
        let run = three_scan_run();
        let builder = ChromatogramBuilder::new(0.25);
        let set = builder.build(&run, &CancelToken::new()).unwrap();

        // The 100.5 bin is hit in the first and last scan only
        let trace = set
            .iter()
            .find(|c| c.intensity_array()[2] == 30.0)
            .expect("expected the 100.5 Da trace");
        assert_eq!(trace.intensity_array()[1], 0.0);
        assert_eq!(trace.mz_array()[1], trace.mz());
    }

    #[test]
    fn test_bins_are_deterministic() {
        let run = three_scan_run();
        let builder = ChromatogramBuilder::new(0.25);
        let first = builder.build(&run, &CancelToken::new()).unwrap();
        let second = builder.build(&run, &CancelToken::new()).unwrap();
        assert_eq!(first, second);
        let centers: Vec<f64> = first.iter().map(|c| c.mz()).collect();
        for pair in centers.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_weighted_mz_within_bin() {
        let scans = vec![
            RawScan::new(1, 0.0, vec![100.0, 100.2], vec![10.0, 30.0]).unwrap(),
        ];
        let run = RawRun::new("run-b", scans).unwrap();
        let set = ChromatogramBuilder::new(0.25)
            .build(&run, &CancelToken::new())
            .unwrap();
        assert_eq!(set.len(), 1);
        let trace = &set.chromatograms()[0];
        assert_eq!(trace.intensity_array()[0], 40.0);
        assert!((trace.mz_array()[0] - 100.15).abs() < 1e-9);
        assert_eq!(trace.mz_low_array()[0], 100.0);
        assert_eq!(trace.mz_high_array()[0], 100.2);
    }

    #[test]
    fn test_cancellation() {
        let run = three_scan_run();
        let token = CancelToken::new();
        token.cancel();
        let err = ChromatogramBuilder::new(0.25).build(&run, &token).unwrap_err();
        assert_eq!(err, TaskError::Canceled);
    }

    #[test]
    fn test_missing_level_is_an_error() {
        let run = three_scan_run();
        let builder = ChromatogramBuilder {
            ms_level: 2,
            ..Default::default()
        };
        assert!(matches!(
            builder.build(&run, &CancelToken::new()),
            Err(TaskError::Computation(_))
        ));
    }
}
