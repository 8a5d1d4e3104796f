//! Chromatographic median smoothing.
//!
//! Replaces each intensity sample with the median of the samples inside a
//! retention time window of configured width centered on it. The window is
//! truncated at the ends of the RT range rather than padded, so the output
//! always has exactly as many samples as the input. The per-sample m/z
//! statistics are carried over unchanged.
use log::debug;

use crate::chromatogram::{Chromatogram, ChromatogramSet};
use crate::params::{check_all, ParameterError, Value, MEDIAN_SMOOTHER};
use crate::search::indices_between;
use crate::task::{Algorithm, CancelToken, TaskError};

/// The median of `values`, taking the mean of the two middle values on an
/// even count. Returns 0.0 for an empty slice.
fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct MedianSmoother {
    /// Width of the sliding retention time window in seconds
    pub window_width: f64,
}

impl Default for MedianSmoother {
    fn default() -> Self {
        Self { window_width: 10.0 }
    }
}

impl MedianSmoother {
    pub fn new(window_width: f64) -> Self {
        Self { window_width }
    }

    /// Produce a smoothed copy of one chromatogram
    pub fn smooth(&self, chromatogram: &Chromatogram) -> Chromatogram {
        let time = chromatogram.time_array();
        let intensity = chromatogram.intensity_array();
        let half = self.window_width / 2.0;

        let mut smoothed = Vec::with_capacity(intensity.len());
        let mut window: Vec<f32> = Vec::new();
        for (i, center) in time.iter().enumerate() {
            let (start, end) = indices_between(time, center - half, center + half);
            debug_assert!(start <= i && i < end);
            window.clear();
            window.extend_from_slice(&intensity[start..end]);
            smoothed.push(median(&mut window));
        }

        Chromatogram::new(
            chromatogram.mz(),
            chromatogram.half_width(),
            time.to_vec(),
            smoothed,
            chromatogram.mz_array().to_vec(),
            chromatogram.mz_low_array().to_vec(),
            chromatogram.mz_high_array().to_vec(),
        )
    }

    pub fn smooth_all(
        &self,
        set: &ChromatogramSet,
        token: &CancelToken,
    ) -> Result<ChromatogramSet, TaskError> {
        let mut smoothed = Vec::with_capacity(set.len());
        for chromatogram in set.iter() {
            token.checkpoint()?;
            smoothed.push(self.smooth(chromatogram));
        }
        debug!(
            "median-smoothed {} chromatograms of \"{}\" over a {}s window",
            smoothed.len(),
            set.source(),
            self.window_width
        );
        Ok(ChromatogramSet::new(set.source(), smoothed))
    }
}

impl Algorithm for MedianSmoother {
    type Input = ChromatogramSet;
    type Output = ChromatogramSet;

    fn name(&self) -> &'static str {
        "chromatographic median filter"
    }

    fn validate(&self) -> Result<(), ParameterError> {
        check_all(MEDIAN_SMOOTHER, &[Value::Float(self.window_width)])
    }

    fn run(&self, input: &Self::Input, token: &CancelToken) -> Result<Self::Output, TaskError> {
        self.smooth_all(input, token)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn trace(intensity: Vec<f32>) -> Chromatogram {
        let time: Vec<f64> = (0..intensity.len()).map(|i| i as f64).collect();
        Chromatogram::from_time_intensity(300.0, 0.125, time, intensity)
    }

    #[rstest::rstest]
    #[case(vec![3.0, 1.0, 2.0], 2.0)]
    #[case(vec![4.0, 1.0, 2.0, 3.0], 2.5)]
    #[case(vec![7.0], 7.0)]
    #[case(vec![], 0.0)]
    fn test_median(#[case] mut values: Vec<f32>, #[case] expected: f32) {
        assert_eq!(median(&mut values), expected);
    }

    #[test]
    fn test_constant_trace_unchanged() {
        let chromatogram = trace(vec![42.0; 9]);
        let smoothed = MedianSmoother::default().smooth(&chromatogram);
        assert_eq!(smoothed.intensity_array(), chromatogram.intensity_array());
    }

    #[test]
    fn test_spike_suppressed() {
        let mut intensity = vec![10.0f32; 11];
        intensity[5] = 1000.0;
        let smoothed = MedianSmoother::default().smooth(&trace(intensity));
        assert_eq!(smoothed.intensity_array()[5], 10.0);
    }

    #[test]
    fn test_sample_count_preserved() {
        let chromatogram = trace(vec![1.0, 5.0, 2.0, 8.0, 3.0]);
        let smoothed = MedianSmoother::new(2.0).smooth(&chromatogram);
        assert_eq!(smoothed.len(), chromatogram.len());
        assert_eq!(smoothed.time_array(), chromatogram.time_array());
        assert_eq!(smoothed.mz_array(), chromatogram.mz_array());
    }

    #[test]
    fn test_cancellation() {
        let set = ChromatogramSet::new("run", vec![trace(vec![1.0; 5])]);
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            MedianSmoother::default().smooth_all(&set, &token).unwrap_err(),
            TaskError::Canceled
        );
    }
}
