//! Recursive-threshold chromatographic peak detection.
//!
//! Instead of seeding on every local maximum, the detector bisects each
//! chromatogram around its strongest candidates: locate the range maximum,
//! expand a candidate around it, then recurse into the sub-ranges strictly
//! left and right of the candidate. Recursion proceeds whether or not the
//! candidate survives the acceptance filters, so every step shrinks the
//! remaining range.
use log::{debug, trace};

use crate::chromatogram::{Chromatogram, ChromatogramSet};
use crate::params::{check_all, check_range, ParameterError, Value, RECURSIVE_THRESHOLD_PICKER};
use crate::peak::{ChromatographicPeak, PeakList};
use crate::peak_picker::{build_peak, expand_boundaries};
use crate::task::{Algorithm, CancelToken, TaskError};

#[derive(Debug, Clone)]
pub struct RecursiveThresholdPicker {
    /// Fraction of the chromatogram's global apex below which samples are
    /// treated as the relative noise floor, in `[0, 1]`
    pub chromatographic_threshold_level: f32,
    /// Intensities at or below this value are interpreted as noise
    pub noise_level: f32,
    /// Minimum acceptable apex intensity
    pub minimum_peak_height: f32,
    /// Minimum acceptable peak duration in seconds
    pub minimum_peak_duration: f64,
    /// Maximum allowed fractional upward deviation while expanding a
    /// candidate boundary
    pub intensity_tolerance: f32,
    /// Minimum acceptable width of the underlying m/z trace in Da
    pub minimum_mz_peak_width: f64,
    /// Maximum acceptable width of the underlying m/z trace in Da
    pub maximum_mz_peak_width: f64,
}

impl Default for RecursiveThresholdPicker {
    fn default() -> Self {
        Self {
            chromatographic_threshold_level: 0.0,
            noise_level: 10.0,
            minimum_peak_height: 100.0,
            minimum_peak_duration: 4.0,
            intensity_tolerance: 0.15,
            minimum_mz_peak_width: 0.2,
            maximum_mz_peak_width: 1.0,
        }
    }
}

impl RecursiveThresholdPicker {
    fn accepts(&self, peak: &ChromatographicPeak) -> bool {
        peak.intensity >= self.minimum_peak_height
            && peak.duration() >= self.minimum_peak_duration
            && peak.mz_width >= self.minimum_mz_peak_width
            && peak.mz_width <= self.maximum_mz_peak_width
    }

    /// Detect the peaks of one chromatogram
    pub fn pick(&self, chromatogram: &Chromatogram) -> Vec<ChromatographicPeak> {
        let mut peaks = Vec::new();
        let Some((_, global_apex)) = chromatogram.apex() else {
            return peaks;
        };
        let threshold = self
            .noise_level
            .max(self.chromatographic_threshold_level * global_apex);
        self.recurse(
            chromatogram,
            0,
            chromatogram.len() - 1,
            threshold,
            &mut peaks,
        );
        trace!(
            "chromatogram at {:.4} produced {} peaks above threshold {}",
            chromatogram.mz(),
            peaks.len(),
            threshold
        );
        peaks
    }

    /// Bisect the inclusive sample range `[start, end]` around its maximum
    fn recurse(
        &self,
        chromatogram: &Chromatogram,
        start: usize,
        end: usize,
        threshold: f32,
        peaks: &mut Vec<ChromatographicPeak>,
    ) {
        let time = chromatogram.time_array();
        let intensity = chromatogram.intensity_array();
        if time[end] - time[start] < self.minimum_peak_duration {
            return;
        }

        let mut apex = start;
        for i in start..=end {
            if intensity[i] > intensity[apex] {
                apex = i;
            }
        }
        if intensity[apex] <= threshold {
            return;
        }

        let (candidate_start, candidate_end) = {
            let window = &intensity[start..=end];
            let (s, e) = expand_boundaries(
                window,
                apex - start,
                self.noise_level,
                self.intensity_tolerance,
            );
            (start + s, start + e)
        };

        let peak = build_peak(chromatogram, candidate_start, candidate_end);
        if self.accepts(&peak) {
            peaks.push(peak);
        }

        if candidate_start > start {
            self.recurse(chromatogram, start, candidate_start - 1, threshold, peaks);
        }
        if candidate_end < end {
            self.recurse(chromatogram, candidate_end + 1, end, threshold, peaks);
        }
    }

    pub fn pick_all(
        &self,
        set: &ChromatogramSet,
        token: &CancelToken,
    ) -> Result<PeakList, TaskError> {
        let mut peaks = Vec::new();
        for chromatogram in set.iter() {
            token.checkpoint()?;
            peaks.extend(self.pick(chromatogram));
        }
        debug!(
            "recursive threshold detection found {} peaks in \"{}\"",
            peaks.len(),
            set.source()
        );
        Ok(PeakList::new(set.source(), peaks))
    }
}

impl Algorithm for RecursiveThresholdPicker {
    type Input = ChromatogramSet;
    type Output = PeakList;

    fn name(&self) -> &'static str {
        "recursive threshold peak detector"
    }

    fn validate(&self) -> Result<(), ParameterError> {
        check_all(
            RECURSIVE_THRESHOLD_PICKER,
            &[
                Value::Float(self.chromatographic_threshold_level as f64),
                Value::Float(self.noise_level as f64),
                Value::Float(self.minimum_peak_height as f64),
                Value::Float(self.minimum_peak_duration),
                Value::Float(self.intensity_tolerance as f64),
                Value::Float(self.minimum_mz_peak_width),
                Value::Float(self.maximum_mz_peak_width),
            ],
        )?;
        check_range(
            "Min M/Z peak width",
            self.minimum_mz_peak_width,
            "Max M/Z peak width",
            self.maximum_mz_peak_width,
        )
    }

    fn run(&self, input: &Self::Input, token: &CancelToken) -> Result<Self::Output, TaskError> {
        self.pick_all(input, token)
    }
}
