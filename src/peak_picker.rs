//! Local-maxima chromatographic peak detection, plus the boundary expansion
//! and candidate construction helpers shared with the recursive-threshold
//! detector in [`crate::recursive`].
use log::{debug, trace};

use crate::arrayops::trapz;
use crate::chromatogram::{Chromatogram, ChromatogramSet};
use crate::params::{check_all, check_range, ParameterError, Value, LOCAL_MAXIMA_PICKER};
use crate::peak::{ChromatographicPeak, PeakList};
use crate::task::{Algorithm, CancelToken, TaskError};

/// Starting from `apex`, walk outward while the neighbor stays above
/// `noise_level` and does not exceed the current sample by more than the
/// fractional `intensity_tolerance`. Returns the inclusive `(start, end)`
/// sample range of the candidate.
pub(crate) fn expand_boundaries(
    intensity_array: &[f32],
    apex: usize,
    noise_level: f32,
    intensity_tolerance: f32,
) -> (usize, usize) {
    let allowed = 1.0 + intensity_tolerance;
    let mut start = apex;
    while start > 0 {
        let next = intensity_array[start - 1];
        if next <= noise_level || next > intensity_array[start] * allowed {
            break;
        }
        start -= 1;
    }
    let mut end = apex;
    while end + 1 < intensity_array.len() {
        let next = intensity_array[end + 1];
        if next <= noise_level || next > intensity_array[end] * allowed {
            break;
        }
        end += 1;
    }
    (start, end)
}

/// Assemble a [`ChromatographicPeak`] from the inclusive sample range
/// `[start, end]` of `chromatogram`.
pub(crate) fn build_peak(
    chromatogram: &Chromatogram,
    start: usize,
    end: usize,
) -> ChromatographicPeak {
    let time = &chromatogram.time_array()[start..=end];
    let intensity = &chromatogram.intensity_array()[start..=end];
    let mz = &chromatogram.mz_array()[start..=end];

    let mut apex = 0;
    for (i, value) in intensity.iter().enumerate() {
        if *value > intensity[apex] {
            apex = i;
        }
    }

    let total: f64 = intensity.iter().map(|i| *i as f64).sum();
    let weighted_mz = if total > 0.0 {
        mz.iter()
            .zip(intensity.iter())
            .map(|(m, i)| m * *i as f64)
            .sum::<f64>()
            / total
    } else {
        chromatogram.mz()
    };

    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for i in start..=end {
        low = low.min(chromatogram.mz_low_array()[i]);
        high = high.max(chromatogram.mz_high_array()[i]);
    }

    ChromatographicPeak::new(
        weighted_mz,
        intensity[apex],
        time[apex],
        time[0],
        time[time.len() - 1],
        trapz(time, intensity),
        high - low,
    )
}

/// Detects peaks at the local maxima of each chromatogram: every signal
/// sample with no strictly greater neighbor seeds a candidate, candidates
/// are expanded outward from their apex, and survivors are filtered on apex
/// height, duration and m/z trace width.
#[derive(Debug, Clone)]
pub struct LocalMaximaPicker {
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

impl Default for LocalMaximaPicker {
    fn default() -> Self {
        Self {
            noise_level: 10.0,
            minimum_peak_height: 100.0,
            minimum_peak_duration: 4.0,
            intensity_tolerance: 0.15,
            minimum_mz_peak_width: 0.2,
            maximum_mz_peak_width: 1.0,
        }
    }
}

impl LocalMaximaPicker {
    pub(crate) fn accepts(&self, peak: &ChromatographicPeak) -> bool {
        peak.intensity >= self.minimum_peak_height
            && peak.duration() >= self.minimum_peak_duration
            && peak.mz_width >= self.minimum_mz_peak_width
            && peak.mz_width <= self.maximum_mz_peak_width
    }

    /// Detect the peaks of one chromatogram
    pub fn pick(&self, chromatogram: &Chromatogram) -> Vec<ChromatographicPeak> {
        let intensity = chromatogram.intensity_array();
        let n = intensity.len();

        let mut candidates: Vec<ChromatographicPeak> = Vec::new();
        for i in 0..n {
            if intensity[i] <= self.noise_level {
                continue;
            }
            if i > 0 && intensity[i - 1] > intensity[i] {
                continue;
            }
            if i + 1 < n && intensity[i + 1] > intensity[i] {
                continue;
            }
            let (start, end) = expand_boundaries(
                intensity,
                i,
                self.noise_level,
                self.intensity_tolerance,
            );
            let peak = build_peak(chromatogram, start, end);
            if self.accepts(&peak) {
                candidates.push(peak);
            }
        }

        // Strongest apex claims its retention time range first; a weaker
        // candidate entirely inside an accepted range is a shoulder of that
        // peak, not a peak of its own.
        candidates.sort_by(|a, b| {
            b.intensity
                .total_cmp(&a.intensity)
                .then(a.retention_time.total_cmp(&b.retention_time))
        });
        let mut accepted: Vec<ChromatographicPeak> = Vec::new();
        for candidate in candidates {
            let contained = accepted
                .iter()
                .any(|p| candidate.start_time >= p.start_time && candidate.end_time <= p.end_time);
            if !contained {
                accepted.push(candidate);
            }
        }
        trace!(
            "chromatogram at {:.4} produced {} peaks",
            chromatogram.mz(),
            accepted.len()
        );
        accepted
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
            "local maxima detection found {} peaks in \"{}\"",
            peaks.len(),
            set.source()
        );
        Ok(PeakList::new(set.source(), peaks))
    }
}

impl Algorithm for LocalMaximaPicker {
    type Input = ChromatogramSet;
    type Output = PeakList;

    fn name(&self) -> &'static str {
        "local maxima peak detector"
    }

    fn validate(&self) -> Result<(), ParameterError> {
        check_all(
            LOCAL_MAXIMA_PICKER,
            &[
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

#[cfg(test)]
mod test {
    use super::*;

    fn triangle(apex: f32) -> Chromatogram {
        let time: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let intensity: Vec<f32> = time
            .iter()
            .map(|t| apex * (1.0 - (t - 5.0).abs() as f32 / 5.0))
            .collect();
        Chromatogram::from_time_intensity(300.0, 0.125, time, intensity)
    }

    fn picker() -> LocalMaximaPicker {
        LocalMaximaPicker {
            minimum_mz_peak_width: 0.0,
            ..Default::default()
        }
    }

    #[test_log::test]
    fn test_single_triangle() {
        let peaks = picker().pick(&triangle(1000.0));
        assert_eq!(peaks.len(), 1);
        let peak = &peaks[0];
        assert_eq!(peak.intensity, 1000.0);
        assert_eq!(peak.retention_time, 5.0);
        assert_eq!(peak.mz, 300.0);
        assert!(peak.duration() >= 4.0);
        assert!(peak.area > 0.0);
    }

    #[test]
    fn test_centroid_of_constant_mz_trace_is_exact() {
        let time: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let intensity = vec![10.0f32, 120.0, 380.0, 900.0, 1000.0, 880.0, 420.0, 150.0, 20.0];
        let chromatogram = Chromatogram::from_time_intensity(300.0, 0.125, time, intensity);
        let peak = build_peak(&chromatogram, 0, 8);
        assert_eq!(peak.mz, 300.0);
    }

    #[test]
    fn test_flat_noise_is_empty() {
        let time: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let intensity = vec![5.0f32; 11];
        let chromatogram = Chromatogram::from_time_intensity(300.0, 0.125, time, intensity);
        assert!(picker().pick(&chromatogram).is_empty());
    }

    #[test]
    fn test_short_peak_rejected() {
        let time = vec![0.0, 1.0, 2.0];
        let intensity = vec![0.0f32, 1000.0, 0.0];
        let chromatogram = Chromatogram::from_time_intensity(300.0, 0.125, time, intensity);
        assert!(picker().pick(&chromatogram).is_empty());
    }

    #[test]
    fn test_contained_shoulder_dropped() {
        let time: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let intensity = vec![0.0f32, 200.0, 1000.0, 900.0, 950.0, 800.0, 400.0, 200.0, 0.0];
        let chromatogram = Chromatogram::from_time_intensity(300.0, 0.125, time, intensity);
        let peaks = picker().pick(&chromatogram);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].intensity, 1000.0);
    }

    #[test]
    fn test_expansion_respects_noise_floor() {
        let intensity = vec![5.0f32, 50.0, 1000.0, 50.0, 5.0];
        let (start, end) = expand_boundaries(&intensity, 2, 10.0, 0.15);
        assert_eq!((start, end), (1, 3));
    }

    #[test]
    fn test_list_is_time_sorted() {
        let mut set_peaks = Vec::new();
        for shift in [40.0f64, 0.0, 20.0] {
            let time: Vec<f64> = (0..11).map(|i| shift + i as f64).collect();
            let intensity: Vec<f32> = (0..11)
                .map(|i| 1000.0 * (1.0 - (i as f32 - 5.0).abs() / 5.0))
                .collect();
            let chromatogram = Chromatogram::from_time_intensity(300.0, 0.125, time, intensity);
            set_peaks.push(chromatogram);
        }
        let set = ChromatogramSet::new("run", set_peaks);
        let list = picker().pick_all(&set, &CancelToken::new()).unwrap();
        assert_eq!(list.len(), 3);
        let times: Vec<f64> = list.iter().map(|p| p.retention_time).collect();
        assert_eq!(times, vec![5.0, 25.0, 45.0]);
    }
}
