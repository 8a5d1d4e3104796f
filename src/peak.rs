use std::fmt;

use mzpeaks::{CoordinateLike, IntensityMeasurement, Time, MZ};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A resolved chromatographic peak: one eluting species located in m/z and
/// retention time, with its apex intensity and integrated area.
///
/// Implements [`CoordinateLike<MZ>`] and [`CoordinateLike<Time>`] so it can
/// be matched with [`mzpeaks::Tolerance`] along either axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChromatographicPeak {
    /// The intensity-weighted m/z over the peak's samples
    pub mz: f64,
    /// The apex intensity
    pub intensity: f32,
    /// The retention time of the apex in seconds
    pub retention_time: f64,
    /// The retention time of the first sample of the peak
    pub start_time: f64,
    /// The retention time of the last sample of the peak
    pub end_time: f64,
    /// The trapezoid-integrated area over the peak's samples
    pub area: f32,
    /// The spread of the observed m/z values under the peak
    pub mz_width: f64,
}

impl ChromatographicPeak {
    pub fn new(
        mz: f64,
        intensity: f32,
        retention_time: f64,
        start_time: f64,
        end_time: f64,
        area: f32,
        mz_width: f64,
    ) -> Self {
        Self {
            mz,
            intensity,
            retention_time,
            start_time,
            end_time,
            area,
            mz_width,
        }
    }

    /// The elution duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

impl CoordinateLike<MZ> for ChromatographicPeak {
    fn coordinate(&self) -> f64 {
        self.mz
    }
}

impl CoordinateLike<Time> for ChromatographicPeak {
    fn coordinate(&self) -> f64 {
        self.retention_time
    }
}

impl IntensityMeasurement for ChromatographicPeak {
    fn intensity(&self) -> f32 {
        self.intensity
    }
}

impl fmt::Display for ChromatographicPeak {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ChromatographicPeak({}, {}, {}, {}-{}, {}, {})",
            self.mz,
            self.intensity,
            self.retention_time,
            self.start_time,
            self.end_time,
            self.area,
            self.mz_width
        )
    }
}

/// The peaks detected in one run, ordered by ascending retention time and
/// then ascending m/z, tagged with the source run id.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakList {
    source: String,
    peaks: Vec<ChromatographicPeak>,
}

impl PeakList {
    /// Build a peak list, enforcing the (retention time, m/z) ordering
    pub fn new(source: impl Into<String>, mut peaks: Vec<ChromatographicPeak>) -> Self {
        peaks.sort_by(|a, b| {
            a.retention_time
                .total_cmp(&b.retention_time)
                .then(a.mz.total_cmp(&b.mz))
        });
        Self {
            source: source.into(),
            peaks,
        }
    }

    /// The id of the run these peaks were detected in
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn peaks(&self) -> &[ChromatographicPeak] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChromatographicPeak> {
        self.peaks.iter()
    }
}
