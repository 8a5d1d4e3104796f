//! Cropping of raw runs to an m/z and retention time region of interest at
//! one MS level.
use log::debug;

use crate::params::{check_all, check_range, ParameterError, Value, CROP_FILTER};
use crate::scan::{RawRun, RawScan};
use crate::search::indices_between;
use crate::task::{Algorithm, CancelToken, TaskError};

/// Produces a new [`RawRun`] holding only the scans at the configured MS
/// level whose retention time lies in `[minimum_rt, maximum_rt]`, with each
/// kept scan restricted to the centroids inside `[minimum_mz, maximum_mz]`.
/// Both intervals are closed; scans at other MS levels are removed entirely.
#[derive(Debug, Clone)]
pub struct CropFilter {
    /// MS level of the scans to keep
    pub ms_level: u8,
    /// Lower m/z boundary of the cropped region in Da
    pub minimum_mz: f64,
    /// Upper m/z boundary of the cropped region in Da
    pub maximum_mz: f64,
    /// Lower RT boundary of the cropped region in seconds
    pub minimum_rt: f64,
    /// Upper RT boundary of the cropped region in seconds
    pub maximum_rt: f64,
}

impl Default for CropFilter {
    fn default() -> Self {
        Self {
            ms_level: 1,
            minimum_mz: 100.0,
            maximum_mz: 1000.0,
            minimum_rt: 0.0,
            maximum_rt: 600.0,
        }
    }
}

impl CropFilter {
    pub fn crop(&self, run: &RawRun, token: &CancelToken) -> Result<RawRun, TaskError> {
        let mut kept: Vec<RawScan> = Vec::new();
        for scan in run.iter() {
            token.checkpoint()?;
            if scan.ms_level() != self.ms_level {
                continue;
            }
            let rt = scan.retention_time();
            if rt < self.minimum_rt || rt > self.maximum_rt {
                continue;
            }
            let (start, end) = indices_between(scan.mz_array(), self.minimum_mz, self.maximum_mz);
            kept.push(scan.sliced(start, end));
        }
        debug!(
            "cropped \"{}\" from {} to {} scans",
            run.id(),
            run.len(),
            kept.len()
        );
        RawRun::new(run.id(), kept).map_err(|e| TaskError::Computation(e.to_string()))
    }
}

impl Algorithm for CropFilter {
    type Input = RawRun;
    type Output = RawRun;

    fn name(&self) -> &'static str {
        "crop filter"
    }

    fn validate(&self) -> Result<(), ParameterError> {
        check_all(
            CROP_FILTER,
            &[
                Value::Int(self.ms_level as i64),
                Value::Float(self.minimum_mz),
                Value::Float(self.maximum_mz),
                Value::Float(self.minimum_rt),
                Value::Float(self.maximum_rt),
            ],
        )?;
        check_range("Minimum M/Z", self.minimum_mz, "Maximum M/Z", self.maximum_mz)?;
        check_range(
            "Minimum retention time",
            self.minimum_rt,
            "Maximum retention time",
            self.maximum_rt,
        )
    }

    fn run(&self, input: &Self::Input, token: &CancelToken) -> Result<Self::Output, TaskError> {
        self.crop(input, token)
    }
}
