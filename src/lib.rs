//! `mzchrom` is a library for extracting chromatographic features from
//! centroided LC-MS runs and aligning the resulting peak lists across runs.
//!
//! The canonical data flow starts from a [`RawRun`], optionally cropped to a
//! region of interest with [`CropFilter`]. [`ChromatogramBuilder`] slices the
//! run into m/z-binned extracted ion chromatograms, which can be smoothed
//! with [`MedianSmoother`] before a detector ([`LocalMaximaPicker`] or
//! [`RecursiveThresholdPicker`]) resolves them into [`ChromatographicPeak`]s.
//! Peak lists from several runs are finally merged into aligned feature rows
//! by [`JoinAligner`].
//!
//! Every processing step implements [`Algorithm`]: it validates its declared
//! parameters before running and polls a [`CancelToken`] while it works, so
//! [`execute`] always ends in exactly one of finished, canceled or error.
//!
//! # Usage
//! ```
//! use mzchrom::{
//!     execute, CancelToken, ChromatogramBuilder, LocalMaximaPicker, Outcome, RawRun, RawScan,
//! };
//!
//! // A single species at 300 m/z eluting as a triangle peaking at t=5
//! let mut scans = Vec::new();
//! for i in 0..11 {
//!     let intensity = 1000.0 * (1.0 - (i as f32 - 5.0).abs() / 5.0);
//!     scans.push(RawScan::new(1, i as f64, vec![300.0], vec![intensity]).unwrap());
//! }
//! let run = RawRun::new("demo", scans).unwrap();
//!
//! let token = CancelToken::new();
//! let chromatograms = ChromatogramBuilder::default()
//!     .build(&run, &token)
//!     .unwrap();
//!
//! // A single-centroid trace has no m/z spread, so do not require one
//! let picker = LocalMaximaPicker {
//!     minimum_mz_peak_width: 0.0,
//!     ..Default::default()
//! };
//! match execute(&picker, &chromatograms, &token) {
//!     Outcome::Finished(peaks) => {
//!         assert_eq!(peaks.len(), 1);
//!         assert_eq!(peaks.peaks()[0].intensity, 1000.0);
//!         assert_eq!(peaks.peaks()[0].retention_time, 5.0);
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```
pub mod align;
pub mod arrayops;
pub mod chromatogram;
pub mod crop;
pub mod params;
pub mod peak;
pub mod peak_picker;
pub mod recursive;
pub mod scan;
pub mod search;
pub mod smooth;
pub mod task;

pub use crate::align::{AlignmentResult, AlignmentRow, JoinAligner};
pub use crate::chromatogram::{Chromatogram, ChromatogramBuilder, ChromatogramSet};
pub use crate::crop::CropFilter;
pub use crate::params::{ParameterError, ParameterSpec, Value};
pub use crate::peak::{ChromatographicPeak, PeakList};
pub use crate::peak_picker::LocalMaximaPicker;
pub use crate::recursive::RecursiveThresholdPicker;
pub use crate::scan::{RawRun, RawScan, ScanError};
pub use crate::smooth::MedianSmoother;
pub use crate::task::{
    execute, execute_all, execute_into, Algorithm, CancelToken, Outcome, Sink, TaskError,
};
