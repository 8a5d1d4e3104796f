//! Declared algorithm parameters with bounds, mirrored by the typed
//! configuration structs of each algorithm.
//!
//! Every algorithm publishes a fixed, ordered table of [`ParameterSpec`]s
//! describing its options: display name, unit, default and optional
//! minimum/maximum. A configuration is checked against its table (plus any
//! cross-field constraints) before a run starts; a run never begins on an
//! out-of-range value.
use std::fmt;

use thiserror::Error;

/// A parameter value, either integral or floating point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "floating point",
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Value::Int(_) => true,
            Value::Float(f) => f.is_finite(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

/// All the ways a configuration can be rejected before a run starts
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParameterError {
    #[error("value {value} for \"{name}\" is below the minimum {minimum}")]
    BelowMinimum {
        name: &'static str,
        value: Value,
        minimum: Value,
    },
    #[error("value {value} for \"{name}\" is above the maximum {maximum}")]
    AboveMaximum {
        name: &'static str,
        value: Value,
        maximum: Value,
    },
    #[error("\"{name}\" expects a {expected} value, got {value}")]
    WrongKind {
        name: &'static str,
        expected: &'static str,
        value: Value,
    },
    #[error("value for \"{name}\" must be finite")]
    NotFinite { name: &'static str },
    #[error("\"{low}\" ({low_value}) must not exceed \"{high}\" ({high_value})")]
    InvertedRange {
        low: &'static str,
        low_value: f64,
        high: &'static str,
        high_value: f64,
    },
}

/// The declaration of one algorithm option. The expected value kind is
/// implied by the kind of `default`.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub default: Value,
    pub minimum: Option<Value>,
    pub maximum: Option<Value>,
}

impl ParameterSpec {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        unit: &'static str,
        default: Value,
        minimum: Option<Value>,
        maximum: Option<Value>,
    ) -> Self {
        Self {
            name,
            description,
            unit,
            default,
            minimum,
            maximum,
        }
    }

    /// Validate `value` against this declaration
    pub fn check(&self, value: Value) -> Result<(), ParameterError> {
        if std::mem::discriminant(&value) != std::mem::discriminant(&self.default) {
            return Err(ParameterError::WrongKind {
                name: self.name,
                expected: self.default.kind(),
                value,
            });
        }
        if !value.is_finite() {
            return Err(ParameterError::NotFinite { name: self.name });
        }
        if let Some(minimum) = self.minimum {
            if value.as_f64() < minimum.as_f64() {
                return Err(ParameterError::BelowMinimum {
                    name: self.name,
                    value,
                    minimum,
                });
            }
        }
        if let Some(maximum) = self.maximum {
            if value.as_f64() > maximum.as_f64() {
                return Err(ParameterError::AboveMaximum {
                    name: self.name,
                    value,
                    maximum,
                });
            }
        }
        Ok(())
    }
}

/// Check `values` against `specs` pairwise, in declaration order
pub fn check_all(specs: &[ParameterSpec], values: &[Value]) -> Result<(), ParameterError> {
    for (spec, value) in specs.iter().zip(values.iter()) {
        spec.check(*value)?;
    }
    Ok(())
}

/// Check that a `[low, high]` pair of options does not cross
pub fn check_range(
    low: &'static str,
    low_value: f64,
    high: &'static str,
    high_value: f64,
) -> Result<(), ParameterError> {
    if low_value > high_value {
        return Err(ParameterError::InvertedRange {
            low,
            low_value,
            high,
            high_value,
        });
    }
    Ok(())
}

pub const CHROMATOGRAM_BUILDER: &[ParameterSpec] = &[ParameterSpec::new(
    "M/Z bin width",
    "Width of the m/z range covered by each extracted ion chromatogram",
    "Da",
    Value::Float(0.25),
    Some(Value::Float(0.05)),
    None,
)];

pub const LOCAL_MAXIMA_PICKER: &[ParameterSpec] = &[
    ParameterSpec::new(
        "Noise level",
        "Intensities at or below this value are interpreted as noise",
        "absolute",
        Value::Float(10.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Min peak height",
        "Minimum acceptable apex intensity",
        "absolute",
        Value::Float(100.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Min peak duration",
        "Minimum acceptable peak duration",
        "seconds",
        Value::Float(4.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Intensity tolerance",
        "Maximum allowed upward deviation from the expected peak shape while \
         expanding a peak boundary",
        "%",
        Value::Float(0.15),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Min M/Z peak width",
        "Minimum acceptable width of the underlying m/z trace",
        "Da",
        Value::Float(0.2),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Max M/Z peak width",
        "Maximum acceptable width of the underlying m/z trace",
        "Da",
        Value::Float(1.0),
        Some(Value::Float(0.0)),
        None,
    ),
];

pub const RECURSIVE_THRESHOLD_PICKER: &[ParameterSpec] = &[
    ParameterSpec::new(
        "Chromatographic threshold level",
        "Fraction of the chromatogram apex defining the relative noise floor",
        "%",
        Value::Float(0.0),
        Some(Value::Float(0.0)),
        Some(Value::Float(1.0)),
    ),
    ParameterSpec::new(
        "Noise level",
        "Intensities at or below this value are interpreted as noise",
        "absolute",
        Value::Float(10.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Min peak height",
        "Minimum acceptable apex intensity",
        "absolute",
        Value::Float(100.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Min peak duration",
        "Minimum acceptable peak duration",
        "seconds",
        Value::Float(4.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Intensity tolerance",
        "Maximum allowed upward deviation from the expected peak shape while \
         expanding a peak boundary",
        "%",
        Value::Float(0.15),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Min M/Z peak width",
        "Minimum acceptable width of the underlying m/z trace",
        "Da",
        Value::Float(0.2),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Max M/Z peak width",
        "Maximum acceptable width of the underlying m/z trace",
        "Da",
        Value::Float(1.0),
        Some(Value::Float(0.0)),
        None,
    ),
];

pub const MEDIAN_SMOOTHER: &[ParameterSpec] = &[ParameterSpec::new(
    "Window width",
    "Width of the sliding retention time window a median is taken over",
    "seconds",
    Value::Float(10.0),
    Some(Value::Float(0.0)),
    None,
)];

pub const CROP_FILTER: &[ParameterSpec] = &[
    ParameterSpec::new(
        "MS level",
        "MS level of the scans to keep",
        "",
        Value::Int(1),
        Some(Value::Int(1)),
        Some(Value::Int(10)),
    ),
    ParameterSpec::new(
        "Minimum M/Z",
        "Lower m/z boundary of the cropped region",
        "Da",
        Value::Float(100.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Maximum M/Z",
        "Upper m/z boundary of the cropped region",
        "Da",
        Value::Float(1000.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Minimum retention time",
        "Lower RT boundary of the cropped region",
        "seconds",
        Value::Float(0.0),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "Maximum retention time",
        "Upper RT boundary of the cropped region",
        "seconds",
        Value::Float(600.0),
        Some(Value::Float(0.0)),
        None,
    ),
];

pub const JOIN_ALIGNER: &[ParameterSpec] = &[
    ParameterSpec::new(
        "M/Z tolerance",
        "Maximum allowed m/z distance between a row anchor and a matched peak",
        "Da",
        Value::Float(0.1),
        Some(Value::Float(0.0)),
        None,
    ),
    ParameterSpec::new(
        "RT tolerance",
        "Maximum allowed retention time distance between a row anchor and a \
         matched peak",
        "seconds",
        Value::Float(15.0),
        Some(Value::Float(0.0)),
        None,
    ),
];
