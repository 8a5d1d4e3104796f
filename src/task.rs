//! Cooperative execution of algorithm runs.
//!
//! Every algorithm in this crate is a value implementing [`Algorithm`]: it
//! validates its own configuration, then transforms one input into one output
//! while polling a [`CancelToken`] between top-level iterations. [`execute`]
//! collapses the run into exactly one terminal [`Outcome`], and
//! [`execute_into`] additionally hands a finished result to a [`Sink`] so a
//! canceled or failed run commits nothing.
//!
//! The crate does not own a scheduler. Callers submit runs to whatever
//! executor they like; [`execute_all`] is the one convenience on top, fanning
//! one algorithm out over many independent inputs (in parallel under the
//! `parallelism` feature) with per-input failure isolation.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cfg_if::cfg_if;
use log::debug;
use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::params::ParameterError;

/// A cheap, cloneable cancellation flag shared between the caller and a
/// running algorithm. Cancellation is cooperative: the running side polls
/// [`CancelToken::checkpoint`] between scans, chromatograms or files.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The running algorithm stops at its next
    /// checkpoint and its run terminates with [`Outcome::Canceled`].
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Return `Err(TaskError::Canceled)` when cancellation was requested
    pub fn checkpoint(&self) -> Result<(), TaskError> {
        if self.is_canceled() {
            Err(TaskError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// All the ways a run can terminate unsuccessfully
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskError {
    /// The configuration was rejected before the run started
    #[error("invalid configuration: {0}")]
    Validation(#[from] ParameterError),
    /// The run aborted midway; sibling runs are unaffected
    #[error("{0}")]
    Computation(String),
    /// The caller requested cancellation; not an error, produces no message
    #[error("the task was canceled")]
    Canceled,
}

/// One unit of asynchronous work: a validated configuration plus a pure
/// input-to-output transformation with cooperative cancellation.
pub trait Algorithm {
    type Input;
    type Output;

    /// A short human-readable name used in log messages
    fn name(&self) -> &'static str;

    /// Check the configuration against its declared parameter bounds.
    /// Called by [`execute`] before [`Algorithm::run`]; a failing
    /// configuration never starts a run.
    fn validate(&self) -> Result<(), ParameterError>;

    fn run(&self, input: &Self::Input, token: &CancelToken) -> Result<Self::Output, TaskError>;
}

/// The single terminal notification of one run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Finished(T),
    Canceled,
    Error(String),
}

impl<T> Outcome<T> {
    pub fn is_finished(&self) -> bool {
        matches!(self, Outcome::Finished(_))
    }

    pub fn finished(self) -> Option<T> {
        match self {
            Outcome::Finished(value) => Some(value),
            _ => None,
        }
    }
}

/// Receives successfully produced results, e.g. a project registry. Partial
/// results from canceled or failed runs are never offered to a sink.
pub trait Sink<T> {
    fn accept(&mut self, value: T);
}

impl<T> Sink<T> for Vec<T> {
    fn accept(&mut self, value: T) {
        self.push(value)
    }
}

/// Run `algorithm` over `input` to a single terminal [`Outcome`].
///
/// Validation happens first; an invalid configuration surfaces as
/// [`Outcome::Error`] without the run ever starting.
pub fn execute<A: Algorithm>(
    algorithm: &A,
    input: &A::Input,
    token: &CancelToken,
) -> Outcome<A::Output> {
    if let Err(err) = algorithm.validate() {
        return Outcome::Error(TaskError::from(err).to_string());
    }
    debug!("running {}", algorithm.name());
    match algorithm.run(input, token) {
        Ok(value) => Outcome::Finished(value),
        Err(TaskError::Canceled) => {
            debug!("{} canceled", algorithm.name());
            Outcome::Canceled
        }
        Err(err) => Outcome::Error(err.to_string()),
    }
}

/// Like [`execute`], but deliver a finished result to `sink`. Nothing is
/// committed on cancellation or error.
pub fn execute_into<A: Algorithm, S: Sink<A::Output>>(
    algorithm: &A,
    input: &A::Input,
    token: &CancelToken,
    sink: &mut S,
) -> Outcome<()> {
    match execute(algorithm, input, token) {
        Outcome::Finished(value) => {
            sink.accept(value);
            Outcome::Finished(())
        }
        Outcome::Canceled => Outcome::Canceled,
        Outcome::Error(message) => Outcome::Error(message),
    }
}

/// Run one algorithm over many independent inputs, yielding one [`Outcome`]
/// per input in input order. A failing input does not disturb its siblings.
pub fn execute_all<A>(
    algorithm: &A,
    inputs: &[A::Input],
    token: &CancelToken,
) -> Vec<Outcome<A::Output>>
where
    A: Algorithm + Sync,
    A::Input: Sync,
    A::Output: Send,
{
    cfg_if! {
        if #[cfg(feature = "parallelism")] {
            inputs
                .par_iter()
                .map(|input| execute(algorithm, input, token))
                .collect()
        } else {
            inputs
                .iter()
                .map(|input| execute(algorithm, input, token))
                .collect()
        }
    }
}
