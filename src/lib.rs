//! Design space exploration for high-level synthesis.
//!
//! By changing knobs such as functional-unit budgets and pragmas before
//! synthesis, many different implementations of one design can be reached
//! automatically and compared on area and latency. This crate implements
//! the part that decides which configuration to synthesize next: two
//! exhaustive strategies and an Ant Colony Optimization heuristic, all
//! driving an external synthesizer through the [`evaluator::Evaluator`]
//! boundary and streaming rows into a [`sink::ResultSink`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

pub mod cfg;
pub mod evaluator;
pub mod library;
pub mod model;
pub mod sink;
pub mod stage;

pub use crate::evaluator::{Constraint, EvalError, Evaluator};
pub use crate::library::PragmaLibrary;
pub use crate::model::{ConfigurationSpace, Position, PositionKey, QualityResult, ResultLedger};
pub use crate::sink::{CsvSink, MemorySink, ResultSink};
pub use crate::stage::cfg::AntColonyCfg;

#[derive(Debug, Error)]
pub enum DseError {
    /// The attribute library yielded a dimension with zero options. Fatal;
    /// nothing is evaluated for a space that cannot be traversed.
    #[error("dimension {dim} of the attribute library has no options")]
    EmptyDimension { dim: usize },
    #[error("attribute library line {line}: {reason}")]
    Library { line: usize, reason: &'static str },
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration: {0}")]
    Cfg(#[from] serde_yaml::Error),
    #[error("ledger snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Cooperative stop flag, checked at epoch boundaries and before every
/// synthesizer call, since that call may block on an external process.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a finished (or cancelled) search did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary {
    pub method: &'static str,
    /// Synthesizer invocations, cache hits excluded.
    pub evaluations: u32,
    /// Rows appended to the result sink.
    pub recorded: u32,
    pub cancelled: bool,
}

/// One exploration run over one design: the evaluator, the result stream,
/// and the strategy entry points (implemented under `stage/`).
pub struct Explorer<E: Evaluator, S: ResultSink> {
    pub(crate) design: String,
    pub(crate) evaluator: E,
    pub(crate) sink: S,
    pub(crate) cancel: CancelToken,
}

impl<E: Evaluator, S: ResultSink> Explorer<E, S> {
    pub fn new(design: &str, evaluator: E, sink: S) -> Self {
        Explorer {
            design: design.to_string(),
            evaluator,
            sink,
            cancel: CancelToken::new(),
        }
    }

    pub fn design(&self) -> &str {
        &self.design
    }

    /// A clone of the run's cancel flag, to hand to another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
