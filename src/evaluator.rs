//! The external synthesizer boundary.
//!
//! The exploration engine never runs synthesis itself; it hands a
//! constraint to an [`Evaluator`], which configures the tool (constraint
//! file, attribute header, parser pass) and returns the parsed metrics.
//! Production deployments load the evaluator from a shared object, the
//! same way the CTS flow loads its design plugin.

use crate::model::QualityResult;
use crate::DseError;
use libloading::Library;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("synthesizer i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("synthesizer failed: {0}")]
    Tool(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// What the next synthesis run is constrained by.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint<'a> {
    /// No constraint file; the tool picks its own resource budget.
    Unconstrained,
    /// Allowed functional-unit counts, [Large, Medium, Small].
    FuCount([u32; 3]),
    /// Rendered attribute-header defines plus extra tool options selected
    /// by pragma markers.
    Pragmas {
        defines: &'a [String],
        options: &'a str,
    },
}

/// External synthesis adapter.
///
/// Both methods may fail; the strategies absorb every failure into an
/// absent [`QualityResult`] rather than letting it end the search.
pub trait Evaluator {
    /// Configure the tool for the next run under the given constraint.
    fn prepare(&mut self, design: &str, constraint: &Constraint<'_>) -> EvalResult<()>;

    /// Run synthesis and return the parsed metrics.
    fn run(&mut self, design: &str) -> EvalResult<QualityResult>;
}

/// An evaluator loaded from a shared object exposing a `new_evaluator`
/// constructor. The library handle lives as long as the adapter so the
/// implementation's code stays mapped.
pub struct PluginEvaluator {
    inner: Box<dyn Evaluator>,
    _lib: Library,
}

impl PluginEvaluator {
    pub fn load(path: &str) -> Result<Self, DseError> {
        let lib = Library::new(path)?;
        let inner = {
            let new_evaluator: libloading::Symbol<fn() -> Box<dyn Evaluator>> =
                unsafe { lib.get(b"new_evaluator") }?;
            new_evaluator()
        };
        tracing::info!(plugin = path, "loaded evaluator plugin");
        Ok(PluginEvaluator { inner, _lib: lib })
    }
}

impl Evaluator for PluginEvaluator {
    fn prepare(&mut self, design: &str, constraint: &Constraint<'_>) -> EvalResult<()> {
        self.inner.prepare(design, constraint)
    }

    fn run(&mut self, design: &str) -> EvalResult<QualityResult> {
        self.inner.run(design)
    }
}
