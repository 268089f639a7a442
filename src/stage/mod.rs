//! The three exploration strategies, each a stage method on
//! [`Explorer`](crate::Explorer).

pub mod ant_colony;
pub mod cfg;
pub mod fu_search;
pub mod pragma_search;

pub use ant_colony::{Ant, AntColonyEngine};

use crate::evaluator::{Constraint, Evaluator};
use crate::model::QualityResult;
use crate::sink::ResultSink;
use crate::Explorer;

/// Method tags written into the result stream, one per strategy.
pub const FU_METHOD: &str = "FU";
pub const PRAGMA_METHOD: &str = "PRG";
pub const ANT_METHOD: &str = "ANT";

impl<E: Evaluator, S: ResultSink> Explorer<E, S> {
    /// One synthesis run under a constraint. Every evaluator failure is
    /// absorbed into an absent result; only the caller decides whether
    /// that narrows a sweep or penalizes an ant.
    pub(crate) fn synthesize(&mut self, constraint: &Constraint<'_>) -> QualityResult {
        let outcome = self
            .evaluator
            .prepare(&self.design, constraint)
            .and_then(|_| self.evaluator.run(&self.design));
        match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(design = %self.design, error = %e, "synthesis run failed");
                QualityResult::failed()
            }
        }
    }

    /// Append one row, logging instead of aborting on sink I/O errors.
    pub(crate) fn record(
        &mut self,
        method: &str,
        iteration: u32,
        label: &str,
        result: &QualityResult,
    ) -> bool {
        match self.sink.append(method, iteration, label, result) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, label, "failed to append result row");
                false
            }
        }
    }
}
