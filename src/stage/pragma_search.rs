//! Exhaustive pragma cross-product sweep.
//!
//! Walks every combination of pragma options as a mixed-radix odometer
//! over the real dimensions, last dimension fastest, so the attribute
//! labels come out in lexicographic order. Every combination is recorded,
//! including ones the synthesizer choked on; this can take a while for
//! large designs.

use crate::evaluator::{Constraint, Evaluator};
use crate::library::PragmaLibrary;
use crate::model::{PositionKey, ResultLedger};
use crate::sink::ResultSink;
use crate::stage::PRAGMA_METHOD;
use crate::{DseError, Explorer, SearchSummary};

impl<E: Evaluator, S: ResultSink> Explorer<E, S> {
    /// Synthesize every pragma combination of the library exactly once.
    pub fn pragma_search(
        &mut self,
        library: &PragmaLibrary,
        iteration: u32,
    ) -> Result<SearchSummary, DseError> {
        let space = library.to_space()?;
        let start = std::time::Instant::now();
        tracing::info!(
            design = %self.design,
            combinations = space.combinations(),
            "begin exhaustive pragma search"
        );

        let mut summary = SearchSummary {
            method: PRAGMA_METHOD,
            evaluations: 0,
            recorded: 0,
            cancelled: false,
        };
        let mut ledger: ResultLedger<PositionKey> = ResultLedger::new();
        let dims = space.dimension_count();
        let mut pos = space.first_position();

        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let (defines, options) = library.defines_for(&pos);
            let constraint = Constraint::Pragmas {
                defines: &defines,
                options,
            };
            let (fresh, result) = ledger.evaluate_with(pos.key(), || self.synthesize(&constraint));
            if fresh {
                summary.evaluations += 1;
            }
            let result = result.clone();
            let label = space.encode(&pos);
            tracing::info!(
                run = summary.evaluations,
                attr = %label,
                area = ?result.area,
                latency = ?result.latency,
                "finished synthesis"
            );
            // A failed run still gets a row; one broken configuration
            // must not end the sweep.
            if self.record(PRAGMA_METHOD, iteration, &label, &result) {
                summary.recorded += 1;
            }

            // Advance the odometer; done when the carry leaves the first
            // real dimension.
            let mut exhausted = false;
            for d in (1..dims).rev() {
                if pos.get(d) as usize == space.options(d) - 1 {
                    pos.set(d, 0);
                    if d == 1 {
                        exhausted = true;
                    }
                } else {
                    pos.set(d, pos.get(d) + 1);
                    break;
                }
            }
            if exhausted {
                break;
            }
        }

        tracing::info!(
            design = %self.design,
            evaluations = summary.evaluations,
            recorded = summary.recorded,
            elapsed = ?start.elapsed(),
            "pragma search finished"
        );
        Ok(summary)
    }
}
