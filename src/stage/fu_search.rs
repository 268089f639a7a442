//! Exhaustive functional-unit sweep.
//!
//! Runs the synthesizer repeatedly for different allowed counts of
//! [Large, Medium, Small] functional units, starting from [1,1,1] and
//! incrementing one slot at a time until no slot changes the result any
//! more.

use crate::evaluator::{Constraint, Evaluator};
use crate::model::{FuCount, ResultLedger};
use crate::sink::ResultSink;
use crate::stage::FU_METHOD;
use crate::{Explorer, SearchSummary};

type MetricPair = (Option<f64>, Option<f64>);

fn fu_label(fcnt: &FuCount) -> String {
    format!("L{}:M{}:S{}", fcnt[0], fcnt[1], fcnt[2])
}

impl<E: Evaluator, S: ResultSink> Explorer<E, S> {
    /// Sweep the functional-unit space for this design.
    ///
    /// The cursor starts at the Small slot and rolls down toward Large
    /// each time its slot's (area, latency) pair stops changing; any
    /// change while the cursor sits below Small reopens the Small slot,
    /// so smaller-unit improvements re-trigger exploration of larger
    /// ones. The search is exhausted when the Large slot stops changing.
    pub fn fu_search(&mut self, iteration: u32) -> SearchSummary {
        let start = std::time::Instant::now();
        tracing::info!(design = %self.design, "begin exhaustive FU search");

        let mut summary = SearchSummary {
            method: FU_METHOD,
            evaluations: 0,
            recorded: 0,
            cancelled: false,
        };
        let mut ledger: ResultLedger<FuCount> = ResultLedger::new();

        // Seed every slot tracker from the all-ones run, then record the
        // unconstrained run as the baseline row.
        if self.cancel.is_cancelled() {
            summary.cancelled = true;
            return summary;
        }
        let seed_pair = {
            let (fresh, result) =
                ledger.evaluate_with([1, 1, 1], || self.synthesize(&Constraint::FuCount([1, 1, 1])));
            if fresh {
                summary.evaluations += 1;
            }
            result.pair()
        };
        let mut new_pair: [MetricPair; 3] = [seed_pair; 3];
        let mut prev_pair: [Option<MetricPair>; 3] = [None; 3];

        if self.cancel.is_cancelled() {
            summary.cancelled = true;
            return summary;
        }
        let unconstrained = self.synthesize(&Constraint::Unconstrained);
        summary.evaluations += 1;
        if self.record(FU_METHOD, iteration, "unconstrained", &unconstrained) {
            summary.recorded += 1;
        }

        let mut fcnt: FuCount = [1, 1, 1];
        // Index of the slot currently being incremented; 2 is Small.
        let mut slot: usize = 2;

        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let (fresh, result) = ledger.evaluate_with(fcnt, || {
                self.synthesize(&Constraint::FuCount(fcnt))
            });
            if fresh {
                summary.evaluations += 1;
            }
            let label = fu_label(&fcnt);
            tracing::info!(
                run = summary.evaluations,
                constraint = %label,
                area = ?result.area,
                latency = ?result.latency,
                "finished synthesis"
            );
            new_pair[slot] = result.pair();
            let result = result.clone();

            if prev_pair[slot] == Some(new_pair[slot]) {
                // This slot has stopped improving.
                match slot {
                    0 => break, // every slot has plateaued
                    1 => {
                        slot = 0;
                        fcnt[1] = 1;
                        fcnt[2] = 1;
                    }
                    _ => {
                        slot = 1;
                        fcnt[2] = 1;
                    }
                }
            } else {
                if slot < 2 {
                    slot = 2;
                }
                if self.record(FU_METHOD, iteration, &label, &result) {
                    summary.recorded += 1;
                }
            }

            prev_pair[slot] = Some(new_pair[slot]);
            fcnt[slot] += 1;
        }

        tracing::info!(
            design = %self.design,
            evaluations = summary.evaluations,
            recorded = summary.recorded,
            elapsed = ?start.elapsed(),
            "FU search finished"
        );
        summary
    }
}
