//! Ant Colony Optimization over the pragma space.
//!
//! Ants search for food (a good implementation) by wandering the
//! configuration space, dropping pheromones as they go. Better
//! Quality-of-Result (QoR) scores accumulate more pheromone, so later
//! ants concentrate around the good configurations while the evaporation
//! step keeps abandoned paths from pinning the colony down.

use crate::evaluator::{Constraint, Evaluator};
use crate::library::PragmaLibrary;
use crate::model::{
    ConfigurationSpace, DimensionIndex, OptionIndex, Position, PositionKey, QualityResult,
    ResultLedger,
};
use crate::sink::ResultSink;
use crate::stage::cfg::AntColonyCfg;
use crate::stage::ANT_METHOD;
use crate::{DseError, Explorer, SearchSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// One search agent. Lives for a single iteration; its position has one
/// option index per dimension, reserved slot fixed.
pub struct Ant {
    pub id: usize,
    pub position: Position,
}

impl Ant {
    pub fn new<R: Rng>(space: &ConfigurationSpace, id: usize, rng: &mut R) -> Self {
        Ant {
            id,
            position: space.random_position(rng),
        }
    }
}

/// Per-iteration colony state: pheromone and cost matrices shaped like
/// the configuration space, per-cell visit counters, the running area and
/// latency ranges, and the memoized evaluations. Discarded at iteration
/// end so every iteration samples the heuristic independently.
pub struct AntColonyEngine {
    cfg: AntColonyCfg,
    pheromone: Vec<Vec<f64>>,
    cost: Vec<Vec<f64>>,
    visits: Vec<Vec<u32>>,
    ledger: ResultLedger<PositionKey>,
    /// QoR as first computed for a position; replayed on revisits.
    qor: HashMap<PositionKey, f64>,
    min_area: f64,
    max_area: f64,
    min_latency: f64,
    max_latency: f64,
    designs_found: u32,
}

impl AntColonyEngine {
    pub fn new(space: &ConfigurationSpace, cfg: AntColonyCfg) -> Self {
        let rows: Vec<Vec<f64>> = (0..space.dimension_count())
            .map(|d| vec![0.0; space.options(d)])
            .collect();
        let visits = rows.iter().map(|r| vec![0u32; r.len()]).collect();
        AntColonyEngine {
            cfg,
            pheromone: rows.clone(),
            cost: rows,
            visits,
            ledger: ResultLedger::new(),
            qor: HashMap::new(),
            min_area: 0.0,
            max_area: 0.0,
            min_latency: 0.0,
            max_latency: 0.0,
            designs_found: 0,
        }
    }

    pub fn ledger(&self) -> &ResultLedger<PositionKey> {
        &self.ledger
    }

    pub fn designs_found(&self) -> u32 {
        self.designs_found
    }

    pub fn pheromone_row(&self, dim: DimensionIndex) -> &[f64] {
        &self.pheromone[dim]
    }

    pub fn cost_row(&self, dim: DimensionIndex) -> &[f64] {
        &self.cost[dim]
    }

    /// Move one ant: pick a random real dimension, weigh its options by
    /// `max(min_attractiveness, pheromone - cost + 1)`, roulette-wheel a
    /// choice, and deposit pheromone on it. Returns the move made.
    pub fn move_ant<R: Rng>(
        &mut self,
        ant: &mut Ant,
        rng: &mut R,
    ) -> (DimensionIndex, OptionIndex) {
        let dim = rng.gen_range(1..self.pheromone.len());
        let choice = self.roulette(dim, rng.gen::<f64>());
        ant.position.set(dim, choice);
        self.pheromone[dim][choice as usize] += self.cfg.phero_per_move;
        tracing::debug!(ant = ant.id, dim, choice, "ant move");
        (dim, choice)
    }

    // `draw` is uniform in [0,1); scaled onto the attractiveness total so
    // the floored options keep a non-zero share of the wheel.
    fn roulette(&self, dim: DimensionIndex, draw: f64) -> OptionIndex {
        let attractiveness: Vec<f64> = self.pheromone[dim]
            .iter()
            .zip(&self.cost[dim])
            .map(|(ph, c)| (ph - c + 1.0).max(self.cfg.min_attractiveness))
            .collect();
        let total: f64 = attractiveness.iter().sum();
        let mut roll = draw * total;
        let mut choice = attractiveness.len() - 1;
        for (o, a) in attractiveness.iter().enumerate() {
            roll -= a;
            if roll <= 0.0 {
                choice = o;
                break;
            }
        }
        choice as OptionIndex
    }

    /// QoR of a fresh evaluation against the ranges seen so far this
    /// iteration. 0 is best, 1 exactly average; a failed run gets the
    /// fixed penalty so ants steer clear of it.
    pub fn qor_of(&self, result: &QualityResult) -> f64 {
        let (area, latency) = match (result.area, result.latency) {
            (Some(a), Some(l)) => (a, l),
            _ => return self.cfg.failure_penalty,
        };
        // First observation: the range collapses onto this result.
        let (max_area, max_latency) = if self.max_area == 0.0 {
            (area, latency)
        } else {
            (self.max_area, self.max_latency)
        };
        let norm_area = normalize(area, self.min_area, max_area);
        let norm_latency = normalize(latency, self.min_latency, max_latency);
        self.cfg.area_weight * norm_area + self.cfg.latency_weight * norm_latency
    }

    /// Fold a successful evaluation into the running min/max trackers.
    /// Returns false for a stagnating move (failed or absent metrics),
    /// which feeds the end criteria.
    pub fn observe(&mut self, result: &QualityResult) -> bool {
        if let (Some(area), Some(latency)) = (result.area, result.latency) {
            if area > 0.0 {
                self.designs_found += 1;
                if self.min_area == 0.0 {
                    self.min_area = area;
                }
                if self.min_latency == 0.0 {
                    self.min_latency = latency;
                }
                if area < self.min_area {
                    self.min_area = area;
                }
                if area > self.max_area {
                    self.max_area = area;
                }
                if latency < self.min_latency {
                    self.min_latency = latency;
                }
                if latency > self.max_latency {
                    self.max_latency = latency;
                }
                return true;
            }
        }
        false
    }

    /// Running-average cost update along the ant's whole position, one
    /// visit-counted cell per real dimension. Cells seed lazily on their
    /// first observation.
    pub fn update_cost(&mut self, pos: &Position, qor: f64) {
        for dim in 1..self.cost.len() {
            let o = pos.get(dim) as usize;
            self.visits[dim][o] += 1;
            let cell = &mut self.cost[dim][o];
            if *cell == 0.0 {
                *cell = qor;
            } else {
                *cell += (qor - *cell) / f64::from(self.visits[dim][o]);
            }
        }
    }

    fn remember(&mut self, key: PositionKey, result: QualityResult, qor: f64) {
        self.qor.insert(key.clone(), qor);
        self.ledger.evaluate_with(key, || result);
    }

    fn replay(&self, key: &PositionKey) -> Option<f64> {
        self.qor.get(key).copied()
    }

    /// Scale every real pheromone row by `1 - evaporation_rate`; paths
    /// not retaken slowly fade.
    pub fn evaporate(&mut self) {
        let keep = 1.0 - self.cfg.evaporation_rate;
        for row in self.pheromone.iter_mut().skip(1) {
            for cell in row.iter_mut() {
                *cell *= keep;
            }
        }
    }

    /// Heuristic stopping rules: nearly every ant move stagnated this
    /// epoch, or all but a few dimensions carry a dominant pheromone
    /// share. Neither requires all ants to agree.
    pub fn converged(&self, stagnant_moves: usize, ants: usize) -> bool {
        if stagnant_moves as f64 >= self.cfg.end_criteria * ants as f64 {
            return true;
        }
        let mut not_converged = 0;
        for row in &self.pheromone[1..] {
            let sum: f64 = row.iter().sum();
            let peak = row.iter().cloned().fold(f64::MIN, f64::max);
            if peak / (sum + 0.01) < self.cfg.convergence_criteria {
                not_converged += 1;
            }
        }
        not_converged <= self.pheromone.len() / 8
    }
}

fn normalize(value: f64, min_seen: f64, max_seen: f64) -> f64 {
    let lo = min_seen.min(value);
    let hi = max_seen.max(value);
    if hi - lo == 0.0 {
        // no spread yet; call it average-at-best rather than divide by 0
        0.0
    } else {
        (value - lo) / (hi - lo)
    }
}

impl<E: Evaluator, S: ResultSink> Explorer<E, S> {
    /// Ant colony heuristic over the pragma space. Each iteration is an
    /// independent run to convergence with fresh matrices, ants, and
    /// memoization; good designs surface faster than the exhaustive
    /// sweep, without the guarantee of finding the best one.
    pub fn ant_search(
        &mut self,
        library: &PragmaLibrary,
        cfg: &AntColonyCfg,
        iterations: u32,
    ) -> Result<SearchSummary, DseError> {
        let space = library.to_space()?;
        let start = std::time::Instant::now();
        let mut summary = SearchSummary {
            method: ANT_METHOD,
            evaluations: 0,
            recorded: 0,
            cancelled: false,
        };
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let ant_count = cfg.ants_per_pragma * (space.dimension_count() - 1);

        'run: for iteration in 0..iterations {
            tracing::info!(design = %self.design, iteration, ants = ant_count, "begin ant colony iteration");
            let mut engine = AntColonyEngine::new(&space, cfg.clone());
            let mut ants: Vec<Ant> = (0..ant_count)
                .map(|id| Ant::new(&space, id, &mut rng))
                .collect();

            let mut epoch = 0u32;
            loop {
                epoch += 1;
                let mut stagnant_moves = 0usize;
                for ant in ants.iter_mut() {
                    if self.cancel.is_cancelled() {
                        summary.cancelled = true;
                        break 'run;
                    }
                    engine.move_ant(ant, &mut rng);

                    let key = ant.position.key();
                    if let Some(prev_qor) = engine.replay(&key) {
                        // already evaluated; no new design found
                        engine.update_cost(&ant.position, prev_qor);
                        stagnant_moves += 1;
                        continue;
                    }

                    let (defines, options) = library.defines_for(&ant.position);
                    let constraint = Constraint::Pragmas {
                        defines: &defines,
                        options,
                    };
                    let result = self.synthesize(&constraint);
                    summary.evaluations += 1;

                    let qor = engine.qor_of(&result);
                    // any non-blank record gets a row, even one the QoR
                    // trackers reject; only a blank result is held back
                    if !result.metrics.is_empty() {
                        let label = space.encode(&ant.position);
                        if self.record(ANT_METHOD, iteration, &label, &result) {
                            summary.recorded += 1;
                        }
                    }
                    if !engine.observe(&result) {
                        stagnant_moves += 1;
                    }
                    engine.update_cost(&ant.position, qor);
                    engine.remember(key, result, qor);
                }

                let converged = engine.converged(stagnant_moves, ants.len())
                    || cfg.max_epochs.map_or(false, |cap| epoch >= cap);
                engine.evaporate();
                tracing::debug!(
                    iteration,
                    epoch,
                    stagnant_moves,
                    designs = engine.designs_found(),
                    "move epoch finished"
                );
                if converged {
                    break;
                }
            }
            tracing::info!(
                iteration,
                epochs = epoch,
                designs = engine.designs_found(),
                "ant colony iteration converged"
            );
        }

        tracing::info!(
            design = %self.design,
            evaluations = summary.evaluations,
            recorded = summary.recorded,
            elapsed = ?start.elapsed(),
            "ant colony search finished"
        );
        Ok(summary)
    }
}
