use serde::{Deserialize, Serialize};

/// Hyperparameters of the ant colony stage. Carried as an explicit value
/// (not process-wide constants) so concurrent explorations cannot
/// interfere; experimenting with these may yield drastically different
/// results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntColonyCfg {
    /// Ants created per explored pragma dimension.
    pub ants_per_pragma: usize,
    /// Pheromone deposited by each ant move.
    pub phero_per_move: f64,
    /// Fraction of pheromone that evaporates after each move epoch.
    pub evaporation_rate: f64,
    /// Dominant pheromone share at which a dimension counts as converged.
    pub convergence_criteria: f64,
    /// Fraction of stagnating ant moves per epoch that ends the iteration.
    pub end_criteria: f64,
    pub area_weight: f64,
    pub latency_weight: f64,
    /// Floor on move attractiveness, so no option is discarded
    /// prematurely.
    pub min_attractiveness: f64,
    /// QoR assigned to a failed synthesis run; keeps ants away from
    /// broken configurations.
    pub failure_penalty: f64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Hard cap on move epochs per iteration, treated as convergence.
    pub max_epochs: Option<u32>,
}

impl Default for AntColonyCfg {
    fn default() -> Self {
        let ants_per_pragma = 20;
        AntColonyCfg {
            ants_per_pragma,
            phero_per_move: 10.0 / ants_per_pragma as f64,
            evaporation_rate: 0.3,
            convergence_criteria: 0.7,
            end_criteria: 0.98,
            area_weight: 0.5,
            latency_weight: 0.5,
            min_attractiveness: 1.0,
            failure_penalty: 9.0,
            seed: None,
            max_epochs: None,
        }
    }
}
