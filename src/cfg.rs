use crate::evaluator::PluginEvaluator;
use crate::stage::cfg::AntColonyCfg;
use crate::DseError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One exploration run, as read from a YAML config file.
#[derive(Serialize, Deserialize)]
pub struct DseCfg {
    /// Design under exploration; the attribute library and result files
    /// are named after it.
    pub design: String,
    pub library_path: String,
    pub results_dir: String,
    pub ant: AntColonyCfg,
}

impl DseCfg {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<DseCfg, DseError> {
        let cfg_str = std::fs::read_to_string(path)?;
        let cfg: DseCfg = serde_yaml::from_str(&cfg_str)?;
        Ok(cfg)
    }

    pub fn fu_results_file(&self) -> PathBuf {
        PathBuf::from(&self.results_dir).join(format!("{}_FU_search_results.CSV", self.design))
    }

    pub fn pragma_results_file(&self) -> PathBuf {
        PathBuf::from(&self.results_dir)
            .join(format!("{}_exh_pragma_search_results.CSV", self.design))
    }

    /// Ant colony result files carry the hyperparameters that produced
    /// them, so runs with different tunings stay apart.
    pub fn ant_results_file(&self) -> PathBuf {
        PathBuf::from(&self.results_dir).join(format!(
            "{}_ant_{}_evap-{}_end-{}.CSV",
            self.design, self.ant.ants_per_pragma, self.ant.evaporation_rate, self.ant.end_criteria
        ))
    }
}

/// Where to find the synthesizer adapter shared object.
#[derive(Serialize, Deserialize)]
pub struct EvaluatorPluginCfg {
    pub plugin_path: String,
}

impl EvaluatorPluginCfg {
    /// Read the plugin config and load the evaluator it points at.
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<PluginEvaluator, DseError> {
        let cfg_str = std::fs::read_to_string(path)?;
        let plg_cfg: EvaluatorPluginCfg = serde_yaml::from_str(&cfg_str)?;
        PluginEvaluator::load(&plg_cfg.plugin_path)
    }
}
