//! End-to-end exploration demo against a scripted synthesizer.
//!
//! Runs all three strategies over a small two-pragma library and writes
//! the result CSVs to `./demo_results/`. The evaluator is a stand-in that
//! derives metrics from the constraint instead of invoking a real tool,
//! so the demo finishes in milliseconds.
//!
//!     cargo run --example explore

use hls_dse_rs::evaluator::{Constraint, EvalResult};
use hls_dse_rs::model::QualityResult;
use hls_dse_rs::{AntColonyCfg, CsvSink, Evaluator, Explorer, PragmaLibrary};

const LIBRARY: &str = "\
# demo attribute library
attr01_main_loop unroll x1
attr01_main_loop unroll x2
attr01_main_loop unroll x4
attr02_line_buf array RAM
attr02_line_buf array EXPAND
attr02_line_buf folding keep
";

/// Scripted synthesizer: area shrinks and latency grows with looser
/// constraints, deterministically, so repeated runs agree.
struct ScriptedEvaluator {
    knob: f64,
}

impl ScriptedEvaluator {
    fn new() -> Self {
        ScriptedEvaluator { knob: 0.0 }
    }

    fn flat_record(&self, area: f64, latency: f64) -> QualityResult {
        let mut fields = vec!["x".to_string(); 3];
        fields.push(area.to_string());
        fields.extend((0..17).map(|i| (i * 2).to_string()));
        fields.push(latency.to_string());
        fields.push("0".to_string());
        fields.push("0".to_string());
        QualityResult::from_flat_record(&fields.join(","))
    }
}

impl Evaluator for ScriptedEvaluator {
    fn prepare(&mut self, _design: &str, constraint: &Constraint<'_>) -> EvalResult<()> {
        self.knob = match constraint {
            Constraint::Unconstrained => 0.0,
            // counts past the caps stop changing the metrics, which is
            // what lets the sweep finish
            Constraint::FuCount(fcnt) => {
                let caps = [3u32, 2, 2];
                let eff: u32 = fcnt
                    .iter()
                    .zip(&caps)
                    .zip(&[100u32, 10, 1])
                    .map(|((c, cap), w)| (*c).min(*cap) * w)
                    .sum();
                f64::from(eff)
            }
            Constraint::Pragmas { defines, options } => {
                defines.iter().map(|d| d.len() as f64).sum::<f64>() + options.len() as f64
            }
        };
        Ok(())
    }

    fn run(&mut self, _design: &str) -> EvalResult<QualityResult> {
        let area = 20_000.0 - 30.0 * self.knob;
        let latency = 80.0 + 2.0 * self.knob;
        Ok(self.flat_record(area, latency))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let library = PragmaLibrary::parse(LIBRARY)?;
    std::fs::create_dir_all("demo_results")?;

    let sink = CsvSink::create("demo_results/demo_FU_search_results.CSV")?;
    let mut explorer = Explorer::new("demo", ScriptedEvaluator::new(), sink);
    let summary = explorer.fu_search(1);
    println!(
        "FU sweep: {} evaluations, {} rows",
        summary.evaluations, summary.recorded
    );

    let sink = CsvSink::create("demo_results/demo_exh_pragma_search_results.CSV")?;
    let mut explorer = Explorer::new("demo", ScriptedEvaluator::new(), sink);
    let summary = explorer.pragma_search(&library, 1)?;
    println!(
        "pragma sweep: {} evaluations, {} rows",
        summary.evaluations, summary.recorded
    );

    let cfg = AntColonyCfg {
        seed: Some(42),
        max_epochs: Some(50),
        ..AntColonyCfg::default()
    };
    let sink = CsvSink::create("demo_results/demo_ant_search_results.CSV")?;
    let mut explorer = Explorer::new("demo", ScriptedEvaluator::new(), sink);
    let summary = explorer.ant_search(&library, &cfg, 2)?;
    println!(
        "ant colony: {} evaluations, {} rows",
        summary.evaluations, summary.recorded
    );

    Ok(())
}
