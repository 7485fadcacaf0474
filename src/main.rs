use std::io::Read;
use std::process::ExitCode;

use tracing::{info, warn};

use userstate::config::Config;
use userstate::request::{EvaluationReport, EvaluationRequest};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::from_env();
    userstate::logging::init(config.log_level);

    let raw = match &config.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request: EvaluationRequest = serde_json::from_str(&raw)?;
    info!(
        query = request.query_id,
        queries = request.queries.len(),
        potentials = request.potentials.len(),
        materials = request.materials.len(),
        "evaluating"
    );

    let report = request.run();
    let out = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");

    match &report {
        EvaluationReport::Feasible { ranges } => info!("feasible over {} ranges", ranges.len()),
        EvaluationReport::Infeasible { diagnostics } => {
            warn!("infeasible: {} diagnostics", diagnostics.len())
        }
        EvaluationReport::Rejected { message } => warn!("rejected: {message}"),
    }
    Ok(if report.is_feasible() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
