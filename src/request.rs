//! One self-contained evaluation, as read from and written to JSON.

use serde::{Deserialize, Serialize};

use crate::engine::{Diagnostic, Engine, EngineError, SeedCollection, Store};
use crate::model::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    #[serde(default)]
    pub seed: Vec<SeedCollection>,
    pub horizon: Span,
    #[serde(default)]
    pub queries: Vec<Query>,
    /// Task to evaluate; must be one of `queries`.
    pub query_id: QueryId,
    #[serde(default)]
    pub potentials: Vec<Potentiality>,
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl EvaluationRequest {
    pub fn evaluate(&self) -> Result<Vec<Span>, EngineError> {
        let query = self
            .queries
            .iter()
            .find(|q| q.id == self.query_id)
            .ok_or(EngineError::UnknownQuery(self.query_id))?;
        let engine = Engine::new(Store::from_seed(&self.seed), self.horizon)?;
        engine.evaluate(&self.queries, query, &self.potentials, &self.materials)
    }

    pub fn run(&self) -> EvaluationReport {
        self.evaluate().into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EvaluationReport {
    Feasible { ranges: Vec<Span> },
    Infeasible { diagnostics: Vec<Diagnostic> },
    /// The request itself was unusable.
    Rejected { message: String },
}

impl EvaluationReport {
    pub fn is_feasible(&self) -> bool {
        matches!(self, EvaluationReport::Feasible { .. })
    }
}

impl From<Result<Vec<Span>, EngineError>> for EvaluationReport {
    fn from(result: Result<Vec<Span>, EngineError>) -> Self {
        match result {
            Ok(ranges) => EvaluationReport::Feasible { ranges },
            Err(EngineError::Unsatisfiable(diagnostics)) => {
                EvaluationReport::Infeasible { diagnostics }
            }
            Err(e) => EvaluationReport::Rejected {
                message: e.to_string(),
            },
        }
    }
}
