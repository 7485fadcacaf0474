use crate::engine::EngineError;

// ── Evaluation metrics ──────────────────────────────────────────

/// Counter: evaluations run. Labels: outcome.
pub const EVALUATIONS_TOTAL: &str = "userstate_evaluations_total";

/// Histogram: evaluation latency in seconds.
pub const EVALUATION_DURATION_SECONDS: &str = "userstate_evaluation_duration_seconds";

/// Histogram: merged events per timeline.
pub const TIMELINE_EVENTS: &str = "userstate_timeline_events";

/// Counter: diagnostics reported by infeasible evaluations. Labels: kind.
pub const DIAGNOSTICS_TOTAL: &str = "userstate_diagnostics_total";

/// Map an evaluation result to a short label for metrics.
pub fn outcome_label<T>(result: &Result<T, EngineError>) -> &'static str {
    match result {
        Ok(_) => "feasible",
        Err(EngineError::Unsatisfiable(_)) => "infeasible",
        Err(EngineError::UnknownQuery(_)) => "unknown_query",
        Err(EngineError::InvalidSpan(_)) => "invalid_span",
        Err(EngineError::LimitExceeded(_)) => "limit_exceeded",
    }
}
