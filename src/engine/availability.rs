use crate::model::*;

use super::error::{Diagnostic, EngineError};
use super::satisfaction::NeedSweep;

// ── Result composition ────────────────────────────────────────────

/// Intersect eligible need ranges with every output window.
///
/// Succeeds with the feasible ranges, boundaries kept as the intersection
/// produced them. Fails with every unmet need and every restricted output.
pub fn compose(
    horizon: Span,
    sweep: &NeedSweep<'_>,
    outputs: Vec<TransformSatisfaction>,
) -> Result<Vec<Span>, EngineError> {
    let windows = outputs
        .iter()
        .fold(vec![horizon], |acc, s| intersect_intervals(&acc, &s.ranges));
    let feasible = intersect_intervals(&sweep.eligible(), &windows);
    if !feasible.is_empty() {
        return Ok(feasible);
    }

    let mut diagnostics: Vec<Diagnostic> = sweep
        .unmet()
        .map(|(span, need)| Diagnostic::NeedUnmet {
            span,
            need: need.clone(),
        })
        .collect();
    diagnostics.extend(outputs.into_iter().filter_map(|s| match s.status {
        SatisfactionStatus::Unrestricted => None,
        SatisfactionStatus::Unconsumed => Some(Diagnostic::OutputUnconsumed {
            ranges: s.ranges,
            transform: s.transform,
        }),
        SatisfactionStatus::Consumed { consumer } => Some(Diagnostic::OutputDeadlineUnreachable {
            ranges: s.ranges,
            transform: s.transform,
            consumer,
        }),
    }));
    Err(EngineError::Unsatisfiable(diagnostics))
}

// ── Interval algebra ──────────────────────────────────────────────

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted.iter().filter(|s| !s.is_empty()) {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// Two-pointer intersection of two sorted, disjoint lists. Empty pieces are dropped.
pub fn intersect_intervals(a: &[Span], b: &[Span]) -> Vec<Span> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            result.push(Span::new(start, end));
        }
        if a[i].end < b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}
