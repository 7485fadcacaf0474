mod availability;
mod consumers;
mod error;
mod mutations;
mod satisfaction;
mod simulation;
mod store;
mod timeline;
mod validate;

pub use availability::{compose, intersect_intervals, merge_overlapping};
pub use consumers::{group_need_resources, GroupNeedResource, OutputMatcher};
pub use error::{Diagnostic, EngineError};
pub use mutations::{apply_updates, synthesize};
pub use satisfaction::{NeedSatisfaction, NeedSweep, RangeNeedSatisfaction};
pub use simulation::{NeedRecord, NeedResource, Simulation};
pub use store::{Document, InMemoryStore, SeedCollection, Store};
pub use timeline::{Tagged, Timeline, TransformationEvent};

use std::time::Instant;

use tracing::debug;

use crate::model::*;
use crate::observability;

/// Evaluates tasks against a fixed seed store and horizon.
///
/// Immutable once built. Every evaluation replays its own copy of the seed,
/// so one engine can be shared between threads.
#[derive(Debug, Clone)]
pub struct Engine {
    seed: Store,
    horizon: Span,
}

impl Engine {
    pub fn new(seed: Store, horizon: Span) -> Result<Self, EngineError> {
        validate::validate_horizon(&horizon)?;
        Ok(Self { seed, horizon })
    }

    /// Sub-ranges of the horizon where `query` has all its dependencies met,
    /// given where every other task may be or is placed.
    pub fn evaluate(
        &self,
        queries: &[Query],
        query: &Query,
        potentials: &[Potentiality],
        materials: &[Material],
    ) -> Result<Vec<Span>, EngineError> {
        let started = Instant::now();
        let result = self.evaluate_inner(queries, query, potentials, materials);

        metrics::histogram!(observability::EVALUATION_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::counter!(
            observability::EVALUATIONS_TOTAL,
            "outcome" => observability::outcome_label(&result)
        )
        .increment(1);
        if let Err(EngineError::Unsatisfiable(diagnostics)) = &result {
            for diagnostic in diagnostics {
                metrics::counter!(observability::DIAGNOSTICS_TOTAL, "kind" => diagnostic.kind())
                    .increment(1);
            }
        }
        result
    }

    fn evaluate_inner(
        &self,
        queries: &[Query],
        query: &Query,
        potentials: &[Potentiality],
        materials: &[Material],
    ) -> Result<Vec<Span>, EngineError> {
        let Some(transformation) = &query.transforms else {
            debug!(query = query.id, "no transformation, whole horizon");
            return Ok(vec![self.horizon]);
        };

        validate::validate_placements(potentials, materials)?;
        validate::validate_quantities(
            queries
                .iter()
                .filter_map(|q| q.transforms.as_ref())
                .chain(std::iter::once(transformation)),
        )?;

        let timeline = Timeline::build(self.horizon, queries, potentials, materials)?;
        metrics::histogram!(observability::TIMELINE_EVENTS).record(timeline.len() as f64);

        let mut simulation = Simulation::new(&timeline, self.seed.clone());
        let sweep = NeedSweep::run(&mut simulation, &transformation.needs);
        let groups = group_need_resources(simulation.history(), query.id);

        let mut matcher = OutputMatcher::new(self.horizon, groups, &timeline);
        let outputs = matcher.satisfy(transformation, &sweep);

        let result = compose(self.horizon, &sweep, outputs);
        match &result {
            Ok(ranges) => debug!(
                query = query.id,
                events = timeline.len(),
                ranges = ranges.len(),
                "evaluation feasible"
            ),
            Err(EngineError::Unsatisfiable(diagnostics)) => debug!(
                query = query.id,
                events = timeline.len(),
                diagnostics = diagnostics.len(),
                "evaluation infeasible"
            ),
            Err(_) => {}
        }
        result
    }
}
