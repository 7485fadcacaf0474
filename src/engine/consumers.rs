use std::collections::HashMap;

use serde_json::Value;

use crate::filter;
use crate::model::*;

use super::mutations::apply_updates;
use super::satisfaction::NeedSweep;
use super::simulation::NeedRecord;
use super::timeline::Timeline;

/// History records of one need of one placement, all slots together.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNeedResource<'a> {
    pub query: QueryId,
    pub source: Source,
    pub index: usize,
    pub need: &'a Need,
    /// Slots that ran short, in history order.
    pub ids: Vec<Identifier>,
    pub missing_times: Vec<Ms>,
    pub missing: u32,
}

/// Group the simulation history, leaving out the evaluated task's own needs.
pub fn group_need_resources<'a>(
    history: &[NeedRecord<'a>],
    evaluated: QueryId,
) -> Vec<GroupNeedResource<'a>> {
    let mut groups: Vec<GroupNeedResource<'a>> = Vec::new();
    let mut positions: HashMap<(QueryId, Source, usize), usize> = HashMap::new();

    for record in history.iter().filter(|r| r.id.query != evaluated) {
        let key = (record.id.query, record.id.source, record.index);
        let pos = *positions.entry(key).or_insert_with(|| {
            groups.push(GroupNeedResource {
                query: record.id.query,
                source: record.id.source,
                index: record.index,
                need: record.need,
                ids: Vec::new(),
                missing_times: Vec::new(),
                missing: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[pos];
        group.missing = group.missing.max(record.missing);
        if record.missing > 0 {
            group.ids.push(record.id);
            group.missing_times.push(record.missing_time);
        }
    }
    groups
}

struct Candidate<'a> {
    group: GroupNeedResource<'a>,
    /// Missing times pushed back by each slot's slack, ascending.
    deadlines: Vec<Ms>,
}

/// Hands the evaluated task's wait-flagged outputs to other tasks' unmet needs.
pub struct OutputMatcher<'a> {
    horizon: Span,
    candidates: Vec<Candidate<'a>>,
}

impl<'a> OutputMatcher<'a> {
    pub fn new(horizon: Span, groups: Vec<GroupNeedResource<'a>>, timeline: &Timeline<'_>) -> Self {
        let candidates = groups
            .into_iter()
            .map(|group| {
                let mut deadlines: Vec<Ms> = group
                    .ids
                    .iter()
                    .zip(&group.missing_times)
                    .map(|(id, &time)| time.saturating_add(timeline.shrink_space(id)))
                    .collect();
                deadlines.sort_unstable();
                Candidate { group, deadlines }
            })
            .collect();
        Self {
            horizon,
            candidates,
        }
    }

    /// Remaining unmet quantity per group, in history order.
    pub fn missing(&self) -> Vec<u32> {
        self.candidates.iter().map(|c| c.group.missing).collect()
    }

    /// Satisfactions of every update and insert: inserts first, then updates.
    /// Updates are matched before inserts.
    pub fn satisfy(
        &mut self,
        transformation: &Transformation,
        sweep: &NeedSweep<'_>,
    ) -> Vec<TransformSatisfaction> {
        let mut updates = Vec::new();
        for update in &transformation.updates {
            let transform = Transform::Update(update.clone());
            let referenced = if transform.is_waiting() {
                sweep.referenced(&update.reference)
            } else {
                None
            };
            let Some((need, docs)) = referenced else {
                updates.push(TransformSatisfaction::unrestricted(self.horizon, transform));
                continue;
            };
            for doc in docs {
                let output = apply_updates(doc, &update.update);
                updates.push(self.consume(&need.collection_name, &output, transform.clone()));
            }
        }

        let mut inserts = Vec::new();
        for insert in &transformation.inserts {
            let transform = Transform::Insert(insert.clone());
            if !transform.is_waiting() {
                inserts.push(TransformSatisfaction::unrestricted(self.horizon, transform));
                continue;
            }
            for _ in 0..insert.quantity {
                inserts.push(self.consume(&insert.collection_name, &insert.doc, transform.clone()));
            }
        }

        inserts.extend(updates);
        inserts
    }

    /// Take one unit from the group whose latest deadline comes first.
    fn consume(&mut self, collection: &str, doc: &Value, transform: Transform) -> TransformSatisfaction {
        let horizon = self.horizon;
        let chosen = self
            .candidates
            .iter_mut()
            .filter(|c| {
                c.group.missing > 0
                    && c.group.need.collection_name == collection
                    && filter::matches(doc, &c.group.need.find)
            })
            // ties keep the group recorded first
            .min_by_key(|c| c.deadlines.last().copied().unwrap_or(Ms::MAX));

        if let Some(candidate) = chosen
            && let Some(&consumer) = candidate.group.ids.first()
        {
            candidate.group.missing -= 1;
            let ranges = stepped_ranges(horizon, &candidate.deadlines);
            return TransformSatisfaction::consumed(ranges, transform, consumer);
        }
        TransformSatisfaction::unconsumed(transform)
    }
}

/// Consecutive pairs of `[horizon.start, deadlines…]`, clamped, zero-length pairs dropped.
fn stepped_ranges(horizon: Span, deadlines: &[Ms]) -> Vec<Span> {
    let bounds: Vec<Ms> = std::iter::once(horizon.start)
        .chain(deadlines.iter().map(|&d| horizon.clamp(d)))
        .collect();
    let ranges: Vec<Span> = bounds
        .windows(2)
        .filter(|w| w[0] < w[1])
        .map(|w| Span::new(w[0], w[1]))
        .collect();
    if ranges.is_empty() {
        vec![Span::new(horizon.start, horizon.start)]
    } else {
        ranges
    }
}
