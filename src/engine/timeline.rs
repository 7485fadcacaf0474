use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::limits::MAX_TIMELINE_EVENTS;
use crate::model::*;

use super::EngineError;

/// A transform together with the placement slot it came from and its index
/// inside the originating transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub id: Identifier,
    pub index: usize,
    pub transform: T,
}

/// Everything that happens at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationEvent<'a> {
    pub time: Ms,
    pub needs: Vec<Tagged<&'a Need>>,
    pub updates: Vec<Tagged<&'a Update>>,
    pub inserts: Vec<Tagged<&'a Insert>>,
    pub deletes: Vec<Tagged<Delete>>,
}

impl<'a> TransformationEvent<'a> {
    pub fn at(time: Ms) -> Self {
        Self {
            time,
            needs: Vec::new(),
            updates: Vec::new(),
            inserts: Vec::new(),
            deletes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
            && self.updates.is_empty()
            && self.inserts.is_empty()
            && self.deletes.is_empty()
    }

    fn push_reads(&mut self, id: Identifier, transformation: &'a Transformation) {
        self.needs.extend(
            transformation
                .needs
                .iter()
                .enumerate()
                .map(|(index, transform)| Tagged { id, index, transform }),
        );
    }

    fn push_writes(&mut self, id: Identifier, transformation: &'a Transformation) {
        self.updates.extend(
            transformation
                .updates
                .iter()
                .enumerate()
                .map(|(index, transform)| Tagged { id, index, transform }),
        );
        self.inserts.extend(
            transformation
                .inserts
                .iter()
                .enumerate()
                .map(|(index, transform)| Tagged { id, index, transform }),
        );
        self.deletes.extend(transformation.deletes().into_iter().map(|d| Tagged {
            id,
            index: d.need,
            transform: d,
        }));
    }
}

/// Strictly increasing events over a horizon, plus the slack of every placement slot.
#[derive(Debug)]
pub struct Timeline<'a> {
    events: Vec<TransformationEvent<'a>>,
    slack: HashMap<Identifier, Ms>,
}

impl<'a> Timeline<'a> {
    pub fn build(
        horizon: Span,
        queries: &'a [Query],
        potentials: &[Potentiality],
        materials: &[Material],
    ) -> Result<Self, EngineError> {
        let by_id: HashMap<QueryId, &'a Query> = queries.iter().map(|q| (q.id, q)).collect();
        let mut builder = Builder {
            horizon,
            events: BTreeMap::new(),
            slack: HashMap::new(),
        };
        builder.event(horizon.start);
        builder.event(horizon.end);

        for potential in potentials {
            let query = by_id
                .get(&potential.query_id)
                .copied()
                .ok_or(EngineError::UnknownQuery(potential.query_id))?;
            for (place, span) in potential.places.iter().enumerate() {
                let id = Identifier::potential(query.id, potential.potential_id, place);
                let slack = span
                    .duration_ms()
                    .saturating_sub(potential.duration.min)
                    .max(0);
                builder.record_slack(id, slack);
                builder.place(id, *span, query.transforms.as_ref());
            }
        }
        for material in materials {
            let query = by_id
                .get(&material.query_id)
                .copied()
                .ok_or(EngineError::UnknownQuery(material.query_id))?;
            let id = Identifier::material(query.id, material.material_id, material.split_id);
            builder.record_slack(id, 0);
            builder.place(id, material.span(), query.transforms.as_ref());
        }

        if builder.events.len() > MAX_TIMELINE_EVENTS {
            return Err(EngineError::LimitExceeded("too many timeline events"));
        }
        trace!(events = builder.events.len(), "timeline built");
        Ok(Self {
            events: builder.events.into_values().collect(),
            slack: builder.slack,
        })
    }

    pub fn events(&self) -> &[TransformationEvent<'a>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// How far the slot may move its end earlier. Unknown slots have none.
    pub fn shrink_space(&self, id: &Identifier) -> Ms {
        self.slack.get(id).copied().unwrap_or(0)
    }
}

struct Builder<'a> {
    horizon: Span,
    events: BTreeMap<Ms, TransformationEvent<'a>>,
    slack: HashMap<Identifier, Ms>,
}

impl<'a> Builder<'a> {
    fn event(&mut self, time: Ms) -> &mut TransformationEvent<'a> {
        self.events
            .entry(time)
            .or_insert_with(|| TransformationEvent::at(time))
    }

    fn record_slack(&mut self, id: Identifier, slack: Ms) {
        self.slack
            .entry(id)
            .and_modify(|s| *s = (*s).min(slack))
            .or_insert(slack);
    }

    /// Reads at the slot start, writes at its end. Tasks without transforms add nothing.
    fn place(&mut self, id: Identifier, span: Span, transformation: Option<&'a Transformation>) {
        let Some(transformation) = transformation else {
            return;
        };
        let start = self.horizon.clamp(span.start);
        let end = self.horizon.clamp(span.end);
        self.event(start).push_reads(id, transformation);
        self.event(end).push_writes(id, transformation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(id: QueryId, transforms: serde_json::Value) -> Query {
        serde_json::from_value(json!({ "id": id, "transforms": transforms })).unwrap()
    }

    fn potential(query_id: QueryId, min: Ms, places: &[(Ms, Ms)]) -> Potentiality {
        Potentiality {
            query_id,
            potential_id: 0,
            duration: TimeDuration { min, target: min },
            pressure: 0.0,
            is_splittable: false,
            places: places.iter().map(|&(s, e)| Span::new(s, e)).collect(),
        }
    }

    fn material(query_id: QueryId, start: Ms, end: Ms) -> Material {
        Material {
            query_id,
            material_id: 0,
            split_id: None,
            start,
            end,
        }
    }

    fn times(timeline: &Timeline) -> Vec<Ms> {
        timeline.events().iter().map(|e| e.time).collect()
    }

    #[test]
    fn boundaries_only_without_placements() {
        let timeline = Timeline::build(Span::new(0, 10), &[], &[], &[]).unwrap();
        assert_eq!(times(&timeline), vec![0, 10]);
        assert!(timeline.events().iter().all(TransformationEvent::is_empty));
    }

    #[test]
    fn reads_at_start_writes_at_end() {
        let queries = vec![query(
            1,
            json!({
                "needs": [{ "collectionName": "a" }],
                "inserts": [{ "collectionName": "b", "doc": {} }]
            }),
        )];
        let timeline =
            Timeline::build(Span::new(0, 10), &queries, &[], &[material(1, 2, 3)]).unwrap();
        assert_eq!(times(&timeline), vec![0, 2, 3, 10]);
        let events = timeline.events();
        assert_eq!(events[1].needs.len(), 1);
        assert!(events[1].inserts.is_empty());
        assert_eq!(events[2].inserts.len(), 1);
        // the need has no ref, so it is deleted at the end
        assert_eq!(events[2].deletes.len(), 1);
        assert_eq!(events[2].deletes[0].index, 0);
        assert_eq!(events[2].inserts[0].id, Identifier::material(1, 0, None));
    }

    #[test]
    fn same_instant_events_merge() {
        let queries = vec![
            query(1, json!({ "inserts": [{ "collectionName": "b", "doc": {} }] })),
            query(2, json!({ "needs": [{ "collectionName": "b" }] })),
        ];
        let timeline = Timeline::build(
            Span::new(0, 10),
            &queries,
            &[],
            &[material(1, 1, 4), material(2, 4, 6)],
        )
        .unwrap();
        assert_eq!(times(&timeline), vec![0, 1, 4, 6, 10]);
        let at4 = &timeline.events()[2];
        assert_eq!(at4.inserts.len(), 1);
        assert_eq!(at4.needs.len(), 1);
    }

    #[test]
    fn placements_clamped_into_horizon() {
        let queries = vec![query(1, json!({ "needs": [{ "collectionName": "a" }] }))];
        let timeline =
            Timeline::build(Span::new(0, 10), &queries, &[], &[material(1, -5, 20)]).unwrap();
        assert_eq!(times(&timeline), vec![0, 10]);
        assert_eq!(timeline.events()[0].needs.len(), 1);
        assert_eq!(timeline.events()[1].deletes.len(), 1);
    }

    #[test]
    fn tasks_without_transforms_add_no_events() {
        let queries = vec![Query {
            id: 1,
            name: None,
            transforms: None,
        }];
        let timeline = Timeline::build(
            Span::new(0, 10),
            &queries,
            &[potential(1, 1, &[(2, 5)])],
            &[material(1, 3, 4)],
        )
        .unwrap();
        assert_eq!(times(&timeline), vec![0, 10]);
    }

    #[test]
    fn empty_transformation_still_marks_instants() {
        let queries = vec![query(1, json!({}))];
        let timeline =
            Timeline::build(Span::new(0, 10), &queries, &[], &[material(1, 3, 4)]).unwrap();
        assert_eq!(times(&timeline), vec![0, 3, 4, 10]);
    }

    #[test]
    fn unknown_query_is_rejected() {
        let err = Timeline::build(Span::new(0, 10), &[], &[], &[material(9, 1, 2)]).unwrap_err();
        assert!(matches!(err, EngineError::UnknownQuery(9)));
    }

    #[test]
    fn shrink_space_per_slot() {
        let queries = vec![query(1, json!({}))];
        let timeline = Timeline::build(
            Span::new(0, 100),
            &queries,
            &[potential(1, 3, &[(0, 10), (20, 22)])],
            &[material(1, 40, 50)],
        )
        .unwrap();
        assert_eq!(timeline.shrink_space(&Identifier::potential(1, 0, 0)), 7);
        assert_eq!(timeline.shrink_space(&Identifier::potential(1, 0, 1)), 0);
        assert_eq!(timeline.shrink_space(&Identifier::material(1, 0, None)), 0);
        assert_eq!(timeline.shrink_space(&Identifier::potential(5, 0, 0)), 0);
    }

    #[test]
    fn duplicate_slot_keeps_smaller_slack() {
        let queries = vec![query(1, json!({}))];
        let timeline = Timeline::build(
            Span::new(0, 100),
            &queries,
            &[potential(1, 1, &[(0, 10)]), potential(1, 1, &[(0, 4)])],
            &[],
        )
        .unwrap();
        assert_eq!(timeline.shrink_space(&Identifier::potential(1, 0, 0)), 3);
    }
}
