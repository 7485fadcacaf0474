use tracing::trace;

use crate::model::{Identifier, Ms, Need, Span};

use super::mutations::{apply_updates, synthesize};
use super::store::{Document, Store};
use super::timeline::{Timeline, TransformationEvent};

/// Documents a placed need holds until its update or delete resolves it.
#[derive(Debug, Clone)]
pub struct NeedResource<'a> {
    pub id: Identifier,
    pub index: usize,
    pub need: &'a Need,
    pub claimed: Vec<Document>,
    /// Quantity the store could not provide when the need was applied.
    pub missing: u32,
    pub missing_time: Ms,
}

impl<'a> NeedResource<'a> {
    pub fn record(&self) -> NeedRecord<'a> {
        NeedRecord {
            id: self.id,
            index: self.index,
            need: self.need,
            missing: self.missing,
            missing_time: self.missing_time,
        }
    }
}

/// History entry of a need resource, without its documents.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedRecord<'a> {
    pub id: Identifier,
    pub index: usize,
    pub need: &'a Need,
    pub missing: u32,
    pub missing_time: Ms,
}

/// Replays a timeline against a private store, one event per step.
pub struct Simulation<'t, 'a> {
    timeline: &'t Timeline<'a>,
    store: Store,
    pending: Vec<NeedResource<'a>>,
    history: Vec<NeedRecord<'a>>,
    cursor: usize,
}

impl<'t, 'a> Simulation<'t, 'a> {
    pub fn new(timeline: &'t Timeline<'a>, store: Store) -> Self {
        Self {
            timeline,
            store,
            pending: Vec::new(),
            history: Vec::new(),
            cursor: 0,
        }
    }

    /// Apply the next event and return the sub-range it opens with the store
    /// content valid throughout it. `None` once only the final event is left.
    pub fn step(&mut self) -> Option<(Span, &Store)> {
        let timeline = self.timeline;
        let events = timeline.events();
        let (event, next) = (events.get(self.cursor)?, events.get(self.cursor + 1)?);
        self.apply(event);
        self.cursor += 1;
        trace!(
            start = event.time,
            end = next.time,
            pending = self.pending.len(),
            documents = self.store.document_count(),
            "simulation step"
        );
        Some((Span::new(event.time, next.time), &self.store))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn pending(&self) -> &[NeedResource<'a>] {
        &self.pending
    }

    pub fn history(&self) -> &[NeedRecord<'a>] {
        &self.history
    }

    // ── Event application ────────────────────────────────────

    /// Reads first, then writes. A placement starting when another ends does
    /// not see that output at the shared instant.
    fn apply(&mut self, event: &TransformationEvent<'a>) {
        self.apply_needs(event);
        self.apply_updates(event);
        self.apply_deletes(event);
        self.apply_inserts(event);
    }

    fn apply_updates(&mut self, event: &TransformationEvent<'a>) {
        for update in &event.updates {
            let (resolved, rest): (Vec<_>, Vec<_>) =
                std::mem::take(&mut self.pending).into_iter().partition(|r| {
                    r.id == update.id
                        && r.need.reference.as_deref() == Some(update.transform.reference.as_str())
                });
            self.pending = rest;

            let changes = &update.transform.update;
            for resource in resolved {
                let need = resource.need;
                let collection = &need.collection_name;
                let mutated: Vec<Document> = resource
                    .claimed
                    .into_iter()
                    .map(|doc| Document {
                        id: doc.id,
                        body: apply_updates(&doc.body, changes),
                    })
                    .collect();
                let template = match mutated.first() {
                    Some(doc) => doc.body.clone(),
                    None => synthesize(changes),
                };
                self.store.extend(collection, mutated);
                self.store
                    .insert_copies(collection, &template, resource.missing as usize);
            }
        }
    }

    fn apply_deletes(&mut self, event: &TransformationEvent<'a>) {
        for delete in &event.deletes {
            self.pending
                .retain(|r| !(r.id == delete.id && r.index == delete.index));
        }
    }

    fn apply_inserts(&mut self, event: &TransformationEvent<'a>) {
        for insert in &event.inserts {
            let insert = insert.transform;
            self.store
                .insert_copies(&insert.collection_name, &insert.doc, insert.quantity as usize);
        }
    }

    fn apply_needs(&mut self, event: &TransformationEvent<'a>) {
        for tagged in &event.needs {
            let need = tagged.transform;
            let claimed = self
                .store
                .claim(&need.collection_name, &need.find, need.quantity as usize);
            let missing = need.quantity.saturating_sub(claimed.len() as u32);
            let resource = NeedResource {
                id: tagged.id,
                index: tagged.index,
                need,
                claimed,
                missing,
                missing_time: event.time,
            };
            self.history.push(resource.record());
            self.pending.push(resource);
        }
    }
}
