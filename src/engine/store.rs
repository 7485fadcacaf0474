use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::filter;

/// A stored document. The id only tracks identity across claim and reinsert.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Ulid,
    pub body: Value,
}

impl Document {
    pub fn new(body: Value) -> Self {
        Self {
            id: Ulid::new(),
            body,
        }
    }
}

/// Pre-existing documents of one collection, as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCollection {
    pub collection_name: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Collection name → documents in insertion order. Owned by one simulation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: BTreeMap<String, Vec<Document>>,
}

pub type Store = InMemoryStore;

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &[SeedCollection]) -> Self {
        let mut store = Self::new();
        for collection in seed {
            store.extend(
                &collection.collection_name,
                collection.data.iter().cloned().map(Document::new),
            );
        }
        store
    }

    // ── Inspection ───────────────────────────────────────────

    pub fn document_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.document_count() == 0
    }

    /// Documents of `collection` matching `filter`, in insertion order.
    pub fn find<'a>(
        &'a self,
        collection: &str,
        filter: &'a Value,
    ) -> impl Iterator<Item = &'a Document> + use<'a> {
        self.collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(move |doc| filter::matches(&doc.body, filter))
    }

    // ── Mutation ─────────────────────────────────────────────

    /// Remove and return up to `quantity` matching documents.
    pub fn claim(&mut self, collection: &str, filter: &Value, quantity: usize) -> Vec<Document> {
        let Some(docs) = self.collections.get_mut(collection) else {
            return Vec::new();
        };
        let mut claimed = Vec::new();
        let mut i = 0;
        while i < docs.len() && claimed.len() < quantity {
            if filter::matches(&docs[i].body, filter) {
                claimed.push(docs.remove(i));
            } else {
                i += 1;
            }
        }
        claimed
    }

    pub fn insert(&mut self, collection: &str, doc: Document) {
        self.collection_mut(collection).push(doc);
    }

    pub fn extend(&mut self, collection: &str, docs: impl IntoIterator<Item = Document>) {
        self.collection_mut(collection).extend(docs);
    }

    /// Insert `copies` fresh documents built from `body`. The template is cloned, never moved.
    pub fn insert_copies(&mut self, collection: &str, body: &Value, copies: usize) {
        if copies == 0 {
            return;
        }
        self.extend(
            collection,
            std::iter::repeat_with(|| Document::new(body.clone())).take(copies),
        );
    }

    fn collection_mut(&mut self, collection: &str) -> &mut Vec<Document> {
        self.collections.entry(collection.to_string()).or_default()
    }
}
