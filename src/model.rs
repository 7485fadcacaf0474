use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timeline instant. The engine only compares and subtracts these.
pub type Ms = i64;

pub type QueryId = u64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    /// Zero-length marker meaning "no feasible placement".
    pub const SENTINEL: Span = Span { start: 0, end: 0 };

    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Pull an instant into `[start, end]`.
    pub fn clamp(&self, t: Ms) -> Ms {
        t.clamp(self.start, self.end)
    }
}

// ── Transformations ──────────────────────────────────────────────

fn match_all() -> Value {
    Value::Object(Default::default())
}

fn one() -> u32 {
    1
}

/// Read dependency on documents of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Need {
    pub collection_name: String,
    #[serde(default = "match_all")]
    pub find: Value,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Unflagged needs are always satisfied.
    #[serde(default)]
    pub wait: bool,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insert {
    pub collection_name: String,
    pub doc: Value,
    #[serde(default = "one")]
    pub quantity: u32,
    /// A flagged insert must be consumed by another task's need.
    #[serde(default)]
    pub wait: bool,
}

/// Rewrites the documents claimed by the need carrying the same `ref`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub update: Vec<FieldUpdate>,
    #[serde(default)]
    pub wait: bool,
}

/// One mutation of a document field, addressed by a dotted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum FieldUpdate {
    Set { property: String, value: Value },
    /// Append to the array at `property`.
    Push { property: String, value: Value },
    /// Remove the first array element equal to `value`.
    Delete { property: String, value: Value },
}

/// Removal of the documents claimed by need `need` once no update claims them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delete {
    pub need: usize,
    pub collection_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    #[serde(default)]
    pub needs: Vec<Need>,
    #[serde(default)]
    pub updates: Vec<Update>,
    #[serde(default)]
    pub inserts: Vec<Insert>,
}

impl Transformation {
    /// Needs whose `ref` no update claims consume their documents.
    pub fn deletes(&self) -> Vec<Delete> {
        self.needs
            .iter()
            .enumerate()
            .filter(|(_, need)| {
                !need.reference.as_deref().is_some_and(|r| {
                    self.updates.iter().any(|u| u.reference == r)
                })
            })
            .map(|(need, n)| Delete {
                need,
                collection_name: n.collection_name.clone(),
            })
            .collect()
    }
}

/// Any single transform, for satisfaction records and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Transform {
    Need(Need),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Transform {
    /// Updates name their collection through the referenced need, so they have none here.
    pub fn collection_name(&self) -> Option<&str> {
        match self {
            Transform::Need(n) => Some(&n.collection_name),
            Transform::Insert(i) => Some(&i.collection_name),
            Transform::Delete(d) => Some(&d.collection_name),
            Transform::Update(_) => None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        match self {
            Transform::Need(n) => n.wait,
            Transform::Insert(i) => i.wait,
            Transform::Update(u) => u.wait,
            Transform::Delete(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: QueryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transforms: Option<Transformation>,
}

// ── Placements ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDuration {
    pub min: Ms,
    pub target: Ms,
}

/// Candidate placements of a task, not yet committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Potentiality {
    pub query_id: QueryId,
    #[serde(default)]
    pub potential_id: u64,
    pub duration: TimeDuration,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub is_splittable: bool,
    pub places: Vec<Span>,
}

/// A committed placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub query_id: QueryId,
    #[serde(default)]
    pub material_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_id: Option<u64>,
    pub start: Ms,
    pub end: Ms,
}

impl Material {
    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Source {
    #[serde(rename_all = "camelCase")]
    Potential { potential_id: u64 },
    #[serde(rename_all = "camelCase")]
    Material {
        material_id: u64,
        split_id: Option<u64>,
    },
}

/// Traces a transform back to the task, placement and slot it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub query: QueryId,
    pub source: Source,
    pub place: usize,
}

impl Identifier {
    pub fn potential(query: QueryId, potential_id: u64, place: usize) -> Self {
        Self {
            query,
            source: Source::Potential { potential_id },
            place,
        }
    }

    pub fn material(query: QueryId, material_id: u64, split_id: Option<u64>) -> Self {
        Self {
            query,
            source: Source::Material {
                material_id,
                split_id,
            },
            place: 0,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Source::Potential { potential_id } => {
                write!(f, "query {} potential {} place {}", self.query, potential_id, self.place)
            }
            Source::Material {
                material_id,
                split_id: Some(split),
            } => write!(f, "query {} material {} split {}", self.query, material_id, split),
            Source::Material { material_id, .. } => {
                write!(f, "query {} material {}", self.query, material_id)
            }
        }
    }
}

// ── Satisfaction records ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SatisfactionStatus {
    /// Unflagged output: no restriction.
    Unrestricted,
    /// Flagged output nobody needs.
    Unconsumed,
    Consumed { consumer: Identifier },
}

/// Where in the horizon an output of the evaluated task may happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSatisfaction {
    pub ranges: Vec<Span>,
    pub transform: Transform,
    pub status: SatisfactionStatus,
}

impl TransformSatisfaction {
    pub fn unrestricted(horizon: Span, transform: Transform) -> Self {
        Self {
            ranges: vec![horizon],
            transform,
            status: SatisfactionStatus::Unrestricted,
        }
    }

    pub fn unconsumed(transform: Transform) -> Self {
        Self {
            ranges: vec![Span::SENTINEL],
            transform,
            status: SatisfactionStatus::Unconsumed,
        }
    }

    pub fn consumed(ranges: Vec<Span>, transform: Transform, consumer: Identifier) -> Self {
        Self {
            ranges,
            transform,
            status: SatisfactionStatus::Consumed { consumer },
        }
    }
}
