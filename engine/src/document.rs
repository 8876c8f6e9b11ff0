//! The synchronized document and its records.
//!
//! A [`Document`] is the unit of synchronization: four id-keyed collections,
//! a session-local role tag and a whole-document version stamp.
//!
//! Records keep fields they do not know about in `extra`, so a document
//! written by a newer client passes through merges without losing data.

use crate::{RecordId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Display name used when a reference does not resolve.
pub const UNKNOWN: &str = "unknown";

/// A record addressable by its id within a collection.
pub trait Keyed {
    fn id(&self) -> &str;
}

/// An unordered set of records keyed by id.
///
/// Backed by a `BTreeMap` so serialization order is deterministic. On the
/// wire a collection is a plain JSON array; when decoding, a repeated id
/// keeps its last occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    records: BTreeMap<RecordId, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<T: Keyed> Collection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.get(id)
    }

    /// Check if a record with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Insert or replace a record, returning the replaced one.
    pub fn insert(&mut self, record: T) -> Option<T> {
        self.records.insert(record.id().to_string(), record)
    }

    /// Remove a record by id.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.records.remove(id)
    }

    /// Keep only the records matching the predicate. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| keep(record));
        before - self.records.len()
    }

    /// Iterate records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    /// Iterate ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Keyed + Clone> Collection<T> {
    /// Union with `other`, keeping this collection's record for shared ids.
    pub fn union_preferring(&self, other: &Collection<T>) -> Collection<T> {
        let mut merged = other.clone();
        for record in self.iter() {
            merged.insert(record.clone());
        }
        merged
    }
}

impl<T: Keyed> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for record in iter {
            collection.insert(record);
        }
        collection
    }
}

impl<T: Serialize> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.values())
    }
}

impl<'de, T: Deserialize<'de> + Keyed> Deserialize<'de> for Collection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<T>::deserialize(deserializer)?;
        Ok(records.into_iter().collect())
    }
}

/// A tracked worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Fields written by other clients, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: None,
            created_at: None,
            extra: Map::new(),
        }
    }
}

/// A unit of work performed by a person in a service category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub person_id: RecordId,
    pub service_category_id: RecordId,
    #[serde(default)]
    pub description: String,
    /// Calendar day, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Fields written by other clients, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_quantity() -> u32 {
    1
}

impl Task {
    pub fn new(
        id: impl Into<RecordId>,
        person_id: impl Into<RecordId>,
        service_category_id: impl Into<RecordId>,
        description: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            person_id: person_id.into(),
            service_category_id: service_category_id.into(),
            description: description.into(),
            date: date.into(),
            quantity: 1,
            duration_minutes: None,
            notes: None,
            extra: Map::new(),
        }
    }
}

/// Kind of a recorded occurrence.
///
/// Unrecognized kinds decode as [`ParticularityKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParticularityKind {
    Absence,
    Delay,
    Overtime,
    Incident,
    Other,
}

impl ParticularityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticularityKind::Absence => "absence",
            ParticularityKind::Delay => "delay",
            ParticularityKind::Overtime => "overtime",
            ParticularityKind::Incident => "incident",
            ParticularityKind::Other => "other",
        }
    }
}

impl From<String> for ParticularityKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "absence" => ParticularityKind::Absence,
            "delay" => ParticularityKind::Delay,
            "overtime" => ParticularityKind::Overtime,
            "incident" => ParticularityKind::Incident,
            _ => ParticularityKind::Other,
        }
    }
}

impl From<ParticularityKind> for String {
    fn from(kind: ParticularityKind) -> Self {
        kind.as_str().to_string()
    }
}

/// An occurrence or event attached to a person (absence, delay, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Particularity {
    pub id: RecordId,
    pub person_id: RecordId,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ParticularityKind,
    #[serde(default)]
    pub description: String,
    /// Fields written by other clients, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Particularity {
    pub fn new(
        id: impl Into<RecordId>,
        person_id: impl Into<RecordId>,
        kind: ParticularityKind,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            person_id: person_id.into(),
            date: date.into(),
            kind,
            description: String::new(),
            extra: Map::new(),
        }
    }
}

/// A category tasks are filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategory {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Fields written by other clients, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceCategory {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
            extra: Map::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_keyed!(Person, Task, Particularity, ServiceCategory);

/// Session access level. Never synchronized to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full read/write access
    Admin,
    /// Read-only access
    Viewer,
}

impl UserRole {
    pub fn can_write(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// The four synchronized collections, without version or session data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    #[serde(default)]
    pub people: Collection<Person>,
    #[serde(default)]
    pub tasks: Collection<Task>,
    #[serde(default)]
    pub particularities: Collection<Particularity>,
    #[serde(default)]
    pub service_categories: Collection<ServiceCategory>,
}

/// The single synchronized aggregate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub people: Collection<Person>,
    #[serde(default)]
    pub tasks: Collection<Task>,
    #[serde(default)]
    pub particularities: Collection<Particularity>,
    #[serde(default)]
    pub service_categories: Collection<ServiceCategory>,
    /// Session-local access level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<UserRole>,
    /// Whole-document version stamp (milliseconds)
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Document {
    /// The first-boot document: default categories, version 0.
    pub fn initial() -> Self {
        Self {
            service_categories: default_categories().into_iter().collect(),
            ..Self::default()
        }
    }

    /// Copy of this document without session-local data, as sent to the remote store.
    pub fn without_session(&self) -> Self {
        Self {
            user_role: None,
            ..self.clone()
        }
    }

    /// Clone out the four collections.
    pub fn collections(&self) -> Collections {
        Collections {
            people: self.people.clone(),
            tasks: self.tasks.clone(),
            particularities: self.particularities.clone(),
            service_categories: self.service_categories.clone(),
        }
    }

    /// Replace all four collections wholesale.
    pub fn set_collections(&mut self, collections: Collections) {
        self.people = collections.people;
        self.tasks = collections.tasks;
        self.particularities = collections.particularities;
        self.service_categories = collections.service_categories;
    }

    /// Remove a person together with every task and particularity referencing it.
    ///
    /// Returns whether the person existed. Referencing records are removed even
    /// when the person itself is already gone.
    pub fn remove_person(&mut self, id: &str) -> bool {
        let existed = self.people.remove(id).is_some();
        self.tasks.retain(|t| t.person_id != id);
        self.particularities.retain(|p| p.person_id != id);
        existed
    }

    /// Remove a category together with every task filed under it.
    pub fn remove_category(&mut self, id: &str) -> bool {
        let existed = self.service_categories.remove(id).is_some();
        self.tasks.retain(|t| t.service_category_id != id);
        existed
    }

    /// Display name of a person, or [`UNKNOWN`] for a dangling reference.
    pub fn person_name(&self, id: &str) -> &str {
        self.people.get(id).map_or(UNKNOWN, |p| p.name.as_str())
    }

    /// Display name of a category, or [`UNKNOWN`] for a dangling reference.
    pub fn category_name(&self, id: &str) -> &str {
        self.service_categories
            .get(id)
            .map_or(UNKNOWN, |c| c.name.as_str())
    }

    /// Total number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.people.len()
            + self.tasks.len()
            + self.particularities.len()
            + self.service_categories.len()
    }
}

/// Categories every fresh document starts with.
pub fn default_categories() -> Vec<ServiceCategory> {
    vec![
        ServiceCategory::new("cat-support", "Customer Support").with_color("#3b82f6"),
        ServiceCategory::new("cat-maintenance", "Maintenance").with_color("#f59e0b"),
        ServiceCategory::new("cat-admin", "Administration").with_color("#10b981"),
        ServiceCategory::new("cat-training", "Training").with_color("#8b5cf6"),
    ]
}
