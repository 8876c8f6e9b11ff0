//! Application deltas applied to the document.
//!
//! Edits are expressed as mutations rather than direct field writes so the
//! same change can arrive from an HTTP request, a WebSocket message or a
//! backup import. A mutation never fails: upserts insert or replace by id,
//! removals of unknown ids are no-ops, and references are not checked.
//! Stamping `updatedAt` is left to the caller.

use crate::{Collections, Document, Particularity, Person, RecordId, ServiceCategory, Task};
use serde::{Deserialize, Serialize};

/// A single change to the document's collections.
///
/// On the wire the variant is named by an `op` field; records carry their own
/// `type` field (particularity kind), so the two never share a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    UpsertPerson(Person),
    /// Also removes the person's tasks and particularities.
    RemovePerson { id: RecordId },
    UpsertTask(Task),
    RemoveTask { id: RecordId },
    UpsertParticularity(Particularity),
    RemoveParticularity { id: RecordId },
    UpsertCategory(ServiceCategory),
    /// Also removes the tasks filed under the category.
    RemoveCategory { id: RecordId },
    /// Replace every collection wholesale.
    Replace(Box<Collections>),
}

impl Mutation {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::UpsertPerson(_) => "upsertPerson",
            Mutation::RemovePerson { .. } => "removePerson",
            Mutation::UpsertTask(_) => "upsertTask",
            Mutation::RemoveTask { .. } => "removeTask",
            Mutation::UpsertParticularity(_) => "upsertParticularity",
            Mutation::RemoveParticularity { .. } => "removeParticularity",
            Mutation::UpsertCategory(_) => "upsertCategory",
            Mutation::RemoveCategory { .. } => "removeCategory",
            Mutation::Replace(_) => "replace",
        }
    }

    /// Apply this mutation to the document's collections.
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Mutation::UpsertPerson(person) => {
                doc.people.insert(person.clone());
            }
            Mutation::RemovePerson { id } => {
                doc.remove_person(id);
            }
            Mutation::UpsertTask(task) => {
                doc.tasks.insert(task.clone());
            }
            Mutation::RemoveTask { id } => {
                doc.tasks.remove(id);
            }
            Mutation::UpsertParticularity(particularity) => {
                doc.particularities.insert(particularity.clone());
            }
            Mutation::RemoveParticularity { id } => {
                doc.particularities.remove(id);
            }
            Mutation::UpsertCategory(category) => {
                doc.service_categories.insert(category.clone());
            }
            Mutation::RemoveCategory { id } => {
                doc.remove_category(id);
            }
            Mutation::Replace(collections) => {
                doc.set_collections(collections.as_ref().clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParticularityKind;
    use serde_json::json;

    #[test]
    fn upsert_inserts_then_replaces() {
        let mut doc = Document::initial();
        Mutation::UpsertPerson(Person::new("p1", "Ana")).apply(&mut doc);
        Mutation::UpsertPerson(Person::new("p1", "Ana Maria")).apply(&mut doc);

        assert_eq!(doc.people.len(), 1);
        assert_eq!(doc.person_name("p1"), "Ana Maria");
    }

    #[test]
    fn apply_does_not_stamp() {
        let mut doc = Document::initial();
        doc.updated_at = 10;
        Mutation::UpsertTask(Task::new("t1", "p1", "cat-admin", "x", "2024-01-01"))
            .apply(&mut doc);
        assert_eq!(doc.updated_at, 10);
    }

    #[test]
    fn remove_person_mutation_cascades() {
        let mut doc = Document::initial();
        Mutation::UpsertPerson(Person::new("p1", "Ana")).apply(&mut doc);
        Mutation::UpsertTask(Task::new("t1", "p1", "cat-admin", "x", "2024-01-01"))
            .apply(&mut doc);
        Mutation::UpsertParticularity(Particularity::new(
            "x1",
            "p1",
            ParticularityKind::Incident,
            "2024-01-01",
        ))
        .apply(&mut doc);

        Mutation::RemovePerson { id: "p1".into() }.apply(&mut doc);
        assert!(doc.people.is_empty());
        assert!(doc.tasks.is_empty());
        assert!(doc.particularities.is_empty());
    }

    #[test]
    fn replace_swaps_collections_and_keeps_role() {
        let mut doc = Document::initial();
        doc.user_role = Some(crate::UserRole::Viewer);
        let mut incoming = Collections::default();
        incoming.people.insert(Person::new("p9", "Imported"));

        Mutation::Replace(Box::new(incoming)).apply(&mut doc);
        assert_eq!(doc.people.len(), 1);
        assert!(doc.service_categories.is_empty());
        assert_eq!(doc.user_role, Some(crate::UserRole::Viewer));
    }

    #[test]
    fn wire_format_is_tagged() {
        let m: Mutation = serde_json::from_value(json!({
            "op": "removeCategory",
            "id": "cat-admin"
        }))
        .unwrap();
        assert_eq!(
            m,
            Mutation::RemoveCategory {
                id: "cat-admin".into()
            }
        );

        let m: Mutation = serde_json::from_value(json!({
            "op": "upsertPerson",
            "id": "p1",
            "name": "Ana"
        }))
        .unwrap();
        assert_eq!(m.kind(), "upsertPerson");
    }

    #[test]
    fn particularity_upsert_keeps_its_kind() {
        let m: Mutation = serde_json::from_value(json!({
            "op": "upsertParticularity",
            "id": "x1",
            "personId": "p1",
            "date": "2024-03-01",
            "type": "delay"
        }))
        .unwrap();
        match &m {
            Mutation::UpsertParticularity(p) => assert_eq!(p.kind, ParticularityKind::Delay),
            other => panic!("Expected UpsertParticularity, got {other:?}"),
        }

        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["op"], "upsertParticularity");
        assert_eq!(value["type"], "delay");
    }

    #[test]
    fn every_variant_survives_the_wire() {
        let mut collections = Collections::default();
        collections.people.insert(Person::new("p9", "Imported"));
        let mut particularity =
            Particularity::new("x1", "p1", ParticularityKind::Absence, "2024-03-01");
        particularity.description = "sick".to_string();

        let mutations = vec![
            Mutation::UpsertPerson(Person::new("p1", "Ana")),
            Mutation::RemovePerson { id: "p1".into() },
            Mutation::UpsertTask(Task::new("t1", "p1", "cat-admin", "x", "2024-01-01")),
            Mutation::RemoveTask { id: "t1".into() },
            Mutation::UpsertParticularity(particularity),
            Mutation::RemoveParticularity { id: "x1".into() },
            Mutation::UpsertCategory(ServiceCategory::new("cat-x", "X").with_color("#fff")),
            Mutation::RemoveCategory { id: "cat-x".into() },
            Mutation::Replace(Box::new(collections)),
        ];

        for mutation in mutations {
            let text = serde_json::to_string(&mutation).unwrap();
            let back: Mutation = serde_json::from_str(&text).unwrap();
            assert_eq!(back, mutation, "{text}");
        }
    }
}
