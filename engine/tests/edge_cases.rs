//! Edge case tests for tally-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use serde_json::json;
use tally_engine::{
    backup, pick_winner, union_merge, Document, Mutation, Person, StateSnapshot, Task, UNKNOWN,
};

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_names_survive_snapshot() {
    let names = [
        "日本語テスト",
        "Привет мир",
        "مرحبا بالعالم",
        "🎉🚀💯",
        "Hello\nWorld\tTab",
        "",
    ];

    let mut doc = Document::initial();
    for (i, name) in names.iter().enumerate() {
        Mutation::UpsertPerson(Person::new(format!("p{i}"), *name)).apply(&mut doc);
    }

    let json = StateSnapshot::new(doc.clone()).to_json().unwrap();
    let restored = StateSnapshot::from_json(&json).unwrap().into_document();
    for (i, name) in names.iter().enumerate() {
        assert_eq!(restored.person_name(&format!("p{i}")), *name);
    }
}

// ============================================================================
// Timestamp Edge Cases
// ============================================================================

#[test]
fn max_timestamp_wins() {
    let mut a = Document::default();
    a.updated_at = u64::MAX;
    let mut b = Document::default();
    b.updated_at = u64::MAX - 1;

    assert_eq!(pick_winner(Some(b), Some(a.clone())), Some(a));
}

#[test]
fn zero_timestamps_tie_to_preferred() {
    let mut local = Document::default();
    local.people.insert(Person::new("p1", "Local"));
    let mut remote = Document::default();
    remote.people.insert(Person::new("p2", "Remote"));

    let winner = pick_winner(Some(local.clone()), Some(remote)).unwrap();
    assert_eq!(winner, local);
}

// ============================================================================
// Referential Integrity
// ============================================================================

#[test]
fn dangling_task_references_are_tolerated() {
    let mut doc = Document::initial();
    Mutation::UpsertTask(Task::new("t1", "ghost", "nowhere", "orphan", "2024-01-01"))
        .apply(&mut doc);

    assert!(doc.tasks.contains("t1"));
    assert_eq!(doc.person_name("ghost"), UNKNOWN);
    assert_eq!(doc.category_name("nowhere"), UNKNOWN);
}

#[test]
fn removing_absent_person_still_clears_orphans() {
    let mut doc = Document::initial();
    Mutation::UpsertTask(Task::new("t1", "ghost", "cat-admin", "orphan", "2024-01-01"))
        .apply(&mut doc);

    Mutation::RemovePerson { id: "ghost".into() }.apply(&mut doc);
    assert!(doc.tasks.is_empty());
}

// ============================================================================
// Remote Documents
// ============================================================================

#[test]
fn remote_document_with_extra_fields_decodes() {
    let doc: Document = serde_json::from_value(json!({
        "people": [{"id": "p1", "name": "Ana", "avatar": "x.png"}],
        "tasks": [],
        "particularities": [],
        "serviceCategories": [],
        "updatedAt": 10,
        "somethingNew": true
    }))
    .unwrap();
    assert_eq!(doc.person_name("p1"), "Ana");
}

#[test]
fn unknown_record_fields_survive_merge() {
    let remote: Document = serde_json::from_value(json!({
        "people": [{"id": "p1", "name": "Ana", "avatar": "x.png"}],
        "tasks": [{
            "id": "t1", "personId": "p1", "serviceCategoryId": "cat-admin",
            "description": "x", "date": "2024-01-01", "priority": "high"
        }],
        "particularities": [],
        "serviceCategories": [],
        "updatedAt": 10
    }))
    .unwrap();
    let mut local = Document::initial();
    local.updated_at = 20;
    local.people.insert(Person::new("p2", "Bea"));

    let merged = union_merge(&local, Some(&remote));
    let value = serde_json::to_value(&merged).unwrap();

    let people = value["people"].as_array().unwrap();
    let ana = people.iter().find(|p| p["id"] == "p1").unwrap();
    assert_eq!(ana["avatar"], "x.png");
    assert_eq!(value["tasks"][0]["priority"], "high");
    let bea = people.iter().find(|p| p["id"] == "p2").unwrap();
    assert!(bea.get("avatar").is_none());
}

#[test]
fn remote_document_never_carries_role_after_union() {
    let local: Document = serde_json::from_value(json!({
        "people": [],
        "tasks": [],
        "serviceCategories": [],
        "userRole": "admin",
        "updatedAt": 3
    }))
    .unwrap();
    let merged = union_merge(&local, None);
    let value = serde_json::to_value(&merged).unwrap();
    assert!(value.get("userRole").is_none());
}

// ============================================================================
// Backup
// ============================================================================

#[test]
fn large_backup_round_trips() {
    let mut doc = Document::initial();
    for i in 0..2_000 {
        Mutation::UpsertTask(Task::new(
            format!("t{i}"),
            "p1",
            "cat-support",
            "bulk",
            "2024-01-01",
        ))
        .apply(&mut doc);
    }

    let json = backup::export(&doc).unwrap();
    let mut restored = Document::default();
    backup::parse_import(&json).unwrap().apply(&mut restored);
    assert_eq!(restored.tasks.len(), 2_000);
}
