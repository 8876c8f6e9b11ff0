//! Reconciliation rules between a local and a remote copy of the document.
//!
//! Three rules, each pure and deterministic:
//!
//! 1. [`pick_winner`] - whole-document last-writer-wins, used on load.
//!    An absent side always loses; otherwise the strictly greater
//!    `updatedAt` wins and its collections are taken as-is. Ties keep the
//!    side the caller treats as authoritative.
//! 2. [`union_merge`] - record-level union, used only right before writing to
//!    the remote store, so that records created concurrently on two clients
//!    both survive. Local fields win for shared ids.
//! 3. [`accept_remote`] - the change-feed acceptance rule: a pushed document
//!    replaces the in-memory collections only if strictly newer.

use crate::Document;
use serde::{Deserialize, Serialize};

/// Which side of a comparison won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// The local (preferred) copy won
    LocalWins,
    /// The remote (other) copy won
    RemoteWins,
}

/// Decide which copy wins. `None` when neither side holds a document.
///
/// Ties resolve to `local`.
pub fn resolve(local: Option<&Document>, remote: Option<&Document>) -> Option<Resolution> {
    match (local, remote) {
        (None, None) => None,
        (Some(_), None) => Some(Resolution::LocalWins),
        (None, Some(_)) => Some(Resolution::RemoteWins),
        (Some(local), Some(remote)) => {
            if remote.updated_at > local.updated_at {
                Some(Resolution::RemoteWins)
            } else {
                Some(Resolution::LocalWins)
            }
        }
    }
}

/// Pick the winning document between `preferred` and `other`.
///
/// `preferred` wins ties. The winner is returned untouched: no collections
/// are merged on this path.
pub fn pick_winner(preferred: Option<Document>, other: Option<Document>) -> Option<Document> {
    match resolve(preferred.as_ref(), other.as_ref())? {
        Resolution::LocalWins => preferred,
        Resolution::RemoteWins => other,
    }
}

/// Union the outgoing `local` snapshot with what is currently stored remotely.
///
/// Every collection becomes the union of both sides keyed by id, with the
/// local record kept for ids present on both sides. Applied regardless of
/// timestamps; the result carries the local `updatedAt` and no session role.
pub fn union_merge(local: &Document, remote: Option<&Document>) -> Document {
    let Some(remote) = remote else {
        return local.without_session();
    };

    Document {
        people: local.people.union_preferring(&remote.people),
        tasks: local.tasks.union_preferring(&remote.tasks),
        particularities: local
            .particularities
            .union_preferring(&remote.particularities),
        service_categories: local
            .service_categories
            .union_preferring(&remote.service_categories),
        user_role: None,
        updated_at: local.updated_at,
    }
}

/// Apply a pushed remote document to `current` if it is strictly newer.
///
/// Collections are replaced wholesale (never unioned) together with the
/// version stamp; the session-local role is kept. Returns whether `current`
/// changed. Equal or older pushes are ignored, which makes repeated or
/// reordered deliveries harmless.
pub fn accept_remote(current: &mut Document, incoming: Document) -> bool {
    if incoming.updated_at <= current.updated_at {
        return false;
    }

    current.people = incoming.people;
    current.tasks = incoming.tasks;
    current.particularities = incoming.particularities;
    current.service_categories = incoming.service_categories;
    current.updated_at = incoming.updated_at;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Person, Task, UserRole};

    fn doc_with_tasks(ids: &[&str], updated_at: u64) -> Document {
        let mut doc = Document::default();
        for id in ids {
            doc.tasks
                .insert(Task::new(*id, "p1", "c1", "work", "2024-01-01"));
        }
        doc.updated_at = updated_at;
        doc
    }

    #[test]
    fn newer_wins_in_either_order() {
        let a = doc_with_tasks(&["t1"], 200);
        let b = doc_with_tasks(&["t2"], 100);

        assert_eq!(pick_winner(Some(a.clone()), Some(b.clone())), Some(a.clone()));
        assert_eq!(pick_winner(Some(b), Some(a.clone())), Some(a));
    }

    #[test]
    fn absent_side_loses() {
        let a = doc_with_tasks(&["t1"], 0);
        assert_eq!(pick_winner(Some(a.clone()), None), Some(a.clone()));
        assert_eq!(pick_winner(None, Some(a.clone())), Some(a));
        assert_eq!(pick_winner(None, None), None);
    }

    #[test]
    fn tie_keeps_preferred_without_merging() {
        let local = doc_with_tasks(&["t1"], 100);
        let remote = doc_with_tasks(&["t2"], 100);

        let winner = pick_winner(Some(local.clone()), Some(remote)).unwrap();
        assert_eq!(winner, local);
        assert_eq!(winner.tasks.ids().collect::<Vec<_>>(), vec!["t1"]);
    }

    #[test]
    fn resolve_reports_side() {
        let old = doc_with_tasks(&[], 50);
        let new = doc_with_tasks(&[], 200);
        assert_eq!(resolve(Some(&old), Some(&new)), Some(Resolution::RemoteWins));
        assert_eq!(resolve(Some(&new), Some(&old)), Some(Resolution::LocalWins));
        assert_eq!(resolve(None, None), None);
    }

    #[test]
    fn union_of_disjoint_ids_keeps_both() {
        let a = doc_with_tasks(&["1"], 10);
        let b = doc_with_tasks(&["2"], 20);

        let ab = union_merge(&a, Some(&b));
        let ba = union_merge(&b, Some(&a));
        assert_eq!(ab.tasks.ids().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(ba.tasks.ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn union_prefers_local_fields() {
        let mut local = Document::default();
        local.people.insert(Person::new("1", "X"));
        local.updated_at = 5;
        let mut remote = Document::default();
        remote.people.insert(Person::new("1", "Y"));
        remote.updated_at = 900;

        let merged = union_merge(&local, Some(&remote));
        assert_eq!(merged.person_name("1"), "X");
        // Local stamp kept even though remote is newer
        assert_eq!(merged.updated_at, 5);
    }

    #[test]
    fn union_strips_session_role() {
        let mut local = doc_with_tasks(&["1"], 10);
        local.user_role = Some(UserRole::Admin);

        assert!(union_merge(&local, None).user_role.is_none());
        assert!(union_merge(&local, Some(&Document::default()))
            .user_role
            .is_none());
    }

    #[test]
    fn union_of_empty_is_empty() {
        let merged = union_merge(&Document::default(), Some(&Document::default()));
        assert_eq!(merged.record_count(), 0);
    }

    #[test]
    fn accept_remote_only_when_strictly_newer() {
        let mut current = doc_with_tasks(&["t1"], 100);

        assert!(!accept_remote(&mut current, doc_with_tasks(&["t2"], 100)));
        assert!(!accept_remote(&mut current, doc_with_tasks(&["t2"], 99)));
        assert_eq!(current.tasks.ids().collect::<Vec<_>>(), vec!["t1"]);

        assert!(accept_remote(&mut current, doc_with_tasks(&["t2"], 101)));
        assert_eq!(current.tasks.ids().collect::<Vec<_>>(), vec!["t2"]);
        assert_eq!(current.updated_at, 101);
    }

    #[test]
    fn accept_remote_is_idempotent() {
        let mut current = doc_with_tasks(&["t1"], 100);
        let push = doc_with_tasks(&["t2"], 150);

        assert!(accept_remote(&mut current, push.clone()));
        let after_first = current.clone();
        assert!(!accept_remote(&mut current, push));
        assert_eq!(current, after_first);
    }

    #[test]
    fn accept_remote_keeps_session_role() {
        let mut current = doc_with_tasks(&["t1"], 1);
        current.user_role = Some(UserRole::Viewer);

        assert!(accept_remote(&mut current, doc_with_tasks(&["t2"], 2)));
        assert_eq!(current.user_role, Some(UserRole::Viewer));
    }
}
