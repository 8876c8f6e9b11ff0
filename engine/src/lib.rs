//! # Tally Engine
//!
//! Document model and merge rules for an offline-first productivity
//! dashboard.
//!
//! The application state is one [`Document`]: people, tasks,
//! particularities (occurrences such as absences or delays) and service
//! categories, plus a whole-document version stamp. This crate holds
//! everything about that document that does not touch a disk or a socket.
//!
//! ## Design Principles
//!
//! - **No IO**: stores, networking and scheduling live in `tally-server`
//! - **Deterministic**: the same inputs always produce the same outputs
//! - **Whole-document versioning**: `updatedAt` is the only arbiter of "newer"
//!
//! ## Core Concepts
//!
//! ### Mutations
//!
//! Edits are expressed as [`Mutation`]s. They never fail: upserts insert or
//! replace by id, and removing a person or category cascades to the records
//! that reference it.
//!
//! ### Reconciliation
//!
//! The [`reconcile`] module holds the three merge rules:
//! - [`pick_winner`] - last-writer-wins on load, ties keep the local copy
//! - [`union_merge`] - record-level union before writing to the remote store
//! - [`accept_remote`] - change-feed pushes apply only if strictly newer
//!
//! ## Quick Start
//!
//! ```rust
//! use tally_engine::{clock, pick_winner, Document, Mutation, Person};
//!
//! let mut local = Document::initial();
//! Mutation::UpsertPerson(Person::new("p1", "Ana")).apply(&mut local);
//! local.updated_at = clock::next_stamp(local.updated_at, 1_706_745_600_000);
//!
//! let remote = Document::initial();
//! let winner = pick_winner(Some(local.clone()), Some(remote)).unwrap();
//! assert_eq!(winner, local);
//! ```

pub mod backup;
pub mod clock;
pub mod document;
pub mod error;
pub mod mutation;
pub mod reconcile;
pub mod snapshot;

// Re-export main types at crate root
pub use document::{
    default_categories, Collection, Collections, Document, Keyed, Particularity,
    ParticularityKind, Person, ServiceCategory, Task, UserRole, UNKNOWN,
};
pub use error::Error;
pub use mutation::Mutation;
pub use reconcile::{accept_remote, pick_winner, resolve, union_merge, Resolution};
pub use snapshot::{StateSnapshot, LOCAL_STATE_KEY, SNAPSHOT_FORMAT_VERSION};

/// Type aliases for clarity
pub type RecordId = String;
pub type Timestamp = u64;
