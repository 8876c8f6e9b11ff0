//! Operator-facing backup export and import.
//!
//! An export is the bare document as pretty JSON. An import is checked for
//! shape before anything is applied: `people`, `tasks` and
//! `serviceCategories` must be present and be arrays, `particularities` is
//! optional. A valid import becomes a [`Mutation::Replace`] so it flows
//! through the normal write path and gets a fresh version stamp.

use crate::{error::Result, Collections, Document, Error, Mutation, Timestamp};
use serde_json::Value;

/// Fields an import must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["people", "tasks", "serviceCategories"];

/// Serialize the document for download. The session role is not exported.
pub fn export(doc: &Document) -> Result<String> {
    serde_json::to_string_pretty(&doc.without_session())
        .map_err(|e| Error::InvalidDocument(e.to_string()))
}

/// File name offered for a download taken at `now` (milliseconds).
pub fn backup_file_name(now: Timestamp) -> String {
    format!("tally-backup-{now}.json")
}

/// Validate an uploaded backup and turn it into a replace mutation.
pub fn parse_import(json: &str) -> Result<Mutation> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::InvalidBackup(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidBackup("expected a JSON object".to_string()))?;

    for field in REQUIRED_FIELDS {
        match object.get(field) {
            None => return Err(Error::MissingBackupField(field)),
            Some(v) if !v.is_array() => {
                return Err(Error::InvalidBackup(format!("{field} must be an array")))
            }
            Some(_) => {}
        }
    }

    let collections: Collections =
        serde_json::from_value(value).map_err(|e| Error::InvalidBackup(e.to_string()))?;

    Ok(Mutation::Replace(Box::new(collections)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Person, UserRole};

    #[test]
    fn export_then_import_restores_collections() {
        let mut doc = Document::initial();
        doc.people.insert(Person::new("p1", "Ana"));
        doc.user_role = Some(UserRole::Admin);
        doc.updated_at = 77;

        let json = export(&doc).unwrap();
        assert!(!json.contains("userRole"));

        let Mutation::Replace(collections) = parse_import(&json).unwrap() else {
            panic!("expected replace");
        };
        assert_eq!(*collections, doc.collections());
    }

    #[test]
    fn particularities_are_optional() {
        let json = r#"{"people": [], "tasks": [], "serviceCategories": []}"#;
        let Mutation::Replace(collections) = parse_import(json).unwrap() else {
            panic!("expected replace");
        };
        assert!(collections.particularities.is_empty());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"{"people": [], "serviceCategories": []}"#;
        assert_eq!(
            parse_import(json).unwrap_err(),
            Error::MissingBackupField("tasks")
        );
    }

    #[test]
    fn non_array_field_is_rejected() {
        let json = r#"{"people": {}, "tasks": [], "serviceCategories": []}"#;
        assert!(matches!(
            parse_import(json).unwrap_err(),
            Error::InvalidBackup(_)
        ));
    }

    #[test]
    fn malformed_records_are_rejected() {
        let json = r#"{"people": [{"name": "no id"}], "tasks": [], "serviceCategories": []}"#;
        assert!(matches!(
            parse_import(json).unwrap_err(),
            Error::InvalidBackup(_)
        ));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            parse_import("[1, 2]").unwrap_err(),
            Error::InvalidBackup(_)
        ));
        assert!(parse_import("{").is_err());
    }

    #[test]
    fn file_name_carries_timestamp() {
        assert_eq!(backup_file_name(42), "tally-backup-42.json");
    }
}
