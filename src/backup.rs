use crate::database::models::{AdminCredentialRecord, AdminTokenRecord, CommentRecord, FileRecord};
use crate::database::repositories::{
    AdminCredentialRepository, AdminTokenRepository, CommentRepository, FileRepository,
};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const BACKUP_VERSION: &str = "1.0";

const ARRAY_KEYS: [&str; 4] = ["comments", "files", "adminCredentials", "adminTokens"];

#[derive(Debug, Error)]
pub enum RestoreError {
    /// Rejected before any row is touched.
    #[error("{0}")]
    Validation(String),
    /// The transaction failed and was rolled back.
    #[error(transparent)]
    Transaction(#[from] anyhow::Error),
}

/// Point-in-time snapshot of every table, plus metadata for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub comments: Vec<CommentRecord>,
    pub files: Vec<FileRecord>,
    pub admin_credentials: Vec<AdminCredentialRecord>,
    pub admin_tokens: Vec<AdminTokenRecord>,
    pub backup_date: String,
    pub version: String,
}

#[derive(Clone)]
pub struct BackupService {
    database: Database,
}

impl BackupService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Reads every table into a [`BackupDocument`]. Row order within each
    /// array is whatever the store returns; callers must not rely on it.
    pub fn export(&self) -> Result<BackupDocument> {
        self.database.with_repositories(|repos| {
            Ok(BackupDocument {
                comments: repos.comments().list_all()?,
                files: repos.files().list_all()?,
                admin_credentials: repos.admin_credentials().list_all()?,
                admin_tokens: repos.admin_tokens().list_all()?,
                backup_date: now_utc_iso(),
                version: BACKUP_VERSION.to_string(),
            })
        })
    }

    /// Replaces the entire dataset with the document's contents in one
    /// transaction, keeping the primary keys from the document. Absent keys
    /// simply restore as empty tables, so a structurally valid but empty
    /// document wipes the store. Returns the number of rows inserted.
    pub fn restore(&self, document: &Value) -> Result<usize, RestoreError> {
        let Some(document) = document.as_object() else {
            return Err(RestoreError::Validation(
                "Backup data is required".to_string(),
            ));
        };
        for key in ARRAY_KEYS {
            if let Some(value) = document.get(key) {
                if !value.is_null() && !value.is_array() {
                    return Err(RestoreError::Validation(format!("{key} must be an array")));
                }
            }
        }

        let restored = self.database.with_repositories(|repos| {
            let tx = repos.conn().unchecked_transaction()?;
            let mut restored = 0usize;
            {
                let comments = repos.comments();
                let files = repos.files();
                let credentials = repos.admin_credentials();
                let tokens = repos.admin_tokens();

                comments.delete_all()?;
                files.delete_all()?;
                credentials.delete_all()?;
                tokens.delete_all()?;

                for row in rows(document, "comments") {
                    let record: CommentRecord = serde_json::from_value(row.clone())
                        .context("invalid comment row in backup document")?;
                    comments.insert_with_id(&record)?;
                    restored += 1;
                }
                for row in rows(document, "files") {
                    let record: FileRecord = serde_json::from_value(row.clone())
                        .context("invalid file row in backup document")?;
                    files.insert_with_id(&record)?;
                    restored += 1;
                }
                for row in rows(document, "adminCredentials") {
                    let record: AdminCredentialRecord = serde_json::from_value(row.clone())
                        .context("invalid admin credential row in backup document")?;
                    credentials.insert_with_id(&record)?;
                    restored += 1;
                }
                for row in rows(document, "adminTokens") {
                    let record: AdminTokenRecord = serde_json::from_value(row.clone())
                        .context("invalid admin token row in backup document")?;
                    tokens.insert_with_id(&record)?;
                    restored += 1;
                }
            }
            tx.commit()?;
            Ok(restored)
        })?;
        Ok(restored)
    }
}

fn rows<'doc>(document: &'doc serde_json::Map<String, Value>, key: &str) -> &'doc [Value] {
    document
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use rusqlite::Connection;
    use serde_json::json;

    fn setup_service() -> BackupService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        BackupService::new(db)
    }

    fn seed(service: &BackupService) {
        let database = service.database.clone();
        database
            .with_repositories(|repos| {
                repos.comments().insert_with_id(&CommentRecord {
                    id: 1,
                    name: "qq:123456789".into(),
                    content: "first".into(),
                    date: "2024-01-01T00:00:00Z".into(),
                    approved: 1,
                    ip: Some("220.128.168.9".into()),
                    location: Some("广东省广州市".into()),
                    reply: Some("welcome".into()),
                    reply_date: Some("2024-01-02T00:00:00Z".into()),
                })?;
                repos.comments().insert_with_id(&CommentRecord {
                    id: 2,
                    name: "wx:abcdwxyz".into(),
                    content: "second".into(),
                    date: "2024-01-03T00:00:00Z".into(),
                    approved: 0,
                    ip: None,
                    location: None,
                    reply: None,
                    reply_date: None,
                })?;
                repos.files().insert_with_id(&FileRecord {
                    id: 1,
                    name: Some("notes".into()),
                    file_type: Some("folder".into()),
                    url: None,
                    note: None,
                    children: Some("[]".into()),
                    expanded: Some(1),
                    created_at: Some("2024-01-01T00:00:00Z".into()),
                })?;
                repos.admin_credentials().insert_with_id(&AdminCredentialRecord {
                    id: 1,
                    username: "admin".into(),
                    password: "admin123".into(),
                    created_at: Some("2024-01-01T00:00:00Z".into()),
                })?;
                repos.admin_tokens().insert_with_id(&AdminTokenRecord {
                    id: 1,
                    token: "token-one".into(),
                    created_at: Some("2024-01-01T00:00:00Z".into()),
                    expires_at: None,
                })
            })
            .expect("seed rows");
    }

    fn sorted_comments(document: &BackupDocument) -> Vec<CommentRecord> {
        let mut comments = document.comments.clone();
        comments.sort_by_key(|record| record.id);
        comments
    }

    #[test]
    fn export_then_restore_is_idempotent() {
        let service = setup_service();
        seed(&service);

        let first = service.export().expect("export");
        assert_eq!(first.version, BACKUP_VERSION);
        assert_eq!(first.comments.len(), 2);

        let document = serde_json::to_value(&first).expect("serialize");
        let restored = service.restore(&document).expect("restore");
        assert_eq!(restored, 5);

        let second = service.export().expect("export again");
        assert_eq!(sorted_comments(&first), sorted_comments(&second));
        assert_eq!(first.files, second.files);
        assert_eq!(first.admin_credentials, second.admin_credentials);
        assert_eq!(first.admin_tokens, second.admin_tokens);
    }

    #[test]
    fn restore_accepts_a_comments_only_document() {
        let service = setup_service();
        seed(&service);

        let document = json!({
            "comments": [{
                "id": 9,
                "name": "tel:12345",
                "content": "from an old backup",
                "date": "2023-06-01T00:00:00Z",
                "approved": 1
            }]
        });
        let restored = service.restore(&document).expect("restore");
        assert_eq!(restored, 1);

        let snapshot = service.export().expect("export");
        assert_eq!(snapshot.comments.len(), 1);
        assert_eq!(snapshot.comments[0].id, 9);
        assert!(snapshot.files.is_empty());
        assert!(snapshot.admin_credentials.is_empty());
        assert!(snapshot.admin_tokens.is_empty());
    }

    #[test]
    fn restoring_an_empty_document_clears_all_tables() {
        let service = setup_service();
        seed(&service);

        let restored = service.restore(&json!({})).expect("restore");
        assert_eq!(restored, 0);

        let snapshot = service.export().expect("export");
        assert!(snapshot.comments.is_empty());
        assert!(snapshot.files.is_empty());
        assert!(snapshot.admin_credentials.is_empty());
        assert!(snapshot.admin_tokens.is_empty());
    }

    #[test]
    fn non_array_fields_are_rejected_before_any_deletion() {
        let service = setup_service();
        seed(&service);

        let err = service
            .restore(&json!({"comments": "not-an-array"}))
            .unwrap_err();
        assert!(matches!(err, RestoreError::Validation(_)));
        assert!(err.to_string().contains("comments must be an array"));

        let err = service.restore(&Value::Null).unwrap_err();
        assert!(err.to_string().contains("Backup data is required"));

        let snapshot = service.export().expect("export");
        assert_eq!(snapshot.comments.len(), 2);
    }

    #[test]
    fn duplicate_ids_roll_the_whole_restore_back() {
        let service = setup_service();
        seed(&service);

        let duplicate = json!({
            "comments": [
                {"id": 10, "name": "a:xxxx", "content": "one", "date": "2024-02-01T00:00:00Z"},
                {"id": 10, "name": "b:yyyy", "content": "two", "date": "2024-02-02T00:00:00Z"}
            ]
        });
        let err = service.restore(&duplicate).unwrap_err();
        assert!(matches!(err, RestoreError::Transaction(_)));

        // prior deletes and the first insert must have been rolled back
        let snapshot = service.export().expect("export");
        assert_eq!(snapshot.comments.len(), 2);
        assert_eq!(sorted_comments(&snapshot)[0].content, "first");
        assert_eq!(snapshot.admin_tokens.len(), 1);
    }

    #[test]
    fn malformed_rows_roll_the_whole_restore_back() {
        let service = setup_service();
        seed(&service);

        let malformed = json!({
            "comments": [
                {"id": 20, "name": "a:xxxx", "content": "fine", "date": "2024-02-01T00:00:00Z"},
                {"id": 21, "name": "b:yyyy"}
            ]
        });
        let err = service.restore(&malformed).unwrap_err();
        assert!(matches!(err, RestoreError::Transaction(_)));
        assert!(err.to_string().contains("invalid comment row"));

        let snapshot = service.export().expect("export");
        assert_eq!(snapshot.comments.len(), 2);
    }
}
