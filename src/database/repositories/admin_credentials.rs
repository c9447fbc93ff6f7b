use crate::database::models::AdminCredentialRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteAdminCredentialRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::AdminCredentialRepository for SqliteAdminCredentialRepository<'conn> {
    fn create(&self, username: &str, password: &str, created_at: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO admin_credentials (username, password, created_at) VALUES (?1, ?2, ?3)",
            params![username, password, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<AdminCredentialRecord>> {
        let record = self
            .conn
            .query_row(
                r#"
                SELECT id, username, password, created_at
                FROM admin_credentials
                WHERE username = ?1
                "#,
                params![username],
                |row| {
                    Ok(AdminCredentialRecord {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<AdminCredentialRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, password, created_at FROM admin_credentials",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AdminCredentialRecord {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        let mut credentials = Vec::new();
        for row in rows {
            credentials.push(row?);
        }
        Ok(credentials)
    }

    fn delete_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM admin_credentials", [])?;
        Ok(())
    }

    fn insert_with_id(&self, record: &AdminCredentialRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO admin_credentials (id, username, password, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![record.id, record.username, record.password, record.created_at],
        )?;
        Ok(())
    }
}
