use crate::database::models::AdminTokenRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteAdminTokenRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::AdminTokenRepository for SqliteAdminTokenRepository<'conn> {
    fn create(&self, token: &str, created_at: &str, expires_at: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO admin_tokens (token, created_at, expires_at) VALUES (?1, ?2, ?3)",
            params![token, created_at, expires_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find(&self, token: &str) -> Result<Option<AdminTokenRecord>> {
        let record = self
            .conn
            .query_row(
                r#"
                SELECT id, token, created_at, expires_at
                FROM admin_tokens
                WHERE token = ?1
                "#,
                params![token],
                |row| {
                    Ok(AdminTokenRecord {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<AdminTokenRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, token, created_at, expires_at FROM admin_tokens",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AdminTokenRecord {
                id: row.get(0)?,
                token: row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
            })
        })?;
        let mut tokens = Vec::new();
        for row in rows {
            tokens.push(row?);
        }
        Ok(tokens)
    }

    fn delete_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM admin_tokens", [])?;
        Ok(())
    }

    fn insert_with_id(&self, record: &AdminTokenRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO admin_tokens (id, token, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![record.id, record.token, record.created_at, record.expires_at],
        )?;
        Ok(())
    }
}
