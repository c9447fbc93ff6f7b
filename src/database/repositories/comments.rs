use crate::database::models::CommentRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn create(
        &self,
        name: &str,
        content: &str,
        ip: Option<&str>,
        location: Option<&str>,
        date: &str,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO comments (name, content, ip, date, approved, reply, reply_date, location)
            VALUES (?1, ?2, ?3, ?4, 0, NULL, NULL, ?5)
            "#,
            params![name, content, ip, date, location],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: i64) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, name, content, date, approved, ip, location, reply, reply_date
                FROM comments
                WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(CommentRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        content: row.get(2)?,
                        date: row.get(3)?,
                        approved: row.get(4)?,
                        ip: row.get(5)?,
                        location: row.get(6)?,
                        reply: row.get(7)?,
                        reply_date: row.get(8)?,
                    })
                },
            )
            .optional()?)
    }

    fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, content, date, approved, ip, location, reply, reply_date
            FROM comments
            ORDER BY date DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )?;
        let rows = stmt.query_map(params![limit, offset], |row| {
            Ok(CommentRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                content: row.get(2)?,
                date: row.get(3)?,
                approved: row.get(4)?,
                ip: row.get(5)?,
                location: row.get(6)?,
                reply: row.get(7)?,
                reply_date: row.get(8)?,
            })
        })?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn list_all(&self) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, content, date, approved, ip, location, reply, reply_date
            FROM comments
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CommentRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                content: row.get(2)?,
                date: row.get(3)?,
                approved: row.get(4)?,
                ip: row.get(5)?,
                location: row.get(6)?,
                reply: row.get(7)?,
                reply_date: row.get(8)?,
            })
        })?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn count_total(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_replied(&self) -> Result<i64> {
        let count = self.conn.query_row(
            r#"SELECT COUNT(*) FROM comments WHERE reply IS NOT NULL AND reply != ''"#,
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_pending(&self) -> Result<i64> {
        let count = self.conn.query_row(
            r#"SELECT COUNT(*) FROM comments WHERE reply IS NULL OR reply = ''"#,
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn approve(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE comments SET approved = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(changed > 0)
    }

    fn set_reply(&self, id: i64, reply: &str, reply_date: &str) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE comments SET reply = ?1, reply_date = ?2, approved = 1
            WHERE id = ?3
            "#,
            params![reply, reply_date, id],
        )?;
        Ok(changed > 0)
    }

    fn update_content(&self, id: i64, content: &str, approved: Option<bool>) -> Result<bool> {
        let changed = match approved {
            Some(flag) => self.conn.execute(
                "UPDATE comments SET content = ?1, approved = ?2 WHERE id = ?3",
                params![content, flag, id],
            )?,
            None => self.conn.execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                params![content, id],
            )?,
        };
        Ok(changed > 0)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn delete_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM comments", [])?;
        Ok(())
    }

    fn insert_with_id(&self, record: &CommentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, name, content, date, approved, ip, location, reply, reply_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.name,
                record.content,
                record.date,
                record.approved,
                record.ip,
                record.location,
                record.reply,
                record.reply_date
            ],
        )?;
        Ok(())
    }
}
