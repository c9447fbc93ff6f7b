use crate::database::models::FileRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteFileRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::FileRepository for SqliteFileRepository<'conn> {
    fn list_all(&self) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, type, url, note, children, expanded, created_at
            FROM files
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FileRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                file_type: row.get(2)?,
                url: row.get(3)?,
                note: row.get(4)?,
                children: row.get(5)?,
                expanded: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(files)
    }

    fn delete_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM files", [])?;
        Ok(())
    }

    fn insert_with_id(&self, record: &FileRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO files (id, name, type, url, note, children, expanded, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id,
                record.name,
                record.file_type,
                record.url,
                record.note,
                record.children,
                record.expanded,
                record.created_at
            ],
        )?;
        Ok(())
    }
}
