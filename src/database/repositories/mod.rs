mod admin_credentials;
mod admin_tokens;
mod comments;
mod files;

use super::models::{AdminCredentialRecord, AdminTokenRecord, CommentRecord, FileRecord};
use anyhow::Result;
use rusqlite::Connection;

pub trait CommentRepository {
    fn create(
        &self,
        name: &str,
        content: &str,
        ip: Option<&str>,
        location: Option<&str>,
        date: &str,
    ) -> Result<i64>;
    fn get(&self, id: i64) -> Result<Option<CommentRecord>>;
    fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<CommentRecord>>;
    fn list_all(&self) -> Result<Vec<CommentRecord>>;
    fn count_total(&self) -> Result<i64>;
    fn count_replied(&self) -> Result<i64>;
    fn count_pending(&self) -> Result<i64>;
    fn approve(&self, id: i64) -> Result<bool>;
    fn set_reply(&self, id: i64, reply: &str, reply_date: &str) -> Result<bool>;
    fn update_content(&self, id: i64, content: &str, approved: Option<bool>) -> Result<bool>;
    fn delete(&self, id: i64) -> Result<bool>;
    fn delete_all(&self) -> Result<()>;
    fn insert_with_id(&self, record: &CommentRecord) -> Result<()>;
}

pub trait FileRepository {
    fn list_all(&self) -> Result<Vec<FileRecord>>;
    fn delete_all(&self) -> Result<()>;
    fn insert_with_id(&self, record: &FileRecord) -> Result<()>;
}

pub trait AdminCredentialRepository {
    fn create(&self, username: &str, password: &str, created_at: &str) -> Result<i64>;
    fn find_by_username(&self, username: &str) -> Result<Option<AdminCredentialRecord>>;
    fn list_all(&self) -> Result<Vec<AdminCredentialRecord>>;
    fn delete_all(&self) -> Result<()>;
    fn insert_with_id(&self, record: &AdminCredentialRecord) -> Result<()>;
}

pub trait AdminTokenRepository {
    fn create(&self, token: &str, created_at: &str, expires_at: &str) -> Result<i64>;
    fn find(&self, token: &str) -> Result<Option<AdminTokenRecord>>;
    fn list_all(&self) -> Result<Vec<AdminTokenRecord>>;
    fn delete_all(&self) -> Result<()>;
    fn insert_with_id(&self, record: &AdminTokenRecord) -> Result<()>;
}

/// Thin wrapper handing out rusqlite-backed repository implementations.
pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn files(&self) -> impl FileRepository + '_ {
        files::SqliteFileRepository { conn: self.conn }
    }

    pub fn admin_credentials(&self) -> impl AdminCredentialRepository + '_ {
        admin_credentials::SqliteAdminCredentialRepository { conn: self.conn }
    }

    pub fn admin_tokens(&self) -> impl AdminTokenRepository + '_ {
        admin_tokens::SqliteAdminTokenRepository { conn: self.conn }
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }
}
