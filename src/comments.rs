use crate::database::models::CommentRecord;
use crate::database::repositories::CommentRepository;
use crate::database::Database;
use crate::masking::mask_contact;
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct CommentService {
    database: Database,
}

impl CommentService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create(&self, input: CreateCommentInput) -> Result<SubmittedComment> {
        if input.name.trim().is_empty() || input.content.trim().is_empty() {
            anyhow::bail!("Missing required fields");
        }
        let ip = input.ip.filter(|ip| !ip.is_empty());
        let location = input.location.filter(|location| !location.is_empty());
        let date = now_utc_iso();

        let stored = self.database.with_repositories(|repos| {
            let comments = repos.comments();
            let id = comments.create(
                &input.name,
                &input.content,
                ip.as_deref(),
                location.as_deref(),
                &date,
            )?;
            comments
                .get(id)?
                .context("comment creation lost newly inserted record")
        })?;

        Ok(SubmittedComment {
            success: true,
            id: stored.id,
            name: stored.name,
            content: stored.content,
            date: stored.date,
            approved: stored.approved != 0,
            location: stored.location,
            // never echoed back, even to the submitter
            ip: None,
        })
    }

    pub fn list_page(&self, page: u32, limit: u32, admin: bool) -> Result<CommentPage> {
        // Saturate so extreme page/limit pairs land past the end instead of
        // wrapping to a negative offset (which SQLite reads as zero).
        let offset = i64::from(page.saturating_sub(1)).saturating_mul(i64::from(limit));
        self.database.with_repositories(|repos| {
            let comments_repo = repos.comments();
            let total = comments_repo.count_total()?;
            let records = comments_repo.list_page(i64::from(limit), offset)?;
            let comments = records
                .into_iter()
                .map(|record| CommentView::from_record(record, admin))
                .collect();
            let total_pages = if limit == 0 {
                0
            } else {
                (total + i64::from(limit) - 1) / i64::from(limit)
            };
            Ok(CommentPage {
                comments,
                total_comments: total,
                current_page: page,
                total_pages,
            })
        })
    }

    pub fn replied_count(&self) -> Result<i64> {
        self.database
            .with_repositories(|repos| repos.comments().count_replied())
    }

    pub fn pending_count(&self) -> Result<i64> {
        self.database
            .with_repositories(|repos| repos.comments().count_pending())
    }

    pub fn approve(&self, id: i64) -> Result<bool> {
        self.database
            .with_repositories(|repos| repos.comments().approve(id))
    }

    pub fn reply(&self, id: i64, reply: &str) -> Result<bool> {
        if reply.trim().is_empty() {
            anyhow::bail!("Missing reply content");
        }
        let reply_date = now_utc_iso();
        self.database
            .with_repositories(|repos| repos.comments().set_reply(id, reply, &reply_date))
    }

    pub fn edit(&self, id: i64, content: &str, approved: Option<bool>) -> Result<bool> {
        if content.trim().is_empty() {
            anyhow::bail!("Missing content");
        }
        self.database
            .with_repositories(|repos| repos.comments().update_content(id, content, approved))
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        self.database
            .with_repositories(|repos| repos.comments().delete(id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentInput {
    // defaulted so bodies missing these keys reach the same validation
    // path as bodies carrying empty strings
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedComment {
    pub success: bool,
    pub id: i64,
    pub name: String,
    pub content: String,
    pub date: String,
    pub approved: bool,
    pub location: Option<String>,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub date: String,
    pub approved: bool,
    pub ip: Option<String>,
    pub location: Option<String>,
    pub reply: Option<String>,
    pub reply_date: Option<String>,
    #[serde(rename = "isHidden", skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    pub total_comments: i64,
    pub current_page: u32,
    pub total_pages: i64,
}

impl CommentView {
    fn from_record(record: CommentRecord, admin: bool) -> Self {
        let approved = record.approved != 0;
        if admin {
            return Self {
                id: record.id,
                name: record.name,
                content: record.content,
                date: record.date,
                approved,
                ip: record.ip,
                location: record.location,
                reply: record.reply,
                reply_date: record.reply_date,
                is_hidden: None,
            };
        }
        let has_reply = record.has_reply();
        Self {
            id: record.id,
            name: mask_contact(&record.name),
            // unanswered comments stay private until the admin replies
            content: if has_reply {
                record.content
            } else {
                String::new()
            },
            date: record.date,
            approved,
            ip: None,
            location: record.location,
            reply: record.reply,
            reply_date: record.reply_date,
            is_hidden: Some(!has_reply),
        }
    }
}
