use serde::{Deserialize, Serialize};

/// Row of the `comments` table. Serialized field names match the column
/// names so backup documents round-trip without translation. `approved`
/// stays an integer (0/1) end to end; view types expose it as a bool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub date: String,
    #[serde(default)]
    pub approved: i64,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub reply_date: Option<String>,
}

impl CommentRecord {
    /// A comment counts as answered only when the reply is non-empty after
    /// trimming; whitespace-only replies keep it hidden for the public view.
    pub fn has_reply(&self) -> bool {
        self.reply
            .as_deref()
            .map(|reply| !reply.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Row of the `files` table. The table carries no feature of its own here;
/// it exists so backup documents can transport it losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub children: Option<String>,
    #[serde(default)]
    pub expanded: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCredentialRecord {
    pub id: i64,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Bearer tokens issued at login. `expires_at` may be absent in documents
/// restored from older deployments; such tokens never authorize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminTokenRecord {
    pub id: i64,
    pub token: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}
