use crate::config::AdminConfig;
use crate::database::repositories::{AdminCredentialRepository, AdminTokenRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Clone)]
pub struct AdminAuthService {
    database: Database,
    config: AdminConfig,
}

impl AdminAuthService {
    pub fn new(database: Database, config: AdminConfig) -> Self {
        Self { database, config }
    }

    /// Inserts the configured admin account unless one already exists.
    /// Returns whether a row was created.
    pub fn seed_credentials(&self) -> Result<bool> {
        self.database.with_repositories(|repos| {
            let credentials = repos.admin_credentials();
            if credentials.find_by_username(&self.config.username)?.is_some() {
                return Ok(false);
            }
            credentials.create(&self.config.username, &self.config.password, &now_utc_iso())?;
            Ok(true)
        })
    }

    /// Checks the supplied credentials and issues a fresh bearer token on
    /// success. Returns `None` when the username or password does not match.
    pub fn login(&self, username: &str, password: &str) -> Result<Option<IssuedToken>> {
        self.database.with_repositories(|repos| {
            let account = repos.admin_credentials().find_by_username(username)?;
            let matches = account
                .map(|record| record.password == password)
                .unwrap_or(false);
            if !matches {
                return Ok(None);
            }
            let token = Uuid::new_v4().to_string();
            let created_at = now_utc_iso();
            let expires_at = (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).to_rfc3339();
            repos.admin_tokens().create(&token, &created_at, &expires_at)?;
            Ok(Some(IssuedToken { token, expires_at }))
        })
    }

    /// A token authorizes iff it is stored and not yet expired. Rows without
    /// a parseable expiry never authorize.
    pub fn authorize(&self, token: &str) -> Result<bool> {
        self.database.with_repositories(|repos| {
            let Some(record) = repos.admin_tokens().find(token)? else {
                return Ok(false);
            };
            let Some(raw_expiry) = record.expires_at else {
                return Ok(false);
            };
            let Ok(expires_at) = DateTime::parse_from_rfc3339(&raw_expiry) else {
                return Ok(false);
            };
            Ok(expires_at.with_timezone(&Utc) > Utc::now())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::AdminTokenRecord;
    use crate::database::Database;
    use rusqlite::Connection;

    fn setup_service() -> AdminAuthService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        let service = AdminAuthService::new(
            db,
            AdminConfig {
                username: "admin".into(),
                password: "admin123".into(),
            },
        );
        service.seed_credentials().expect("seed");
        service
    }

    #[test]
    fn seeding_is_idempotent() {
        let service = setup_service();
        assert!(!service.seed_credentials().expect("second seed"));
    }

    #[test]
    fn login_issues_tokens_only_for_matching_credentials() {
        let service = setup_service();
        assert!(service.login("admin", "wrong").expect("login").is_none());
        assert!(service.login("nobody", "admin123").expect("login").is_none());

        let issued = service
            .login("admin", "admin123")
            .expect("login")
            .expect("token issued");
        assert!(!issued.token.is_empty());
        assert!(service.authorize(&issued.token).expect("authorize"));
    }

    #[test]
    fn unknown_tokens_do_not_authorize() {
        let service = setup_service();
        assert!(!service.authorize("made-up").expect("authorize"));
    }

    #[test]
    fn expired_tokens_do_not_authorize() {
        let service = setup_service();
        service
            .database
            .with_repositories(|repos| {
                repos.admin_tokens().insert_with_id(&AdminTokenRecord {
                    id: 7,
                    token: "stale".into(),
                    created_at: Some("2020-01-01T00:00:00Z".into()),
                    expires_at: Some("2020-01-02T00:00:00Z".into()),
                })
            })
            .expect("insert stale token");
        assert!(!service.authorize("stale").expect("authorize"));
    }

    #[test]
    fn tokens_without_expiry_do_not_authorize() {
        let service = setup_service();
        service
            .database
            .with_repositories(|repos| {
                repos.admin_tokens().insert_with_id(&AdminTokenRecord {
                    id: 8,
                    token: "legacy".into(),
                    created_at: None,
                    expires_at: None,
                })
            })
            .expect("insert legacy token");
        assert!(!service.authorize("legacy").expect("authorize"));
    }
}
