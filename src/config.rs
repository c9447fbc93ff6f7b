use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GuestbookConfig {
    pub api_port: u16,
    pub paths: GuestbookPaths,
    pub admin: AdminConfig,
    pub dingtalk: DingTalkConfig,
    pub location: LocationConfig,
}

impl GuestbookConfig {
    pub fn from_env() -> Result<Self> {
        let paths = GuestbookPaths::discover()?;
        let api_port = env::var("GUESTBOOK_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let admin = AdminConfig::from_env();
        let dingtalk = DingTalkConfig::from_env();
        let location = LocationConfig::from_env();
        Ok(Self {
            api_port,
            paths,
            admin,
            dingtalk,
            location,
        })
    }
}

/// Seed credentials for the single admin account. Compared for equality only;
/// the row is inserted on first startup so backups carry it.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl AdminConfig {
    pub fn from_env() -> Self {
        let username = env::var("ADMIN_USERNAME")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| "admin".to_string());
        let password = env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| "admin123".to_string());
        Self { username, password }
    }
}

#[derive(Debug, Clone)]
pub struct DingTalkConfig {
    pub access_token: Option<String>,
    pub secret: Option<String>,
    /// Robot endpoint. Overridable so tests can point dispatch at a stub.
    pub webhook_url: String,
    /// Admin console URL embedded in the "go reply" card button.
    pub admin_url: String,
}

impl DingTalkConfig {
    pub fn from_env() -> Self {
        let access_token = env::var("DINGTALK_ACCESS_TOKEN").ok().and_then(non_empty);
        let secret = env::var("DINGTALK_SECRET").ok().and_then(non_empty);
        let webhook_url = env::var("DINGTALK_WEBHOOK_URL")
            .ok()
            .and_then(non_empty)
            .unwrap_or_else(|| "https://oapi.dingtalk.com/robot/send".to_string());
        let admin_url = env::var("ADMIN_URL")
            .ok()
            .and_then(non_empty)
            .unwrap_or_else(|| "https://www.176170.xyz/adminlogin.html".to_string());
        Self {
            access_token,
            secret,
            webhook_url,
            admin_url,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocationConfig {
    pub tencent_map_key: Option<String>,
}

impl LocationConfig {
    pub fn from_env() -> Self {
        let tencent_map_key = env::var("TENCENT_MAP_KEY").ok().and_then(non_empty);
        Self { tencent_map_key }
    }
}

fn non_empty(raw: String) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GuestbookPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
}

impl GuestbookPaths {
    pub fn discover() -> Result<Self> {
        if let Ok(dir) = env::var("GUESTBOOK_DATA_DIR") {
            if !dir.trim().is_empty() {
                return Self::from_base_dir(dir);
            }
        }
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("guestbook.db");
        Ok(Self {
            base,
            data_dir,
            db_path,
        })
    }
}
