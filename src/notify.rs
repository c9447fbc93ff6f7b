use crate::config::DingTalkConfig;
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Everything the robot card needs about a freshly submitted comment.
#[derive(Debug, Clone)]
pub struct CommentNotification {
    pub name: String,
    pub content: String,
    pub ip: Option<String>,
    pub location: Option<String>,
    pub comment_id: String,
}

/// Posts signed actionCard messages to a DingTalk group robot.
///
/// Delivery is best effort end to end: missing credentials skip the call,
/// and transport or remote errors are logged without reaching the caller.
#[derive(Clone)]
pub struct DingTalkNotifier {
    config: DingTalkConfig,
    client: reqwest::Client,
}

impl DingTalkNotifier {
    pub fn new(config: DingTalkConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub async fn dispatch(&self, notification: CommentNotification) {
        if let Err(err) = self.send(&notification).await {
            tracing::warn!("failed to deliver DingTalk notification: {}", err);
        }
    }

    async fn send(&self, notification: &CommentNotification) -> Result<()> {
        let (Some(access_token), Some(secret)) =
            (&self.config.access_token, &self.config.secret)
        else {
            tracing::warn!("DingTalk robot not configured, skipping notification");
            return Ok(());
        };

        let timestamp = Utc::now().timestamp_millis();
        let sign = sign_request(secret, timestamp)?;
        let url = format!(
            "{}?access_token={}&timestamp={}&sign={}",
            self.config.webhook_url, access_token, timestamp, sign
        );

        let card = build_card(
            &notification.name,
            &notification.content,
            notification.location.as_deref(),
            &format_beijing_time(Utc::now())?,
            &self.config.admin_url,
            &notification.comment_id,
        );

        let response = self.client.post(&url).json(&card).send().await?;
        let result: Value = response
            .json()
            .await
            .context("DingTalk response was not JSON")?;
        let errcode = result.get("errcode").and_then(Value::as_i64).unwrap_or(-1);
        if errcode != 0 {
            tracing::warn!(errcode, response = %result, "DingTalk rejected the notification");
        }
        Ok(())
    }
}

/// Query-string signature the robot API expects: HMAC-SHA256 over
/// `"<millis>\n<secret>"` keyed with the secret, base64'd, URL-encoded.
fn sign_request(secret: &str, timestamp_millis: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| anyhow!("unusable webhook secret: {err}"))?;
    mac.update(format!("{timestamp_millis}\n{secret}").as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(urlencoding::encode(&STANDARD.encode(digest)).into_owned())
}

fn format_beijing_time(now: DateTime<Utc>) -> Result<String> {
    let beijing = FixedOffset::east_opt(8 * 3600).context("UTC+8 offset out of range")?;
    Ok(now
        .with_timezone(&beijing)
        .format("%Y/%m/%d %H:%M:%S")
        .to_string())
}

fn build_card(
    name: &str,
    content: &str,
    location: Option<&str>,
    time: &str,
    admin_url: &str,
    comment_id: &str,
) -> Value {
    let comment_url = format!("{admin_url}#comment-{comment_id}");
    let text = format!(
        "💬你有新的留言：\n- 📞联系方式：{name}\n- 📝留言内容：{content}\n- 🌏来自：{}\n- ⏰时间：{time}",
        location.unwrap_or("未知")
    );
    json!({
        "msgtype": "actionCard",
        "actionCard": {
            "title": "你有新的留言",
            "text": text,
            "btnOrientation": "1",
            "btns": [
                { "title": "去回复", "actionURL": comment_url },
                { "title": "忽略", "actionURL": "" }
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn signature_is_deterministic_and_url_safe() {
        let first = sign_request("SECabc123", 1700000000000).expect("sign");
        let second = sign_request("SECabc123", 1700000000000).expect("sign");
        assert_eq!(first, second);
        assert!(!first.contains('+'));
        assert!(!first.contains('/'));
        assert!(!first.contains('='));
    }

    #[test]
    fn signature_decodes_to_a_sha256_digest() {
        let sign = sign_request("SECabc123", 1700000000000).expect("sign");
        let decoded = urlencoding::decode(&sign).expect("urldecode");
        let digest = STANDARD.decode(decoded.as_bytes()).expect("base64");
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn different_timestamps_produce_different_signatures() {
        let first = sign_request("SECabc123", 1700000000000).expect("sign");
        let second = sign_request("SECabc123", 1700000000001).expect("sign");
        assert_ne!(first, second);
    }

    #[test]
    fn beijing_time_is_utc_plus_eight() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 18, 30, 45).unwrap();
        assert_eq!(format_beijing_time(utc).expect("format"), "2024/01/16 02:30:45");
    }

    #[test]
    fn card_carries_the_unmasked_contact_and_deep_link() {
        let card = build_card(
            "qq:123456789",
            "你好",
            Some("广东省广州市"),
            "2024/01/16 02:30:45",
            "https://example.com/adminlogin.html",
            "42",
        );
        assert_eq!(card["msgtype"], "actionCard");
        assert_eq!(card["actionCard"]["title"], "你有新的留言");
        assert_eq!(card["actionCard"]["btnOrientation"], "1");
        let text = card["actionCard"]["text"].as_str().expect("text");
        assert!(text.contains("📞联系方式：qq:123456789"));
        assert!(text.contains("📝留言内容：你好"));
        assert!(text.contains("🌏来自：广东省广州市"));
        assert!(text.contains("⏰时间：2024/01/16 02:30:45"));
        assert_eq!(
            card["actionCard"]["btns"][0]["actionURL"],
            "https://example.com/adminlogin.html#comment-42"
        );
        assert_eq!(card["actionCard"]["btns"][1]["actionURL"], "");
    }

    #[test]
    fn missing_location_falls_back_to_the_unknown_sentinel() {
        let card = build_card("wx:abcdwxyz", "hi", None, "2024/01/01 00:00:00", "https://a", "7");
        let text = card["actionCard"]["text"].as_str().expect("text");
        assert!(text.contains("🌏来自：未知"));
    }
}
