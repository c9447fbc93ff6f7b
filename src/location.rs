use crate::config::LocationConfig;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

/// Sentinel returned whenever no provider can resolve the address.
pub const UNKNOWN_LOCATION: &str = "未知";

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves an IP address to a human-readable region string.
///
/// Providers are tried in order with a bounded timeout each: Tencent's map
/// API (needs a key), then ipinfo.io. Provider errors fall through to the
/// next provider; exhaustion yields [`UNKNOWN_LOCATION`], never an error.
#[derive(Clone)]
pub struct GeoLocator {
    config: LocationConfig,
    client: reqwest::Client,
}

impl GeoLocator {
    pub fn new(config: LocationConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub async fn locate(&self, ip: &str) -> String {
        if is_unroutable(ip) {
            return UNKNOWN_LOCATION.to_string();
        }
        match self.lookup_tencent(ip).await {
            Ok(Some(location)) => return location,
            Ok(None) => {}
            Err(err) => tracing::warn!("Tencent map lookup failed for {}: {}", ip, err),
        }
        match self.lookup_ipinfo(ip).await {
            Ok(Some(location)) => return location,
            Ok(None) => {}
            Err(err) => tracing::warn!("ipinfo lookup failed for {}: {}", ip, err),
        }
        UNKNOWN_LOCATION.to_string()
    }

    async fn lookup_tencent(&self, ip: &str) -> Result<Option<String>> {
        let Some(key) = &self.config.tencent_map_key else {
            tracing::debug!("no Tencent map key configured, skipping provider");
            return Ok(None);
        };
        let url = format!(
            "https://apis.map.qq.com/ws/location/v1/ip?ip={}&key={}&output=json",
            urlencoding::encode(ip),
            key
        );
        let response = self
            .client
            .get(&url)
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::warn!("Tencent map API returned {}", response.status());
            return Ok(None);
        }
        let data: Value = response.json().await?;
        if data.get("status").and_then(Value::as_i64) != Some(0) {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            tracing::warn!("Tencent map API error: {}", message);
            return Ok(None);
        }
        let Some(ad_info) = data.get("result").and_then(|result| result.get("ad_info")) else {
            return Ok(None);
        };
        // a successful response settles the lookup even when it composes to
        // the unknown sentinel
        Ok(Some(compose_tencent_location(ad_info)))
    }

    async fn lookup_ipinfo(&self, ip: &str) -> Result<Option<String>> {
        let url = format!("https://ipinfo.io/{}/json", urlencoding::encode(ip));
        let response = self
            .client
            .get(&url)
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::warn!("ipinfo returned {}", response.status());
            return Ok(None);
        }
        let data: Value = response.json().await?;
        Ok(compose_ipinfo_location(&data))
    }
}

/// Loopback and placeholder addresses resolve locally; no provider is asked.
pub fn is_unroutable(ip: &str) -> bool {
    ip.is_empty() || ip == UNKNOWN_LOCATION || ip == "127.0.0.1" || ip == "::1"
}

/// Concatenates nation/province/city/district, dropping the home country
/// and any level that merely repeats its parent (municipalities report
/// city == province). Falls back to the bare district code, then the
/// unknown sentinel.
fn compose_tencent_location(ad_info: &Value) -> String {
    let nation = text_field(ad_info, "nation");
    let province = text_field(ad_info, "province");
    let city = text_field(ad_info, "city");
    let district = text_field(ad_info, "district");

    let mut location = String::new();
    if let Some(nation) = nation.as_deref() {
        if nation != "中国" {
            location.push_str(nation);
        }
    }
    if let Some(value) = province.as_deref() {
        if Some(value) != nation.as_deref() {
            location.push_str(value);
        }
    }
    if let Some(value) = city.as_deref() {
        if Some(value) != province.as_deref() {
            location.push_str(value);
        }
    }
    if let Some(value) = district.as_deref() {
        if Some(value) != city.as_deref() {
            location.push_str(value);
        }
    }
    if location.is_empty() {
        if let Some(adcode) = text_field(ad_info, "adcode") {
            location = format!("地区代码:{adcode}");
        }
    }
    if location.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        location
    }
}

/// ipinfo answers count only when a country is present; CN is dropped so
/// domestic results read as region+city.
fn compose_ipinfo_location(data: &Value) -> Option<String> {
    let country = text_field(data, "country")?;
    let mut location = String::new();
    if country != "CN" {
        location.push_str(&country);
    }
    if let Some(region) = text_field(data, "region") {
        location.push_str(&region);
    }
    if let Some(city) = text_field(data, "city") {
        location.push_str(&city);
    }
    Some(if location.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        location
    })
}

// providers send adcode as either a number or a string
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loopback_and_placeholder_addresses_are_unroutable() {
        assert!(is_unroutable(""));
        assert!(is_unroutable("未知"));
        assert!(is_unroutable("127.0.0.1"));
        assert!(is_unroutable("::1"));
        assert!(!is_unroutable("220.128.168.9"));
    }

    #[test]
    fn domestic_lookups_drop_the_home_country() {
        let ad_info = json!({
            "nation": "中国",
            "province": "广东省",
            "city": "广州市",
            "district": "天河区"
        });
        assert_eq!(compose_tencent_location(&ad_info), "广东省广州市天河区");
    }

    #[test]
    fn foreign_lookups_keep_the_country() {
        let ad_info = json!({
            "nation": "美国",
            "province": "加利福尼亚州",
            "city": "洛杉矶市"
        });
        assert_eq!(
            compose_tencent_location(&ad_info),
            "美国加利福尼亚州洛杉矶市"
        );
    }

    #[test]
    fn municipalities_do_not_repeat_the_city() {
        let ad_info = json!({
            "nation": "中国",
            "province": "北京市",
            "city": "北京市",
            "district": "朝阳区"
        });
        assert_eq!(compose_tencent_location(&ad_info), "北京市朝阳区");
    }

    #[test]
    fn bare_adcode_answers_use_the_code() {
        assert_eq!(
            compose_tencent_location(&json!({"adcode": 440305})),
            "地区代码:440305"
        );
        assert_eq!(
            compose_tencent_location(&json!({"adcode": "440305"})),
            "地区代码:440305"
        );
    }

    #[test]
    fn empty_answers_become_the_unknown_sentinel() {
        assert_eq!(compose_tencent_location(&json!({})), UNKNOWN_LOCATION);
        assert_eq!(
            compose_tencent_location(&json!({"nation": "中国"})),
            UNKNOWN_LOCATION
        );
    }

    #[test]
    fn ipinfo_composition_mirrors_the_tencent_rules() {
        assert_eq!(
            compose_ipinfo_location(&json!({
                "country": "US",
                "region": "California",
                "city": "Los Angeles"
            }))
            .as_deref(),
            Some("USCaliforniaLos Angeles")
        );
        assert_eq!(
            compose_ipinfo_location(&json!({
                "country": "CN",
                "region": "Guangdong",
                "city": "Guangzhou"
            }))
            .as_deref(),
            Some("GuangdongGuangzhou")
        );
        assert_eq!(
            compose_ipinfo_location(&json!({"country": "CN"})).as_deref(),
            Some(UNKNOWN_LOCATION)
        );
        assert_eq!(compose_ipinfo_location(&json!({"ip": "1.2.3.4"})), None);
    }
}
