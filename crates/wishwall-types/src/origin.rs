use serde::{Deserialize, Serialize};

/// Longest user agent string kept in device info.
pub const MAX_USER_AGENT_LEN: usize = 200;

/// Best-effort fingerprint attached to an entry at submission time.
///
/// Collected for external analytics only. Cookie *values* are never recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<CookieSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: String,
    pub browser: String,
    pub os: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub user_agent: String,
}

impl DeviceInfo {
    /// Coarse classification from a user agent string.
    pub fn from_user_agent(user_agent: &str, platform: &str, language: &str) -> Self {
        Self {
            device_type: device_type(user_agent).to_string(),
            browser: browser(user_agent).to_string(),
            os: operating_system(user_agent).to_string(),
            platform: platform.to_string(),
            language: language.to_string(),
            user_agent: user_agent.chars().take(MAX_USER_AGENT_LEN).collect(),
        }
    }
}

fn device_type(ua: &str) -> &'static str {
    if ua.contains("iPad") {
        "tablet"
    } else if ["Mobile", "Android", "iPhone"].iter().any(|m| ua.contains(m)) {
        "mobile"
    } else {
        "desktop"
    }
}

// Edge and Opera both advertise "Chrome", and Chrome advertises "Safari",
// so the more specific tokens are checked first.
fn browser(ua: &str) -> &'static str {
    if ua.contains("Edg") {
        "Edge"
    } else if ua.contains("OPR") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Chrome") {
        "Chrome"
    } else if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Safari") {
        "Safari"
    } else {
        "unknown"
    }
}

fn operating_system(ua: &str) -> &'static str {
    if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iOS") {
        "iOS"
    } else if ua.contains("Mac") {
        "macOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        "unknown"
    }
}

/// Presence and count of cookies visible to the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSummary {
    pub enabled: bool,
    pub count: usize,
}

impl CookieSummary {
    /// Summarize a raw `name=value; name2=value2` cookie string.
    /// `None` means cookies are unavailable.
    pub fn from_header(raw: Option<&str>) -> Self {
        match raw {
            None => Self::default(),
            Some(raw) => Self {
                enabled: true,
                count: raw
                    .split(';')
                    .filter_map(|pair| pair.split('=').next())
                    .filter(|name| !name.trim().is_empty())
                    .count(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const FIREFOX_ANDROID: &str =
        "Mozilla/5.0 (Android 14; Mobile; rv:121.0) Gecko/121.0 Firefox/121.0";
    const OPERA_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 OPR/106.0.0.0";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_classifies_common_agents() {
        let info = DeviceInfo::from_user_agent(CHROME_WIN, "Win32", "en-US");
        assert_eq!((info.device_type.as_str(), info.browser.as_str(), info.os.as_str()), ("desktop", "Chrome", "Windows"));

        let info = DeviceInfo::from_user_agent(EDGE_WIN, "Win32", "en-US");
        assert_eq!(info.browser, "Edge");

        let info = DeviceInfo::from_user_agent(SAFARI_IPHONE, "iPhone", "en-GB");
        assert_eq!((info.device_type.as_str(), info.browser.as_str(), info.os.as_str()), ("mobile", "Safari", "iOS"));

        let info = DeviceInfo::from_user_agent(FIREFOX_ANDROID, "Linux armv8l", "de-DE");
        assert_eq!((info.device_type.as_str(), info.browser.as_str(), info.os.as_str()), ("mobile", "Firefox", "Android"));

        let info = DeviceInfo::from_user_agent(OPERA_MAC, "MacIntel", "en-US");
        assert_eq!((info.browser.as_str(), info.os.as_str()), ("Opera", "macOS"));

        let info = DeviceInfo::from_user_agent(SAFARI_IPAD, "iPad", "fr-FR");
        assert_eq!(info.device_type, "tablet");
        assert_eq!(info.language, "fr-FR");
    }

    #[test]
    fn test_user_agent_truncated() {
        let long = "é".repeat(500);
        let info = DeviceInfo::from_user_agent(&long, "", "");
        assert_eq!(info.user_agent.chars().count(), MAX_USER_AGENT_LEN);
        assert_eq!(info.browser, "unknown");
        assert_eq!(info.os, "unknown");
    }

    #[test]
    fn test_cookie_summary_counts_names_only() {
        let summary = CookieSummary::from_header(Some("session=secret; theme=dark; ;"));
        assert_eq!(summary, CookieSummary { enabled: true, count: 2 });

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("secret"));

        assert_eq!(CookieSummary::from_header(Some("")), CookieSummary { enabled: true, count: 0 });
        assert_eq!(CookieSummary::from_header(None), CookieSummary::default());
    }
}
