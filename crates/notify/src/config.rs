//! Notification configuration and credentials.
//!
//! A [`NotificationConfig`] carries everything one notification attempt
//! needs: destination channel, API token, bot identity, proxy settings and
//! the enabled/errored flags the sender checks before touching the network.

use std::net::{IpAddr, Ipv6Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use url::{ParseError, Url};

use crate::error::NotifyError;

/// Default messaging API host.
pub const DEFAULT_API_BASE: &str = "https://slack.com";

/// Configuration for a single notification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Scheme and host of the messaging API.
    pub api_base: String,
    pub channel: Option<String>,
    pub team_name: Option<String>,
    pub token: Option<String>,
    pub bot_name: Option<String>,
    pub icon_url: Option<String>,
    pub proxy: ProxyConfig,
    /// File streamed as the request body instead of the attachment payload.
    pub filename: Option<PathBuf>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub enabled: bool,
    pub errored: bool,
    pub error_reason: String,
    /// Extra query parameters, in insertion order. Duplicates are kept.
    pub params: Vec<QueryParam>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            channel: None,
            team_name: None,
            token: None,
            bot_name: None,
            icon_url: None,
            proxy: ProxyConfig::default(),
            filename: None,
            enabled: false,
            errored: false,
            error_reason: String::new(),
            params: Vec::new(),
        }
    }
}

/// Outbound HTTP proxy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub host: Option<String>,
    /// Zero disables proxying.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A name/value query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl NotificationConfig {
    /// Create an enabled configuration for a channel.
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            enabled: true,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, NotifyError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NotifyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    #[must_use]
    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = Some(bot_name.into());
        self
    }

    #[must_use]
    pub fn with_icon_url(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Mark the configuration as unusable. Sends are skipped while errored.
    #[must_use]
    pub fn with_error(mut self, reason: impl Into<String>) -> Self {
        self.errored = true;
        self.error_reason = reason.into();
        self
    }

    /// Set the enabled flag from text; only "true" (any case) enables.
    pub fn set_enabled_text(&mut self, enabled: &str) {
        self.enabled = parse_enabled(enabled);
    }

    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push(QueryParam::new(name, value));
    }

    pub fn add_params(&mut self, params: impl IntoIterator<Item = QueryParam>) {
        self.params.extend(params);
    }

    /// Value of the first parameter named `name`, or "" if there is none.
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map_or("", |p| p.value.as_str())
    }

    /// Extra parameters rendered as `?k1=v1&k2=v2`, or "" when there are none.
    ///
    /// Values are emitted verbatim.
    #[must_use]
    pub fn parameters_as_query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }

        let pairs = self
            .params
            .iter()
            .map(|p| format!("{}={}", p.name, p.value))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{pairs}")
    }

    /// Channel followed by the extra parameters' query string.
    #[must_use]
    pub fn parameterised_url(&self) -> String {
        format!(
            "{}{}",
            self.channel.as_deref().unwrap_or_default(),
            self.parameters_as_query_string()
        )
    }
}

impl ProxyConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port,
            ..Self::default()
        }
    }

    /// Build from a host and a textual port.
    ///
    /// An empty port means 0. An unparsable port is logged and also means 0,
    /// which leaves proxying disabled.
    #[must_use]
    pub fn from_parts(host: impl Into<String>, port: &str) -> Self {
        Self::new(host, parse_port(port))
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Proxy URL when a host and a non-zero port are configured.
    ///
    /// The host may be a name, an IP literal (IPv6 with or without brackets)
    /// or a full URL; the configured port replaces any port it carries. A
    /// host that cannot form a URL is logged and leaves proxying disabled.
    #[must_use]
    pub fn url(&self) -> Option<Url> {
        let host = self.host.as_deref().map(str::trim).filter(|h| !h.is_empty())?;
        if self.port == 0 {
            return None;
        }

        match proxy_url(host, self.port) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(host, error = %e, "Invalid proxy host, proxy disabled");
                None
            }
        }
    }

    /// Username and password, when both are non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

fn proxy_url(host: &str, port: u16) -> Result<Url, ParseError> {
    let mut url = if host.contains("://") {
        Url::parse(host)?
    } else {
        let mut url = Url::parse("http://proxy.invalid")?;
        if let Ok(ip) = host.parse::<Ipv6Addr>() {
            url.set_ip_host(IpAddr::V6(ip))
                .map_err(|()| ParseError::InvalidIpv6Address)?;
        } else {
            url.set_host(Some(host))?;
        }
        url
    };
    url.set_port(Some(port))
        .map_err(|()| ParseError::InvalidPort)?;
    Ok(url)
}

/// Interpret a textual enabled flag. Only "true", ignoring ASCII case, is true.
#[must_use]
pub fn parse_enabled(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Parse a proxy port, falling back to 0 when the text is not a valid port.
#[must_use]
pub fn parse_port(value: &str) -> u16 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }
    value.parse().unwrap_or_else(|e| {
        warn!(port = value, error = %e, "Invalid proxy port, proxy disabled");
        0
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(b) => b,
        FlagRepr::Text(s) => parse_enabled(&s),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(i64),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PortRepr::deserialize(deserializer)? {
        PortRepr::Number(n) => u16::try_from(n).unwrap_or_else(|_| {
            warn!(port = n, "Proxy port out of range, proxy disabled");
            0
        }),
        PortRepr::Text(s) => parse_port(&s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string() {
        let mut config = NotificationConfig::default();
        assert_eq!(config.parameters_as_query_string(), "");

        config.add_param("a", "1");
        config.add_param("b", "2");
        assert_eq!(config.parameters_as_query_string(), "?a=1&b=2");
    }

    #[test]
    fn test_parameterised_url() {
        let mut config = NotificationConfig::new("#builds");
        assert_eq!(config.parameterised_url(), "#builds");

        config.add_params(vec![QueryParam::new("x", "y")]);
        assert_eq!(config.parameterised_url(), "#builds?x=y");

        assert_eq!(NotificationConfig::default().parameterised_url(), "");
    }

    #[test]
    fn test_param_lookup_first_match() {
        let mut config = NotificationConfig::default();
        config.add_param("key", "first");
        config.add_param("key", "second");
        assert_eq!(config.param("key"), "first");
        assert_eq!(config.param("missing"), "");
        assert_eq!(config.params.len(), 2);
    }

    #[test]
    fn test_parse_enabled() {
        assert!(parse_enabled("true"));
        assert!(parse_enabled("TRUE"));
        assert!(parse_enabled("True"));
        assert!(!parse_enabled("yes"));
        assert!(!parse_enabled(""));

        let mut config = NotificationConfig::default();
        config.set_enabled_text("tRuE");
        assert!(config.enabled);
        config.set_enabled_text("false");
        assert!(!config.enabled);
    }

    #[test]
    fn test_parse_port_fallback() {
        assert_eq!(parse_port("8080"), 8080);
        assert_eq!(parse_port(""), 0);
        assert_eq!(parse_port("not-a-port"), 0);
        assert_eq!(parse_port("70000"), 0);
    }

    #[test]
    fn test_proxy_from_parts() {
        let proxy = ProxyConfig::from_parts("proxy.local", "3128");
        assert_eq!(
            proxy.url().map(String::from).as_deref(),
            Some("http://proxy.local:3128/")
        );

        let proxy = ProxyConfig::from_parts("proxy.local", "abc");
        assert_eq!(proxy.port, 0);
        assert_eq!(proxy.url(), None);

        let proxy = ProxyConfig::new("", 3128);
        assert_eq!(proxy.url(), None);
    }

    #[test]
    fn test_proxy_ipv6_host() {
        let proxy = ProxyConfig::new("::1", 3128);
        assert_eq!(
            proxy.url().map(String::from).as_deref(),
            Some("http://[::1]:3128/")
        );

        let proxy = ProxyConfig::new("[::1]", 3128);
        assert_eq!(
            proxy.url().map(String::from).as_deref(),
            Some("http://[::1]:3128/")
        );
    }

    #[test]
    fn test_proxy_host_with_scheme_and_port() {
        let proxy = ProxyConfig::new("http://proxy.local:8080", 3128);
        assert_eq!(
            proxy.url().map(String::from).as_deref(),
            Some("http://proxy.local:3128/")
        );

        let proxy = ProxyConfig::new("https://proxy.local", 3128);
        assert_eq!(
            proxy.url().map(String::from).as_deref(),
            Some("https://proxy.local:3128/")
        );
    }

    #[test]
    fn test_proxy_invalid_host_disables_proxy() {
        let proxy = ProxyConfig::new("bad host name", 3128);
        assert_eq!(proxy.url(), None);

        let proxy = ProxyConfig::new("http://::1", 3128);
        assert_eq!(proxy.url(), None);
    }

    #[test]
    fn test_proxy_credentials_need_both() {
        let proxy = ProxyConfig::new("proxy.local", 3128);
        assert_eq!(proxy.credentials(), None);

        let proxy = proxy.with_credentials("user", "");
        assert_eq!(proxy.credentials(), None);

        let proxy = proxy.with_credentials("user", "secret");
        assert_eq!(proxy.credentials(), Some(("user", "secret")));
    }

    #[test]
    fn test_defaults() {
        let config = NotificationConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(!config.enabled);
        assert!(!config.errored);
        assert_eq!(config.proxy.port, 0);
    }

    #[test]
    fn test_from_toml() {
        let config = NotificationConfig::from_toml_str(
            r##"
            channel = "#builds"
            token = "xoxb-123"
            bot_name = "CI"
            enabled = "TRUE"

            [proxy]
            host = "proxy.local"
            port = "bogus"
            username = "user"
            password = "pass"

            [[params]]
            name = "a"
            value = "1"
            "##,
        )
        .unwrap();

        assert_eq!(config.channel.as_deref(), Some("#builds"));
        assert_eq!(config.token.as_deref(), Some("xoxb-123"));
        assert!(config.enabled);
        assert_eq!(config.proxy.port, 0);
        assert_eq!(config.proxy.credentials(), Some(("user", "pass")));
        assert_eq!(config.parameters_as_query_string(), "?a=1");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_from_toml_numeric_port_and_bool_flag() {
        let config = NotificationConfig::from_toml_str(
            r#"
            enabled = true

            [proxy]
            host = "proxy.local"
            port = 8080
            "#,
        )
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.proxy.port, 8080);
    }

    #[test]
    fn test_with_error() {
        let config = NotificationConfig::new("#builds").with_error("token revoked");
        assert!(config.enabled);
        assert!(config.errored);
        assert_eq!(config.error_reason, "token revoked");
    }
}
