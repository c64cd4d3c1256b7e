//! Cookie records and the matching rules used by in-process sessions.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HostError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// URL the cookie was set for. Used to derive domain and path.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// Seconds since the UNIX epoch. `None` for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
}

impl Cookie {
    pub fn new(url: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            expiration_date: None,
        }
    }

    /// Fill in domain and path from the URL the cookie is set for.
    pub fn normalized(mut self) -> Result<Self, HostError> {
        if self.name.is_empty() {
            return Err(HostError::Cookie("cookie name must not be empty".into()));
        }
        let url = Url::parse(&self.url)
            .map_err(|e| HostError::Cookie(format!("invalid cookie url {:?}: {e}", self.url)))?;
        let host = url
            .host_str()
            .ok_or_else(|| HostError::Cookie(format!("cookie url {:?} has no host", self.url)))?;

        match self.domain.as_deref() {
            None | Some("") => self.domain = Some(host.to_ascii_lowercase()),
            Some(domain) => {
                if !domain_matches(host, domain) {
                    return Err(HostError::Cookie(format!(
                        "domain {domain} does not cover {host}"
                    )));
                }
                self.domain = Some(domain.trim_start_matches('.').to_ascii_lowercase());
            }
        }
        if self.path.as_deref().map_or(true, str::is_empty) {
            self.path = Some("/".to_string());
        }
        Ok(self)
    }

    pub fn is_session(&self) -> bool {
        self.expiration_date.is_none()
    }

    fn same_identity(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    /// Whether the cookie would be sent with a request to `url`.
    pub fn applies_to(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let domain_ok = self
            .domain
            .as_deref()
            .map_or(false, |domain| domain_matches(host, domain));
        let path_ok = path_matches(url.path(), self.path.as_deref().unwrap_or("/"));
        let secure_ok = !self.secure || url.scheme() == "https";
        domain_ok && path_ok && secure_ok
    }
}

/// Query for [`crate::host::Session::get_cookies`]. Empty filter matches all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CookieFilter {
    pub url: Option<String>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: Option<bool>,
    pub session: Option<bool>,
}

impl CookieFilter {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, cookie: &Cookie) -> bool {
        if let Some(url) = &self.url {
            match Url::parse(url) {
                Ok(url) if cookie.applies_to(&url) => {}
                _ => return false,
            }
        }
        if self.name.as_ref().is_some_and(|name| name != &cookie.name) {
            return false;
        }
        if let Some(domain) = &self.domain {
            let covered = cookie
                .domain
                .as_deref()
                .is_some_and(|cd| domain_matches(cd, domain));
            if !covered {
                return false;
            }
        }
        if self.path.is_some() && self.path != cookie.path {
            return false;
        }
        if self.secure.is_some_and(|secure| secure != cookie.secure) {
            return false;
        }
        if self.session.is_some_and(|session| session != cookie.is_session()) {
            return false;
        }
        true
    }
}

/// `host` equals `domain` or is a subdomain of it. A leading dot on
/// `domain` is ignored.
pub fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{domain}"))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// An ordered set of cookies keyed by (name, domain, path).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. The cookie must already be normalized.
    pub fn set(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.same_identity(&cookie)) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn get(&self, filter: &CookieFilter) -> Vec<Cookie> {
        self.cookies
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    /// Remove cookies named `name` that apply to `url`. Returns how many
    /// were removed.
    pub fn remove(&mut self, url: &str, name: &str) -> Result<usize, HostError> {
        let url = Url::parse(url)
            .map_err(|e| HostError::Cookie(format!("invalid cookie url {url:?}: {e}")))?;
        let before = self.cookies.len();
        self.cookies
            .retain(|c| !(c.name == name && c.applies_to(&url)));
        Ok(before - self.cookies.len())
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
