//! Messages posted by page script inside a surface.
//!
//! Pages talk to the coordinator through `window.ipc.postMessage` with a
//! JSON body `{"channel": "...", "args": [...]}`. The body is untrusted:
//! only allowlisted channels are relayed, and each one is re-validated
//! before it becomes a [`RelayEventKind`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WebViewError};
use crate::events::RelayEventKind;

pub const CHANNEL_NEW_WINDOW: &str = "new-window";
pub const CHANNEL_URL_CHANGED: &str = "webview-url-changed";
pub const CHANNEL_TITLE_CHANGED: &str = "webview-title-changed";

/// Channels page script may use. Anything else is rejected and logged.
const ALLOWED_CONTENT_CHANNELS: &[&str] =
    &[CHANNEL_NEW_WINDOW, CHANNEL_URL_CHANGED, CHANNEL_TITLE_CHANGED];

pub fn is_channel_allowed(channel: &str) -> bool {
    ALLOWED_CONTENT_CHANNELS.contains(&channel)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMessage {
    pub channel: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ContentMessage {
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn new(channel: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            channel: channel.into(),
            args,
        }
    }

    fn first_string(&self) -> Option<String> {
        match self.args.first()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Validate and convert into the event relayed to the owning window.
    pub fn into_relay(self) -> Result<RelayEventKind> {
        if !is_channel_allowed(&self.channel) {
            return Err(WebViewError::InvalidMessage(format!(
                "channel {:?} is not allowed",
                self.channel
            )));
        }

        let arg = self.first_string();
        match self.channel.as_str() {
            CHANNEL_NEW_WINDOW => {
                let url = arg.map(|u| u.trim().to_string()).unwrap_or_default();
                if url.is_empty() || is_script_url(&url) {
                    return Err(WebViewError::InvalidMessage(format!(
                        "new-window with unusable url {url:?}"
                    )));
                }
                Ok(RelayEventKind::NewWindow { url })
            }
            CHANNEL_URL_CHANGED => {
                let url = arg.unwrap_or_default();
                if url.is_empty() {
                    return Err(WebViewError::InvalidMessage("url-changed without url".into()));
                }
                Ok(RelayEventKind::UrlChanged { url })
            }
            CHANNEL_TITLE_CHANGED => Ok(RelayEventKind::TitleChanged {
                title: arg.unwrap_or_default(),
            }),
            other => Err(WebViewError::InvalidMessage(format!("unhandled channel {other:?}"))),
        }
    }
}

/// Parse a raw IPC body straight into a relay event.
pub fn parse_content_message(raw: &str) -> Result<RelayEventKind> {
    ContentMessage::from_json(raw)
        .ok_or_else(|| WebViewError::InvalidMessage(format!("unparseable body ({} bytes)", raw.len())))?
        .into_relay()
}

fn is_script_url(url: &str) -> bool {
    url.get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

/// Injected into every page surface. Reports popups, in-page navigation
/// and title changes that the host would otherwise miss.
pub const CONTENT_INIT_SCRIPT: &str = r#"
(function() {
    if (window.__tabweave) { return; }
    window.__tabweave = true;

    function send(channel, args) {
        try {
            window.ipc.postMessage(JSON.stringify({ channel: channel, args: args }));
        } catch (e) {}
    }

    // Popups become tabs.
    window.open = function(url) {
        if (url) { send('new-window', [String(new URL(url, location.href))]); }
        return null;
    };
    document.addEventListener('click', function(e) {
        var a = e.target && e.target.closest ? e.target.closest('a[target="_blank"]') : null;
        if (a && a.href) {
            e.preventDefault();
            send('new-window', [a.href]);
        }
    }, true);

    // SPA navigation.
    function reportUrl() { send('webview-url-changed', [location.href]); }
    ['pushState', 'replaceState'].forEach(function(name) {
        var original = history[name];
        history[name] = function() {
            var result = original.apply(this, arguments);
            reportUrl();
            return result;
        };
    });
    window.addEventListener('popstate', reportUrl);
    window.addEventListener('hashchange', reportUrl);

    // Title changes that do not come with a navigation.
    var lastTitle = document.title;
    new MutationObserver(function() {
        if (document.title !== lastTitle) {
            lastTitle = document.title;
            send('webview-title-changed', [lastTitle]);
        }
    }).observe(document.documentElement || document, { subtree: true, childList: true, characterData: true });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allowlist() {
        assert!(is_channel_allowed("new-window"));
        assert!(is_channel_allowed("webview-url-changed"));
        assert!(is_channel_allowed("webview-title-changed"));
        assert!(!is_channel_allowed("pty_input"));
        assert!(!is_channel_allowed(""));
    }

    #[test]
    fn new_window_becomes_relay_event() {
        let event =
            parse_content_message(r#"{"channel":"new-window","args":["https://b.test"]}"#).unwrap();
        assert_eq!(event, RelayEventKind::NewWindow { url: "https://b.test".into() });
    }

    #[test]
    fn new_window_rejects_empty_and_script_urls() {
        for url in ["", "   ", "javascript:alert(1)", "JavaScript:void(0)"] {
            let msg = ContentMessage::new(CHANNEL_NEW_WINDOW, vec![json!(url)]);
            assert!(msg.into_relay().is_err(), "accepted {url:?}");
        }
        let msg = ContentMessage::new(CHANNEL_NEW_WINDOW, vec![]);
        assert!(msg.into_relay().is_err());
    }

    #[test]
    fn url_and_title_changes() {
        let url = ContentMessage::new(CHANNEL_URL_CHANGED, vec![json!("https://a.test/#/inbox")]);
        assert_eq!(
            url.into_relay().unwrap(),
            RelayEventKind::UrlChanged { url: "https://a.test/#/inbox".into() }
        );

        let title = ContentMessage::new(CHANNEL_TITLE_CHANGED, vec![json!("Inbox (3)")]);
        assert_eq!(
            title.into_relay().unwrap(),
            RelayEventKind::TitleChanged { title: "Inbox (3)".into() }
        );
    }

    #[test]
    fn non_string_args_are_stringified() {
        let msg = ContentMessage::new(CHANNEL_TITLE_CHANGED, vec![json!(42)]);
        assert_eq!(
            msg.into_relay().unwrap(),
            RelayEventKind::TitleChanged { title: "42".into() }
        );
    }

    #[test]
    fn unknown_channel_rejected() {
        let err = parse_content_message(r#"{"channel":"open-devtools","args":[]}"#).unwrap_err();
        assert!(matches!(err, WebViewError::InvalidMessage(_)));
    }

    #[test]
    fn garbage_rejected() {
        assert!(parse_content_message("not json").is_err());
        assert!(parse_content_message(r#"{"kind":"ping"}"#).is_err());
    }

    #[test]
    fn missing_args_default_to_empty() {
        let msg = ContentMessage::from_json(r#"{"channel":"webview-title-changed"}"#).unwrap();
        assert!(msg.args.is_empty());
    }
}
