//! HTTP invoker — curl-equivalent web requests standing in for a real
//! browser, with browser-matching headers so the traffic blends in.

use async_trait::async_trait;
use serde::Deserialize;
use wraith_core::{HandlerType, Result, TimelineEvent, TimelineHandler, WraithError};
use wraith_engine::{ActionInvoker, ActionSession};

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 KHTML Chrome/97.0.4692.99 Safari/537.36";
const FIREFOX_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:96.0) Gecko/20100101 Firefox/96.0";
const CURL_UA: &str = "curl/8.5.0";

/// Factory for HTTP sessions. The user agent follows the handler type.
pub struct HttpInvoker;

impl HttpInvoker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionInvoker for HttpInvoker {
    fn name(&self) -> &str {
        "http"
    }

    async fn open(&self, handler: &TimelineHandler) -> Result<Box<dyn ActionSession>> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent_for(handler.handler_type))
            .cookie_store(true)
            .build()
            .map_err(|e| WraithError::Setup(format!("Failed to build HTTP client: {e}")))?;
        Ok(Box::new(HttpSession { client }))
    }
}

fn user_agent_for(handler_type: HandlerType) -> &'static str {
    match handler_type {
        HandlerType::BrowserFirefox => FIREFOX_UA,
        HandlerType::Curl => CURL_UA,
        _ => CHROME_UA,
    }
}

/// One request, parsed from a command argument: a bare URL, or a JSON
/// object like `{ "method": "POST", "url": "...", "body": "..." }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestSpec {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

impl RequestSpec {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.starts_with('{') {
            serde_json::from_str(raw)
                .map_err(|e| WraithError::Action(format!("Bad request spec '{raw}': {e}")))
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            Ok(Self {
                method: default_method(),
                url: raw.to_string(),
                body: None,
            })
        } else {
            Err(WraithError::Action(format!(
                "Not a url or request spec: '{raw}'"
            )))
        }
    }
}

struct HttpSession {
    client: reqwest::Client,
}

#[async_trait]
impl ActionSession for HttpSession {
    async fn execute(
        &mut self,
        command: &str,
        args: &[String],
        _event: &TimelineEvent,
    ) -> Result<String> {
        // `browse <url>` forms carry the target in args; a random pick
        // arrives as the command itself
        let raw = match command {
            "browse" | "download" | "fetch" => args.first().map(String::as_str).ok_or_else(
                || WraithError::Action(format!("'{command}' needs a url argument")),
            )?,
            _ => command,
        };
        let spec = RequestSpec::parse(raw)?;

        let request = match spec.method.to_uppercase().as_str() {
            "POST" => self.client.post(&spec.url),
            "PUT" => self.client.put(&spec.url),
            "DELETE" => self.client.delete(&spec.url),
            "HEAD" => self.client.head(&spec.url),
            _ => self.client.get(&spec.url),
        };
        let request = match &spec.body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(body.clone()),
            None => request,
        };

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::debug!("{} {} → {status}", spec.method, spec.url);
                // drain the body the way a browser would
                let _ = response.bytes().await;
                Ok(status.to_string())
            }
            Err(e) => Err(WraithError::Action(format!(
                "{} {} failed: {e}",
                spec.method, spec.url
            ))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_url_is_a_get() {
        let spec = RequestSpec::parse("https://example.com/news").unwrap();
        assert_eq!(spec.method, "GET");
        assert_eq!(spec.url, "https://example.com/news");
        assert_eq!(spec.body, None);
    }

    #[test]
    fn object_form_carries_method_and_body() {
        let spec = RequestSpec::parse(
            r#"{ "method": "POST", "url": "https://example.com/search", "body": "{\"q\":\"shoes\"}" }"#,
        )
        .unwrap();
        assert_eq!(spec.method, "POST");
        assert!(spec.body.is_some());
    }

    #[test]
    fn garbage_is_an_action_error() {
        assert!(matches!(
            RequestSpec::parse("whoami").unwrap_err(),
            WraithError::Action(_)
        ));
        assert!(matches!(
            RequestSpec::parse("{ not json").unwrap_err(),
            WraithError::Action(_)
        ));
        assert!(matches!(
            RequestSpec::parse("ftp://example.com").unwrap_err(),
            WraithError::Action(_)
        ));
    }

    #[test]
    fn user_agent_follows_handler_type() {
        assert!(user_agent_for(HandlerType::BrowserChrome).contains("Chrome"));
        assert!(user_agent_for(HandlerType::BrowserFirefox).contains("Firefox"));
        assert!(user_agent_for(HandlerType::Curl).starts_with("curl/"));
    }
}
