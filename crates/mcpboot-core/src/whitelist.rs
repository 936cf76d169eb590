//! Domain whitelist and the gated fetch capability
//!
//! The whitelist is the single authority on which hosts generated code may
//! reach. Handler code never sees an HTTP client that doesn't check it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{CoreError, CoreResult};
use crate::types::FetchedContent;

/// Immutable set of bare hostnames with a subdomain-aware membership test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Whitelist {
    domains: BTreeSet<String>,
}

impl Whitelist {
    /// Collect hostnames from the prompt's URLs and every URL discovered in
    /// fetched content. Malformed URLs are silently skipped.
    pub fn build(prompt_urls: &[String], contents: &[FetchedContent]) -> Self {
        let mut domains = BTreeSet::new();
        let all_urls = prompt_urls
            .iter()
            .chain(contents.iter().flat_map(|c| c.discovered_urls.iter()));
        for url in all_urls {
            if let Some(host) = hostname_of(url) {
                domains.insert(host);
            }
        }
        Self { domains }
    }

    /// Rebuild a whitelist from persisted domains (cache-hit restart path).
    pub fn from_domains(domains: impl IntoIterator<Item = String>) -> Self {
        Self {
            domains: domains.into_iter().collect(),
        }
    }

    /// A host is allowed if it equals a member or is a proper subdomain of
    /// one. Whitelisting `api.example.com` does not admit `example.com`.
    pub fn allows(&self, url: &str) -> bool {
        let Some(host) = hostname_of(url) else {
            return false;
        };
        self.domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }

    /// Member domains, sorted, for persistence and prompts.
    pub fn domains(&self) -> Vec<String> {
        self.domains.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Request options a handler may pass to its `fetch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequestInit {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
}

/// What the capability hands back across the sandbox boundary: plain data,
/// never a host Response object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatedResponse {
    pub status: u16,
    pub ok: bool,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// An outbound-HTTP capability that checks the whitelist before any socket
/// work. This is the only side-effecting primitive generated code receives.
#[derive(Clone)]
pub struct GatedFetch {
    whitelist: Arc<Whitelist>,
}

impl GatedFetch {
    pub fn new(whitelist: Whitelist) -> Self {
        Self {
            whitelist: Arc::new(whitelist),
        }
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Perform a whitelisted request.
    ///
    /// The two failure messages are contract: they tell the prompt author
    /// exactly how to unblock a domain.
    pub async fn fetch(
        &self,
        url: &str,
        init: Option<FetchRequestInit>,
    ) -> CoreResult<GatedResponse> {
        let parsed = Url::parse(url)
            .map_err(|_| CoreError::FetchBlocked("invalid URL".to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| CoreError::FetchBlocked("invalid URL".to_string()))?
            .to_ascii_lowercase();

        if !self.whitelist.allows(url) {
            return Err(CoreError::FetchBlocked(format!(
                "domain \"{host}\" not in whitelist. Add it to your prompt to allow access."
            )));
        }

        let init = init.unwrap_or_default();
        let method: reqwest::Method = init
            .method
            .as_deref()
            .unwrap_or("GET")
            .to_ascii_uppercase()
            .parse()
            .map_err(|_| CoreError::FetchBlocked("invalid method".to_string()))?;

        debug!(%method, url, "gated fetch");

        // Each invocation runs on its own short-lived runtime; a shared
        // connection pool would not survive it, so the client is per-request.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("mcpboot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let mut request = client.request(method, parsed);
        for (name, value) in &init.headers {
            request = request.header(name, value);
        }
        if let Some(body) = init.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| CoreError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| CoreError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(GatedResponse {
            status: status.as_u16(),
            ok: status.is_success(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
