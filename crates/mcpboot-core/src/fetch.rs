//! URL fetcher - turns the prompt's links into LLM context documents
//!
//! One level of discovery only: URLs found *inside* fetched bodies feed the
//! whitelist but are never fetched themselves.

use std::sync::OnceLock;
use std::time::Duration;

use futures::future::join_all;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::error::{CoreError, CoreResult};
use crate::types::FetchedContent;

/// Ceiling on extracted document text, in characters.
pub const MAX_CONTENT_CHARS: usize = 100_000;

/// Per-request fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!(
    "mcpboot/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/mcpboot/mcpboot)"
);

// Pre-compiled patterns (the URL regex runs over every prompt and document)
fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s"'<>)\]]+"#).unwrap())
}

fn github_repo_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://github\.com/([^/\s]+)/([^/\s]+?)/?$").unwrap())
}

fn html_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").unwrap())
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Elements removed together with their contents before tag stripping.
fn html_block_regexes() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        ["script", "style", "nav", "header", "footer"]
            .iter()
            .map(|tag| {
                Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap()
            })
            .collect()
    })
}

/// Extract the ordered, deduplicated list of URLs in `text`.
///
/// Trailing prose punctuation (`.,;:!?)`) is trimmed from each match.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in url_regex().find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        if !url.is_empty() && !seen.iter().any(|s| s == url) {
            seen.push(url.to_string());
        }
    }
    seen
}

/// Strip HTML down to readable text without a DOM.
fn strip_html(html: &str) -> String {
    let mut text = html.to_string();
    for re in html_block_regexes() {
        text = re.replace_all(&text, " ").into_owned();
    }
    let text = html_tag_regex().replace_all(&text, " ");
    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    whitespace_regex().replace_all(&text, " ").trim().to_string()
}

/// A bare GitHub repo URL fetches poorly (it's a JS application shell), so it
/// is rewritten to the repo's raw README.
fn rewrite_github_url(url: &str) -> Option<String> {
    github_repo_regex().captures(url).map(|caps| {
        format!(
            "https://raw.githubusercontent.com/{}/{}/HEAD/README.md",
            &caps[1], &caps[2]
        )
    })
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}

/// HTTP fetcher with the timeout and user agent the pipeline requires.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CoreError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch one URL and extract its text.
    ///
    /// The returned `url` is always the caller's original URL, even when the
    /// request was rewritten, so the whitelist learns the user-visible host.
    #[instrument(skip(self))]
    pub async fn fetch_one(&self, url: &str) -> CoreResult<FetchedContent> {
        let request_url = rewrite_github_url(url).unwrap_or_else(|| url.to_string());
        if request_url != url {
            debug!(rewritten = %request_url, "GitHub repo URL rewritten to raw README");
        }

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| CoreError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {status}"),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/plain")
            .split(';')
            .next()
            .unwrap_or("text/plain")
            .trim()
            .to_ascii_lowercase();

        let body = response.text().await.map_err(|e| CoreError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let text = if content_type == "text/html" {
            strip_html(&body)
        } else {
            body
        };

        let original_len = text.chars().count();
        let text = truncate_chars(text, MAX_CONTENT_CHARS);
        if original_len > MAX_CONTENT_CHARS {
            debug!(url, original_len, "document truncated to content ceiling");
        }

        let discovered_urls = extract_urls(&text);

        Ok(FetchedContent {
            url: url.to_string(),
            text,
            content_type,
            discovered_urls,
        })
    }

    /// Fetch all URLs in parallel. Failures are logged and dropped; an empty
    /// result is not an error (the pipeline degrades to a URL-less prompt).
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<FetchedContent> {
        let fetches = urls.iter().map(|url| self.fetch_one(url));
        let mut contents = Vec::with_capacity(urls.len());
        for (url, result) in urls.iter().zip(join_all(fetches).await) {
            match result {
                Ok(content) => contents.push(content),
                Err(e) => warn!(url = %url, error = %e, "fetch failed, dropping URL"),
            }
        }
        if !urls.is_empty() && contents.is_empty() {
            warn!("all URL fetches failed; generated tools may be degraded");
        }
        contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_urls_dedupes_in_order() {
        let urls = extract_urls(
            "See https://api.example.com/docs and https://other.io, \
             then https://api.example.com/docs again.",
        );
        assert_eq!(
            urls,
            vec!["https://api.example.com/docs", "https://other.io"]
        );
    }

    #[test]
    fn test_extract_urls_trims_prose_punctuation() {
        let urls = extract_urls("Try (https://example.com/a). Or https://example.com/b?x=1!");
        assert_eq!(
            urls,
            vec!["https://example.com/a", "https://example.com/b?x=1"]
        );
    }

    #[test]
    fn test_extract_urls_empty_prompt() {
        assert!(extract_urls("no links here").is_empty());
    }

    #[test]
    fn test_strip_html_removes_chrome_elements() {
        let html = r#"<html><head><style>body { color: red }</style>
            <script>alert("hi")</script></head>
            <body><nav>Menu</nav><header>Top</header>
            <p>Hello <b>world</b> &amp; friends</p>
            <footer>Bottom</footer></body></html>"#;
        let text = strip_html(html);
        assert_eq!(text, "Hello world & friends");
    }

    #[test]
    fn test_strip_html_decodes_entities_and_collapses_whitespace() {
        let text = strip_html("<p>a&lt;b&gt;c</p>\n\n<p>&quot;d&#39;e&nbsp;f&quot;</p>");
        assert_eq!(text, "a<b>c \"d'e f\"");
    }

    #[test]
    fn test_github_repo_rewrite() {
        assert_eq!(
            rewrite_github_url("https://github.com/acme/widget").as_deref(),
            Some("https://raw.githubusercontent.com/acme/widget/HEAD/README.md")
        );
        assert_eq!(
            rewrite_github_url("https://github.com/acme/widget/").as_deref(),
            Some("https://raw.githubusercontent.com/acme/widget/HEAD/README.md")
        );
        // Anything deeper than the repo root is left alone
        assert!(rewrite_github_url("https://github.com/acme/widget/issues/1").is_none());
        assert!(rewrite_github_url("https://example.com/acme/widget").is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(text, 4).chars().count(), 4);
    }
}
