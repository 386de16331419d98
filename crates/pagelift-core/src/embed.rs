//! Embeddable-widget resolution with bounded, batch-wise retry.
//!
//! The export represents interactive snippets as plain anchors whose
//! text is the widget URL. Each candidate is resolved through an
//! oEmbed-style endpoint; the returned frame markup replaces the anchor
//! with edit mode (and an optional theme) enabled on the frame source.
//!
//! Failures are page-local and are never raised: a page's candidates go
//! out as one parallel batch per round, only the failed subset is
//! resubmitted, and after the retry budget is exhausted the remaining
//! anchors are left exactly as they were.

use std::collections::HashMap;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};
use rayon::prelude::*;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};
use ureq::Agent;

/// Marker substring identifying embeddable-widget anchors.
const WIDGET_MARKER: &str = "codepen";

/// Marker substring excluding template placeholders from resolution.
const TEMPLATE_MARKER: &str = "is a template";

/// RFC 3986 unreserved characters stay literal in query values.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Embed resolution settings.
#[derive(Clone, Debug)]
pub struct EmbedConfig {
    /// oEmbed endpoint base URL.
    pub endpoint: String,
    /// Rendered widget height in pixels.
    pub height: u32,
    /// Theme identifier appended to generated frame URLs.
    pub theme: Option<String>,
    /// Global timeout on outbound calls.
    pub timeout: Duration,
    /// Retry rounds after the initial batch.
    pub max_retries: usize,
    /// Parallel requests per batch.
    pub pool_size: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://codepen.io/api/oembed".to_string(),
            height: 500,
            theme: None,
            timeout: Duration::from_secs(30),
            max_retries: 5,
            pool_size: 4,
        }
    }
}

/// Result of resolving one page's embeds.
#[derive(Clone, Debug, Default)]
pub struct EmbedOutcome {
    /// Page markup with resolved widgets spliced in.
    pub html: String,
    /// Candidates resolved successfully.
    pub resolved: usize,
    /// Candidates left unmodified after budget exhaustion.
    pub failed: usize,
}

/// Failure resolving a single candidate. Recorded, never raised.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Body(String),

    #[error("no frame element in embed markup")]
    MissingFrame,
}

/// Expected oEmbed response shape.
#[derive(Debug, Deserialize)]
struct OembedBody {
    html: String,
}

/// Resolves embeddable-widget anchors on a page.
pub struct EmbedResolver {
    agent: Agent,
    config: EmbedConfig,
    anchor_re: Regex,
    tag_re: Regex,
    iframe_src_re: Regex,
}

impl EmbedResolver {
    /// Create a resolver with its own HTTP agent.
    ///
    /// # Panics
    ///
    /// Panics if the internal regexes fail to compile. This should never
    /// happen as the patterns are compile-time constants.
    #[must_use]
    pub fn new(config: EmbedConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            config,
            anchor_re: Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").unwrap(),
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
            iframe_src_re: Regex::new(r#"(?is)<iframe\b[^>]*?\bsrc="([^"]*)""#).unwrap(),
        }
    }

    /// Resolve every candidate on a page.
    ///
    /// Performs no network I/O when the page has no candidates.
    #[must_use]
    pub fn resolve_page(&self, html: &str) -> EmbedOutcome {
        let candidates = self.find_candidates(html);
        if candidates.is_empty() {
            return EmbedOutcome {
                html: html.to_string(),
                ..EmbedOutcome::default()
            };
        }

        let results = self.resolve_batch(&candidates);

        // Splice resolved fragments back in, ascending by position.
        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        for (i, candidate) in candidates.iter().enumerate() {
            if let Some(fragment) = results.get(&i) {
                out.push_str(&html[cursor..candidate.start]);
                out.push_str(fragment);
                cursor = candidate.end;
            }
        }
        out.push_str(&html[cursor..]);

        EmbedOutcome {
            html: out,
            resolved: results.len(),
            failed: candidates.len() - results.len(),
        }
    }

    /// Candidate anchors: widget marker present, template marker absent.
    fn find_candidates(&self, html: &str) -> Vec<Candidate> {
        self.anchor_re
            .captures_iter(html)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let text = self.tag_re.replace_all(&caps[1], "");
                let lower = text.to_lowercase();
                if lower.contains(WIDGET_MARKER) && !lower.contains(TEMPLATE_MARKER) {
                    Some(Candidate {
                        start: whole.start(),
                        end: whole.end(),
                        url: text.trim().to_string(),
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Run batch rounds until every candidate resolved or the retry
    /// budget is exhausted. Successes are never retried.
    fn resolve_batch(&self, candidates: &[Candidate]) -> HashMap<usize, String> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pool_size.max(1))
            .build();
        let Ok(pool) = pool else {
            warn!("failed to create embed thread pool, skipping resolution");
            return HashMap::new();
        };

        let mut results: HashMap<usize, String> = HashMap::new();
        let mut pending: Vec<usize> = (0..candidates.len()).collect();

        for round in 0..=self.config.max_retries {
            if pending.is_empty() {
                break;
            }
            debug!("embed round {round}: {} candidate(s)", pending.len());

            let outcomes: Vec<(usize, Result<String, FetchError>)> = pool.install(|| {
                pending
                    .par_iter()
                    .map(|&i| (i, self.fetch_one(&candidates[i].url)))
                    .collect()
            });

            let mut failed = Vec::new();
            for (i, outcome) in outcomes {
                match outcome {
                    Ok(fragment) => {
                        results.insert(i, fragment);
                    }
                    Err(err) => {
                        warn!("embed for '{}' failed (round {round}): {err}", candidates[i].url);
                        failed.push(i);
                    }
                }
            }
            pending = failed;
        }

        for &i in &pending {
            warn!(
                "embed for '{}' unresolved after retry budget, leaving element as-is",
                candidates[i].url
            );
        }
        results
    }

    /// Resolve one candidate: call the endpoint, take the `html` field,
    /// and enable edit mode on the first frame element.
    fn fetch_one(&self, widget_url: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}?format=json&url={}&height={}",
            self.config.endpoint,
            percent_encode(widget_url.as_bytes(), QUERY_ENCODE_SET),
            self.config.height,
        );

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Status(status));
        }

        let body: OembedBody = response
            .into_body()
            .read_json()
            .map_err(|e| FetchError::Body(e.to_string()))?;

        self.enable_edit_mode(&body.html)
    }

    /// Append edit-mode (and theme) query parameters to the first frame
    /// element's source URL.
    fn enable_edit_mode(&self, fragment: &str) -> Result<String, FetchError> {
        let caps = self
            .iframe_src_re
            .captures(fragment)
            .ok_or(FetchError::MissingFrame)?;
        let src = &caps[1];

        let mut new_src = src.to_string();
        new_src.push(if src.contains('?') { '&' } else { '?' });
        new_src.push_str("editable=true");
        if let Some(theme) = &self.config.theme {
            new_src.push_str("&theme-id=");
            new_src.push_str(theme);
        }

        Ok(fragment.replacen(
            &format!(r#"src="{src}""#),
            &format!(r#"src="{new_src}""#),
            1,
        ))
    }
}

/// One candidate anchor with its byte range in the page.
#[derive(Clone, Debug)]
struct Candidate {
    start: usize,
    end: usize,
    url: String,
}
