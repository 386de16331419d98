//! Stylesheet and script injection.
//!
//! Rewritten pages get the site's local stylesheets and scripts injected:
//! `<link>` elements before `</head>`, `<script>` elements before
//! `</body>`, and an optional post-body script block after `</body>`.
//! Injected URLs are prefixed with the configured assets base path.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::GenerateError;

/// Asset injection settings.
#[derive(Clone, Debug, Default)]
pub struct AssetConfig {
    /// URL prefix for injected asset references.
    pub base_path: String,
    /// Directory of stylesheets to inject into `<head>`.
    pub css_dir: Option<PathBuf>,
    /// Directory of scripts to inject at the end of `<body>`.
    pub script_dir: Option<PathBuf>,
    /// Directory of scripts to inject after `<body>`.
    pub post_body_script_dir: Option<PathBuf>,
}

/// Injects asset references into rewritten pages.
///
/// Directory listings happen once at construction; injection itself is
/// pure string work per page.
#[derive(Clone, Debug, Default)]
pub struct AssetInjector {
    head: String,
    body: String,
    post_body: String,
}

impl AssetInjector {
    /// Build injection fragments from the configured directories.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Io`] when a configured directory cannot
    /// be listed. Unconfigured directories are skipped.
    pub fn from_config(config: &AssetConfig) -> Result<Self, GenerateError> {
        let base = config.base_path.trim_end_matches('/');

        let mut head = String::new();
        for name in list_assets(config.css_dir.as_deref(), "css")? {
            let _ = writeln!(head, r#"<link rel="stylesheet" href="{base}/{name}">"#);
        }

        let mut body = String::new();
        for name in list_assets(config.script_dir.as_deref(), "js")? {
            let _ = writeln!(body, r#"<script src="{base}/{name}"></script>"#);
        }

        let mut post_body = String::new();
        for name in list_assets(config.post_body_script_dir.as_deref(), "js")? {
            let _ = writeln!(post_body, r#"<script src="{base}/{name}"></script>"#);
        }

        debug!(
            "asset injector ready: {} head, {} body, {} post-body bytes",
            head.len(),
            body.len(),
            post_body.len()
        );
        Ok(Self {
            head,
            body,
            post_body,
        })
    }

    /// Inject asset references into one page. Pages lacking the target
    /// tag skip that injection point.
    #[must_use]
    pub fn inject(&self, html: &str) -> String {
        let mut out = html.to_string();
        if !self.head.is_empty() {
            out = insert_before(&out, "</head>", &self.head);
        }
        if !self.body.is_empty() {
            out = insert_before(&out, "</body>", &self.body);
        }
        if !self.post_body.is_empty() {
            out = insert_after(&out, "</body>", &self.post_body);
        }
        out
    }
}

/// Sorted file names with the given extension in an optional directory.
fn list_assets(dir: Option<&Path>, extension: &str) -> Result<Vec<String>, GenerateError> {
    let Some(dir) = dir else {
        return Ok(Vec::new());
    };
    let entries = fs::read_dir(dir).map_err(|e| GenerateError::io(dir, e))?;
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == extension))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names)
}

/// Insert `fragment` before the first case-insensitive occurrence of
/// `tag`, or leave the page unchanged when the tag is absent.
fn insert_before(html: &str, tag: &str, fragment: &str) -> String {
    match find_tag(html, tag) {
        Some(idx) => format!("{}{}{}", &html[..idx], fragment, &html[idx..]),
        None => html.to_string(),
    }
}

/// Insert `fragment` after the first case-insensitive occurrence of `tag`.
fn insert_after(html: &str, tag: &str, fragment: &str) -> String {
    match find_tag(html, tag) {
        Some(idx) => {
            let end = idx + tag.len();
            format!("{}{}{}", &html[..end], fragment, &html[end..])
        }
        None => html.to_string(),
    }
}

fn find_tag(html: &str, tag: &str) -> Option<usize> {
    html.to_ascii_lowercase().find(tag)
}
