//! Category listing extraction.
//!
//! The export may include a standalone document of `<h2>`-delimited
//! categories, each heading followed by a list of anchors. This module
//! flattens that document into `{category, link}` pairs for the site's
//! category listing.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Serialize;

use crate::error::GenerateError;

/// File name of the category listing at the output root.
pub const CATEGORIES_FILE: &str = "categories.json";

/// One categorized link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryLink {
    /// Category heading text.
    pub category: String,
    /// Link href as written in the source document.
    pub link: String,
}

/// Parses the categories document.
pub struct CategoryExtractor {
    heading_re: Regex,
    href_re: Regex,
    tag_re: Regex,
}

impl CategoryExtractor {
    /// Create an extractor with compiled patterns.
    ///
    /// # Panics
    ///
    /// Panics if the internal regexes fail to compile. This should never
    /// happen as the patterns are compile-time constants.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heading_re: Regex::new(r"(?is)<h2[^>]*>(.*?)</h2>").unwrap(),
            href_re: Regex::new(r#"(?i)<a\b[^>]*\bhref="([^"]*)""#).unwrap(),
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
        }
    }

    /// Flatten category sections into `{category, link}` pairs.
    ///
    /// Anchors before the first heading belong to no category and are
    /// dropped.
    #[must_use]
    pub fn extract(&self, html: &str) -> Vec<CategoryLink> {
        let mut links = Vec::new();

        let headings: Vec<_> = self.heading_re.captures_iter(html).collect();
        for (i, caps) in headings.iter().enumerate() {
            let category = self
                .tag_re
                .replace_all(&caps[1], "")
                .trim()
                .to_string();
            let Some(whole) = caps.get(0) else { continue };
            let section_start = whole.end();
            let section_end = headings
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(html.len(), |m| m.start());

            for href in self.href_re.captures_iter(&html[section_start..section_end]) {
                links.push(CategoryLink {
                    category: category.clone(),
                    link: href[1].to_string(),
                });
            }
        }

        links
    }

    /// Extract categories from a document on disk and write the flat
    /// listing as pretty JSON at the output root.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Io`] when either file access fails.
    pub fn extract_to_file(
        &self,
        source: &Path,
        output_root: &Path,
    ) -> Result<usize, GenerateError> {
        let html = fs::read_to_string(source).map_err(|e| GenerateError::io(source, e))?;
        let links = self.extract(&html);

        let path = output_root.join(CATEGORIES_FILE);
        let mut json = serde_json::to_string_pretty(&links)?;
        json.push('\n');
        fs::write(&path, json).map_err(|e| GenerateError::io(path, e))?;
        Ok(links.len())
    }
}

impl Default for CategoryExtractor {
    fn default() -> Self {
        Self::new()
    }
}
