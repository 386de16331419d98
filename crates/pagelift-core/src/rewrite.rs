//! Link rewriting (emit pass).
//!
//! Rewrites every anchor on a page against the completed [`LinkIndex`],
//! applying a fixed precedence of resolution rules: identifier reference,
//! sibling short-name reference, same-page resource reference. Anchors
//! are never removed; only href and descendant img src attributes are
//! mutated in place. Also strips the export's `__id` table column.

use std::path::Path;

use regex::{Captures, Regex};
use tracing::warn;

use crate::index::LinkIndex;
use crate::names;

/// Header text of the synthetic table column the export adds.
const ID_COLUMN: &str = "__id";

/// Identity of the page currently being rewritten.
#[derive(Clone, Copy, Debug)]
pub struct PageContext<'a> {
    /// Source document path, for diagnostics.
    pub source_path: &'a Path,
    /// Output document path; rewritten hrefs are relative to its parent.
    pub output_path: &'a Path,
    /// Source file stem, including the export's identifier suffix.
    pub source_stem: &'a str,
    /// Destination file stem.
    pub dest_stem: &'a str,
}

/// Rewrites anchors and export tables on one page at a time.
pub struct LinkRewriter {
    anchor_re: Regex,
    href_re: Regex,
    attr_re: Regex,
    id_url_re: Regex,
    table_re: Regex,
    row_re: Regex,
    th_re: Regex,
    td_re: Regex,
    tag_re: Regex,
}

impl LinkRewriter {
    /// Create a rewriter with compiled patterns.
    ///
    /// # Panics
    ///
    /// Panics if the internal regexes fail to compile. This should never
    /// happen as the patterns are compile-time constants.
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor_re: Regex::new(r"(?is)<a\b[^>]*>.*?</a>").unwrap(),
            href_re: Regex::new(r#"(?i)\bhref="([^"]*)""#).unwrap(),
            attr_re: Regex::new(r#"(?i)\b(href|src)="([^"]*)""#).unwrap(),
            // The export tool's own URL shape: optional scheme and www,
            // its domain, then a page identifier in either hyphenation,
            // optionally followed by a query and a sub-block fragment.
            id_url_re: Regex::new(
                r"(?i)^(?:https?://)?(?:www\.)?notion\.(?:so|site)/[^#?]*?([0-9a-f]{32}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})/?(?:\?[^#]*)?(?:#([0-9a-z]+))?$",
            )
            .unwrap(),
            table_re: Regex::new(r"(?is)<table\b[^>]*>.*?</table>").unwrap(),
            row_re: Regex::new(r"(?is)<tr[^>]*>.*?</tr>").unwrap(),
            th_re: Regex::new(r"(?is)<th[^>]*>.*?</th>").unwrap(),
            td_re: Regex::new(r"(?is)<td[^>]*>.*?</td>").unwrap(),
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
        }
    }

    /// Rewrite every anchor on a page. First matching rule wins; anchors
    /// matching no rule are left unchanged.
    #[must_use]
    pub fn rewrite_links(&self, html: &str, page: &PageContext<'_>, index: &LinkIndex) -> String {
        self.anchor_re
            .replace_all(html, |caps: &Captures<'_>| {
                let element = &caps[0];
                self.rewrite_anchor(element, page, index)
                    .unwrap_or_else(|| element.to_string())
            })
            .into_owned()
    }

    /// Rewrite one anchor element, or `None` to keep it as-is.
    fn rewrite_anchor(
        &self,
        element: &str,
        page: &PageContext<'_>,
        index: &LinkIndex,
    ) -> Option<String> {
        let Some(href) = self.href_re.captures(element).map(|c| c[1].to_string()) else {
            warn!(
                "anchor without href in {}, leaving element untouched",
                page.source_path.display()
            );
            return None;
        };

        // Rule a: identifier reference in the export tool's URL shape.
        let mut dangling_id = None;
        if let Some(caps) = self.id_url_re.captures(&href) {
            let id = caps[1].to_string();
            if let Some(target) = index.resolve_id(&id) {
                let mut new_href = relative_href(page.output_path, target);
                if let Some(fragment) = caps.get(2) {
                    new_href.push('#');
                    new_href.push_str(&names::format_block_fragment(fragment.as_str()));
                }
                return Some(replace_href(element, &href, &new_href));
            }
            dangling_id = Some(id);
        }

        // Rule b: sibling short-name reference.
        let short = names::short_name_from_href(&href);
        if let Some(target) = index.resolve_name(&short) {
            let new_href = relative_href(page.output_path, target);
            return Some(replace_href(element, &href, &new_href));
        }

        // Rule c: same-page resource reference. The export colocates a
        // page's resources under its own name; the directory is renamed
        // in lockstep with the page, so href and descendant img srcs
        // follow suit.
        if !is_absolute_url(&href) && contains_stem(&href, page.source_stem) {
            return Some(self.rename_resource_refs(element, page));
        }

        if let Some(id) = dangling_id {
            warn!(
                "dangling reference to {id} in {}, leaving href unchanged",
                page.source_path.display()
            );
        }
        None
    }

    /// Replace the source stem with the destination stem in every href
    /// and src attribute of the element, in both raw and space-encoded
    /// spellings.
    fn rename_resource_refs(&self, element: &str, page: &PageContext<'_>) -> String {
        let encoded = page.source_stem.replace(' ', "%20");
        self.attr_re
            .replace_all(element, |caps: &Captures<'_>| {
                let value = caps[2]
                    .replace(&encoded, page.dest_stem)
                    .replace(page.source_stem, page.dest_stem);
                format!(r#"{}="{value}""#, &caps[1])
            })
            .into_owned()
    }

    /// Remove the export's `__id` column from every table that has one.
    #[must_use]
    pub fn strip_id_columns(&self, html: &str) -> String {
        self.table_re
            .replace_all(html, |caps: &Captures<'_>| {
                let table = &caps[0];
                match self.id_column_index(table) {
                    Some(column) => self.strip_column(table, column),
                    None => table.to_string(),
                }
            })
            .into_owned()
    }

    /// Index of the `__id` header cell, if the table has one.
    fn id_column_index(&self, table: &str) -> Option<usize> {
        self.th_re.find_iter(table).position(|cell| {
            self.tag_re.replace_all(cell.as_str(), "").trim() == ID_COLUMN
        })
    }

    /// Remove header cell `column` and the matching cell of every row.
    fn strip_column(&self, table: &str, column: usize) -> String {
        let without_th = remove_nth_match(table, &self.th_re, column);
        self.row_re
            .replace_all(&without_th, |caps: &Captures<'_>| {
                remove_nth_match(&caps[0], &self.td_re, column)
            })
            .into_owned()
    }
}

impl Default for LinkRewriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove the `n`th match of `re` from `s`.
fn remove_nth_match(s: &str, re: &Regex, n: usize) -> String {
    match re.find_iter(s).nth(n) {
        Some(m) => format!("{}{}", &s[..m.start()], &s[m.end()..]),
        None => s.to_string(),
    }
}

/// Swap the href attribute value on an element, first occurrence only.
fn replace_href(element: &str, old: &str, new: &str) -> String {
    element.replacen(
        &format!(r#"href="{old}""#),
        &format!(r#"href="{new}""#),
        1,
    )
}

fn is_absolute_url(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Whether an href textually contains the stem in raw or space-encoded form.
fn contains_stem(href: &str, stem: &str) -> bool {
    !stem.is_empty() && (href.contains(stem) || href.contains(&stem.replace(' ', "%20")))
}

/// Path of `to` relative to the directory containing `from`.
///
/// Both paths are absolute output paths; components are joined with `/`
/// regardless of platform so hrefs stay portable.
fn relative_href(from: &Path, to: &Path) -> String {
    let from_dir = from.parent().unwrap_or_else(|| Path::new(""));
    let from_comps: Vec<_> = from_dir.components().collect();
    let to_comps: Vec<_> = to.components().collect();

    let common = from_comps
        .iter()
        .zip(&to_comps)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from_comps.len() {
        parts.push("..".to_owned());
    }
    for comp in &to_comps[common..] {
        parts.push(comp.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GUIDE_ID: &str = "0123456789abcdef0123456789abcdef";

    fn context<'a>() -> PageContext<'a> {
        PageContext {
            source_path: Path::new("/in/Docs/API fedcba9876543210fedcba9876543210.html"),
            output_path: Path::new("/out/docs/api.html"),
            source_stem: "API fedcba9876543210fedcba9876543210",
            dest_stem: "api",
        }
    }

    fn index() -> LinkIndex {
        let mut index = LinkIndex::new();
        index.insert_id(GUIDE_ID, Path::new("/out/docs/guide.html"));
        index.insert_name("Guide", Path::new("/out/docs/guide.html"));
        index.insert_name("Docs", Path::new("/out/docs.html"));
        index
    }

    #[test]
    fn test_identifier_reference_rewritten_relative() {
        let rewriter = LinkRewriter::new();
        let html = format!(r#"<a href="https://www.notion.so/Guide-{GUIDE_ID}">Guide</a>"#);

        let out = rewriter.rewrite_links(&html, &context(), &index());

        assert_eq!(out, r#"<a href="guide.html">Guide</a>"#);
    }

    #[test]
    fn test_identifier_reference_hyphenated_form() {
        let rewriter = LinkRewriter::new();
        let html = r#"<a href="https://notion.so/01234567-89ab-cdef-0123-456789abcdef">G</a>"#;

        let out = rewriter.rewrite_links(html, &context(), &index());

        assert_eq!(out, r#"<a href="guide.html">G</a>"#);
    }

    #[test]
    fn test_fragment_regrouped_to_canonical_form() {
        let rewriter = LinkRewriter::new();
        let fragment = "aaaabbbbccccddddeeeeffff00001111";
        let html =
            format!(r#"<a href="https://www.notion.so/Guide-{GUIDE_ID}#{fragment}">Guide</a>"#);

        let out = rewriter.rewrite_links(&html, &context(), &index());

        assert_eq!(
            out,
            r#"<a href="guide.html#aaaabbbb-cccc-dddd-eeee-ffff00001111">Guide</a>"#
        );
    }

    #[test]
    fn test_dangling_identifier_left_unchanged() {
        let rewriter = LinkRewriter::new();
        let html = r#"<a href="https://www.notion.so/Gone-ffffffffffffffffffffffffffffffff">Gone</a>"#;

        let out = rewriter.rewrite_links(html, &context(), &index());

        assert_eq!(out, html);
    }

    #[test]
    fn test_sibling_short_name_rewritten() {
        let rewriter = LinkRewriter::new();
        let html = r#"<a href="Guide%200123456789abcdef0123456789abcdef.html">Guide</a>"#;

        let out = rewriter.rewrite_links(html, &context(), &index());

        assert_eq!(out, r#"<a href="guide.html">Guide</a>"#);
    }

    #[test]
    fn test_sibling_reference_climbs_directories() {
        let rewriter = LinkRewriter::new();
        let html = r#"<a href="Docs%20aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.html">up</a>"#;

        let out = rewriter.rewrite_links(html, &context(), &index());

        assert_eq!(out, r#"<a href="../docs.html">up</a>"#);
    }

    #[test]
    fn test_resource_reference_renamed_with_images() {
        let rewriter = LinkRewriter::new();
        let html = concat!(
            r#"<a href="API%20fedcba9876543210fedcba9876543210/chart.png">"#,
            r#"<img src="API%20fedcba9876543210fedcba9876543210/chart.png"></a>"#
        );

        let out = rewriter.rewrite_links(html, &context(), &index());

        assert_eq!(
            out,
            r#"<a href="api/chart.png"><img src="api/chart.png"></a>"#
        );
    }

    #[test]
    fn test_external_url_left_unchanged() {
        let rewriter = LinkRewriter::new();
        let html = r#"<a href="https://example.com/page">ext</a>"#;

        let out = rewriter.rewrite_links(html, &context(), &index());

        assert_eq!(out, html);
    }

    #[test]
    fn test_anchor_without_href_left_untouched() {
        let rewriter = LinkRewriter::new();
        let html = r#"<a name="top">top</a>"#;

        let out = rewriter.rewrite_links(html, &context(), &index());

        assert_eq!(out, html);
    }

    #[test]
    fn test_strip_id_columns_removes_header_and_cells() {
        let rewriter = LinkRewriter::new();
        let html = "<table><tr><th>Name</th><th>__id</th></tr>\
<tr><td>Guide</td><td>abc123</td></tr>\
<tr><td>API</td><td>def456</td></tr></table>";

        let out = rewriter.strip_id_columns(html);

        assert_eq!(
            out,
            "<table><tr><th>Name</th></tr>\
<tr><td>Guide</td></tr>\
<tr><td>API</td></tr></table>"
        );
    }

    #[test]
    fn test_strip_id_columns_ignores_plain_tables() {
        let rewriter = LinkRewriter::new();
        let html = "<table><tr><th>Name</th></tr><tr><td>Guide</td></tr></table>";

        assert_eq!(rewriter.strip_id_columns(html), html);
    }

    #[test]
    fn test_relative_href_same_directory() {
        assert_eq!(
            relative_href(Path::new("/out/docs/api.html"), Path::new("/out/docs/guide.html")),
            "guide.html"
        );
    }

    #[test]
    fn test_relative_href_into_subdirectory() {
        assert_eq!(
            relative_href(Path::new("/out/docs.html"), Path::new("/out/docs/guide.html")),
            "docs/guide.html"
        );
    }

    #[test]
    fn test_relative_href_across_subtrees() {
        assert_eq!(
            relative_href(
                Path::new("/out/docs/api/errors.html"),
                Path::new("/out/docs/guide.html")
            ),
            "../guide.html"
        );
    }
}
