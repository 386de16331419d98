//! Internal-link marker extraction.
//!
//! Scans a single page's markup for internal-link markers (`<figure
//! class="link-to-page">` elements wrapping an anchor to a sibling page)
//! and derives the target short names, opaque identifiers, and document
//! order that drive sibling ordering in the page tree.

use regex::Regex;

use crate::names;

/// One internal-link marker found on a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerLink {
    /// Opaque identifier from the marker element, hyphens stripped.
    pub identifier: Option<String>,
    /// Normalized short name of the link target (map key form).
    pub key: String,
    /// 0-based position among the page's markers, in document order.
    pub position: usize,
}

/// Result of scanning one page's markup.
#[derive(Clone, Debug, Default)]
pub struct PageScan {
    /// Document title from the `<title>` element.
    pub title: Option<String>,
    /// Markers in document order.
    pub markers: Vec<MarkerLink>,
}

impl PageScan {
    /// Whether the page carries at least one internal-link marker.
    #[must_use]
    pub fn has_links(&self) -> bool {
        !self.markers.is_empty()
    }

    /// Marker position for a normalized short name.
    #[must_use]
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.marker(key).map(|m| m.position)
    }

    /// Marker for a normalized short name, if the page links to it.
    #[must_use]
    pub fn marker(&self, key: &str) -> Option<&MarkerLink> {
        self.markers.iter().find(|m| m.key == key)
    }
}

/// Scans page markup for internal-link markers and title metadata.
pub struct PageScanner {
    marker_re: Regex,
    id_re: Regex,
    href_re: Regex,
    title_re: Regex,
}

impl PageScanner {
    /// Create a scanner with compiled patterns.
    ///
    /// # Panics
    ///
    /// Panics if the internal regexes fail to compile. This should never
    /// happen as the patterns are compile-time constants.
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Marker element: opening tag in group 1, content in group 2
            marker_re: Regex::new(
                r#"(?is)(<figure\b[^>]*class="[^"]*link-to-page[^"]*"[^>]*>)(.*?)</figure>"#,
            )
            .unwrap(),
            id_re: Regex::new(r#"(?i)\bid="([^"]+)""#).unwrap(),
            href_re: Regex::new(r#"(?i)\bhref="([^"]+)""#).unwrap(),
            title_re: Regex::new(r"(?is)<title>(.*?)</title>").unwrap(),
        }
    }

    /// Scan one page's raw markup.
    ///
    /// Markers whose descendant anchor carries no href consume a position
    /// but produce no entry; duplicate short names keep their first
    /// position.
    #[must_use]
    pub fn scan(&self, html: &str) -> PageScan {
        let title = self
            .title_re
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());

        let mut markers: Vec<MarkerLink> = Vec::new();
        for (position, caps) in self.marker_re.captures_iter(html).enumerate() {
            let opening = &caps[1];
            let inner = &caps[2];

            let Some(href) = self.href_re.captures(inner).map(|c| c[1].to_string()) else {
                continue;
            };
            let key = names::name_key(&names::short_name_from_href(&href));
            if key.is_empty() || markers.iter().any(|m| m.key == key) {
                continue;
            }

            let identifier = self
                .id_re
                .captures(opening)
                .map(|c| names::normalize_identifier(&c[1]));

            markers.push(MarkerLink {
                identifier,
                key,
                position,
            });
        }

        PageScan { title, markers }
    }
}

impl Default for PageScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><title>Root Page</title></head><body>
<figure id="0a1b2c3d-4e5f-6789-abcd-ef0123456789" class="link-to-page">
  <a href="root/Guide%200123456789abcdef0123456789abcdef.html">Guide</a>
</figure>
<figure id="1a1b2c3d-4e5f-6789-abcd-ef0123456789" class="link-to-page">
  <a href="root/API%20fedcba9876543210fedcba9876543210.html">API</a>
</figure>
</body></html>"#;

    #[test]
    fn test_scan_extracts_title() {
        let scan = PageScanner::new().scan(PAGE);
        assert_eq!(scan.title.as_deref(), Some("Root Page"));
    }

    #[test]
    fn test_scan_marker_positions_follow_document_order() {
        let scan = PageScanner::new().scan(PAGE);
        assert_eq!(scan.markers.len(), 2);
        assert_eq!(scan.position_of("guide"), Some(0));
        assert_eq!(scan.position_of("api"), Some(1));
    }

    #[test]
    fn test_scan_normalizes_marker_identifier() {
        let scan = PageScanner::new().scan(PAGE);
        let marker = scan.marker("guide").unwrap();
        assert_eq!(
            marker.identifier.as_deref(),
            Some("0a1b2c3d4e5f6789abcdef0123456789")
        );
    }

    #[test]
    fn test_scan_page_without_markers_has_no_links() {
        let scan = PageScanner::new().scan("<html><title>Leaf</title><p>text</p></html>");
        assert!(!scan.has_links());
        assert_eq!(scan.title.as_deref(), Some("Leaf"));
    }

    #[test]
    fn test_scan_marker_without_href_consumes_position() {
        let html = r#"<figure class="link-to-page"><span>broken</span></figure>
<figure class="link-to-page"><a href="Guide%20aaaaaaaaaaaaaaaa.html">Guide</a></figure>"#;
        let scan = PageScanner::new().scan(html);
        assert_eq!(scan.markers.len(), 1);
        assert_eq!(scan.position_of("guide"), Some(1));
    }

    #[test]
    fn test_scan_duplicate_short_name_keeps_first_position() {
        let html = r#"<figure class="link-to-page"><a href="Guide%20aaaaaaaaaaaaaaaa.html">Guide</a></figure>
<figure class="link-to-page"><a href="Guide%20aaaaaaaaaaaaaaaa.html">Guide</a></figure>"#;
        let scan = PageScanner::new().scan(html);
        assert_eq!(scan.markers.len(), 1);
        assert_eq!(scan.position_of("guide"), Some(0));
    }
}
