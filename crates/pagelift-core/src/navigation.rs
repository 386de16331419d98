//! Navigation description emission.
//!
//! Serializes the ordered page hierarchy into the navigation description
//! file consumed by the site's rendering layer. Navigation is a view
//! over the [`PageNode`] tree; the root page is the home page and its
//! children form the top-level entries.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::GenerateError;
use crate::tree::PageNode;

/// File name of the navigation description at the output root.
pub const NAVIGATION_FILE: &str = "page-links.json";

/// Navigation entry for one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavPage {
    /// Display title.
    pub title: String,
    /// Output path relative to the output root.
    pub path: String,
    /// Sibling position from the parent's marker scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    /// Child entries in sibling order.
    #[serde(rename = "subPages", skip_serializing_if = "Vec::is_empty")]
    pub sub_pages: Vec<NavPage>,
}

/// Build the navigation description from the page tree.
///
/// The root page serves as the home page and is excluded; its children
/// become the top-level entries.
#[must_use]
pub fn build_navigation(root: &PageNode) -> Vec<NavPage> {
    root.children.iter().map(nav_page).collect()
}

/// Recursively build one [`NavPage`] from a node.
fn nav_page(node: &PageNode) -> NavPage {
    NavPage {
        title: node.title.clone(),
        path: node.rel_path.clone(),
        order: node.order,
        sub_pages: node.children.iter().map(nav_page).collect(),
    }
}

/// Write the navigation description as pretty JSON.
///
/// # Errors
///
/// Returns [`GenerateError::Io`] when the file cannot be written or
/// [`GenerateError::Json`] on serialization failure.
pub fn write_navigation(output_root: &Path, nav: &[NavPage]) -> Result<(), GenerateError> {
    let path = output_root.join(NAVIGATION_FILE);
    let mut json = serde_json::to_string_pretty(nav)?;
    json.push('\n');
    fs::write(&path, json).map_err(|e| GenerateError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn leaf(title: &str, rel: &str, order: Option<u32>) -> PageNode {
        PageNode {
            title: title.to_string(),
            source_path: PathBuf::from(format!("/in/{title}.html")),
            output_path: PathBuf::from(format!("/out/{rel}")),
            rel_path: rel.to_string(),
            order,
            children: Vec::new(),
        }
    }

    fn root_with(children: Vec<PageNode>) -> PageNode {
        PageNode {
            title: "Docs".to_string(),
            source_path: PathBuf::from("/in/Docs.html"),
            output_path: PathBuf::from("/out/docs.html"),
            rel_path: "./docs.html".to_string(),
            order: None,
            children,
        }
    }

    #[test]
    fn test_root_excluded_from_navigation() {
        let root = root_with(vec![leaf("Guide", "./docs/guide.html", Some(0))]);

        let nav = build_navigation(&root);

        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].title, "Guide");
    }

    #[test]
    fn test_navigation_preserves_sibling_order() {
        let root = root_with(vec![
            leaf("Guide", "./docs/guide.html", Some(0)),
            leaf("API", "./docs/api.html", Some(1)),
        ]);

        let nav = build_navigation(&root);

        assert_eq!(nav[0].title, "Guide");
        assert_eq!(nav[0].order, Some(0));
        assert_eq!(nav[1].title, "API");
        assert_eq!(nav[1].order, Some(1));
    }

    #[test]
    fn test_nested_navigation() {
        let mut parent = leaf("Guide", "./docs/guide.html", Some(0));
        parent.children = vec![leaf("Install", "./docs/guide/install.html", Some(0))];
        let root = root_with(vec![parent]);

        let nav = build_navigation(&root);

        assert_eq!(nav[0].sub_pages.len(), 1);
        assert_eq!(nav[0].sub_pages[0].title, "Install");
        assert_eq!(nav[0].sub_pages[0].path, "./docs/guide/install.html");
    }

    #[test]
    fn test_serialization_shape() {
        let nav = build_navigation(&root_with(vec![leaf("Guide", "./docs/guide.html", Some(0))]));

        let json = serde_json::to_value(&nav).unwrap();

        assert_eq!(json[0]["title"], "Guide");
        assert_eq!(json[0]["path"], "./docs/guide.html");
        assert_eq!(json[0]["order"], 0);
        // Empty children are skipped entirely
        assert!(json[0].get("subPages").is_none());
    }

    #[test]
    fn test_write_navigation_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let nav = build_navigation(&root_with(vec![
            leaf("Guide", "./docs/guide.html", Some(0)),
            leaf("API", "./docs/api.html", Some(1)),
        ]));

        write_navigation(tmp.path(), &nav).unwrap();
        let first = std::fs::read(tmp.path().join(NAVIGATION_FILE)).unwrap();
        write_navigation(tmp.path(), &nav).unwrap();
        let second = std::fs::read(tmp.path().join(NAVIGATION_FILE)).unwrap();

        assert_eq!(first, second);
    }
}
