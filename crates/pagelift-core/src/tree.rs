//! Page tree construction (scan pass).
//!
//! Mirrors the export's directory layout into an ordered [`PageNode`]
//! tree: a page with internal-link markers has a same-named sibling
//! subdirectory holding its child pages. Each recursive call receives the
//! parent's marker scan by parameter and returns its accumulated nodes up
//! the call chain; no traversal state is shared across calls. The
//! [`LinkIndex`] is populated here so every forward reference is
//! resolvable before any page is rewritten.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::GenerateError;
use crate::extract::{PageScan, PageScanner};
use crate::index::LinkIndex;
use crate::names;

/// One page in the output hierarchy.
#[derive(Clone, Debug)]
pub struct PageNode {
    /// Display title from the document's title element, falling back to
    /// the short name.
    pub title: String,
    /// Absolute path of the source document.
    pub source_path: PathBuf,
    /// Absolute path of the rewritten output document.
    pub output_path: PathBuf,
    /// Output path relative to the output root (`./guide.html`).
    pub rel_path: String,
    /// Sibling position from the parent's marker scan; `None` when the
    /// parent never links to this page.
    pub order: Option<u32>,
    /// Child pages in sibling order.
    pub children: Vec<PageNode>,
}

impl PageNode {
    /// Source file stem, including the export's identifier suffix.
    #[must_use]
    pub fn source_stem(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Destination file stem (lower-cased, hyphenated, suffix-free).
    #[must_use]
    pub fn dest_stem(&self) -> String {
        self.output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Builds the page tree and link index from an export directory.
pub struct TreeWalker {
    scanner: PageScanner,
}

impl TreeWalker {
    /// Create a walker with a fresh page scanner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scanner: PageScanner::new(),
        }
    }

    /// Scan an export tree rooted at `input_root`.
    ///
    /// Returns the root [`PageNode`] and the completed [`LinkIndex`].
    /// The root page is the single top-level document in `input_root`;
    /// a file named `exclude` (the categories document) is not a
    /// candidate.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::MissingRoot`] when `input_root` holds no
    /// document, or [`GenerateError::Io`] when a page cannot be read.
    pub fn scan_tree(
        &self,
        input_root: &Path,
        output_root: &Path,
        exclude: Option<&str>,
    ) -> Result<(PageNode, LinkIndex), GenerateError> {
        let root_file = html_files(input_root)?
            .into_iter()
            .find(|p| {
                exclude.is_none_or(|name| p.file_name().is_none_or(|f| f != name))
            })
            .ok_or_else(|| GenerateError::MissingRoot(input_root.to_path_buf()))?;

        let mut index = LinkIndex::new();
        let node = self.build_node(&root_file, output_root, ".", &PageScan::default(), &mut index)?;
        Ok((node, index))
    }

    /// Build the node for one source document, recursing into its child
    /// directory when it carries markers.
    fn build_node(
        &self,
        source_path: &Path,
        out_dir: &Path,
        rel_base: &str,
        parent: &PageScan,
        index: &mut LinkIndex,
    ) -> Result<PageNode, GenerateError> {
        let html = fs::read_to_string(source_path)
            .map_err(|e| GenerateError::io(source_path, e))?;
        let scan = self.scanner.scan(&html);

        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (short, token) = names::split_id_suffix(&stem);
        let dest = names::output_file_name(&stem);
        let output_path = out_dir.join(format!("{dest}.html"));
        let rel_path = format!("{rel_base}/{dest}.html");

        // Scan-pass index writes: the page's own suffix identifier, its
        // short name, and the identifier the parent's marker carried.
        if let Some(token) = token {
            index.insert_id(token, &output_path);
        }
        index.insert_name(short, &output_path);
        let key = names::name_key(short);
        if let Some(id) = parent.marker(&key).and_then(|m| m.identifier.as_deref()) {
            index.insert_id(id, &output_path);
        }

        let order = parent
            .position_of(&key)
            .and_then(|p| u32::try_from(p).ok());

        let children = if scan.has_links() {
            let child_dir = source_path.with_extension("");
            if child_dir.is_dir() {
                self.walk_dir(
                    &child_dir,
                    &out_dir.join(&dest),
                    &format!("{rel_base}/{dest}"),
                    &scan,
                    index,
                )?
            } else {
                debug!("no child directory for {}", source_path.display());
                Vec::new()
            }
        } else {
            Vec::new()
        };

        Ok(PageNode {
            title: scan.title.unwrap_or_else(|| short.to_string()),
            source_path: source_path.to_path_buf(),
            output_path,
            rel_path,
            order,
            children,
        })
    }

    /// Walk one child directory, returning its pages in sibling order.
    fn walk_dir(
        &self,
        dir: &Path,
        out_dir: &Path,
        rel_base: &str,
        parent: &PageScan,
        index: &mut LinkIndex,
    ) -> Result<Vec<PageNode>, GenerateError> {
        let mut nodes = Vec::new();
        for file in html_files(dir)? {
            nodes.push(self.build_node(&file, out_dir, rel_base, parent, index)?);
        }

        // Correctness backstop: sibling order comes from this sort, not
        // from visitation order. Pages the parent never links to keep
        // their discovery order at the end (stable sort).
        nodes.sort_by_key(|n| n.order.unwrap_or(u32::MAX));
        Ok(nodes)
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// List the documents directly inside `dir`, sorted by file name for
/// deterministic discovery order.
fn html_files(dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let entries = fs::read_dir(dir).map_err(|e| GenerateError::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "html"))
        .collect();
    files.sort();
    Ok(files)
}
