//! Site generation pipeline.
//!
//! Two traversals over the export: a scan pass that builds the page tree
//! and the complete [`LinkIndex`], then an emit pass that rewrites each
//! page against the finished index, resolves embeds, injects assets, and
//! copies per-page resources. The output directory is wiped and
//! recreated wholesale at the start of each run.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::assets::AssetInjector;
use crate::categories::CategoryExtractor;
use crate::config::Config;
use crate::embed::EmbedResolver;
use crate::error::GenerateError;
use crate::index::LinkIndex;
use crate::navigation::{build_navigation, write_navigation};
use crate::rewrite::{LinkRewriter, PageContext};
use crate::tree::{PageNode, TreeWalker};

/// Counters from one generation run.
#[derive(Clone, Debug, Default)]
pub struct GenerateSummary {
    /// Pages written.
    pub pages: usize,
    /// Embeds resolved successfully.
    pub embeds_resolved: usize,
    /// Embeds left unresolved after retry exhaustion.
    pub embeds_failed: usize,
    /// Category links extracted.
    pub categories: usize,
}

/// Converts one export tree into a documentation site.
pub struct SiteGenerator {
    config: Config,
    walker: TreeWalker,
    rewriter: LinkRewriter,
    embedder: EmbedResolver,
}

impl SiteGenerator {
    /// Create a generator for the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let embedder = EmbedResolver::new(config.embed_resolved.clone());
        Self {
            config,
            walker: TreeWalker::new(),
            rewriter: LinkRewriter::new(),
            embedder,
        }
    }

    /// Run the full pipeline from `input_dir` into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] on any file-level failure; no partial
    /// output recovery is attempted.
    pub fn generate(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<GenerateSummary, GenerateError> {
        let output_root = match &self.config.version_tag {
            Some(tag) => output_dir.join(tag),
            None => output_dir.to_path_buf(),
        };

        // Fully regenerate: no incremental mode, no locking.
        if output_root.exists() {
            fs::remove_dir_all(&output_root).map_err(|e| GenerateError::io(&output_root, e))?;
        }
        fs::create_dir_all(&output_root).map_err(|e| GenerateError::io(&output_root, e))?;

        let injector = AssetInjector::from_config(&self.config.assets_resolved)?;

        // Scan pass: the index must be complete before any rewrite, or
        // forward references silently fail to resolve.
        let (root, index) =
            self.walker
                .scan_tree(input_dir, &output_root, self.config.categories_file.as_deref())?;
        info!(
            "scan pass complete: {} identifier(s), {} short name(s)",
            index.id_count(),
            index.name_count()
        );

        // Emit pass.
        let mut summary = GenerateSummary::default();
        self.emit_node(&root, &index, &injector, &mut summary)?;

        write_navigation(&output_root, &build_navigation(&root))?;

        if let Some(rel) = &self.config.categories_file {
            let source = input_dir.join(rel);
            if source.is_file() {
                summary.categories =
                    CategoryExtractor::new().extract_to_file(&source, &output_root)?;
            } else {
                warn!("categories file {} not found, skipping", source.display());
            }
        }

        info!(
            "generated {} page(s) into {}",
            summary.pages,
            output_root.display()
        );
        Ok(summary)
    }

    /// Rewrite and write one page, then its children.
    fn emit_node(
        &self,
        node: &PageNode,
        index: &LinkIndex,
        injector: &AssetInjector,
        summary: &mut GenerateSummary,
    ) -> Result<(), GenerateError> {
        let html = fs::read_to_string(&node.source_path)
            .map_err(|e| GenerateError::io(&node.source_path, e))?;

        let source_stem = node.source_stem();
        let dest_stem = node.dest_stem();
        let page = PageContext {
            source_path: &node.source_path,
            output_path: &node.output_path,
            source_stem: &source_stem,
            dest_stem: &dest_stem,
        };

        let html = self.rewriter.strip_id_columns(&html);
        let html = self.rewriter.rewrite_links(&html, &page, index);
        let outcome = self.embedder.resolve_page(&html);
        summary.embeds_resolved += outcome.resolved;
        summary.embeds_failed += outcome.failed;
        let html = injector.inject(&outcome.html);

        if let Some(parent) = node.output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
        }
        fs::write(&node.output_path, html).map_err(|e| GenerateError::io(&node.output_path, e))?;
        summary.pages += 1;

        self.copy_resources(node)?;

        for child in &node.children {
            self.emit_node(child, index, injector, summary)?;
        }
        Ok(())
    }

    /// Copy a page's non-document resources into its renamed output
    /// directory. Child pages and their directories are handled by their
    /// own nodes.
    fn copy_resources(&self, node: &PageNode) -> Result<(), GenerateError> {
        let src_dir = node.source_path.with_extension("");
        if !src_dir.is_dir() {
            return Ok(());
        }
        let dest_dir = node.output_path.with_extension("");

        let entries = fs::read_dir(&src_dir).map_err(|e| GenerateError::io(&src_dir, e))?;
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "html") {
                continue;
            }
            if path.is_dir() && path.with_extension("html").is_file() {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            copy_recursive(&path, &dest_dir.join(name))?;
        }
        Ok(())
    }
}

/// Copy a file or directory tree.
fn copy_recursive(src: &Path, dest: &Path) -> Result<(), GenerateError> {
    if src.is_dir() {
        fs::create_dir_all(dest).map_err(|e| GenerateError::io(dest, e))?;
        let entries = fs::read_dir(src).map_err(|e| GenerateError::io(src, e))?;
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let Some(name) = path.file_name() else {
                continue;
            };
            copy_recursive(&path, &dest.join(name))?;
        }
    } else {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
        }
        fs::copy(src, dest).map_err(|e| GenerateError::io(src, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn marker(href: &str, text: &str) -> String {
        format!(r#"<figure class="link-to-page"><a href="{href}">{text}</a></figure>"#)
    }

    /// The end-to-end fixture from the observable behavior: a root page
    /// linking Guide then API, with matching leaf pages.
    fn write_fixture(input: &Path) {
        let root_html = format!(
            "<html><head><title>Root</title></head><body>{}{}</body></html>",
            marker("root/Guide.html", "Guide"),
            marker("root/API.html", "API"),
        );
        fs::write(input.join("root.html"), root_html).unwrap();

        let child_dir = input.join("root");
        fs::create_dir(&child_dir).unwrap();
        fs::write(
            child_dir.join("Guide.html"),
            "<html><head><title>Guide</title></head><body>\
<a href=\"API.html\">see api</a></body></html>",
        )
        .unwrap();
        fs::write(
            child_dir.join("API.html"),
            "<html><head><title>API</title></head><body></body></html>",
        )
        .unwrap();
    }

    fn generate_into(input: &Path, output: &Path) -> GenerateSummary {
        SiteGenerator::new(Config::default())
            .generate(input, output)
            .unwrap()
    }

    fn read_nav(output: &Path) -> serde_json::Value {
        let raw = fs::read_to_string(output.join("page-links.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_end_to_end_navigation_order() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_fixture(&input);

        let summary = generate_into(&input, &output);

        assert_eq!(summary.pages, 3);
        let nav = read_nav(&output);
        assert_eq!(nav[0]["title"], "Guide");
        assert_eq!(nav[0]["order"], 0);
        assert_eq!(nav[1]["title"], "API");
        assert_eq!(nav[1]["order"], 1);
    }

    #[test]
    fn test_pipeline_idempotence() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_fixture(&input);

        generate_into(&input, &output);
        let first = fs::read(output.join("page-links.json")).unwrap();
        generate_into(&input, &output);
        let second = fs::read(output.join("page-links.json")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_sibling_links_rewritten_in_output() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_fixture(&input);

        generate_into(&input, &output);

        let guide = fs::read_to_string(output.join("root").join("guide.html")).unwrap();
        assert!(
            guide.contains(r#"<a href="api.html">see api</a>"#),
            "sibling link not rewritten: {guide}"
        );
    }

    #[test]
    fn test_output_wiped_between_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_fixture(&input);

        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("stale.html"), "old run").unwrap();

        generate_into(&input, &output);

        assert!(!output.join("stale.html").exists());
        assert!(output.join("root.html").exists());
    }

    #[test]
    fn test_resources_copied_under_renamed_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_fixture(&input);
        fs::write(input.join("root").join("chart.png"), [0x89, 0x50]).unwrap();

        generate_into(&input, &output);

        assert!(output.join("root").join("chart.png").exists());
    }

    #[test]
    fn test_version_tag_becomes_subdirectory() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_fixture(&input);

        let mut config = Config::default();
        config.version_tag = Some("v3".to_string());
        SiteGenerator::new(config).generate(&input, &output).unwrap();

        assert!(output.join("v3").join("root.html").exists());
        assert!(output.join("v3").join("page-links.json").exists());
    }

    #[test]
    fn test_categories_file_excluded_from_tree_and_extracted() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_fixture(&input);
        // Sorts before root.html; must not be mistaken for the root page.
        fs::write(
            input.join("Categories.html"),
            r#"<h2>Layout</h2><a href="https://example.com/grid">Grid</a>"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.categories_file = Some("Categories.html".to_string());
        let summary = SiteGenerator::new(config).generate(&input, &output).unwrap();

        assert_eq!(summary.categories, 1);
        assert!(output.join("root.html").exists());
        let raw = fs::read_to_string(output.join("categories.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["category"], "Layout");
    }

    #[test]
    fn test_missing_input_dir_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SiteGenerator::new(Config::default())
            .generate(&tmp.path().join("absent"), &tmp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, GenerateError::Io { .. }));
    }
}
