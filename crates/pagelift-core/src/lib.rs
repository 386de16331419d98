//! Static-site generation from hierarchical HTML note exports.
//!
//! This crate turns a tree of exported HTML pages into a documentation
//! site: internal links are rewritten to clean relative paths, pen
//! widgets are upgraded to live embeds via oEmbed, and a navigation
//! manifest is emitted alongside the pages.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::Path;
//! use pagelift_core::{Config, SiteGenerator};
//!
//! let config = Config::load(None, Path::new("."))?;
//! let summary = SiteGenerator::new(config)
//!     .generate(Path::new("export"), Path::new("site"))?;
//! println!("wrote {} pages", summary.pages);
//! ```
//!
//! # Architecture
//!
//! - [`SiteGenerator`]: Main entry point running the two-pass pipeline
//! - [`TreeWalker`]: Scan pass building the page tree and [`LinkIndex`]
//! - [`LinkRewriter`]: Per-page anchor rewriting against the index
//! - [`EmbedResolver`]: Parallel oEmbed resolution with bounded retries
//! - [`build_navigation`]: Navigation manifest from the page tree

mod assets;
mod categories;
mod config;
mod embed;
mod error;
mod extract;
mod generate;
mod index;
mod names;
mod navigation;
mod rewrite;
mod tree;

pub use assets::{AssetConfig, AssetInjector};
pub use categories::{CATEGORIES_FILE, CategoryExtractor, CategoryLink};
pub use config::{CONFIG_FILENAME, Config};
pub use embed::{EmbedConfig, EmbedOutcome, EmbedResolver};
pub use error::{ConfigError, GenerateError};
pub use extract::{MarkerLink, PageScan, PageScanner};
pub use generate::{GenerateSummary, SiteGenerator};
pub use index::LinkIndex;
pub use names::{
    format_block_fragment, name_key, normalize_identifier, output_file_name,
    short_name_from_href, split_id_suffix, strip_id_suffix,
};
pub use navigation::{NAVIGATION_FILE, NavPage, build_navigation, write_navigation};
pub use rewrite::{LinkRewriter, PageContext};
pub use tree::{PageNode, TreeWalker};
