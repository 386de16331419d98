//! Identifier and sibling-name resolution maps.
//!
//! [`LinkIndex`] is created once per run and threaded explicitly through
//! the traversal. Phase discipline: single-writer during the scan pass,
//! read-only during rewriting. Rewriting against a partially built index
//! would silently drop forward references, so the generator only hands
//! out `&LinkIndex` once the scan pass has finished.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::names;

/// Resolution maps built during the scan pass.
#[derive(Clone, Debug, Default)]
pub struct LinkIndex {
    /// Opaque identifier (hyphens stripped, case preserved) -> output path.
    ids: HashMap<String, PathBuf>,
    /// Normalized short name -> output path.
    names: HashMap<String, PathBuf>,
}

impl LinkIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identifier for an output path. Append-only; the first
    /// insertion wins, and a later insertion under the same identifier
    /// for a different path is logged.
    pub fn insert_id(&mut self, raw: &str, output_path: &Path) {
        insert_first(&mut self.ids, names::normalize_identifier(raw), output_path, "identifier");
    }

    /// Record a short name for an output path. Append-only; the first
    /// insertion wins. The name map is run-wide, so two pages sharing a
    /// short name shadow each other; the collision is logged because
    /// every link to that name will resolve to the first page.
    pub fn insert_name(&mut self, name: &str, output_path: &Path) {
        insert_first(&mut self.names, names::name_key(name), output_path, "short name");
    }

    /// Resolve an identifier in any hyphenation to its output path.
    #[must_use]
    pub fn resolve_id(&self, raw: &str) -> Option<&Path> {
        self.ids
            .get(&names::normalize_identifier(raw))
            .map(PathBuf::as_path)
    }

    /// Resolve a short name to its output path.
    #[must_use]
    pub fn resolve_name(&self, name: &str) -> Option<&Path> {
        self.names
            .get(&names::name_key(name))
            .map(PathBuf::as_path)
    }

    /// Number of identifier entries.
    #[must_use]
    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of short-name entries.
    #[must_use]
    pub fn name_count(&self) -> usize {
        self.names.len()
    }
}

/// First insertion wins; a repeat under a different path is a collision
/// worth surfacing, since later lookups will mis-resolve to the first.
fn insert_first(map: &mut HashMap<String, PathBuf>, key: String, output_path: &Path, kind: &str) {
    match map.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(output_path.to_path_buf());
        }
        Entry::Occupied(entry) => {
            if entry.get() != output_path {
                warn!(
                    "{kind} '{}' already maps to {}, links will not reach {}",
                    entry.key(),
                    entry.get().display(),
                    output_path.display()
                );
            }
        }
    }
}
