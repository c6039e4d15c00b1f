use log::{debug, warn};
use scc::HashMap;
use std::sync::{PoisonError, RwLock};

use super::entry::{ChangeKind, NodeKind, TreeEntry};
use crate::sha::Sha;

/// Key of the (virtual) tree root
pub const ROOT: &str = "";

/// A materialized tree node, keyed by its full path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub full_name: String,
    pub kind: NodeKind,
    pub change: ChangeKind,
    pub content_id: Sha,
    /// Previous blob to diff against, for modified files
    pub compare_to: Option<Sha>,
}

impl TreeNode {
    pub fn from_entry(entry: &TreeEntry) -> Result<Self, String> {
        Ok(Self {
            name: entry.name().to_string(),
            full_name: entry.full_name().to_string(),
            kind: entry.kind(),
            change: entry.change(),
            content_id: entry.content_id()?,
            compare_to: entry.metadata.old_sha.clone(),
        })
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Lazily materialized file tree.
///
/// Children lists and content payloads are written at most once per node and
/// only read afterwards; a second writer loses and sees the first value.
///
/// Every `clear` starts a new generation. Writes tagged with an older
/// generation are discarded, so a fetch that outlives a tree switch cannot
/// leak into the new commit's tree.
#[derive(Default)]
pub struct TreeStore {
    nodes: HashMap<String, TreeNode>,
    children: HashMap<String, Vec<String>>,
    contents: HashMap<String, String>,
    generation: RwLock<u64>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation the store is currently in
    pub fn generation(&self) -> u64 {
        *self.generation.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the children of `parent` in the current generation.
    pub fn insert_children(&self, parent: &str, entries: &[TreeEntry]) -> Vec<TreeNode> {
        let current = self.generation.read().unwrap_or_else(PoisonError::into_inner);
        self.write_children(parent, entries);
        drop(current);
        self.children_of(parent).unwrap_or_default()
    }

    /// Register the children of `parent` fetched during `generation`.
    /// Returns the children now on record, which are the earlier ones if
    /// `parent` was already expanded, or `None` if the store was cleared
    /// since.
    pub fn insert_children_for(
        &self,
        generation: u64,
        parent: &str,
        entries: &[TreeEntry],
    ) -> Option<Vec<TreeNode>> {
        let current = self.generation.read().unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            debug!("Discarding children of {parent:?} from tree generation {generation}");
            return None;
        }
        self.write_children(parent, entries);
        drop(current);
        Some(self.children_of(parent).unwrap_or_default())
    }

    fn write_children(&self, parent: &str, entries: &[TreeEntry]) {
        let mut paths = Vec::with_capacity(entries.len());
        for entry in entries {
            let node = match TreeNode::from_entry(entry) {
                Ok(node) => node,
                Err(e) => {
                    warn!("Skipping tree entry {:?} under {parent:?}: {e}", entry.name());
                    continue;
                }
            };
            let path = node.full_name.clone();
            if self.nodes.insert(path.clone(), node).is_err() {
                debug!("Tree node {path:?} already registered");
            }

            if let Some(content) = &entry.metadata.content {
                let _ = self.contents.insert(path.clone(), content.clone());
            }
            if let Some(children) = &entry.children {
                self.write_children(&path, children);
            }
            paths.push(path);
        }

        if self.children.insert(parent.to_string(), paths).is_err() {
            debug!("Children of {parent:?} already loaded, keeping first result");
        }
    }

    pub fn children_of(&self, parent: &str) -> Option<Vec<TreeNode>> {
        let paths = self.children.read(parent, |_, v| v.clone())?;
        Some(paths.iter().filter_map(|p| self.node(p)).collect())
    }

    pub fn is_expanded(&self, parent: &str) -> bool {
        self.children.contains(parent)
    }

    pub fn node(&self, path: &str) -> Option<TreeNode> {
        self.nodes.read(path, |_, v| v.clone())
    }

    /// Store a payload for `path`. Returns false if one was already cached.
    pub fn cache_content(&self, path: &str, payload: String) -> bool {
        let generation = self.generation();
        self.cache_content_for(generation, path, payload)
    }

    /// Store a payload fetched during `generation`. Returns false if one was
    /// already cached or the store was cleared since.
    pub fn cache_content_for(&self, generation: u64, path: &str, payload: String) -> bool {
        let current = self.generation.read().unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            debug!("Discarding content of {path:?} from tree generation {generation}");
            return false;
        }
        self.contents.insert(path.to_string(), payload).is_ok()
    }

    pub fn cached_content(&self, path: &str) -> Option<String> {
        self.contents.read(path, |_, v| v.clone())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drop everything and start a new generation; used when a different
    /// commit's tree is shown
    pub fn clear(&self) {
        let mut generation = self.generation.write().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        self.nodes.clear();
        self.children.clear();
        self.contents.clear();
    }
}
