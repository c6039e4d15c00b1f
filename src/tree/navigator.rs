use log::{debug, info};
use std::sync::Arc;

use super::store::{ROOT, TreeNode};
use crate::detail::is_diff_markup;
use crate::error::NavError;
use crate::session::Session;
use crate::sha::Sha;
use crate::transport::{FetchStatus, FileRequest, Transport};

/// Result of selecting a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Shown from the node's cached payload, no request made
    Cached,
    Fetched(FetchStatus),
    /// A detail load was in flight; nothing changed
    Dropped,
    /// Directories and references have no content to show
    NotAFile,
    /// The tree switched to another commit while the file was loading;
    /// the response was thrown away
    Discarded,
}

/// Lazily expands the file tree and routes file selection into the detail
/// pane.
pub struct TreeNavigator<T> {
    session: Arc<Session>,
    transport: Arc<T>,
}

impl<T> Clone for TreeNavigator<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            transport: self.transport.clone(),
        }
    }
}

impl<T: Transport> TreeNavigator<T> {
    pub fn new(session: Arc<Session>, transport: Arc<T>) -> Self {
        Self { session, transport }
    }

    /// Fetch the top-level tree of `commit` and make it the tree shown
    pub async fn load_commit_tree(&self, commit: &Sha) -> Result<usize, NavError> {
        let fetched = self
            .session
            .track(self.transport.fetch_tree_children(commit, None))
            .await
            .inspect_err(|e| self.session.report(e))?;
        if fetched.status == FetchStatus::NotModified && fetched.body.is_empty() {
            debug!("Tree for commit {} unchanged", commit.short());
            return Ok(self.session.initial_tree().await.len());
        }
        let count = fetched.body.len();
        self.session.set_initial_tree(fetched.body).await;
        info!("Tree for commit {} has {count} top-level entries", commit.short());
        Ok(count)
    }

    /// Children of `path` (`""` for the root), fetched on first expansion only.
    pub async fn expand(&self, path: &str) -> Result<Vec<TreeNode>, NavError> {
        let store = self.session.tree();
        if let Some(children) = store.children_of(path) {
            return Ok(children);
        }

        let generation = store.generation();
        if path == ROOT {
            let initial = self.session.initial_tree().await;
            return Ok(store
                .insert_children_for(generation, ROOT, &initial)
                .unwrap_or_default());
        }

        let node = store
            .node(path)
            .ok_or_else(|| NavError::UnknownNode(path.to_string()))?;
        if !node.is_dir() {
            return Ok(Vec::new());
        }

        debug!("Fetching children of {path}");
        let fetched = self
            .session
            .track(
                self.transport
                    .fetch_tree_children(&node.content_id, Some(&node.full_name)),
            )
            .await
            .inspect_err(|e| self.session.report(e))?;
        if fetched.status == FetchStatus::NotModified && fetched.body.is_empty() {
            return Ok(Vec::new());
        }
        match store.insert_children_for(generation, path, &fetched.body) {
            Some(children) => Ok(children),
            None => {
                debug!("Tree changed while fetching {path}, dropping its children");
                Ok(Vec::new())
            }
        }
    }

    /// Show a file node in the detail pane, preferring its cached payload.
    pub async fn select(&self, path: &str) -> Result<SelectOutcome, NavError> {
        let generation = self.session.tree().generation();
        let node = self
            .session
            .tree()
            .node(path)
            .ok_or_else(|| NavError::UnknownNode(path.to_string()))?;
        if !node.is_file() {
            return Ok(SelectOutcome::NotAFile);
        }

        let Some(permit) = self.session.gate().try_acquire() else {
            return Ok(SelectOutcome::Dropped);
        };

        if let Some(content) = self.session.tree().cached_content(path) {
            let is_diff = is_diff_markup(&content);
            self.session
                .detail()
                .await
                .show_file(&node.full_name, node.content_id.clone(), content, is_diff);
            permit.release();
            debug!("Showing cached content for {path}");
            return Ok(SelectOutcome::Cached);
        }

        let request = FileRequest {
            content_id: node.content_id.clone(),
            compare_to: node.compare_to.clone(),
            filename_hint: Some(node.full_name.clone()),
        };
        let target = format!("/sha/{}", node.content_id);
        let result = self
            .session
            .gated(&target, self.transport.fetch_file_content(&request))
            .await;

        match result {
            Ok(fetched) => {
                let markup = fetched.body;
                if self.session.tree().generation() != generation {
                    permit.release();
                    debug!("Tree changed while loading {path}, discarding response");
                    return Ok(SelectOutcome::Discarded);
                }
                if !markup.is_empty() {
                    self.session
                        .tree()
                        .cache_content_for(generation, path, markup.clone());
                }
                let is_diff = is_diff_markup(&markup);
                self.session
                    .detail()
                    .await
                    .show_file(&node.full_name, node.content_id.clone(), markup, is_diff);
                permit.release();
                Ok(SelectOutcome::Fetched(fetched.status))
            }
            Err(e) => {
                permit.release();
                self.session.report(&e);
                Err(e.into())
            }
        }
    }
}
