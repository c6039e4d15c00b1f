//! Commit location and commit detail loading.
//!
//! Locating a commit prefers the graph already on screen and only asks the
//! server for more of the graph when the node is missing. Loading a commit's
//! detail goes through the session's load gate, so detail responses are
//! applied strictly one at a time.

use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::{NOT_FOUND_MESSAGE, NavError};
use crate::graph::{GraphPage, NodeRef, sha_from_element_id};
use crate::session::Session;
use crate::sha::Sha;
use crate::transport::{FetchStatus, Transport};

/// How a commit ended up highlighted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Already on the page; no request was made
    Local { row: usize, scrolled: bool },
    /// Found after extending the graph
    Remote {
        row: usize,
        added: usize,
        refreshed: bool,
    },
}

impl Resolution {
    pub fn row(&self) -> usize {
        match self {
            Resolution::Local { row, .. } | Resolution::Remote { row, .. } => *row,
        }
    }
}

/// Result of a gated detail load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(FetchStatus),
    /// Another detail load was in flight; nothing was requested
    Dropped,
}

/// A located search target and what happened to its detail load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub sha: Sha,
    pub resolution: Resolution,
    pub load: LoadOutcome,
}

impl SearchHit {
    /// True when the detail pane now shows the searched commit
    pub fn is_loaded(&self) -> bool {
        matches!(self.load, LoadOutcome::Loaded(_))
    }
}

pub struct CommitResolver<T> {
    session: Arc<Session>,
    transport: Arc<T>,
}

impl<T> Clone for CommitResolver<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            transport: self.transport.clone(),
        }
    }
}

impl<T: Transport> CommitResolver<T> {
    pub fn new(session: Arc<Session>, transport: Arc<T>) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Scroll to and highlight `sha`, fetching more of the graph if needed.
    pub async fn resolve(&self, sha: &Sha) -> Result<Resolution, NavError> {
        if let Some((node, scrolled)) = self.locate(sha).await {
            debug!("Commit {} resolved locally at row {}", sha.short(), node.row);
            return Ok(Resolution::Local {
                row: node.row,
                scrolled,
            });
        }

        let request = self.session.graph().await.next_page_request(Some(sha.clone()));
        info!(
            "Commit {} not loaded, requesting graph from offset {}",
            sha.short(),
            request.offset
        );
        let fetched = self
            .session
            .track(self.transport.fetch_graph_page(&request))
            .await
            .inspect_err(|e| self.session.report(e))?;

        let applied = self
            .session
            .graph()
            .await
            .apply_page_for(request.epoch, GraphPage::parse(fetched.body));
        let (added, refreshed) = applied.map_or((0, false), |a| (a.added, a.refreshed));
        if refreshed {
            self.session.status(format!(
                "Commit {} is not on this branch, showing its history",
                sha.short()
            ));
        }

        match self.locate(sha).await {
            Some((node, _)) => Ok(Resolution::Remote {
                row: node.row,
                added,
                refreshed,
            }),
            None => {
                warn!("Commit {sha} still missing after graph fetch");
                self.session.alert(NOT_FOUND_MESSAGE);
                Err(NavError::CommitNotFound(sha.clone()))
            }
        }
    }

    /// Find the node on the page, scroll to it and make it active
    async fn locate(&self, sha: &Sha) -> Option<(NodeRef, bool)> {
        let (node, scrolled) = {
            let mut graph = self.session.graph().await;
            let node = graph.find_node(sha)?;
            let scrolled = graph.ensure_visible(&node);
            (node, scrolled)
        };
        self.session.highlight().await.activate(sha.clone());
        Some((node, scrolled))
    }

    /// Handle a typed search: validate, locate, then show its detail.
    pub async fn search(&self, input: &str) -> Result<SearchHit, NavError> {
        let sha = match Sha::parse(input.trim()) {
            Ok(sha) => sha,
            Err(_) => {
                let err = NavError::InvalidSha(input.to_string());
                self.session.alert(err.user_message());
                return Err(err);
            }
        };

        let resolution = self.resolve(&sha).await?;
        let load = self.load_commit(&sha).await?;
        if load == LoadOutcome::Dropped {
            debug!("Detail for searched commit {} not loaded, gate busy", sha.short());
        }
        Ok(SearchHit {
            sha,
            resolution,
            load,
        })
    }

    /// Append the next page of the graph. Returns the number of new commits,
    /// zero when the graph was switched while the page was loading.
    pub async fn reveal(&self) -> Result<usize, NavError> {
        let request = self.session.graph().await.next_page_request(None);
        let fetched = self
            .session
            .track(self.transport.fetch_graph_page(&request))
            .await
            .inspect_err(|e| self.session.report(e))?;
        let applied = self
            .session
            .graph()
            .await
            .apply_page_for(request.epoch, GraphPage::parse(fetched.body));
        Ok(applied.map_or(0, |a| a.added))
    }

    /// Load a commit into the detail pane when clicked
    pub async fn click(&self, element_id: &str) -> Result<LoadOutcome, NavError> {
        match sha_from_element_id(element_id) {
            Some(sha) => self.load_commit(&sha).await,
            None => {
                debug!("Ignoring click on {element_id:?}, not a commit element");
                Err(NavError::InvalidSha(element_id.to_string()))
            }
        }
    }

    pub async fn load_commit(&self, sha: &Sha) -> Result<LoadOutcome, NavError> {
        self.load_commit_with(sha, None).await
    }

    /// Fetch commit detail under the load gate. While another load is in
    /// flight the request is dropped without touching the network.
    pub async fn load_commit_with(
        &self,
        sha: &Sha,
        compare_to: Option<&Sha>,
    ) -> Result<LoadOutcome, NavError> {
        let Some(permit) = self.session.gate().try_acquire() else {
            return Ok(LoadOutcome::Dropped);
        };

        let target = format!("/sha/{sha}");
        let result = self
            .session
            .gated(&target, self.transport.fetch_commit_detail(sha, compare_to))
            .await;

        match result {
            Ok(fetched) => {
                self.session.detail().await.show_commit(sha.clone(), fetched.body);
                self.session.highlight().await.activate(sha.clone());
                permit.release();
                info!("Loaded commit {} ({:?})", sha.short(), fetched.status);
                Ok(LoadOutcome::Loaded(fetched.status))
            }
            Err(e) => {
                permit.release();
                self.session.report(&e);
                Err(e.into())
            }
        }
    }

    pub async fn highlight_related(&self, ids: &[String], colour: &str) {
        self.session.highlight().await.highlight_related(ids, colour);
    }

    pub async fn unhighlight_related(&self, ids: &[String]) {
        self.session.highlight().await.unhighlight_related(ids);
    }
}
