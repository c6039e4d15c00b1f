//! Abstract request/response channel to the graph server.
//!
//! Every operation resolves to either a body with a [`FetchStatus`] or a
//! [`FetchError`]. "Not modified" is a valid outcome and is handled the same
//! way as success by callers.

use std::future::Future;

use crate::error::FetchError;
use crate::sha::Sha;
use crate::tree::TreeEntry;

mod http;

pub use http::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    NotModified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub status: FetchStatus,
    pub body: T,
}

impl<T> Fetched<T> {
    pub fn success(body: T) -> Self {
        Self {
            status: FetchStatus::Success,
            body,
        }
    }

    pub fn not_modified(body: T) -> Self {
        Self {
            status: FetchStatus::NotModified,
            body,
        }
    }
}

/// Where the graph is rooted; decides the page URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GraphHead {
    #[default]
    Default,
    /// `HEAD`, `refs/heads/..`, `refs/remotes/..` or `refs/tags/..`
    Ref(String),
    Commit(Sha),
}

impl GraphHead {
    pub fn path(&self) -> String {
        match self {
            GraphHead::Ref(name) => format!("/{name}"),
            GraphHead::Commit(sha) => format!("/graph/{sha}"),
            GraphHead::Default => "/".to_string(),
        }
    }

    /// Only `HEAD` and full ref names are addressable as refs
    pub fn is_ref_name(name: &str) -> bool {
        name == "HEAD"
            || ["refs/heads/", "refs/remotes/", "refs/tags/"]
                .iter()
                .any(|prefix| name.len() > prefix.len() && name.starts_with(prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPageRequest {
    pub head: GraphHead,
    /// Graph epoch the request was made in; not sent to the server
    pub epoch: u64,
    pub offset: usize,
    pub branches: Vec<String>,
    pub search_commit: Option<Sha>,
}

impl GraphPageRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("offset", self.offset.to_string())];
        for branch in &self.branches {
            query.push(("branches", branch.clone()));
        }
        if let Some(sha) = &self.search_commit {
            query.push(("search_commit", sha.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub content_id: Sha,
    pub compare_to: Option<Sha>,
    pub filename_hint: Option<String>,
}

impl FileRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(old) = &self.compare_to {
            query.push(("compare_to", old.to_string()));
        }
        if let Some(name) = &self.filename_hint {
            query.push(("filename_hint", name.clone()));
        }
        query
    }
}

/// The four operations the navigation core consumes.
pub trait Transport: Send + Sync {
    /// Markup for the detail pane describing one commit
    fn fetch_commit_detail(
        &self,
        sha: &Sha,
        compare_to: Option<&Sha>,
    ) -> impl Future<Output = Result<Fetched<String>, FetchError>> + Send;

    /// Markup fragment to append to the graph pane
    fn fetch_graph_page(
        &self,
        request: &GraphPageRequest,
    ) -> impl Future<Output = Result<Fetched<String>, FetchError>> + Send;

    /// Children of a tree (or the top-level tree of a commit when
    /// `full_name` is `None`)
    fn fetch_tree_children(
        &self,
        content_id: &Sha,
        full_name: Option<&str>,
    ) -> impl Future<Output = Result<Fetched<Vec<TreeEntry>>, FetchError>> + Send;

    /// Markup for the detail pane showing a file or file diff
    fn fetch_file_content(
        &self,
        request: &FileRequest,
    ) -> impl Future<Output = Result<Fetched<String>, FetchError>> + Send;
}
