use log::{debug, error, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, mpsc};

use crate::detail::DetailPane;
use crate::error::FetchError;
use crate::gate::LoadGate;
use crate::graph::{GraphPage, GraphPane, HighlightState};
use crate::loader::LoaderIndicator;
use crate::transport::GraphHead;
use crate::tree::{TreeEntry, TreeStore};

/// Messages for the user, in the order they were raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Modal alert text
    Alert(String),
    Status(String),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub head: GraphHead,
    pub viewport_rows: usize,
    /// Forced release of the load gate; `None` leaves a hung fetch holding it
    pub detail_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            head: GraphHead::Default,
            viewport_rows: 40,
            detail_timeout: None,
        }
    }
}

/// State of one open graph view, shared by the commit resolver and the tree
/// navigator through an `Arc`.
pub struct Session {
    graph: Mutex<GraphPane>,
    detail: Mutex<DetailPane>,
    highlight: Mutex<HighlightState>,
    tree: TreeStore,
    initial_tree: Mutex<Vec<TreeEntry>>,
    gate: LoadGate,
    loader: LoaderIndicator,
    detail_timeout: Option<Duration>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl Session {
    pub fn new(config: SessionConfig) -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
        let (notices, rx) = mpsc::unbounded_channel();
        let session = Self {
            graph: Mutex::new(GraphPane::new(config.head, config.viewport_rows)),
            detail: Mutex::new(DetailPane::new()),
            highlight: Mutex::new(HighlightState::new()),
            tree: TreeStore::new(),
            initial_tree: Mutex::new(Vec::new()),
            gate: LoadGate::new(),
            loader: LoaderIndicator::new(),
            detail_timeout: config.detail_timeout,
            notices,
        };
        (Arc::new(session), rx)
    }

    /// Seed the graph with the page rendered alongside the initial view
    pub async fn load_initial_graph(&self, markup: String) -> usize {
        let applied = self.graph.lock().await.apply_page(GraphPage::parse(markup));
        info!("Initial graph loaded with {} commits", applied.offset);
        applied.offset
    }

    /// Replace the top-level tree; the previous tree's nodes are discarded
    pub async fn set_initial_tree(&self, entries: Vec<TreeEntry>) {
        let mut initial = self.initial_tree.lock().await;
        self.tree.clear();
        *initial = entries;
    }

    pub async fn initial_tree(&self) -> Vec<TreeEntry> {
        self.initial_tree.lock().await.clone()
    }

    pub async fn graph(&self) -> MutexGuard<'_, GraphPane> {
        self.graph.lock().await
    }

    pub async fn detail(&self) -> MutexGuard<'_, DetailPane> {
        self.detail.lock().await
    }

    pub async fn highlight(&self) -> MutexGuard<'_, HighlightState> {
        self.highlight.lock().await
    }

    pub fn tree(&self) -> &TreeStore {
        &self.tree
    }

    pub fn gate(&self) -> &LoadGate {
        &self.gate
    }

    pub fn loader(&self) -> &LoaderIndicator {
        &self.loader
    }

    /// Raise a user-facing alert
    pub fn alert(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        if self.notices.send(Notice::Alert(message)).is_err() {
            debug!("Notice receiver dropped");
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        if self.notices.send(Notice::Status(message)).is_err() {
            debug!("Notice receiver dropped");
        }
    }

    pub fn report(&self, err: &FetchError) {
        self.alert(err.user_message());
    }

    /// Run a fetch while the loader tracks it
    pub async fn track<F, T>(&self, fetch: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.loader.begin();
        fetch.await
    }

    /// Run a gated fetch, bounded by the detail timeout when one is set
    pub async fn gated<F, T>(&self, target: &str, fetch: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        match self.detail_timeout {
            Some(after) => match tokio::time::timeout(after, self.track(fetch)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout {
                    target: target.to_string(),
                    after,
                }),
            },
            None => self.track(fetch).await,
        }
    }
}
