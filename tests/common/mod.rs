#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use ggnav::transport::{FileRequest, GraphPageRequest};
use ggnav::tree::{EntryAttr, EntryData, EntryMetadata, TreeEntry};
use ggnav::{FetchError, Fetched, Sha, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Detail(Sha),
    Graph(GraphPageRequest),
    Tree(Sha, Option<String>),
    File(FileRequest),
}

type Reply<T> = Result<Fetched<T>, FetchError>;

/// Scripted transport that records every request it receives
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    graph_pages: Mutex<VecDeque<Reply<String>>>,
    details: Mutex<HashMap<Sha, Reply<String>>>,
    trees: Mutex<HashMap<Sha, Vec<TreeEntry>>>,
    files: Mutex<HashMap<Sha, Reply<String>>>,
    held: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_graph_page(&self, reply: Reply<String>) {
        self.graph_pages.lock().unwrap().push_back(reply);
    }

    pub fn set_detail(&self, sha: &Sha, reply: Reply<String>) {
        self.details.lock().unwrap().insert(sha.clone(), reply);
    }

    pub fn set_tree(&self, sha: &Sha, entries: Vec<TreeEntry>) {
        self.trees.lock().unwrap().insert(sha.clone(), entries);
    }

    pub fn set_file(&self, sha: &Sha, reply: Reply<String>) {
        self.files.lock().unwrap().insert(sha.clone(), reply);
    }

    /// Hold the next detail, tree or file fetch open until the sender fires
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.held.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn detail_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Detail(_)))
            .count()
    }

    pub fn tree_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Tree(..)))
            .count()
    }

    pub fn file_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::File(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_if_held(&self) {
        let held = self.held.lock().unwrap().take();
        if let Some(rx) = held {
            let _ = rx.await;
        }
    }
}

impl Transport for MockTransport {
    async fn fetch_commit_detail(
        &self,
        sha: &Sha,
        _compare_to: Option<&Sha>,
    ) -> Result<Fetched<String>, FetchError> {
        self.record(Call::Detail(sha.clone()));
        self.wait_if_held().await;
        self.details
            .lock()
            .unwrap()
            .get(sha)
            .cloned()
            .unwrap_or_else(|| Ok(Fetched::success(format!("<div>commit {sha}</div>"))))
    }

    async fn fetch_graph_page(
        &self,
        request: &GraphPageRequest,
    ) -> Result<Fetched<String>, FetchError> {
        self.record(Call::Graph(request.clone()));
        self.graph_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Fetched::success(String::new())))
    }

    async fn fetch_tree_children(
        &self,
        content_id: &Sha,
        full_name: Option<&str>,
    ) -> Result<Fetched<Vec<TreeEntry>>, FetchError> {
        self.record(Call::Tree(content_id.clone(), full_name.map(str::to_string)));
        self.wait_if_held().await;
        match self.trees.lock().unwrap().get(content_id) {
            Some(entries) => Ok(Fetched::success(entries.clone())),
            None => Err(FetchError::NotFound {
                target: format!("/sha/{content_id}"),
            }),
        }
    }

    async fn fetch_file_content(&self, request: &FileRequest) -> Result<Fetched<String>, FetchError> {
        self.record(Call::File(request.clone()));
        self.wait_if_held().await;
        self.files
            .lock()
            .unwrap()
            .get(&request.content_id)
            .cloned()
            .unwrap_or_else(|| Ok(Fetched::success(format!("<pre>{}</pre>", request.content_id))))
    }
}

pub fn sha(n: usize) -> Sha {
    Sha::parse(&format!("{n:040x}")).unwrap()
}

/// Graph fragment with one node per commit in `range`
pub fn graph_markup(range: std::ops::Range<usize>, branches: &[&str]) -> String {
    let nodes: String = range
        .map(|n| {
            let id = sha(n);
            format!(
                r#"<circle class="node" id="{id}"/><text class="label" id="label_{id}">commit {n}</text>"#
            )
        })
        .collect();
    format!(
        r#"<g data-existing-branches="{}">{nodes}</g>"#,
        branches.join(",")
    )
}

pub fn entry(name: &str, full_name: &str, class: &str, content: &Sha) -> TreeEntry {
    TreeEntry {
        data: EntryData {
            title: name.to_string(),
            attr: EntryAttr {
                id: Some(format!("tree_{content}")),
                href: format!("#{content}"),
                class: Some(class.to_string()),
            },
            icon: None,
        },
        metadata: EntryMetadata {
            full_name: Some(full_name.to_string()),
            ..Default::default()
        },
        children: None,
        state: None,
    }
}
