use log::{debug, info};

use super::markup::GraphPage;
use crate::sha::Sha;
use crate::transport::{GraphHead, GraphPageRequest};

/// Visible band of the graph pane, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub top: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self { top: 0, height }
    }

    /// Rows kept between a target and the viewport edge before scrolling
    fn margin(&self) -> usize {
        self.height / 5
    }

    /// True when `row` sits comfortably inside the viewport
    pub fn is_comfortable(&self, row: usize) -> bool {
        let margin = self.margin();
        row >= self.top + margin && row + margin < self.top + self.height
    }

    pub fn center_on(&mut self, row: usize) {
        self.top = row.saturating_sub(self.height / 2);
    }
}

/// Reference to a rendered commit node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub sha: Sha,
    pub row: usize,
}

/// What applying a page did to the loaded window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageApplied {
    pub added: usize,
    pub refreshed: bool,
    pub offset: usize,
}

/// The graph pane: rendered fragments plus the loaded window they cover.
///
/// Rendered nodes are the only record of which commits are loaded; there is
/// no side index. Within an epoch the window is append-only and the offset
/// never decreases.
#[derive(Debug, Clone)]
pub struct GraphPane {
    fragments: Vec<String>,
    rows: Vec<Sha>,
    offset: usize,
    branches: Vec<String>,
    head: GraphHead,
    epoch: u64,
    viewport: Viewport,
}

impl GraphPane {
    pub fn new(head: GraphHead, viewport_rows: usize) -> Self {
        Self {
            fragments: Vec::new(),
            rows: Vec::new(),
            offset: 0,
            branches: Vec::new(),
            head,
            epoch: 0,
            viewport: Viewport::new(viewport_rows),
        }
    }

    pub fn find_node(&self, sha: &Sha) -> Option<NodeRef> {
        self.rows
            .iter()
            .position(|row| row == sha)
            .map(|row| NodeRef {
                sha: sha.clone(),
                row,
            })
    }

    /// Topmost commit of the loaded window
    pub fn first_node(&self) -> Option<Sha> {
        self.rows.first().cloned()
    }

    pub fn contains(&self, sha: &Sha) -> bool {
        self.find_node(sha).is_some()
    }

    /// Scroll so the node is visible, unless it already is. Returns whether
    /// the viewport moved.
    pub fn ensure_visible(&mut self, node: &NodeRef) -> bool {
        if self.viewport.is_comfortable(node.row) {
            return false;
        }
        self.viewport.center_on(node.row);
        debug!("Scrolled graph to row {} (top {})", node.row, self.viewport.top);
        true
    }

    /// Request for the page that follows the loaded window
    pub fn next_page_request(&self, search_commit: Option<Sha>) -> GraphPageRequest {
        GraphPageRequest {
            head: self.head.clone(),
            epoch: self.epoch,
            offset: self.offset,
            branches: self.branches.clone(),
            search_commit,
        }
    }

    /// Apply a page answering a request made in `epoch`. Pages requested
    /// before the graph was last switched are dropped and `None` returned.
    pub fn apply_page_for(&mut self, epoch: u64, page: GraphPage) -> Option<PageApplied> {
        if epoch != self.epoch {
            debug!(
                "Dropping graph page from epoch {epoch}, now at epoch {}",
                self.epoch
            );
            return None;
        }
        Some(self.apply_page(page))
    }

    pub fn apply_page(&mut self, page: GraphPage) -> PageApplied {
        if page.refresh {
            return self.restart(page);
        }

        let mut added = 0;
        for sha in page.nodes {
            if !self.contains(&sha) {
                self.rows.push(sha);
                added += 1;
            }
        }
        self.fragments.push(page.markup);
        self.offset += added;
        if !page.existing_branches.is_empty() {
            self.branches = page.existing_branches;
        }
        if let Some(name) = page.current_ref {
            self.head = GraphHead::Ref(name);
        }
        debug!("Appended {added} commits to graph, offset now {}", self.offset);

        PageApplied {
            added,
            refreshed: false,
            offset: self.offset,
        }
    }

    /// Replace the window with a graph rooted elsewhere (new epoch)
    fn restart(&mut self, page: GraphPage) -> PageApplied {
        self.epoch += 1;
        self.rows.clear();
        for sha in page.nodes {
            if !self.rows.contains(&sha) {
                self.rows.push(sha);
            }
        }
        self.head = match (page.current_ref, self.rows.first()) {
            (Some(name), _) => GraphHead::Ref(name),
            (None, Some(first)) => GraphHead::Commit(first.clone()),
            (None, None) => GraphHead::Default,
        };
        self.fragments = vec![page.markup];
        self.offset = self.rows.len();
        self.branches = page.existing_branches;
        self.viewport.top = 0;
        info!(
            "Graph switched to {:?} (epoch {}, {} commits)",
            self.head, self.epoch, self.offset
        );

        PageApplied {
            added: self.offset,
            refreshed: true,
            offset: self.offset,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn head(&self) -> &GraphHead {
        &self.head
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport_height(&mut self, rows: usize) {
        self.viewport.height = rows;
    }

    pub fn markup(&self) -> String {
        self.fragments.concat()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha(n: usize) -> Sha {
        Sha::parse(&format!("{n:040x}")).unwrap()
    }

    fn page(range: std::ops::Range<usize>) -> GraphPage {
        let markup: String = range
            .clone()
            .map(|n| format!(r#"<circle class="node" id="{}"/>"#, sha(n)))
            .collect();
        GraphPage {
            nodes: range.map(sha).collect(),
            markup,
            existing_branches: vec!["b1".into()],
            current_ref: None,
            refresh: false,
        }
    }

    #[test]
    fn test_append_grows_offset() {
        let mut pane = GraphPane::new(GraphHead::Default, 20);
        assert_eq!(pane.apply_page(page(0..10)).added, 10);
        assert_eq!(pane.apply_page(page(10..15)).offset, 15);
        assert_eq!(pane.row_count(), 15);
        assert_eq!(pane.find_node(&sha(12)).unwrap().row, 12);
        assert!(pane.find_node(&sha(99)).is_none());
    }

    #[test]
    fn test_overlapping_pages_do_not_double_count() {
        let mut pane = GraphPane::new(GraphHead::Default, 20);
        pane.apply_page(page(0..10));
        let applied = pane.apply_page(page(5..12));
        assert_eq!(applied.added, 2);
        assert_eq!(pane.offset(), 12);
    }

    #[test]
    fn test_next_request_carries_window() {
        let mut pane = GraphPane::new(GraphHead::Ref("HEAD".into()), 20);
        pane.apply_page(page(0..3));
        let request = pane.next_page_request(Some(sha(50)));
        assert_eq!(request.offset, 3);
        assert_eq!(request.branches, vec!["b1".to_string()]);
        assert_eq!(request.head, GraphHead::Ref("HEAD".into()));
        assert_eq!(request.search_commit, Some(sha(50)));
        assert_eq!(request.epoch, 0);
    }

    #[test]
    fn test_page_from_previous_epoch_is_dropped() {
        let mut pane = GraphPane::new(GraphHead::Default, 20);
        pane.apply_page(page(0..10));
        let early = pane.next_page_request(None);

        let mut switched = page(40..44);
        switched.refresh = true;
        switched.existing_branches = vec!["other".into()];
        pane.apply_page_for(pane.epoch(), switched).unwrap();

        let mut late = page(10..20);
        late.existing_branches = vec!["stale".into()];
        assert!(pane.apply_page_for(early.epoch, late).is_none());
        assert_eq!(pane.offset(), 4);
        assert_eq!(pane.branches(), ["other".to_string()]);
        assert!(pane.find_node(&sha(12)).is_none());

        let current = pane.next_page_request(None);
        assert_eq!(current.epoch, 1);
        let applied = pane.apply_page_for(current.epoch, page(44..46)).unwrap();
        assert_eq!(applied.offset, 6);
    }

    #[test]
    fn test_refresh_starts_new_epoch() {
        let mut pane = GraphPane::new(GraphHead::Default, 20);
        pane.apply_page(page(0..10));
        let mut switched = page(40..44);
        switched.refresh = true;
        let applied = pane.apply_page(switched);
        assert!(applied.refreshed);
        assert_eq!(pane.epoch(), 1);
        assert_eq!(pane.offset(), 4);
        assert!(pane.find_node(&sha(1)).is_none());
        assert_eq!(pane.head(), &GraphHead::Commit(sha(40)));
    }

    #[test]
    fn test_scroll_only_outside_comfort_band() {
        let mut pane = GraphPane::new(GraphHead::Default, 10);
        pane.apply_page(page(0..50));

        let near = pane.find_node(&sha(5)).unwrap();
        assert!(!pane.ensure_visible(&near));
        assert_eq!(pane.viewport().top, 0);

        let far = pane.find_node(&sha(30)).unwrap();
        assert!(pane.ensure_visible(&far));
        assert_eq!(pane.viewport().top, 25);
        assert!(!pane.ensure_visible(&far));
    }

    #[test]
    fn test_viewport_band_edges() {
        let viewport = Viewport { top: 10, height: 10 };
        assert!(!viewport.is_comfortable(11));
        assert!(viewport.is_comfortable(12));
        assert!(viewport.is_comfortable(17));
        assert!(!viewport.is_comfortable(18));
    }
}
