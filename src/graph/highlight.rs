use std::collections::{BTreeMap, BTreeSet};

use crate::sha::Sha;

pub const ACTIVE_LABEL_FILL: &str = "blue";
pub const NEUTRAL_LABEL_FILL: &str = "black";
pub const NEUTRAL_NODE_FILL: &str = "white";

/// Element id prefixes that make up a commit's label row
pub const LABEL_PREFIXES: [&str; 3] = ["label_", "author_", "date_"];

/// Which commit is active, and which nodes are temporarily highlighted as
/// relatives of a hovered node.
#[derive(Debug, Clone, Default)]
pub struct HighlightState {
    active: Option<Sha>,
    related: BTreeMap<String, String>,
    edges: BTreeSet<String>,
}

impl HighlightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `sha` the only active commit, returning the previous one
    pub fn activate(&mut self, sha: Sha) -> Option<Sha> {
        self.active.replace(sha)
    }

    pub fn active(&self) -> Option<&Sha> {
        self.active.as_ref()
    }

    pub fn is_active(&self, sha: &Sha) -> bool {
        self.active.as_ref() == Some(sha)
    }

    /// Fill of a label element such as `label_<sha>`
    pub fn label_fill(&self, element_id: &str) -> &'static str {
        let is_active_label = self.active.as_ref().is_some_and(|sha| {
            LABEL_PREFIXES
                .iter()
                .any(|prefix| element_id.strip_prefix(prefix) == Some(sha.as_str()))
        });
        if is_active_label {
            ACTIVE_LABEL_FILL
        } else {
            NEUTRAL_LABEL_FILL
        }
    }

    pub fn highlight_related(&mut self, ids: &[String], colour: &str) {
        for id in ids {
            self.related.insert(id.clone(), colour.to_string());
            self.edges.insert(format!("parent_{id}"));
        }
    }

    pub fn unhighlight_related(&mut self, ids: &[String]) {
        for id in ids {
            self.related.remove(id);
            self.edges.remove(&format!("parent_{id}"));
        }
    }

    pub fn node_fill(&self, id: &str) -> &str {
        self.related
            .get(id)
            .map(String::as_str)
            .unwrap_or(NEUTRAL_NODE_FILL)
    }

    /// Whether the edge class `parent_<id>` carries the highlight mark
    pub fn edge_highlighted(&self, edge_class: &str) -> bool {
        self.edges.contains(edge_class)
    }
}
