use serde::{Deserialize, Serialize};

use crate::sha::Sha;

/// One child as described by the server's tree JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub data: EntryData,
    #[serde(default)]
    pub metadata: EntryMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryData {
    pub title: String,
    pub attr: EntryAttr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryAttr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Rendered content supplied eagerly by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_sha: Option<Sha>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
    /// Submodule or other object the server cannot open
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unmodified,
    Created,
    Deleted,
    Modified,
}

impl TreeEntry {
    /// Content id from the `#<sha>` link
    pub fn content_id(&self) -> Result<Sha, String> {
        Sha::parse(self.data.attr.href.trim_start_matches('#'))
    }

    pub fn name(&self) -> &str {
        &self.data.title
    }

    /// Full path, falling back to the display name for top-level entries
    pub fn full_name(&self) -> &str {
        self.metadata.full_name.as_deref().unwrap_or(&self.data.title)
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.data
            .attr
            .class
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
    }

    pub fn kind(&self) -> NodeKind {
        let mut kind = NodeKind::Reference;
        for class in self.classes() {
            match class {
                "file" => kind = NodeKind::File,
                "directory" => kind = NodeKind::Directory,
                _ => {}
            }
        }
        kind
    }

    pub fn change(&self) -> ChangeKind {
        let mut change = ChangeKind::Unmodified;
        for class in self.classes() {
            match class {
                "created" => change = ChangeKind::Created,
                "deleted" => change = ChangeKind::Deleted,
                "modified" => change = ChangeKind::Modified,
                _ => {}
            }
        }
        change
    }

    pub fn is_open(&self) -> bool {
        self.state.as_deref() == Some("open")
    }
}
