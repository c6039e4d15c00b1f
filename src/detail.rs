use crate::sha::Sha;

pub const JUMP_LINK_TARGET: &str = "#changed_line";
pub const JUMP_LINK_TEXT: &str = "(Go to first change)";

/// What the detail pane is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailSource {
    Commit(Sha),
    File { path: String, content_id: Sha },
}

/// The bottom pane. One resource shared by commit and file loads; callers
/// only mutate it while holding the load gate.
#[derive(Debug, Clone, Default)]
pub struct DetailPane {
    content: Option<String>,
    title: Option<String>,
    source: Option<DetailSource>,
    jump_link: bool,
    revision: u64,
}

impl DetailPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a commit. An empty not-modified body keeps the current content.
    pub fn show_commit(&mut self, sha: Sha, markup: String) {
        if !markup.is_empty() {
            self.content = Some(markup);
        }
        self.title = None;
        self.jump_link = false;
        self.source = Some(DetailSource::Commit(sha));
        self.revision += 1;
    }

    pub fn show_file(&mut self, path: &str, content_id: Sha, markup: String, is_diff: bool) {
        self.content = Some(markup);
        self.title = Some(path.to_string());
        self.jump_link = is_diff;
        self.source = Some(DetailSource::File {
            path: path.to_string(),
            content_id,
        });
        self.revision += 1;
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn source(&self) -> Option<&DetailSource> {
        self.source.as_ref()
    }

    pub fn has_jump_link(&self) -> bool {
        self.jump_link
    }

    /// Bumped on every replacement
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// A file response is a diff view when it carries the first-change anchor
pub fn is_diff_markup(markup: &str) -> bool {
    markup.contains(r#"id="changed_line""#) || markup.contains(r#"name="changed_line""#)
}
