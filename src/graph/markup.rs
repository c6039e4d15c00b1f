use regex::Regex;
use std::sync::LazyLock;

use crate::sha::{Sha, is_valid_sha};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z][^>]*>").expect("tag regex"));
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)class\s*=\s*"([^"]*)""#).expect("class regex"));
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)id\s*=\s*"([^"]*)""#).expect("id regex"));
static BRANCHES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-existing-branches\s*=\s*"([^"]*)""#).expect("branches regex")
});
static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-current-ref\s*=\s*"([^"]*)""#).expect("ref regex"));
static REFRESH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-refresh\s*=\s*"([^"]*)""#).expect("refresh regex"));

/// A graph fragment as returned by the server, with the facts the
/// navigation core needs pulled out of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphPage {
    pub markup: String,
    /// Commit node ids in row order
    pub nodes: Vec<Sha>,
    pub existing_branches: Vec<String>,
    pub current_ref: Option<String>,
    /// Server switched to a graph rooted at the searched commit
    pub refresh: bool,
}

impl GraphPage {
    pub fn parse(markup: String) -> Self {
        let nodes = scan_nodes(&markup);
        let existing_branches = BRANCHES_RE
            .captures(&markup)
            .map(|caps| {
                caps[1]
                    .split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let current_ref = REF_RE
            .captures(&markup)
            .map(|caps| caps[1].trim().to_string())
            .filter(|r| !r.is_empty());
        let refresh = REFRESH_RE
            .captures(&markup)
            .is_some_and(|caps| caps[1].trim().eq_ignore_ascii_case("true"));

        Self {
            markup,
            nodes,
            existing_branches,
            current_ref,
            refresh,
        }
    }
}

/// Ids of elements whose class list contains `node` and whose id is a SHA
pub fn scan_nodes(markup: &str) -> Vec<Sha> {
    TAG_RE
        .find_iter(markup)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let classes = CLASS_RE.captures(tag)?;
            if !classes[1].split_whitespace().any(|c| c == "node") {
                return None;
            }
            let id = ID_RE.captures(tag)?;
            Sha::parse(&id[1]).ok()
        })
        .collect()
}

/// Commit id addressed by a clicked element.
///
/// Nodes carry the bare SHA; labels use `label_<sha>`, `author_<sha>` or
/// `date_<sha>`.
pub fn sha_from_element_id(element_id: &str) -> Option<Sha> {
    if is_valid_sha(element_id) {
        return Sha::parse(element_id).ok();
    }
    let (_, rest) = element_id.split_once('_')?;
    Sha::parse(rest).ok()
}
