use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionConfig;
use crate::sha::Sha;
use crate::transport::GraphHead;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_VIEWPORT_ROWS: usize = 40;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub debug: Option<bool>,
    pub server_url: Option<String>,
    /// Ref the graph starts from, e.g. `HEAD` or `refs/heads/main`
    pub start_ref: Option<String>,
    /// Commit the graph starts from when no ref is given
    pub start_head: Option<String>,
    /// Forced release of a hung detail fetch, in milliseconds
    pub detail_timeout_ms: Option<u64>,
    pub viewport_rows: Option<usize>,
    pub prefs_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> color_eyre::eyre::Result<Self> {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn get_config_path() -> PathBuf {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ggnav")
            .join("config.json")
    }

    pub fn get_server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    /// Graph head from the configured ref or commit. Invalid values fall
    /// back to the server's default head.
    pub fn get_graph_head(&self) -> GraphHead {
        if let Some(name) = &self.start_ref
            && GraphHead::is_ref_name(name)
        {
            return GraphHead::Ref(name.clone());
        }
        if let Some(head) = &self.start_head
            && let Ok(sha) = Sha::parse(head)
        {
            return GraphHead::Commit(sha);
        }
        GraphHead::Default
    }

    pub fn get_detail_timeout(&self) -> Option<Duration> {
        self.detail_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn get_session_config(&self) -> SessionConfig {
        SessionConfig {
            head: self.get_graph_head(),
            viewport_rows: self.viewport_rows.unwrap_or(DEFAULT_VIEWPORT_ROWS),
            detail_timeout: self.get_detail_timeout(),
        }
    }

    pub fn get_prefs_path(&self) -> PathBuf {
        self.prefs_path
            .clone()
            .unwrap_or_else(crate::layout::PreferenceStore::default_path)
    }

    pub fn merge_with_args(&self, args: &Args) -> Self {
        Self {
            debug: if args.debug { Some(true) } else { self.debug },
            server_url: args.server_url.clone().or_else(|| self.server_url.clone()),
            start_ref: args.start_ref.clone().or_else(|| self.start_ref.clone()),
            start_head: args.head.clone().or_else(|| self.start_head.clone()),
            detail_timeout_ms: args.detail_timeout_ms.or(self.detail_timeout_ms),
            viewport_rows: args.viewport_rows.or(self.viewport_rows),
            prefs_path: args.prefs_path.clone().or_else(|| self.prefs_path.clone()),
        }
    }
}

#[derive(Debug, Clone, clap::Parser)]
pub struct Args {
    #[arg(short, long, help = "Print version information and exit")]
    pub version: bool,

    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(long, help = "Base URL of the graph server")]
    pub server_url: Option<String>,

    #[arg(long = "ref", help = "Ref to start the graph from (e.g. refs/heads/main)")]
    pub start_ref: Option<String>,

    #[arg(long, help = "Commit SHA to start the graph from")]
    pub head: Option<String>,

    #[arg(
        long,
        help = "Release a hung commit load after this many milliseconds (default: never)"
    )]
    pub detail_timeout_ms: Option<u64>,

    #[arg(long, help = "Rows visible in the graph pane (default: 40)")]
    pub viewport_rows: Option<usize>,

    #[arg(long, help = "File holding layout preferences")]
    pub prefs_path: Option<PathBuf>,
}
