use chrono::{DateTime, Duration, Utc};
use color_eyre::eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub const TOP_PERCENT_KEY: &str = "topPercent";
pub const LEFT_PERCENT_KEY: &str = "leftPercent";
pub const PREF_EXPIRY_DAYS: i64 = 30;

/// Dividers stay at least this far from either edge
pub const MIN_SPLIT: f64 = 0.02;
pub const MAX_SPLIT: f64 = 0.98;
const HORIZ_DIVIDER: f64 = 0.004;
const VERT_DIVIDER: f64 = 0.003;
/// Height of a pane expanded by double-click, in percent
pub const EXPANDED_PERCENT: f64 = 99.6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct StoredPref {
    value: String,
    expires: Option<DateTime<Utc>>,
}

/// Small expiring key/value store for layout preferences, kept as JSON.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, StoredPref>,
}

impl PreferenceStore {
    /// Store that never touches the disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ggnav")
            .join("prefs.json")
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let pref = self.entries.get(key)?;
        match pref.expires {
            Some(expires) if expires <= Utc::now() => None,
            _ => Some(pref.value.clone()),
        }
    }

    /// Set `key`, expiring after `days` (kept indefinitely when `None`)
    pub fn set(&mut self, key: &str, value: &str, days: Option<i64>) -> Result<()> {
        let expires = days.map(|d| Utc::now() + Duration::days(d));
        self.entries.insert(
            key.to_string(),
            StoredPref {
                value: value.to_string(),
                expires,
            },
        );
        self.save()
    }

    pub fn erase(&mut self, key: &str) -> Result<()> {
        self.set(key, "", Some(-1))
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let live: BTreeMap<_, _> = self
            .entries
            .iter()
            .filter(|(_, p)| p.expires.is_none_or(|e| e > Utc::now()))
            .collect();
        fs::write(path, serde_json::to_string_pretty(&live)?)?;
        Ok(())
    }
}

pub fn clamp_split(fraction: f64) -> f64 {
    fraction.clamp(MIN_SPLIT, MAX_SPLIT)
}

/// Sizes of two panes either side of a divider, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneSplit {
    pub first: f64,
    pub second: f64,
}

impl PaneSplit {
    fn horizontal(top: f64) -> Self {
        Self {
            first: 100.0 * top,
            second: 100.0 * (1.0 - top - HORIZ_DIVIDER),
        }
    }

    fn vertical(left: f64) -> Self {
        Self {
            first: 100.0 * left,
            second: 100.0 * (1.0 - left - VERT_DIVIDER),
        }
    }
}

/// Split between graph/detail (horizontal divider) and tree/right side
/// (vertical divider), plus the double-click expansion toggles.
#[derive(Debug, Clone)]
pub struct Layout {
    heights: PaneSplit,
    widths: PaneSplit,
    top_expanded: bool,
    bottom_expanded: bool,
    saved_heights: Option<PaneSplit>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            heights: PaneSplit::horizontal(0.5),
            widths: PaneSplit::vertical(0.2),
            top_expanded: false,
            bottom_expanded: false,
            saved_heights: None,
        }
    }
}

impl Layout {
    /// Layout with splits restored from stored preferences
    pub fn restore(store: &PreferenceStore) -> Self {
        let mut layout = Self::default();
        if let Some(top) = read_fraction(store, TOP_PERCENT_KEY) {
            layout.heights = PaneSplit::horizontal(top);
        }
        if let Some(left) = read_fraction(store, LEFT_PERCENT_KEY) {
            layout.widths = PaneSplit::vertical(left);
        }
        layout
    }

    /// Divider dropped at `offset_top` px inside a wrapper below the toolbar
    pub fn resize_horizontal(
        &mut self,
        store: &mut PreferenceStore,
        offset_top: f64,
        toolbar_height: f64,
        wrapper_height: f64,
    ) -> Result<PaneSplit> {
        self.top_expanded = false;
        self.bottom_expanded = false;
        let top = clamp_split((offset_top - toolbar_height) / wrapper_height);
        store.set(TOP_PERCENT_KEY, &top.to_string(), Some(PREF_EXPIRY_DAYS))?;
        self.heights = PaneSplit::horizontal(top);
        Ok(self.heights)
    }

    pub fn resize_vertical(
        &mut self,
        store: &mut PreferenceStore,
        offset_left: f64,
        document_width: f64,
    ) -> Result<PaneSplit> {
        let left = clamp_split(offset_left / document_width);
        store.set(LEFT_PERCENT_KEY, &left.to_string(), Some(PREF_EXPIRY_DAYS))?;
        self.widths = PaneSplit::vertical(left);
        Ok(self.widths)
    }

    /// Set the horizontal split directly from a fraction
    pub fn set_top_fraction(&mut self, store: &mut PreferenceStore, top: f64) -> Result<PaneSplit> {
        self.resize_horizontal(store, top, 0.0, 1.0)
    }

    pub fn set_left_fraction(&mut self, store: &mut PreferenceStore, left: f64) -> Result<PaneSplit> {
        self.resize_vertical(store, left, 1.0)
    }

    pub fn toggle_top_expansion(&mut self) -> PaneSplit {
        if !self.top_expanded {
            if !self.bottom_expanded {
                self.saved_heights = Some(self.heights);
            }
            self.top_expanded = true;
            self.bottom_expanded = false;
            self.heights = PaneSplit {
                first: EXPANDED_PERCENT,
                second: 0.0,
            };
        } else {
            self.top_expanded = false;
            self.restore_heights();
        }
        self.heights
    }

    pub fn toggle_bottom_expansion(&mut self) -> PaneSplit {
        if !self.bottom_expanded {
            if !self.top_expanded {
                self.saved_heights = Some(self.heights);
            }
            self.bottom_expanded = true;
            self.top_expanded = false;
            self.heights = PaneSplit {
                first: 0.0,
                second: EXPANDED_PERCENT,
            };
        } else {
            self.bottom_expanded = false;
            self.restore_heights();
        }
        self.heights
    }

    fn restore_heights(&mut self) {
        if let Some(saved) = self.saved_heights {
            self.heights = saved;
        }
    }

    pub fn heights(&self) -> PaneSplit {
        self.heights
    }

    pub fn widths(&self) -> PaneSplit {
        self.widths
    }

    pub fn is_top_expanded(&self) -> bool {
        self.top_expanded
    }

    pub fn is_bottom_expanded(&self) -> bool {
        self.bottom_expanded
    }
}

fn read_fraction(store: &PreferenceStore, key: &str) -> Option<f64> {
    let raw = store.get(key)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(clamp_split(value)),
        _ => {
            debug!("Ignoring unreadable preference {key}={raw:?}");
            None
        }
    }
}
