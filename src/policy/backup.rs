//! Backup root selection with mutual exclusion.
//!
//! `C:` and `Desktop` overlap (the desktop lives on the system drive), so
//! selecting one evicts the other. The most recent selection wins.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// One selectable backup root.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BackupRoot {
    Desktop,
    #[serde(rename = "C:")]
    C,
    #[serde(rename = "D:")]
    D,
    #[serde(rename = "E:")]
    E,
    #[serde(rename = "F:")]
    F,
    #[serde(rename = "G:")]
    G,
}

impl BackupRoot {
    /// Every root, in presentation order.
    pub const ALL: [BackupRoot; 6] = [
        BackupRoot::Desktop,
        BackupRoot::C,
        BackupRoot::D,
        BackupRoot::E,
        BackupRoot::F,
        BackupRoot::G,
    ];

    /// Stable identifier used in payloads and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            BackupRoot::Desktop => "Desktop",
            BackupRoot::C => "C:",
            BackupRoot::D => "D:",
            BackupRoot::E => "E:",
            BackupRoot::F => "F:",
            BackupRoot::G => "G:",
        }
    }

    /// Label shown to the end user.
    pub fn label(self) -> &'static str {
        match self {
            BackupRoot::Desktop => "桌面",
            BackupRoot::C => "C盘",
            BackupRoot::D => "D盘",
            BackupRoot::E => "E盘",
            BackupRoot::F => "F盘",
            BackupRoot::G => "G盘",
        }
    }

    /// Source path handed to the sync client's backup task.
    ///
    /// The desktop path uses the current-user placeholder.
    pub fn backup_path(self) -> &'static str {
        match self {
            BackupRoot::Desktop => "C:\\Users\\$\\Desktop",
            BackupRoot::C => "C:\\",
            BackupRoot::D => "D:\\",
            BackupRoot::E => "E:\\",
            BackupRoot::F => "F:\\",
            BackupRoot::G => "G:\\",
        }
    }

    /// The root that cannot be selected together with this one.
    pub fn conflicts_with(self) -> Option<BackupRoot> {
        match self {
            BackupRoot::Desktop => Some(BackupRoot::C),
            BackupRoot::C => Some(BackupRoot::Desktop),
            _ => None,
        }
    }
}

impl fmt::Display for BackupRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BackupRoot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches(['\\', '/']).to_ascii_lowercase();
        match normalized.as_str() {
            "desktop" => Ok(BackupRoot::Desktop),
            "c" | "c:" => Ok(BackupRoot::C),
            "d" | "d:" => Ok(BackupRoot::D),
            "e" | "e:" => Ok(BackupRoot::E),
            "f" | "f:" => Ok(BackupRoot::F),
            "g" | "g:" => Ok(BackupRoot::G),
            _ => Err(format!(
                "unknown backup root `{}` (expected Desktop, C:, D:, E:, F: or G:)",
                s.trim()
            )),
        }
    }
}

/// A set of selected backup roots.
///
/// Deserializing selects each listed root in order, so a submitted list
/// holding both `C:` and `Desktop` keeps only the later one.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BackupRoot>", into = "Vec<BackupRoot>")]
pub struct BackupSelection(BTreeSet<BackupRoot>);

impl BackupSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection by toggling each root in order.
    pub fn from_toggles(roots: impl IntoIterator<Item = BackupRoot>) -> Self {
        roots
            .into_iter()
            .fold(Self::new(), |selection, root| selection.toggle(root))
    }

    /// Build a selection by selecting each root in order.
    ///
    /// Unlike [`BackupSelection::from_toggles`], repeating a root keeps it.
    pub fn from_selected(roots: impl IntoIterator<Item = BackupRoot>) -> Self {
        roots
            .into_iter()
            .fold(Self::new(), |selection, root| selection.select(root))
    }

    /// Add `item`, evicting its conflicting root. Already selected roots stay.
    pub fn select(&self, item: BackupRoot) -> Self {
        if self.contains(item) {
            self.clone()
        } else {
            self.toggle(item)
        }
    }

    /// Add `item` if absent, remove it if present.
    ///
    /// Adding `C:` removes `Desktop` and adding `Desktop` removes `C:`.
    pub fn toggle(&self, item: BackupRoot) -> Self {
        let mut next = self.0.clone();
        if !next.remove(&item) {
            next.insert(item);
            if let Some(conflict) = item.conflicts_with() {
                next.remove(&conflict);
            }
        }
        Self(next)
    }

    pub fn contains(&self, root: BackupRoot) -> bool {
        self.0.contains(&root)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = BackupRoot> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<BackupRoot>> for BackupSelection {
    fn from(roots: Vec<BackupRoot>) -> Self {
        Self::from_selected(roots)
    }
}

impl From<BackupSelection> for Vec<BackupRoot> {
    fn from(selection: BackupSelection) -> Self {
        selection.0.into_iter().collect()
    }
}

/// Toggle `item` in `current`. See [`BackupSelection::toggle`].
pub fn toggle(current: &BackupSelection, item: BackupRoot) -> BackupSelection {
    current.toggle(item)
}

/// Whether `selection` may be submitted.
///
/// With backup selection disabled any selection is accepted; otherwise at
/// least one root must be chosen.
pub fn is_valid(selection: &BackupSelection, enabled: bool) -> bool {
    !enabled || !selection.is_empty()
}
