pub mod format;
pub mod reorder;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

/// Extensions the filter can show, in the order the filter bar lists them.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = [".pdf", ".txt", ".png", ".jpg", ".jpeg"];

/// Filter active on first launch.
pub const DEFAULT_FILTER: [&str; 1] = [".pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Text,
    Image,
    Other,
}

impl FileKind {
    /// Classifies a normalized extension (lowercase, leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".pdf" => FileKind::Pdf,
            ".txt" => FileKind::Text,
            ".png" | ".jpg" | ".jpeg" => FileKind::Image,
            _ => FileKind::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Self::from_extension(&extension_of(name))
    }
}

/// Returns the lowercase extension of a file name including its leading dot,
/// or an empty string when there is none.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Normalizes user input such as `PDF` or `.Jpg` to `.pdf` / `.jpg`.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub extension: String,
    pub selected: bool,
}

impl FileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let extension = extension_of(&name);
        Self {
            name,
            extension,
            selected: false,
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_extension(&self.extension)
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.name)
    }
}

/// Lists the plain files directly inside `dir`, sorted by name.
///
/// Subdirectories (including a previous `result` directory) and names that are
/// not valid UTF-8 are skipped. Entries that cannot be inspected are skipped
/// rather than failing the whole listing.
pub fn list_file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}

/// Change notifications emitted by [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The sequence was rebuilt from a directory snapshot.
    Reloaded,
    SelectionChanged,
    OrderChanged,
}

/// The ordered selection sequence: every visible file in merge order, each with
/// its own selection flag.
///
/// Order and selection are independent. Names are unique. Observers obtained
/// through [`Registry::subscribe`] receive every change event.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<FileEntry>,
    subscribers: Vec<Sender<RegistryEvent>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<RegistryEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: RegistryEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Rebuilds the sequence from a directory snapshot.
    ///
    /// Only names whose extension is in `filter` are kept, sorted by name. Each
    /// entry takes its selection flag from `preserve` when present there.
    pub fn load<I, S>(
        &mut self,
        names: I,
        filter: &BTreeSet<String>,
        preserve: Option<&HashMap<String, bool>>,
    ) -> &[FileEntry]
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = names.into_iter().map(Into::into).collect();

        self.entries = unique
            .into_iter()
            .map(FileEntry::new)
            .filter(|entry| filter.contains(&entry.extension))
            .map(|mut entry| {
                entry.selected = preserve
                    .and_then(|p| p.get(&entry.name).copied())
                    .unwrap_or(false);
                entry
            })
            .collect();

        debug!(
            entries = self.entries.len(),
            selected = self.selected_count(),
            "registry reloaded"
        );
        self.emit(RegistryEvent::Reloaded);
        &self.entries
    }

    /// Reloads with a new filter while keeping the selection of names that
    /// stay visible.
    pub fn reload_preserving<I, S>(&mut self, names: I, filter: &BTreeSet<String>) -> &[FileEntry]
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let previous = self.selection_map();
        self.load(names, filter, Some(&previous))
    }

    pub fn selection_map(&self) -> HashMap<String, bool> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.selected))
            .collect()
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Flips the selection flag of `name`. Returns false if the name is unknown.
    pub fn toggle_selection(&mut self, name: &str) -> bool {
        let Some(index) = self.index_of(name) else {
            return false;
        };
        let entry = &mut self.entries[index];
        entry.selected = !entry.selected;
        self.emit(RegistryEvent::SelectionChanged);
        true
    }

    /// Sets the selection flag of `name`. Returns false if the name is unknown.
    pub fn set_selected(&mut self, name: &str, selected: bool) -> bool {
        let Some(index) = self.index_of(name) else {
            return false;
        };
        if self.entries[index].selected != selected {
            self.entries[index].selected = selected;
            self.emit(RegistryEvent::SelectionChanged);
        }
        true
    }

    pub fn select_all(&mut self) {
        self.set_all(true);
    }

    pub fn select_none(&mut self) {
        self.set_all(false);
    }

    fn set_all(&mut self, selected: bool) {
        let mut changed = false;
        for entry in &mut self.entries {
            changed |= entry.selected != selected;
            entry.selected = selected;
        }
        if changed {
            self.emit(RegistryEvent::SelectionChanged);
        }
    }

    /// Moves `name` so that it ends up at `to_index`, clamped to the sequence.
    ///
    /// Returns the new index when the order changed, `None` for an unknown name
    /// or when the entry is already there. This is the only mutation point for
    /// ordering.
    pub fn move_entry(&mut self, name: &str, to_index: usize) -> Option<usize> {
        let from = self.index_of(name)?;
        let to = to_index.min(self.entries.len() - 1);
        if from == to {
            return None;
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        debug!(name, from, to, "entry moved");
        self.emit(RegistryEvent::OrderChanged);
        Some(to)
    }

    pub fn selected(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter(|e| e.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    pub fn has_selection(&self) -> bool {
        self.entries.iter().any(|e| e.selected)
    }

    /// Distinct extensions among the selected entries.
    pub fn selected_extensions(&self) -> BTreeSet<String> {
        self.selected().map(|e| e.extension.clone()).collect()
    }

    /// Absolute paths of the selected entries, in merge order.
    pub fn selected_paths(&self, dir: &Path) -> Vec<PathBuf> {
        self.selected().map(|e| e.path_in(dir)).collect()
    }
}
