//! One merge session: a source directory, its filtered file list, the chosen
//! output format and name, and the outcome of the last merge.
//!
//! Front ends drive everything through [`Session`]; it owns the registry and
//! keeps the format choice in step with the selection by listening to the
//! registry's change events.

use crate::domain::format::{eligible_formats, reconcile_choice, OutputFormat};
use crate::domain::reorder::{CommitPolicy, DragUpdate, ReorderController, RowGeometry};
use crate::domain::{
    list_file_names, normalize_extension, FileEntry, Registry, RegistryEvent,
    SUPPORTED_EXTENSIONS,
};
use crate::error::{DocMergerError, MergeError, Result};
use crate::file_opener;
use crate::merge::{self, MergeOutcome};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use tracing::{debug, warn};

/// What the status line shows after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    Success(PathBuf),
    NothingWritten,
    Cancelled(PathBuf),
    Failure(String),
    Notice(String),
}

impl StatusReport {
    pub fn is_error(&self) -> bool {
        matches!(self, StatusReport::Failure(_))
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusReport::Success(path) => write!(f, "✓ Success! Saved as: {}", path.display()),
            StatusReport::NothingWritten => f.write_str("Nothing written: the selection has no pages"),
            StatusReport::Cancelled(path) => write!(
                f,
                "Merge cancelled, '{}' was left untouched",
                path.file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_else(|| path.to_string_lossy())
            ),
            StatusReport::Failure(message) => write!(f, "Error: {}", message),
            StatusReport::Notice(message) => f.write_str(message),
        }
    }
}

/// Everything a merge needs, checked and resolved but not yet executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub inputs: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: PathBuf,
    /// The output exists and replacing it needs the user's consent.
    pub requires_confirmation: bool,
}

pub struct Session {
    source_dir: Option<PathBuf>,
    filters: BTreeSet<String>,
    registry: Registry,
    events: Receiver<RegistryEvent>,
    eligible: Vec<OutputFormat>,
    format: OutputFormat,
    output_name: String,
    reorder: ReorderController,
    status: Option<StatusReport>,
}

impl Session {
    /// Creates a session with the given extension filters. Extensions outside
    /// the supported set are ignored.
    pub fn new<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Registry::new();
        let events = registry.subscribe();
        Self {
            source_dir: None,
            filters: supported_filters(filters),
            registry,
            events,
            eligible: Vec::new(),
            format: OutputFormat::default(),
            output_name: String::new(),
            reorder: ReorderController::default(),
            status: None,
        }
    }

    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.reorder = ReorderController::new(policy);
        self
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    pub fn filters(&self) -> &BTreeSet<String> {
        &self.filters
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn entries(&self) -> &[FileEntry] {
        self.registry.entries()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats the current selection can produce. Empty when nothing is
    /// selected, in which case no format choice should be offered.
    pub fn eligible_formats(&self) -> &[OutputFormat] {
        &self.eligible
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn status(&self) -> Option<&StatusReport> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: StatusReport) {
        self.status = Some(status);
    }

    pub fn reorder(&self) -> &ReorderController {
        &self.reorder
    }

    /// Applies pending registry events to the format choice.
    fn sync(&mut self) {
        let mut selection_touched = false;
        for event in self.events.try_iter() {
            selection_touched |= matches!(
                event,
                RegistryEvent::Reloaded | RegistryEvent::SelectionChanged
            );
        }
        if selection_touched {
            self.eligible = eligible_formats(&self.registry.selected_extensions());
            let reconciled = reconcile_choice(self.format, &self.eligible);
            if reconciled != self.format {
                debug!(from = %self.format, to = %reconciled, "format reset");
                self.format = reconciled;
            }
        }
    }

    /// Switches to `dir` and lists it afresh. Selections do not carry over.
    pub fn open_directory(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.reorder.abort();
        let names = self.list(&dir);
        self.registry.load(names, &self.filters, None);
        self.source_dir = Some(dir);
        self.sync();
    }

    /// Re-lists the current directory, keeping the selection of names that
    /// are still visible.
    pub fn refresh(&mut self) {
        let Some(dir) = self.source_dir.clone() else {
            return;
        };
        let names = self.list(&dir);
        self.registry.reload_preserving(names, &self.filters);
        self.sync();
    }

    fn list(&mut self, dir: &Path) -> Vec<String> {
        match list_file_names(dir) {
            Ok(names) => names,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read directory");
                self.status = Some(StatusReport::Failure(format!(
                    "Cannot read {}: {}",
                    dir.display(),
                    e
                )));
                Vec::new()
            }
        }
    }

    pub fn set_filters<I, S>(&mut self, filters: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filters = supported_filters(filters);
        self.refresh();
    }

    /// Turns one extension filter on or off and returns whether it is now on.
    /// Unsupported extensions are left off.
    pub fn toggle_filter(&mut self, extension: &str) -> bool {
        let extension = normalize_extension(extension);
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return false;
        }
        let active = if self.filters.remove(&extension) {
            false
        } else {
            self.filters.insert(extension);
            true
        };
        self.refresh();
        active
    }

    pub fn toggle(&mut self, name: &str) -> Result<()> {
        if !self.registry.toggle_selection(name) {
            return Err(DocMergerError::FileNotListed(name.to_string()));
        }
        self.sync();
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.registry.select_all();
        self.sync();
    }

    pub fn select_none(&mut self) {
        self.registry.select_none();
        self.sync();
    }

    /// Moves `name` to `to_index`. Returns the new index, or `None` when the
    /// entry was already there.
    pub fn move_entry(&mut self, name: &str, to_index: usize) -> Result<Option<usize>> {
        if !self.registry.contains(name) {
            return Err(DocMergerError::FileNotListed(name.to_string()));
        }
        let moved = self.registry.move_entry(name, to_index);
        self.sync();
        Ok(moved)
    }

    /// Selects exactly `names`, placing them first in the given order.
    pub fn apply_selection<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if let Some(missing) = names
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !self.registry.contains(name))
        {
            return Err(DocMergerError::FileNotListed(missing.to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = names
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !seen.insert(*name))
        {
            return Err(DocMergerError::DuplicateFile(duplicate.to_string()));
        }

        self.registry.select_none();
        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();
            self.registry.set_selected(name, true);
            self.registry.move_entry(name, index);
        }
        self.sync();
        Ok(())
    }

    pub fn begin_drag(&mut self, handle: Option<&str>, pointer_y: f64) -> bool {
        self.reorder.start(&self.registry, handle, pointer_y)
    }

    pub fn drag_to(&mut self, pointer_y: f64, other_rows: &[RowGeometry]) -> DragUpdate {
        let update = self.reorder.update(&mut self.registry, pointer_y, other_rows);
        self.sync();
        update
    }

    pub fn end_drag(&mut self) -> DragUpdate {
        let update = self.reorder.end(&mut self.registry);
        self.sync();
        update
    }

    pub fn set_format(&mut self, format: OutputFormat) -> Result<()> {
        if !self.eligible.contains(&format) {
            return Err(DocMergerError::FormatUnavailable(format));
        }
        self.format = format;
        Ok(())
    }

    /// Advances to the next eligible format, wrapping around.
    pub fn cycle_format(&mut self) -> OutputFormat {
        if let Some(pos) = self.eligible.iter().position(|&f| f == self.format) {
            self.format = self.eligible[(pos + 1) % self.eligible.len()];
        }
        self.format
    }

    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.output_name = name.into();
    }

    /// Base name used for the output file: the entered name, trimmed, without
    /// any directory part.
    fn output_base_name(&self) -> Option<String> {
        let trimmed = self.output_name.trim();
        Path::new(trimmed)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        let dir = self.source_dir.as_deref()?;
        let name = self.output_base_name()?;
        Some(merge::output_path(dir, &name, self.format))
    }

    /// Checks every precondition without touching the filesystem.
    pub fn prepare_merge(&self) -> std::result::Result<MergePlan, MergeError> {
        let dir = self
            .source_dir
            .as_deref()
            .ok_or(MergeError::NoDirectorySelected)?;
        let name = self.output_base_name().ok_or(MergeError::NoOutputName)?;
        if !self.registry.has_selection() {
            return Err(MergeError::NoFileSelected);
        }

        let output = merge::output_path(dir, &name, self.format);
        Ok(MergePlan {
            inputs: self.registry.selected_paths(dir),
            format: self.format,
            requires_confirmation: output.exists(),
            output,
        })
    }

    /// Runs a prepared plan and records the outcome in the status.
    pub fn run_merge(&mut self, plan: &MergePlan) -> std::result::Result<MergeOutcome, MergeError> {
        let result = merge::merge(&plan.inputs, plan.format, &plan.output);
        self.status = Some(match &result {
            Ok(MergeOutcome::Written { path, .. }) => StatusReport::Success(path.clone()),
            Ok(MergeOutcome::NothingWritten) => StatusReport::NothingWritten,
            Err(e) => StatusReport::Failure(e.to_string()),
        });
        result
    }

    /// Records that the user refused to overwrite the plan's output.
    pub fn decline(&mut self, plan: &MergePlan) -> MergeError {
        self.status = Some(StatusReport::Cancelled(plan.output.clone()));
        MergeError::OverwriteDeclined(plan.output.clone())
    }

    /// Prepares and runs a merge in one go. `confirm_overwrite` is asked only
    /// when the output already exists; refusing aborts with no side effects.
    pub fn merge_selected<F>(
        &mut self,
        confirm_overwrite: F,
    ) -> std::result::Result<MergeOutcome, MergeError>
    where
        F: FnOnce(&Path) -> bool,
    {
        let plan = match self.prepare_merge() {
            Ok(plan) => plan,
            Err(e) => {
                self.status = Some(StatusReport::Failure(e.to_string()));
                return Err(e);
            }
        };
        if plan.requires_confirmation && !confirm_overwrite(&plan.output) {
            return Err(self.decline(&plan));
        }
        self.run_merge(&plan)
    }

    /// The result directory, if a merge has created it.
    pub fn result_directory(&self) -> Result<PathBuf> {
        let dir = self
            .source_dir
            .as_deref()
            .ok_or(MergeError::NoDirectorySelected)?;
        let result = merge::result_dir(dir);
        if result.is_dir() {
            Ok(result)
        } else {
            Err(DocMergerError::NoResultDirectory(result))
        }
    }

    /// Opens the result directory in the platform file browser.
    pub fn open_result_directory(&mut self) -> Result<PathBuf> {
        let opened = self
            .result_directory()
            .and_then(|dir| file_opener::open_path(&dir).map(|()| dir));
        match &opened {
            Err(DocMergerError::NoResultDirectory(_)) => {
                self.status = Some(StatusReport::Notice(
                    "Result directory does not exist yet. Merge some files first!".to_string(),
                ));
            }
            Err(e) => self.status = Some(StatusReport::Failure(e.to_string())),
            Ok(_) => {}
        }
        opened
    }
}

fn supported_filters<I, S>(filters: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    filters
        .into_iter()
        .map(|f| normalize_extension(f.as_ref()))
        .filter(|f| SUPPORTED_EXTENSIONS.contains(&f.as_str()))
        .collect()
}
