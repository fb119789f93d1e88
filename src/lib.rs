//! docmerger - merge PDFs, images and text files into one document
//!
//! This crate provides the core of the docmerger application: an ordered,
//! selectable file list with drag-to-reorder, the rules for which output
//! formats a selection can produce, and the merge engine that writes the
//! combined PDF, TXT or PNG.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod file_opener;
pub mod merge;
pub mod session;
pub mod tui;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use domain::format::OutputFormat;
pub use domain::reorder::{CommitPolicy, DragUpdate, ReorderController, RowGeometry};
pub use domain::{FileEntry, FileKind, Registry, RegistryEvent};
pub use error::{DocMergerError, MergeError, Result};
pub use file_opener::open_path;
pub use merge::{merge, MergeOutcome};
pub use session::{MergePlan, Session, StatusReport};
