//! Opens paths with the platform's default handler.

use crate::error::{DocMergerError, Result};
use std::path::Path;
use tracing::info;

/// Opens `path` (a file or a directory) in the default application without
/// waiting for it to exit.
pub fn open_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DocMergerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Path does not exist: {}", path.display()),
        )));
    }

    info!(path = %path.display(), "opening with system handler");
    open::that_detached(path).map_err(DocMergerError::Io)
}
