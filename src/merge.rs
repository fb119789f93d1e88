//! Merge engine: turns an ordered list of input files into one output file.

pub mod pdf;
pub mod stack;
pub mod text;

use crate::domain::format::OutputFormat;
use crate::error::MergeError;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the directory, under the source directory, that receives outputs.
pub const RESULT_DIR_NAME: &str = "result";

pub fn result_dir(source_dir: &Path) -> PathBuf {
    source_dir.join(RESULT_DIR_NAME)
}

/// `<source>/result/<base_name><ext>` for the chosen format.
pub fn output_path(source_dir: &Path, base_name: &str, format: OutputFormat) -> PathBuf {
    result_dir(source_dir).join(format!("{}{}", base_name, format.extension()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The output file was written. `pages` is only known for PDF output.
    Written {
        path: PathBuf,
        inputs: usize,
        pages: Option<usize>,
    },
    /// The inputs yielded no pages, so no file was produced.
    NothingWritten,
}

impl MergeOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            MergeOutcome::Written { path, .. } => Some(path),
            MergeOutcome::NothingWritten => None,
        }
    }
}

/// Merges `inputs`, in order, into `output`.
///
/// The parent directory of `output` is created when missing. An existing
/// output is replaced without asking; confirmation belongs to the caller. The
/// output only appears once it is complete.
pub fn merge(
    inputs: &[PathBuf],
    format: OutputFormat,
    output: &Path,
) -> Result<MergeOutcome, MergeError> {
    if inputs.is_empty() {
        return Err(MergeError::NoFileSelected);
    }

    let target_dir = parent_dir(output);
    fs::create_dir_all(target_dir).map_err(|e| {
        MergeError::io(format!("Failed to create {}", target_dir.display()), e)
    })?;

    info!(
        format = %format,
        inputs = inputs.len(),
        output = %output.display(),
        "merge started"
    );

    let outcome = match format {
        OutputFormat::Pdf => pdf::merge(inputs, output, target_dir)?,
        OutputFormat::Txt => text::merge(inputs, output)?,
        OutputFormat::Png => stack::merge(inputs, output)?,
    };

    match &outcome {
        MergeOutcome::Written { path, pages, .. } => {
            info!(output = %path.display(), pages = ?pages, "merge finished");
        }
        MergeOutcome::NothingWritten => info!("merge produced no pages, nothing written"),
    }

    Ok(outcome)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Writes `output` through a staging file in the same directory that is
/// renamed over the target only after `write` succeeds.
pub(crate) fn write_atomically<F>(output: &Path, write: F) -> Result<(), MergeError>
where
    F: FnOnce(&mut File) -> Result<(), MergeError>,
{
    let mut staged = tempfile::Builder::new()
        .prefix(".docmerger-")
        .suffix(".partial")
        .tempfile_in(parent_dir(output))
        .map_err(|e| MergeError::io(format!("Failed to stage {}", output.display()), e))?;

    write(staged.as_file_mut())?;

    staged
        .persist(output)
        .map_err(|e| MergeError::io(format!("Failed to write {}", output.display()), e.error))?;
    Ok(())
}

/// Rejects an input that a format cannot consume.
pub(crate) fn unsupported_input(path: &Path, format: OutputFormat) -> MergeError {
    MergeError::conversion(path, format!("cannot be merged into {} output", format))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{Rgb, RgbImage};
    use printpdf::{Mm, PdfDocument};
    use std::fs::{self, File};
    use std::io::BufWriter;
    use std::path::{Path, PathBuf};

    pub fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
        let path = dir.join(name);
        let (doc, _page, _layer) = PdfDocument::new(name, Mm(210.0), Mm(297.0), "Layer 1");
        for i in 1..pages {
            doc.add_page(Mm(210.0), Mm(297.0), format!("Layer {}", i + 1));
        }
        doc.save(&mut BufWriter::new(File::create(&path).unwrap()))
            .unwrap();
        path
    }

    pub fn write_image(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb(color))
            .save(&path)
            .unwrap();
        path
    }

    pub fn write_text(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Names in `dir` that look like leftovers of a merge.
    pub fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|n| n.starts_with("temp_") || n.ends_with(".partial"))
            .collect()
    }
}
