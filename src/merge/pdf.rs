//! PDF output: page-for-page concatenation of PDFs, images and text files.
//!
//! Images and text are first rendered to a standalone PDF in a temporary file
//! next to the output, then appended like any other PDF. Temporaries are
//! removed whether the merge succeeds or not.

use super::{unsupported_input, write_atomically, MergeOutcome};
use crate::domain::format::OutputFormat;
use crate::domain::FileKind;
use crate::error::MergeError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const PDF_VERSION: &str = "1.5";

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

// Text pages: A4 in points, Courier 12 on a 10 mm grid.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 28;
const FONT_SIZE: i64 = 12;
const LEADING: i64 = 28;
/// Courier advances 0.6 em, so 7.2 pt per glyph across 539 pt of text width.
pub const COLUMNS: usize = 74;
/// Baselines from 802 down to the 15 mm bottom margin.
pub const LINES_PER_PAGE: usize = 27;

/// Collects pages from several documents into one.
pub struct PdfAccumulator {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    sources: usize,
}

impl Default for PdfAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfAccumulator {
    pub fn new() -> Self {
        let mut document = Document::with_version(PDF_VERSION);
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
            sources: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Loads the PDF at `path` and appends all of its pages.
    pub fn append_file(&mut self, path: &Path) -> Result<usize, MergeError> {
        let source = Document::load(path).map_err(|e| MergeError::conversion(path, e))?;
        Ok(self.append_document(source))
    }

    /// Appends every page of `source`, in page order, and returns how many.
    pub fn append_document(&mut self, mut source: Document) -> usize {
        source.renumber_objects_with(self.document.max_id + 1);

        let pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &pages {
            let inherited = inherited_attributes(&source, page_id);
            if let Ok(page) = source
                .get_object_mut(page_id)
                .and_then(|object| object.as_dict_mut())
            {
                for (key, value) in inherited {
                    if !page.has(&key) {
                        page.set(key, value);
                    }
                }
                page.set("Parent", self.pages_id);
            }
        }

        self.document.objects.extend(source.objects);
        self.document.max_id = self
            .document
            .objects
            .keys()
            .map(|&(id, _)| id)
            .max()
            .unwrap_or(self.document.max_id);
        self.kids.extend(&pages);
        self.sources += 1;
        pages.len()
    }

    /// Writes the accumulated pages to `output`. Nothing is written when no
    /// page was appended.
    pub fn finish(mut self, output: &Path) -> Result<MergeOutcome, MergeError> {
        if self.kids.is_empty() {
            return Ok(MergeOutcome::NothingWritten);
        }

        let page_count = self.kids.len();
        build_page_tree(&mut self.document, self.pages_id, &self.kids, Dictionary::new());
        self.document.prune_objects();
        self.document.compress();

        let document = &mut self.document;
        write_atomically(output, |file| save(document, file, output))?;

        Ok(MergeOutcome::Written {
            path: output.to_path_buf(),
            inputs: self.sources,
            pages: Some(page_count),
        })
    }
}

/// Looks up inheritable attributes on the ancestors of `page_id`, nearest
/// ancestor first.
fn inherited_attributes(document: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut parent = document.get_dictionary(page_id).ok().and_then(parent_of);

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node) = parent.and_then(|id| document.get_dictionary(id).ok()) else {
            break;
        };
        for key in INHERITABLE {
            if found.iter().any(|(k, _)| k.as_slice() == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
        parent = parent_of(node);
    }

    found
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

/// Installs the root `Pages` node and the catalog.
fn build_page_tree(
    document: &mut Document,
    pages_id: ObjectId,
    kids: &[ObjectId],
    mut pages: Dictionary,
) {
    pages.set("Type", "Pages");
    pages.set(
        "Kids",
        kids.iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>(),
    );
    pages.set("Count", kids.len() as i64);
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages));

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
}

fn save(document: &mut Document, file: &mut fs::File, path: &Path) -> Result<(), MergeError> {
    let mut writer = BufWriter::new(file);
    document
        .save_to(&mut writer)
        .map_err(|e| MergeError::write_failed(path, e))?;
    writer.flush().map_err(|e| MergeError::write_failed(path, e))
}

fn media_box(width: i64, height: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ])
}

/// Renders one image as a single page the size of the image, one point per
/// pixel, in DeviceRGB.
pub fn image_to_pdf(path: &Path) -> Result<Document, MergeError> {
    let rgb = image::open(path)
        .map_err(|e| MergeError::conversion(path, e))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    let (width, height) = (i64::from(width), i64::from(height));

    let mut document = Document::with_version(PDF_VERSION);
    let pages_id = document.new_object_id();

    let image_id = document.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = document.add_object(Stream::new(
        dictionary! {},
        content
            .encode()
            .map_err(|e| MergeError::conversion(path, e))?,
    ));

    let page_id = document.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box(width, height),
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });

    build_page_tree(&mut document, pages_id, &[page_id], Dictionary::new());
    Ok(document)
}

/// Renders a text file on A4 pages in Courier, wrapping long lines and
/// breaking pages automatically. An empty file still yields one blank page.
pub fn text_to_pdf(path: &Path) -> Result<Document, MergeError> {
    let bytes = fs::read(path).map_err(|e| MergeError::conversion(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let lines = wrap_text(&text, COLUMNS);

    let mut document = Document::with_version(PDF_VERSION);
    let pages_id = document.new_object_id();

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for chunk in lines.chunks(LINES_PER_PAGE) {
        let content = text_page_content(chunk)
            .encode()
            .map_err(|e| MergeError::conversion(path, e))?;
        let content_id = document.add_object(Stream::new(dictionary! {}, content));
        kids.push(document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    // Page size and font live on the tree node and are inherited by each page.
    build_page_tree(
        &mut document,
        pages_id,
        &kids,
        dictionary! {
            "MediaBox" => media_box(PAGE_WIDTH, PAGE_HEIGHT),
            "Resources" => resources_id,
        },
    );
    Ok(document)
}

fn text_page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new(
            "Td",
            vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()],
        ),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_line(line))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Maps a line to single-byte WinAnsi text. Latin-1 characters map to
/// themselves, controls become spaces, anything else becomes `?`.
pub fn encode_line(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| {
            if c.is_control() {
                b' '
            } else {
                u8::try_from(u32::from(c)).unwrap_or(b'?')
            }
        })
        .collect()
}

/// Splits `text` into display lines of at most `columns` characters.
///
/// Breaks happen at spaces where possible; a word longer than a whole line is
/// cut. Tabs expand to four spaces and runs of spaces are kept.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw).replace('\t', "    ");
        wrap_line(&raw, columns.max(1), &mut lines);
    }
    lines
}

fn wrap_line(line: &str, columns: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut width = 0usize;
    let mut fresh = true;

    for word in line.split(' ') {
        let mut chars: Vec<char> = word.chars().collect();

        if !fresh && width + 1 + chars.len() > columns {
            out.push(std::mem::take(&mut current));
            width = 0;
            fresh = true;
        }
        while chars.len() > columns {
            out.push(chars.drain(..columns).collect());
        }

        if !fresh {
            current.push(' ');
            width += 1;
        }
        width += chars.len();
        current.extend(chars);
        fresh = false;
    }

    out.push(current);
}

/// Saves `document` into a fresh `temp_*.pdf` file in `dir`.
fn stage_temporary(
    document: &mut Document,
    dir: &Path,
    input: &Path,
) -> Result<NamedTempFile, MergeError> {
    let mut temp = tempfile::Builder::new()
        .prefix("temp_")
        .suffix(".pdf")
        .tempfile_in(dir)
        .map_err(|e| {
            MergeError::io(
                format!("Failed to create temporary PDF for {}", input.display()),
                e,
            )
        })?;
    let path = temp.path().to_path_buf();
    save(document, temp.as_file_mut(), &path)?;
    Ok(temp)
}

fn remove_temporaries(temporaries: Vec<NamedTempFile>) {
    for temp in temporaries {
        let path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            warn!(path = %path.display(), error = %e, "failed to remove temporary PDF");
        }
    }
}

fn append_input(
    accumulator: &mut PdfAccumulator,
    temporaries: &mut Vec<NamedTempFile>,
    input: &Path,
    scratch_dir: &Path,
) -> Result<usize, MergeError> {
    let mut rendered = match FileKind::from_path(input) {
        FileKind::Pdf => return accumulator.append_file(input),
        FileKind::Image => image_to_pdf(input)?,
        FileKind::Text => text_to_pdf(input)?,
        FileKind::Other => return Err(unsupported_input(input, OutputFormat::Pdf)),
    };

    let temp = stage_temporary(&mut rendered, scratch_dir, input)?;
    let loaded = Document::load(temp.path());
    temporaries.push(temp);
    let document = loaded.map_err(|e| MergeError::conversion(input, e))?;
    Ok(accumulator.append_document(document))
}

/// Merges `inputs` into a single PDF at `output`, using `scratch_dir` for
/// intermediate files.
pub fn merge(
    inputs: &[PathBuf],
    output: &Path,
    scratch_dir: &Path,
) -> Result<MergeOutcome, MergeError> {
    let mut accumulator = PdfAccumulator::new();
    let mut temporaries = Vec::new();

    let appended = inputs.iter().try_for_each(|input| {
        let pages = append_input(&mut accumulator, &mut temporaries, input, scratch_dir)?;
        debug!(input = %input.display(), pages, "appended");
        Ok::<(), MergeError>(())
    });
    let result = appended.and_then(|()| accumulator.finish(output));

    remove_temporaries(temporaries);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::fixtures::{leftovers, write_image, write_pdf, write_text};
    use tempfile::TempDir;

    fn page_count(path: &Path) -> usize {
        Document::load(path).unwrap().get_pages().len()
    }

    mod wrap_tests {
        use super::*;

        #[test]
        fn test_short_line_untouched() {
            assert_eq!(wrap_text("hello world", 20), vec!["hello world"]);
        }

        #[test]
        fn test_breaks_at_spaces() {
            assert_eq!(
                wrap_text("hello brave new world", 11),
                vec!["hello brave", "new world"]
            );
        }

        #[test]
        fn test_long_word_is_cut() {
            assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        }

        #[test]
        fn test_word_of_exact_width_is_not_cut() {
            assert_eq!(wrap_text("abcd ef", 4), vec!["abcd", "ef"]);
        }

        #[test]
        fn test_keeps_indentation_and_blank_lines() {
            assert_eq!(
                wrap_text("a\n\n\tb\r\n", 20),
                vec!["a", "", "    b", ""]
            );
        }

        #[test]
        fn test_empty_text_is_one_blank_line() {
            assert_eq!(wrap_text("", 10), vec![""]);
        }

        #[test]
        fn test_encode_line() {
            assert_eq!(encode_line("café"), vec![b'c', b'a', b'f', 0xE9]);
            assert_eq!(encode_line("a→b"), b"a?b".to_vec());
            assert_eq!(encode_line("a\u{7}b"), b"a b".to_vec());
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_image_page_matches_image_size() {
            let temp_dir = TempDir::new().unwrap();
            let path = write_image(temp_dir.path(), "wide.png", 40, 10, [10, 20, 30]);

            let document = image_to_pdf(&path).unwrap();
            let pages = document.get_pages();
            assert_eq!(pages.len(), 1);

            let page = document.get_dictionary(pages[&1]).unwrap();
            let media_box: Vec<i64> = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .unwrap()
                .iter()
                .map(|o| o.as_i64().unwrap())
                .collect();
            assert_eq!(media_box, vec![0, 0, 40, 10]);
        }

        #[test]
        fn test_corrupt_image_is_conversion_error() {
            let temp_dir = TempDir::new().unwrap();
            let path = write_text(temp_dir.path(), "bad.jpg", "not a jpeg");
            let err = image_to_pdf(&path).unwrap_err();
            assert!(matches!(err, MergeError::Conversion { ref path, .. } if path.ends_with("bad.jpg")));
        }

        #[test]
        fn test_text_paginates() {
            let temp_dir = TempDir::new().unwrap();
            let body: String = (0..LINES_PER_PAGE + 1)
                .map(|i| format!("line {}\n", i))
                .collect();
            let path = write_text(temp_dir.path(), "long.txt", body.trim_end());

            let document = text_to_pdf(&path).unwrap();
            assert_eq!(document.get_pages().len(), 2);
        }

        #[test]
        fn test_empty_text_gives_one_page() {
            let temp_dir = TempDir::new().unwrap();
            let path = write_text(temp_dir.path(), "empty.txt", "");
            assert_eq!(text_to_pdf(&path).unwrap().get_pages().len(), 1);
        }
    }

    mod accumulator_tests {
        use super::*;

        #[test]
        fn test_no_pages_writes_nothing() {
            let temp_dir = TempDir::new().unwrap();
            let output = temp_dir.path().join("out.pdf");

            let outcome = PdfAccumulator::new().finish(&output).unwrap();

            assert_eq!(outcome, MergeOutcome::NothingWritten);
            assert!(!output.exists());
        }

        #[test]
        fn test_inherited_attributes_are_copied_to_pages() {
            let temp_dir = TempDir::new().unwrap();
            let path = write_text(temp_dir.path(), "note.txt", "inherit me");

            let mut accumulator = PdfAccumulator::new();
            accumulator.append_document(text_to_pdf(&path).unwrap());
            let output = temp_dir.path().join("out.pdf");
            accumulator.finish(&output).unwrap();

            let document = Document::load(&output).unwrap();
            let page_id = document.get_pages()[&1];
            let page = document.get_dictionary(page_id).unwrap();
            assert!(page.has(b"MediaBox"));
            assert!(page.has(b"Resources"));
        }

        #[test]
        fn test_counts_appended_pages() {
            let temp_dir = TempDir::new().unwrap();
            let a = write_pdf(temp_dir.path(), "a.pdf", 3);
            let b = write_pdf(temp_dir.path(), "b.pdf", 1);

            let mut accumulator = PdfAccumulator::new();
            assert_eq!(accumulator.append_file(&a).unwrap(), 3);
            assert_eq!(accumulator.append_file(&b).unwrap(), 1);
            assert_eq!(accumulator.page_count(), 4);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_mixed_inputs_page_count_and_cleanup() {
            let temp_dir = TempDir::new().unwrap();
            let src = temp_dir.path();
            let result_dir = src.join("result");
            fs::create_dir(&result_dir).unwrap();

            let inputs = vec![
                write_pdf(src, "a.pdf", 2),
                write_image(src, "b.jpg", 16, 12, [200, 10, 10]),
                write_text(src, "c.txt", "some notes"),
            ];
            let output = result_dir.join("merged.pdf");

            let outcome = merge(&inputs, &output, &result_dir).unwrap();

            assert_eq!(
                outcome,
                MergeOutcome::Written {
                    path: output.clone(),
                    inputs: 3,
                    pages: Some(4),
                }
            );
            assert_eq!(page_count(&output), 4);

            let remaining: Vec<_> = fs::read_dir(&result_dir).unwrap().collect();
            assert_eq!(remaining.len(), 1);
        }

        #[test]
        fn test_pages_follow_input_order() {
            let temp_dir = TempDir::new().unwrap();
            let src = temp_dir.path();
            let inputs = vec![
                write_image(src, "tall.png", 10, 30, [0, 0, 0]),
                write_image(src, "wide.png", 50, 20, [0, 0, 0]),
            ];
            let output = src.join("out.pdf");
            merge(&inputs, &output, src).unwrap();

            let document = Document::load(&output).unwrap();
            let widths: Vec<i64> = document
                .get_pages()
                .values()
                .map(|&id| {
                    let page = document.get_dictionary(id).unwrap();
                    let media_box = page.get(b"MediaBox").and_then(Object::as_array).unwrap();
                    media_box[2].as_i64().unwrap()
                })
                .collect();
            assert_eq!(widths, vec![10, 50]);
        }

        #[test]
        fn test_failure_cleans_temporaries_and_writes_nothing() {
            let temp_dir = TempDir::new().unwrap();
            let src = temp_dir.path();
            let inputs = vec![
                write_image(src, "ok.png", 4, 4, [1, 2, 3]),
                write_text(src, "note.txt", "text"),
                write_text(src, "broken.pdf", "%PDF-garbage"),
            ];
            let output = src.join("out.pdf");

            let err = merge(&inputs, &output, src).unwrap_err();

            assert!(matches!(err, MergeError::Conversion { ref path, .. } if path.ends_with("broken.pdf")));
            assert!(!output.exists());
            assert!(leftovers(src).is_empty());
        }

        #[test]
        fn test_unsupported_input_is_rejected() {
            let temp_dir = TempDir::new().unwrap();
            let input = write_text(temp_dir.path(), "notes.md", "# hi");
            let err = merge(&[input], &temp_dir.path().join("out.pdf"), temp_dir.path())
                .unwrap_err();
            assert!(matches!(err, MergeError::Conversion { .. }));
        }

        #[test]
        fn test_repeated_merges_have_same_structure() {
            let temp_dir = TempDir::new().unwrap();
            let src = temp_dir.path();
            let inputs = vec![
                write_pdf(src, "a.pdf", 2),
                write_text(src, "b.txt", "body"),
            ];
            let one = src.join("one.pdf");
            let two = src.join("two.pdf");
            merge(&inputs, &one, src).unwrap();
            merge(&inputs, &two, src).unwrap();

            let one = Document::load(&one).unwrap();
            let two = Document::load(&two).unwrap();
            let contents = |doc: &Document| -> Vec<Vec<u8>> {
                doc.get_pages()
                    .values()
                    .map(|&id| doc.get_page_content(id).unwrap())
                    .collect()
            };
            assert_eq!(one.get_pages().len(), two.get_pages().len());
            assert_eq!(contents(&one), contents(&two));
        }
    }
}
