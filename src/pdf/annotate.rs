//! Stamping every page of a PDF with a one-line text label
//!
//! The label is rendered once per document into a Form XObject (the
//! overlay), drawn in Helvetica at a fixed offset from the lower-left corner
//! of a letter-sized layer. Each page then gets:
//!
//! ```text
//! q              <- prepended, shared by all pages
//! ...original content streams...
//! Q              <- appended, shared by all pages
//! q 1 0 0 1 x y cm /Annot Do Q
//! ```
//!
//! Bracketing the original content in `q`/`Q` resets any transformation the
//! page leaves behind, so the overlay always lands at the same spot on top of
//! the original content. `x y` is the lower-left corner of the page's
//! MediaBox.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tempfile::TempPath;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use super::page::{content_stream_ids, media_box_origin, page_resources, resolve_dictionary};

/// Label used when none is given
pub const DEFAULT_LABEL: &str = "File";

/// Offset of the text baseline from the page's lower-left corner, in points
pub const ANNOTATION_OFFSET: (f32, f32) = (10.0, 10.0);

/// Font size of the annotation, in points
pub const ANNOTATION_FONT_SIZE: f32 = 12.0;

/// Marker inserted between the source stem and the random part of the
/// temporary file name
pub const TEMP_MARKER: &str = "_temp";

/// Overlay layer size (US Letter: 612pt × 792pt)
const OVERLAY_BBOX: [i64; 4] = [0, 0, 612, 792];

/// Resource name of the overlay's font inside the overlay
const OVERLAY_FONT: &str = "F1";

/// Preferred resource name of the overlay on each page
const OVERLAY_XOBJECT: &str = "Annot";

/// Text stamped on the pages of `file_name`
pub fn annotation_text(label: &str, file_name: &str) -> String {
    format!("{}: {}", label, file_name)
}

/// A temporary, annotated copy of a source PDF
///
/// The file lives next to its source and is deleted when this value is
/// dropped, whether or not it was ever merged.
#[derive(Debug)]
pub struct AnnotatedPdf {
    source: PathBuf,
    path: PathBuf,
    page_count: usize,
    // Taken by `drop`
    temp: Option<TempPath>,
}

impl AnnotatedPdf {
    /// Path of the temporary annotated file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the PDF this copy was made from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the source PDF
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Number of pages in the annotated copy
    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

impl Drop for AnnotatedPdf {
    fn drop(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };

        match temp.close() {
            Ok(()) => info!("Deleted temporary file: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete temporary file {}: {}", self.path.display(), e),
        }
    }
}

/// Stamp every page of `source` with `"<label>: <file name>"`
///
/// The stamped copy is written to a new temporary file in the same
/// directory as `source`; the source itself is never modified.
///
/// # Example
///
/// ```no_run
/// use pdf_annotate_merge::pdf::annotate_pdf;
/// use std::path::Path;
///
/// let annotated = annotate_pdf(Path::new("slides/intro.pdf"), "File")
///     .expect("Failed to annotate");
/// println!("{} pages in {}", annotated.page_count(), annotated.path().display());
/// // The temporary file is removed here
/// drop(annotated);
/// ```
pub fn annotate_pdf(source: &Path, label: &str) -> Result<AnnotatedPdf> {
    if !source.exists() {
        return Err(Error::FileNotFound(source.to_path_buf()));
    }

    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::General(format!("Not a file path: {}", source.display())))?;

    let mut doc = Document::load(source)?;

    if doc.trailer.has(b"Encrypt") {
        return Err(Error::Encrypted(source.to_path_buf()));
    }

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if page_ids.is_empty() {
        return Err(Error::EmptyPdf(source.to_path_buf()));
    }

    let text = annotation_text(label, &file_name);
    let overlay_id = add_overlay(&mut doc, &text)?;

    // Shared by every page
    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    for &page_id in &page_ids {
        stamp_page(&mut doc, page_id, overlay_id, (save_id, restore_id))?;
    }

    let temp = write_sibling_temp(&mut doc, source)?;
    debug!(
        "Annotated {} ({} pages) into {}",
        source.display(),
        page_ids.len(),
        temp.display()
    );

    Ok(AnnotatedPdf {
        source: source.to_path_buf(),
        path: temp.to_path_buf(),
        page_count: page_ids.len(),
        temp: Some(temp),
    })
}

/// Add the overlay Form XObject and return its ID
fn add_overlay(doc: &mut Document, text: &str) -> Result<ObjectId> {
    // Helvetica is one of the 14 standard fonts, no embedding needed
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let (x, y) = ANNOTATION_OFFSET;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("g", vec![Object::Integer(0)]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![OVERLAY_FONT.into(), Object::Real(ANNOTATION_FONT_SIZE)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::String(encode_win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };

    let overlay = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => Object::Integer(1),
            "BBox" => OVERLAY_BBOX.iter().map(|&n| Object::Integer(n)).collect::<Vec<_>>(),
            "Resources" => dictionary! {
                "Font" => dictionary! { OVERLAY_FONT => font_id },
            },
        },
        content.encode()?,
    );

    Ok(doc.add_object(overlay))
}

/// Composite the overlay on top of one page
fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    overlay_id: ObjectId,
    (save_id, restore_id): (ObjectId, ObjectId),
) -> Result<()> {
    let original = content_stream_ids(doc, page_id)?;
    let (x0, y0) = media_box_origin(doc, page_id);

    // Copy the effective resources onto the page; shared or inherited
    // dictionaries stay untouched
    let mut resources = page_resources(doc, page_id);
    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|xobjects| resolve_dictionary(doc, xobjects))
        .unwrap_or_else(Dictionary::new);
    let overlay_name = unused_name(&xobjects, OVERLAY_XOBJECT);
    xobjects.set(overlay_name.clone(), Object::Reference(overlay_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let invoke = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Real(x0),
                    Object::Real(y0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(overlay_name)]),
            Operation::new("Q", vec![]),
        ],
    };
    let invoke_id = doc.add_object(Stream::new(Dictionary::new(), invoke.encode()?));

    let mut contents = Vec::with_capacity(original.len() + 3);
    if !original.is_empty() {
        contents.push(save_id);
        contents.extend(original);
        contents.push(restore_id);
    }
    contents.push(invoke_id);

    let page_dict = doc.get_dictionary_mut(page_id)?;
    page_dict.set("Resources", Object::Dictionary(resources));
    page_dict.set(
        "Contents",
        Object::Array(contents.into_iter().map(Object::Reference).collect()),
    );

    Ok(())
}

/// `base`, or `base` followed by the first number that is not yet a key
fn unused_name(dict: &Dictionary, base: &str) -> Vec<u8> {
    if !dict.has(base.as_bytes()) {
        return base.as_bytes().to_vec();
    }

    (1..)
        .map(|n| format!("{}{}", base, n).into_bytes())
        .find(|name| !dict.has(name))
        .unwrap_or_else(|| base.as_bytes().to_vec())
}

/// Write the document to `<dir>/<stem>_temp.<random>.pdf`
fn write_sibling_temp(doc: &mut Document, source: &Path) -> Result<TempPath> {
    let dir = source
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{}{}.", stem, TEMP_MARKER);

    // Removed again on any error below
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".pdf")
        .tempfile_in(dir)?;

    doc.save_to(&mut temp)?;
    temp.flush()?;

    Ok(temp.into_temp_path())
}

/// Encode text for a WinAnsiEncoding font; unmappable characters become `?`
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{write_fixture, FixtureOptions};
    use crate::pdf::metadata::page_text_runs;
    use std::fs;
    use tempfile::TempDir;

    fn temp_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("Failed to read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(TEMP_MARKER))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_annotation_text() {
        assert_eq!(annotation_text("File", "a.pdf"), "File: a.pdf");
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("a (b)"), b"a (b)".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
        assert_eq!(encode_win_ansi("–"), vec![0x96]);
    }

    #[test]
    fn test_encode_win_ansi_upper_table() {
        let expected: [(char, u8); 27] = [
            ('€', 0x80),
            ('‚', 0x82),
            ('ƒ', 0x83),
            ('„', 0x84),
            ('…', 0x85),
            ('†', 0x86),
            ('‡', 0x87),
            ('ˆ', 0x88),
            ('‰', 0x89),
            ('Š', 0x8A),
            ('‹', 0x8B),
            ('Œ', 0x8C),
            ('Ž', 0x8E),
            ('‘', 0x91),
            ('’', 0x92),
            ('“', 0x93),
            ('”', 0x94),
            ('•', 0x95),
            ('–', 0x96),
            ('—', 0x97),
            ('˜', 0x98),
            ('™', 0x99),
            ('š', 0x9A),
            ('›', 0x9B),
            ('œ', 0x9C),
            ('ž', 0x9E),
            ('Ÿ', 0x9F),
        ];
        for (c, byte) in expected {
            assert_eq!(encode_win_ansi(&c.to_string()), vec![byte], "{:?}", c);
        }

        // Undefined slots in WinAnsiEncoding have no character to map from
        assert_eq!(encode_win_ansi("\u{81}\u{8D}"), b"??".to_vec());
    }

    #[test]
    fn test_unused_name() {
        let mut dict = Dictionary::new();
        assert_eq!(unused_name(&dict, "Annot"), b"Annot".to_vec());

        dict.set("Annot", Object::Null);
        dict.set("Annot1", Object::Null);
        assert_eq!(unused_name(&dict, "Annot"), b"Annot2".to_vec());
    }

    #[test]
    fn test_annotate_keeps_page_count_and_adds_text() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = write_fixture(temp_dir.path(), "report.pdf", &FixtureOptions::pages(3, "report"));

        let annotated = annotate_pdf(&source, DEFAULT_LABEL).expect("Failed to annotate");
        assert_eq!(annotated.page_count(), 3);
        assert_eq!(annotated.file_name(), "report.pdf");
        assert_eq!(annotated.path().parent(), source.parent());

        let runs = page_text_runs(annotated.path()).expect("Failed to read text");
        assert_eq!(runs.len(), 3);
        for (i, page_runs) in runs.iter().enumerate() {
            assert_eq!(
                page_runs,
                &vec![format!("report page {}", i + 1), "File: report.pdf".to_string()],
                "Original text must come first and the overlay on top"
            );
        }
    }

    #[test]
    fn test_annotate_places_overlay_at_fixed_offset() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = write_fixture(temp_dir.path(), "offset.pdf", &FixtureOptions::pages(1, "offset"));

        let annotated = annotate_pdf(&source, "File").expect("Failed to annotate");
        let doc = Document::load(annotated.path()).expect("Failed to load annotated PDF");
        let page_id = *doc.get_pages().values().next().expect("page");

        let resources = page_resources(&doc, page_id);
        let xobjects = resolve_dictionary(&doc, resources.get(b"XObject").expect("XObject"))
            .expect("XObject dictionary");
        let overlay_id = xobjects
            .get(OVERLAY_XOBJECT.as_bytes())
            .and_then(Object::as_reference)
            .expect("overlay reference");
        let overlay = doc
            .get_object(overlay_id)
            .and_then(Object::as_stream)
            .expect("overlay stream");

        let bytes = overlay
            .decompressed_content()
            .unwrap_or_else(|_| overlay.content.clone());
        let content = Content::decode(&bytes).expect("Failed to decode overlay");
        let td = content
            .operations
            .iter()
            .find(|op| op.operator == "Td")
            .expect("Td operator");
        let offset: Vec<f32> = td
            .operands
            .iter()
            .map(|operand| match operand {
                Object::Integer(n) => *n as f32,
                Object::Real(n) => *n,
                other => panic!("Unexpected Td operand {:?}", other),
            })
            .collect();
        assert_eq!(offset, vec![10.0, 10.0]);
    }

    #[test]
    fn test_annotate_does_not_touch_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = write_fixture(temp_dir.path(), "keep.pdf", &FixtureOptions::pages(2, "keep"));
        let before = fs::read(&source).expect("Failed to read source");

        let annotated = annotate_pdf(&source, "File").expect("Failed to annotate");
        drop(annotated);

        assert_eq!(fs::read(&source).expect("Failed to read source"), before);
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = write_fixture(temp_dir.path(), "scoped.pdf", &FixtureOptions::pages(1, "scoped"));

        let annotated = annotate_pdf(&source, "File").expect("Failed to annotate");
        let temp_path = annotated.path().to_path_buf();
        assert!(temp_path.exists());
        assert_eq!(temp_files(temp_dir.path()).len(), 1);

        drop(annotated);
        assert!(!temp_path.exists());
        assert!(temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_drop_tolerates_missing_temp_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = write_fixture(temp_dir.path(), "gone.pdf", &FixtureOptions::pages(1, "gone"));

        let annotated = annotate_pdf(&source, "File").expect("Failed to annotate");
        fs::remove_file(annotated.path()).expect("Failed to remove temp file");
        drop(annotated);
    }

    #[test]
    fn test_inherited_resources_survive() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = write_fixture(
            temp_dir.path(),
            "inherit.pdf",
            &FixtureOptions {
                inherit_resources: true,
                ..FixtureOptions::pages(2, "inherit")
            },
        );

        let annotated = annotate_pdf(&source, "File").expect("Failed to annotate");
        let doc = Document::load(annotated.path()).expect("Failed to load annotated PDF");

        for page_id in doc.get_pages().into_values() {
            let resources = page_resources(&doc, page_id);
            assert!(resources.has(b"Font"), "Original fonts must stay reachable");
            assert!(resources.has(b"XObject"));
        }
    }

    #[test]
    fn test_corrupt_pdf_fails_without_temp_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("broken.pdf");
        fs::write(&source, b"%PDF-1.4\nthis is not a pdf").expect("Failed to write file");

        let result = annotate_pdf(&source, "File");
        assert!(result.is_err());
        assert!(temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_missing_source() {
        let result = annotate_pdf(Path::new("nonexistent.pdf"), "File");
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
