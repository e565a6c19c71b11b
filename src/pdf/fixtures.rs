//! In-memory PDFs for unit tests

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Shape of a generated test document
#[derive(Debug, Clone)]
pub struct FixtureOptions {
    /// Number of pages
    pub page_count: usize,
    /// Text drawn on every page as "<marker> page <n>"
    pub marker: String,
    /// Put Resources on the Pages node instead of each page
    pub inherit_resources: bool,
    /// MediaBox set on the Pages node
    pub media_box: [i64; 4],
}

impl FixtureOptions {
    pub fn pages(page_count: usize, marker: &str) -> Self {
        Self {
            page_count,
            marker: marker.to_string(),
            inherit_resources: false,
            media_box: [0, 0, 612, 792],
        }
    }
}

/// Build a document with one line of Courier text per page
pub fn build_document(options: &FixtureOptions) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for page_number in 1..=options.page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(24)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(600)]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{} page {}", options.marker, page_number))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("Failed to encode fixture content"),
        ));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !options.inherit_resources {
            page.set("Resources", resources_id);
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => options.page_count as i64,
        "MediaBox" => options.media_box.iter().map(|&n| Object::Integer(n)).collect::<Vec<_>>(),
    };
    if options.inherit_resources {
        pages.set("Resources", resources_id);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a generated document to `dir/name`
pub fn write_fixture(dir: &Path, name: &str, options: &FixtureOptions) -> PathBuf {
    let path = dir.join(name);
    build_document(options)
        .save(&path)
        .expect("Failed to save fixture PDF");
    path
}
