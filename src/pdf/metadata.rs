//! Reading back page counts and shown text

use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use super::page::{page_resources, resolve_dictionary};

/// How deep to follow Form XObjects invoked from other Form XObjects
const MAX_FORM_DEPTH: usize = 8;

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    Ok(doc.get_pages().len())
}

/// Text shown on each page of a PDF file, in page order
///
/// Collects the strings drawn by `Tj`, `'`, `"` and `TJ` operators in the
/// page content and in any Form XObjects the page invokes. Bytes are read as
/// Latin-1, which covers the single-byte text our overlays write.
pub fn page_text_runs(path: &Path) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;

    let mut pages = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let content = doc.get_page_content(page_id)?;
        let mut runs = Vec::new();
        collect_runs(&doc, &content, &XObjectScope::Page(page_id), 0, &mut runs)?;
        pages.push(runs);
    }

    Ok(pages)
}

/// Where `Do` operands are looked up
enum XObjectScope<'a> {
    Page(ObjectId),
    Form(&'a Stream),
}

fn collect_runs(
    doc: &Document,
    content: &[u8],
    scope: &XObjectScope,
    depth: usize,
    runs: &mut Vec<String>,
) -> Result<()> {
    let content = Content::decode(content)?;

    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tj" | "'" | "\"" => {
                if let Some(Object::String(bytes, _)) = operation.operands.last() {
                    runs.push(latin1(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operation.operands.first() {
                    let text: String = parts
                        .iter()
                        .filter_map(|part| match part {
                            Object::String(bytes, _) => Some(latin1(bytes)),
                            _ => None,
                        })
                        .collect();
                    runs.push(text);
                }
            }
            "Do" if depth < MAX_FORM_DEPTH => {
                let name = match operation.operands.first() {
                    Some(Object::Name(name)) => name,
                    _ => continue,
                };
                if let Some(form) = find_form(doc, scope, name) {
                    let form_content = form
                        .decompressed_content()
                        .unwrap_or_else(|_| form.content.clone());
                    collect_runs(doc, &form_content, &XObjectScope::Form(form), depth + 1, runs)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn find_form<'a>(doc: &'a Document, scope: &XObjectScope, name: &[u8]) -> Option<&'a Stream> {
    let resources = match scope {
        XObjectScope::Page(page_id) => page_resources(doc, *page_id),
        XObjectScope::Form(form) => resolve_dictionary(doc, form.dict.get(b"Resources").ok()?)?,
    };

    let xobjects = resolve_dictionary(doc, resources.get(b"XObject").ok()?)?;
    let form_id = match xobjects.get(name).ok()? {
        Object::Reference(id) => *id,
        _ => return None,
    };

    let stream = doc.get_object(form_id).and_then(Object::as_stream).ok()?;
    match stream.dict.get(b"Subtype") {
        Ok(Object::Name(subtype)) if subtype.as_slice() == b"Form" => Some(stream),
        _ => None,
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
