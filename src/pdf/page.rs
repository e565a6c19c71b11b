//! Page tree helpers shared by annotation and merging

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Result;

/// Page attributes a page may inherit from its ancestors in the page tree
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed, cyclic Parent chains
const MAX_TREE_DEPTH: usize = 64;

/// Look up a page attribute, walking up the Parent chain when the page
/// itself does not carry it
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node_id = page_id;

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;

        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }

        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => return None,
        }
    }

    None
}

/// Resolve an object that is either a dictionary or a reference to one
pub fn resolve_dictionary(doc: &Document, object: &Object) -> Option<Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

/// The page's effective Resources dictionary as an owned copy
///
/// Pages without any Resources (own or inherited) get an empty dictionary.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited_attribute(doc, page_id, b"Resources")
        .and_then(|res| resolve_dictionary(doc, &res))
        .unwrap_or_else(Dictionary::new)
}

/// IDs of the content streams of a page, in drawing order
///
/// Contents may be a single stream reference, an array of references, or a
/// reference to such an array.
pub fn content_stream_ids(doc: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>> {
    let page_dict = doc.get_dictionary(page_id)?;

    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };

    let refs_in = |arr: &[Object]| -> Vec<ObjectId> {
        arr.iter()
            .filter_map(|obj| match obj {
                Object::Reference(id) => Some(*id),
                _ => None,
            })
            .collect()
    };

    let ids = match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(arr) => refs_in(arr),
            _ => vec![*id],
        },
        Object::Array(arr) => refs_in(arr),
        _ => Vec::new(),
    };

    Ok(ids)
}

/// Lower-left corner of the page's MediaBox in default user space
pub fn media_box_origin(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = match inherited_attribute(doc, page_id, b"MediaBox") {
        Some(Object::Reference(id)) => doc.get_object(id).ok().cloned(),
        other => other,
    };

    let coords: Vec<f32> = match media_box {
        Some(Object::Array(arr)) => arr.iter().filter_map(number).collect(),
        _ => return (0.0, 0.0),
    };

    if coords.len() != 4 {
        return (0.0, 0.0);
    }

    (coords[0].min(coords[2]), coords[1].min(coords[3]))
}

/// Copy inherited attributes onto the page so it no longer depends on its
/// ancestors
///
/// Needed before a page is moved under a different Pages node.
pub fn flatten_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited = Vec::new();
    {
        let page_dict = doc.get_dictionary(page_id)?;
        for key in INHERITABLE_ATTRIBUTES {
            if page_dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                inherited.push((key, value));
            }
        }
    }

    let page_dict = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page_dict.set(key, value);
    }

    Ok(())
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(n) => Some(*n),
        _ => None,
    }
}
