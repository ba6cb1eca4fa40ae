//! Document container boundary.
//!
//! [`PdfStore`] writes a one-page PDF whose catalog carries the payload in
//! the `/Names /EmbeddedFiles` name tree, and reads attachments back out of
//! any PDF that uses that tree.

use crate::error::{GitPdfError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Nesting limit for references and name tree kids
const MAX_DEPTH: usize = 32;

/// Bytes stored as a file attachment, with their label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub filename: String,
    pub description: String,
    pub data: Vec<u8>,
}

/// Attachment metadata reported by `info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentInfo {
    pub filename: String,
    pub description: Option<String>,
    pub size: usize,
}

/// Visible page content of a generated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    pub title: String,
    pub body: String,
}

impl Default for DocumentText {
    fn default() -> Self {
        Self {
            title: "Reports".into(),
            body: "ACME Corp Monthly Report".into(),
        }
    }
}

/// Stores one attachment per container and reads attachments back
pub trait ContainerStore {
    fn write_attachment(&self, payload: &AttachmentPayload, output: &Path) -> Result<()>;

    /// First attachment in document order, whatever its filename
    /// Fails with `NoAttachment` when the container holds none
    fn read_first_attachment(&self, input: &Path) -> Result<AttachmentPayload>;

    fn list_attachments(&self, input: &Path) -> Result<Vec<AttachmentInfo>>;
}

#[derive(Debug, Clone, Default)]
pub struct PdfStore {
    text: DocumentText,
}

impl PdfStore {
    pub fn new(text: DocumentText) -> Self {
        Self { text }
    }

    fn build_document(&self, payload: &AttachmentPayload) -> Result<Document> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 16.into()]),
                Operation::new("Td", vec![72.into(), 770.into()]),
                Operation::new("Tj", vec![Object::string_literal(self.text.title.as_str())]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![0.into(), (-28).into()]),
                Operation::new("Tj", vec![Object::string_literal(self.text.body.as_str())]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            // A4 in points
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let file_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "EmbeddedFile",
                "Params" => dictionary! {
                    "Size" => payload.data.len() as i64,
                },
            },
            payload.data.clone(),
        ));
        let filespec_id = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::string_literal(payload.filename.as_str()),
            "UF" => Object::string_literal(payload.filename.as_str()),
            "Desc" => Object::string_literal(payload.description.as_str()),
            "EF" => dictionary! {
                "F" => file_id,
            },
        });

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "PageMode" => "UseAttachments",
            "Names" => dictionary! {
                "EmbeddedFiles" => dictionary! {
                    "Names" => vec![
                        Object::string_literal(payload.filename.as_str()),
                        filespec_id.into(),
                    ],
                },
            },
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }
}

impl ContainerStore for PdfStore {
    fn write_attachment(&self, payload: &AttachmentPayload, output: &Path) -> Result<()> {
        let mut doc = self.build_document(payload)?;
        doc.save(output)?;
        debug!(path = %output.display(), bytes = payload.data.len(), "pdf written");
        Ok(())
    }

    fn read_first_attachment(&self, input: &Path) -> Result<AttachmentPayload> {
        let doc = load(input)?;
        let filespecs = embedded_files(&doc)?;
        let (name, filespec) = filespecs
            .into_iter()
            .next()
            .ok_or_else(|| GitPdfError::NoAttachment(input.to_path_buf()))?;

        let filename = filespec_name(filespec).unwrap_or(name);
        let description = dict_text(filespec, b"Desc").unwrap_or_default();
        let data = filespec_data(&doc, filespec)?;
        debug!(filename = %filename, bytes = data.len(), "attachment read");
        Ok(AttachmentPayload {
            filename,
            description,
            data,
        })
    }

    fn list_attachments(&self, input: &Path) -> Result<Vec<AttachmentInfo>> {
        let doc = load(input)?;
        embedded_files(&doc)?
            .into_iter()
            .map(|(name, filespec)| {
                Ok(AttachmentInfo {
                    filename: filespec_name(filespec).unwrap_or(name),
                    description: dict_text(filespec, b"Desc"),
                    size: filespec_data(&doc, filespec)?.len(),
                })
            })
            .collect()
    }
}

fn load(input: &Path) -> Result<Document> {
    let bytes = std::fs::read(input)?;
    Ok(Document::load_mem(&bytes)?)
}

/// Follow indirect references to the underlying object
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id)?,
            other => return Ok(other),
        }
    }
    Err(GitPdfError::MalformedInput("reference chain too long".into()))
}

fn resolve_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let object = dict.get(key).ok()?;
    resolve(doc, object).ok()?.as_dict().ok()
}

/// Filespec dictionaries of the catalog's embedded files, in name tree order
fn embedded_files(doc: &Document) -> Result<Vec<(String, &Dictionary)>> {
    let root = resolve(doc, doc.trailer.get(b"Root")?)?.as_dict()?;
    let Some(names) = resolve_dict(doc, root, b"Names") else {
        return Ok(Vec::new());
    };
    let Some(tree) = resolve_dict(doc, names, b"EmbeddedFiles") else {
        return Ok(Vec::new());
    };

    let mut found = Vec::new();
    collect_name_tree(doc, tree, &mut found, 0)?;
    Ok(found)
}

fn collect_name_tree<'a>(
    doc: &'a Document,
    node: &'a Dictionary,
    found: &mut Vec<(String, &'a Dictionary)>,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(GitPdfError::MalformedInput("name tree too deep".into()));
    }

    if let Ok(names) = node.get(b"Names") {
        for pair in resolve(doc, names)?.as_array()?.chunks(2) {
            if let [key, value] = pair {
                let name = object_text(key).unwrap_or_default();
                if let Ok(filespec) = resolve(doc, value)?.as_dict() {
                    found.push((name, filespec));
                }
            }
        }
    }

    if let Ok(kids) = node.get(b"Kids") {
        for kid in resolve(doc, kids)?.as_array()? {
            let kid = resolve(doc, kid)?.as_dict()?;
            collect_name_tree(doc, kid, found, depth + 1)?;
        }
    }
    Ok(())
}

fn filespec_name(filespec: &Dictionary) -> Option<String> {
    dict_text(filespec, b"UF").or_else(|| dict_text(filespec, b"F"))
}

fn filespec_data(doc: &Document, filespec: &Dictionary) -> Result<Vec<u8>> {
    let ef = resolve_dict(doc, filespec, b"EF").ok_or_else(|| {
        GitPdfError::MalformedInput("file specification has no embedded file".into())
    })?;
    let stream_ref = ef
        .get(b"F")
        .or_else(|_| ef.get(b"UF"))
        .map_err(|_| GitPdfError::MalformedInput("embedded file entry is empty".into()))?;
    let stream = resolve(doc, stream_ref)?.as_stream()?;

    if stream.dict.get(b"Filter").is_ok() {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

fn dict_text(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(object_text)
}

/// Decode a PDF text string (PDFDocEncoding approximated as Latin-1, or UTF-16BE with BOM)
fn object_text(object: &Object) -> Option<String> {
    let bytes = match object {
        Object::String(bytes, _) => bytes,
        Object::Name(bytes) => bytes,
        _ => return None,
    };
    if let Some(utf16) = bytes.strip_prefix(&[0xFEu8, 0xFF][..]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(_) => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}
