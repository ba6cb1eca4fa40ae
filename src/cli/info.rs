use crate::container::{AttachmentInfo, ContainerStore, PdfStore};
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct DocumentInfo<'a> {
    file: String,
    attachments: &'a [AttachmentInfo],
}

/// Describe the attachments of a PDF, as text or JSON
pub fn show_info(path: &Path, json: bool) -> Result<String> {
    let attachments = PdfStore::default().list_attachments(path)?;

    if json {
        let info = DocumentInfo {
            file: path.display().to_string(),
            attachments: &attachments,
        };
        let mut rendered = serde_json::to_string_pretty(&info)?;
        rendered.push('\n');
        return Ok(rendered);
    }

    let mut output = String::new();

    output.push_str("gitpdf Document Information\n");
    output.push_str("===========================\n\n");

    output.push_str(&format!("File: {}\n", path.display()));
    output.push_str(&format!("Attachments: {}\n", attachments.len()));
    output.push('\n');

    for (index, attachment) in attachments.iter().enumerate() {
        output.push_str(&format!("[{}] {}\n", index, attachment.filename));
        if let Some(description) = &attachment.description {
            output.push_str(&format!("  Description: {}\n", description));
        }
        output.push_str(&format!("  Size: {}\n", format_size(attachment.size as u64)));
    }

    if !attachments.is_empty() {
        output.push('\n');
        output.push_str("Extract reads attachment [0]; its bytes are opaque without the key.\n");
    }

    Ok(output)
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
