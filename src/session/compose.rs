//! Building the outbound user message: model tag, modifications block, attachments.

use super::message::{Attachment, ChatMessage};
use crate::classify::extension;
use crate::error::{Result, WorkbenchError};
use crate::options::ClientConfig;
use crate::workbench::{FileModifications, modifications_to_html};
use base64::Engine as _;
use futures::future::try_join_all;
use std::path::PathBuf;

const FALLBACK_CONTENT_TYPE: &str = "text/plain";

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "json", "xml", "pdf", "html", "htm", "css", "scss", "js", "jsx", "ts",
    "tsx", "mjs", "cjs", "py", "rs", "go", "java", "kt", "c", "h", "cpp", "hpp", "cs", "rb",
    "php", "swift", "sh", "yml", "yaml", "toml", "sql", "vue", "svelte", "png", "jpg", "jpeg",
    "gif", "webp", "svg",
];

#[derive(Debug, Clone)]
enum Source {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A file queued for the next user message.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    pub name: String,
    pub content_type: Option<String>,
    source: Source,
}

impl AttachmentFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            content_type: None,
            source: Source::Path(path),
        }
    }

    /// An in-memory file, such as a crawler screenshot or a whiteboard export.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type,
            source: Source::Bytes(bytes),
        }
    }

    /// Declared type, else guessed from the name; octet-stream reads as text.
    pub fn resolved_content_type(&self) -> String {
        let declared = self
            .content_type
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| mime_guess::from_path(&self.name).first_raw().map(str::to_string));
        match declared {
            Some(t) if t != "application/octet-stream" => t,
            _ => FALLBACK_CONTENT_TYPE.to_string(),
        }
    }
}

/// Images, text, pdf, csv, json, xml and source code are accepted.
pub fn is_supported_attachment(file: &AttachmentFile) -> bool {
    if let Some(t) = file.content_type.as_deref() {
        if t.starts_with("image/")
            || t.starts_with("text/")
            || matches!(t, "application/pdf" | "application/json" | "application/xml")
        {
            return true;
        }
    }
    SUPPORTED_EXTENSIONS.contains(&extension(&file.name).as_str())
}

/// Rejects the whole batch if any file is unsupported.
pub fn validate_attachments(files: &[AttachmentFile]) -> Result<()> {
    match files.iter().find(|f| !is_supported_attachment(f)) {
        Some(file) => Err(WorkbenchError::UnsupportedAttachment(file.name.clone())),
        None => Ok(()),
    }
}

pub async fn read_attachment(file: &AttachmentFile) -> Result<Attachment> {
    let bytes = match &file.source {
        Source::Bytes(bytes) => bytes.clone(),
        Source::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|source| WorkbenchError::Attachment {
                name: file.name.clone(),
                source,
            })?,
    };
    let content_type = file.resolved_content_type();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(Attachment {
        name: file.name.clone(),
        url: format!("data:{content_type};base64,{encoded}"),
        content_type,
    })
}

/// Reads every file concurrently; the first failure fails the batch.
pub async fn read_attachments(files: &[AttachmentFile]) -> Result<Vec<Attachment>> {
    try_join_all(files.iter().map(read_attachment)).await
}

/// Builds the user message for `input`.
///
/// With pending modifications the diff block goes between the model tag and
/// the input and no attachments are sent.
pub fn compose_user_message(
    config: &ClientConfig,
    input: &str,
    modifications: Option<&FileModifications>,
    attachments: Vec<Attachment>,
) -> ChatMessage {
    let tag = config.model_tag();
    match modifications {
        Some(modifications) => {
            let diff = modifications_to_html(modifications);
            ChatMessage::user(format!("{tag}\n\n{diff}\n\n{input}"))
        }
        None => ChatMessage::user(format!("{tag}\n\n{input}")).with_attachments(attachments),
    }
}
