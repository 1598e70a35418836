use std::fs;
use std::path::Path;
use std::str::FromStr;

use futures::future::BoxFuture;

use super::{BuildContext, Submission};
use crate::api::{Collection, RecordWriter, WriteAck};
use crate::error::{ApiError, PortalError};
use crate::model::document::storage_key;
use crate::model::{DocumentMetadata, DocumentType, Identity};

pub const NO_FILE: &str = "Please select a file to upload.";

/// A picked file, described by name and size only. Its bytes are never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentForm {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: DocumentType,
}

impl DocumentForm {
    pub fn new(file_name: impl Into<String>, file_size: u64, file_type: DocumentType) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            file_type,
        }
    }

    /// Describes a local file from its metadata.
    pub fn from_path(path: &Path, file_type: DocumentType) -> Result<Self, PortalError> {
        let meta = fs::metadata(path).map_err(|e| {
            PortalError::Validation(format!("Cannot read {}: {e}", path.display()))
        })?;
        if !meta.is_file() {
            return Err(PortalError::Validation(NO_FILE.to_string()));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(file_name, meta.len(), file_type))
    }

    /// Parses the document type argument the console receives.
    pub fn parse_type(raw: &str) -> Result<DocumentType, PortalError> {
        DocumentType::from_str(raw.trim())
            .map_err(|_| PortalError::Validation(format!("Unknown document type \"{raw}\".")))
    }
}

impl Submission for DocumentForm {
    type Record = DocumentMetadata;

    const ACTION: &'static str = "upload documents";
    const COLLECTION: Collection = Collection::Documents;
    const SUCCESS: &'static str = "Document metadata saved successfully!";
    const FAILURE: &'static str = "Error uploading document";

    /// The locator is made up here from the user id and file name. The
    /// backend may hand back its own on the next snapshot.
    fn build(
        &self,
        identity: &Identity,
        ctx: &BuildContext<'_>,
    ) -> Result<DocumentMetadata, PortalError> {
        let file_name = self.file_name.trim();
        if file_name.is_empty() {
            return Err(PortalError::Validation(NO_FILE.to_string()));
        }

        let key = storage_key(identity.user_id.as_str(), file_name);
        Ok(DocumentMetadata {
            id: None,
            file_name: file_name.to_string(),
            file_size: self.file_size,
            file_type: self.file_type,
            upload_date: Some(ctx.now),
            download_url: Some(format!("{}/{key}", ctx.document_url_base)),
            storage_key: Some(key),
        })
    }

    fn send<'a>(
        writer: &'a dyn RecordWriter,
        identity: &'a Identity,
        record: &'a DocumentMetadata,
    ) -> BoxFuture<'a, Result<WriteAck, ApiError>> {
        writer.add_document(identity, record)
    }
}
