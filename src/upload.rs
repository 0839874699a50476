//! Upload coordinator: filters a selection down to accepted document types
//! and submits it to the backend as one request.

use std::sync::Arc;

use crate::client::Backend;
use crate::error::UploadError;
use crate::models::{Document, FileRef};

/// Returned as the server error when the backend keeps none of the files.
const NOTHING_ACCEPTED: &str = "The server did not accept any of the uploaded files.";

/// Whether a file is a PDF, DOCX, DOC, or plain-text document, by declared
/// MIME type or by extension.
pub fn accepts(file: &FileRef) -> bool {
    file.kind().is_some()
}

/// A filtered selection, ready to send.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    files: Vec<FileRef>,
    pending: Vec<Document>,
    rejected: Vec<Document>,
}

impl UploadBatch {
    /// Drop files of unsupported types. Fails with `NoValidFiles` if nothing
    /// is left; no request is made in that case.
    pub fn prepare(files: Vec<FileRef>) -> Result<Self, UploadError> {
        let mut batch = Self {
            files: Vec::with_capacity(files.len()),
            pending: Vec::with_capacity(files.len()),
            rejected: Vec::new(),
        };

        for file in files {
            match file.kind() {
                Some(kind) => {
                    batch.pending.push(Document::pending(&file.name, kind));
                    batch.files.push(file);
                }
                None => {
                    tracing::debug!(name = %file.name, "Dropping file of unsupported type");
                    batch.rejected.push(Document::rejected(&file.name));
                }
            }
        }

        if batch.files.is_empty() {
            return Err(UploadError::NoValidFiles);
        }
        Ok(batch)
    }

    /// Files that will be sent.
    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    /// One `Pending` document per file that will be sent.
    pub fn pending(&self) -> &[Document] {
        &self.pending
    }

    /// Files dropped by the type filter.
    pub fn rejected(&self) -> &[Document] {
        &self.rejected
    }
}

/// Documents the backend confirmed, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedDocuments {
    pub documents: Vec<Document>,
    pub rejected: Vec<Document>,
    pub chunks: Option<u64>,
}

impl AcceptedDocuments {
    pub fn names(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.name.as_str()).collect()
    }
}

pub struct UploadCoordinator<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: Backend + ?Sized> UploadCoordinator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Filter and send in one step.
    pub async fn submit(&self, files: Vec<FileRef>) -> Result<AcceptedDocuments, UploadError> {
        let batch = UploadBatch::prepare(files)?;
        self.send(batch).await
    }

    /// Send a prepared batch.
    ///
    /// If the backend names the files it accepted, only those become
    /// documents; otherwise every file sent does.
    pub async fn send(&self, batch: UploadBatch) -> Result<AcceptedDocuments, UploadError> {
        tracing::info!(files = batch.files.len(), "Uploading documents");
        let receipt = self.backend.upload(&batch.files).await.map_err(|e| {
            tracing::warn!("Upload failed: {}", e);
            UploadError::from(e)
        })?;

        let documents: Vec<Document> = match receipt.accepted {
            None => batch.pending.into_iter().map(Document::into_uploaded).collect(),
            Some(mut names) => batch
                .pending
                .into_iter()
                .filter(|doc| match names.iter().position(|n| *n == doc.name) {
                    Some(i) => {
                        names.swap_remove(i);
                        true
                    }
                    None => false,
                })
                .map(Document::into_uploaded)
                .collect(),
        };

        if documents.is_empty() {
            tracing::warn!("Backend accepted none of the uploaded files");
            return Err(UploadError::Server(NOTHING_ACCEPTED.to_string()));
        }

        tracing::info!(accepted = documents.len(), "Upload complete");
        Ok(AcceptedDocuments {
            documents,
            rejected: batch.rejected,
            chunks: receipt.chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentKind, UploadStatus};

    fn file(name: &str, mime: Option<&str>) -> FileRef {
        FileRef::new(name, mime, b"content".to_vec())
    }

    #[test]
    fn test_prepare_splits_accepted_and_rejected() {
        let batch = UploadBatch::prepare(vec![
            file("report.pdf", None),
            file("photo.jpg", Some("image/jpeg")),
            file("notes", Some("text/plain")),
        ])
        .unwrap();

        let sent: Vec<_> = batch.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(sent, vec!["report.pdf", "notes"]);
        assert_eq!(batch.pending()[1].kind, Some(DocumentKind::Text));
        assert!(batch.pending().iter().all(|d| d.status == UploadStatus::Pending));
        assert_eq!(batch.rejected().len(), 1);
        assert_eq!(batch.rejected()[0].status, UploadStatus::Rejected);
    }

    #[test]
    fn test_prepare_with_nothing_accepted() {
        let err = UploadBatch::prepare(vec![file("movie.mp4", None)]).unwrap_err();
        assert_eq!(err, UploadError::NoValidFiles);

        let err = UploadBatch::prepare(vec![]).unwrap_err();
        assert_eq!(err, UploadError::NoValidFiles);
    }

    #[test]
    fn test_accepts() {
        assert!(accepts(&file("a.DOC", None)));
        assert!(accepts(&file("scan", Some("application/pdf"))));
        assert!(!accepts(&file("a.rtf", Some("application/rtf"))));
    }
}
