use serde::{Deserialize, Serialize};

/// A file chosen by the user, not yet checked against the accepted types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    /// MIME type as declared by whoever picked the file, if known.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.map(str::to_string),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = DocumentKind::from_extension(&name).map(|k| k.mime_type().to_string());
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    /// Classify the file, preferring the declared MIME type over the extension.
    ///
    /// Returns `None` when neither check passes; such files are never sent.
    pub fn kind(&self) -> Option<DocumentKind> {
        self.mime_type
            .as_deref()
            .and_then(DocumentKind::from_mime)
            .or_else(|| DocumentKind::from_extension(&self.name))
    }
}

/// Classification of an accepted document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Doc,
    Text,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/msword" => Some(Self::Doc),
            "text/plain" => Some(Self::Text),
            _ => None,
        }
    }

    /// Match `.pdf|.docx|.doc|.txt` at the end of a filename, ignoring case.
    pub fn from_extension(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Doc => "application/msword",
            Self::Text => "text/plain",
        }
    }
}

/// Where a document is in the upload pipeline.
///
/// - `Pending`: accepted by the type filter, not yet confirmed by the backend
/// - `Uploaded`: confirmed by the backend; the document is now immutable
/// - `Rejected`: dropped by the type filter and never sent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploaded,
    Rejected,
}

/// A document known to the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Derived from the filename, see [`document_id`].
    pub id: String,
    pub name: String,
    /// `None` only for rejected documents.
    pub kind: Option<DocumentKind>,
    pub status: UploadStatus,
}

impl Document {
    pub fn pending(name: &str, kind: DocumentKind) -> Self {
        Self {
            id: document_id(name),
            name: name.to_string(),
            kind: Some(kind),
            status: UploadStatus::Pending,
        }
    }

    pub fn rejected(name: &str) -> Self {
        Self {
            id: document_id(name),
            name: name.to_string(),
            kind: None,
            status: UploadStatus::Rejected,
        }
    }

    /// Mark the document as confirmed by the backend.
    pub fn into_uploaded(self) -> Self {
        Self {
            status: UploadStatus::Uploaded,
            ..self
        }
    }
}

/// Derive a stable identifier from a filename: lower-cased, with every run of
/// non-alphanumeric characters collapsed to a single `-`.
pub fn document_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    id
}

/// Documents accepted into the current session, in upload order.
///
/// Append-only; the only way to remove documents is [`DocumentSet::clear`].
/// Only uploaded documents of an accepted kind can be added.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSet {
    documents: Vec<Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append uploaded documents. Anything not `Uploaded` with a kind is skipped.
    pub fn extend(&mut self, documents: impl IntoIterator<Item = Document>) {
        self.documents.extend(
            documents
                .into_iter()
                .filter(|d| d.status == UploadStatus::Uploaded && d.kind.is_some()),
        );
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_declared_mime() {
        let file = FileRef::new("blob", Some("application/pdf"), vec![]);
        assert_eq!(file.kind(), Some(DocumentKind::Pdf));
    }

    #[test]
    fn test_kind_from_extension_is_case_insensitive() {
        let file = FileRef::new("NOTES.TxT", None, vec![]);
        assert_eq!(file.kind(), Some(DocumentKind::Text));
        let file = FileRef::new("memo.DOCX", Some("application/octet-stream"), vec![]);
        assert_eq!(file.kind(), Some(DocumentKind::Docx));
    }

    #[test]
    fn test_kind_rejects_unknown_types() {
        assert_eq!(FileRef::new("photo.png", Some("image/png"), vec![]).kind(), None);
        assert_eq!(FileRef::new("archive.pdf.zip", None, vec![]).kind(), None);
        assert_eq!(FileRef::new("README", None, vec![]).kind(), None);
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Minutes.DOCX");
        std::fs::write(&path, b"PK").unwrap();

        let file = FileRef::from_path(&path).await.unwrap();
        assert_eq!(file.name, "Minutes.DOCX");
        assert_eq!(file.kind(), Some(DocumentKind::Docx));
        assert_eq!(file.bytes, b"PK");

        let other = dir.path().join("clip.mov");
        std::fs::write(&other, b"").unwrap();
        assert_eq!(FileRef::from_path(&other).await.unwrap().mime_type, None);
    }

    #[test]
    fn test_document_id_from_filename() {
        assert_eq!(document_id("Q3 Report.PDF"), "q3-report-pdf");
        assert_eq!(document_id("  --notes__v2.txt"), "notes-v2-txt");
        assert_eq!(document_id("report.pdf"), "report-pdf");
    }

    #[test]
    fn test_document_set_only_takes_uploaded() {
        let mut set = DocumentSet::new();
        set.extend(vec![
            Document::pending("a.pdf", DocumentKind::Pdf).into_uploaded(),
            Document::pending("b.pdf", DocumentKind::Pdf),
            Document::rejected("c.png"),
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].name, "a.pdf");
    }

    #[test]
    fn test_document_set_appends() {
        let mut set = DocumentSet::new();
        set.extend(vec![Document::pending("a.pdf", DocumentKind::Pdf).into_uploaded()]);
        set.extend(vec![Document::pending("b.txt", DocumentKind::Text).into_uploaded()]);
        let names: Vec<_> = set.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.txt"]);

        set.clear();
        assert!(set.is_empty());
    }
}
