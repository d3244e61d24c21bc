// src/services/document_service.rs

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;

use crate::common::error::AppError;

pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Sub-folders of the documents root, one per upload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Policies,
    Evidence,
    Certificates,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Policies,
        DocumentKind::Evidence,
        DocumentKind::Certificates,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            DocumentKind::Policies => "policies",
            DocumentKind::Evidence => "evidence",
            DocumentKind::Certificates => "certificates",
        }
    }
}

/// One file part read from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn check(&self) -> Result<(), AppError> {
        let allowed = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ALLOWED_CONTENT_TYPES.contains(&ct));
        if !allowed {
            return Err(AppError::Upload("Only PDF or Word documents are allowed".into()));
        }
        if self.bytes.len() > MAX_FILE_BYTES {
            return Err(AppError::Upload("File too large: 5MB maximum per file".into()));
        }
        Ok(())
    }
}

/// `{millis}-{name}` with whitespace runs turned into `-` and any directory part dropped.
pub fn stored_file_name(original: &str, millis: i64) -> String {
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let cleaned = base.split_whitespace().collect::<Vec<_>>().join("-");
    format!("{millis}-{cleaned}")
}

// Files written under DOCUMENTS_DIR and served back at /documents.
#[derive(Debug, Clone)]
pub struct DocumentService {
    root: PathBuf,
}

impl DocumentService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, kind: DocumentKind, name: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(name)
    }

    pub async fn ensure_dirs(&self) -> Result<(), AppError> {
        for kind in DocumentKind::ALL {
            tokio::fs::create_dir_all(self.root.join(kind.dir_name())).await?;
        }
        Ok(())
    }

    /// Validates and writes every file, returning the stored names in order.
    /// Nothing is written if any file is rejected.
    pub async fn save_all(
        &self,
        kind: DocumentKind,
        files: &[UploadedFile],
        max_files: usize,
    ) -> Result<Vec<String>, AppError> {
        if files.len() > max_files {
            return Err(AppError::Upload(format!("Upload error: at most {max_files} files allowed")));
        }
        files.iter().try_for_each(UploadedFile::check)?;

        tokio::fs::create_dir_all(self.root.join(kind.dir_name())).await?;

        let millis = Utc::now().timestamp_millis();
        let mut stored = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            // Same-millisecond batches still get distinct names.
            let name = stored_file_name(&file.file_name, millis + i as i64);
            tokio::fs::write(self.path_of(kind, &name), &file.bytes).await?;
            stored.push(name);
        }
        Ok(stored)
    }

    pub async fn save(&self, kind: DocumentKind, file: &UploadedFile) -> Result<String, AppError> {
        let mut names = self.save_all(kind, std::slice::from_ref(file), 1).await?;
        names
            .pop()
            .ok_or_else(|| AppError::Upload("No file uploaded".into()))
    }

    /// Unlinks superseded files; missing files and errors are only logged.
    pub async fn remove_best_effort(&self, kind: DocumentKind, names: &[String]) {
        for name in names {
            let path = self.path_of(kind, name);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Could not remove superseded document");
            }
        }
    }

    /// Logs files left on disk after the row they belonged to failed to persist.
    pub fn report_orphans(&self, kind: DocumentKind, names: &[String], error: &AppError) {
        for name in names {
            tracing::warn!(
                path = %self.path_of(kind, name).display(),
                error = %error,
                "Uploaded document orphaned by failed database write"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pdf(name: &str, size: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.into(),
            content_type: Some("application/pdf".into()),
            bytes: Bytes::from(vec![b'%'; size]),
        }
    }

    fn scratch() -> DocumentService {
        DocumentService::new(std::env::temp_dir().join(format!("docs-{}", Uuid::new_v4())))
    }

    #[test]
    fn stored_names_replace_whitespace_and_drop_directories() {
        assert_eq!(stored_file_name("Fire Safety  v2.pdf", 17), "17-Fire-Safety-v2.pdf");
        assert_eq!(stored_file_name("../../etc/passwd", 1), "1-passwd");
    }

    #[test]
    fn only_pdf_and_word_are_accepted() {
        assert!(pdf("a.pdf", 10).check().is_ok());

        let mut docx = pdf("a.docx", 10);
        docx.content_type =
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document".into());
        assert!(docx.check().is_ok());

        let mut png = pdf("a.png", 10);
        png.content_type = Some("image/png".into());
        assert!(matches!(png.check(), Err(AppError::Upload(_))));

        let mut unknown = pdf("a", 10);
        unknown.content_type = None;
        assert!(unknown.check().is_err());
    }

    #[test]
    fn files_over_five_megabytes_are_rejected() {
        assert!(pdf("big.pdf", MAX_FILE_BYTES).check().is_ok());
        assert!(pdf("big.pdf", MAX_FILE_BYTES + 1).check().is_err());
    }

    #[tokio::test]
    async fn save_then_remove() {
        let store = scratch();
        let names = store
            .save_all(DocumentKind::Evidence, &[pdf("one.pdf", 4), pdf("two.pdf", 4)], 3)
            .await
            .unwrap();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
        for name in &names {
            assert!(store.path_of(DocumentKind::Evidence, name).exists());
        }

        store.remove_best_effort(DocumentKind::Evidence, &names).await;
        store
            .remove_best_effort(DocumentKind::Evidence, &["missing.pdf".to_string()])
            .await;
        for name in &names {
            assert!(!store.path_of(DocumentKind::Evidence, name).exists());
        }

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn too_many_files_write_nothing() {
        let store = scratch();
        let files = vec![pdf("a.pdf", 1), pdf("b.pdf", 1), pdf("c.pdf", 1), pdf("d.pdf", 1)];
        let err = store.save_all(DocumentKind::Certificates, &files, 3).await.unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
        assert!(!store.root().join("certificates").exists());
    }
}
