//! Blob storage for uploaded files (resumes, avatars), behind a trait so
//! the intake and profile logic stay testable without a real filesystem.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Maximum accepted resume size.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// Placeholder avatar that must never be deleted on replacement.
pub const DEFAULT_AVATAR: &str = "default.png";

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name`, returning the stored reference.
    async fn store(&self, name: &str, bytes: &[u8]) -> Result<String>;

    /// Remove a previously stored blob. Missing blobs are not an error.
    async fn delete(&self, name: &str) -> Result<()>;
}

pub type SharedBlobStore = Arc<dyn BlobStore>;

/// Filesystem-backed store rooted at the configured upload directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsStore {
    async fn store(&self, name: &str, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload dir")?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write upload {name}"))?;
        Ok(name.to_string())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.root.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("delete upload {name}")),
        }
    }
}

/// Content sniffing: a PDF starts with `%PDF-`. Extension alone is never
/// trusted.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Sniff the common web image formats accepted for avatars. Returns the
/// canonical file extension on a match.
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else {
        None
    }
}

/// Collision-resistant upload name: prefix, owning user, wall-clock millis
/// and a random nonce. Two uploads in the same millisecond must not share a
/// name, or replacing one would silently clobber the other.
pub fn upload_name(prefix: &str, user_id: uuid::Uuid, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce = uuid::Uuid::new_v4().simple();
    format!("{prefix}_{user_id}_{millis}_{nonce}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn pdf_sniffing_checks_content_not_name() {
        assert!(is_pdf(b"%PDF-1.7 rest of file"));
        // a renamed text file is still not a PDF
        assert!(!is_pdf(b"plain text pretending to be .pdf"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn image_sniffing_covers_jpeg_png_gif() {
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some("jpg"));
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert_eq!(sniff_image(&png), Some("png"));
        assert_eq!(sniff_image(b"GIF89a..."), Some("gif"));
        assert_eq!(sniff_image(b"%PDF-1.7"), None);
    }

    #[test]
    fn upload_names_carry_owner_and_prefix() {
        let user = Uuid::new_v4();
        let name = upload_name("resume", user, "pdf");
        assert!(name.starts_with(&format!("resume_{user}_")));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn upload_names_never_collide_for_back_to_back_uploads() {
        let user = Uuid::new_v4();
        assert_ne!(
            upload_name("profile", user, "png"),
            upload_name("profile", user, "png")
        );
    }

    #[tokio::test]
    async fn fs_store_writes_and_deletes() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("autoparts-test-{}", Uuid::new_v4()));
        let store = FsStore::new(&root);

        let stored = store.store("resume_test.pdf", b"%PDF-1.4 data").await?;
        assert_eq!(stored, "resume_test.pdf");
        let on_disk = tokio::fs::read(root.join("resume_test.pdf")).await?;
        assert_eq!(on_disk, b"%PDF-1.4 data");

        store.delete("resume_test.pdf").await?;
        assert!(!root.join("resume_test.pdf").exists());
        // deleting again is fine
        store.delete("resume_test.pdf").await?;

        tokio::fs::remove_dir_all(&root).await?;
        Ok(())
    }
}
