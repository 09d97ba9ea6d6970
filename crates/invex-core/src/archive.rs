//! Best-effort archival of original document bytes.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::ArchiveError;

/// Long-term storage for original documents.
///
/// Archival is a side-channel: the pipeline attempts it exactly once after
/// a successful extraction and downgrades any failure to a warning.
pub trait ArchiveStore: Send + Sync {
    /// Persist the document bytes under the given unique name.
    fn store(
        &self,
        name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<(), ArchiveError>> + Send;
}

/// Filesystem-backed archive rooted at a configured directory.
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveStore for FsArchive {
    async fn store(&self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(name);
        std::fs::write(&path, bytes)?;
        debug!("archived document to {}", path.display());
        Ok(())
    }
}

/// Build a collision-free archive name from the original file name.
pub fn archive_name(original: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), original)
}
