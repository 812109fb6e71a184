use std::path::{Component, Path, PathBuf};

use actix_web::web;
use async_trait::async_trait;

use crate::error::AppError;

/// Photo evidence is uploaded elsewhere; clock events only carry a
/// reference that must resolve to a stored object.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn ensure_exists(&self, reference: &str) -> Result<(), AppError>;
}

/// Evidence kept as files below a root directory.
pub struct DiskEvidenceStore {
    root: PathBuf,
}

impl DiskEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || reference.is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl EvidenceStore for DiskEvidenceStore {
    async fn ensure_exists(&self, reference: &str) -> Result<(), AppError> {
        let path = self
            .locate(reference)
            .ok_or_else(|| AppError::validation("Invalid photo reference"))?;

        let found = web::block(move || path.is_file())
            .await
            .map_err(|e| AppError::External(format!("Evidence store unavailable: {}", e)))?;

        if found {
            Ok(())
        } else {
            Err(AppError::External(format!(
                "Photo '{}' not found in evidence store",
                reference
            )))
        }
    }
}
