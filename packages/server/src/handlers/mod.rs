use axum::extract::DefaultBodyLimit;

use crate::config::StorageConfig;

pub mod auth;
pub mod category;
pub mod contract;
pub mod dashboard;
pub mod gallery;
pub mod hero;
pub mod history;
pub mod product;
pub mod tag;
pub mod user;
pub mod video;

/// Body limit for routes taking a single uploaded file.
pub fn single_upload_limit(storage: &StorageConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(body_allowance(storage.max_upload_size, 1))
}

/// Body limit for routes that also accept a `gallery[]` batch.
pub fn gallery_upload_limit(storage: &StorageConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(body_allowance(
        storage.max_upload_size,
        storage.max_gallery_files + 1,
    ))
}

/// Room for `files` uploads plus 64 KiB of text fields and multipart framing.
fn body_allowance(max_upload_size: u64, files: usize) -> usize {
    let per_file = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    per_file.saturating_mul(files).saturating_add(64 * 1024)
}
