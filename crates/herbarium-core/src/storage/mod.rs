//! Object storage for uploaded images.
//!
//! A bucket maps object paths (`plants/<name>.jpg`) to bytes and hands out
//! stable public URLs. `FsBlobStore` keeps each bucket in a directory and
//! writes objects through a `.part` temp file renamed into place.

mod fs;

pub use fs::FsBlobStore;

use anyhow::Result;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path prefix under which public objects are served.
pub const PUBLIC_OBJECT_PREFIX: &str = "/storage/v1/object/public";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.jpg` → `a.jpg.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}

/// A single bucket. Calls block; async callers go through `spawn_blocking`.
pub trait BlobStore: Send + Sync {
    /// Bucket name, e.g. `plant-images`.
    fn bucket(&self) -> &str;

    /// Store a new object. Fails if the path is taken.
    fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Object paths directly inside `folder`, sorted, at most `limit`.
    /// Fails when the bucket itself is missing or unreadable.
    fn list(&self, folder: &str, limit: usize) -> Result<Vec<String>>;

    /// Delete an object. Returns false if it did not exist.
    fn remove(&self, path: &str) -> Result<bool>;

    /// Stable unauthenticated URL for an object path.
    fn public_url(&self, path: &str) -> String;
}

/// Check an object path: relative, `/`-separated, no empty, `.` or `..` parts.
pub fn validate_object_path(path: &str) -> Result<()> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        anyhow::bail!("invalid object path: {:?}", path);
    }
    for part in path.split('/') {
        if part.is_empty() || part == "." || part == ".." || part.ends_with(TEMP_SUFFIX) {
            anyhow::bail!("invalid object path: {:?}", path);
        }
    }
    Ok(())
}
