//! Directory-backed bucket.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{temp_path, validate_object_path, BlobStore, PUBLIC_OBJECT_PREFIX, TEMP_SUFFIX};

/// Bucket stored as `<root>/<bucket>/<object path>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
    bucket: String,
    public_prefix: String,
}

impl FsBlobStore {
    /// Store rooted at `root`; the bucket directory is created if missing.
    pub fn create(root: &Path, bucket: &str, public_base_url: &str) -> Result<Self> {
        let store = Self::new(root, bucket, public_base_url);
        fs::create_dir_all(&store.dir)
            .with_context(|| format!("failed to create bucket dir: {}", store.dir.display()))?;
        Ok(store)
    }

    /// Store rooted at `root` without touching the filesystem.
    pub fn new(root: &Path, bucket: &str, public_base_url: &str) -> Self {
        Self {
            dir: root.join(bucket),
            bucket: bucket.to_string(),
            public_prefix: format!(
                "{}{}/{}",
                public_base_url.trim_end_matches('/'),
                PUBLIC_OBJECT_PREFIX,
                bucket
            ),
        }
    }

    /// Directory holding this bucket's objects.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_object_path(path)?;
        Ok(self.dir.join(path))
    }
}

impl BlobStore for FsBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let final_path = self.resolve(path)?;
        if !self.dir.is_dir() {
            anyhow::bail!("bucket {} not found", self.bucket);
        }
        if final_path.exists() {
            anyhow::bail!("object already exists: {}", path);
        }
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(&final_path);
        let mut file = File::create(&tmp)
            .with_context(|| format!("failed to create temp file: {}", tmp.display()))?;
        file.write_all(data).context("object write failed")?;
        file.sync_all().context("object sync failed")?;
        drop(file);
        fs::rename(&tmp, &final_path).with_context(|| {
            format!("failed to rename {} to {}", tmp.display(), final_path.display())
        })?;
        tracing::debug!(bucket = %self.bucket, path, bytes = data.len(), "object stored");
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let p = self.resolve(path)?;
        match fs::read(&p) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", p.display())),
        }
    }

    fn list(&self, folder: &str, limit: usize) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            anyhow::bail!("bucket {} not found", self.bucket);
        }
        let folder = folder.trim_matches('/');
        let dir = if folder.is_empty() {
            self.dir.clone()
        } else {
            self.resolve(folder)?
        };
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("failed to list {}", dir.display())),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            names.push(if folder.is_empty() {
                name
            } else {
                format!("{}/{}", folder, name)
            });
        }
        names.sort();
        names.truncate(limit);
        Ok(names)
    }

    fn remove(&self, path: &str) -> Result<bool> {
        let p = self.resolve(path)?;
        match fs::remove_file(&p) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", p.display())),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::create(dir.path(), "plant-images", "http://localhost:3000/").unwrap();

        store.put("plants/b.jpg", b"bbb").unwrap();
        store.put("plants/a.jpg", b"aaa").unwrap();
        assert!(store.put("plants/a.jpg", b"again").is_err());

        assert_eq!(store.get("plants/a.jpg").unwrap().as_deref(), Some(&b"aaa"[..]));
        assert_eq!(store.get("plants/missing.jpg").unwrap(), None);
        assert_eq!(
            store.list("plants", 10).unwrap(),
            vec!["plants/a.jpg".to_string(), "plants/b.jpg".to_string()]
        );
        assert_eq!(store.list("plants", 1).unwrap().len(), 1);

        assert!(store.remove("plants/a.jpg").unwrap());
        assert!(!store.remove("plants/a.jpg").unwrap());
        assert!(!dir.path().join("plant-images/plants/a.jpg.part").exists());
    }

    #[test]
    fn public_url_has_stable_prefix() {
        let store = FsBlobStore::new(Path::new("/srv"), "plant-images", "https://plants.example.org/");
        assert_eq!(
            store.public_url("plants/1-ab.jpg"),
            "https://plants.example.org/storage/v1/object/public/plant-images/plants/1-ab.jpg"
        );
    }

    #[test]
    fn missing_bucket_fails_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(&dir.path().join("nope"), "plant-images", "http://x");
        assert!(store.list("plants", 1).is_err());
        assert!(store.put("plants/a.jpg", b"x").is_err());
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::create(dir.path(), "plant-images", "http://x").unwrap();
        assert!(store.put("../escape.jpg", b"x").is_err());
        assert!(store.get("plants/../../etc/passwd").is_err());
    }
}
