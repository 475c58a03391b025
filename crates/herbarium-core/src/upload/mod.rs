//! Plant image upload: validate, resize, store, return the public URL.
//!
//! Type and size are checked before any decoding or storage call. The store
//! call is bounded by the configured timeout and never retried.

pub mod resize;

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::config::UploadConfig;
use crate::storage::BlobStore;

/// Bucket that holds plant images.
pub const BUCKET: &str = "plant-images";
/// Folder inside the bucket.
pub const FOLDER: &str = "plants";
/// Declared content types accepted for upload.
pub const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Invalid file type. Only JPEG, PNG, and WebP are allowed.")]
    UnsupportedType(String),
    #[error("File too large. Maximum size is {}.", format_file_size(*max))]
    TooLarge { size: u64, max: u64 },
    #[error("Could not read image: {0}")]
    Decode(String),
    #[error("Storage bucket \"{bucket}\" is not accessible: {reason}")]
    BucketUnavailable { bucket: String, reason: String },
    #[error("Upload timeout after {0} seconds. Try a smaller image or check your connection.")]
    Timeout(u64),
    #[error("Upload failed: {0}")]
    Storage(String),
}

/// Human-readable size with binary units, e.g. `1.5 KB`, `5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Reject anything whose declared type or size is not acceptable.
pub fn validate_image(content_type: &str, size: u64, max_bytes: u64) -> Result<(), UploadError> {
    let declared = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_TYPES.contains(&declared.as_str()) {
        return Err(UploadError::UnsupportedType(declared));
    }
    if size > max_bytes {
        return Err(UploadError::TooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// Object path for stored bytes: `plants/<unix-millis>-<8 hex of sha256>.jpg`.
pub fn object_name(unix_millis: u128, data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let short = hex::encode(&digest[..4]);
    format!("{}/{}-{}.jpg", FOLDER, unix_millis, short)
}

/// Object path from a public URL (everything after `/<bucket>/`).
pub fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{}/", bucket);
    let (_, rest) = url.split_once(&marker)?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Incoming image as received by the upload route.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Stored image details.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Validate, resize, and store an image. Returns its public URL.
pub async fn upload_plant_image(
    store: Arc<dyn BlobStore>,
    upload: ImageUpload,
    cfg: &UploadConfig,
) -> Result<UploadedImage, UploadError> {
    let ImageUpload {
        filename,
        content_type,
        data,
    } = upload;
    validate_image(&content_type, data.len() as u64, cfg.max_bytes)?;
    tracing::info!(
        filename = filename.as_deref().unwrap_or("-"),
        content_type = %content_type,
        size = %format_file_size(data.len() as u64),
        "image upload accepted"
    );

    let (max_width, quality) = (cfg.max_width, cfg.jpeg_quality);
    let (jpeg, width, height) =
        tokio::task::spawn_blocking(move || resize::resize_to_jpeg(&data, max_width, quality))
            .await
            .map_err(|e| UploadError::Storage(e.to_string()))??;
    let path = object_name(unix_millis(), &jpeg);
    let bytes = jpeg.len();

    let timeout = Duration::from_secs(cfg.timeout_secs);
    let put_store = Arc::clone(&store);
    let put_path = path.clone();
    let stored = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || -> Result<(), UploadError> {
            put_store
                .list(FOLDER, 1)
                .map_err(|e| UploadError::BucketUnavailable {
                    bucket: put_store.bucket().to_string(),
                    reason: format!("{:#}", e),
                })?;
            put_store
                .put(&put_path, &jpeg)
                .map_err(|e| UploadError::Storage(format!("{:#}", e)))
        }),
    )
    .await;

    match stored {
        Err(_) => {
            tracing::warn!(path = %path, secs = cfg.timeout_secs, "image upload timed out");
            return Err(UploadError::Timeout(cfg.timeout_secs));
        }
        Ok(Err(join)) => return Err(UploadError::Storage(join.to_string())),
        Ok(Ok(result)) => result?,
    }

    let url = store.public_url(&path);
    tracing::info!(path = %path, width, height, bytes, "image stored");
    Ok(UploadedImage {
        url,
        path,
        width,
        height,
        bytes,
    })
}

/// Remove the object behind a public URL. Returns false for URLs that do not
/// point into the bucket and for failed deletions.
pub fn delete_plant_image(store: &dyn BlobStore, url: &str) -> bool {
    let Some(path) = object_path_from_url(url, store.bucket()) else {
        tracing::warn!(url, "not an image url of this bucket");
        return false;
    };
    match store.remove(&path) {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!(path = %path, error = %format!("{:#}", e), "image delete failed");
            false
        }
    }
}

/// Result of the storage diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct StorageReport {
    pub bucket: String,
    pub accessible: bool,
    pub error: Option<String>,
    pub objects_in_folder: usize,
    pub sample_public_url: String,
}

impl StorageReport {
    pub fn is_ready(&self) -> bool {
        self.accessible && !self.sample_public_url.is_empty()
    }
}

/// Check the bucket can be listed and public URLs can be produced.
pub fn check_storage(store: &dyn BlobStore) -> StorageReport {
    let sample_public_url = store.public_url(&format!("{}/test.jpg", FOLDER));
    match store.list(FOLDER, usize::MAX) {
        Ok(objects) => StorageReport {
            bucket: store.bucket().to_string(),
            accessible: true,
            error: None,
            objects_in_folder: objects.len(),
            sample_public_url,
        },
        Err(e) => StorageReport {
            bucket: store.bucket().to_string(),
            accessible: false,
            error: Some(format!("{:#}", e)),
            objects_in_folder: 0,
            sample_public_url,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsBlobStore;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    const MAX: u64 = 5 * 1024 * 1024;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([10, 200, 30])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn store(dir: &std::path::Path) -> Arc<FsBlobStore> {
        Arc::new(FsBlobStore::create(dir, BUCKET, "http://localhost:3000").unwrap())
    }

    #[test]
    fn validation_accepts_listed_types() {
        for t in ALLOWED_TYPES {
            assert!(validate_image(t, 10, MAX).is_ok(), "{t}");
        }
        assert!(validate_image("IMAGE/PNG; charset=binary", 10, MAX).is_ok());
    }

    #[test]
    fn validation_rejects_type_before_size() {
        assert_eq!(
            validate_image("image/gif", MAX + 1, MAX),
            Err(UploadError::UnsupportedType("image/gif".into()))
        );
        assert!(matches!(
            validate_image("image/jpeg", MAX + 1, MAX),
            Err(UploadError::TooLarge { .. })
        ));
        assert!(validate_image("image/jpeg", MAX, MAX).is_ok());
    }

    #[test]
    fn too_large_message_names_limit() {
        let e = UploadError::TooLarge { size: 6_000_000, max: MAX };
        assert_eq!(e.to_string(), "File too large. Maximum size is 5 MB.");
    }

    #[test]
    fn file_sizes_are_humanized() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn object_names_are_content_addressed() {
        let a = object_name(1_700_000_000_000, b"abc");
        assert_eq!(a, "plants/1700000000000-ba7816bf.jpg");
        assert_ne!(a, object_name(1_700_000_000_000, b"abd"));
    }

    #[test]
    fn url_maps_back_to_object_path() {
        let url = "http://localhost:3000/storage/v1/object/public/plant-images/plants/1-ab.jpg";
        assert_eq!(
            object_path_from_url(url, BUCKET).as_deref(),
            Some("plants/1-ab.jpg")
        );
        assert_eq!(object_path_from_url("https://elsewhere/x.jpg", BUCKET), None);
        assert_eq!(object_path_from_url("http://h/plant-images/", BUCKET), None);
    }

    #[tokio::test]
    async fn oversized_upload_never_reaches_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let upload = ImageUpload {
            filename: Some("big.jpg".into()),
            content_type: "image/jpeg".into(),
            data: vec![0u8; 6 * 1024 * 1024],
        };
        let err = upload_plant_image(store.clone(), upload, &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
        assert!(store.list(FOLDER, 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_stores_resized_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let cfg = UploadConfig {
            max_width: 64,
            ..UploadConfig::default()
        };
        let upload = ImageUpload {
            filename: Some("leaf.png".into()),
            content_type: "image/png".into(),
            data: png_bytes(128, 32),
        };
        let done = upload_plant_image(store.clone(), upload, &cfg).await.unwrap();
        assert_eq!((done.width, done.height), (64, 16));
        assert!(done.path.starts_with("plants/") && done.path.ends_with(".jpg"));
        assert_eq!(done.url, store.public_url(&done.path));
        assert_eq!(store.list(FOLDER, 10).unwrap(), vec![done.path.clone()]);

        assert!(delete_plant_image(store.as_ref(), &done.url));
        assert!(!delete_plant_image(store.as_ref(), &done.url));
        assert!(!delete_plant_image(store.as_ref(), "not a url"));
    }

    #[tokio::test]
    async fn missing_bucket_fails_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn BlobStore> =
            Arc::new(FsBlobStore::new(&dir.path().join("absent"), BUCKET, "http://x"));
        let upload = ImageUpload {
            filename: None,
            content_type: "image/png".into(),
            data: png_bytes(8, 8),
        };
        let err = upload_plant_image(store, upload, &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::BucketUnavailable { .. }));
    }

    #[test]
    fn storage_check_reports_state() {
        let dir = tempfile::tempdir().unwrap();
        let ok = store(dir.path());
        let report = check_storage(ok.as_ref());
        assert!(report.is_ready());
        assert_eq!(report.objects_in_folder, 0);

        let missing = FsBlobStore::new(&dir.path().join("absent"), BUCKET, "http://x");
        let report = check_storage(&missing);
        assert!(!report.accessible);
        assert!(report.error.is_some());
    }
}
