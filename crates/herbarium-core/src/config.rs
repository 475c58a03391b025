use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Environment variable holding the hosted service base URL.
pub const SERVICE_URL_VAR: &str = "HERBARIUM_SERVICE_URL";
/// Environment variable holding the anonymous public key of the hosted service.
pub const ANON_KEY_VAR: &str = "HERBARIUM_ANON_KEY";

/// Image upload parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted upload in bytes, checked before any processing.
    pub max_bytes: u64,
    /// Images wider than this are scaled down (aspect ratio preserved).
    pub max_width: u32,
    /// JPEG quality used when re-encoding (1-100).
    pub jpeg_quality: u8,
    /// Abort the store call after this many seconds.
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            max_width: 1200,
            jpeg_quality: 70,
            timeout_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/herbarium/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HerbariumConfig {
    /// Socket address the HTTP server binds to.
    pub listen_addr: String,
    /// Externally visible base URL; used for the OAuth callback and public image URLs.
    pub public_base_url: String,
    /// SQLite database file. Defaults to the XDG state directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Root directory of the object store. Defaults to `<state>/buckets`.
    #[serde(default)]
    pub bucket_dir: Option<PathBuf>,
    /// Plants per page on the public listing.
    pub page_size: u32,
    /// Number of featured plants shown on the home page.
    pub featured_limit: u32,
    /// Minimum stock applied when a form leaves it empty.
    pub default_minimum_stock: i64,
    /// Optional upload tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub upload: Option<UploadConfig>,
}

impl Default for HerbariumConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            public_base_url: "http://127.0.0.1:3000".to_string(),
            database_path: None,
            bucket_dir: None,
            page_size: 12,
            featured_limit: 3,
            default_minimum_stock: 5,
            upload: None,
        }
    }
}

impl HerbariumConfig {
    pub fn upload(&self) -> UploadConfig {
        self.upload.clone().unwrap_or_default()
    }

    /// Database path from config, or `<state>/herbarium.db`.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("herbarium.db")),
        }
    }

    /// Object store root from config, or `<state>/buckets`.
    pub fn bucket_dir(&self) -> Result<PathBuf> {
        match &self.bucket_dir {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("buckets")),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}

/// XDG state directory for herbarium (`~/.local/state/herbarium`).
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("herbarium")?;
    Ok(xdg_dirs.get_state_home().join("herbarium"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("herbarium")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HerbariumConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HerbariumConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HerbariumConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Credentials for the hosted identity provider, taken from the environment.
#[derive(Clone)]
pub struct ServiceCredentials {
    pub service_url: String,
    pub anon_key: String,
}

impl fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("service_url", &self.service_url)
            .field("anon_key", &"<hidden>")
            .finish()
    }
}

impl ServiceCredentials {
    /// Read both required variables. Missing or blank values are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        match (get(SERVICE_URL_VAR), get(ANON_KEY_VAR)) {
            (Some(url), Some(key)) => Ok(Self {
                service_url: url.trim().trim_end_matches('/').to_string(),
                anon_key: key.trim().to_string(),
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(SERVICE_URL_VAR);
                }
                if key.is_none() {
                    missing.push(ANON_KEY_VAR);
                }
                anyhow::bail!(
                    "identity service is not configured: {} not set",
                    missing.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_values() {
        let cfg = HerbariumConfig::default();
        assert_eq!(cfg.page_size, 12);
        assert_eq!(cfg.featured_limit, 3);
        assert_eq!(cfg.default_minimum_stock, 5);
        assert_eq!(cfg.upload(), UploadConfig::default());
        assert_eq!(cfg.upload().max_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.upload().timeout_secs, 60);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = HerbariumConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: HerbariumConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.listen_addr, cfg.listen_addr);
        assert_eq!(parsed.page_size, cfg.page_size);
        assert!(parsed.database_path.is_none());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            listen_addr = "0.0.0.0:8080"
            public_base_url = "https://plants.example.org/"
            database_path = "/var/lib/herbarium/db.sqlite"
            page_size = 24
            featured_limit = 6
            default_minimum_stock = 2

            [upload]
            max_bytes = 1_000_000
            max_width = 800
            jpeg_quality = 85
            timeout_secs = 15
        "#;
        let cfg: HerbariumConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.page_size, 24);
        assert_eq!(cfg.base_url(), "https://plants.example.org");
        assert_eq!(
            cfg.database_path().unwrap(),
            PathBuf::from("/var/lib/herbarium/db.sqlite")
        );
        let upload = cfg.upload();
        assert_eq!(upload.max_bytes, 1_000_000);
        assert_eq!(upload.max_width, 800);
        assert_eq!(upload.jpeg_quality, 85);
        assert_eq!(upload.timeout_secs, 15);
    }

    #[test]
    fn credentials_require_both_variables() {
        let env: HashMap<&str, &str> = [(SERVICE_URL_VAR, "https://svc.example.co/")].into();
        let err = ServiceCredentials::from_lookup(|k| env.get(k).map(|v| v.to_string()))
            .unwrap_err()
            .to_string();
        assert!(err.contains(ANON_KEY_VAR));
        assert!(!err.contains(SERVICE_URL_VAR));

        let err = ServiceCredentials::from_lookup(|_| Some("   ".to_string()))
            .unwrap_err()
            .to_string();
        assert!(err.contains(SERVICE_URL_VAR) && err.contains(ANON_KEY_VAR));
    }

    #[test]
    fn credentials_trim_trailing_slash_and_hide_key() {
        let env: HashMap<&str, &str> = [
            (SERVICE_URL_VAR, "https://svc.example.co/"),
            (ANON_KEY_VAR, "anon-123"),
        ]
        .into();
        let creds =
            ServiceCredentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.service_url, "https://svc.example.co");
        assert_eq!(creds.anon_key, "anon-123");
        assert!(!format!("{:?}", creds).contains("anon-123"));
    }
}
