//! `herbarium check-storage` – bucket diagnostic.

use anyhow::Result;
use herbarium_core::config::HerbariumConfig;
use herbarium_core::storage::FsBlobStore;
use herbarium_core::upload::{self, check_storage};

pub fn run_check_storage(cfg: &HerbariumConfig) -> Result<()> {
    let root = cfg.bucket_dir()?;
    let store = FsBlobStore::new(&root, upload::BUCKET, cfg.base_url());
    let report = check_storage(&store);

    println!("bucket:      {}", report.bucket);
    println!("directory:   {}", store.dir().display());
    println!("accessible:  {}", if report.accessible { "yes" } else { "no" });
    println!("objects:     {} in {}/", report.objects_in_folder, upload::FOLDER);
    println!("public URL:  {}", report.sample_public_url);
    if let Some(err) = &report.error {
        println!("error:       {}", err);
    }
    if !report.is_ready() {
        anyhow::bail!("storage bucket {} is not ready", report.bucket);
    }
    println!("Storage is ready.");
    Ok(())
}
