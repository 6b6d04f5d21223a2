use crate::config::AppConfig;
use crate::services::asset_store::{AssetStore, CloudinaryAssetStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn setup_asset_store(config: &AppConfig) -> Result<Arc<dyn AssetStore>> {
    let cloudinary = &config.cloudinary;
    info!(
        "☁️  Cloudinary: cloud '{}' (API: {}, delivery: {})",
        cloudinary.cloud_name, cloudinary.api_base_url, cloudinary.delivery_base_url
    );

    let store = CloudinaryAssetStore::new(
        cloudinary.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )
    .context("Failed to build HTTP client")?;

    if store.health_check().await {
        info!("✅ Cloudinary credentials accepted");
    } else {
        warn!("⚠️  Cloudinary ping failed; uploads will fail until it is reachable");
    }

    Ok(Arc::new(store))
}
