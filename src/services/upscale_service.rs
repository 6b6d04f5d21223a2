use crate::config::AppConfig;
use crate::models::{
    RemoteAssetHandle, RenderedImage, ScaleFactor, TransformParameters, UploadReceipt,
    UploadedAsset,
};
use crate::services::asset_store::AssetStore;
use crate::services::intake::{StagedUpload, stage_upload};
use crate::services::presentation::{ORIGINAL_LABEL, UPSCALED_LABEL, render_image};
use crate::services::stage::{RequestState, UpscaleError};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct UpscaleRequest {
    pub params: TransformParameters,
    pub display_width: u32,
}

/// Everything the comparison page needs. The original is decoded before the
/// remote stages run; the upscaled side carries whichever stage failed.
#[derive(Debug)]
pub struct ComparisonView {
    pub handle: RemoteAssetHandle,
    pub scale_factor: ScaleFactor,
    pub receipt: Option<UploadReceipt>,
    pub transform_url: Option<String>,
    pub original: RenderedImage,
    pub upscaled: Result<RenderedImage, UpscaleError>,
}

struct FetchedTransform {
    receipt: UploadReceipt,
    transform_url: String,
    bytes: Bytes,
}

fn advance(state: &mut RequestState, next: RequestState, handle: &RemoteAssetHandle) {
    debug_assert_eq!(state.next(), Some(next));
    debug!("🔁 {}: {:?} -> {:?}", handle, state, next);
    *state = next;
}

pub struct UpscaleService {
    store: Arc<dyn AssetStore>,
    temp_dir: PathBuf,
    max_file_size: usize,
}

impl UpscaleService {
    pub fn new(store: Arc<dyn AssetStore>, config: &AppConfig) -> Self {
        Self {
            store,
            temp_dir: config.temp_dir.clone(),
            max_file_size: config.max_file_size,
        }
    }

    /// Runs intake, remote upload, transform fetch and presentation for one upload.
    ///
    /// Intake failures and an undecodable original are returned as errors
    /// before any remote call. Remote failures end up in
    /// `ComparisonView::upscaled` next to the already rendered original.
    /// The staged file is removed on every path.
    pub async fn process(
        &self,
        asset: UploadedAsset,
        request: UpscaleRequest,
    ) -> Result<ComparisonView, UpscaleError> {
        let handle = RemoteAssetHandle::generate();
        let mut state = RequestState::Idle;

        let staged = stage_upload(&asset, &self.temp_dir, self.max_file_size)
            .await
            .inspect_err(|e| warn!("🚫 Intake rejected '{}': {}", asset.filename, e))?;
        advance(&mut state, RequestState::FileReceived, &handle);

        // An unreadable original never reaches the remote store
        let original_bytes = staged.read().await?;
        let original = render_image(ORIGINAL_LABEL, &original_bytes, request.display_width)
            .inspect_err(|e| error!("❌ Original image for {} is unreadable: {}", handle, e))?;

        let remote = self
            .upload_and_fetch(&staged, &handle, &request.params, &mut state)
            .await;

        let (receipt, transform_url, upscaled) = match remote {
            Ok(fetched) => {
                let upscaled =
                    render_image(UPSCALED_LABEL, &fetched.bytes, request.display_width);
                if upscaled.is_ok() {
                    advance(&mut state, RequestState::Rendered, &handle);
                }
                (Some(fetched.receipt), Some(fetched.transform_url), upscaled)
            }
            Err(e) => (None, None, Err(e)),
        };

        if let Err(e) = &upscaled {
            error!("❌ {} failed for {}: {}", e.stage(), handle, e);
        }

        Self::finish(staged).await;
        if state == RequestState::Rendered {
            advance(&mut state, RequestState::CleanedUp, &handle);
        }

        info!(
            "✅ Request {} done (scale {}, upscaled: {})",
            handle,
            request.params.scale_factor,
            if upscaled.is_ok() { "ok" } else { "failed" }
        );

        Ok(ComparisonView {
            handle,
            scale_factor: request.params.scale_factor,
            receipt,
            transform_url,
            original,
            upscaled,
        })
    }

    async fn upload_and_fetch(
        &self,
        staged: &StagedUpload,
        handle: &RemoteAssetHandle,
        params: &TransformParameters,
        state: &mut RequestState,
    ) -> Result<FetchedTransform, UpscaleError> {
        info!(
            "☁️  Uploading {} to {} as {}",
            staged.file_name(),
            self.store.provider_id(),
            handle
        );
        let receipt = self
            .store
            .upload_asset(staged.path(), staged.media_type(), handle)
            .await?;
        advance(state, RequestState::RemoteUploaded, handle);

        let transform_url = self.store.transform_url(handle, params);
        info!("🔍 Fetching upscaled image: {}", transform_url);
        let bytes = self.store.fetch_transformed(&transform_url).await?;
        advance(state, RequestState::TransformFetched, handle);

        Ok(FetchedTransform {
            receipt,
            transform_url,
            bytes,
        })
    }

    async fn finish(staged: StagedUpload) {
        let path = staged.path().display().to_string();
        if let Err(e) = staged.cleanup().await {
            warn!("⚠️  Failed to remove staged file {}: {}", path, e);
        }
    }
}
