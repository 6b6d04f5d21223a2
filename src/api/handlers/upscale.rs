use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::metrics::UpscaleOutcome;
use crate::models::{RenderedImage, ScaleFactor, TransformParameters, UploadedAsset};
use crate::services::presentation::{
    clamp_display_width, render_comparison_page, render_error_page, render_index_page,
};
use crate::services::stage::{Stage, UpscaleError};
use crate::services::upscale_service::{ComparisonView, UpscaleRequest};
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Multipart form accepted by both upscale endpoints
#[derive(ToSchema)]
pub struct UpscaleForm {
    /// JPEG or PNG image
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Upscale factor, 1 to 4 (default 2)
    pub scale_factor: Option<u8>,
    /// Width of each comparison panel in pixels
    pub display_width: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct UpscaleResponse {
    pub public_id: String,
    pub scale_factor: u8,
    pub transform_url: Option<String>,
    pub original: RenderedImage,
    pub upscaled: Option<RenderedImage>,
    pub error: Option<StageFailure>,
}

impl From<ComparisonView> for UpscaleResponse {
    fn from(view: ComparisonView) -> Self {
        let (upscaled, error) = match view.upscaled {
            Ok(image) => (Some(image), None),
            Err(e) => (
                None,
                Some(StageFailure {
                    stage: e.stage(),
                    message: e.to_string(),
                }),
            ),
        };

        Self {
            public_id: view.handle.to_string(),
            scale_factor: view.scale_factor.get(),
            transform_url: view.transform_url,
            original: view.original,
            upscaled,
            error,
        }
    }
}

fn rejected(message: impl Into<String>) -> UpscaleError {
    UpscaleError::InputRejected(message.into())
}

/// Reads `file`, `scale_factor` and `display_width` from the form
async fn read_upscale_form(
    mut multipart: Multipart,
    default_display_width: u32,
) -> Result<(UploadedAsset, UpscaleRequest), UpscaleError> {
    let mut asset = None;
    let mut scale_factor = ScaleFactor::default();
    let mut display_width = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("length limit exceeded") {
            rejected("Request body exceeds the maximum allowed limit")
        } else {
            rejected(err_msg)
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(|e| rejected(e.to_string()))?;

                // Browsers send an empty part when no file was picked
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                asset = Some(UploadedAsset::new(&filename, content_type.as_deref(), bytes));
            }
            "scale_factor" => {
                let raw = field.text().await.map_err(|e| rejected(e.to_string()))?;
                scale_factor = raw
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(ScaleFactor::new)
                    .ok_or_else(|| {
                        rejected(format!("Scale factor must be an integer from 1 to 4, got '{}'", raw))
                    })?;
            }
            "display_width" => {
                let raw = field.text().await.map_err(|e| rejected(e.to_string()))?;
                if !raw.trim().is_empty() {
                    let width = raw.trim().parse::<u32>().map_err(|_| {
                        rejected(format!("Display width must be a positive integer, got '{}'", raw))
                    })?;
                    display_width = Some(width);
                }
            }
            _ => {}
        }
    }

    let asset = asset.ok_or_else(|| rejected("No file provided"))?;
    Ok((
        asset,
        UpscaleRequest {
            params: TransformParameters::new(scale_factor),
            display_width: clamp_display_width(display_width, default_display_width),
        },
    ))
}

/// The upload form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index_page(state.config.display_width))
}

fn html_failure(err: UpscaleError) -> Response {
    let page = render_error_page(&err);
    let outcome = UpscaleOutcome::failed(&err);
    let status = AppError::from(err).status();
    (status, Extension(outcome), Html(page)).into_response()
}

/// Form submission: runs the flow and renders the comparison page
pub async fn upscale_page(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (asset, request) = match read_upscale_form(multipart, state.config.display_width).await {
        Ok(form) => form,
        Err(e) => return html_failure(e),
    };

    match state.service.process(asset, request).await {
        Ok(view) => (
            Extension(UpscaleOutcome::from_view(&view)),
            Html(render_comparison_page(&view)),
        )
            .into_response(),
        Err(e) => html_failure(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/upscale",
    request_body(content = UpscaleForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image upscaled", body = UpscaleResponse),
        (status = 400, description = "Unsupported or missing file"),
        (status = 422, description = "Original image could not be decoded"),
        (status = 502, description = "Remote upload or fetch failed; original still described", body = UpscaleResponse)
    ),
    tag = "upscale"
)]
pub async fn upscale_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let processed = match read_upscale_form(multipart, state.config.display_width).await {
        Ok((asset, request)) => state.service.process(asset, request).await,
        Err(e) => Err(e),
    };

    let view = match processed {
        Ok(view) => view,
        Err(e) => {
            let outcome = UpscaleOutcome::failed(&e);
            return (Extension(outcome), AppError::from(e)).into_response();
        }
    };

    let status = match &view.upscaled {
        Ok(_) => StatusCode::OK,
        Err(UpscaleError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Err(_) => StatusCode::BAD_GATEWAY,
    };
    let outcome = UpscaleOutcome::from_view(&view);
    (status, Extension(outcome), Json(UpscaleResponse::from(view))).into_response()
}
