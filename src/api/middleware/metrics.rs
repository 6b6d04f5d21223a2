use crate::api::middleware::request_id::REQUEST_ID_HEADER;
use crate::models::ScaleFactor;
use crate::services::stage::{Stage, UpscaleError};
use crate::services::upscale_service::ComparisonView;
use axum::{extract::Request, middleware::Next, response::Response};
use std::fmt;
use std::time::Instant;
use tracing::info;

/// Result of an upscale run, attached to the response for the metrics line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpscaleOutcome {
    pub scale_factor: Option<ScaleFactor>,
    pub failed_stage: Option<Stage>,
}

impl UpscaleOutcome {
    pub fn from_view(view: &ComparisonView) -> Self {
        Self {
            scale_factor: Some(view.scale_factor),
            failed_stage: view.upscaled.as_ref().err().map(UpscaleError::stage),
        }
    }

    pub fn failed(err: &UpscaleError) -> Self {
        Self {
            scale_factor: None,
            failed_stage: Some(err.stage()),
        }
    }
}

impl fmt::Display for UpscaleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scale) = self.scale_factor {
            write!(f, "x{} ", scale)?;
        }
        match self.failed_stage {
            None => write!(f, "ok"),
            Some(stage) => write!(f, "{} failed", stage),
        }
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();
    let upscale = response
        .extensions()
        .get::<UpscaleOutcome>()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());

    info!(
        target: "metrics",
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        upscale = %upscale,
        "request_completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let ok = UpscaleOutcome {
            scale_factor: ScaleFactor::new(2),
            failed_stage: None,
        };
        assert_eq!(ok.to_string(), "x2 ok");

        let fetch_failed = UpscaleOutcome {
            scale_factor: ScaleFactor::new(4),
            failed_stage: Some(Stage::TransformFetch),
        };
        assert_eq!(fetch_failed.to_string(), "x4 transform fetch failed");

        let rejected = UpscaleOutcome::failed(&UpscaleError::InputRejected("gif".into()));
        assert_eq!(rejected.to_string(), "intake failed");
    }
}
