//! HTTP handler functions for the quake map API.

use std::path::Path;

use actix_web::{HttpResponse, web};
use quake_map_analytics::daily_frequency;
use quake_map_catalog::FetchError;
use quake_map_event_models::NormalizedEvent;
use quake_map_render::{RegionProfile, RenderError};
use quake_map_server_models::{
    HealthResponse, MessageResponse, NO_DATA_MESSAGE, ReportRequest, ReportResponse,
    ValidationError,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/report`
///
/// Runs the full report pipeline: validate the request, query the
/// catalog, normalize, aggregate, and render the map image.
pub async fn report(state: web::Data<AppState>, body: web::Json<ReportRequest>) -> HttpResponse {
    match build_report(&state, &body).await {
        Ok(Outcome::Report(response)) => HttpResponse::Ok().json(response),
        Ok(Outcome::NoData) => HttpResponse::Ok().json(MessageResponse {
            message: NO_DATA_MESSAGE.to_string(),
        }),
        Err(failure) => failure.to_response(),
    }
}

/// What a report request produced: a rendered report, or nothing usable
/// in the window.
enum Outcome {
    Report(ReportResponse),
    NoData,
}

#[derive(Debug, thiserror::Error)]
enum ReportFailure {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("catalog fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl ReportFailure {
    fn to_response(&self) -> HttpResponse {
        match self {
            Self::Validation(error) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": error.to_string() }))
            }
            Self::Fetch(error) => {
                log::error!("Catalog fetch failed: {error}");
                HttpResponse::BadGateway()
                    .json(serde_json::json!({ "error": "Could not reach the earthquake catalog" }))
            }
            Self::Render(error) => {
                log::error!("Report rendering failed: {error}");
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Could not render the report image" }))
            }
        }
    }
}

async fn build_report(state: &AppState, request: &ReportRequest) -> Result<Outcome, ReportFailure> {
    let filter = request.to_filter()?;
    let events = state
        .catalog
        .fetch_events(&filter, state.region.utc_offset())
        .await?;

    let region = state.region.clone();
    let output_dir = state.output_dir.clone();
    web::block(move || complete_report(&region, &output_dir, events))
        .await
        .map_err(|error| RenderError::Io(std::io::Error::other(error)))?
}

/// The post-fetch half of the pipeline: aggregate, render, and assemble
/// the response. An empty batch short-circuits before any file is
/// touched.
fn complete_report(
    region: &RegionProfile,
    output_dir: &Path,
    events: Vec<NormalizedEvent>,
) -> Result<Outcome, ReportFailure> {
    if events.is_empty() {
        return Ok(Outcome::NoData);
    }

    let table = daily_frequency(&events);
    let rendered = quake_map_render::render_report(region, &events, &table, output_dir)?;

    Ok(Outcome::Report(ReportResponse {
        image_url: format!("/maps/{}", rendered.file_name),
        table_data: events,
        daily_counts: table.display_rows(),
    }))
}
