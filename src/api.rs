//! API server for club-scout.

use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Semaphore;
use warp::{Filter, Rejection, Reply, http::StatusCode};

use crate::error::AppError;
use crate::export::export_leads;
use crate::fetcher::PageFetcher;
use crate::models::{CollectRequest, CollectResponse};
use crate::pipeline::LeadPipeline;

/// Plain status reply
#[derive(Serialize)]
struct ApiMessage {
    success: bool,
    message: String,
}

fn message(success: bool, text: impl Into<String>) -> warp::reply::Json {
    warp::reply::json(&ApiMessage {
        success,
        message: text.into(),
    })
}

/// Start the API server
pub(crate) async fn start_api_server<F>(pipeline: LeadPipeline<F>, port: u16)
where
    F: PageFetcher + 'static,
{
    let routes = routes(Arc::new(pipeline));
    tracing::info!(target: "api", "Starting API server on port {}", port);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

pub(crate) fn routes<F>(
    pipeline: Arc<LeadPipeline<F>>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone
where
    F: PageFetcher + 'static,
{
    let output_dir = pipeline.config().output_dir.clone();
    let pipeline_filter = warp::any().map(move || pipeline.clone());

    // One run at a time keeps outbound traffic sequential across requests.
    let run_slot = Arc::new(Semaphore::new(1));
    let slot_filter = warp::any().map(move || run_slot.clone());

    let root = warp::path::end()
        .and(warp::get())
        .map(|| "Club Scout API is running!");

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| message(true, "Club Scout API is running"));

    let collect = warp::path("collect")
        .or(warp::path("coletar"))
        .unify()
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(pipeline_filter)
        .and(slot_filter)
        .and_then(handle_collect::<F>);

    let downloads = warp::path("downloads").and(warp::fs::dir(output_dir));

    root.or(health)
        .or(collect)
        .or(downloads)
        .with(warp::cors().allow_any_origin())
        .recover(handle_rejection)
}

async fn handle_collect<F>(
    request: CollectRequest,
    pipeline: Arc<LeadPipeline<F>>,
    run_slot: Arc<Semaphore>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Rejection>
where
    F: PageFetcher + 'static,
{
    let _permit = run_slot
        .acquire()
        .await
        .map_err(|_| warp::reject::custom(ApiError))?;

    let league_name = pipeline.league_name_or_default(request.league_name.as_deref());
    tracing::info!(target: "api", "Collect request for league '{}'", league_name);

    let records = match pipeline
        .run(
            Some(&league_name),
            request.league_url.as_deref(),
            request.max_clubs,
        )
        .await
    {
        Ok(records) => records,
        Err(AppError::MissingInput(reason)) => {
            tracing::warn!(target: "api", "Rejected collect request: {}", reason);
            return Ok(warp::reply::with_status(
                message(false, reason),
                StatusCode::BAD_REQUEST,
            ));
        }
        Err(e) => {
            tracing::error!(target: "api", "Run failed: {}", e);
            return Ok(warp::reply::with_status(
                message(false, e.to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let path = match export_leads(&records, &league_name, &pipeline.config().output_dir) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(target: "api", "Export failed: {}", e);
            return Ok(warp::reply::with_status(
                message(false, format!("Export failed: {}", e)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let response = CollectResponse {
        summary: format!(
            "Processed {} clubs for league {}.",
            records.len(),
            league_name
        ),
        download_url: format!(
            "{}/downloads/{}",
            pipeline.config().public_base_url,
            file_name
        ),
        leads: records,
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        StatusCode::OK,
    ))
}

/// Custom error type for API rejections
#[derive(Debug)]
struct ApiError;

impl warp::reject::Reject for ApiError {}

/// Handle API rejections
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (text, status) = if err.is_not_found() {
        ("Not Found", StatusCode::NOT_FOUND)
    } else if err.find::<ApiError>().is_some() {
        ("Server error", StatusCode::INTERNAL_SERVER_ERROR)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ("Method not allowed", StatusCode::METHOD_NOT_ALLOWED)
    } else {
        ("Bad request", StatusCode::BAD_REQUEST)
    };
    Ok(warp::reply::with_status(message(false, text), status))
}
