use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::aggregate::TokenFrequency;
use crate::dashboard::{self, MARKER_RENDER_CAP};
use crate::error::{Result, StaylensError};
use crate::facet::FacetSelection;
use crate::store::Store;

pub fn router(store: Arc<Store>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);
    Router::new()
        .route("/v1/overview", get(overview))
        .route("/v1/hosts", get(hosts))
        .route("/v1/rooms", get(rooms))
        .route("/v1/map", get(map))
        .route("/v1/listings", post(listings))
        .route("/v1/dashboard", get(full_dashboard))
        .layer(cors)
        .with_state(store)
}

/// Runs a section query on a blocking thread since the store is synchronous,
/// and maps the error taxonomy onto response codes: deterministic input
/// errors are the caller's, store failures are ours.
async fn blocking<T, F>(f: F) -> std::result::Result<Json<T>, (StatusCode, String)>
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let started = std::time::Instant::now();
    let result = tokio::task::spawn_blocking(f).await.map_err(|e| {
        warn!(error = %e, "join error");
        (StatusCode::INTERNAL_SERVER_ERROR, "join error".to_string())
    })?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(body) => {
            info!(ms = elapsed_ms, "section complete");
            Ok(Json(body))
        }
        Err(e) => {
            let status = match e {
                StaylensError::InvalidFacet(_) | StaylensError::EmptyTemplate(_) => {
                    StatusCode::BAD_REQUEST
                }
                StaylensError::MissingColumn(_) | StaylensError::NonNumericAggregate(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!(error = %e, code = %status.as_u16(), "section error");
            Err((status, e.to_string()))
        }
    }
}

async fn overview(
    State(store): State<Arc<Store>>,
) -> std::result::Result<Json<dashboard::Overview>, (StatusCode, String)> {
    blocking(move || dashboard::overview(&store)).await
}

#[derive(Deserialize)]
struct HostsParams {
    #[serde(default)]
    include_superhost: bool,
}

#[derive(Serialize)]
struct HostsResponse {
    summary: dashboard::HostSummary,
    top_hosts: Vec<dashboard::HostRow>,
    timeline: Vec<dashboard::TimelinePoint>,
    verification: Vec<TokenFrequency>,
}

async fn hosts(
    State(store): State<Arc<Store>>,
    Query(params): Query<HostsParams>,
) -> std::result::Result<Json<HostsResponse>, (StatusCode, String)> {
    blocking(move || {
        Ok(HostsResponse {
            summary: dashboard::host_summary(&store)?,
            top_hosts: dashboard::top_hosts(&store, params.include_superhost)?,
            timeline: dashboard::host_timeline(&store)?,
            verification: dashboard::verification_breakdown(&store)?,
        })
    })
    .await
}

#[derive(Serialize)]
struct RoomsResponse {
    breakdown: Vec<dashboard::RoomTypeShare>,
    room_type_options: Vec<String>,
    neighbourhood_options: Vec<String>,
}

async fn rooms(
    State(store): State<Arc<Store>>,
) -> std::result::Result<Json<RoomsResponse>, (StatusCode, String)> {
    blocking(move || {
        Ok(RoomsResponse {
            breakdown: dashboard::room_type_breakdown(&store)?,
            room_type_options: dashboard::room_type_options(&store)?,
            neighbourhood_options: dashboard::neighbourhood_options(&store)?,
        })
    })
    .await
}

async fn map(
    State(store): State<Arc<Store>>,
) -> std::result::Result<Json<Vec<dashboard::MapMarker>>, (StatusCode, String)> {
    blocking(move || dashboard::map_markers(&store, MARKER_RENDER_CAP)).await
}

#[derive(Serialize)]
struct ListingsResponse {
    top_listings: Vec<dashboard::ListingRow>,
    amenities: Vec<TokenFrequency>,
}

async fn listings(
    State(store): State<Arc<Store>>,
    Json(facets): Json<FacetSelection>,
) -> std::result::Result<Json<ListingsResponse>, (StatusCode, String)> {
    blocking(move || {
        Ok(ListingsResponse {
            top_listings: dashboard::top_listings(&store, &facets)?,
            amenities: dashboard::amenity_breakdown(&store, &facets)?,
        })
    })
    .await
}

/// A section either rendered or failed; the composite dashboard serializes
/// whichever happened so one bad query never blanks the whole page.
#[derive(Serialize)]
#[serde(untagged)]
enum Section<T> {
    Data { data: T },
    Failed { error: String },
}

fn section<T>(result: Result<T>) -> Section<T> {
    match result {
        Ok(data) => Section::Data { data },
        Err(e) => {
            warn!(error = %e, "section failed to render");
            Section::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[derive(Serialize)]
struct DashboardResponse {
    overview: Section<dashboard::Overview>,
    host_summary: Section<dashboard::HostSummary>,
    top_hosts: Section<Vec<dashboard::HostRow>>,
    host_timeline: Section<Vec<dashboard::TimelinePoint>>,
    verification: Section<Vec<TokenFrequency>>,
    room_types: Section<Vec<dashboard::RoomTypeShare>>,
    top_listings: Section<Vec<dashboard::ListingRow>>,
    amenities: Section<Vec<TokenFrequency>>,
    map_markers: Section<Vec<dashboard::MapMarker>>,
}

async fn full_dashboard(
    State(store): State<Arc<Store>>,
) -> std::result::Result<Json<DashboardResponse>, (StatusCode, String)> {
    blocking(move || {
        let facets = FacetSelection::default();
        Ok(DashboardResponse {
            overview: section(dashboard::overview(&store)),
            host_summary: section(dashboard::host_summary(&store)),
            top_hosts: section(dashboard::top_hosts(&store, false)),
            host_timeline: section(dashboard::host_timeline(&store)),
            verification: section(dashboard::verification_breakdown(&store)),
            room_types: section(dashboard::room_type_breakdown(&store)),
            top_listings: section(dashboard::top_listings(&store, &facets)),
            amenities: section(dashboard::amenity_breakdown(&store, &facets)),
            map_markers: section(dashboard::map_markers(&store, MARKER_RENDER_CAP)),
        })
    })
    .await
}
