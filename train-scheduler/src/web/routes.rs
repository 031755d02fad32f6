//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::domain::{DomainError, StationId, TrackSegmentId, TrainId, TripId};
use crate::schedule::ScheduleError;
use crate::store::RegistryError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/stations", post(create_station).get(list_stations))
        .route(
            "/stations/:id",
            get(get_station).put(update_station).delete(delete_station),
        )
        .route("/trains", post(create_train).get(list_trains))
        .route(
            "/trains/:id",
            get(get_train).put(update_train).delete(delete_train),
        )
        .route("/segments", post(create_segment).get(list_segments))
        .route(
            "/segments/:id",
            get(get_segment).put(update_segment).delete(delete_segment),
        )
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/conflicts/check", post(check_conflicts))
        .route(
            "/trips/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/trips/:id/segments", get(get_trip_segments));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// Stations

async fn create_station(
    State(state): State<AppState>,
    Json(req): Json<CreateStationRequest>,
) -> Result<(StatusCode, Json<StationResponse>), AppError> {
    let (name, num_tracks) = req.parse()?;
    let station = state.store().create_station(name, num_tracks).await?;
    Ok((StatusCode::CREATED, Json((&station).into())))
}

async fn list_stations(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Json<Vec<StationResponse>> {
    let limit = state.config.page_limit(page.limit);
    let stations = state.store().list_stations(page.skip, limit).await;
    Json(stations.iter().map(Into::into).collect())
}

async fn get_station(
    State(state): State<AppState>,
    Path(id): Path<StationId>,
) -> Result<Json<StationResponse>, AppError> {
    let station = state
        .store()
        .get_station(id)
        .await
        .ok_or(RegistryError::StationNotFound(id))?;
    Ok(Json((&station).into()))
}

async fn update_station(
    State(state): State<AppState>,
    Path(id): Path<StationId>,
    Json(req): Json<UpdateStationRequest>,
) -> Result<Json<StationResponse>, AppError> {
    let patch = req.parse()?;
    let station = state.store().update_station(id, patch).await?;
    Ok(Json((&station).into()))
}

async fn delete_station(
    State(state): State<AppState>,
    Path(id): Path<StationId>,
) -> Result<StatusCode, AppError> {
    state.store().delete_station(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Trains

async fn create_train(
    State(state): State<AppState>,
    Json(req): Json<CreateTrainRequest>,
) -> Result<(StatusCode, Json<TrainResponse>), AppError> {
    let (code, description) = req.parse()?;
    let train = state.store().create_train(code, description).await?;
    Ok((StatusCode::CREATED, Json((&train).into())))
}

async fn list_trains(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Json<Vec<TrainResponse>> {
    let limit = state.config.page_limit(page.limit);
    let trains = state.store().list_trains(page.skip, limit).await;
    Json(trains.iter().map(Into::into).collect())
}

async fn get_train(
    State(state): State<AppState>,
    Path(id): Path<TrainId>,
) -> Result<Json<TrainResponse>, AppError> {
    let train = state
        .store()
        .get_train(id)
        .await
        .ok_or(RegistryError::TrainNotFound(id))?;
    Ok(Json((&train).into()))
}

async fn update_train(
    State(state): State<AppState>,
    Path(id): Path<TrainId>,
    Json(req): Json<UpdateTrainRequest>,
) -> Result<Json<TrainResponse>, AppError> {
    let patch = req.parse()?;
    let train = state.store().update_train(id, patch).await?;
    Ok(Json((&train).into()))
}

async fn delete_train(
    State(state): State<AppState>,
    Path(id): Path<TrainId>,
) -> Result<StatusCode, AppError> {
    state.store().delete_train(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Track segments

async fn create_segment(
    State(state): State<AppState>,
    Json(req): Json<CreateSegmentRequest>,
) -> Result<(StatusCode, Json<SegmentResponse>), AppError> {
    let new = req.parse()?;
    let segment = state.store().create_segment(new).await?;
    Ok((StatusCode::CREATED, Json((&segment).into())))
}

async fn list_segments(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Json<Vec<SegmentResponse>> {
    let limit = state.config.page_limit(page.limit);
    let segments = state.store().list_segments(page.skip, limit).await;
    Json(segments.iter().map(Into::into).collect())
}

async fn get_segment(
    State(state): State<AppState>,
    Path(id): Path<TrackSegmentId>,
) -> Result<Json<SegmentResponse>, AppError> {
    let segment = state
        .store()
        .get_segment(id)
        .await
        .ok_or(RegistryError::SegmentNotFound(id))?;
    Ok(Json((&segment).into()))
}

/// Update a track segment.
///
/// Runs under the segment's scheduling lock so a flip to single-track cannot
/// interleave with a trip being committed on it.
async fn update_segment(
    State(state): State<AppState>,
    Path(id): Path<TrackSegmentId>,
    Json(req): Json<UpdateSegmentRequest>,
) -> Result<Json<SegmentResponse>, AppError> {
    let patch = req.parse()?;
    let segment = state
        .scheduler
        .exclusive_on_segment(id, state.store().update_segment(id, patch))
        .await?;
    Ok(Json((&segment).into()))
}

async fn delete_segment(
    State(state): State<AppState>,
    Path(id): Path<TrackSegmentId>,
) -> Result<StatusCode, AppError> {
    state.store().delete_segment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Trips

async fn create_trip(
    State(state): State<AppState>,
    Json(req): Json<TripRequest>,
) -> Result<(StatusCode, Json<TripResponse>), AppError> {
    let proposed = req.to_proposed()?;
    let trip = state.scheduler.create_trip(proposed).await?;
    Ok((StatusCode::CREATED, Json((&trip).into())))
}

async fn check_conflicts(
    State(state): State<AppState>,
    Json(req): Json<TripRequest>,
) -> Result<Json<ConflictCheckResponse>, AppError> {
    let proposed = req.to_proposed()?;
    let conflicts = state.scheduler.check_conflicts(&proposed).await?;
    Ok(Json(ConflictCheckResponse::new(&conflicts)))
}

async fn list_trips(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<TripResponse>>, AppError> {
    let limit = state.config.page_limit(page.limit);
    let trips = state.scheduler.list_trips(page.skip, limit).await?;
    Ok(Json(trips.iter().map(Into::into).collect()))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<TripId>,
) -> Result<Json<TripResponse>, AppError> {
    let trip = state.scheduler.get_trip(id).await?;
    Ok(Json((&trip).into()))
}

async fn get_trip_segments(
    State(state): State<AppState>,
    Path(id): Path<TripId>,
) -> Result<Json<TripResponse>, AppError> {
    let details = state.scheduler.trip_details(id).await?;
    Ok(Json((&details).into()))
}

async fn update_trip(
    State(state): State<AppState>,
    Path(id): Path<TripId>,
    Json(req): Json<UpdateTripRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let status = req.status.ok_or_else(|| AppError::BadRequest {
        message: "no fields to update".to_string(),
    })?;
    let trip = state.scheduler.update_status(id, status).await?;
    Ok(Json((&trip).into()))
}

async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<TripId>,
) -> Result<StatusCode, AppError> {
    state.scheduler.delete_trip(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Unprocessable { message: String },
    Conflict {
        message: String,
        conflicts: Vec<ConflictResponse>,
    },
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::Unprocessable {
            message: e.to_string(),
        }
    }
}

impl From<TripRequestError> for AppError {
    fn from(e: TripRequestError) -> Self {
        AppError::Unprocessable {
            message: e.to_string(),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        let message = e.to_string();
        match e {
            RegistryError::StationNotFound(_)
            | RegistryError::TrainNotFound(_)
            | RegistryError::SegmentNotFound(_) => AppError::NotFound { message },
            RegistryError::SingleTrackConflict { .. } => AppError::Conflict {
                message,
                conflicts: Vec::new(),
            },
            RegistryError::Invalid(_) => AppError::Unprocessable { message },
            RegistryError::DuplicateStationName(_)
            | RegistryError::DuplicateTrainCode(_)
            | RegistryError::DuplicateSegment(..)
            | RegistryError::StationInUse(_)
            | RegistryError::TrainHasTrips(_)
            | RegistryError::SegmentInUse(_) => AppError::BadRequest { message },
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(e: ScheduleError) -> Self {
        let message = e.to_string();
        match e {
            ScheduleError::Structure(_) => AppError::Unprocessable { message },
            ScheduleError::Reference(_) => AppError::BadRequest { message },
            ScheduleError::TripNotFound(_) => AppError::NotFound { message },
            ScheduleError::InvalidTransition { .. } => AppError::Conflict {
                message,
                conflicts: Vec::new(),
            },
            ScheduleError::Conflict(conflicts) => AppError::Conflict {
                message,
                conflicts: conflicts.iter().map(Into::into).collect(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, conflicts) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message, Vec::new()),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message, Vec::new()),
            AppError::Unprocessable { message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message, Vec::new())
            }
            AppError::Conflict { message, conflicts } => {
                (StatusCode::CONFLICT, message, conflicts)
            }
        };

        if status == StatusCode::NOT_FOUND {
            info!(%status, %message, "request rejected");
        } else {
            warn!(%status, %message, conflicts = conflicts.len(), "request rejected");
        }

        let body = Json(ErrorResponse {
            error: message,
            conflicts,
        });
        (status, body).into_response()
    }
}
