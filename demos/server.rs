//! Simple REST API server example for the rental broker.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `GET /gpus` - List available GPUs
//! - `POST /gpus/{id}/rent?duration_hours=N` - Rent a GPU
//! - `POST /gpus/{id}/return` - Return a GPU
//! - `GET /rentals` - Rental history
//!
//! The bearer token in the `Authorization` header is passed to the broker as
//! the requester without any validation.
//!
//! ## Example Usage
//!
//! ```bash
//! # List available GPUs
//! curl http://localhost:3000/gpus
//!
//! # Rent GPU 1 for two hours
//! curl -X POST "http://localhost:3000/gpus/1/rent?duration_hours=2" \
//!   -H "Authorization: Bearer alice"
//!
//! # Return it
//! curl -X POST http://localhost:3000/gpus/1/return
//!
//! # Rental history
//! curl http://localhost:3000/rentals
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use gpu_rental_rs::{Allocator, RentalError, RentalRecord, Requester, Unit, UnitId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

// === Request/Response DTOs ===

/// Query string for renting.
#[derive(Debug, Deserialize)]
pub struct RentParams {
    pub duration_hours: i64,
}

/// Response body for a successful rent.
#[derive(Debug, Serialize)]
pub struct RentResponse {
    pub success: bool,
    pub message: String,
    pub rental_details: RentalRecord,
}

/// Response body for a successful return.
#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub success: bool,
    pub message: String,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the broker.
#[derive(Clone)]
pub struct AppState {
    pub allocator: Arc<Allocator>,
}

// === Error Handling ===

/// Wrapper for converting `RentalError` into HTTP responses.
pub struct AppError(RentalError);

impl From<RentalError> for AppError {
    fn from(err: RentalError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            RentalError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            RentalError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            RentalError::Unavailable => (StatusCode::CONFLICT, "UNAVAILABLE"),
            RentalError::AlreadyAvailable => (StatusCode::CONFLICT, "ALREADY_AVAILABLE"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

/// Takes the bearer token as the requester, or `anonymous` without one.
fn requester(headers: &HeaderMap) -> Requester {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(Requester::from)
        .unwrap_or_else(|| Requester::from("anonymous"))
}

// === Handlers ===

/// GET /gpus - List available GPUs.
async fn list_gpus(State(state): State<AppState>) -> Json<Vec<Unit>> {
    Json(state.allocator.list_available())
}

/// POST /gpus/{id}/rent - Rent a GPU.
async fn rent_gpu(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(params): Query<RentParams>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<RentResponse>), AppError> {
    let duration_hours = u32::try_from(params.duration_hours)
        .map_err(|_| RentalError::InvalidArgument("duration must be positive"))?;
    let record = state
        .allocator
        .rent(UnitId(id), duration_hours, requester(&headers))?;

    Ok((
        StatusCode::CREATED,
        Json(RentResponse {
            success: true,
            message: "GPU rented successfully".to_string(),
            rental_details: record,
        }),
    ))
}

/// POST /gpus/{id}/return - Return a GPU.
async fn return_gpu(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ReturnResponse>, AppError> {
    state.allocator.return_unit(UnitId(id))?;

    Ok(Json(ReturnResponse {
        success: true,
        message: "GPU returned successfully".to_string(),
    }))
}

/// GET /rentals - Rental history.
async fn list_rentals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Vec<RentalRecord>> {
    Json(state.allocator.history(&requester(&headers)).into_iter().collect())
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/gpus", get(list_gpus))
        .route("/gpus/{id}/rent", post(rent_gpu))
        .route("/gpus/{id}/return", post(return_gpu))
        .route("/rentals", get(list_rentals))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState {
        allocator: Arc::new(Allocator::default()),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    info!("GPU rental API server running on http://127.0.0.1:3000");
    info!("  GET  /gpus                               - List available GPUs");
    info!("  POST /gpus/{{id}}/rent?duration_hours=N    - Rent a GPU");
    info!("  POST /gpus/{{id}}/return                   - Return a GPU");
    info!("  GET  /rentals                            - Rental history");

    axum::serve(listener, app).await?;
    Ok(())
}
