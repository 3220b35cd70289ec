// Record Registry - Rental Web Server
// REST API over one shared RentalDesk (Axum)

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use record_registry::config::RegistryConfig;
use record_registry::rental::sample_fleet;
use record_registry::{
    import, init_logging, LogFormat, RegistryError, Rental, RentalDesk, RentalStatement, Vehicle,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    desk: Arc<Mutex<RentalDesk>>,
}

impl AppState {
    fn desk(&self) -> Result<MutexGuard<'_, RentalDesk>, ApiError> {
        self.desk
            .lock()
            .map_err(|_| ApiError::internal("rental desk lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Error carried back to the client as an ApiResponse
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
            RegistryError::State(_) | RegistryError::DuplicateKey { .. } => StatusCode::CONFLICT,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        (self.status, Json(ApiResponse::failure(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Vehicle response (flattened for the API)
#[derive(Serialize)]
struct VehicleResponse {
    plate: String,
    serial: u32,
    vehicle_type: String,
    make: String,
    model: String,
    tank_capacity: f64,
    daily_rate: f64,
    available: bool,
}

impl VehicleResponse {
    fn new(vehicle: &Vehicle, available: bool) -> Self {
        Self {
            plate: vehicle.plate().to_string(),
            serial: vehicle.serial(),
            vehicle_type: vehicle.vehicle_type().as_str().to_string(),
            make: vehicle.make().to_string(),
            model: vehicle.model().to_string(),
            tank_capacity: vehicle.tank_capacity(),
            daily_rate: vehicle.tariff().daily_rate,
            available,
        }
    }
}

/// Rental response
#[derive(Serialize)]
struct RentalResponse {
    id: String,
    plate: String,
    customer: String,
    status: String,
    opened_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    closed_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<f64>,
}

impl From<&Rental> for RentalResponse {
    fn from(rental: &Rental) -> Self {
        Self {
            id: rental.id().to_string(),
            plate: rental.record().to_string(),
            customer: rental.counterparty().to_string(),
            status: rental.status().as_str().to_string(),
            opened_on: rental.opened_on(),
            closed_on: rental.closed_on(),
            total: rental.total().ok().map(|charge| charge.total),
        }
    }
}

#[derive(Deserialize)]
struct StartRentalRequest {
    serial: u32,
    customer: String,
    start: NaiveDate,
}

#[derive(Deserialize)]
struct CloseRentalRequest {
    end: NaiveDate,
    distance: f64,
    #[serde(default)]
    fuel_deficit: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/vehicles - Whole fleet with availability
async fn list_vehicles(State(state): State<AppState>) -> ApiResult<Vec<VehicleResponse>> {
    let desk = state.desk()?;
    let available: Vec<String> = desk
        .available_vehicles()
        .iter()
        .map(|v| v.plate().to_string())
        .collect();

    let response = desk
        .fleet()
        .iter()
        .map(|v| VehicleResponse::new(v, available.iter().any(|p| p == v.plate())))
        .collect();

    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/vehicles/available - Vehicles with no open rental
async fn list_available(State(state): State<AppState>) -> ApiResult<Vec<VehicleResponse>> {
    let desk = state.desk()?;
    let response = desk
        .available_vehicles()
        .into_iter()
        .map(|v| VehicleResponse::new(v, true))
        .collect();

    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/rentals - All rentals, open and closed
async fn list_rentals(State(state): State<AppState>) -> ApiResult<Vec<RentalResponse>> {
    let desk = state.desk()?;
    let response = desk.rentals().iter().map(RentalResponse::from).collect();
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/rentals - Open a rental
async fn start_rental(
    State(state): State<AppState>,
    Json(request): Json<StartRentalRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RentalResponse>>), ApiError> {
    let mut desk = state.desk()?;
    let rental = desk.start_rental(request.serial, &request.customer, request.start)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(RentalResponse::from(rental)))))
}

/// POST /api/rentals/:id/close - Close a rental and return its statement
async fn close_rental(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CloseRentalRequest>,
) -> ApiResult<RentalStatement> {
    let mut desk = state.desk()?;
    desk.end_rental(&id, request.end, request.distance, request.fuel_deficit)?;
    let statement = desk.statement(&id)?;
    Ok(Json(ApiResponse::ok(statement)))
}

/// GET /api/rentals/:id/statement - Statement of a closed rental
async fn rental_statement(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<RentalStatement> {
    let desk = state.desk()?;
    Ok(Json(ApiResponse::ok(desk.statement(&id)?)))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/available", get(list_available))
        .route("/rentals", get(list_rentals).post(start_rental))
        .route("/rentals/:id/close", post(close_rental))
        .route("/rentals/:id/statement", get(rental_statement))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let log_format = std::env::var("REGISTRY_LOG_FORMAT")
        .ok()
        .map(|f| f.parse::<LogFormat>())
        .transpose()?
        .unwrap_or_default();
    init_logging(log_format)?;

    println!("🌐 Record Registry - Rental Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config_path = std::env::var("REGISTRY_CONFIG").ok().map(std::path::PathBuf::from);
    let config = RegistryConfig::load(config_path.as_deref())?;

    let mut desk = RentalDesk::new("Record Registry Rentals")?;
    match std::env::var("REGISTRY_FLEET").ok() {
        Some(path) => {
            let count = import::import_fleet(&mut desk, std::path::Path::new(&path), &config.rental)?;
            println!("✓ Fleet loaded from {}: {} vehicles", path, count);
        }
        None => {
            for vehicle in sample_fleet(&config.rental)? {
                desk.add_vehicle(vehicle)?;
            }
            println!("✓ Sample fleet loaded: {} vehicles", desk.fleet().len());
        }
    }

    let state = AppState {
        desk: Arc::new(Mutex::new(desk)),
    };

    let addr = std::env::var("REGISTRY_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/vehicles", addr);
    println!("\n   Press Ctrl+C to stop\n");
    tracing::info!(%addr, "server started");

    axum::serve(listener, router(state))
        .await
        .context("Failed to start server")?;

    Ok(())
}
