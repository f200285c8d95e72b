//! Parking service routes

use axum::{
    Extension, Json, Router,
    extract::{
        ConnectInfo, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    ingestion::SensorReport,
    middleware::{AuthUser, auth_middleware},
    rate_limiter::throttle_key,
    models::{
        AuthResponse, Credentials, FavoritesRequest, FavoritesResponse, SensorDataQuery,
        SpotOccupancyRequest, UpdateCarRequest, User,
    },
    state::AppState,
    validation::{validate_car_model, validate_password, validate_username},
};

/// Largest favorites list accepted in one update
const MAX_FAVORITES: usize = 500;

/// Create the router for the parking service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/car", put(update_car))
        .route("/profile", get(get_profile))
        .route("/favorites", get(get_favorites).post(set_favorites))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/occupancy", put(update_occupancy))
        .route("/occupancy/:spot_id", get(get_spot_occupancy))
        .route("/sensor-data", get(get_sensor_data))
        .route("/upload", post(upload_sensor_data))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "parking-service"
    }))
}

fn auth_response(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let token = state
        .jwt_service
        .issue(user.id, &user.username)
        .map_err(|e| {
            error!("Failed to issue token: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.token_expiry(),
        user_id: user.id,
        username: user.username,
        car: user.car,
    })
}

/// User signup endpoint
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    validate_username(&payload.username).map_err(ApiError::BadRequest)?;
    validate_password(&payload.password).map_err(ApiError::BadRequest)?;

    let user = state
        .user_repository
        .register(&payload.username, &payload.password)
        .await?;

    info!("User {} signed up with id {}", user.username, user.id);

    Ok(Json(auth_response(&state, user)?))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    client: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let client_ip = client.map(|ConnectInfo(addr)| addr.ip());
    // Names that can never be registered are not tracked
    let tracked = validate_username(&payload.username)
        .ok()
        .map(|_| throttle_key(&payload.username, client_ip));

    if let Some(key) = &tracked {
        if !state.login_throttle.is_allowed(key).await {
            warn!("Login for {} refused: too many failures", payload.username);
            return Err(ApiError::TooManyRequests);
        }
    }

    let Some(user) = state
        .user_repository
        .verify(&payload.username, &payload.password)
        .await?
    else {
        info!("Failed login attempt for user: {}", payload.username);
        if let Some(key) = &tracked {
            state.login_throttle.record_failure(key).await;
        }
        return Err(ApiError::Unauthorized);
    };

    if let Some(key) = &tracked {
        state.login_throttle.reset(key).await;
    }
    info!("User {} logged in", user.username);

    Ok(Json(auth_response(&state, user)?))
}

/// Logout endpoint
///
/// Tokens are stateless, so there is nothing to invalidate server-side; the
/// client drops its token.
pub async fn logout() -> impl IntoResponse {
    Json(json!({"message": "Logged out successfully"}))
}

/// Direct spot occupancy overwrite
pub async fn update_occupancy(
    State(state): State<AppState>,
    payload: Result<Json<SpotOccupancyRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let spot_id = payload
        .spot_id
        .ok_or_else(|| ApiError::BadRequest("spot_id is required".to_string()))?;
    let occupied = payload
        .spot_occupancy
        .ok_or_else(|| ApiError::BadRequest("spot_occupancy is required".to_string()))?
        .as_bool()
        .ok_or_else(|| ApiError::BadRequest("spot_occupancy must be a boolean".to_string()))?;

    state
        .occupancy_repository
        .set_spot_occupancy(spot_id, occupied)
        .await?;

    Ok(Json(json!({"message": "Data is updated"})))
}

/// Current manually-set state of one spot
pub async fn get_spot_occupancy(
    State(state): State<AppState>,
    Path(spot_id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    let spot = state
        .occupancy_repository
        .spot(spot_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Spot not found".to_string()))?;

    Ok(Json(spot))
}

/// Update the car associated with the caller's account
pub async fn update_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateCarRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let model = validate_car_model(&payload.model).map_err(ApiError::BadRequest)?;

    state.user_repository.update_car(user.id, &model).await?;

    Ok(Json(json!({"message": "Data is updated"})))
}

/// Profile of the caller
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .user_repository
        .get_profile(&user.username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// Favorite spots of the caller
pub async fn get_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let favorites = state.favorites_repository.get(user.id).await?;
    Ok(Json(favorites))
}

/// Replace the caller's favorite spots
pub async fn set_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<FavoritesRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    if payload.favorites.len() > MAX_FAVORITES {
        return Err(ApiError::BadRequest(format!(
            "At most {} favorites are allowed",
            MAX_FAVORITES
        )));
    }

    let favorites = state
        .favorites_repository
        .replace(user.id, &payload.favorites)
        .await?;

    Ok(Json(FavoritesResponse {
        message: "Favorites updated".to_string(),
        favorites,
    }))
}

/// Latest reading for one sensor
pub async fn get_sensor_data(
    State(state): State<AppState>,
    query: Result<Query<SensorDataQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let sensor_id = query
        .sensor_id
        .ok_or_else(|| ApiError::BadRequest("sensor_id is required".to_string()))?;

    let reading = state
        .occupancy_repository
        .latest_reading(sensor_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No data found for this sensor".to_string()))?;

    Ok(Json(reading))
}

/// Sensor ingestion endpoint
pub async fn upload_sensor_data(
    State(state): State<AppState>,
    payload: Result<Json<SensorReport>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(report) = payload?;
    let reading = report.validate().map_err(ApiError::BadRequest)?;

    let stored = state.occupancy_repository.record_reading(reading).await?;

    info!(
        sensor_id = stored.sensor_id,
        distance = stored.distance,
        is_occupied = stored.is_occupied,
        "Sensor reading stored"
    );

    Ok(Json(json!({
        "status": "success",
        "message": "Data received",
        "reading": stored
    })))
}
