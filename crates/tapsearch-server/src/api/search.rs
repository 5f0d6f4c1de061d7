use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use tapsearch_core::{
    NearbyRequest, NearbyRestaurant, OptimizedSearchResponse, RawCoordinates, SearchError,
    SearchResponse,
};

use crate::middleware::RequestId;

use super::{json_body, map_db_error, map_search_error, ApiError, ApiResponse, AppState};

fn no_restaurants(request_id: &RequestId) -> ApiError {
    map_search_error(
        request_id.0.clone(),
        &SearchError::NotFound("no restaurants found".to_owned()),
    )
}

/// `POST /api/v1/restaurants/search`: nearest restaurant with its footprint.
pub(super) async fn search_full(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RawCoordinates>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let point = json_body(&req_id, payload)?
        .validate()
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let row = tapsearch_db::find_nearest_restaurant_with_building(&state.pool, point.lat, point.lng)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| no_restaurants(&req_id))?;

    let feature = row.building.into_building().map(|b| b.to_feature());
    let restaurant = row.restaurant.into_restaurant();
    tracing::info!(
        lat = point.lat,
        lng = point.lng,
        restaurant_id = %restaurant.id,
        has_polygon = feature.is_some(),
        "full search resolved"
    );

    Ok(Json(SearchResponse::new(restaurant, feature, row.distance)))
}

/// `POST /api/v1/restaurants/search/optimized`: nearest restaurant, id only.
pub(super) async fn search_optimized(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RawCoordinates>, JsonRejection>,
) -> Result<Json<OptimizedSearchResponse>, ApiError> {
    let point = json_body(&req_id, payload)?
        .validate()
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let row = tapsearch_db::find_nearest_restaurant(&state.pool, point.lat, point.lng)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| no_restaurants(&req_id))?;

    let restaurant = row.restaurant.into_restaurant();
    tracing::info!(
        lat = point.lat,
        lng = point.lng,
        restaurant_id = %restaurant.id,
        "optimized search resolved"
    );

    Ok(Json(OptimizedSearchResponse::new(restaurant, row.distance)))
}

/// `POST /api/v1/restaurants/search/nearby`: everything inside a radius.
pub(super) async fn search_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<NearbyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<NearbyRestaurant>>>, ApiError> {
    let (point, radius_deg) = json_body(&req_id, payload)?
        .validate()
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let rows =
        tapsearch_db::find_restaurants_within_radius(&state.pool, point.lat, point.lng, radius_deg)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| NearbyRestaurant {
            distance: row.distance,
            restaurant: row.restaurant.into_restaurant(),
        })
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
