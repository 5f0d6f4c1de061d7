use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tapsearch_core::{BuildingFeature, Restaurant};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RestaurantListQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RestaurantDetail {
    pub restaurant: Restaurant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_polygon: Option<BuildingFeature>,
}

pub(super) async fn list_restaurants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RestaurantListQuery>,
) -> Result<Json<ApiResponse<Vec<Restaurant>>>, ApiError> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let rows = tapsearch_db::list_restaurants_by_rating(&state.pool, name)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(tapsearch_db::RestaurantRow::into_restaurant)
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_restaurant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RestaurantDetail>>, ApiError> {
    let row = tapsearch_db::get_restaurant_with_building(&state.pool, &id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("restaurant '{id}' not found"),
            )
        })?;

    let data = RestaurantDetail {
        building_polygon: row.building.into_building().map(|b| b.to_feature()),
        restaurant: row.restaurant.into_restaurant(),
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
