use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tapsearch_core::BuildingFeature;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

/// `GET /api/v1/buildings`: every stored footprint as a feature.
///
/// Rows with unusable geometry are skipped and logged.
pub(super) async fn list_buildings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BuildingFeature>>>, ApiError> {
    let rows = tapsearch_db::list_buildings(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .filter_map(|row| match row.into_building() {
            Ok(building) => Some(building.to_feature()),
            Err(e) => {
                tracing::warn!(error = %e, "skipping building with unusable geometry");
                None
            }
        })
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// `GET /api/v1/buildings/{osm_id}`: a bare feature, for the client resolver.
pub(super) async fn get_building(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(osm_id): Path<String>,
) -> Result<Json<BuildingFeature>, ApiError> {
    let row = tapsearch_db::get_building_by_osm_id(&state.pool, &osm_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("building '{osm_id}' not found"),
            )
        })?;

    let building = row
        .into_building()
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::debug!(osm_id = %osm_id, "building geometry served");

    Ok(Json(building.to_feature()))
}
