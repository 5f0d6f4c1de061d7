//! Handlers that talk to the Query Service through the map client.

use std::sync::Arc;

use anyhow::Context;
use tapsearch_client::{
    FallbackSearchApi, Geometry, GeometryResolver, HttpApiClient, MapController, SelectionState,
    TapOutcome, TracingRenderer,
};
use tapsearch_core::{BuildingId, ClientConfig, Coordinates, Restaurant};

fn build_api(config: &ClientConfig) -> anyhow::Result<Arc<FallbackSearchApi<HttpApiClient>>> {
    let http = HttpApiClient::from_config(config)
        .with_context(|| format!("failed to build API client for {}", config.api_base_url))?;
    let api = FallbackSearchApi::new(http, config.fallback)?;
    Ok(Arc::new(api))
}

/// Tap `lat`/`lng` once and print what the map would show.
///
/// # Errors
///
/// Returns an error if the point is out of range or the search fails.
pub(crate) async fn run_search(
    config: &ClientConfig,
    lat: f64,
    lng: f64,
    json: bool,
) -> anyhow::Result<()> {
    let point = Coordinates::new(lat, lng)?;
    let api = build_api(config)?;
    let controller = MapController::new(
        Arc::clone(&api),
        api,
        TracingRenderer::default(),
        config.mode,
    );

    if controller.tap(point).await == TapOutcome::Superseded {
        anyhow::bail!("search was superseded before it finished");
    }
    let state = controller.snapshot().await;
    if let Some(error) = state.error() {
        anyhow::bail!("search failed: {error}");
    }

    let vertices = match state.building_id() {
        Some(id) => match controller.resolver().resolve(id).await {
            Ok(Geometry::Available(feature)) => feature.outer_ring().map(|r| r.vertices().len()),
            Ok(Geometry::Unavailable) | Err(_) => None,
        },
        None => state
            .polygon()
            .and_then(|p| p.outer_ring())
            .map(|r| r.vertices().len()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&selection_json(&state))?);
    } else {
        print_selection(&state, vertices);
    }
    Ok(())
}

fn selection_json(state: &SelectionState) -> serde_json::Value {
    serde_json::json!({
        "mode": state.mode(),
        "restaurant": state.restaurant(),
        "message": state.message(),
        "osmBuildingId": state.building_id(),
        "buildingPolygon": state.polygon(),
        "geometryError": state.geometry_error(),
    })
}

fn print_selection(state: &SelectionState, vertices: Option<usize>) {
    let Some(restaurant) = state.restaurant() else {
        println!("{}", state.message().unwrap_or("no restaurant selected"));
        return;
    };
    if let Some(message) = state.message() {
        println!("{message}");
    }
    println!("  id:       {}", restaurant.id);
    println!("  address:  {}", restaurant.address);
    println!("  hours:    {}", restaurant.opening_hours);
    println!("  rating:   {:.1}", restaurant.rating);
    println!("  location: {:.6}, {:.6}", restaurant.lat, restaurant.lng);
    match (&restaurant.osm_building_id, vertices) {
        (Some(id), Some(n)) => println!("  building: {id} ({n} vertices)"),
        (Some(id), None) => match state.geometry_error() {
            Some(reason) => println!("  building: {id} ({reason})"),
            None => println!("  building: {id} (no footprint)"),
        },
        (None, _) => println!("  building: \u{2014}"),
    }
}

/// Print one building footprint as pretty GeoJSON.
///
/// # Errors
///
/// Returns an error if the building is unknown or the request fails.
pub(crate) async fn run_building(config: &ClientConfig, id: &str) -> anyhow::Result<()> {
    let resolver = GeometryResolver::new(build_api(config)?);
    let id = BuildingId::new(id);
    match resolver.resolve(&id).await? {
        Geometry::Available(feature) => {
            println!("{}", serde_json::to_string_pretty(&feature)?);
            Ok(())
        }
        Geometry::Unavailable => anyhow::bail!("building '{id}' not found"),
    }
}

/// Print restaurants as a table, best rated first.
///
/// # Errors
///
/// Returns an error if the request fails.
pub(crate) async fn run_list(config: &ClientConfig, name: Option<&str>) -> anyhow::Result<()> {
    let client = HttpApiClient::from_config(config)?;
    let restaurants = client.list_restaurants(name).await?;

    if restaurants.is_empty() {
        println!(
            "no restaurants found{}; run `db seed` first",
            name.map(|n| format!(" matching '{n}'")).unwrap_or_default()
        );
        return Ok(());
    }

    println!("{}", list_header());
    for restaurant in &restaurants {
        println!("{}", list_row(restaurant));
    }
    Ok(())
}

fn list_header() -> String {
    format!("{:<10}{:<8}{:<18}NAME", "ID", "RATING", "BUILDING")
}

fn list_row(restaurant: &Restaurant) -> String {
    let building = restaurant
        .osm_building_id
        .as_ref()
        .map_or_else(|| "\u{2014}".to_string(), ToString::to_string);
    format!(
        "{:<10}{:<8.1}{:<18}{}",
        restaurant.id, restaurant.rating, building, restaurant.name
    )
}

/// # Errors
///
/// Returns an error if the service does not answer successfully.
pub(crate) async fn run_health(config: &ClientConfig) -> anyhow::Result<()> {
    let client = HttpApiClient::from_config(config)?;
    client
        .health()
        .await
        .with_context(|| format!("service at {} is not healthy", config.api_base_url))?;
    println!("service ok at {}", config.api_base_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(building: Option<&str>) -> Restaurant {
        Restaurant {
            id: "rest_003".to_string(),
            name: "Asian Palm Shibuya Honmachi".to_string(),
            address: "2-14-4 Honmachi, Shibuya-ku, Tokyo".to_string(),
            opening_hours: "11:30 - 14:30, 17:00 - 23:00".to_string(),
            rating: 4.0,
            lat: 35.682_146,
            lng: 139.681_979,
            osm_building_id: building.map(BuildingId::new),
        }
    }

    #[test]
    fn list_row_shows_building_or_dash() {
        let linked = list_row(&restaurant(Some("way/1081064846")));
        assert!(linked.starts_with("rest_003  4.0     way/1081064846"));
        assert!(linked.ends_with("Asian Palm Shibuya Honmachi"));

        let unlinked = list_row(&restaurant(None));
        assert!(unlinked.contains('\u{2014}'));
    }

    #[test]
    fn selection_json_uses_wire_field_names() {
        let mut state = SelectionState::default();
        let tap = Coordinates::new(35.6822, 139.6820).expect("valid point");
        let ticket = state.begin_search(tap);
        let dataset = tapsearch_core::Dataset::sample().expect("sample parses");
        let outcome = tapsearch_client::SearchOutcome::Optimized(
            dataset.search_optimized(&tap).expect("search"),
        );
        state.complete(&ticket, outcome);

        let value = selection_json(&state);
        assert_eq!(value["mode"], "optimized");
        assert_eq!(value["restaurant"]["id"], "rest_003");
        assert_eq!(value["osmBuildingId"], "way/1081064846");
        assert!(value["buildingPolygon"].is_null());
        assert!(value["geometryError"].is_null());
    }

    #[test]
    fn selection_json_for_empty_area_has_message_but_no_restaurant() {
        let mut state = SelectionState::default();
        let ticket = state.begin_search(Coordinates::new(0.0, 0.0).expect("valid point"));
        state.not_found(&ticket, "No restaurants found near this location");

        let value = selection_json(&state);
        assert!(value["restaurant"].is_null());
        assert_eq!(value["message"], "No restaurants found near this location");
        assert!(state.error().is_none());
    }
}
