use tapsearch_core::{Dataset, OptimizedSearchResponse, SearchResponse};

use super::*;

fn point(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).expect("valid point")
}

fn dataset() -> Dataset {
    Dataset::sample().expect("sample parses")
}

fn full_outcome(at: Coordinates) -> SearchOutcome {
    SearchOutcome::Full(dataset().search_full(&at).expect("full search"))
}

fn optimized_outcome(at: Coordinates) -> SearchOutcome {
    SearchOutcome::Optimized(dataset().search_optimized(&at).expect("optimized search"))
}

fn unlinked_outcome() -> SearchOutcome {
    let mut response: OptimizedSearchResponse = dataset()
        .search_optimized(&point(35.6822, 139.6820))
        .expect("optimized search");
    response.restaurant.osm_building_id = None;
    response.osm_building_id = None;
    SearchOutcome::Optimized(response)
}

#[test]
fn new_state_is_idle_and_optimized_by_default() {
    let state = SelectionState::default();
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.mode(), SearchMode::Optimized);
    assert_eq!(state.generation(), 0);
    assert!(state.tap().is_none());
}

#[test]
fn begin_search_records_tap_and_bumps_generation() {
    let mut state = SelectionState::default();
    let tap = point(35.0, 139.0);

    let ticket = state.begin_search(tap);

    assert_eq!(ticket.generation, 1);
    assert_eq!(ticket.tap, tap);
    assert_eq!(ticket.mode, SearchMode::Optimized);
    assert!(state.is_loading());
    assert_eq!(state.phase(), Phase::Searching);
    assert_eq!(state.tap(), Some(tap));
}

#[test]
fn full_result_populates_polygon_only() {
    let mut state = SelectionState::new(SearchMode::Full);
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);

    let command = state.complete(&ticket, full_outcome(tap)).expect("current");

    assert!(matches!(command, RenderCommand::DrawFeature(_)));
    assert!(state.polygon().is_some());
    assert!(state.building_id().is_none());
    assert!(state.is_sheet_open());
    assert!(!state.is_loading());
    assert_eq!(state.phase(), Phase::Resolved);
    assert!(state.message().is_some_and(|m| m.ends_with(" found")));
}

#[test]
fn optimized_result_populates_building_id_only() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);

    let command = state
        .complete(&ticket, optimized_outcome(tap))
        .expect("current");

    let RenderCommand::DrawBuilding(id) = command else {
        panic!("expected DrawBuilding, got {command:?}");
    };
    assert_eq!(state.building_id(), Some(&id));
    assert!(state.polygon().is_none());
    assert!(state
        .message()
        .is_some_and(|m| m.ends_with("(optimized lookup)")));
}

#[test]
fn result_without_building_clears_overlay() {
    let mut state = SelectionState::default();
    let ticket = state.begin_search(point(35.0, 139.0));

    let command = state.complete(&ticket, unlinked_outcome()).expect("current");

    assert_eq!(command, RenderCommand::Clear);
    assert!(state.restaurant().is_some());
    assert!(state.building_id().is_none());
}

#[test]
fn stale_result_is_dropped() {
    let mut state = SelectionState::default();
    let first_tap = point(35.0, 139.0);
    let second_tap = point(35.6822, 139.6820);
    let first = state.begin_search(first_tap);
    let second = state.begin_search(second_tap);

    assert!(state.complete(&first, optimized_outcome(first_tap)).is_none());
    assert_eq!(state.phase(), Phase::Searching);
    assert!(state.restaurant().is_none());

    assert!(state
        .complete(&second, optimized_outcome(second_tap))
        .is_some());
    assert_eq!(state.phase(), Phase::Resolved);
}

#[test]
fn failure_clears_results_and_records_error() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);
    state.complete(&ticket, optimized_outcome(tap));

    let retry = state.begin_search(tap);
    let command = state.fail(&retry, "service unavailable").expect("current");

    assert_eq!(command, RenderCommand::Clear);
    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(state.error(), Some("service unavailable"));
    assert!(state.restaurant().is_none());
    assert!(state.building_id().is_none());
    assert!(state.message().is_none());
    assert!(!state.is_loading());
}

#[test]
fn stale_failure_is_ignored() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let old = state.begin_search(tap);
    let current = state.begin_search(tap);
    state.complete(&current, optimized_outcome(tap));

    assert!(state.fail(&old, "timeout").is_none());
    assert!(state.error().is_none());
    assert!(state.restaurant().is_some());
}

#[test]
fn dismiss_clears_results_but_keeps_tap() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);
    state.complete(&ticket, optimized_outcome(tap));

    let command = state.dismiss();

    assert_eq!(command, RenderCommand::Clear);
    assert_eq!(state.phase(), Phase::Idle);
    assert!(!state.is_sheet_open());
    assert!(state.restaurant().is_none());
    assert!(state.building_id().is_none());
    assert!(state.error().is_none());
    assert_eq!(state.tap(), Some(tap));
}

#[test]
fn dismiss_discards_in_flight_search() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);

    state.dismiss();

    assert!(state.complete(&ticket, optimized_outcome(tap)).is_none());
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.restaurant().is_none());
}

#[test]
fn clear_selection_forgets_tap() {
    let mut state = SelectionState::default();
    let ticket = state.begin_search(point(35.0, 139.0));
    state.fail(&ticket, "boom");

    state.clear_selection();

    assert!(state.tap().is_none());
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.error().is_none());
}

#[test]
fn mode_toggle_rejected_while_searching() {
    let mut state = SelectionState::default();
    state.begin_search(point(35.0, 139.0));

    assert_eq!(
        state.set_mode(SearchMode::Full),
        Err(StateError::SearchInFlight)
    );
    assert_eq!(state.mode(), SearchMode::Optimized);
}

#[test]
fn mode_toggle_drops_other_mode_field_without_searching() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);
    state.complete(&ticket, optimized_outcome(tap));

    let command = state.set_mode(SearchMode::Full).expect("allowed when resolved");

    assert_eq!(command, Some(RenderCommand::Clear));
    assert_eq!(state.phase(), Phase::Resolved);
    assert!(state.building_id().is_none());
    assert!(state.polygon().is_none());
    assert!(state.restaurant().is_some());
    assert!(!state.is_loading());
    assert_eq!(state.begin_search(tap).mode, SearchMode::Full);
}

#[test]
fn mode_toggle_to_full_clears_nothing_when_no_building_held() {
    let mut state = SelectionState::default();

    assert_eq!(state.set_mode(SearchMode::Full), Ok(None));
    assert_eq!(state.set_mode(SearchMode::Full), Ok(None));
}

#[test]
fn mode_toggle_to_optimized_drops_polygon() {
    let mut state = SelectionState::new(SearchMode::Full);
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);
    state.complete(&ticket, full_outcome(tap));

    let command = state
        .set_mode(SearchMode::Optimized)
        .expect("allowed when resolved");

    assert_eq!(command, Some(RenderCommand::Clear));
    assert!(state.polygon().is_none());
    assert!(state.building_id().is_none());
}

#[test]
fn full_response_without_polygon_clears_overlay() {
    let mut state = SelectionState::new(SearchMode::Full);
    let ticket = state.begin_search(point(35.0, 139.0));
    let restaurant = unlinked_outcome().restaurant().clone();

    let command = state
        .complete(
            &ticket,
            SearchOutcome::Full(SearchResponse::new(restaurant, None, 0.5)),
        )
        .expect("current");

    assert_eq!(command, RenderCommand::Clear);
    assert!(state.polygon().is_none());
}

#[test]
fn mode_toggle_that_drops_building_invalidates_pending_footprint() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);
    let Some(RenderCommand::DrawBuilding(id)) = state.complete(&ticket, optimized_outcome(tap))
    else {
        panic!("expected a building to resolve");
    };
    assert!(state.awaits_building(ticket.generation, &id));

    state.set_mode(SearchMode::Full).expect("allowed when resolved");

    assert!(!state.is_current(ticket.generation));
    assert!(!state.awaits_building(ticket.generation, &id));
    assert_eq!(state.fail_geometry(ticket.generation, &id, "lost"), None);
    assert!(state.geometry_error().is_none());
}

#[test]
fn mode_toggle_without_drop_keeps_generation() {
    let mut state = SelectionState::default();
    let before = state.generation();

    state.set_mode(SearchMode::Full).expect("idle");

    assert_eq!(state.generation(), before);
}

#[test]
fn geometry_failure_keeps_restaurant_and_records_reason() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);
    state.complete(&ticket, optimized_outcome(tap));
    let id = state.building_id().cloned().expect("building selected");

    let command = state.fail_geometry(ticket.generation, &id, "outline unavailable");

    assert_eq!(command, Some(RenderCommand::Clear));
    assert_eq!(state.geometry_error(), Some("outline unavailable"));
    assert!(state.error().is_none());
    assert_eq!(state.phase(), Phase::Resolved);
    assert_eq!(state.restaurant().map(|r| r.id.as_str()), Some("rest_003"));

    state.begin_search(tap);
    assert!(state.geometry_error().is_none());
}

#[test]
fn geometry_failure_for_other_building_is_ignored() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let ticket = state.begin_search(tap);
    state.complete(&ticket, optimized_outcome(tap));

    let other = BuildingId::new("way/234567890");
    assert_eq!(state.fail_geometry(ticket.generation, &other, "x"), None);
    assert!(state.geometry_error().is_none());
}

#[test]
fn not_found_resolves_with_message_and_no_error() {
    let mut state = SelectionState::default();
    let tap = point(35.6822, 139.6820);
    let first = state.begin_search(tap);
    state.complete(&first, optimized_outcome(tap));
    let ticket = state.begin_search(point(0.0, 0.0));

    let command = state.not_found(&ticket, "No restaurants found near this location");

    assert_eq!(command, Some(RenderCommand::Clear));
    assert_eq!(state.phase(), Phase::Resolved);
    assert!(state.error().is_none());
    assert!(state.restaurant().is_none());
    assert!(state.building_id().is_none());
    assert_eq!(
        state.message(),
        Some("No restaurants found near this location")
    );
    assert!(state.is_sheet_open());
    assert!(!state.is_loading());
}

#[test]
fn stale_not_found_is_ignored() {
    let mut state = SelectionState::default();
    let stale = state.begin_search(point(0.0, 0.0));
    state.begin_search(point(35.6822, 139.6820));

    assert_eq!(state.not_found(&stale, "nothing"), None);
    assert_eq!(state.phase(), Phase::Searching);
    assert!(state.message().is_none());
}
