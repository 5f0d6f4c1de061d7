//! Ties the selection state, search API, geometry resolver, and renderer
//! together.
//!
//! All state changes and overlay calls happen under one async mutex. The lock
//! is never held across a network call; after each network call the ticket's
//! generation is checked again so a newer tap or a dismiss always wins.

use tapsearch_core::{BuildingId, Coordinates, SearchMode};
use tokio::sync::Mutex;

use crate::api::{GeometryProvider, SearchApi};
use crate::error::{ClientError, ErrorKind};
use crate::render::OverlayRenderer;
use crate::resolver::{Geometry, GeometryResolver};
use crate::state::{RenderCommand, SelectionState, StateError};

/// What happened to a tap's search once it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// The result, "nothing nearby", or failure was applied to the selection.
    Applied,
    /// A newer tap or a dismiss arrived first; the result was dropped.
    Superseded,
}

pub struct MapController<A, P, R> {
    api: A,
    resolver: GeometryResolver<P>,
    renderer: R,
    state: Mutex<SelectionState>,
}

impl<A, P, R> MapController<A, P, R>
where
    A: SearchApi,
    P: GeometryProvider,
    R: OverlayRenderer,
{
    pub fn new(api: A, provider: P, renderer: R, mode: SearchMode) -> Self {
        Self {
            api,
            resolver: GeometryResolver::new(provider),
            renderer,
            state: Mutex::new(SelectionState::new(mode)),
        }
    }

    /// Search for the restaurant nearest `point` and update the overlay.
    pub async fn tap(&self, point: Coordinates) -> TapOutcome {
        let ticket = self.state.lock().await.begin_search(point);
        tracing::debug!(
            generation = ticket.generation,
            lat = point.lat,
            lng = point.lng,
            mode = %ticket.mode,
            "search started"
        );

        let result = self.api.search(ticket.tap, ticket.mode).await;

        let building = {
            let mut state = self.state.lock().await;
            let command = match result {
                Ok(outcome) => {
                    tracing::info!(
                        generation = ticket.generation,
                        restaurant_id = %outcome.restaurant().id,
                        "search resolved"
                    );
                    state.complete(&ticket, outcome)
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    tracing::info!(generation = ticket.generation, "no restaurant near tap");
                    state.not_found(&ticket, failure_message(&err))
                }
                Err(err) => {
                    tracing::warn!(generation = ticket.generation, error = %err, "search failed");
                    state.fail(&ticket, failure_message(&err))
                }
            };
            match command {
                None => return TapOutcome::Superseded,
                Some(RenderCommand::DrawFeature(feature)) => {
                    self.renderer.draw(&feature);
                    return TapOutcome::Applied;
                }
                Some(RenderCommand::Clear) => {
                    self.renderer.clear();
                    return TapOutcome::Applied;
                }
                Some(RenderCommand::DrawBuilding(id)) => id,
            }
        };

        self.draw_building(ticket.generation, &building).await
    }

    async fn draw_building(&self, generation: u64, id: &BuildingId) -> TapOutcome {
        let geometry = self.resolver.resolve(id).await;

        let mut state = self.state.lock().await;
        if !state.awaits_building(generation, id) {
            tracing::debug!(generation, osm_id = %id, "dropping stale building geometry");
            return TapOutcome::Superseded;
        }
        match geometry {
            Ok(Geometry::Available(feature)) => self.renderer.draw(&feature),
            Ok(Geometry::Unavailable) => self.renderer.clear(),
            Err(err) => {
                tracing::warn!(osm_id = %id, error = %err, "building geometry lookup failed");
                if state
                    .fail_geometry(generation, id, GEOMETRY_FAILURE_MESSAGE)
                    .is_some()
                {
                    self.renderer.clear();
                }
            }
        }
        drop(state);
        TapOutcome::Applied
    }

    /// Close the result sheet, keeping the tapped point.
    pub async fn dismiss(&self) {
        let mut state = self.state.lock().await;
        state.dismiss();
        self.renderer.clear();
    }

    /// Dismiss and forget the tapped point.
    pub async fn clear_selection(&self) {
        let mut state = self.state.lock().await;
        state.clear_selection();
        self.renderer.clear();
    }

    /// Switch modes for the next tap, clearing the overlay if the shown
    /// footprint belonged to the old mode. A footprint still being fetched
    /// for the old mode is then never drawn.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SearchInFlight`] while a search is running.
    pub async fn set_mode(&self, mode: SearchMode) -> Result<(), StateError> {
        let mut state = self.state.lock().await;
        if let Some(RenderCommand::Clear) = state.set_mode(mode)? {
            self.renderer.clear();
        }
        Ok(())
    }

    /// A copy of the current selection.
    pub async fn snapshot(&self) -> SelectionState {
        self.state.lock().await.clone()
    }

    pub fn resolver(&self) -> &GeometryResolver<P> {
        &self.resolver
    }
}

const GEOMETRY_FAILURE_MESSAGE: &str = "Building outline could not be loaded, please try again";

/// User-facing text for a failed search.
fn failure_message(err: &ClientError) -> String {
    match err.kind() {
        ErrorKind::InvalidRequest => err.to_string(),
        ErrorKind::NotFound => "No restaurants found near this location".to_owned(),
        ErrorKind::Upstream => "Search service is unavailable, please try again".to_owned(),
    }
}
