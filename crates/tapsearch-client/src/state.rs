//! Selection state for the map client.
//!
//! A pure state machine: every transition is a synchronous method that returns
//! the overlay change to apply, so it can be tested without a network or map.
//! Each search is tagged with a generation number; results for anything but
//! the newest generation are dropped, which makes the last tap win.

use tapsearch_core::{BuildingFeature, BuildingId, Coordinates, Restaurant, SearchMode};
use thiserror::Error;

use crate::api::SearchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("cannot change search mode while a search is in flight")]
    SearchInFlight,
}

/// Issued when a search starts; hand it back when the answer arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchTicket {
    pub generation: u64,
    pub tap: Coordinates,
    pub mode: SearchMode,
}

/// Overlay change requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    DrawFeature(BuildingFeature),
    /// Resolve this id to a footprint, then draw it.
    DrawBuilding(BuildingId),
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    tap: Option<Coordinates>,
    restaurant: Option<Restaurant>,
    polygon: Option<BuildingFeature>,
    building_id: Option<BuildingId>,
    message: Option<String>,
    loading: bool,
    error: Option<String>,
    geometry_error: Option<String>,
    sheet_open: bool,
    mode: SearchMode,
    phase: Phase,
    generation: u64,
}

impl SelectionState {
    #[must_use]
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Record a tap and start a new search, superseding any in flight.
    pub fn begin_search(&mut self, tap: Coordinates) -> SearchTicket {
        self.generation += 1;
        self.tap = Some(tap);
        self.loading = true;
        self.error = None;
        self.geometry_error = None;
        self.phase = Phase::Searching;
        SearchTicket {
            generation: self.generation,
            tap,
            mode: self.mode,
        }
    }

    /// Apply a search answer. Returns `None` if the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: &SearchTicket,
        outcome: SearchOutcome,
    ) -> Option<RenderCommand> {
        if !self.accepts(ticket) {
            return None;
        }

        self.loading = false;
        self.error = None;
        self.sheet_open = true;
        self.phase = Phase::Resolved;

        let command = match outcome {
            SearchOutcome::Full(response) => {
                self.restaurant = Some(response.restaurant);
                self.message = response.message;
                self.building_id = None;
                self.polygon = response.building_polygon;
                self.polygon
                    .clone()
                    .map_or(RenderCommand::Clear, RenderCommand::DrawFeature)
            }
            SearchOutcome::Optimized(response) => {
                self.restaurant = Some(response.restaurant);
                self.message = response.message;
                self.polygon = None;
                self.building_id = response.osm_building_id;
                self.building_id
                    .clone()
                    .map_or(RenderCommand::Clear, RenderCommand::DrawBuilding)
            }
        };
        Some(command)
    }

    /// Apply a search failure. Returns `None` if the ticket is stale.
    pub fn fail(
        &mut self,
        ticket: &SearchTicket,
        message: impl Into<String>,
    ) -> Option<RenderCommand> {
        if !self.accepts(ticket) {
            return None;
        }
        self.clear_results();
        self.loading = false;
        self.error = Some(message.into());
        self.phase = Phase::Failed;
        Some(RenderCommand::Clear)
    }

    /// Apply a "nothing nearby" answer. The search resolved without a
    /// restaurant: the sheet shows `message` and no error is recorded.
    /// Returns `None` if the ticket is stale.
    pub fn not_found(
        &mut self,
        ticket: &SearchTicket,
        message: impl Into<String>,
    ) -> Option<RenderCommand> {
        if !self.accepts(ticket) {
            return None;
        }
        self.clear_results();
        self.loading = false;
        self.error = None;
        self.message = Some(message.into());
        self.sheet_open = true;
        self.phase = Phase::Resolved;
        Some(RenderCommand::Clear)
    }

    /// Whether a footprint fetched for `id` under `generation` may still be
    /// drawn: the generation is current and `id` is still the selected
    /// building.
    #[must_use]
    pub fn awaits_building(&self, generation: u64, id: &BuildingId) -> bool {
        self.is_current(generation) && self.building_id.as_ref() == Some(id)
    }

    /// Record that the selected building's footprint could not be fetched.
    ///
    /// The restaurant stays selected. Returns `None` if the lookup no longer
    /// matches the selection.
    pub fn fail_geometry(
        &mut self,
        generation: u64,
        id: &BuildingId,
        message: impl Into<String>,
    ) -> Option<RenderCommand> {
        if !self.awaits_building(generation, id) {
            return None;
        }
        self.geometry_error = Some(message.into());
        Some(RenderCommand::Clear)
    }

    /// Close the sheet and drop the result, keeping the tapped point.
    ///
    /// Any search still in flight is invalidated.
    pub fn dismiss(&mut self) -> RenderCommand {
        self.generation += 1;
        self.clear_results();
        self.loading = false;
        self.error = None;
        self.sheet_open = false;
        self.phase = Phase::Idle;
        RenderCommand::Clear
    }

    /// [`SelectionState::dismiss`] plus forgetting the tapped point.
    pub fn clear_selection(&mut self) -> RenderCommand {
        let command = self.dismiss();
        self.tap = None;
        command
    }

    /// Switch between full and optimized lookups for the next search.
    ///
    /// The result field that belongs to the other mode is dropped; if that
    /// leaves nothing to show, the overlay must be cleared and any footprint
    /// lookup still running for the dropped field is invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SearchInFlight`] while a search is running.
    pub fn set_mode(&mut self, mode: SearchMode) -> Result<Option<RenderCommand>, StateError> {
        if self.phase == Phase::Searching {
            return Err(StateError::SearchInFlight);
        }
        self.mode = mode;
        let dropped = match mode {
            SearchMode::Full => self.building_id.take().is_some(),
            SearchMode::Optimized => self.polygon.take().is_some(),
        };
        if !dropped {
            return Ok(None);
        }
        self.generation += 1;
        self.geometry_error = None;
        Ok(Some(RenderCommand::Clear))
    }

    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn accepts(&self, ticket: &SearchTicket) -> bool {
        if self.is_current(ticket.generation) && self.phase == Phase::Searching {
            return true;
        }
        tracing::debug!(
            generation = ticket.generation,
            current = self.generation,
            "dropping stale search result"
        );
        false
    }

    fn clear_results(&mut self) {
        self.restaurant = None;
        self.polygon = None;
        self.building_id = None;
        self.message = None;
        self.geometry_error = None;
    }

    #[must_use]
    pub fn tap(&self) -> Option<Coordinates> {
        self.tap
    }

    #[must_use]
    pub fn restaurant(&self) -> Option<&Restaurant> {
        self.restaurant.as_ref()
    }

    #[must_use]
    pub fn polygon(&self) -> Option<&BuildingFeature> {
        self.polygon.as_ref()
    }

    #[must_use]
    pub fn building_id(&self) -> Option<&BuildingId> {
        self.building_id.as_ref()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Why the selected building's footprint is missing, if fetching it
    /// failed.
    #[must_use]
    pub fn geometry_error(&self) -> Option<&str> {
        self.geometry_error.as_deref()
    }

    #[must_use]
    pub fn is_sheet_open(&self) -> bool {
        self.sheet_open
    }

    #[must_use]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
