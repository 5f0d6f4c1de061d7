//! Overlay drawing seam and the viewport-fit rule.

use std::sync::Mutex;

use tapsearch_core::BuildingFeature;

/// Highest zoom a fit-to-building may land on.
pub const MAX_FIT_ZOOM: u8 = 19;

/// A building smaller than this share of the viewport (in either axis) is
/// considered too small to see and triggers a refit.
const MIN_VISIBLE_SHARE: f64 = 0.1;

/// Something that can show and hide a single building overlay.
///
/// At most one overlay is visible; `draw` replaces any previous one.
pub trait OverlayRenderer: Send + Sync {
    fn draw(&self, feature: &BuildingFeature);
    fn clear(&self);
}

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Bounding box of the feature's outer ring, or `None` if it has none.
    #[must_use]
    pub fn of(feature: &BuildingFeature) -> Option<Self> {
        let ring = feature.outer_ring()?;
        let mut vertices = ring.vertices().iter();
        let &[lng, lat] = vertices.next()?;
        let mut bounds = Self {
            south: lat,
            west: lng,
            north: lat,
            east: lng,
        };
        for &[lng, lat] in vertices {
            bounds.south = bounds.south.min(lat);
            bounds.north = bounds.north.max(lat);
            bounds.west = bounds.west.min(lng);
            bounds.east = bounds.east.max(lng);
        }
        Some(bounds)
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lng)
    }

    fn width(&self) -> f64 {
        self.east - self.west
    }

    fn height(&self) -> f64 {
        self.north - self.south
    }
}

/// Whether the map should refit to `building` given the current `viewport`.
///
/// True when the building's centre is off-screen or the building spans at most
/// a tenth of the viewport in either axis.
#[must_use]
pub fn needs_refit(building: &Bounds, viewport: &Bounds) -> bool {
    let (lat, lng) = building.center();
    if !viewport.contains(lat, lng) {
        return true;
    }
    let wide_enough = viewport.width() > 0.0
        && building.width() / viewport.width() > MIN_VISIBLE_SHARE;
    let tall_enough = viewport.height() > 0.0
        && building.height() / viewport.height() > MIN_VISIBLE_SHARE;
    !(wide_enough && tall_enough)
}

/// Caps a computed fit zoom at [`MAX_FIT_ZOOM`].
#[must_use]
pub fn clamp_fit_zoom(zoom: u8) -> u8 {
    zoom.min(MAX_FIT_ZOOM)
}

/// Web-map zoom at which `building`'s larger side fills roughly one tile.
///
/// Degenerate (zero-span) boxes get [`MAX_FIT_ZOOM`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_zoom(building: &Bounds) -> u8 {
    let span = building.width().max(building.height());
    if span <= 0.0 {
        return MAX_FIT_ZOOM;
    }
    let zoom = (360.0 / span).log2().floor().clamp(0.0, f64::from(u8::MAX));
    clamp_fit_zoom(zoom as u8)
}

/// Logs overlay changes; used by the CLI and headless runs.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    viewport: Option<Bounds>,
}

impl TracingRenderer {
    #[must_use]
    pub fn with_viewport(viewport: Bounds) -> Self {
        Self {
            viewport: Some(viewport),
        }
    }
}

impl OverlayRenderer for TracingRenderer {
    fn draw(&self, feature: &BuildingFeature) {
        let osm_id = feature
            .properties
            .osm_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let building = Bounds::of(feature);
        let refit = match (building, self.viewport) {
            (Some(building), Some(viewport)) => needs_refit(&building, &viewport),
            _ => false,
        };
        let zoom = building.map(|b| fit_zoom(&b));
        tracing::info!(osm_id = %osm_id, refit, zoom = ?zoom, "drawing building overlay");
    }

    fn clear(&self) {
        tracing::debug!("clearing building overlay");
    }
}

/// One call made against a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Draw(BuildingFeature),
    Clear,
}

/// Remembers every draw and clear, for assertions.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    #[must_use]
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// The feature currently on screen, if any.
    #[must_use]
    pub fn visible(&self) -> Option<BuildingFeature> {
        match self.events().pop()? {
            RenderEvent::Draw(feature) => Some(feature),
            RenderEvent::Clear => None,
        }
    }

    fn push(&self, event: RenderEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl OverlayRenderer for RecordingRenderer {
    fn draw(&self, feature: &BuildingFeature) {
        self.push(RenderEvent::Draw(feature.clone()));
    }

    fn clear(&self) {
        self.push(RenderEvent::Clear);
    }
}

impl<T: OverlayRenderer + ?Sized> OverlayRenderer for std::sync::Arc<T> {
    fn draw(&self, feature: &BuildingFeature) {
        (**self).draw(feature);
    }

    fn clear(&self) {
        (**self).clear();
    }
}

#[cfg(test)]
mod tests {
    use tapsearch_core::Dataset;

    use super::*;

    fn viewport() -> Bounds {
        Bounds {
            south: 35.0,
            west: 139.0,
            north: 35.01,
            east: 139.01,
        }
    }

    #[test]
    fn bounds_cover_every_vertex() {
        let dataset = Dataset::sample().expect("sample parses");
        let feature = dataset.buildings[1].to_feature();
        let bounds = Bounds::of(&feature).expect("bounds");

        for &[lng, lat] in feature.outer_ring().expect("ring").vertices() {
            assert!(bounds.contains(lat, lng));
        }
    }

    #[test]
    fn off_screen_building_needs_refit() {
        let building = Bounds {
            south: 36.0,
            west: 140.0,
            north: 36.005,
            east: 140.005,
        };
        assert!(needs_refit(&building, &viewport()));
    }

    #[test]
    fn tiny_building_needs_refit() {
        let building = Bounds {
            south: 35.005,
            west: 139.005,
            north: 35.0051,
            east: 139.0051,
        };
        assert!(needs_refit(&building, &viewport()));
    }

    #[test]
    fn well_framed_building_is_left_alone() {
        let building = Bounds {
            south: 35.003,
            west: 139.003,
            north: 35.007,
            east: 139.007,
        };
        assert!(!needs_refit(&building, &viewport()));
    }

    #[test]
    fn fit_zoom_is_capped() {
        assert_eq!(clamp_fit_zoom(21), MAX_FIT_ZOOM);
        assert_eq!(clamp_fit_zoom(15), 15);
    }

    #[test]
    fn fit_zoom_caps_small_footprints_and_scales_large_ones() {
        let dataset = Dataset::sample().expect("sample parses");
        let palm = Bounds::of(&dataset.buildings[0].to_feature()).expect("bounds");
        let opera = Bounds::of(&dataset.buildings[1].to_feature()).expect("bounds");

        assert_eq!(fit_zoom(&palm), MAX_FIT_ZOOM);
        assert_eq!(fit_zoom(&opera), 18);

        let world = Bounds {
            south: -90.0,
            west: -180.0,
            north: 90.0,
            east: 180.0,
        };
        assert_eq!(fit_zoom(&world), 0);

        let point = Bounds {
            south: 35.0,
            west: 139.0,
            north: 35.0,
            east: 139.0,
        };
        assert_eq!(fit_zoom(&point), MAX_FIT_ZOOM);
    }

    #[test]
    fn tracing_renderer_draws_without_a_viewport() {
        let dataset = Dataset::sample().expect("sample parses");
        let renderer = TracingRenderer::default();
        renderer.draw(&dataset.buildings[0].to_feature());
        renderer.clear();
    }

    #[test]
    fn recording_renderer_tracks_visible_overlay() {
        let dataset = Dataset::sample().expect("sample parses");
        let feature = dataset.buildings[0].to_feature();
        let renderer = RecordingRenderer::default();

        renderer.draw(&feature);
        assert_eq!(renderer.visible(), Some(feature));

        renderer.clear();
        assert_eq!(renderer.visible(), None);
        assert_eq!(renderer.events().len(), 2);
    }
}
