//! Map-client side of tapsearch: an HTTP client for the Query Service, a
//! cached building-geometry resolver, and the tap/selection state machine that
//! decides what the map overlay shows.

pub mod api;
pub mod controller;
pub mod error;
pub mod fallback;
pub mod http;
pub mod render;
pub mod resolver;
pub(crate) mod retry;
pub mod state;

pub use api::{GeometryProvider, SearchApi, SearchOutcome};
pub use controller::{MapController, TapOutcome};
pub use error::{ClientError, ErrorKind};
pub use fallback::FallbackSearchApi;
pub use http::HttpApiClient;
pub use render::{
    clamp_fit_zoom, fit_zoom, needs_refit, Bounds, OverlayRenderer, RecordingRenderer, RenderEvent,
    TracingRenderer, MAX_FIT_ZOOM,
};
pub use resolver::{Geometry, GeometryResolver};
pub use state::{Phase, RenderCommand, SearchTicket, SelectionState, StateError};
