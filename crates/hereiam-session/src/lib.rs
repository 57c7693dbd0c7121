pub mod auth;
pub mod dashboard;
pub mod map;
pub mod state;

pub use auth::{
    apply_outcome, AuthFlow, AuthMode, AuthView, AuthViewSnapshot, PendingSubmission, SignedIn,
    Submission,
};
pub use dashboard::{adopt_mission, leave_mission, MissionActions, MissionError};
pub use map::{CurrentLocationMarker, MapContainer, MapOptions, MapSnapshot, PolygonDrawing, TileLayer};
pub use state::{MissionMapState, Route, SessionState, Theme, TileLayerChoice};
