use hereiam_core::Mission;
use hereiam_geo::{GeoError, GeoJsonPoint, GeoJsonPolygon, LatLng, MapView, PolygonDraft};
use serde::Serialize;

use crate::state::MissionMapState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapOptions {
    pub scroll_wheel_zoom: bool,
    pub tap: bool,
    pub attribution_control: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            scroll_wheel_zoom: false,
            tap: true,
            attribution_control: false,
        }
    }
}

/// The single tile layer mounted in the map. Its source URL is swapped in
/// place; the layer itself is created once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileLayer {
    url: String,
    url_updates: u32,
}

impl TileLayer {
    fn new(url: String) -> Self {
        Self {
            url,
            url_updates: 0,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn url_updates(&self) -> u32 {
        self.url_updates
    }

    fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
        self.url_updates += 1;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CurrentLocationMarker {
    position: Option<LatLng>,
    inside_mission: Option<bool>,
}

impl CurrentLocationMarker {
    pub fn position(&self) -> Option<LatLng> {
        self.position
    }

    /// `None` when there is no position or no mission area to compare with.
    pub fn inside_mission(&self) -> Option<bool> {
        self.inside_mission
    }

    pub fn report(&mut self, position: LatLng, mission: Option<&Mission>) -> Result<(), GeoError> {
        if !position.is_valid() {
            return Err(GeoError::new("location out of range"));
        }
        self.position = Some(position);
        self.refresh(mission);
        Ok(())
    }

    pub fn refresh(&mut self, mission: Option<&Mission>) {
        self.inside_mission = match (self.position, mission) {
            (Some(position), Some(mission)) if mission.geo_json.is_some() => {
                Some(mission.covers(position))
            }
            _ => None,
        };
    }

    pub fn as_geo_json(&self) -> Option<GeoJsonPoint> {
        self.position.map(GeoJsonPoint::new)
    }
}

/// Draws a mission area vertex by vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolygonDrawing {
    draft: PolygonDraft,
    finished: Option<GeoJsonPolygon>,
}

impl PolygonDrawing {
    pub fn vertices(&self) -> &[LatLng] {
        self.draft.vertices()
    }

    pub fn finished(&self) -> Option<&GeoJsonPolygon> {
        self.finished.as_ref()
    }

    pub fn add_vertex(&mut self, vertex: LatLng) -> Result<(), GeoError> {
        self.draft.add_vertex(vertex)?;
        self.finished = None;
        Ok(())
    }

    pub fn undo(&mut self) -> Option<LatLng> {
        self.finished = None;
        self.draft.undo()
    }

    pub fn clear(&mut self) {
        self.draft.clear();
        self.finished = None;
    }

    pub fn finish(&mut self) -> Result<&GeoJsonPolygon, GeoError> {
        let polygon = self.draft.finish()?;
        Ok(self.finished.insert(polygon))
    }

    /// Hands the finished area out and starts a new drawing.
    pub fn take_finished(&mut self) -> Option<GeoJsonPolygon> {
        let polygon = self.finished.take()?;
        self.draft.clear();
        Some(polygon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub view: MapView,
    pub options: MapOptions,
    pub tile_layer: TileLayer,
    pub active_layer_id: String,
    pub mount_generation: u64,
    pub location: CurrentLocationMarker,
    pub drawing: PolygonDrawing,
}

/// Map viewport with its tile layer and child tools. The viewport is fixed
/// when mounted and only the tile source follows the shared map state.
#[derive(Debug, Clone, PartialEq)]
pub struct MapContainer {
    view: MapView,
    options: MapOptions,
    tile_layer: TileLayer,
    active_layer_id: String,
    mount_generation: u64,
    synced: (String, bool),
    pub location: CurrentLocationMarker,
    pub drawing: PolygonDrawing,
}

impl MapContainer {
    pub fn mount(view: MapView, map_state: &MissionMapState) -> Self {
        let url = map_state.active_layer.url.clone();
        Self {
            view: MapView {
                zoom: view.clamp_zoom(view.zoom),
                ..view
            },
            options: MapOptions::default(),
            tile_layer: TileLayer::new(url.clone()),
            active_layer_id: map_state.active_layer.id.clone(),
            mount_generation: 1,
            synced: (url, map_state.re_render),
            location: CurrentLocationMarker::default(),
            drawing: PolygonDrawing::default(),
        }
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn tile_layer(&self) -> &TileLayer {
        &self.tile_layer
    }

    pub fn mount_generation(&self) -> u64 {
        self.mount_generation
    }

    /// Follows the active layer URL and the re-render flag. Returns whether
    /// the tile source was reset.
    pub fn sync(&mut self, map_state: &MissionMapState) -> bool {
        let next = (map_state.active_layer.url.clone(), map_state.re_render);
        self.active_layer_id = map_state.active_layer.id.clone();
        if next == self.synced {
            return false;
        }
        self.tile_layer.set_url(&next.0);
        self.synced = next;
        true
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            view: self.view,
            options: self.options,
            tile_layer: self.tile_layer.clone(),
            active_layer_id: self.active_layer_id.clone(),
            mount_generation: self.mount_generation,
            location: self.location,
            drawing: self.drawing.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TileLayerChoice;
    use serde_json::json;

    fn layer(id: &str) -> TileLayerChoice {
        TileLayerChoice {
            id: id.to_string(),
            url: format!("/ui/tiles/{id}/{{z}}/{{x}}/{{y}}"),
        }
    }

    fn view() -> MapView {
        MapView {
            center: LatLng::new(52.454937, 13.525194),
            zoom: 13,
            max_zoom: 18,
        }
    }

    #[test]
    fn mounts_with_fixed_options() {
        let map = MapContainer::mount(view(), &MissionMapState::new(layer("osm")));
        let options = map.snapshot().options;
        assert!(!options.scroll_wheel_zoom);
        assert!(options.tap);
        assert!(!options.attribution_control);
        assert_eq!(map.tile_layer().url(), "/ui/tiles/osm/{z}/{x}/{y}");
    }

    #[test]
    fn layer_change_updates_source_without_remount() {
        let mut state = MissionMapState::new(layer("osm"));
        let mut map = MapContainer::mount(view(), &state);
        let before = map.view();

        state.select_layer(layer("hot"));
        assert!(map.sync(&state));
        assert_eq!(map.tile_layer().url(), "/ui/tiles/hot/{z}/{x}/{y}");
        assert_eq!(map.tile_layer().url_updates(), 1);
        assert_eq!(map.view(), before);
        assert_eq!(map.mount_generation(), 1);

        assert!(!map.sync(&state));
        state.request_rerender();
        assert!(map.sync(&state));
        assert_eq!(map.tile_layer().url_updates(), 2);
        assert_eq!(map.mount_generation(), 1);
    }

    #[test]
    fn location_is_checked_against_mission_area() {
        let mission: Mission = serde_json::from_value(json!({
            "_id": {"$oid": "64b7f0c2a1b2c3d4e5f60718"},
            "geoJSON": {
                "type": "Polygon",
                "coordinates": [[[13.4, 52.4], [13.6, 52.4], [13.6, 52.5], [13.4, 52.5], [13.4, 52.4]]]
            }
        }))
        .unwrap();
        let mut marker = CurrentLocationMarker::default();
        marker.report(LatLng::new(52.45, 13.5), Some(&mission)).unwrap();
        assert_eq!(marker.inside_mission(), Some(true));
        marker.report(LatLng::new(48.1, 11.6), Some(&mission)).unwrap();
        assert_eq!(marker.inside_mission(), Some(false));
        marker.refresh(None);
        assert_eq!(marker.inside_mission(), None);
        assert!(marker.report(LatLng::new(95.0, 0.0), None).is_err());
    }

    #[test]
    fn drawing_finishes_into_closed_polygon() {
        let mut drawing = PolygonDrawing::default();
        drawing.add_vertex(LatLng::new(52.4, 13.4)).unwrap();
        drawing.add_vertex(LatLng::new(52.4, 13.6)).unwrap();
        assert!(drawing.finish().is_err());
        drawing.add_vertex(LatLng::new(52.5, 13.6)).unwrap();
        let ring_len = drawing.finish().unwrap().outer_ring().len();
        assert_eq!(ring_len, 4);

        assert_eq!(drawing.undo(), Some(LatLng::new(52.5, 13.6)));
        assert!(drawing.finished().is_none());
        drawing.add_vertex(LatLng::new(52.5, 13.5)).unwrap();
        drawing.finish().unwrap();
        assert!(drawing.take_finished().is_some());
        assert!(drawing.vertices().is_empty());
    }
}
