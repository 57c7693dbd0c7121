use serde::{Deserialize, Serialize};
use std::fmt;

pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoError {
    pub message: String,
}

impl GeoError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GeoError {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// GeoJSON orders positions longitude first.
    pub fn to_position(self) -> Position {
        [self.lng, self.lat]
    }

    pub fn from_position(position: Position) -> Self {
        Self {
            lat: position[1],
            lng: position[0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn contains(&self, coord: LatLng) -> bool {
        coord.lat <= self.north
            && coord.lat >= self.south
            && coord.lng <= self.east
            && coord.lng >= self.west
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonKind {
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub coordinates: Position,
}

impl GeoJsonPoint {
    pub fn new(coord: LatLng) -> Self {
        Self {
            kind: PointKind::Point,
            coordinates: coord.to_position(),
        }
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::from_position(self.coordinates)
    }
}

/// Outer ring first, holes after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPolygon {
    #[serde(rename = "type")]
    pub kind: PolygonKind,
    pub coordinates: Vec<Vec<Position>>,
}

impl GeoJsonPolygon {
    pub fn from_rings(coordinates: Vec<Vec<Position>>) -> Result<Self, GeoError> {
        let polygon = Self {
            kind: PolygonKind::Polygon,
            coordinates,
        };
        polygon.validate()?;
        Ok(polygon)
    }

    pub fn validate(&self) -> Result<(), GeoError> {
        if self.coordinates.is_empty() {
            return Err(GeoError::new("polygon has no rings"));
        }
        for (index, ring) in self.coordinates.iter().enumerate() {
            if ring.len() < 4 {
                return Err(GeoError::new(format!(
                    "ring {index} needs at least 4 positions, got {}",
                    ring.len()
                )));
            }
            if ring.first() != ring.last() {
                return Err(GeoError::new(format!("ring {index} is not closed")));
            }
            if ring
                .iter()
                .any(|position| !LatLng::from_position(*position).is_valid())
            {
                return Err(GeoError::new(format!(
                    "ring {index} has coordinates out of range"
                )));
            }
        }
        Ok(())
    }

    pub fn outer_ring(&self) -> &[Position] {
        self.coordinates.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        let ring = self.outer_ring();
        let first = ring.first()?;
        let mut bounds = BoundingBox {
            north: first[1],
            south: first[1],
            east: first[0],
            west: first[0],
        };
        for position in ring {
            bounds.north = bounds.north.max(position[1]);
            bounds.south = bounds.south.min(position[1]);
            bounds.east = bounds.east.max(position[0]);
            bounds.west = bounds.west.min(position[0]);
        }
        Some(bounds)
    }

    pub fn contains(&self, coord: LatLng) -> bool {
        let Some((outer, holes)) = self.coordinates.split_first() else {
            return false;
        };
        ring_contains(outer, coord) && !holes.iter().any(|hole| ring_contains(hole, coord))
    }
}

fn ring_contains(ring: &[Position], coord: LatLng) -> bool {
    let (x, y) = (coord.lng, coord.lat);
    let mut inside = false;
    let mut j = ring.len().saturating_sub(1);
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub max_zoom: u8,
}

impl MapView {
    pub fn clamp_zoom(&self, zoom: u8) -> u8 {
        zoom.min(self.max_zoom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonDraft {
    vertices: Vec<LatLng>,
}

impl PolygonDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn add_vertex(&mut self, vertex: LatLng) -> Result<(), GeoError> {
        if !vertex.is_valid() {
            return Err(GeoError::new("vertex out of range"));
        }
        if self.vertices.last() == Some(&vertex) {
            return Ok(());
        }
        self.vertices.push(vertex);
        Ok(())
    }

    pub fn undo(&mut self) -> Option<LatLng> {
        self.vertices.pop()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn finish(&self) -> Result<GeoJsonPolygon, GeoError> {
        let mut ring: Vec<Position> = self.vertices.iter().map(|v| v.to_position()).collect();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(GeoError::new("a mission area needs at least 3 vertices"));
        }
        ring.push(ring[0]);
        GeoJsonPolygon::from_rings(vec![ring])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GeoJsonPolygon {
        GeoJsonPolygon::from_rings(vec![vec![
            [13.0, 52.0],
            [14.0, 52.0],
            [14.0, 53.0],
            [13.0, 53.0],
            [13.0, 52.0],
        ]])
        .unwrap()
    }

    #[test]
    fn point_uses_longitude_first() {
        let point = GeoJsonPoint::new(LatLng::new(52.45, 13.52));
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Point", "coordinates": [13.52, 52.45]})
        );
        assert_eq!(point.lat_lng(), LatLng::new(52.45, 13.52));
    }

    #[test]
    fn open_ring_is_rejected() {
        let err = GeoJsonPolygon::from_rings(vec![vec![
            [13.0, 52.0],
            [14.0, 52.0],
            [14.0, 53.0],
            [13.0, 53.0],
        ]])
        .unwrap_err();
        assert!(err.message.contains("not closed"));
    }

    #[test]
    fn contains_and_bounds() {
        let polygon = square();
        assert!(polygon.contains(LatLng::new(52.5, 13.5)));
        assert!(!polygon.contains(LatLng::new(54.0, 13.5)));
        let bounds = polygon.bounds().unwrap();
        assert_eq!(bounds.north, 53.0);
        assert_eq!(bounds.west, 13.0);
    }

    #[test]
    fn draft_closes_ring_on_finish() {
        let mut draft = PolygonDraft::new();
        draft.add_vertex(LatLng::new(52.0, 13.0)).unwrap();
        draft.add_vertex(LatLng::new(52.0, 14.0)).unwrap();
        assert!(draft.finish().is_err());
        draft.add_vertex(LatLng::new(53.0, 14.0)).unwrap();
        let polygon = draft.finish().unwrap();
        assert_eq!(polygon.outer_ring().len(), 4);
        assert_eq!(polygon.outer_ring()[0], polygon.outer_ring()[3]);
    }

    #[test]
    fn draft_rejects_out_of_range_vertex() {
        let mut draft = PolygonDraft::new();
        assert!(draft.add_vertex(LatLng::new(91.0, 0.0)).is_err());
        assert!(draft.is_empty());
    }
}
