use hereiam_session::TileLayerChoice;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct TileProvider {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub url: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl TileProvider {
    /// Layer choice that routes tile requests through the local proxy.
    pub fn layer_choice(&self) -> TileLayerChoice {
        TileLayerChoice {
            id: self.id.clone(),
            url: format!("/ui/tiles/{}/{{z}}/{{x}}/{{y}}", self.id),
        }
    }

    pub fn accepts_zoom(&self, z: u8) -> bool {
        (self.min_zoom..=self.max_zoom).contains(&z)
    }

    pub fn upstream_url(&self, z: u8, x: u32, y: u32) -> String {
        self.url
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileConfig {
    providers: Option<HashMap<String, TileProviderConfig>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileProviderConfig {
    name: Option<String>,
    url: String,
    min_zoom: Option<u8>,
    max_zoom: Option<u8>,
}

pub fn tile_providers_from_value(value: &serde_json::Value) -> Option<HashMap<String, TileProvider>> {
    let config: TileConfig = serde_json::from_value(value.clone()).ok()?;
    let mut providers = HashMap::new();
    for (id, provider) in config.providers.unwrap_or_default() {
        if !provider.url.starts_with("http") {
            continue;
        }
        let name = provider.name.unwrap_or_else(|| id.clone());
        let min_zoom = provider.min_zoom.unwrap_or(0);
        let max_zoom = provider.max_zoom.unwrap_or(19);
        providers.insert(
            id.clone(),
            TileProvider {
                id,
                name,
                url: provider.url,
                min_zoom,
                max_zoom,
            },
        );
    }
    if providers.is_empty() {
        None
    } else {
        Some(providers)
    }
}

pub fn default_tile_providers() -> HashMap<String, TileProvider> {
    [
        ("osm", "OpenStreetMap", "https://tile.openstreetmap.org/{z}/{x}/{y}.png", 19),
        ("hot", "Humanitarian", "https://a.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png", 19),
        ("topo", "Topographic", "https://tile.opentopomap.org/{z}/{x}/{y}.png", 17),
    ]
    .into_iter()
    .map(|(id, name, url, max_zoom)| {
        (
            id.to_string(),
            TileProvider {
                id: id.to_string(),
                name: name.to_string(),
                url: url.to_string(),
                min_zoom: 0,
                max_zoom,
            },
        )
    })
    .collect()
}

/// Providers ordered by id, for menus.
pub fn sorted_providers(providers: &HashMap<String, TileProvider>) -> Vec<&TileProvider> {
    let mut list: Vec<_> = providers.values().collect();
    list.sort_by(|a, b| a.id.cmp(&b.id));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_skips_non_http_sources() {
        let value = json!({
            "providers": {
                "sat": {"name": "Satellite", "url": "https://tiles.example.org/{z}/{y}/{x}.jpg", "maxZoom": 12},
                "local": {"url": "file:///tmp/{z}/{x}/{y}.png"}
            }
        });
        let providers = tile_providers_from_value(&value).unwrap();
        assert_eq!(providers.len(), 1);
        let sat = &providers["sat"];
        assert!(sat.accepts_zoom(12));
        assert!(!sat.accepts_zoom(13));
        assert_eq!(sat.upstream_url(3, 4, 5), "https://tiles.example.org/3/5/4.jpg");
        assert!(tile_providers_from_value(&json!({"providers": {}})).is_none());
    }

    #[test]
    fn layer_choice_points_at_proxy() {
        let providers = default_tile_providers();
        let choice = providers["osm"].layer_choice();
        assert_eq!(choice.url, "/ui/tiles/osm/{z}/{x}/{y}");
        let ids: Vec<_> = sorted_providers(&providers).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["hot", "osm", "topo"]);
    }
}
