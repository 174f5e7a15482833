use crate::config::GeodataConfig;
use anyhow::{anyhow, Context, Result};
use geo::{InteriorPoint, MultiPolygon};
use geojson::GeoJson;
use std::collections::HashMap;
use std::convert::TryInto;
use std::fs::File;
use std::io::BufReader;

/// One state polygon from the geodata file, reduced to what marker placement
/// needs: a display name and a representative point inside the shape.
#[derive(Debug, Clone)]
pub struct StatePolygon {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub long: f64,
}

pub struct StateAtlas {
    id_prefix: String,
    polygons: HashMap<String, StatePolygon>,
}

impl StateAtlas {
    pub fn new(id_prefix: impl Into<String>, polygons: Vec<StatePolygon>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            polygons: polygons.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Look up a state code ("CA") against the prefixed polygon ids ("US-CA").
    pub fn resolve(&self, code: &str) -> Option<&StatePolygon> {
        self.polygons.get(&self.polygon_id(code))
    }

    pub fn polygon_id(&self, code: &str) -> String {
        format!("{}{}", self.id_prefix, code)
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

pub fn load_atlas(config: &GeodataConfig) -> Result<StateAtlas> {
    println!("Loading state geodata from {:?}...", config.path);
    let file = File::open(&config.path)
        .with_context(|| format!("Failed to open geodata file: {:?}", config.path))?;
    let reader = BufReader::new(file);
    let geojson = GeoJson::from_reader(reader).context("Failed to parse geodata GeoJSON")?;

    let atlas = parse_atlas(geojson, &config.id_prefix)?;
    println!("Loaded {} state polygons", atlas.len());
    Ok(atlas)
}

pub fn parse_atlas(geojson: GeoJson, id_prefix: &str) -> Result<StateAtlas> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Geodata must be a FeatureCollection")),
    };

    let mut polygons = Vec::new();

    for feature in collection.features {
        // Polygon id from the feature id, falling back to an "id" property.
        let id = match &feature.id {
            Some(geojson::feature::Id::String(s)) => s.clone(),
            _ => match feature
                .properties
                .as_ref()
                .and_then(|props| props.get("id"))
            {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ => continue,
            },
        };

        let name = match feature
            .properties
            .as_ref()
            .and_then(|props| props.get("name"))
        {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => id.clone(),
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let valid_geo: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geodata geometry: {:?}", e))?;
                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // Skip points/lines
                }
            }
            None => continue,
        };

        // Representative point guaranteed to fall inside the polygon, so
        // state markers never land in a lake or a concave bight.
        let point = match geometry.interior_point() {
            Some(pt) => pt,
            None => continue, // Degenerate geometry
        };

        polygons.push(StatePolygon {
            id,
            name,
            lat: point.y(),
            long: point.x(),
        });
    }

    Ok(StateAtlas::new(id_prefix, polygons))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_feature(id: &str, name: &str, x0: f64, y0: f64) -> String {
        format!(
            r#"{{
                "type": "Feature",
                "id": "{id}",
                "properties": {{ "name": "{name}" }},
                "geometry": {{
                    "type": "Polygon",
                    "coordinates": [[
                        [{x0}, {y0}], [{x1}, {y0}], [{x1}, {y1}], [{x0}, {y1}], [{x0}, {y0}]
                    ]]
                }}
            }}"#,
            x1 = x0 + 2.0,
            y1 = y0 + 2.0,
        )
    }

    fn atlas_from(features: &[String]) -> StateAtlas {
        let json = format!(
            r#"{{ "type": "FeatureCollection", "features": [{}] }}"#,
            features.join(",")
        );
        let geojson: GeoJson = json.parse().unwrap();
        parse_atlas(geojson, "US-").unwrap()
    }

    #[test]
    fn resolves_prefixed_state_code() {
        let atlas = atlas_from(&[
            square_feature("US-CA", "California", -120.0, 36.0),
            square_feature("US-TX", "Texas", -99.0, 30.0),
        ]);
        assert_eq!(atlas.len(), 2);

        let ca = atlas.resolve("CA").unwrap();
        assert_eq!(ca.name, "California");
        // Interior point of the square is inside it.
        assert!(ca.long > -120.0 && ca.long < -118.0);
        assert!(ca.lat > 36.0 && ca.lat < 38.0);
    }

    #[test]
    fn unknown_code_resolves_to_none() {
        let atlas = atlas_from(&[square_feature("US-CA", "California", -120.0, 36.0)]);
        assert!(atlas.resolve("ZZ").is_none());
    }

    #[test]
    fn skips_feature_without_id() {
        let feature = r#"{
            "type": "Feature",
            "properties": { "name": "Nowhere" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]
            }
        }"#
        .to_string();
        let atlas = atlas_from(&[feature]);
        assert!(atlas.is_empty());
    }

    #[test]
    fn non_polygon_features_are_skipped() {
        let point = r#"{
            "type": "Feature",
            "id": "US-XX",
            "properties": { "name": "Somewhere" },
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
        }"#
        .to_string();
        let atlas = atlas_from(&[point]);
        assert!(atlas.resolve("XX").is_none());
    }
}
