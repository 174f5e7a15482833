use serde::Serialize;

/// One store row after field coercion, straight from the feed.
#[derive(Debug, Clone)]
pub struct StoreRecord {
    pub state: String,
    pub long: f64,
    pub lat: f64,
    pub location: String,
    pub city: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Nation,
    State,
    City,
}

/// A single entry in a marker series, shaped the way the map frontend
/// consumes it. Region markers carry a `target` for drill-down; leaf store
/// markers carry neither `target` nor `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDatum {
    pub name: String,
    pub count: u64,
    pub stores: u64,
    pub lat: f64,
    pub long: f64,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RegionKind>,
}
