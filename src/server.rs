use crate::aggregate::Registry;
use crate::config::AppConfig;
use crate::series::DrillDown;
use crate::types::{MarkerDatum, RegionKind};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Zoom level the frontend uses when focusing a single city.
const CITY_ZOOM_LEVEL: u8 = 64;

pub struct AppState {
    pub registry: Registry,
    pub drilldown: Mutex<DrillDown>,
    pub polygon_prefix: String,
}

#[derive(Serialize)]
pub struct RegionSummary {
    target: String,
    #[serde(rename = "type")]
    kind: RegionKind,
    name: String,
    count: u64,
    stores: u64,
    lat: f64,
    long: f64,
    state: String,
    zoom: ZoomHint,
}

/// How the frontend should move the camera when this region is selected.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ZoomHint {
    Home,
    Polygon { id: String },
    Point { lat: f64, long: f64, level: u8 },
}

pub async fn start_server(config: AppConfig, registry: Registry) -> Result<()> {
    let state = Arc::new(AppState {
        registry,
        drilldown: Mutex::new(DrillDown::new()),
        polygon_prefix: config.geodata.id_prefix.clone(),
    });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    println!("Starting server on http://{}", addr);

    let mut app = Router::new()
        .route("/api/series/:target", get(series_handler))
        .route("/api/region/:target", get(region_handler))
        .route("/api/home", get(home_handler));

    if let Some(static_dir) = &config.server.static_dir {
        app = app.nest_service("/", ServeDir::new(static_dir));
    }

    let app = app.layer(CorsLayer::permissive()).with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Marker series for a region, selecting it as the active view. The series
/// is memoized on first request.
async fn series_handler(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
) -> Result<Json<Vec<MarkerDatum>>, StatusCode> {
    let mut drilldown = state
        .drilldown
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match drilldown.enter(&state.registry, &target) {
        Some(series) => Ok(Json(series.as_ref().clone())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn region_handler(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
) -> Result<Json<RegionSummary>, StatusCode> {
    let node = state.registry.get(&target).ok_or(StatusCode::NOT_FOUND)?;

    let zoom = match node.kind {
        RegionKind::Nation => ZoomHint::Home,
        RegionKind::State => ZoomHint::Polygon {
            id: format!("{}{}", state.polygon_prefix, node.target),
        },
        RegionKind::City => ZoomHint::Point {
            lat: node.lat,
            long: node.long,
            level: CITY_ZOOM_LEVEL,
        },
    };

    Ok(Json(RegionSummary {
        target: node.target.clone(),
        kind: node.kind,
        name: node.name.clone(),
        count: node.count,
        stores: node.stores,
        lat: node.lat,
        long: node.long,
        state: node.state.clone(),
        zoom,
    }))
}

/// Zoom-out: reset the active view to the nation series and return it.
async fn home_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MarkerDatum>>, StatusCode> {
    let mut drilldown = state
        .drilldown
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let series = drilldown.home(&state.registry);
    Ok(Json(series.as_ref().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_hint_serializes_tagged() {
        let polygon = ZoomHint::Polygon {
            id: "US-CA".into(),
        };
        let json = serde_json::to_value(&polygon).unwrap();
        assert_eq!(json["kind"], "polygon");
        assert_eq!(json["id"], "US-CA");

        let point = ZoomHint::Point {
            lat: 34.05,
            long: -118.24,
            level: CITY_ZOOM_LEVEL,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["kind"], "point");
        assert_eq!(json["level"], 64);
    }
}
