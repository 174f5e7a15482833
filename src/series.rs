use crate::aggregate::{NodeId, Registry, NATION_TARGET};
use crate::types::{MarkerDatum, RegionKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Build the marker series shown when a region is selected: child region
/// markers for the nation and for states, leaf store markers for cities.
pub fn materialize(registry: &Registry, target: &str) -> Option<Vec<MarkerDatum>> {
    let node = registry.get(target)?;
    match node.kind {
        RegionKind::City => Some(node.leaves.clone()),
        RegionKind::Nation | RegionKind::State => Some(
            node.children
                .iter()
                .map(|&id| region_marker(registry, id))
                .collect(),
        ),
    }
}

fn region_marker(registry: &Registry, id: NodeId) -> MarkerDatum {
    let node = registry.node(id);
    MarkerDatum {
        name: node.name.clone(),
        count: node.count,
        stores: node.stores,
        lat: node.lat,
        long: node.long,
        state: node.state.clone(),
        target: Some(node.target.clone()),
        kind: Some(node.kind),
    }
}

/// On-demand series memoization: each target's series is materialized from
/// the registry at most once.
#[derive(Default)]
pub struct SeriesCache {
    built: HashMap<String, Arc<Vec<MarkerDatum>>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(&mut self, registry: &Registry, target: &str) -> Option<Arc<Vec<MarkerDatum>>> {
        if let Some(series) = self.built.get(target) {
            return Some(series.clone());
        }
        let series = Arc::new(materialize(registry, target)?);
        self.built.insert(target.to_string(), series.clone());
        Some(series)
    }
}

/// Drill-down navigation state: a series cache plus the single currently
/// visible series, tracked explicitly by target.
pub struct DrillDown {
    cache: SeriesCache,
    active: String,
}

impl DrillDown {
    pub fn new() -> Self {
        Self {
            cache: SeriesCache::new(),
            active: NATION_TARGET.to_string(),
        }
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    /// Select a region. On an unknown target the view is left unchanged.
    pub fn enter(
        &mut self,
        registry: &Registry,
        target: &str,
    ) -> Option<Arc<Vec<MarkerDatum>>> {
        let series = self.cache.series(registry, target)?;
        self.active = target.to_string();
        Some(series)
    }

    /// Zoom-out: back to the nation series.
    pub fn home(&mut self, registry: &Registry) -> Arc<Vec<MarkerDatum>> {
        self.active = NATION_TARGET.to_string();
        self.cache
            .series(registry, NATION_TARGET)
            .unwrap_or_else(|| Arc::new(Vec::new()))
    }
}

impl Default for DrillDown {
    fn default() -> Self {
        Self::new()
    }
}
