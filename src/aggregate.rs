use crate::geodata::StateAtlas;
use crate::types::{MarkerDatum, RegionKind, StoreRecord};
use std::collections::HashMap;

pub const NATION_TARGET: &str = "US";

pub type NodeId = usize;

/// Aggregated geography entry: the nation root, one node per distinct state,
/// one node per distinct city. State and nation nodes list child regions;
/// city nodes list leaf store markers.
#[derive(Debug)]
pub struct RegionNode {
    pub target: String,
    pub kind: RegionKind,
    pub name: String,
    pub count: u64,
    pub stores: u64,
    pub lat: f64,
    pub long: f64,
    pub state: String,
    pub children: Vec<NodeId>,
    pub leaves: Vec<MarkerDatum>,
}

/// The whole aggregation result: an arena of region nodes (node 0 is the
/// nation root) plus a lookup from drill-down target to node. Built fresh on
/// every load, owned by the caller; nothing here is process-global.
#[derive(Debug)]
pub struct Registry {
    nodes: Vec<RegionNode>,
    index: HashMap<String, NodeId>,
    dropped: u64,
}

const ROOT: NodeId = 0;

impl Registry {
    fn new() -> Self {
        let root = RegionNode {
            target: NATION_TARGET.to_string(),
            kind: RegionKind::Nation,
            name: "United States".to_string(),
            count: 0,
            stores: 0,
            lat: 0.0,
            long: 0.0,
            state: NATION_TARGET.to_string(),
            children: Vec::new(),
            leaves: Vec::new(),
        };
        let mut index = HashMap::new();
        index.insert(NATION_TARGET.to_string(), ROOT);
        Self {
            nodes: vec![root],
            index,
            dropped: 0,
        }
    }

    pub fn root(&self) -> &RegionNode {
        &self.nodes[ROOT]
    }

    pub fn get(&self, target: &str) -> Option<&RegionNode> {
        self.index.get(target).map(|&id| &self.nodes[id])
    }

    pub fn node(&self, id: NodeId) -> &RegionNode {
        &self.nodes[id]
    }

    /// Number of region nodes, the nation root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Records skipped because their state code resolved to no polygon.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drill-down targets in arena order, nation root first.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.target.as_str())
    }

    fn push(&mut self, node: RegionNode) -> NodeId {
        let id = self.nodes.len();
        self.index.insert(node.target.clone(), id);
        self.nodes.push(node);
        id
    }
}

/// Single forward pass over the store records.
///
/// Per record: resolve the state polygon (no polygon means the record is
/// skipped with no other effect), then upsert the state node, then the city
/// node, then append one leaf marker to the city. City nodes are keyed by
/// city name alone, matching the upstream feed's assumption that names are
/// unique nationwide.
pub fn build_registry(records: &[StoreRecord], atlas: &StateAtlas) -> Registry {
    let mut registry = Registry::new();

    for record in records {
        let polygon = match atlas.resolve(&record.state) {
            Some(p) => p,
            None => {
                registry.dropped += 1;
                continue;
            }
        };

        registry.nodes[ROOT].count += record.count;
        registry.nodes[ROOT].stores += 1;

        // State level
        let state_id = match registry.index.get(&record.state) {
            Some(&id) => {
                let node = &mut registry.nodes[id];
                node.stores += 1;
                node.count += record.count;
                id
            }
            None => {
                let id = registry.push(RegionNode {
                    target: record.state.clone(),
                    kind: RegionKind::State,
                    name: polygon.name.clone(),
                    count: record.count,
                    stores: 1,
                    lat: polygon.lat,
                    long: polygon.long,
                    state: record.state.clone(),
                    children: Vec::new(),
                    leaves: Vec::new(),
                });
                registry.nodes[ROOT].children.push(id);
                id
            }
        };

        // City level
        let city_id = match registry.index.get(&record.city) {
            Some(&id) => {
                let node = &mut registry.nodes[id];
                node.stores += 1;
                node.count += record.count;
                id
            }
            None => {
                let id = registry.push(RegionNode {
                    target: record.city.clone(),
                    kind: RegionKind::City,
                    name: record.city.clone(),
                    count: record.count,
                    stores: 1,
                    lat: record.lat,
                    long: record.long,
                    state: record.state.clone(),
                    children: Vec::new(),
                    leaves: Vec::new(),
                });
                registry.nodes[state_id].children.push(id);
                id
            }
        };

        // Leaf: one marker per input record, in input order, never deduped.
        registry.nodes[city_id].leaves.push(MarkerDatum {
            name: record.location.clone(),
            count: record.count,
            stores: 1,
            lat: record.lat,
            long: record.long,
            state: record.state.clone(),
            target: None,
            kind: None,
        });
    }

    registry
}
