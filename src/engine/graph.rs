use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::{Vec2, vec2};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::topology::{NodeKind, Topology};
use crate::util::stable_pair;

use super::LayoutEngine;

/// Jitter radius applied around a neighbor centroid when placing a node next
/// to already-settled neighbors.
const CENTROID_JITTER: f32 = 24.0;

/// Per-node simulation state. `pin`, when set, overrides the integrated
/// position each tick; the node is immovable until the pin clears.
#[derive(Clone, Debug)]
pub(super) struct SimNode {
    pub(super) id: String,
    pub(super) kind: NodeKind,
    pub(super) position: Vec2,
    pub(super) velocity: Vec2,
    pub(super) pin: Option<Vec2>,
    pub(super) radius: f32,
    pub(super) degree: usize,
}

/// An edge resolved to node indices. Parallel edges are kept as-is so their
/// link forces stack.
#[derive(Clone, Copy, Debug)]
pub(super) struct SimEdge {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) weight: f32,
}

/// Deterministic initial placement: a ring scaled to the viewport with a
/// seeded per-id jitter, always inside the configured bounds.
fn seeded_position(config: &EngineConfig, id: &str, index: usize, count: usize) -> Vec2 {
    let half_min = config.viewport[0].min(config.viewport[1]) * 0.5;
    let angle = (index as f32 / count.max(1) as f32) * TAU;
    let (jx, jy) = stable_pair(config.seed, id);
    vec2(angle.cos(), angle.sin()) * (half_min * 0.5) + vec2(jx, jy) * (half_min * 0.2)
}

impl LayoutEngine {
    /// Replaces the active node and edge sets wholesale.
    ///
    /// The incoming topology is validated first; on violation the previous
    /// working set is retained unchanged. On success positions are seeded
    /// deterministically and the simulation restarts at full alpha.
    pub fn load_topology(&mut self, topology: &Topology) -> Result<(), EngineError> {
        topology.validate()?;

        let count = topology.nodes.len();
        let mut nodes = Vec::with_capacity(count);
        for (index, record) in topology.nodes.iter().enumerate() {
            nodes.push(SimNode {
                id: record.id.clone(),
                kind: record.kind,
                position: seeded_position(&self.config, &record.id, index, count),
                velocity: Vec2::ZERO,
                pin: None,
                radius: record.kind.radius(),
                degree: 0,
            });
        }

        self.swap_working_set(nodes, topology);
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "topology loaded"
        );
        Ok(())
    }

    /// Applies a new topology while preserving the state of every node whose
    /// id survives: position, velocity, and pin carry over byte-for-byte.
    ///
    /// New nodes land at the centroid of their already-placed neighbors when
    /// they have any, otherwise on the seeded ring. The simulation is warmed
    /// back up so the layout can absorb the change without restarting.
    pub fn update_topology(&mut self, topology: &Topology) -> Result<(), EngineError> {
        topology.validate()?;

        let mut prior = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();

        let count = topology.nodes.len();
        let mut nodes = Vec::with_capacity(count);
        let mut retained = Vec::with_capacity(count);
        for (index, record) in topology.nodes.iter().enumerate() {
            if let Some(mut node) = prior.remove(&record.id) {
                node.kind = record.kind;
                node.radius = record.kind.radius();
                node.degree = 0;
                nodes.push(node);
                retained.push(true);
            } else {
                nodes.push(SimNode {
                    id: record.id.clone(),
                    kind: record.kind,
                    position: seeded_position(&self.config, &record.id, index, count),
                    velocity: Vec2::ZERO,
                    pin: None,
                    radius: record.kind.radius(),
                    degree: 0,
                });
                retained.push(false);
            }
        }

        self.swap_working_set(nodes, topology);

        // Second pass once adjacency exists: a new node with placed
        // neighbors moves to their centroid plus a seeded jitter.
        for index in 0..self.nodes.len() {
            if retained[index] {
                continue;
            }
            let mut centroid = Vec2::ZERO;
            let mut placed = 0usize;
            for &neighbor in &self.adjacency[index] {
                if retained[neighbor] {
                    centroid += self.nodes[neighbor].position;
                    placed += 1;
                }
            }
            if placed > 0 {
                let (jx, jy) = stable_pair(self.config.seed, &self.nodes[index].id);
                self.nodes[index].position =
                    centroid / placed as f32 + vec2(jx, jy) * CENTROID_JITTER;
            }
        }

        self.alpha = self.alpha.max(super::REHEAT_ALPHA);
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "topology updated"
        );
        Ok(())
    }

    /// Deletes a node and every edge referencing it. Returns whether the id
    /// existed. A selection or hover pointing at the node is cleared.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        self.nodes.remove(index);
        self.edges.retain(|edge| edge.source != index && edge.target != index);
        for edge in &mut self.edges {
            if edge.source > index {
                edge.source -= 1;
            }
            if edge.target > index {
                edge.target -= 1;
            }
        }
        self.reindex();

        if self.selected_id() == Some(id) {
            self.set_selected(None);
        }
        if self.hovered_id() == Some(id) {
            self.set_hovered(None);
        }

        debug!(id, "node removed");
        true
    }

    /// Ids adjacent to `id`, deduplicated, in stable node order.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(&index) = self.index_by_id.get(id) else {
            return Vec::new();
        };
        self.adjacency[index]
            .iter()
            .map(|&neighbor| self.nodes[neighbor].id.as_str())
            .collect()
    }

    /// Number of links incident to `id`, parallel links counted.
    pub fn degree(&self, id: &str) -> usize {
        self.index_by_id
            .get(id)
            .map_or(0, |&index| self.nodes[index].degree)
    }

    /// Installs a fully built node vector and resolves the topology's links
    /// against it. Called only after validation, so every lookup succeeds;
    /// the old working set is replaced in one assignment per field.
    fn swap_working_set(&mut self, nodes: Vec<SimNode>, topology: &Topology) {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_id.insert(node.id.clone(), index);
        }

        let edges = topology
            .links
            .iter()
            .map(|link| SimEdge {
                source: index_by_id[link.source.as_str()],
                target: index_by_id[link.target.as_str()],
                weight: link.weight,
            })
            .collect::<Vec<_>>();

        self.nodes = nodes;
        self.edges = edges;
        self.index_by_id = index_by_id;
        self.reindex();

        for stale in [
            self.selected_id().map(str::to_owned),
            self.hovered_id().map(str::to_owned),
        ]
        .into_iter()
        .flatten()
        {
            if !self.index_by_id.contains_key(&stale) {
                if self.selected_id() == Some(stale.as_str()) {
                    self.set_selected(None);
                }
                if self.hovered_id() == Some(stale.as_str()) {
                    self.set_hovered(None);
                }
            }
        }
    }

    /// Recomputes the id index, per-node degrees, and the deduplicated
    /// adjacency lists from the current nodes and edges.
    fn reindex(&mut self) {
        self.index_by_id.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            self.index_by_id.insert(node.id.clone(), index);
        }

        for node in &mut self.nodes {
            node.degree = 0;
        }
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            self.nodes[edge.source].degree += 1;
            self.nodes[edge.target].degree += 1;
            if edge.source != edge.target {
                adjacency[edge.source].push(edge.target);
                adjacency[edge.target].push(edge.source);
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }
        self.adjacency = adjacency;
    }
}

#[cfg(test)]
mod tests {
    use crate::topology::{AgentLink, AgentNode, LinkKind};

    use super::*;

    fn node(id: &str) -> AgentNode {
        AgentNode {
            id: id.to_owned(),
            kind: NodeKind::Primary,
        }
    }

    fn link(source: &str, target: &str) -> AgentLink {
        AgentLink {
            source: source.to_owned(),
            target: target.to_owned(),
            weight: 1.0,
            kind: LinkKind::Collaboration,
        }
    }

    fn triangle() -> Topology {
        Topology {
            nodes: vec![node("a"), node("b"), node("c")],
            links: vec![link("a", "b"), link("b", "c")],
        }
    }

    fn engine_with(topology: &Topology) -> LayoutEngine {
        LayoutEngine::with_topology(EngineConfig::default(), topology).expect("valid topology")
    }

    #[test]
    fn load_seeds_positions_inside_viewport() {
        let engine = engine_with(&triangle());
        let config = EngineConfig::default();
        for id in ["a", "b", "c"] {
            let position = engine.position_of(id).expect("node placed");
            assert!(position.x.abs() <= config.viewport[0] * 0.5);
            assert!(position.y.abs() <= config.viewport[1] * 0.5);
        }
    }

    #[test]
    fn load_rejection_is_atomic() {
        let mut engine = engine_with(&triangle());
        let before = engine.snapshot();

        let bad = Topology {
            nodes: vec![node("x")],
            links: vec![link("x", "ghost")],
        };
        let error = engine.load_topology(&bad).unwrap_err();
        assert!(matches!(error, EngineError::Integrity { .. }));

        assert_eq!(engine.node_count(), 3);
        assert_eq!(engine.edge_count(), 2);
        assert_eq!(engine.snapshot().positions, before.positions);
    }

    #[test]
    fn update_retains_state_for_surviving_ids() {
        let mut engine = engine_with(&triangle());
        for _ in 0..10 {
            engine.step();
        }
        let before = engine.snapshot();

        // Same ids, reordered, plus a newcomer.
        let next = Topology {
            nodes: vec![node("c"), node("a"), node("b"), node("d")],
            links: vec![link("a", "b"), link("b", "c"), link("c", "d")],
        };
        engine.update_topology(&next).expect("valid update");

        for (id, position) in &before.positions {
            assert_eq!(
                engine.position_of(id),
                Some(*position),
                "retained node `{id}` must not move on update"
            );
        }
        assert!(engine.position_of("d").is_some());
    }

    #[test]
    fn update_places_newcomer_near_placed_neighbors() {
        let mut engine = engine_with(&triangle());
        for _ in 0..10 {
            engine.step();
        }
        let b = engine.position_of("b").unwrap();
        let c = engine.position_of("c").unwrap();

        let next = Topology {
            nodes: vec![node("a"), node("b"), node("c"), node("d")],
            links: vec![
                link("a", "b"),
                link("b", "c"),
                link("d", "b"),
                link("d", "c"),
            ],
        };
        engine.update_topology(&next).expect("valid update");

        let d = engine.position_of("d").unwrap();
        let centroid = (b + c) * 0.5;
        assert!(
            d.distance(centroid) <= CENTROID_JITTER * 2.0,
            "newcomer expected near {centroid:?}, got {d:?}"
        );
    }

    #[test]
    fn update_rejection_is_atomic() {
        let mut engine = engine_with(&triangle());
        let before = engine.snapshot();

        let bad = Topology {
            nodes: vec![node("a"), node("a")],
            links: Vec::new(),
        };
        assert!(engine.update_topology(&bad).is_err());
        assert_eq!(engine.node_count(), 3);
        assert_eq!(engine.snapshot().positions, before.positions);
    }

    #[test]
    fn remove_node_cascades_edges() {
        let mut engine = engine_with(&triangle());
        assert!(engine.remove_node("b"));
        assert_eq!(engine.node_count(), 2);
        assert_eq!(engine.edge_count(), 0, "both edges referenced b");
        assert!(!engine.remove_node("b"), "second removal is a no-op");
        assert!(engine.position_of("a").is_some());
        assert!(engine.position_of("c").is_some());
    }

    #[test]
    fn remove_node_clears_dangling_selection() {
        let mut engine = engine_with(&triangle());
        engine.set_selected(Some("b"));
        engine.set_hovered(Some("b"));
        engine.remove_node("b");
        assert_eq!(engine.selected_id(), None);
        assert_eq!(engine.hovered_id(), None);
    }

    #[test]
    fn neighbors_and_degree_follow_edges() {
        let engine = engine_with(&triangle());
        assert_eq!(engine.neighbors("b"), vec!["a", "c"]);
        assert_eq!(engine.degree("b"), 2);
        assert_eq!(engine.degree("a"), 1);
        assert_eq!(engine.neighbors("ghost"), Vec::<&str>::new());
    }

    #[test]
    fn parallel_links_count_toward_degree_once_per_link() {
        let topology = Topology {
            nodes: vec![node("a"), node("b")],
            links: vec![link("a", "b"), link("a", "b")],
        };
        let engine = engine_with(&topology);
        assert_eq!(engine.degree("a"), 2);
        assert_eq!(engine.neighbors("a"), vec!["b"], "adjacency deduplicates");
        assert_eq!(engine.edge_count(), 2, "edges do not deduplicate");
    }

    #[test]
    fn identical_seeds_place_identically() {
        let first = engine_with(&triangle());
        let second = engine_with(&triangle());
        assert_eq!(first.snapshot().positions, second.snapshot().positions);

        let other_seed = LayoutEngine::with_topology(
            EngineConfig {
                seed: 7,
                ..EngineConfig::default()
            },
            &triangle(),
        )
        .unwrap();
        assert_ne!(
            first.snapshot().positions,
            other_seed.snapshot().positions,
            "different seed, different placement"
        );
    }
}
