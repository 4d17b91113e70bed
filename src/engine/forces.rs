use std::f32::consts::TAU;

use glam::{Vec2, vec2};

use crate::config::EngineConfig;

use super::graph::{SimEdge, SimNode};
use super::quadtree::{QuadBounds, QuadNode};

const BARNES_HUT_THETA: f32 = 0.72;
/// Floor for every pairwise distance before division. Keeps coincident nodes
/// from producing NaN; they separate along `separation_dir` instead.
const MIN_DISTANCE: f32 = 1e-3;

/// Reusable per-tick buffers, cleared and refilled each composition.
#[derive(Default)]
pub(super) struct ForceScratch {
    pub(super) forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

/// Deterministic direction for separating exactly coincident nodes, derived
/// from the pair's indices via golden-ratio spacing.
fn separation_dir(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

/// Computes the net force on every node into `scratch.forces`.
///
/// Five contributors summed linearly, all in simulation space: link
/// attraction, charge repulsion (Barnes-Hut, capped interaction distance),
/// centering, collision separation, axis anchoring. Pure with respect to the
/// node set; integration happens in the caller.
pub(super) fn compose(
    nodes: &[SimNode],
    edges: &[SimEdge],
    config: &EngineConfig,
    scratch: &mut ForceScratch,
) {
    let count = nodes.len();
    scratch.forces.resize(count, Vec2::ZERO);
    scratch.forces.fill(Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();

    if count == 0 {
        return;
    }

    let mut max_radius = 0.0_f32;
    for node in nodes {
        scratch.positions.push(node.position);
        scratch.radii.push(node.radius);
        max_radius = max_radius.max(node.radius);
    }

    let positions = &scratch.positions;
    let radii = &scratch.radii;
    let forces = &mut scratch.forces;

    if let Some(tree) = QuadNode::build(positions) {
        if config.charge_strength != 0.0 {
            let max_distance_sq = config.charge_max_distance * config.charge_max_distance;
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_charge(
                    &tree,
                    index,
                    positions,
                    config.charge_strength,
                    max_distance_sq,
                    force,
                );
            }
        }

        if config.collision_strength > 0.0 && max_radius > 0.0 {
            let reach = max_radius * 2.0;
            accumulate_collisions(
                &tree,
                &tree,
                true,
                positions,
                radii,
                config.collision_strength,
                reach * reach,
                forces,
            );
        }
    }

    apply_link_forces(nodes, edges, config, forces);

    for (index, force) in forces.iter_mut().enumerate() {
        let position = positions[index];
        *force -= position * config.center_strength;
        force.x += (config.anchor[0] - position.x) * config.axis_x_strength;
        force.y += (config.anchor[1] - position.y) * config.axis_y_strength;
    }
}

/// Link attraction toward the per-edge rest distance. Strength is damped by
/// the degree of the more-connected endpoint so hubs are not overwhelmed;
/// parallel edges each contribute, stacking additively.
fn apply_link_forces(
    nodes: &[SimNode],
    edges: &[SimEdge],
    config: &EngineConfig,
    forces: &mut [Vec2],
) {
    for edge in edges {
        let (source, target) = (edge.source, edge.target);
        if source == target {
            continue;
        }

        let delta = nodes[source].position - nodes[target].position;
        let distance_sq = delta.length_squared();
        let (direction, distance) = if distance_sq <= MIN_DISTANCE * MIN_DISTANCE {
            (separation_dir(source, target), MIN_DISTANCE)
        } else {
            let distance = distance_sq.sqrt();
            (delta / distance, distance)
        };

        let rest = config.link_distance + nodes[source].radius + nodes[target].radius;
        let damping = nodes[source].degree.max(nodes[target].degree).max(1) as f32;
        let strength = config.link_strength * edge.weight / damping;
        let correction = direction * ((distance - rest) * strength);

        forces[source] -= correction;
        forces[target] += correction;
    }
}

fn charge_between(
    point: Vec2,
    other: Vec2,
    index: usize,
    other_index: usize,
    strength: f32,
    max_distance_sq: f32,
) -> Vec2 {
    let delta = point - other;
    let distance_sq = delta.length_squared();
    if distance_sq > max_distance_sq {
        return Vec2::ZERO;
    }

    if distance_sq <= MIN_DISTANCE * MIN_DISTANCE {
        return separation_dir(index, other_index) * (-strength / (MIN_DISTANCE * MIN_DISTANCE));
    }

    (delta / distance_sq.sqrt()) * (-strength / distance_sq)
}

/// Inverse-square charge on `index` from the whole tree. Cells that pass the
/// Barnes-Hut opening test act as a single body at their center of mass;
/// anything wholly beyond the interaction cap is skipped.
fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    max_distance_sq: f32,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    let point_bounds = QuadBounds {
        center: point,
        half_extent: 0.0,
    };
    if node.bounds.gap_sq(point_bounds) > max_distance_sq {
        return;
    }

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *force += charge_between(
                    point,
                    positions[other],
                    index,
                    other,
                    strength,
                    max_distance_sq,
                );
            }
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_squared().max(MIN_DISTANCE * MIN_DISTANCE);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < BARNES_HUT_THETA)
        && node.mass > 1.0;

    if can_approximate {
        if distance_sq <= max_distance_sq {
            *force += (delta / distance) * (-strength * node.mass / distance_sq);
        }
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge(child, index, positions, strength, max_distance_sq, force);
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_squared();
    let (direction, distance) = if distance_sq <= MIN_DISTANCE * MIN_DISTANCE {
        (separation_dir(from, to), MIN_DISTANCE)
    } else {
        let distance = distance_sq.sqrt();
        (delta / distance, distance)
    };

    let min_distance = radii[from] + radii[to];
    if distance < min_distance {
        let push = direction * ((min_distance - distance) * strength);
        forces[from] += push;
        forces[to] -= push;
    }
}

/// Pairwise soft separation over the tree; subtree pairs whose cells are
/// farther apart than any two radii can reach are pruned wholesale.
#[allow(clippy::too_many_arguments)]
fn accumulate_collisions(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    max_reach_sq: f32,
    forces: &mut [Vec2],
) {
    if node_a.bounds.gap_sq(node_b.bounds) > max_reach_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for i in 0..node_a.indices.len() {
                for j in (i + 1)..node_a.indices.len() {
                    collide_pair(
                        node_a.indices[i],
                        node_a.indices[j],
                        positions,
                        radii,
                        strength,
                        forces,
                    );
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, radii, strength, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };
            accumulate_collisions(
                child_a, child_a, true, positions, radii, strength, max_reach_sq, forces,
            );
            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collisions(
                    child_a, child_b, false, positions, radii, strength, max_reach_sq, forces,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collisions(
                child, node_b, false, positions, radii, strength, max_reach_sq, forces,
            );
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collisions(
                node_a, child, false, positions, radii, strength, max_reach_sq, forces,
            );
        }
    }
}
