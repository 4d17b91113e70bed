//! The layout engine core: graph working set, force composition, and the
//! tick-driven integrator with its alpha state machine.

mod forces;
mod graph;
mod interact;
mod quadtree;
mod selection;

use std::collections::HashMap;

use glam::Vec2;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventHub, EventListener, LayoutSnapshot, SimPhase};
use crate::topology::{AgentNode, Topology};

use forces::ForceScratch;
use graph::{SimEdge, SimNode};
pub use interact::ViewTransform;
use interact::{Gesture, ViewAnimation};
use selection::SelectionState;

/// Alpha level a drag keeps the simulation at, and the floor alpha is raised
/// to when a topology update lands.
const REHEAT_ALPHA: f32 = 0.3;

/// Force-directed layout engine for one graph.
///
/// Owns its working arrays outright; consumers receive immutable
/// [`LayoutSnapshot`]s and typed [`EngineEvent`]s, never references into the
/// simulation state. Single-threaded and frame-driven: call [`step`] once
/// per animation frame for as long as it returns `true`.
///
/// [`step`]: LayoutEngine::step
pub struct LayoutEngine {
    config: EngineConfig,
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    index_by_id: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    alpha: f32,
    alpha_target: f32,
    halted: bool,
    scratch: ForceScratch,
    view: ViewTransform,
    view_animation: Option<ViewAnimation>,
    gesture: Gesture,
    selection: SelectionState,
    events: EventHub,
}

impl LayoutEngine {
    /// Creates an empty engine. Fails with [`EngineError::Config`] when any
    /// parameter is out of range.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            index_by_id: HashMap::new(),
            adjacency: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            halted: false,
            scratch: ForceScratch::default(),
            view: ViewTransform::default(),
            view_animation: None,
            gesture: Gesture::Idle,
            selection: SelectionState::default(),
            events: EventHub::default(),
        })
    }

    /// Creates an engine and loads `topology` in one call.
    pub fn with_topology(config: EngineConfig, topology: &Topology) -> Result<Self, EngineError> {
        let mut engine = Self::new(config)?;
        engine.load_topology(topology)?;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the configuration. A rejected update keeps the previous
    /// configuration active.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<(), EngineError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Registers an event listener. Listeners receive owned payloads and may
    /// not call back into the engine; queue follow-up work outside instead.
    pub fn on_event(&mut self, listener: EventListener) {
        self.events.subscribe(listener);
    }

    /// Advances the simulation by one logical tick when warm and the view
    /// animation when one is running. Returns whether the caller should
    /// schedule another frame.
    ///
    /// The time step is the configured logical `dt`; wall-clock time never
    /// enters the math, so tick sequences are reproducible.
    pub fn step(&mut self) -> bool {
        if self.halted {
            return false;
        }

        let animating = self.advance_view_animation();

        if self.alpha >= self.config.alpha_min {
            self.integrate();
            self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

            if !self.events.is_empty() {
                let snapshot = self.snapshot();
                self.events.emit(&EngineEvent::Tick(snapshot));
            }
            if self.alpha < self.config.alpha_min {
                debug!(alpha = self.alpha, "simulation settled");
                self.events.emit(&EngineEvent::Settled);
            }
        }

        self.alpha >= self.config.alpha_min || animating
    }

    /// Warms the simulation back up: raises the decay target and lifts alpha
    /// to at least that target, transitioning Cold to Warm (or Pinned-Warm
    /// when pins exist).
    pub fn reheat(&mut self, alpha_target: f32) {
        let target = alpha_target.clamp(0.0, 1.0);
        self.alpha_target = target;
        if self.alpha < target {
            self.alpha = target;
        }
    }

    /// Terminal stop for teardown. A halted engine runs no ticks and emits
    /// no further events.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn phase(&self) -> SimPhase {
        if self.halted || self.alpha < self.config.alpha_min {
            SimPhase::Cold
        } else if self.nodes.iter().any(|node| node.pin.is_some()) {
            SimPhase::PinnedWarm
        } else {
            SimPhase::Warm
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Owned copy of the current layout state: positions in stable node
    /// order plus alpha and phase. The same payload `Tick` events carry.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            positions: self
                .nodes
                .iter()
                .map(|node| (node.id.clone(), node.position))
                .collect(),
            alpha: self.alpha,
            phase: self.phase(),
        }
    }

    /// The full record for a node id, as carried by selection/hover events.
    pub fn node(&self, id: &str) -> Option<AgentNode> {
        self.index_by_id.get(id).map(|&index| AgentNode {
            id: self.nodes[index].id.clone(),
            kind: self.nodes[index].kind,
        })
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].position)
    }

    pub fn velocity_of(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].velocity)
    }

    pub fn pin_of(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.nodes[index].pin)
    }

    /// One Euler step: compose forces, integrate unpinned nodes, enforce
    /// pins. Velocities are clamped so a fresh or degenerate layout cannot
    /// blow up.
    fn integrate(&mut self) {
        forces::compose(&self.nodes, &self.edges, &self.config, &mut self.scratch);

        let alpha_dt = self.alpha * self.config.dt;
        for (node, force) in self.nodes.iter_mut().zip(&self.scratch.forces) {
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let velocity = ((node.velocity + *force * alpha_dt) * self.config.velocity_decay)
                .clamp_length_max(self.config.max_velocity);
            node.velocity = velocity;
            node.position += velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::vec2;

    use crate::topology::{AgentLink, AgentNode, LinkKind, NodeKind};

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

    fn chain() -> Topology {
        Topology {
            nodes: vec![node("a"), node("b"), node("c")],
            links: vec![link("a", "b"), link("b", "c")],
        }
    }

    fn engine_with(topology: &Topology) -> LayoutEngine {
        LayoutEngine::with_topology(EngineConfig::default(), topology).expect("valid topology")
    }

    #[test]
    fn simulation_settles_within_bounded_ticks() {
        let mut engine = engine_with(&chain());
        let mut ticks = 0;
        while engine.step() {
            ticks += 1;
            assert!(ticks <= 1_000, "did not settle within 1000 ticks");
        }
        assert!(engine.is_settled());
        assert_eq!(engine.phase(), SimPhase::Cold);
        for id in ["a", "b", "c"] {
            assert!(engine.position_of(id).unwrap().is_finite());
        }
    }

    #[test]
    fn larger_graph_settles_too() {
        let nodes = (0..60).map(|i| node(&format!("n{i}"))).collect::<Vec<_>>();
        let links = (1..60)
            .map(|i| link(&format!("n{}", i / 2), &format!("n{i}")))
            .collect::<Vec<_>>();
        let mut engine = engine_with(&Topology { nodes, links });

        let mut ticks = 0;
        while engine.step() {
            ticks += 1;
            assert!(ticks <= 1_000);
        }
        assert!(engine.is_settled());
    }

    #[test]
    fn alpha_is_monotone_between_reheats() {
        let mut engine = engine_with(&chain());
        let mut previous = engine.alpha();
        for _ in 0..100 {
            engine.step();
            assert!(engine.alpha() <= previous);
            previous = engine.alpha();
        }
    }

    #[test]
    fn identically_seeded_engines_match_bit_for_bit() {
        let mut first = engine_with(&chain());
        let mut second = engine_with(&chain());

        for _ in 0..200 {
            first.step();
            second.step();
            assert_eq!(first.snapshot().positions, second.snapshot().positions);
        }
    }

    #[test]
    fn pinned_node_holds_its_pin_exactly() {
        let mut engine = engine_with(&chain());
        engine.drag_start("b");
        engine.drag_move("b", vec2(37.5, -12.25));

        for _ in 0..25 {
            engine.step();
            assert_eq!(engine.position_of("b"), Some(vec2(37.5, -12.25)));
        }
        assert_eq!(engine.phase(), SimPhase::PinnedWarm);
    }

    #[test]
    fn drag_scenario_pins_moves_and_releases() {
        let mut engine = engine_with(&chain());
        engine.drag_start("b");
        assert_eq!(engine.pin_of("b"), engine.position_of("b"));
        assert_eq!(engine.alpha_target(), REHEAT_ALPHA);

        engine.drag_move("b", vec2(100.0, 100.0));
        engine.step();
        assert_eq!(engine.position_of("b"), Some(vec2(100.0, 100.0)));

        engine.drag_end("b");
        assert_eq!(engine.pin_of("b"), None);
        assert_eq!(engine.alpha_target(), 0.0);
    }

    #[test]
    fn drag_keeps_simulation_warm_indefinitely() {
        let mut engine = engine_with(&chain());
        engine.drag_start("b");
        for _ in 0..600 {
            assert!(engine.step(), "must stay warm while dragging");
        }
        assert!((engine.alpha() - REHEAT_ALPHA).abs() < 1e-3);
    }

    #[test]
    fn reheat_restarts_a_cold_engine() {
        let mut engine = engine_with(&chain());
        while engine.step() {}
        assert_eq!(engine.phase(), SimPhase::Cold);

        engine.reheat(REHEAT_ALPHA);
        assert_eq!(engine.phase(), SimPhase::Warm);
        assert!(engine.step());
    }

    #[test]
    fn settled_event_fires_exactly_once_per_cooldown() {
        let mut engine = engine_with(&chain());
        let settles = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&settles);
        engine.on_event(Box::new(move |event| {
            if matches!(event, EngineEvent::Settled) {
                *counter.borrow_mut() += 1;
            }
        }));

        while engine.step() {}
        engine.step();
        engine.step();
        assert_eq!(*settles.borrow(), 1);

        engine.reheat(1.0);
        engine.alpha_target = 0.0;
        while engine.step() {}
        assert_eq!(*settles.borrow(), 2, "second cooldown settles again");
    }

    #[test]
    fn tick_events_carry_positions_and_alpha() {
        let mut engine = engine_with(&chain());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.on_event(Box::new(move |event| {
            if let EngineEvent::Tick(snapshot) = event {
                sink.borrow_mut().push(snapshot.clone());
            }
        }));

        engine.step();
        engine.step();

        let ticks = seen.borrow();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].positions.len(), 3);
        assert!(ticks[1].alpha < ticks[0].alpha);
    }

    #[test]
    fn halted_engine_ticks_and_emits_nothing() {
        let mut engine = engine_with(&chain());
        let events = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&events);
        engine.on_event(Box::new(move |_| {
            *counter.borrow_mut() += 1;
        }));

        engine.step();
        let after_one = *events.borrow();
        let frozen = engine.snapshot();

        engine.halt();
        assert!(!engine.step());
        assert!(!engine.step());
        assert_eq!(*events.borrow(), after_one);
        assert_eq!(engine.snapshot().positions, frozen.positions);
        assert_eq!(engine.phase(), SimPhase::Cold);
    }

    #[test]
    fn selection_and_hover_never_touch_the_simulation() {
        let mut engine = engine_with(&chain());
        for _ in 0..5 {
            engine.step();
        }
        let alpha = engine.alpha();
        let positions = engine.snapshot().positions;
        let velocity = engine.velocity_of("b");

        engine.set_selected(Some("b"));
        engine.toggle_selected("a");
        engine.set_hovered(Some("c"));
        engine.set_hovered(None);
        engine.clear_selection();

        assert_eq!(engine.alpha(), alpha);
        assert_eq!(engine.snapshot().positions, positions);
        assert_eq!(engine.velocity_of("b"), velocity);
    }

    #[test]
    fn rejected_config_keeps_previous_settings() {
        let mut engine = engine_with(&chain());
        let before = *engine.config();

        let error = engine
            .set_config(EngineConfig {
                charge_max_distance: -5.0,
                ..before
            })
            .unwrap_err();
        assert!(matches!(error, EngineError::Config { .. }));
        assert_eq!(engine.config(), &before);

        let mut valid = before;
        valid.charge_strength = -400.0;
        engine.set_config(valid).expect("valid config accepted");
        assert_eq!(engine.config().charge_strength, -400.0);
    }

    #[test]
    fn linked_pair_settles_near_rest_distance() {
        let topology = Topology {
            nodes: vec![node("a"), node("b")],
            links: vec![link("a", "b")],
        };
        let mut engine = engine_with(&topology);
        while engine.step() {}

        let rest = engine.config().link_distance + NodeKind::Primary.radius() * 2.0;
        let distance = engine
            .position_of("a")
            .unwrap()
            .distance(engine.position_of("b").unwrap());
        assert!(
            distance > rest * 0.3 && distance < rest * 2.0,
            "settled distance {distance} vs rest {rest}"
        );
    }
}
