use glam::Vec2;

use crate::topology::AgentNode;

/// Integrator state as seen by consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPhase {
    /// Alpha has decayed below the minimum; no ticks run.
    Cold,
    /// Ticking once per frame.
    Warm,
    /// Warm with at least one node pinned by an active drag.
    PinnedWarm,
}

/// Immutable per-tick copy of the layout state handed to consumers.
///
/// The engine's working arrays are never exposed; listeners always receive an
/// owned snapshot built after the tick completed.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutSnapshot {
    /// Node positions in simulation space, in stable node order.
    pub positions: Vec<(String, Vec2)>,
    pub alpha: f32,
    pub phase: SimPhase,
}

/// Everything the engine reports to the outside world.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// One executed simulation tick.
    Tick(LayoutSnapshot),
    /// Alpha crossed below the minimum; emitted exactly once per cooldown.
    Settled,
    /// Selection changed; carries the full node record, or `None` when
    /// cleared.
    SelectionChanged(Option<AgentNode>),
    /// Hover changed; same payload convention as selection.
    HoverChanged(Option<AgentNode>),
}

pub type EventListener = Box<dyn FnMut(&EngineEvent)>;

/// Listener registry. The engine is single-threaded and cooperative, so
/// emission is a plain loop over boxed callbacks.
#[derive(Default)]
pub(crate) struct EventHub {
    listeners: Vec<EventListener>,
}

impl EventHub {
    pub(crate) fn subscribe(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn emit(&mut self, event: &EngineEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}
