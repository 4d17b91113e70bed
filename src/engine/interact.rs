use glam::Vec2;

use super::LayoutEngine;

/// Pointer travel below this many screen units keeps a press a click.
const DRAG_SLOP: f32 = 4.0;
/// Wheel delta to zoom-factor rate, with the per-event factor clamped so a
/// single notch cannot jump the scale.
const ZOOM_WHEEL_RATE: f32 = 0.0018;
/// Ticks a reset-view animation takes to reach identity.
const RESET_VIEW_TICKS: u32 = 18;

/// Affine view parameters applied at the render boundary only; force math
/// never sees them. `screen = world * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world * self.scale + self.translate
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.translate) / self.scale
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.translate == Vec2::ZERO
    }
}

/// Where the current pointer sequence stands. A press commits to a node drag
/// or a pan only after the slop threshold; otherwise it resolves as a click
/// on release.
pub(super) enum Gesture {
    Idle,
    Pressed { node: Option<String>, start: Vec2 },
    DraggingNode { id: String },
    Panning { last: Vec2 },
}

/// In-flight reset-view animation, advanced one tick per `step`.
pub(super) struct ViewAnimation {
    from: ViewTransform,
    tick: u32,
}

impl LayoutEngine {
    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// Pins `id` at its current position and warms the simulation so the
    /// rest of the layout keeps reacting while the node is held.
    pub fn drag_start(&mut self, id: &str) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.nodes[index].pin = Some(self.nodes[index].position);
        self.reheat(super::REHEAT_ALPHA);
        true
    }

    /// Moves the pin (and the node with it) to a simulation-space point.
    /// Interaction layers convert screen coordinates through the inverse
    /// view transform before calling this.
    pub fn drag_move(&mut self, id: &str, world: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let node = &mut self.nodes[index];
        node.pin = Some(world);
        node.position = world;
        node.velocity = Vec2::ZERO;
        true
    }

    /// Releases the pin and lets the simulation cool back down.
    pub fn drag_end(&mut self, id: &str) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.nodes[index].pin = None;
        self.alpha_target = 0.0;
        true
    }

    pub fn pointer_down(&mut self, screen: Vec2) {
        let node = self
            .hit_test(screen)
            .map(|index| self.nodes[index].id.clone());
        self.gesture = Gesture::Pressed {
            node,
            start: screen,
        };
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Pressed { node, start } => {
                if (screen - start).length() <= DRAG_SLOP {
                    self.gesture = Gesture::Pressed { node, start };
                } else if let Some(id) = node {
                    self.drag_start(&id);
                    let world = self.view.screen_to_world(screen);
                    self.drag_move(&id, world);
                    self.gesture = Gesture::DraggingNode { id };
                } else {
                    self.pan_by(screen - start);
                    self.gesture = Gesture::Panning { last: screen };
                }
            }
            Gesture::DraggingNode { id } => {
                // Re-derived from the current transform every event, so
                // zooming mid-drag keeps the node under the pointer.
                let world = self.view.screen_to_world(screen);
                self.drag_move(&id, world);
                self.gesture = Gesture::DraggingNode { id };
            }
            Gesture::Panning { last } => {
                self.pan_by(screen - last);
                self.gesture = Gesture::Panning { last: screen };
            }
            Gesture::Idle => {}
        }
    }

    /// Ends the pointer sequence. An uncommitted press resolves as a click:
    /// toggle selection on the pressed node, or clear it on empty space.
    pub fn pointer_up(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Pressed { node, .. } => match node {
                Some(id) => self.toggle_selected(&id),
                None => self.clear_selection(),
            },
            Gesture::DraggingNode { id } => {
                self.drag_end(&id);
            }
            Gesture::Panning { .. } | Gesture::Idle => {}
        }
    }

    /// Hover tracking for a pointer that is not pressed. Emits a change
    /// event only when the hovered node actually changes.
    pub fn pointer_hover(&mut self, screen: Vec2) {
        let hit = self
            .hit_test(screen)
            .map(|index| self.nodes[index].id.clone());
        self.set_hovered(hit.as_deref());
    }

    pub fn pointer_leave(&mut self) {
        self.set_hovered(None);
    }

    /// Multiplicative zoom about the cursor: the simulation-space point under
    /// the pointer stays under the pointer. Scale is clamped to the
    /// configured extent.
    pub fn zoom_at(&mut self, screen: Vec2, scroll: f32) {
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let world_before = self.view.screen_to_world(screen);
        let factor = (1.0 + (scroll * ZOOM_WHEEL_RATE)).clamp(0.85, 1.15);
        let [zoom_min, zoom_max] = self.config.zoom_extent;
        self.view.scale = (self.view.scale * factor).clamp(zoom_min, zoom_max);
        self.view.translate = screen - world_before * self.view.scale;
        self.view_animation = None;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.view.translate += delta;
        self.view_animation = None;
    }

    /// Starts animating the view back to identity over a fixed number of
    /// ticks. Node positions and pins are untouched.
    pub fn reset_view(&mut self) {
        if self.view.is_identity() {
            return;
        }
        self.view_animation = Some(ViewAnimation {
            from: self.view,
            tick: 0,
        });
    }

    /// Advances the reset animation, if any. Returns whether more frames are
    /// needed. Tick-count based, so it is as deterministic as the physics.
    pub(super) fn advance_view_animation(&mut self) -> bool {
        let Some(animation) = &mut self.view_animation else {
            return false;
        };

        animation.tick += 1;
        let t = (animation.tick as f32 / RESET_VIEW_TICKS as f32).min(1.0);
        let eased = t * t * (3.0 - 2.0 * t);
        let from = animation.from;
        self.view = ViewTransform {
            scale: from.scale + (1.0 - from.scale) * eased,
            translate: from.translate * (1.0 - eased),
        };

        if animation.tick >= RESET_VIEW_TICKS {
            self.view = ViewTransform::default();
            self.view_animation = None;
            false
        } else {
            true
        }
    }

    /// Nearest node whose screen-space radius contains the pointer.
    fn hit_test(&self, screen: Vec2) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let center = self.view.world_to_screen(node.position);
                let radius = node.radius * self.view.scale;
                let distance = center.distance(screen);
                (distance <= radius).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
