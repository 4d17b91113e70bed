use crate::error::EngineError;

/// Tunable parameters for the layout engine.
///
/// Every field is overridable at construction and through
/// [`LayoutEngine::set_config`](crate::LayoutEngine::set_config); a rejected
/// update keeps the previous configuration active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Rest distance added on top of the two endpoint radii.
    pub link_distance: f32,
    /// Link force coefficient, damped per edge by the degree of the
    /// more-connected endpoint.
    pub link_strength: f32,
    /// Pairwise charge coefficient. Negative repels, positive attracts.
    pub charge_strength: f32,
    /// Pairs farther apart than this exchange no charge force.
    pub charge_max_distance: f32,
    /// Pull of every node toward the simulation-space origin.
    pub center_strength: f32,
    /// Soft-body separation coefficient for overlapping nodes.
    pub collision_strength: f32,
    /// Horizontal anchoring pull toward `anchor`.
    pub axis_x_strength: f32,
    /// Vertical anchoring pull toward `anchor`.
    pub axis_y_strength: f32,
    /// Anchor point for the axis forces, in simulation space.
    pub anchor: [f32; 2],
    /// Per-tick geometric decay of alpha toward its target. The default
    /// matches a ~300-tick cooldown from 1.0 to `alpha_min`.
    pub alpha_decay: f32,
    /// Alpha below which the simulation is settled.
    pub alpha_min: f32,
    /// Per-tick velocity damping factor.
    pub velocity_decay: f32,
    /// Velocity magnitude clamp, guarding against blow-up on reload.
    pub max_velocity: f32,
    /// Fixed logical time step. Never derived from wall-clock time.
    pub dt: f32,
    /// Allowed view scale range, `[min, max]`.
    pub zoom_extent: [f32; 2],
    /// Bounds (width, height) used when seeding initial positions.
    pub viewport: [f32; 2],
    /// Seed for deterministic initial placement.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            link_distance: 30.0,
            link_strength: 0.8,
            charge_strength: -800.0,
            charge_max_distance: 300.0,
            center_strength: 0.1,
            collision_strength: 0.9,
            axis_x_strength: 0.1,
            axis_y_strength: 0.1,
            anchor: [0.0, 0.0],
            alpha_decay: 0.0228,
            alpha_min: 0.001,
            velocity_decay: 0.6,
            max_velocity: 50.0,
            dt: 1.0,
            zoom_extent: [0.1, 4.0],
            viewport: [960.0, 640.0],
            seed: 42,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.charge_max_distance.is_finite() || self.charge_max_distance <= 0.0 {
            return Err(EngineError::config(
                "charge_max_distance",
                "must be finite and positive",
            ));
        }
        if !self.link_distance.is_finite() || self.link_distance < 0.0 {
            return Err(EngineError::config(
                "link_distance",
                "must be finite and non-negative",
            ));
        }
        for (parameter, value) in [
            ("link_strength", self.link_strength),
            ("charge_strength", self.charge_strength),
            ("center_strength", self.center_strength),
            ("collision_strength", self.collision_strength),
            ("axis_x_strength", self.axis_x_strength),
            ("axis_y_strength", self.axis_y_strength),
        ] {
            if !value.is_finite() {
                return Err(EngineError::config(parameter, "must be finite"));
            }
        }
        if !self.anchor[0].is_finite() || !self.anchor[1].is_finite() {
            return Err(EngineError::config("anchor", "must be finite"));
        }
        if !self.alpha_decay.is_finite() || self.alpha_decay <= 0.0 || self.alpha_decay > 1.0 {
            return Err(EngineError::config("alpha_decay", "must be in (0, 1]"));
        }
        if !self.alpha_min.is_finite() || self.alpha_min <= 0.0 || self.alpha_min >= 1.0 {
            return Err(EngineError::config("alpha_min", "must be in (0, 1)"));
        }
        if !self.velocity_decay.is_finite() || self.velocity_decay <= 0.0 || self.velocity_decay > 1.0
        {
            return Err(EngineError::config("velocity_decay", "must be in (0, 1]"));
        }
        if !self.max_velocity.is_finite() || self.max_velocity <= 0.0 {
            return Err(EngineError::config(
                "max_velocity",
                "must be finite and positive",
            ));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(EngineError::config("dt", "must be finite and positive"));
        }
        let [zoom_min, zoom_max] = self.zoom_extent;
        if !zoom_min.is_finite() || !zoom_max.is_finite() || zoom_min <= 0.0 || zoom_min > zoom_max
        {
            return Err(EngineError::config(
                "zoom_extent",
                "min must be positive and no greater than max",
            ));
        }
        if !self.viewport[0].is_finite()
            || !self.viewport[1].is_finite()
            || self.viewport[0] <= 0.0
            || self.viewport[1] <= 0.0
        {
            return Err(EngineError::config(
                "viewport",
                "must be finite and positive",
            ));
        }
        Ok(())
    }
}
