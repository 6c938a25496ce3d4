//! Accumulated rotation and the model matrix.
//!
//! Matrices are `glam::Mat4`: column-major, column vectors, so `a * b`
//! transforms by `b` first. Every builder below post-multiplies, which makes
//! the model matrix read left to right as
//! `orientation · translation · scale · accumulated`.
//!
//! The rotation rate can be updated any number of times between frames
//! through [`RotationState::set_target_delta`]; the matrices only move in
//! [`RotationState::integrate_if_changed`], which the renderer calls exactly
//! once per frame.

use glam::{Mat4, Vec3};

/// Fixed orientation applied before anything else, in degrees about Z.
const BASE_ROTATION_DEGREES: f32 = 90.0;

/// The cube sits one unit back along the depth axis.
const BASE_TRANSLATION: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Initial per-step spin, in degrees.
const INITIAL_DELTA_DEGREES: f32 = 1.0;

/// Magnification for items that require scaling.
pub const SCALE_UP: f32 = 8.0;

/// Reciprocal of [`SCALE_UP`].
pub const SCALE_DOWN: f32 = 0.125;

/// What [`RotationState::apply_scale_flag`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleTransition {
    Unchanged,
    Up,
    Down,
}

#[derive(Clone, Debug)]
pub struct RotationState {
    target_delta: f32,
    last_integrated_delta: f32,
    accumulated: Mat4,
    model: Mat4,
    scale: f32,
    scale_applied: bool,
}

impl Default for RotationState {
    fn default() -> Self {
        let mut state = Self {
            target_delta: 0.0,
            last_integrated_delta: 0.0,
            accumulated: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            scale: 1.0,
            scale_applied: false,
        };
        state.initialize();
        state
    }
}

impl RotationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset everything for a new surface.
    ///
    /// The target delta is left different from the last integrated delta, so
    /// the first frame after initialization always integrates.
    pub fn initialize(&mut self) {
        self.model = base_model();
        self.accumulated = Mat4::IDENTITY;
        self.target_delta = INITIAL_DELTA_DEGREES;
        self.last_integrated_delta = 0.0;
        self.scale = 1.0;
        self.scale_applied = false;
    }

    /// Record the desired per-step rotation. No matrix work happens here.
    pub fn set_target_delta(&mut self, degrees: f32) {
        self.target_delta = degrees;
    }

    /// Fold the target delta into the accumulated rotation if it changed.
    ///
    /// Returns `true` when an integration step ran.
    pub fn integrate_if_changed(&mut self) -> bool {
        if self.target_delta == self.last_integrated_delta {
            return false;
        }

        let delta = Mat4::from_rotation_y(self.target_delta.to_radians());
        // The new step becomes the outermost rotation.
        self.accumulated = delta * self.accumulated;
        self.model = base_model() * Mat4::from_scale(Vec3::splat(self.scale)) * self.accumulated;
        self.last_integrated_delta = self.target_delta;
        true
    }

    /// Set the scale state of a freshly created surface without a transition.
    pub fn restore_scale(&mut self, scaled: bool) {
        self.scale_applied = scaled;
        self.scale = if scaled { SCALE_UP } else { 1.0 };
        self.model = base_model() * Mat4::from_scale(Vec3::splat(self.scale)) * self.accumulated;
    }

    /// Apply a scale transition when `scaled` differs from the current state.
    ///
    /// Repeating the same flag is a no-op, so each real change multiplies the
    /// scale exactly once.
    pub fn apply_scale_flag(&mut self, scaled: bool) -> ScaleTransition {
        let (factor, transition) = match (self.scale_applied, scaled) {
            (false, true) => (SCALE_UP, ScaleTransition::Up),
            (true, false) => (SCALE_DOWN, ScaleTransition::Down),
            _ => return ScaleTransition::Unchanged,
        };

        self.scale *= factor;
        self.model *= Mat4::from_scale(Vec3::splat(factor));
        self.scale_applied = scaled;
        transition
    }

    /// Matrix handed to the MVP: base orientation, accumulated spin and scale.
    pub fn model(&self) -> Mat4 {
        self.model
    }

    /// Spin integrated so far, without the base orientation or scale.
    pub fn accumulated(&self) -> Mat4 {
        self.accumulated
    }

    /// Degrees per frame requested by the last drag.
    pub fn target_delta(&self) -> f32 {
        self.target_delta
    }

    /// Delta most recently folded into the accumulated spin.
    pub fn last_integrated_delta(&self) -> f32 {
        self.last_integrated_delta
    }

    /// The uniform scale currently folded into the model matrix.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether the magnified scale is in effect.
    pub fn scale_applied(&self) -> bool {
        self.scale_applied
    }
}

fn base_model() -> Mat4 {
    Mat4::IDENTITY
        * Mat4::from_rotation_z(BASE_ROTATION_DEGREES.to_radians())
        * Mat4::from_translation(BASE_TRANSLATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(m: Mat4) -> [u32; 16] {
        m.to_cols_array().map(f32::to_bits)
    }

    #[test]
    fn initialize_sets_base_orientation() {
        let state = RotationState::new();
        assert_eq!(state.accumulated(), Mat4::IDENTITY);
        assert_eq!(state.target_delta(), 1.0);
        assert_eq!(state.last_integrated_delta(), 0.0);

        // Rz(90) maps +X to +Y; the translation pushes the origin to z = -1.
        let origin = state.model().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
        let x = state.model().transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn first_integration_always_runs() {
        let mut state = RotationState::new();
        assert!(state.integrate_if_changed());
        assert_eq!(state.last_integrated_delta(), 1.0);
        assert!(
            state
                .accumulated()
                .abs_diff_eq(Mat4::from_rotation_y(1.0_f32.to_radians()), 1e-6)
        );
    }

    #[test]
    fn integration_is_lazy() {
        let mut state = RotationState::new();
        state.integrate_if_changed();

        let model = bits(state.model());
        let accumulated = bits(state.accumulated());
        assert!(!state.integrate_if_changed());
        assert!(!state.integrate_if_changed());
        assert_eq!(bits(state.model()), model);
        assert_eq!(bits(state.accumulated()), accumulated);
    }

    #[test]
    fn target_delta_is_a_pure_write() {
        let mut state = RotationState::new();
        state.integrate_if_changed();
        let model = bits(state.model());

        state.set_target_delta(5.0);
        state.set_target_delta(-3.0);
        assert_eq!(bits(state.model()), model);

        // A burst of updates still integrates once, with the latest value.
        assert!(state.integrate_if_changed());
        let expected =
            Mat4::from_rotation_y((-3.0_f32).to_radians()) * Mat4::from_rotation_y(1.0_f32.to_radians());
        assert!(state.accumulated().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn delta_is_applied_as_outermost_rotation() {
        let mut state = RotationState::new();
        state.integrate_if_changed();
        let before = state.accumulated();

        state.set_target_delta(30.0);
        state.integrate_if_changed();

        let expected = Mat4::from_rotation_y(30.0_f32.to_radians()) * before;
        assert!(state.accumulated().abs_diff_eq(expected, 1e-6));
        let model = base_model() * state.accumulated();
        assert!(state.model().abs_diff_eq(model, 1e-6));
    }

    #[test]
    fn scale_flag_is_idempotent() {
        let mut state = RotationState::new();
        assert_eq!(state.apply_scale_flag(false), ScaleTransition::Unchanged);
        assert_eq!(state.scale(), 1.0);

        assert_eq!(state.apply_scale_flag(true), ScaleTransition::Up);
        assert_eq!(state.apply_scale_flag(true), ScaleTransition::Unchanged);
        assert_eq!(state.apply_scale_flag(true), ScaleTransition::Unchanged);
        assert_eq!(state.scale(), SCALE_UP);
    }

    #[test]
    fn scale_round_trip_returns_to_baseline() {
        let mut state = RotationState::new();
        state.integrate_if_changed();
        let baseline = state.model();

        state.apply_scale_flag(true);
        state.apply_scale_flag(false);
        assert!((state.scale() - 1.0).abs() < 1e-4);
        assert!(state.model().abs_diff_eq(baseline, 1e-4));

        state.apply_scale_flag(true);
        let magnified = state.model();
        state.apply_scale_flag(false);
        state.apply_scale_flag(true);
        assert!((state.scale() - SCALE_UP).abs() < 1e-4);
        assert!(state.model().abs_diff_eq(magnified, 1e-4));
    }

    #[test]
    fn integration_keeps_the_current_scale() {
        let mut state = RotationState::new();
        state.apply_scale_flag(true);
        state.integrate_if_changed();

        let expected = base_model() * Mat4::from_scale(Vec3::splat(SCALE_UP)) * state.accumulated();
        assert!(state.model().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn restore_scale_skips_the_transition() {
        let mut state = RotationState::new();
        state.restore_scale(true);
        assert!(state.scale_applied());
        assert_eq!(state.scale(), SCALE_UP);

        // Selecting another scaled item afterwards changes nothing.
        assert_eq!(state.apply_scale_flag(true), ScaleTransition::Unchanged);

        state.initialize();
        assert!(!state.scale_applied());
        assert_eq!(state.scale(), 1.0);
    }
}
