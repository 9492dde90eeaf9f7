use glam::Mat4;

use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::params::GalaxyParameters;

/// Per-frame state shared by the windowed viewer and the offline renderer.
pub struct VisualiserState {
    pub time: f32,
    /// Rotation of the galaxy group about Y, in radians.
    pub galaxy_rotation: f32,
    pub params: GalaxyParameters,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    needs_regenerate: bool,
}

impl VisualiserState {
    pub fn new(params: GalaxyParameters) -> Self {
        Self {
            time: 0.0,
            galaxy_rotation: 0.0,
            params,
            camera: PerspectiveCamera::default(),
            controls: OrbitControls::default(),
            needs_regenerate: true,
        }
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.galaxy_rotation = 0.0;
        self.controls = OrbitControls::default();
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.galaxy_rotation += self.params.rotation_speed * dt;
        self.galaxy_rotation %= std::f32::consts::TAU;
        self.controls.update();
    }

    /// Replace the parameters, flagging a regeneration if the geometry changes.
    pub fn set_params(&mut self, params: GalaxyParameters) {
        if self.params.geometry_differs(&params) {
            self.needs_regenerate = true;
        }
        self.params = params;
    }

    /// Force a regeneration on the next frame (e.g. to redraw with a fresh seed).
    pub fn request_regenerate(&mut self) {
        self.needs_regenerate = true;
    }

    /// Returns and clears the pending regeneration flag.
    pub fn take_regenerate(&mut self) -> bool {
        std::mem::take(&mut self.needs_regenerate)
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.galaxy_rotation)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.camera.projection_matrix() * self.controls.view_matrix()
    }
}

impl Default for VisualiserState {
    fn default() -> Self {
        Self::new(GalaxyParameters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_dirty() {
        let mut state = VisualiserState::default();
        assert!(state.take_regenerate());
        assert!(!state.take_regenerate());
    }

    #[test]
    fn test_rotation_integrates_speed() {
        let mut state = VisualiserState::default();
        state.params.rotation_speed = 0.5;
        for _ in 0..10 {
            state.update(0.1);
        }
        assert!((state.galaxy_rotation - 0.5).abs() < 1e-5);
        assert!((state.time - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut state = VisualiserState::default();
        state.params.rotation_speed = 1.0;
        state.update(10.0);
        assert!(state.galaxy_rotation < std::f32::consts::TAU);
    }

    #[test]
    fn test_set_params_only_dirty_on_geometry_change() {
        let mut state = VisualiserState::default();
        state.take_regenerate();

        let mut params = state.params.clone();
        params.rotation_speed = 0.9;
        state.set_params(params.clone());
        assert!(!state.take_regenerate());
        assert_eq!(state.params.rotation_speed, 0.9);

        params.branches = 7;
        state.set_params(params);
        assert!(state.take_regenerate());
    }

    #[test]
    fn test_reset_keeps_params() {
        let mut state = VisualiserState::default();
        state.params.branches = 6;
        state.update(1.0);
        state.reset();
        assert_eq!(state.time, 0.0);
        assert_eq!(state.galaxy_rotation, 0.0);
        assert_eq!(state.params.branches, 6);
    }
}
