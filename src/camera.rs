//! Perspective camera with damped orbit controls.
//!
//! The camera orbits a target point on a sphere described by a radius, an
//! azimuth (`theta`, around +Y) and a polar angle (`phi`, from +Y). Pointer
//! input accumulates pending deltas which are applied in `update()`; with
//! damping enabled only a fraction of each delta is consumed per frame so
//! motion eases out after the pointer is released.

use glam::{Mat4, Vec3};

const EPS: f32 = 1e-6;

/// Projection parameters.
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self::default();
        camera.set_viewport(width, height);
        camera
    }

    /// Update the aspect ratio after a resize. Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Spherical coordinates relative to the orbit target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    pub theta: f32,
    /// Polar angle from +Y.
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPS {
            return Self { radius: 0.0, theta: 0.0, phi: 0.0 };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Orbit controller: left-drag rotates, right-drag pans, wheel zooms.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    pub spherical: Spherical,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update when damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    pending_pan: Vec3,
}

impl OrbitControls {
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        Self {
            target,
            spherical: Spherical::from_offset(eye - target),
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.5,
            max_distance: 50.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            pending_pan: Vec3::ZERO,
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.spherical.to_offset()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// Pointer drag in pixels; a full-height drag turns the camera by one revolution.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.pending_theta -= std::f32::consts::TAU * dx / h * self.rotate_speed;
        self.pending_phi -= std::f32::consts::TAU * dy / h * self.rotate_speed;
    }

    /// Wheel delta in lines; positive zooms in.
    pub fn zoom(&mut self, delta: f32) {
        if delta == 0.0 {
            return;
        }
        let scale = 0.95f32.powf(self.zoom_speed * delta.abs());
        if delta > 0.0 {
            self.pending_scale *= scale;
        } else {
            self.pending_scale /= scale;
        }
    }

    /// Pointer drag in pixels, moving the target in the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, fov_deg: f32) {
        let h = viewport_height.max(1.0);
        let offset = self.spherical.to_offset();
        let forward = -offset.normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        // World units per pixel at the target distance.
        let world_per_pixel = 2.0 * self.spherical.radius * (fov_deg.to_radians() * 0.5).tan() / h;
        self.pending_pan += (-right * dx + up * dy) * world_per_pixel * self.pan_speed;
    }

    /// Apply pending motion. Returns true when the camera moved.
    pub fn update(&mut self) -> bool {
        let before = (self.spherical, self.target);
        let f = if self.enable_damping { self.damping_factor } else { 1.0 };

        self.spherical.theta += self.pending_theta * f;
        self.spherical.phi = (self.spherical.phi + self.pending_phi * f).clamp(EPS, std::f32::consts::PI - EPS);
        self.spherical.radius = (self.spherical.radius * self.pending_scale)
            .clamp(self.min_distance, self.max_distance);
        self.target += self.pending_pan * f;

        if self.enable_damping {
            self.pending_theta *= 1.0 - f;
            self.pending_phi *= 1.0 - f;
            self.pending_pan *= 1.0 - f;
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
            self.pending_pan = Vec3::ZERO;
        }
        // Zoom is applied at once, like a dolly step.
        self.pending_scale = 1.0;

        before != (self.spherical, self.target)
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::new(3.0, 3.0, 3.0), Vec3::ZERO)
    }
}
