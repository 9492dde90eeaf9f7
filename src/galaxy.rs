//! Procedural spiral galaxy point cloud.
//!
//! Each particle is dropped at a random distance along one of the spiral
//! branches, twisted by `spin * r`, then scattered with a power-law offset so
//! most particles hug the arm. The offset is scaled by `randomness * r`, so
//! the core stays tight and the arms fan out toward the rim; an unscaled
//! offset would leave a fixed-size haze around the core instead. Color fades
//! from the inside color at the core to the outside color at the rim.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::GalaxyParameters;

/// CPU-side particle attributes, ready to be uploaded as vertex data.
#[derive(Clone, Debug, Default)]
pub struct GalaxyGeometry {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    /// Per-particle size multiplier in `[0, 1)`.
    pub scales: Vec<f32>,
}

impl GalaxyGeometry {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
            scales: Vec::with_capacity(count),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Largest distance of any particle from the origin.
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
            .fold(0.0, f32::max)
    }
}

/// Offset along one axis: `u^power` with a random sign.
fn scatter<R: Rng + ?Sized>(rng: &mut R, power: f32) -> f32 {
    let magnitude = rng.random::<f32>().powf(power);
    if rng.random_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

/// Generate the point cloud for `params` using `rng`.
pub fn generate<R: Rng + ?Sized>(params: &GalaxyParameters, rng: &mut R) -> GalaxyGeometry {
    let count = params.count as usize;
    let branches = params.branches.max(1);
    let mut geometry = GalaxyGeometry::with_capacity(count);

    for i in 0..count {
        let r = rng.random::<f32>() * params.radius;
        let branch_angle = (i as u32 % branches) as f32 / branches as f32 * TAU;
        let spin_angle = r * params.spin;
        let angle = branch_angle + spin_angle;

        let spread = params.randomness * r;
        let offset_x = scatter(rng, params.randomness_power) * spread;
        let offset_y = scatter(rng, params.randomness_power) * spread;
        let offset_z = scatter(rng, params.randomness_power) * spread;

        geometry.positions.push([
            angle.cos() * r + offset_x,
            offset_y,
            angle.sin() * r + offset_z,
        ]);

        let t = r / params.radius;
        geometry
            .colors
            .push(params.inside_color.lerp(params.outside_color, t).to_array());

        geometry.scales.push(rng.random::<f32>());
    }

    geometry
}

/// A generated galaxy together with the parameters it came from.
pub struct Galaxy {
    pub params: GalaxyParameters,
    pub geometry: GalaxyGeometry,
}

impl Galaxy {
    /// Generate with a seeded RNG when `params.seed` is set, otherwise from OS entropy.
    pub fn new(params: GalaxyParameters) -> Self {
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let geometry = generate(&params, &mut rng);
        Self { params, geometry }
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Color;

    fn seeded(seed: u64) -> GalaxyParameters {
        GalaxyParameters {
            count: 3_000,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_generates_exact_count() {
        let galaxy = Galaxy::new(seeded(1));
        assert_eq!(galaxy.len(), 3_000);
        assert_eq!(galaxy.geometry.colors.len(), 3_000);
        assert_eq!(galaxy.geometry.scales.len(), 3_000);
    }

    #[test]
    fn test_same_seed_same_geometry() {
        let a = Galaxy::new(seeded(42));
        let b = Galaxy::new(seeded(42));
        assert_eq!(a.geometry.positions, b.geometry.positions);
        assert_eq!(a.geometry.colors, b.geometry.colors);

        let c = Galaxy::new(seeded(43));
        assert_ne!(a.geometry.positions, c.geometry.positions);
    }

    #[test]
    fn test_particles_follow_their_branch_without_scatter() {
        let params = GalaxyParameters {
            count: 600,
            branches: 4,
            spin: 0.0,
            randomness: 0.0,
            seed: Some(7),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let geometry = generate(&params, &mut rng);

        for (i, p) in geometry.positions.iter().enumerate() {
            assert_eq!(p[1], 0.0);
            let r = (p[0] * p[0] + p[2] * p[2]).sqrt();
            if r < 1e-3 {
                continue;
            }
            let expected = (i % 4) as f32 / 4.0 * TAU;
            let actual = p[2].atan2(p[0]).rem_euclid(TAU);
            let diff = (actual - expected).abs();
            assert!(diff < 1e-3 || (TAU - diff) < 1e-3, "particle {} off branch", i);
        }
    }

    #[test]
    fn test_spin_twists_arm_by_radius() {
        let params = GalaxyParameters {
            count: 200,
            branches: 1,
            spin: 1.5,
            randomness: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let geometry = generate(&params, &mut rng);

        for p in &geometry.positions {
            let r = (p[0] * p[0] + p[2] * p[2]).sqrt();
            let expected = (r * 1.5).rem_euclid(TAU);
            let actual = p[2].atan2(p[0]).rem_euclid(TAU);
            let diff = (actual - expected).abs();
            assert!(diff < 1e-3 || (TAU - diff) < 1e-3);
        }
    }

    #[test]
    fn test_positions_within_scattered_radius() {
        let params = seeded(9);
        let galaxy = Galaxy::new(params.clone());
        // Planar distance plus scatter on each of x and z.
        let limit = params.radius * (1.0 + 2.0 * params.randomness);
        for p in &galaxy.geometry.positions {
            let planar = (p[0] * p[0] + p[2] * p[2]).sqrt();
            assert!(planar <= limit + 1e-4);
            assert!(p[1].abs() <= params.randomness * params.radius + 1e-4);
        }
        assert!(galaxy.geometry.bounding_radius() > 0.0);
    }

    #[test]
    fn test_scatter_grows_with_distance_from_core() {
        // A black-to-white gradient makes the red channel equal r / radius.
        let params = GalaxyParameters {
            inside_color: Color::new(0.0, 0.0, 0.0),
            outside_color: Color::new(1.0, 1.0, 1.0),
            randomness: 1.0,
            ..seeded(13)
        };
        let galaxy = Galaxy::new(params.clone());
        for (p, c) in galaxy.geometry.positions.iter().zip(&galaxy.geometry.colors) {
            let r = c[0] * params.radius;
            assert!(p[1].abs() <= params.randomness * r + 1e-4);
        }
    }

    #[test]
    fn test_colors_stay_between_gradient_ends() {
        let params = GalaxyParameters {
            inside_color: Color::new(1.0, 0.0, 0.2),
            outside_color: Color::new(0.0, 1.0, 0.8),
            ..seeded(11)
        };
        let galaxy = Galaxy::new(params);
        for c in &galaxy.geometry.colors {
            assert!((0.0..=1.0).contains(&c[0]));
            assert!((0.0..=1.0).contains(&c[1]));
            assert!((0.2 - 1e-6..=0.8 + 1e-6).contains(&c[2]));
            // Red falls as green rises along the same gradient.
            assert!((c[0] + c[1] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_scales_in_unit_interval() {
        let galaxy = Galaxy::new(seeded(5));
        assert!(galaxy.geometry.scales.iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn test_higher_power_pulls_particles_to_arm() {
        let mean_offset = |power: f32| {
            let params = GalaxyParameters {
                count: 5_000,
                branches: 1,
                spin: 0.0,
                randomness: 1.0,
                randomness_power: power,
                ..Default::default()
            };
            let mut rng = StdRng::seed_from_u64(21);
            let geometry = generate(&params, &mut rng);
            geometry.positions.iter().map(|p| p[1].abs()).sum::<f32>() / geometry.len() as f32
        };
        assert!(mean_offset(8.0) < mean_offset(1.0));
    }
}
