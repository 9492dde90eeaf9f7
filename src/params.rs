//! Galaxy parameter set and color handling.
//!
//! Parameters are the only input to generation. They can be tuned live from
//! the debug panel or loaded from a JSON preset. Colors are kept as linear
//! floats straight from their hex value; no color-management conversion is
//! applied anywhere in the pipeline.

use std::fmt;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An RGB color with linear components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            bail!("Invalid color '{}': non-hex digit", hex);
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => bail!("Invalid color '{}': expected #rrggbb or #rgb", hex),
        };

        let channel = |i: usize| -> Result<f32> {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| anyhow!("Invalid color '{}': non-hex digit", hex))
        };

        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_bytes();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// The stored channels as bytes, the same values the hex form carries.
    pub fn to_bytes(self) -> [u8; 3] {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [to_byte(self.r), to_byte(self.g), to_byte(self.b)]
    }

    pub fn from_bytes(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0] as f32 / 255.0, rgb[1] as f32 / 255.0, rgb[2] as f32 / 255.0)
    }

    /// Component-wise linear interpolation towards `other`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Color::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Slider bounds for a numeric parameter as shown on the debug panel.
#[derive(Clone, Copy, Debug)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamRange {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

pub const COUNT_RANGE: ParamRange = ParamRange::new(1_000.0, 1_000_000.0, 100.0);
pub const SIZE_RANGE: ParamRange = ParamRange::new(0.002, 0.1, 0.001);
pub const RADIUS_RANGE: ParamRange = ParamRange::new(1.0, 20.0, 1.0);
pub const BRANCHES_RANGE: ParamRange = ParamRange::new(2.0, 20.0, 1.0);
pub const SPIN_RANGE: ParamRange = ParamRange::new(-5.0, 5.0, 0.05);
pub const RANDOMNESS_RANGE: ParamRange = ParamRange::new(0.1, 2.0, 0.1);
pub const RANDOMNESS_POWER_RANGE: ParamRange = ParamRange::new(1.0, 10.0, 0.1);
pub const ROTATION_SPEED_RANGE: ParamRange = ParamRange::new(0.0, 1.0, 0.01);

/// Everything that shapes the generated galaxy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParameters {
    /// Number of particles.
    pub count: u32,
    /// Point size in world units (attenuated with distance).
    pub size: f32,
    /// Outer radius of the spiral arms.
    pub radius: f32,
    /// Number of spiral arms.
    pub branches: u32,
    /// Angular twist per unit of radius.
    pub spin: f32,
    /// Scatter of particles away from their arm.
    pub randomness: f32,
    /// Exponent pulling the scatter towards the arm; higher is tighter.
    pub randomness_power: f32,
    pub inside_color: Color,
    pub outside_color: Color,
    /// Galaxy rotation about Y, radians per second.
    pub rotation_speed: f32,
    /// Fixed RNG seed. `None` draws a fresh seed on every generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            count: 100_000,
            size: 0.01,
            radius: 5.0,
            branches: 3,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 3.0,
            inside_color: Color::new(1.0, 96.0 / 255.0, 48.0 / 255.0), // #ff6030
            outside_color: Color::new(27.0 / 255.0, 57.0 / 255.0, 132.0 / 255.0), // #1b3984
            rotation_speed: 0.1,
            seed: None,
        }
    }
}

impl GalaxyParameters {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            bail!("count must be at least 1");
        }
        if self.branches == 0 {
            bail!("branches must be at least 1");
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            bail!("radius must be a positive number, got {}", self.radius);
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            bail!("size must be a positive number, got {}", self.size);
        }
        if !self.randomness.is_finite() || self.randomness < 0.0 {
            bail!("randomness must not be negative, got {}", self.randomness);
        }
        if !self.randomness_power.is_finite() || self.randomness_power <= 0.0 {
            bail!("randomness_power must be positive, got {}", self.randomness_power);
        }
        if !self.spin.is_finite() {
            bail!("spin must be finite");
        }
        if !self.rotation_speed.is_finite() {
            bail!("rotation_speed must be finite");
        }
        Ok(())
    }

    /// Copy with every numeric field forced into its panel range.
    pub fn clamped(&self) -> Self {
        let f = |range: &ParamRange, v: f32| range.clamp(v as f64) as f32;
        Self {
            count: COUNT_RANGE.clamp(self.count as f64) as u32,
            size: f(&SIZE_RANGE, self.size),
            radius: f(&RADIUS_RANGE, self.radius),
            branches: BRANCHES_RANGE.clamp(self.branches as f64) as u32,
            spin: f(&SPIN_RANGE, self.spin),
            randomness: f(&RANDOMNESS_RANGE, self.randomness),
            randomness_power: f(&RANDOMNESS_POWER_RANGE, self.randomness_power),
            rotation_speed: f(&ROTATION_SPEED_RANGE, self.rotation_speed),
            ..self.clone()
        }
    }

    /// True when `other` would produce different geometry.
    ///
    /// Rotation speed only affects the per-frame transform, and point size
    /// is a uniform, so neither requires regeneration.
    pub fn geometry_differs(&self, other: &GalaxyParameters) -> bool {
        self.count != other.count
            || self.radius != other.radius
            || self.branches != other.branches
            || self.spin != other.spin
            || self.randomness != other.randomness
            || self.randomness_power != other.randomness_power
            || self.inside_color != other.inside_color
            || self.outside_color != other.outside_color
            || self.seed != other.seed
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: GalaxyParameters =
            serde_json::from_str(json).context("Failed to parse galaxy parameters")?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read preset {:?}", path))?;
        Self::from_json_str(&contents).with_context(|| format!("Invalid preset {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write preset {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#ff6030").unwrap();
        assert_eq!(c.r, 1.0);
        assert!((c.g - 96.0 / 255.0).abs() < 1e-6);
        assert!((c.b - 48.0 / 255.0).abs() < 1e-6);

        let short = Color::from_hex("fff").unwrap();
        assert_eq!(short, Color::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
        assert!(Color::from_hex("").is_err());
        assert!(Color::from_hex("#ééé").is_err());
    }

    #[test]
    fn test_color_hex_roundtrip_defaults() {
        let params = GalaxyParameters::default();
        assert_eq!(params.inside_color.to_hex(), "#ff6030");
        assert_eq!(params.outside_color.to_hex(), "#1b3984");
    }

    #[test]
    fn test_color_bytes_match_hex() {
        let c = Color::from_hex("#ff6030").unwrap();
        assert_eq!(c.to_bytes(), [0xff, 0x60, 0x30]);
        assert_eq!(Color::from_bytes([0xff, 0x60, 0x30]), c);
        assert_eq!(Color::from_bytes([0x1b, 0x39, 0x84]).to_hex(), "#1b3984");
    }

    #[test]
    fn test_color_lerp_endpoints() {
        let a = Color::new(1.0, 0.0, 0.0);
        let b = Color::new(0.0, 0.0, 1.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        let mid = a.lerp(b, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6 && (mid.b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(GalaxyParameters::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_degenerate() {
        let mut p = GalaxyParameters::default();
        p.branches = 0;
        assert!(p.validate().is_err());

        let mut p = GalaxyParameters::default();
        p.radius = 0.0;
        assert!(p.validate().is_err());

        let mut p = GalaxyParameters::default();
        p.randomness_power = f32::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_clamped_respects_ranges() {
        let p = GalaxyParameters {
            count: 5,
            branches: 99,
            spin: 12.0,
            rotation_speed: -1.0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(p.count, 1_000);
        assert_eq!(p.branches, 20);
        assert_eq!(p.spin, 5.0);
        assert_eq!(p.rotation_speed, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let p = GalaxyParameters::from_json_str(r##"{ "branches": 5, "inside_color": "#ffffff" }"##)
            .unwrap();
        assert_eq!(p.branches, 5);
        assert_eq!(p.inside_color, Color::new(1.0, 1.0, 1.0));
        assert_eq!(p.count, GalaxyParameters::default().count);
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        assert!(GalaxyParameters::from_json_str(r#"{ "count": 0 }"#).is_err());
        assert!(GalaxyParameters::from_json_str(r#"{ "outside_color": "blue" }"#).is_err());
    }

    #[test]
    fn test_rotation_speed_does_not_change_geometry() {
        let a = GalaxyParameters::default();
        let mut b = a.clone();
        b.rotation_speed = 0.7;
        b.size = 0.05;
        assert!(!a.geometry_differs(&b));
        b.spin = -2.0;
        assert!(a.geometry_differs(&b));
    }
}
