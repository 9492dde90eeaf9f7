//! Every shipped preset must load and produce a well-formed galaxy.
//!
//! Run with: cargo test --test presets

use std::fs;
use std::path::PathBuf;

use galaxy_viewer::galaxy::Galaxy;
use galaxy_viewer::gpu::mesh;
use galaxy_viewer::params::GalaxyParameters;

fn preset_paths() -> Vec<PathBuf> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("presets");
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .expect("presets directory should exist")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_presets_load() {
    let paths = preset_paths();
    assert!(!paths.is_empty(), "no presets found");

    for path in paths {
        let params = GalaxyParameters::load(&path)
            .unwrap_or_else(|e| panic!("{:?} failed to load: {:#}", path, e));
        assert_eq!(params, params.clamped(), "{:?} has values outside the panel ranges", path);
    }
}

#[test]
fn test_default_preset_matches_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("presets/default.json");
    let params = GalaxyParameters::load(&path).unwrap();
    assert_eq!(params, GalaxyParameters::default());
}

#[test]
fn test_presets_generate_expected_particles() {
    for path in preset_paths() {
        let mut params = GalaxyParameters::load(&path).unwrap();
        // Keep the test quick regardless of the preset's density.
        params.count = params.count.min(5_000);
        params.seed = Some(params.seed.unwrap_or(99));

        let galaxy = Galaxy::new(params.clone());
        assert_eq!(galaxy.len(), params.count as usize, "{:?}", path);

        let max_planar = params.radius * (1.0 + 2.0 * params.randomness) + 1e-3;
        for p in &galaxy.geometry.positions {
            assert!(p.iter().all(|v| v.is_finite()));
            assert!((p[0] * p[0] + p[2] * p[2]).sqrt() <= max_planar, "{:?}", path);
        }

        let vertices = mesh::interleave(&galaxy.geometry);
        assert_eq!(vertices.len(), galaxy.len());
    }
}

#[test]
fn test_saved_preset_loads_back() {
    let params = GalaxyParameters {
        branches: 11,
        spin: -2.5,
        seed: Some(5),
        ..Default::default()
    };
    let path = std::env::temp_dir().join(format!("galaxy_preset_{}.json", std::process::id()));
    params.save(&path).unwrap();
    let loaded = GalaxyParameters::load(&path).unwrap();
    let _ = fs::remove_file(&path);
    assert_eq!(loaded, params);
}
