//! Browser bindings: generate the galaxy in Rust, render it with the host page's renderer.

use wasm_bindgen::prelude::*;

use crate::galaxy::Galaxy;
use crate::params::GalaxyParameters;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Generated galaxy exposed as flat attribute arrays (`Float32Array` on the JS side).
#[wasm_bindgen]
pub struct WasmGalaxy {
    inner: Galaxy,
}

#[wasm_bindgen]
impl WasmGalaxy {
    /// Generate from a JSON parameter object; missing fields use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(params_json: &str) -> Result<WasmGalaxy, JsValue> {
        let params = if params_json.trim().is_empty() {
            GalaxyParameters::default()
        } else {
            GalaxyParameters::from_json_str(params_json).map_err(|e| JsValue::from_str(&format!("{:#}", e)))?
        };
        let inner = Galaxy::new(params);
        log::info!("Generated {} particles", inner.len());
        Ok(WasmGalaxy { inner })
    }

    pub fn count(&self) -> u32 {
        self.inner.len() as u32
    }

    /// Point size in world units.
    pub fn size(&self) -> f32 {
        self.inner.params.size
    }

    pub fn rotation_speed(&self) -> f32 {
        self.inner.params.rotation_speed
    }

    /// xyz triplets.
    pub fn positions(&self) -> Vec<f32> {
        self.inner.geometry.positions.iter().flatten().copied().collect()
    }

    /// rgb triplets.
    pub fn colors(&self) -> Vec<f32> {
        self.inner.geometry.colors.iter().flatten().copied().collect()
    }

    pub fn scales(&self) -> Vec<f32> {
        self.inner.geometry.scales.clone()
    }
}
