pub mod camera;
pub mod galaxy;
pub mod gpu;
pub mod params;
pub mod visualiser;

#[cfg(not(target_arch = "wasm32"))]
pub mod app;
#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
#[cfg(not(target_arch = "wasm32"))]
pub mod debug_panel;

#[cfg(target_arch = "wasm32")]
pub mod wasm;
