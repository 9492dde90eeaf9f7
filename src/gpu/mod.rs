pub mod mesh;
pub mod pipeline;
pub mod points;
pub mod renderer;
