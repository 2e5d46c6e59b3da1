pub mod camera;
pub mod core;
pub mod material;
pub mod math;
pub mod parser;
pub mod render;
pub mod shading;
pub mod solid;
pub mod texture;
pub mod tracer;

pub use math::*;
