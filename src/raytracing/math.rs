pub mod ray;
pub mod vec3;

pub use ray::*;
pub use vec3::*;
