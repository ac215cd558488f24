pub mod interpolate;
pub mod scene;
pub mod tracked;
pub mod transform;
