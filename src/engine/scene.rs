use renderer::{Renderer, RendererError};

use crate::game::{animation::AnimationError, asset::AssetError};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Renderer error: {0}")]
    Renderer(#[from] RendererError),

    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// A trait that represents a scene in the engine. It splits each stage of a frame into separate
/// function calls.
#[allow(unused)]
pub trait Scene {
    /// Called when the size of the output surface is changed.
    fn resize(&mut self, width: u32, height: u32) {}

    /// Called each frame with the `delta_time` in seconds that the last frame took.
    fn update(&mut self, delta_time: f32) {}

    /// Called to submit the frame to the renderer.
    fn render(&mut self, renderer: &mut dyn Renderer) -> Result<(), SceneError>;
}
