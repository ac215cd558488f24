//! The seam between animation code and whatever puts pixels on the screen.
//!
//! Callers push vertex/index buffers and named uniforms through [Renderer] and ask for draw calls.
//! Nothing behind this trait knows about bones or keyframes; skinning happens on the GPU side from
//! the matrices it is handed.

mod buffers;
mod headless;
mod uniforms;

pub use buffers::*;
pub use headless::*;
pub use uniforms::*;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Unknown uniform ({0})")]
    UnknownUniform(String),

    #[error("Unknown attribute ({0})")]
    UnknownAttribute(String),

    #[error("Uniform {name} expects a multiple of {components} values, got {len}")]
    UniformSize {
        name: String,
        components: usize,
        len: usize,
    },

    #[error("Buffer {label} expects a multiple of {item_bytes} bytes, got {len}")]
    BufferSize {
        label: String,
        item_bytes: usize,
        len: usize,
    },

    #[error("Buffer handle is not valid")]
    InvalidBuffer,

    #[error("No index buffer bound for draw call")]
    NoIndexBuffer,
}

pub trait Renderer {
    /// Creates a tracked buffer entry and returns its handle.
    fn create_buffer(&mut self, descriptor: BufferDescriptor) -> BufferId;

    /// Replace the contents of a buffer.
    fn set_buffer_data(&mut self, buffer: &BufferId, data: &[u8]) -> Result<(), RendererError>;

    /// Bind an array buffer to a named vertex attribute.
    fn set_attribute(&mut self, name: &str, buffer: &BufferId) -> Result<(), RendererError>;

    fn set_uniform(
        &mut self,
        name: &str,
        kind: UniformKind,
        data: &[f32],
    ) -> Result<(), RendererError>;

    fn clear(&mut self);

    fn draw_elements(&mut self, primitive: Primitive) -> Result<(), RendererError>;

    /// Upload a single matrix in column-major order.
    fn set_uniform_mat4(&mut self, name: &str, matrix: &glam::Mat4) -> Result<(), RendererError> {
        self.set_uniform(name, UniformKind::Matrix4fv, &matrix.to_cols_array())
    }
}
