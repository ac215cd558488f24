use ahash::HashMap;
use generational_arena::Arena;

use crate::{
    BufferDescriptor, BufferId, BufferKind, Primitive, Renderer, RendererError, UniformKind,
};

/// Names of the attributes and uniforms a program declares up front.
#[derive(Clone, Debug, Default)]
pub struct ProgramDescriptor {
    pub attributes: Vec<String>,
    pub uniforms: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct UniformValue {
    pub kind: UniformKind,
    pub data: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub primitive: Primitive,
    pub index_count: usize,
}

struct BufferEntry {
    descriptor: BufferDescriptor,
    data: Vec<u8>,
}

/// A [Renderer] that keeps everything it is given in memory and never touches a GPU.
///
/// Used to drive the frame loop without a window and to inspect uploads in tests.
pub struct HeadlessRenderer {
    buffers: Arena<BufferEntry>,
    attributes: HashMap<String, Option<BufferId>>,
    uniforms: HashMap<String, Option<UniformValue>>,
    /// The index buffer that was written to last.
    index_buffer: Option<BufferId>,
    draw_calls: Vec<DrawCall>,
    clears: u64,
}

impl HeadlessRenderer {
    pub fn new(program: ProgramDescriptor) -> Self {
        Self {
            buffers: Arena::default(),
            attributes: program.attributes.into_iter().map(|a| (a, None)).collect(),
            uniforms: program.uniforms.into_iter().map(|u| (u, None)).collect(),
            index_buffer: None,
            draw_calls: Vec::default(),
            clears: 0,
        }
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name).and_then(Option::as_ref)
    }

    pub fn attribute(&self, name: &str) -> Option<BufferId> {
        self.attributes.get(name).copied().flatten()
    }

    /// Copy the contents of a buffer out as typed elements.
    pub fn buffer_contents<T: bytemuck::Pod>(&self, buffer: &BufferId) -> Option<Vec<T>> {
        self.buffers.get(buffer.0).map(|entry| {
            entry
                .data
                .chunks_exact(std::mem::size_of::<T>())
                .map(bytemuck::pod_read_unaligned)
                .collect()
        })
    }

    pub fn buffer_descriptor(&self, buffer: &BufferId) -> Option<&BufferDescriptor> {
        self.buffers.get(buffer.0).map(|entry| &entry.descriptor)
    }

    #[inline]
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    #[inline]
    pub fn clears(&self) -> u64 {
        self.clears
    }
}

impl Renderer for HeadlessRenderer {
    fn create_buffer(&mut self, descriptor: BufferDescriptor) -> BufferId {
        tracing::debug!(
            "Creating {} buffer \"{}\" ({} x {})",
            descriptor.kind,
            descriptor.label,
            descriptor.item_size,
            descriptor.element_type
        );

        BufferId(self.buffers.insert(BufferEntry {
            descriptor,
            data: Vec::default(),
        }))
    }

    fn set_buffer_data(&mut self, buffer: &BufferId, data: &[u8]) -> Result<(), RendererError> {
        let entry = self
            .buffers
            .get_mut(buffer.0)
            .ok_or(RendererError::InvalidBuffer)?;

        let item_bytes = entry.descriptor.item_bytes();
        if item_bytes == 0 || data.len() % item_bytes != 0 {
            return Err(RendererError::BufferSize {
                label: entry.descriptor.label.clone(),
                item_bytes,
                len: data.len(),
            });
        }

        entry.data.clear();
        entry.data.extend_from_slice(data);

        if entry.descriptor.kind == BufferKind::Index {
            self.index_buffer = Some(*buffer);
        }

        Ok(())
    }

    fn set_attribute(&mut self, name: &str, buffer: &BufferId) -> Result<(), RendererError> {
        if !self.buffers.contains(buffer.0) {
            return Err(RendererError::InvalidBuffer);
        }

        let slot = self
            .attributes
            .get_mut(name)
            .ok_or_else(|| RendererError::UnknownAttribute(name.to_string()))?;
        *slot = Some(*buffer);

        Ok(())
    }

    fn set_uniform(
        &mut self,
        name: &str,
        kind: UniformKind,
        data: &[f32],
    ) -> Result<(), RendererError> {
        let slot = self
            .uniforms
            .get_mut(name)
            .ok_or_else(|| RendererError::UnknownUniform(name.to_string()))?;

        let components = kind.components();
        if data.is_empty() || data.len() % components != 0 {
            return Err(RendererError::UniformSize {
                name: name.to_string(),
                components,
                len: data.len(),
            });
        }

        match slot {
            // Reuse the allocation for uniforms that are uploaded every frame.
            Some(value) => {
                value.kind = kind;
                value.data.clear();
                value.data.extend_from_slice(data);
            }
            None => {
                *slot = Some(UniformValue {
                    kind,
                    data: data.to_vec(),
                });
            }
        }

        Ok(())
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn draw_elements(&mut self, primitive: Primitive) -> Result<(), RendererError> {
        let index_buffer = self.index_buffer.ok_or(RendererError::NoIndexBuffer)?;
        let entry = self
            .buffers
            .get(index_buffer.0)
            .ok_or(RendererError::InvalidBuffer)?;

        let index_count = entry.data.len() / entry.descriptor.item_bytes();

        self.draw_calls.push(DrawCall {
            primitive,
            index_count,
        });

        Ok(())
    }
}
