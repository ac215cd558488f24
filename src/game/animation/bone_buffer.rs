use glam::Mat4;

use super::{AnimationError, BoneIndex};

/// Flat storage for the bone matrices uploaded to the skinning shader each frame.
///
/// Layout: bone `i` occupies floats `[i * STRIDE, (i + 1) * STRIDE)`, stored column-major so the
/// slice can be handed to `uniformMatrix4fv` without transposing. The storage is sized once for the
/// skeleton and is never reallocated.
#[derive(Clone, Debug)]
pub struct BoneMatrixBuffer {
    data: Vec<f32>,
}

impl BoneMatrixBuffer {
    /// Amount of floats used per bone.
    pub const STRIDE: usize = 16;

    /// Create a buffer for `bone_count` bones, with every matrix set to identity.
    pub fn new(bone_count: usize) -> Self {
        let mut data = Vec::with_capacity(bone_count * Self::STRIDE);
        for _ in 0..bone_count {
            data.extend_from_slice(&Mat4::IDENTITY.to_cols_array());
        }
        Self { data }
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.data.len() / Self::STRIDE
    }

    pub fn write(&mut self, index: BoneIndex, matrix: &Mat4) -> Result<(), AnimationError> {
        let count = self.bone_count();
        let start = index as usize * Self::STRIDE;
        let Some(slot) = self.data.get_mut(start..start + Self::STRIDE) else {
            return Err(AnimationError::OutOfRange { index, count });
        };

        matrix.write_cols_to_slice(slot);

        Ok(())
    }

    pub fn matrix(&self, index: BoneIndex) -> Option<Mat4> {
        let start = index as usize * Self::STRIDE;
        self.data
            .get(start..start + Self::STRIDE)
            .map(Mat4::from_cols_slice)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The raw bytes of the buffer, ready for a GPU upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
