use super::asset::AssetError;

/// Vertex data for a skinned mesh, as exported.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Positions, 3 floats per vertex.
    pub vertices: Vec<f32>,
    /// Normals, 3 floats per vertex.
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// Interleaved bone weights, [SkinWeightLayout::source_stride] floats per vertex.
    pub skin_weights: Vec<f32>,
}

impl MeshData {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        if self.vertices.len() % 3 != 0 {
            return Err(AssetError::InvalidMesh(format!(
                "vertex array length {} is not a multiple of 3",
                self.vertices.len()
            )));
        }

        if !self.normals.is_empty() && self.normals.len() != self.vertices.len() {
            return Err(AssetError::InvalidMesh(format!(
                "{} normal components for {} vertex components",
                self.normals.len(),
                self.vertices.len()
            )));
        }

        let vertex_count = self.vertex_count();
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(AssetError::InvalidMesh(format!(
                "index {index} is out of range for {vertex_count} vertices"
            )));
        }

        Ok(())
    }

    /// Extract the weights the vertex shader consumes from the exported weight stream.
    ///
    /// The export may carry more weight channels per vertex than the shader reads. Only the first
    /// `layout.influences` values of each `layout.source_stride` group are kept.
    pub fn skin_weights(&self, layout: SkinWeightLayout) -> Result<Vec<f32>, AssetError> {
        layout.validate()?;

        let SkinWeightLayout {
            source_stride,
            influences,
        } = layout;

        if self.skin_weights.len() % source_stride != 0 {
            return Err(AssetError::InvalidMesh(format!(
                "{} skin weights is not a multiple of the stride {source_stride}",
                self.skin_weights.len()
            )));
        }

        let groups = self.skin_weights.len() / source_stride;
        if !self.vertices.is_empty() && groups != self.vertex_count() {
            return Err(AssetError::InvalidMesh(format!(
                "{groups} skin weight groups for {} vertices",
                self.vertex_count()
            )));
        }

        if source_stride == influences {
            return Ok(self.skin_weights.clone());
        }

        let mut weights = Vec::with_capacity(groups * influences);
        for group in self.skin_weights.chunks_exact(source_stride) {
            weights.extend_from_slice(&group[..influences]);
        }

        Ok(weights)
    }
}

/// How bone weights are laid out in the exported stream and how many the shader consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkinWeightLayout {
    /// Amount of floats per vertex in the exported stream.
    pub source_stride: usize,
    /// Amount of weights per vertex the shader reads.
    pub influences: usize,
}

impl SkinWeightLayout {
    /// Bone influences per vertex supported by the skinning shader.
    pub const MAX_INFLUENCES: usize = 4;

    pub fn validate(&self) -> Result<(), AssetError> {
        if self.influences == 0 || self.influences > Self::MAX_INFLUENCES {
            return Err(AssetError::InvalidMesh(format!(
                "influences must be between 1 and {}, got {}",
                Self::MAX_INFLUENCES,
                self.influences
            )));
        }

        if self.source_stride < self.influences {
            return Err(AssetError::InvalidMesh(format!(
                "source stride {} is smaller than the {} influences read",
                self.source_stride, self.influences
            )));
        }

        Ok(())
    }
}

impl Default for SkinWeightLayout {
    fn default() -> Self {
        Self {
            source_stride: 4,
            influences: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(vertex_count: usize, skin_weights: Vec<f32>) -> MeshData {
        MeshData {
            vertices: vec![0.0; vertex_count * 3],
            skin_weights,
            ..Default::default()
        }
    }

    #[test]
    fn drops_extra_channel_per_vertex() {
        let mesh = mesh(
            2,
            vec![
                1.0, 2.0, 3.0, 4.0, 99.0, //
                5.0, 6.0, 7.0, 8.0, 99.0,
            ],
        );

        let weights = mesh
            .skin_weights(SkinWeightLayout {
                source_stride: 5,
                influences: 4,
            })
            .unwrap();
        assert_eq!(weights, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn stride_must_divide_weights() {
        let mesh = mesh(2, vec![0.0; 9]);
        assert!(matches!(
            mesh.skin_weights(SkinWeightLayout {
                source_stride: 5,
                influences: 4
            }),
            Err(AssetError::InvalidMesh(_))
        ));
    }

    #[test]
    fn group_count_must_match_vertices() {
        let mesh = mesh(3, vec![0.0; 8]);
        assert!(mesh.skin_weights(SkinWeightLayout::default()).is_err());
    }

    #[test]
    fn layout_is_validated() {
        let too_many = SkinWeightLayout {
            source_stride: 8,
            influences: 5,
        };
        assert!(too_many.validate().is_err());

        let stride_too_small = SkinWeightLayout {
            source_stride: 3,
            influences: 4,
        };
        assert!(stride_too_small.validate().is_err());

        assert!(SkinWeightLayout::default().validate().is_ok());
    }

    #[test]
    fn indices_must_reference_vertices() {
        let mut data = mesh(3, Vec::new());
        data.indices = vec![0, 1, 2];
        assert!(data.validate().is_ok());

        data.indices.push(3);
        assert!(matches!(data.validate(), Err(AssetError::InvalidMesh(_))));
    }
}
