use glam::{Mat4, Vec3};
use renderer::{BufferDescriptor, Primitive, ProgramDescriptor, Renderer, UniformKind};

use crate::{
    engine::{
        scene::{Scene, SceneError},
        tracked::Tracked,
    },
    game::{
        animation::{AnimationDriver, BoneIndex, MatrixMode},
        asset::SkinnedModel,
        mesh::SkinWeightLayout,
    },
};

pub const U_MODEL_MATRIX: &str = "u_mMatrix";
pub const U_PROJECTION_MATRIX: &str = "u_pMatrix";
pub const U_BONE_MATRICES: &str = "u_boneMatrices[0]";
pub const U_SCALE: &str = "u_scale";

/// Attributes and uniforms of the skinning shader program.
pub fn program_descriptor() -> ProgramDescriptor {
    ProgramDescriptor {
        attributes: ["a_position", "a_weight", "a_normal"]
            .into_iter()
            .map(String::from)
            .collect(),
        uniforms: [U_MODEL_MATRIX, U_PROJECTION_MATRIX, U_BONE_MATRICES, U_SCALE]
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// Index of the animation to play.
    pub animation: usize,
    /// Restrict animation to these bones. All bones with key frames are animated when `None`.
    pub bones: Option<Vec<BoneIndex>>,
    /// Override the clip length in seconds.
    pub duration: Option<f32>,
    pub weights: SkinWeightLayout,
    pub mode: MatrixMode,
    pub width: u32,
    pub height: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            animation: 0,
            bones: None,
            duration: None,
            weights: SkinWeightLayout::default(),
            mode: MatrixMode::default(),
            width: 1280,
            height: 800,
        }
    }
}

/// A single skinned mesh spinning in front of the camera while its skeleton plays an animation.
pub struct SkinnedCubeScene {
    driver: AnimationDriver,
    /// Seconds since the scene started.
    elapsed: f32,
    model: Mat4,
    projection: Tracked<Mat4>,
    frame_index: u64,
}

impl SkinnedCubeScene {
    /// Radians the model turns about the y-axis every frame.
    const SPIN_PER_FRAME: f32 = 0.01;
    const FIELD_OF_VIEW: f32 = std::f32::consts::PI / 1.2;
    const Z_NEAR: f32 = 0.1;
    const Z_FAR: f32 = 1000.0;

    pub fn new(
        renderer: &mut dyn Renderer,
        model: &SkinnedModel,
        config: &SceneConfig,
    ) -> Result<Self, SceneError> {
        let skeleton = model.skeleton()?;
        let tracks = model.bone_tracks(config.animation, config.bones.as_deref())?;
        let duration = match config.duration {
            Some(duration) => duration,
            None => model.clip_duration(config.animation)?,
        };

        tracing::info!(
            "Playing animation {} ({}) on {} of {} bones, {duration:.2}s, {} matrices",
            config.animation,
            model.animation_name(config.animation).unwrap_or("unnamed"),
            tracks.len(),
            skeleton.bone_count(),
            config.mode,
        );

        for track in tracks.iter() {
            let name = skeleton
                .bone(track.bone)
                .and_then(|bone| bone.name.as_deref())
                .unwrap_or("unnamed");
            tracing::debug!(
                "Bone {} ({name}) has {} key frames from {:.2}s to {:.2}s",
                track.bone,
                track.timeline.key_frame_count(),
                track.timeline.start_time(),
                track.timeline.duration()
            );
        }

        let driver = AnimationDriver::new(skeleton, tracks, duration, config.mode)?;

        Self::upload_mesh(renderer, model, config.weights)?;

        renderer.set_uniform(U_SCALE, UniformKind::Float3v, &[1.0, 1.0, 1.0])?;
        renderer.set_uniform(
            U_BONE_MATRICES,
            UniformKind::Matrix4fv,
            driver.buffer().as_slice(),
        )?;

        let model_matrix = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0));
        renderer.set_uniform_mat4(U_MODEL_MATRIX, &model_matrix)?;

        Ok(Self {
            driver,
            elapsed: 0.0,
            model: model_matrix,
            projection: Tracked::new(Self::projection(config.width, config.height)),
            frame_index: 0,
        })
    }

    fn upload_mesh(
        renderer: &mut dyn Renderer,
        model: &SkinnedModel,
        weights: SkinWeightLayout,
    ) -> Result<(), SceneError> {
        let mesh = model.mesh();
        let skin_weights = mesh.skin_weights(weights)?;

        let positions = renderer.create_buffer(BufferDescriptor::array("pos_cube", 3));
        renderer.set_buffer_data(&positions, bytemuck::cast_slice(&mesh.vertices))?;
        renderer.set_attribute("a_position", &positions)?;

        let bone_weights =
            renderer.create_buffer(BufferDescriptor::array("bone_weights", weights.influences));
        renderer.set_buffer_data(&bone_weights, bytemuck::cast_slice(&skin_weights))?;
        renderer.set_attribute("a_weight", &bone_weights)?;

        let normals = renderer.create_buffer(BufferDescriptor::array("normal_buffer", 3));
        renderer.set_buffer_data(&normals, bytemuck::cast_slice(&mesh.normals))?;
        renderer.set_attribute("a_normal", &normals)?;

        let indices = renderer.create_buffer(BufferDescriptor::index("index_cube"));
        renderer.set_buffer_data(&indices, bytemuck::cast_slice(&mesh.indices))?;

        Ok(())
    }

    fn projection(width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh_gl(Self::FIELD_OF_VIEW, aspect, Self::Z_NEAR, Self::Z_FAR)
    }

    #[inline]
    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Scene for SkinnedCubeScene {
    fn resize(&mut self, width: u32, height: u32) {
        *self.projection = Self::projection(width, height);
    }

    fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        self.model *= Mat4::from_rotation_y(Self::SPIN_PER_FRAME);
    }

    fn render(&mut self, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        renderer.clear();

        self.projection
            .if_changed(|projection| renderer.set_uniform_mat4(U_PROJECTION_MATRIX, projection))?;

        let bone_matrices = self.driver.advance(self.elapsed)?;
        renderer.set_uniform(
            U_BONE_MATRICES,
            UniformKind::Matrix4fv,
            bone_matrices.as_slice(),
        )?;
        renderer.set_uniform_mat4(U_MODEL_MATRIX, &self.model)?;

        renderer.draw_elements(Primitive::Triangles)?;

        self.frame_index += 1;
        tracing::trace!(
            "Frame {} at {:.3}s (clip time {:.3}s)",
            self.frame_index,
            self.elapsed,
            self.driver.playback_time(self.elapsed)
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::HeadlessRenderer;

    const MODEL: &str = r#"{
        "bones": [
            { "parent": -1, "pos": [0, 0, 0], "rotq": [0, 0, 0, 1] },
            { "parent": 0, "pos": [0, 1, 0], "rotq": [0, 0, 0, 1] }
        ],
        "animations": [{
            "length": 2.0,
            "hierarchy": [
                { "keyFrames": [] },
                { "keyFrames": [
                    { "time": 0, "rot": [0, 0, 0, 1], "pos": [0, 1, 0] },
                    { "time": 2, "rot": [0, 0, 0, 1], "pos": [2, 1, 0] }
                ] }
            ]
        }],
        "vertices": [0, 0, 0, 0, 1, 0, 1, 1, 0],
        "normals": [0, 0, 1, 0, 0, 1, 0, 0, 1],
        "indices": [0, 1, 2],
        "skinWeights": [1, 0, 0, 0, 0, 1, 0, 0, 0.5, 0.5, 0, 0]
    }"#;

    fn scene(renderer: &mut HeadlessRenderer) -> SkinnedCubeScene {
        let model = SkinnedModel::from_json_str(MODEL).unwrap();
        SkinnedCubeScene::new(renderer, &model, &SceneConfig::default()).unwrap()
    }

    #[test]
    fn creation_uploads_mesh_and_uniforms() {
        let mut renderer = HeadlessRenderer::new(program_descriptor());
        let _scene = scene(&mut renderer);

        let weights = renderer.attribute("a_weight").unwrap();
        assert_eq!(renderer.buffer_contents::<f32>(&weights).unwrap().len(), 12);
        assert_eq!(renderer.buffer_descriptor(&weights).unwrap().item_size, 4);

        assert_eq!(renderer.uniform(U_SCALE).unwrap().data, vec![1.0, 1.0, 1.0]);
        assert_eq!(renderer.uniform(U_BONE_MATRICES).unwrap().data.len(), 32);
    }

    #[test]
    fn frames_upload_bone_matrices_and_draw() {
        let mut renderer = HeadlessRenderer::new(program_descriptor());
        let mut scene = scene(&mut renderer);

        scene.update(0.5);
        scene.render(&mut renderer).unwrap();

        let bones = &renderer.uniform(U_BONE_MATRICES).unwrap().data;
        let child = Mat4::from_cols_slice(&bones[16..32]);
        let origin = child.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.5, 1.0, 0.0)).length() < 1e-5);

        assert!(renderer.uniform(U_PROJECTION_MATRIX).is_some());
        assert_eq!(renderer.draw_calls().len(), 1);
        assert_eq!(renderer.draw_calls()[0].index_count, 3);
        assert_eq!(renderer.clears(), 1);
        assert_eq!(scene.frame_index(), 1);
    }

    #[test]
    fn model_spins_every_update() {
        let mut renderer = HeadlessRenderer::new(program_descriptor());
        let mut scene = scene(&mut renderer);

        for _ in 0..10 {
            scene.update(1.0 / 60.0);
        }

        let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0))
            * Mat4::from_rotation_y(0.1);
        assert!(scene.model_matrix().abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn wrong_weight_layout_fails_creation() {
        let mut renderer = HeadlessRenderer::new(program_descriptor());
        let model = SkinnedModel::from_json_str(MODEL).unwrap();
        let config = SceneConfig {
            weights: SkinWeightLayout {
                source_stride: 5,
                influences: 4,
            },
            ..Default::default()
        };

        assert!(matches!(
            SkinnedCubeScene::new(&mut renderer, &model, &config),
            Err(SceneError::Asset(_))
        ));
    }
}
