//! Loading of exported skinned models.
//!
//! The export is a JSON document holding the bind pose of every bone, one or more animations with
//! a key frame track per bone, and the mesh buffers:
//!
//! ```json
//! {
//!   "bones": [{ "parent": -1, "name": "root", "pos": [0, 0, 0], "rotq": [0, 0, 0, 1] }],
//!   "animations": [{
//!     "name": "bend",
//!     "length": 3.35,
//!     "hierarchy": [{ "keyFrames": [{ "time": 0, "rot": [0, 0, 0, 1], "pos": [0, 0, 0] }] }]
//!   }],
//!   "vertices": [], "normals": [], "indices": [], "skinWeights": []
//! }
//! ```
//!
//! Entry `i` of an animation's `hierarchy` animates bone `i`.

use std::path::Path;

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::{
    engine::transform::Transform,
    game::{
        animation::{
            AnimationError, Bone, BoneDef, BoneIndex, BoneTrack, KeyFrame, Skeleton, Timeline,
        },
        mesh::MeshData,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    #[error("Animation {index} not found ({count} available)")]
    AnimationNotFound { index: usize, count: usize },

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelFile {
    #[serde(default)]
    bones: Vec<BoneEntry>,
    #[serde(default)]
    animations: Vec<AnimationEntry>,
    #[serde(default)]
    vertices: Vec<f32>,
    #[serde(default)]
    normals: Vec<f32>,
    #[serde(default)]
    indices: Vec<u32>,
    #[serde(default)]
    skin_weights: Vec<f32>,
}

#[derive(Clone, Debug, Deserialize)]
struct BoneEntry {
    #[serde(alias = "parentIndex")]
    parent: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "position")]
    pos: [f32; 3],
    #[serde(default = "identity_rotation", alias = "rotation")]
    rotq: [f32; 4],
}

fn identity_rotation() -> [f32; 4] {
    Quat::IDENTITY.to_array()
}

#[derive(Clone, Debug, Deserialize)]
struct AnimationEntry {
    #[serde(default)]
    name: Option<String>,
    /// Declared length of the clip in seconds.
    #[serde(default)]
    length: Option<f32>,
    #[serde(default)]
    hierarchy: Vec<TrackEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct TrackEntry {
    #[serde(default, rename = "keyFrames", alias = "keys")]
    key_frames: Vec<KeyEntry>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct KeyEntry {
    time: f32,
    /// Rotation as `[x, y, z, w]`.
    rot: [f32; 4],
    pos: [f32; 3],
}

/// A loaded model: bones, animations and mesh buffers. Animation data is validated when it is
/// turned into a [Skeleton] or [BoneTrack]s.
#[derive(Debug)]
pub struct SkinnedModel {
    bones: Vec<BoneEntry>,
    animations: Vec<AnimationEntry>,
    mesh: MeshData,
}

impl SkinnedModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        tracing::info!("Loading model: {}", path.display());

        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, AssetError> {
        let file: ModelFile = serde_json::from_str(json)?;

        let mesh = MeshData {
            vertices: file.vertices,
            normals: file.normals,
            indices: file.indices,
            skin_weights: file.skin_weights,
        };
        mesh.validate()?;

        tracing::debug!(
            "Model has {} bones, {} animations and {} vertices",
            file.bones.len(),
            file.animations.len(),
            mesh.vertex_count()
        );

        Ok(Self {
            bones: file.bones,
            animations: file.animations,
            mesh,
        })
    }

    #[inline]
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn animation_name(&self, animation: usize) -> Option<&str> {
        self.animations.get(animation)?.name.as_deref()
    }

    pub fn skeleton(&self) -> Result<Skeleton, AssetError> {
        let defs = self
            .bones
            .iter()
            .enumerate()
            .map(|(index, bone)| -> Result<BoneDef, AnimationError> {
                let parent = if bone.parent < 0 {
                    Bone::NO_PARENT
                } else {
                    BoneIndex::try_from(bone.parent)
                        .ok()
                        .filter(|&parent| parent != Bone::NO_PARENT)
                        .ok_or_else(|| {
                            AnimationError::InvalidInput(format!(
                                "bone {index} has invalid parent {}",
                                bone.parent
                            ))
                        })?
                };

                Ok(BoneDef {
                    name: bone.name.clone(),
                    parent,
                    transform: Transform::new(
                        Vec3::from_array(bone.pos),
                        Quat::from_array(bone.rotq),
                    ),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Skeleton::new(defs)?)
    }

    fn animation(&self, animation: usize) -> Result<&AnimationEntry, AssetError> {
        self.animations
            .get(animation)
            .ok_or(AssetError::AnimationNotFound {
                index: animation,
                count: self.animations.len(),
            })
    }

    /// Build a [BoneTrack] for every bone that has key frames in the given animation. When
    /// `only_bones` is given, the remaining bones are left in their bind pose.
    pub fn bone_tracks(
        &self,
        animation: usize,
        only_bones: Option<&[BoneIndex]>,
    ) -> Result<Vec<BoneTrack>, AssetError> {
        let entry = self.animation(animation)?;

        if let Some(only_bones) = only_bones {
            for &bone in only_bones {
                let has_keys = entry
                    .hierarchy
                    .get(bone as usize)
                    .is_some_and(|track| !track.key_frames.is_empty());
                if !has_keys {
                    return Err(AnimationError::InvalidInput(format!(
                        "bone {bone} has no key frames in animation {animation}"
                    ))
                    .into());
                }
            }
        }

        let mut tracks = Vec::new();
        for (index, track) in entry.hierarchy.iter().enumerate() {
            let bone = BoneIndex::try_from(index).map_err(|_| {
                AnimationError::InvalidInput(format!("track {index} exceeds the bone index range"))
            })?;

            if only_bones.is_some_and(|only| !only.contains(&bone)) {
                continue;
            }

            if track.key_frames.is_empty() {
                tracing::debug!("Bone {bone} has no key frames, keeping bind pose");
                continue;
            }

            let key_frames = track
                .key_frames
                .iter()
                .map(|key| {
                    KeyFrame::new(key.time, Quat::from_array(key.rot), Vec3::from_array(key.pos))
                })
                .collect();

            let timeline = Timeline::new(key_frames).map_err(|err| match err {
                AnimationError::InvalidInput(reason) => {
                    AnimationError::InvalidInput(format!("bone {bone}: {reason}"))
                }
                err => err,
            })?;

            tracks.push(BoneTrack { bone, timeline });
        }

        Ok(tracks)
    }

    /// Length of the animation in seconds: the declared length, or the end of the longest track.
    pub fn clip_duration(&self, animation: usize) -> Result<f32, AssetError> {
        let entry = self.animation(animation)?;

        if let Some(length) = entry.length {
            return Ok(length);
        }

        Ok(entry
            .hierarchy
            .iter()
            .filter_map(|track| track.key_frames.last())
            .map(|key| key.time)
            .fold(0.0, f32::max))
    }
}
