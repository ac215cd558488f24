use ahash::HashMap;
use glam::{Mat4, Quat, Vec3};

use crate::engine::transform::{Transform, normalize_rotation};

use super::{AnimationError, BoneIndex};

/// Description of a bone used to build a [Skeleton].
#[derive(Clone, Debug)]
pub struct BoneDef {
    pub name: Option<String>,
    /// Index of the parent bone, or [Bone::NO_PARENT] for a root.
    pub parent: BoneIndex,
    /// Rest pose relative to the parent.
    pub transform: Transform,
}

#[derive(Clone, Debug)]
pub struct Bone {
    pub index: BoneIndex,
    pub parent: BoneIndex,
    pub name: Option<String>,
    /// Rest pose relative to the parent.
    pub bind: Transform,
    /// Live pose relative to the parent, overwritten by [Skeleton::update_bone].
    pub current: Transform,
}

impl Bone {
    pub const NO_PARENT: BoneIndex = BoneIndex::MAX;

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent == Self::NO_PARENT
    }
}

/// A flat list of bones where every parent comes before its children.
///
/// The ordering lets world transforms be resolved in a single pass over the list, looking up the
/// parent's already computed transform by index.
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    /// Inverse of each bone's world transform in the bind pose.
    inverse_bind: Vec<Mat4>,
    name_lookup: HashMap<String, BoneIndex>,
}

impl Skeleton {
    pub fn new(defs: Vec<BoneDef>) -> Result<Self, AnimationError> {
        if defs.len() >= Bone::NO_PARENT as usize {
            return Err(AnimationError::InvalidInput(format!(
                "too many bones ({})",
                defs.len()
            )));
        }

        let mut bones = Vec::with_capacity(defs.len());
        let mut name_lookup = HashMap::default();

        for (index, def) in defs.into_iter().enumerate() {
            let index = index as BoneIndex;

            if def.parent != Bone::NO_PARENT && def.parent >= index {
                return Err(AnimationError::InvalidInput(format!(
                    "bone {index} has parent {} which does not come before it",
                    def.parent
                )));
            }

            if !def.transform.translation.is_finite() {
                return Err(AnimationError::InvalidInput(format!(
                    "bone {index} has a non-finite bind position"
                )));
            }

            let rotation = normalize_rotation(def.transform.rotation).ok_or_else(|| {
                AnimationError::InvalidInput(format!("bone {index} has an invalid bind rotation"))
            })?;
            let bind = def.transform.with_rotation(rotation);

            if let Some(name) = def.name.as_ref() {
                // First bone wins on duplicate names.
                name_lookup.entry(name.clone()).or_insert(index);
            }

            bones.push(Bone {
                index,
                parent: def.parent,
                name: def.name,
                bind,
                current: bind,
            });
        }

        let mut bind_world = Vec::with_capacity(bones.len());
        resolve_world_transforms(&bones, |bone| bone.bind, &mut bind_world);
        let inverse_bind = bind_world.iter().map(Mat4::inverse).collect();

        Ok(Self {
            bones,
            inverse_bind,
            name_lookup,
        })
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: BoneIndex) -> Option<&Bone> {
        self.bones.get(index as usize)
    }

    pub fn bone_index_by_name(&self, name: &str) -> Option<BoneIndex> {
        self.name_lookup.get(name).copied()
    }

    #[inline]
    pub fn inverse_bind_transforms(&self) -> &[Mat4] {
        &self.inverse_bind
    }

    /// Overwrite the live pose of a bone. Transforms are only resolved when asked for.
    pub fn update_bone(
        &mut self,
        index: BoneIndex,
        rotation: Quat,
        position: Vec3,
    ) -> Result<(), AnimationError> {
        let count = self.bones.len();
        let bone = self
            .bones
            .get_mut(index as usize)
            .ok_or(AnimationError::OutOfRange { index, count })?;

        bone.current = Transform::new(position, rotation);

        Ok(())
    }

    /// Put every bone back into its bind pose.
    pub fn reset_pose(&mut self) {
        for bone in self.bones.iter_mut() {
            bone.current = bone.bind;
        }
    }

    /// World transform of every bone in the current pose, in bone index order.
    pub fn calculate_bone_transforms(&self) -> Vec<Mat4> {
        let mut world = Vec::with_capacity(self.bones.len());
        self.bone_transforms_into(&mut world);
        world
    }

    /// Same as [Self::calculate_bone_transforms], reusing the storage in `world`.
    pub fn bone_transforms_into(&self, world: &mut Vec<Mat4>) {
        resolve_world_transforms(&self.bones, |bone| bone.current, world);
    }

    /// World transforms relative to the bind pose, i.e. `world * inverse(bind_world)`. Every
    /// matrix is identity while the skeleton is in its bind pose.
    pub fn calculate_skinning_matrices(&self) -> Vec<Mat4> {
        self.calculate_bone_transforms()
            .into_iter()
            .zip(self.inverse_bind.iter())
            .map(|(world, inverse_bind)| world * *inverse_bind)
            .collect()
    }
}

fn resolve_world_transforms(
    bones: &[Bone],
    pose_of: impl Fn(&Bone) -> Transform,
    world: &mut Vec<Mat4>,
) {
    world.clear();

    for bone in bones {
        let local = pose_of(bone).to_mat4();

        let transform = if bone.is_root() {
            local
        } else {
            // Parents are validated to come before children.
            world[bone.parent as usize] * local
        };

        world.push(transform);
    }
}
