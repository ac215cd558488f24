mod bone_buffer;
mod driver;
mod skeleton;
mod timeline;

pub use bone_buffer::BoneMatrixBuffer;
pub use driver::{AnimationDriver, BoneTrack, MatrixMode};
pub use skeleton::{Bone, BoneDef, Skeleton};
pub use timeline::{KeyFrame, Pose, Timeline};

pub type BoneIndex = u32;

#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error("Invalid input ({0})")]
    InvalidInput(String),

    #[error("Bone index {index} is out of range (bone count is {count})")]
    OutOfRange { index: BoneIndex, count: usize },
}
