use glam::Mat4;

use super::{AnimationError, BoneIndex, BoneMatrixBuffer, Pose, Skeleton, Timeline};

/// A [Timeline] driving a single bone.
#[derive(Clone, Debug)]
pub struct BoneTrack {
    pub bone: BoneIndex,
    pub timeline: Timeline,
}

/// Which matrices end up in the bone buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, strum::Display)]
pub enum MatrixMode {
    /// World transform of each bone.
    #[default]
    World,
    /// World transform multiplied by the inverse of the bind pose world transform.
    BindRelative,
}

/// Owns everything needed to turn an elapsed time into bone matrices: the skeleton, the tracks
/// animating it and the buffer the matrices are written to.
pub struct AnimationDriver {
    skeleton: Skeleton,
    tracks: Vec<BoneTrack>,
    /// Length of the clip in seconds. Playback wraps at this time, unless it is 0.
    duration: f32,
    mode: MatrixMode,
    /// Scratch storage for world transforms, reused every frame.
    world: Vec<Mat4>,
    buffer: BoneMatrixBuffer,
}

impl AnimationDriver {
    pub fn new(
        skeleton: Skeleton,
        tracks: Vec<BoneTrack>,
        duration: f32,
        mode: MatrixMode,
    ) -> Result<Self, AnimationError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(AnimationError::InvalidInput(format!(
                "invalid clip duration {duration}"
            )));
        }

        let count = skeleton.bone_count();
        let mut driven = vec![false; count];
        for track in tracks.iter() {
            let Some(seen) = driven.get_mut(track.bone as usize) else {
                return Err(AnimationError::OutOfRange {
                    index: track.bone,
                    count,
                });
            };

            if *seen {
                return Err(AnimationError::InvalidInput(format!(
                    "bone {} is driven by more than one track",
                    track.bone
                )));
            }
            *seen = true;
        }

        let mut driver = Self {
            world: Vec::with_capacity(count),
            buffer: BoneMatrixBuffer::new(count),
            skeleton,
            tracks,
            duration,
            mode,
        };

        // Start out with the bind pose in the buffer.
        driver.write_matrices()?;

        Ok(driver)
    }

    #[inline]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    pub fn tracks(&self) -> &[BoneTrack] {
        &self.tracks
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn mode(&self) -> MatrixMode {
        self.mode
    }

    #[inline]
    pub fn buffer(&self) -> &BoneMatrixBuffer {
        &self.buffer
    }

    /// Map an elapsed time onto the clip, wrapping around at the end.
    pub fn playback_time(&self, elapsed: f32) -> f32 {
        if self.duration > 0.0 {
            elapsed.rem_euclid(self.duration)
        } else {
            elapsed
        }
    }

    /// Poses of every driven bone at `elapsed`, without touching the skeleton.
    pub fn sample(&self, elapsed: f32) -> Vec<(BoneIndex, Pose)> {
        let time = self.playback_time(elapsed);
        self.tracks
            .iter()
            .map(|track| (track.bone, track.timeline.update(time)))
            .collect()
    }

    /// Pose the skeleton for `elapsed` and write the resulting matrices to the bone buffer.
    pub fn advance(&mut self, elapsed: f32) -> Result<&BoneMatrixBuffer, AnimationError> {
        if !elapsed.is_finite() {
            return Err(AnimationError::InvalidInput(format!(
                "invalid elapsed time {elapsed}"
            )));
        }

        let time = self.playback_time(elapsed);
        for track in self.tracks.iter() {
            let pose = track.timeline.update(time);
            self.skeleton
                .update_bone(track.bone, pose.rotation, pose.position)?;
        }

        self.write_matrices()?;

        Ok(&self.buffer)
    }

    fn write_matrices(&mut self) -> Result<(), AnimationError> {
        self.skeleton.bone_transforms_into(&mut self.world);

        match self.mode {
            MatrixMode::World => {
                for (index, world) in self.world.iter().enumerate() {
                    self.buffer.write(index as BoneIndex, world)?;
                }
            }
            MatrixMode::BindRelative => {
                let inverse_bind = self.skeleton.inverse_bind_transforms();
                for (index, (world, inverse_bind)) in
                    self.world.iter().zip(inverse_bind).enumerate()
                {
                    self.buffer
                        .write(index as BoneIndex, &(*world * *inverse_bind))?;
                }
            }
        }

        Ok(())
    }
}
