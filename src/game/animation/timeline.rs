use glam::{Quat, Vec3};

use crate::engine::{interpolate::Interpolate, transform::normalize_rotation};

use super::AnimationError;

/// A rotation and position for a single bone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub rotation: Quat,
    pub position: Vec3,
}

impl Interpolate for Pose {
    #[inline]
    fn interpolate(left: Self, right: Self, n: f32) -> Self {
        Self {
            rotation: Quat::interpolate(left.rotation, right.rotation, n),
            position: Vec3::interpolate(left.position, right.position, n),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyFrame {
    /// Time in seconds.
    pub time: f32,
    pub pose: Pose,
}

impl KeyFrame {
    pub fn new(time: f32, rotation: Quat, position: Vec3) -> Self {
        Self {
            time,
            pose: Pose { rotation, position },
        }
    }
}

/// A sequence of [KeyFrame]s for a single bone, sorted by time.
#[derive(Clone, Debug)]
pub struct Timeline {
    key_frames: Vec<KeyFrame>,
}

impl Timeline {
    /// Validates the key frames: at least one, times finite, non-negative and strictly increasing
    /// and poses finite. Rotations are normalized.
    pub fn new(mut key_frames: Vec<KeyFrame>) -> Result<Self, AnimationError> {
        if key_frames.is_empty() {
            return Err(AnimationError::InvalidInput(
                "timeline has no key frames".to_string(),
            ));
        }

        let mut previous_time: Option<f32> = None;
        for (i, key_frame) in key_frames.iter_mut().enumerate() {
            let time = key_frame.time;
            if !time.is_finite() || time < 0.0 {
                return Err(AnimationError::InvalidInput(format!(
                    "key frame {i} has invalid time {time}"
                )));
            }

            if let Some(previous_time) = previous_time
                && time <= previous_time
            {
                return Err(AnimationError::InvalidInput(format!(
                    "key frame {i} at {time} does not come after {previous_time}"
                )));
            }
            previous_time = Some(time);

            if !key_frame.pose.position.is_finite() {
                return Err(AnimationError::InvalidInput(format!(
                    "key frame {i} has a non-finite position"
                )));
            }

            key_frame.pose.rotation =
                normalize_rotation(key_frame.pose.rotation).ok_or_else(|| {
                    AnimationError::InvalidInput(format!("key frame {i} has an invalid rotation"))
                })?;
        }

        Ok(Self { key_frames })
    }

    #[inline]
    pub fn key_frames(&self) -> &[KeyFrame] {
        &self.key_frames
    }

    #[inline]
    pub fn key_frame_count(&self) -> usize {
        self.key_frames.len()
    }

    /// Time of the first key frame.
    #[inline]
    pub fn start_time(&self) -> f32 {
        self.key_frames[0].time
    }

    /// Time of the last key frame.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.key_frames[self.key_frames.len() - 1].time
    }

    /// Interpolated pose at `time`. Times outside the key frames are clamped to the first or last
    /// pose; wrapping is left to the caller. A NaN time yields the first pose.
    pub fn update(&self, time: f32) -> Pose {
        let first = &self.key_frames[0];
        if time.is_nan() || time <= first.time {
            return first.pose;
        }

        let last = &self.key_frames[self.key_frames.len() - 1];
        if time >= last.time {
            return last.pose;
        }

        // first.time < time < last.time, so 1 <= i < len.
        let i = self.key_frames.partition_point(|k| k.time <= time);
        let a = &self.key_frames[i - 1];
        let b = &self.key_frames[i];

        let t = ((time - a.time) / (b.time - a.time)).clamp(0.0, 1.0);

        Pose::interpolate(a.pose, b.pose, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    #[inline]
    fn approx_f(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }
    #[inline]
    fn approx_v3(a: Vec3, b: Vec3) -> bool {
        approx_f(a.x, b.x) && approx_f(a.y, b.y) && approx_f(a.z, b.z)
    }
    #[inline]
    fn approx_q(a: Quat, b: Quat) -> bool {
        // Quats can differ by sign; compare via absolute dot near 1
        a.is_normalized() && b.is_normalized() && a.dot(b).abs() > 1.0 - 1e-4
    }

    fn quarter_turn() -> Timeline {
        Timeline::new(vec![
            KeyFrame::new(0.0, Quat::IDENTITY, Vec3::ZERO),
            KeyFrame::new(1.0, Quat::from_rotation_y(FRAC_PI_2), Vec3::X),
        ])
        .unwrap()
    }

    #[test]
    fn midpoint_of_quarter_turn() {
        let pose = quarter_turn().update(0.5);
        assert!(approx_v3(pose.position, Vec3::new(0.5, 0.0, 0.0)));
        assert!(approx_q(pose.rotation, Quat::from_rotation_y(FRAC_PI_4)));
    }

    #[test]
    fn clamps_before_first_and_after_last() {
        let timeline = Timeline::new(vec![
            KeyFrame::new(0.5, Quat::from_rotation_x(0.3), Vec3::new(1.0, 2.0, 3.0)),
            KeyFrame::new(1.0, Quat::from_rotation_x(0.6), Vec3::new(4.0, 5.0, 6.0)),
            KeyFrame::new(2.0, Quat::from_rotation_x(0.9), Vec3::new(7.0, 8.0, 9.0)),
        ])
        .unwrap();

        let first = timeline.key_frames()[0].pose;
        let last = timeline.key_frames()[2].pose;

        for t in [-10.0, 0.0, 0.25, 0.5] {
            assert_eq!(timeline.update(t), first);
        }
        for t in [2.0, 2.5, 100.0] {
            assert_eq!(timeline.update(t), last);
        }
    }

    #[test]
    fn nan_time_yields_first_pose() {
        let timeline = Timeline::new(vec![
            KeyFrame::new(0.0, Quat::IDENTITY, Vec3::ZERO),
            KeyFrame::new(1.0, Quat::IDENTITY, Vec3::X),
        ])
        .unwrap();

        assert_eq!(timeline.update(f32::NAN), timeline.key_frames()[0].pose);
    }

    #[test]
    fn exact_key_hit_returns_key() {
        let timeline = Timeline::new(vec![
            KeyFrame::new(0.0, Quat::IDENTITY, Vec3::splat(1.0)),
            KeyFrame::new(0.8, Quat::IDENTITY, Vec3::splat(3.0)),
            KeyFrame::new(1.2, Quat::IDENTITY, Vec3::splat(7.0)),
        ])
        .unwrap();

        assert!(approx_v3(timeline.update(0.8).position, Vec3::splat(3.0)));
        // Second segment is used past the middle key.
        assert!(approx_v3(timeline.update(1.0).position, Vec3::splat(5.0)));
    }

    #[test]
    fn in_between_poses_stay_on_segment_and_normalized() {
        let a = Vec3::new(-1.0, 2.0, 0.5);
        let b = Vec3::new(3.0, -2.0, 4.5);
        let timeline = Timeline::new(vec![
            KeyFrame::new(0.0, Quat::from_rotation_z(0.2), a),
            KeyFrame::new(2.0, Quat::from_euler(glam::EulerRot::XYZ, 1.0, 2.0, 0.5), b),
        ])
        .unwrap();

        for step in 1..20 {
            let time = step as f32 * 0.1;
            let pose = timeline.update(time);
            assert!(pose.rotation.is_normalized());

            // Position must be a + (b - a) * s for some s in [0, 1].
            let s = time / 2.0;
            assert!(approx_v3(pose.position, a + (b - a) * s));
        }
    }

    #[test]
    fn rotations_are_normalized_on_construction() {
        let timeline = Timeline::new(vec![KeyFrame::new(
            0.0,
            Quat::from_xyzw(0.0, 0.0, 0.0, 3.0),
            Vec3::ZERO,
        )])
        .unwrap();

        assert_eq!(timeline.update(0.0).rotation, Quat::IDENTITY);
        assert_eq!(timeline.duration(), 0.0);
    }

    #[test]
    fn empty_timeline_is_rejected() {
        assert!(matches!(
            Timeline::new(Vec::new()),
            Err(AnimationError::InvalidInput(_))
        ));
    }

    #[test]
    fn unsorted_or_duplicate_times_are_rejected() {
        let unsorted = vec![
            KeyFrame::new(1.0, Quat::IDENTITY, Vec3::ZERO),
            KeyFrame::new(0.5, Quat::IDENTITY, Vec3::ZERO),
        ];
        assert!(matches!(
            Timeline::new(unsorted),
            Err(AnimationError::InvalidInput(_))
        ));

        let duplicate = vec![
            KeyFrame::new(0.5, Quat::IDENTITY, Vec3::ZERO),
            KeyFrame::new(0.5, Quat::IDENTITY, Vec3::X),
        ];
        assert!(matches!(
            Timeline::new(duplicate),
            Err(AnimationError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_time_and_degenerate_rotation_are_rejected() {
        assert!(
            Timeline::new(vec![KeyFrame::new(-0.1, Quat::IDENTITY, Vec3::ZERO)]).is_err()
        );
        assert!(
            Timeline::new(vec![KeyFrame::new(
                0.0,
                Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
                Vec3::ZERO
            )])
            .is_err()
        );
        assert!(
            Timeline::new(vec![KeyFrame::new(
                0.0,
                Quat::IDENTITY,
                Vec3::new(f32::INFINITY, 0.0, 0.0)
            )])
            .is_err()
        );
    }
}
