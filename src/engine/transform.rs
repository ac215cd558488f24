use glam::{Mat4, Quat, Vec3};

/// A translation and rotation that can be converted into a 4x4 matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

/// Normalize a rotation read from external data. Returns `None` for rotations that can not
/// represent an orientation (non-finite or zero length).
pub fn normalize_rotation(rotation: Quat) -> Option<Quat> {
    if !rotation.is_finite() {
        return None;
    }

    let length = rotation.length();
    if length <= f32::EPSILON {
        return None;
    }

    Some(rotation / length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() {
        let transform = Transform::default().to_mat4();
        assert_eq!(transform, Mat4::IDENTITY);

        let transform = Transform::default()
            .with_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 1.0))
            .to_mat4();
        assert_eq!(transform, Mat4::IDENTITY);

        let transform = Transform::new(Vec3::new(10.0, 8.0, 6.0), Quat::IDENTITY).to_mat4();

        let transform = transform * Transform::default().to_mat4();

        assert_eq!(transform, Mat4::from_translation(Vec3::new(10.0, 8.0, 6.0)));
    }

    #[test]
    fn rotation_is_applied_before_translation() {
        let transform = Transform::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );

        let p = transform.to_mat4().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn normalize_rejects_degenerate_rotations() {
        assert!(normalize_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)).is_none());
        assert!(normalize_rotation(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0)).is_none());

        let q = normalize_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 2.0)).unwrap();
        assert_eq!(q, Quat::IDENTITY);
    }
}
