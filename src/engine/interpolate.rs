use glam::{Quat, Vec3};

pub trait Interpolate: Copy {
    fn interpolate(left: Self, right: Self, n: f32) -> Self;
}

impl Interpolate for Vec3 {
    #[inline]
    fn interpolate(left: Self, right: Self, n: f32) -> Self {
        left.lerp(right, n)
    }
}

impl Interpolate for Quat {
    /// Spherical interpolation along the shortest arc.
    #[inline]
    fn interpolate(left: Self, right: Self, n: f32) -> Self {
        left.slerp(right, n).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quat_takes_shortest_arc() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let b_flipped = -b;

        let q = Quat::interpolate(a, b_flipped, 0.5);
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(q.dot(expected).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn vec3_is_linear() {
        let v = Vec3::interpolate(Vec3::ZERO, Vec3::X * 4.0, 0.25);
        assert_eq!(v, Vec3::X);
    }
}
