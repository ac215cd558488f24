/// The upload call used for a uniform, named after the WebGL entry points.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::AsRefStr)]
pub enum UniformKind {
    #[strum(serialize = "uniform1v")]
    Int1v,
    #[strum(serialize = "uniform3fv")]
    Float3v,
    #[strum(serialize = "uniformMatrix4fv")]
    Matrix4fv,
}

impl UniformKind {
    /// Number of floats in one element of this uniform.
    pub const fn components(self) -> usize {
        match self {
            UniformKind::Int1v => 1,
            UniformKind::Float3v => 3,
            UniformKind::Matrix4fv => 16,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum Primitive {
    Points,
    Lines,
    Triangles,
}
