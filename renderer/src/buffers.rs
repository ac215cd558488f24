/// Handle to a buffer tracked by the renderer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BufferId(pub generational_arena::Index);

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum BufferKind {
    /// Per-vertex attribute data.
    Array,
    /// Element indices used by draw calls.
    Index,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum ElementType {
    F32,
    U32,
}

impl ElementType {
    pub const fn size(self) -> usize {
        match self {
            ElementType::F32 | ElementType::U32 => 4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BufferDescriptor {
    pub label: String,
    pub kind: BufferKind,
    pub element_type: ElementType,
    /// Amount of elements that make up one item, e.g. 3 for a position.
    pub item_size: usize,
}

impl BufferDescriptor {
    pub fn array(label: impl Into<String>, item_size: usize) -> Self {
        Self {
            label: label.into(),
            kind: BufferKind::Array,
            element_type: ElementType::F32,
            item_size,
        }
    }

    pub fn index(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: BufferKind::Index,
            element_type: ElementType::U32,
            item_size: 1,
        }
    }

    /// Size in bytes of a single item.
    #[inline]
    pub fn item_bytes(&self) -> usize {
        self.element_type.size() * self.item_size
    }
}
