use crate::assets::{AppearanceId, ShapeId};

/// A shape drawn with an appearance. Owned by exactly one node; the shape and
/// appearance it points at may be shared with other renderables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderable {
    pub shape: ShapeId,
    pub appearance: AppearanceId,
}

impl Renderable {
    pub fn new(shape: ShapeId, appearance: AppearanceId) -> Self {
        Self { shape, appearance }
    }
}
