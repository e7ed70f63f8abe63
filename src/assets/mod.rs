pub mod appearance;
pub mod color;
pub mod shape;
pub mod shapes;
pub mod texture;

pub use appearance::{Appearance, AppearanceId, ShadingModel, Side, TextureMaps};
pub use color::Color;
pub use shape::{Shape, ShapeId, Vertex};
pub use texture::{
    ColorSpace, Filter, LoadProgress, Texture, TextureId, TextureImage, TextureSettings,
    TextureState, TextureStore, Wrap,
};
