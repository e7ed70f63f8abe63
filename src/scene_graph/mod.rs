pub mod light;
pub mod node;
pub mod renderable;
pub mod scene;
pub mod transform;

pub use light::{Light, LightKind};
pub use node::{Node, NodeId};
pub use renderable::Renderable;
pub use scene::Scene;
pub use transform::Transform;
