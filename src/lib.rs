pub mod assets;
pub mod camera;
pub mod clock;
pub mod config;
pub mod controls;
pub mod debug_panel;
pub mod error;
pub mod frame_loop;
pub mod lessons;
pub mod math;
pub mod render;
pub mod scene_graph;
pub mod stage;
pub mod viewport;
pub mod window;

pub use error::{SceneError, SceneResult};
