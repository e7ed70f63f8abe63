//! wgpu backend: one forward pass over the draw list, with Dear ImGui
//! drawn on top.

mod imgui_layer;
mod mesh_cache;
mod pipelines;
mod renderer;
mod texture;
mod uniforms;

pub use renderer::GpuRenderer;
