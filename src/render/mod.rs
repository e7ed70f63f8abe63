pub mod draw_list;
pub mod gpu;
pub mod recording;

pub use draw_list::{DrawItem, DrawLight, DrawList};
pub use recording::RecordingRenderer;

use crate::stage::Stage;

/// Paints a stage into an output buffer.
pub trait Renderer {
    /// Output buffer size in physical pixels.
    fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f64);

    fn output_size(&self) -> (u32, u32);

    fn render(&mut self, stage: &Stage) -> anyhow::Result<()>;
}
