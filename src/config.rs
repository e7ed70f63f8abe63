use std::path::PathBuf;
use std::time::Duration;

use crate::assets::Color;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub width: u32,
    pub height: u32,
    /// Upper bound for the device pixel ratio used for the output buffer.
    pub pixel_ratio_cap: f64,
    /// Largest delta a single tick reports, however long the host stalled.
    pub max_frame_delta: Duration,
    pub asset_root: PathBuf,
    pub clear_color: Color,
    pub show_debug_panel: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            pixel_ratio_cap: 2.0,
            max_frame_delta: Duration::from_millis(100),
            asset_root: PathBuf::from("assets"),
            clear_color: Color::BLACK,
            show_debug_panel: true,
        }
    }
}
