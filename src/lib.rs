// Library exports for crashboard

pub mod aggregate;
pub mod chart;
pub mod filter;
pub mod geo;
pub mod ingest;
pub mod nav;
pub mod normalize;
pub mod palette;
pub mod render;
pub mod scale;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}
