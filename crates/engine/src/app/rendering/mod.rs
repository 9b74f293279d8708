mod font;
mod raster;
mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{MinimapLayout, Viewport};
