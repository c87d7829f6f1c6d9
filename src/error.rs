// error.rs - the two failure scopes: startup and per-click

use crate::config::ConfigError;
use crate::features::FeatureError;
use crate::mesh::MeshError;
use crate::renderer::GraphicsError;
use crate::texture::TextureError;

/// Anything that stops the viewer before the globe is shown.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("could not load the Earth texture: {0}")]
    Texture(#[from] TextureError),
    #[error("could not build the globe mesh: {0}")]
    Mesh(#[from] MeshError),
    #[error("could not create the window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("graphics setup failed: {0}")]
    Graphics(#[from] GraphicsError),
}

/// Failure while drawing the projection figure.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("map features unavailable: {0}")]
    Features(#[from] FeatureError),
    #[error("invalid projection center ({lat}, {lon})")]
    InvalidCenter { lat: f64, lon: f64 },
    #[error("invalid DPI {0}")]
    InvalidDpi(f64),
    #[error("figure of {width}x{height} pixels is too large")]
    FigureSize { width: u32, height: u32 },
}

/// Failure while handling one click; the session keeps running.
#[derive(Debug, thiserror::Error)]
pub enum ClickError {
    #[error("no point on the globe under the cursor")]
    NoPick,
    #[error("picked point ({x}, {y}, {z}) has no direction")]
    InvalidPoint { x: f64, y: f64, z: f64 },
    #[error(transparent)]
    Render(#[from] RenderError),
}
