// texture.rs - the Earth raster: decode, sample, fit to GPU limits

use crate::fetch::{fetch_bytes, FetchError};
use crate::geo::GeoPoint;
use image::{Rgba, RgbaImage};

pub const DEFAULT_TEXTURE_URL: &str = "https://eoimages.gsfc.nasa.gov/images/imagerecords/73000/73909/world.topo.bathy.200412.3x5400x2700.jpg";

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("could not decode texture: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture is empty")]
    Empty,
}

/// Equirectangular Earth image: column 0 is 180°W, row 0 is 90°N.
#[derive(Debug, Clone)]
pub struct EarthTexture {
    image: RgbaImage,
}

impl EarthTexture {
    pub fn from_image(image: RgbaImage) -> Result<Self, TextureError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(TextureError::Empty);
        }
        Ok(Self { image })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(img.to_rgba8())
    }

    pub fn load(source: &str) -> Result<Self, TextureError> {
        let bytes = fetch_bytes(source)?;
        Self::decode(&bytes)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Bilinear sample at a geographic point; wraps in longitude, clamps in latitude.
    pub fn sample(&self, p: GeoPoint) -> Rgba<u8> {
        let (w, h) = self.image.dimensions();
        let fx = (p.lon + 180.0) / 360.0 * w as f64 - 0.5;
        let fy = ((90.0 - p.lat) / 180.0 * h as f64 - 0.5).clamp(0.0, (h - 1) as f64);

        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let col = |x: f64| (x as i64).rem_euclid(w as i64) as u32;
        let (xa, xb) = (col(x0), col(x0 + 1.0));
        let ya = y0 as u32;
        let yb = (ya + 1).min(h - 1);

        let p00 = self.image.get_pixel(xa, ya).0;
        let p10 = self.image.get_pixel(xb, ya).0;
        let p01 = self.image.get_pixel(xa, yb).0;
        let p11 = self.image.get_pixel(xb, yb).0;

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = p00[c] as f64 * (1.0 - tx) + p10[c] as f64 * tx;
            let bottom = p01[c] as f64 * (1.0 - tx) + p11[c] as f64 * tx;
            out[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
        }
        Rgba(out)
    }

    /// Copy of the image that fits in `max_dimension`, for GPU upload.
    pub fn fitted(&self, max_dimension: u32) -> RgbaImage {
        let (src_w, src_h) = self.image.dimensions();
        if src_w <= max_dimension && src_h <= max_dimension {
            return self.image.clone();
        }

        let scale = max_dimension as f32 / src_w.max(src_h) as f32;
        let new_w = ((src_w as f32 * scale) as u32).max(1);
        let new_h = ((src_h as f32 * scale) as u32).max(1);
        log::warn!(
            "{}",
            crate::i18n::tr_with(
                "gpu.texture_scaled",
                &[
                    ("src_w", src_w.to_string()),
                    ("src_h", src_h.to_string()),
                    ("max", max_dimension.to_string()),
                    ("new_w", new_w.to_string()),
                    ("new_h", new_h.to_string())
                ]
            )
        );
        image::imageops::resize(
            &self.image,
            new_w,
            new_h,
            image::imageops::FilterType::Lanczos3,
        )
    }
}
