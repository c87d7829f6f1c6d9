// canvas.rs - software rasterizer for the projection figure

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

pub fn rgb(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

pub fn with_alpha(c: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    Rgba([c[0], c[1], c[2], (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Largest rectangle of the given aspect ratio centered in `self`.
    pub fn fit_aspect(&self, aspect: f64) -> Self {
        let (w, h) = if self.w / self.h > aspect {
            (self.h * aspect, self.h)
        } else {
            (self.w, self.w / aspect)
        };
        let (cx, cy) = self.center();
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LineStyle {
    pub width: f64,
    pub color: Rgba<u8>,
    /// On/off lengths in pixels.
    pub dash: Option<[f64; 2]>,
}

pub struct Canvas {
    image: RgbaImage,
    clip: Option<PixelRect>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, background),
            clip: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn set_clip(&mut self, clip: Option<PixelRect>) {
        self.clip = clip;
    }

    pub fn put(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, color);
        }
    }

    /// Source-over blend of `color`, scaled by `coverage` in [0, 1].
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        if let Some(clip) = self.clip {
            if !clip.contains(x as f64 + 0.5, y as f64 + 0.5) {
                return;
            }
        }
        let a = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let v = color[c] as f32 * a + dst[c] as f32 * (1.0 - a);
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (a * 255.0 + dst[3] as f32 * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba<u8>) {
        let x0 = rect.x.round() as i64;
        let y0 = rect.y.round() as i64;
        let x1 = rect.right().round() as i64;
        let y1 = rect.bottom().round() as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    pub fn stroke_rect(&mut self, rect: PixelRect, width: f64, color: Rgba<u8>) {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.right(), rect.bottom()),
            (rect.x, rect.bottom()),
            (rect.x, rect.y),
        ];
        let style = LineStyle { width, color, dash: None };
        self.draw_polyline(&corners, &style);
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
        let x0 = (cx - radius - 1.0).floor() as i64;
        let x1 = (cx + radius + 1.0).ceil() as i64;
        let y0 = (cy - radius - 1.0).floor() as i64;
        let y1 = (cy + radius + 1.0).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage as f32);
                }
            }
        }
    }

    /// Anti-aliased segment of the given width.
    pub fn draw_segment(&mut self, a: (f64, f64), b: (f64, f64), width: f64, color: Rgba<u8>) {
        let half = (width / 2.0).max(0.35);
        let x0 = (a.0.min(b.0) - half - 1.0).floor() as i64;
        let x1 = (a.0.max(b.0) + half + 1.0).ceil() as i64;
        let y0 = (a.1.min(b.1) - half - 1.0).floor() as i64;
        let y1 = (a.1.max(b.1) + half + 1.0).ceil() as i64;

        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len_sq = dx * dx + dy * dy;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;
                let t = if len_sq > 0.0 {
                    (((px - a.0) * dx + (py - a.1) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let qx = a.0 + t * dx - px;
                let qy = a.1 + t * dy - py;
                let d = (qx * qx + qy * qy).sqrt();
                let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage as f32);
                }
            }
        }
    }

    pub fn draw_polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        let Some([on, off]) = style.dash else {
            for w in points.windows(2) {
                self.draw_segment(w[0], w[1], style.width, style.color);
            }
            return;
        };

        let period = on + off;
        let mut phase = 0.0_f64;
        for w in points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
            if len == 0.0 {
                continue;
            }
            let dir = ((b.0 - a.0) / len, (b.1 - a.1) / len);
            let at = |t: f64| (a.0 + dir.0 * t, a.1 + dir.1 * t);

            let mut t = 0.0;
            while t < len {
                let pos = phase % period;
                let drawing = pos < on;
                let run = if drawing { on - pos } else { period - pos };
                let run = run.min(len - t).max(1e-6);
                if drawing {
                    self.draw_segment(at(t), at(t + run), style.width, style.color);
                }
                t += run;
                phase += run;
            }
        }
    }

    /// Width and line height of `text` at `px` pixels.
    pub fn measure_text(font: &FontArc, px: f32, text: &str) -> (f32, f32) {
        let scaled = font.as_scaled(PxScale::from(px));
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        (width, scaled.height())
    }

    /// Draw `text` with its top-left corner at (`x`, `top`).
    pub fn draw_text(
        &mut self,
        font: &FontArc,
        px: f32,
        x: f64,
        top: f64,
        text: &str,
        color: Rgba<u8>,
    ) {
        let scale = PxScale::from(px);
        let scaled = font.as_scaled(scale);
        let baseline = top as f32 + scaled.ascent();
        let mut caret = x as f32;
        let mut prev = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, c| {
                    self.blend(
                        bounds.min.x as i64 + gx as i64,
                        bounds.min.y as i64 + gy as i64,
                        color,
                        c,
                    );
                });
            }
        }
    }
}

/// Even-odd scanline fill of `rings` over a `width` x `height` grid.
///
/// Calls `span(y, x0, x1)` for each covered run `x0..x1` of row `y`; a pixel
/// is covered when its center is inside.
pub fn fill_rings(
    rings: &[Vec<(f64, f64)>],
    width: usize,
    height: usize,
    mut span: impl FnMut(usize, usize, usize),
) {
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for ring in rings {
        for &(_, y) in ring {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() {
        return;
    }

    let row_start = (y_min - 0.5).ceil().max(0.0) as usize;
    let row_end = ((y_max - 0.5).floor() + 1.0).clamp(0.0, height as f64) as usize;
    let mut crossings: Vec<f64> = Vec::new();

    for row in row_start..row_end {
        let sy = row as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            for i in 0..n {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % n];
                if (y0 <= sy && y1 > sy) || (y1 <= sy && y0 > sy) {
                    crossings.push(x0 + (sy - y0) / (y1 - y0) * (x1 - x0));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let x0 = (pair[0] - 0.5).ceil().clamp(0.0, width as f64) as usize;
            let x1 = (pair[1] - 0.5).ceil().clamp(0.0, width as f64) as usize;
            if x1 > x0 {
                span(row, x0, x1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn fill_square_with_hole() {
        let outer = vec![(2.0, 2.0), (18.0, 2.0), (18.0, 18.0), (2.0, 18.0)];
        let hole = vec![(8.0, 8.0), (12.0, 8.0), (12.0, 12.0), (8.0, 12.0)];
        let mut grid = vec![false; 20 * 20];
        fill_rings(&[outer, hole], 20, 20, |y, x0, x1| {
            for x in x0..x1 {
                grid[y * 20 + x] = true;
            }
        });
        assert!(grid[3 * 20 + 3]);
        assert!(!grid[10 * 20 + 10]);
        assert!(!grid[0]);
        assert_eq!(grid.iter().filter(|&&c| c).count(), 16 * 16 - 4 * 4);
    }

    #[test]
    fn fill_clips_to_grid() {
        let tri = vec![(-10.0, -10.0), (30.0, -10.0), (-10.0, 30.0)];
        let mut count = 0;
        fill_rings(&[tri], 10, 10, |y, x0, x1| {
            assert!(y < 10 && x1 <= 10 && x0 < x1);
            count += x1 - x0;
        });
        assert_eq!(count, 100);
    }

    #[test]
    fn blend_respects_alpha_and_clip() {
        let mut canvas = Canvas::new(4, 4, BLACK);
        canvas.blend(0, 0, with_alpha(RED, 0.5), 1.0);
        canvas.set_clip(Some(PixelRect::new(2.0, 2.0, 2.0, 2.0)));
        canvas.blend(1, 1, RED, 1.0);
        canvas.blend(3, 3, RED, 1.0);
        canvas.blend(-1, 7, RED, 1.0);
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(0, 0)[0], 128);
        assert_eq!(*img.get_pixel(1, 1), BLACK);
        assert_eq!(*img.get_pixel(3, 3), RED);
    }

    #[test]
    fn circle_covers_its_center() {
        let mut canvas = Canvas::new(21, 21, BLACK);
        canvas.fill_circle(10.5, 10.5, 4.0, RED);
        let img = canvas.into_image();
        assert_eq!(*img.get_pixel(10, 10), RED);
        assert_eq!(*img.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn dashed_line_leaves_gaps() {
        let mut canvas = Canvas::new(40, 5, BLACK);
        let style = LineStyle { width: 1.0, color: RED, dash: Some([4.0, 4.0]) };
        canvas.draw_polyline(&[(0.0, 2.5), (40.0, 2.5)], &style);
        let img = canvas.into_image();
        assert!(img.get_pixel(1, 2)[0] > 200);
        assert!(img.get_pixel(6, 2)[0] < 50);
        assert!(img.get_pixel(9, 2)[0] > 200);
    }

    #[test]
    fn fit_aspect_centers() {
        let r = PixelRect::new(0.0, 0.0, 100.0, 40.0).fit_aspect(2.0);
        assert_eq!(r, PixelRect::new(10.0, 0.0, 80.0, 40.0));
        let r = PixelRect::new(0.0, 0.0, 50.0, 100.0).fit_aspect(1.0);
        assert_eq!(r, PixelRect::new(0.0, 25.0, 50.0, 50.0));
    }
}
