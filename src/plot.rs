// plot.rs - the two-panel projection figure rendered for each click

use crate::canvas::{rgb, with_alpha, Canvas, LineStyle, PixelRect};
use crate::error::RenderError;
use crate::features::{FeatureCache, MapFeatures};
use crate::geo::{normalize_longitude, GeoPoint};
use crate::projection::{Extent, MapProjection};
use crate::session::ProjectionRenderer;
use crate::texture::EarthTexture;
use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use std::time::Instant;

/// Figure size in inches (two square-ish panels side by side).
const FIGURE_WIDTH_IN: f64 = 20.0;
const FIGURE_HEIGHT_IN: f64 = 10.0;

/// Highest DPI a figure can be rendered at.
pub const MAX_DPI: f64 = 750.0;

/// Largest figure we agree to allocate, in pixels: the figure at `MAX_DPI`.
const MAX_FIGURE_PIXELS: f64 = FIGURE_WIDTH_IN * FIGURE_HEIGHT_IN * MAX_DPI * MAX_DPI;

const GRID_STEP_DEG: f64 = 30.0;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const OCEAN: Rgba<u8> = Rgba([173, 216, 230, 255]);
const LAND: Rgba<u8> = Rgba([211, 211, 211, 255]);
const FEATURE_LINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const GRID: Rgba<u8> = Rgba([128, 128, 128, 255]);
const MARKER: Rgba<u8> = Rgba([255, 0, 0, 255]);
const TEXT: Rgba<u8> = Rgba([235, 235, 235, 255]);

/// What goes on the panels besides the projection itself.
#[derive(Clone, Copy, Default)]
pub struct Layers<'a> {
    /// Background raster; `None` leaves the land/ocean fill visible.
    pub stock_image: Option<&'a EarthTexture>,
    pub features: Option<&'a MapFeatures>,
    pub font: Option<&'a FontArc>,
}

/// Pixel placement of both map areas for a given DPI.
#[derive(Debug, Clone, Copy)]
pub struct FigureLayout {
    pub width: u32,
    pub height: u32,
    /// Pixels per typographic point.
    pub pt: f64,
    pub dpi: f64,
    pub orthographic: PixelRect,
    pub rotated: PixelRect,
}

impl FigureLayout {
    pub fn new(dpi: f64) -> Self {
        let width = (FIGURE_WIDTH_IN * dpi).round();
        let height = (FIGURE_HEIGHT_IN * dpi).round();
        let half = (width / 2.0).floor();
        let unit = GeoPoint::new(0.0, 0.0);
        let ortho_aspect = MapProjection::orthographic(unit).extent().aspect();
        let rotated_aspect = MapProjection::rotated_pole(unit).extent().aspect();

        let map_area = |x0: f64, w: f64| {
            PixelRect::new(
                x0 + 0.8 * dpi,
                1.2 * dpi,
                w - 1.2 * dpi,
                height - 1.9 * dpi,
            )
        };

        Self {
            width: width as u32,
            height: height as u32,
            pt: dpi / 72.0,
            dpi,
            orthographic: map_area(0.0, half).fit_aspect(ortho_aspect),
            rotated: map_area(half, width - half).fit_aspect(rotated_aspect),
        }
    }
}

/// One map area: a projection stretched over a pixel rectangle.
struct Panel {
    projection: MapProjection,
    extent: Extent,
    rect: PixelRect,
}

impl Panel {
    fn new(projection: MapProjection, rect: PixelRect) -> Self {
        Self {
            extent: projection.extent(),
            projection,
            rect,
        }
    }

    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let e = &self.extent;
        (
            self.rect.x + (x - e.x_min) / e.width() * self.rect.w,
            self.rect.y + (e.y_max - y) / e.height() * self.rect.h,
        )
    }

    fn from_pixel(&self, px: f64, py: f64) -> (f64, f64) {
        let e = &self.extent;
        (
            e.x_min + (px - self.rect.x) / self.rect.w * e.width(),
            e.y_max - (py - self.rect.y) / self.rect.h * e.height(),
        )
    }

    fn geo_to_pixel(&self, p: GeoPoint) -> Option<(f64, f64)> {
        self.projection.project(p).map(|(x, y)| self.to_pixel(x, y))
    }

    /// Project a lon/lat line, split where it leaves the visible side or
    /// wraps around the projected plane.
    fn project_line(&self, line: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        let wrap = self.projection.wrap_width();
        let mut runs = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        let mut last_x: Option<f64> = None;

        for &(lon, lat) in line {
            match self.projection.project(GeoPoint::new(lat, lon)) {
                Some((x, y)) => {
                    let jumped = match (wrap, last_x) {
                        (Some(w), Some(lx)) => (x - lx).abs() > w / 2.0,
                        _ => false,
                    };
                    if jumped && current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    } else if jumped {
                        current.clear();
                    }
                    current.push(self.to_pixel(x, y));
                    last_x = Some(x);
                }
                None => {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                    last_x = None;
                }
            }
        }
        if current.len() > 1 {
            runs.push(current);
        }
        runs
    }
}

pub fn format_longitude(lon: f64) -> String {
    let lon = normalize_longitude(lon);
    if lon.abs() < 1e-9 || (lon - 180.0).abs() < 1e-9 {
        format!("{:.0}°", lon.abs())
    } else if lon > 0.0 {
        format!("{:.0}°E", lon)
    } else {
        format!("{:.0}°W", -lon)
    }
}

pub fn format_latitude(lat: f64) -> String {
    if lat.abs() < 1e-9 {
        "0°".to_string()
    } else if lat > 0.0 {
        format!("{:.0}°N", lat)
    } else {
        format!("{:.0}°S", -lat)
    }
}

fn graticule() -> Vec<Vec<(f64, f64)>> {
    let mut lines = Vec::new();
    let mut lon = -180.0;
    while lon < 180.0 {
        lines.push((0..=180).map(|i| (lon, -90.0 + i as f64)).collect());
        lon += GRID_STEP_DEG;
    }
    let mut lat = -90.0 + GRID_STEP_DEG;
    while lat < 90.0 {
        lines.push((0..=360).map(|i| (-180.0 + i as f64, lat)).collect());
        lat += GRID_STEP_DEG;
    }
    lines
}

fn draw_raster(canvas: &mut Canvas, panel: &Panel, layers: &Layers) {
    let r = panel.rect;
    let x0 = r.x.round().max(0.0) as u32;
    let y0 = r.y.round().max(0.0) as u32;
    let x1 = (r.right().round() as u32).min(canvas.width());
    let y1 = (r.bottom().round() as u32).min(canvas.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let (x, y) = panel.from_pixel(px as f64 + 0.5, py as f64 + 0.5);
            let Some(geo) = panel.projection.unproject(x, y) else {
                continue;
            };
            let color = match (layers.stock_image, layers.features) {
                (Some(texture), _) => texture.sample(geo),
                (None, Some(f)) if f.land.is_land(geo) => LAND,
                _ => OCEAN,
            };
            canvas.put(px, py, color);
        }
    }
}

fn draw_lines(canvas: &mut Canvas, panel: &Panel, lines: &[Vec<(f64, f64)>], style: &LineStyle) {
    for line in lines {
        for run in panel.project_line(line) {
            canvas.draw_polyline(&run, style);
        }
    }
}

/// Meridian and parallel crossings along one panel edge, as
/// (pixel position, label). `at` maps 0..=1 along the edge to projected x/y.
fn edge_crossings(panel: &Panel, at: impl Fn(f64) -> (f64, f64)) -> Vec<((f64, f64), String)> {
    const SAMPLES: usize = 720;
    let mut out = Vec::new();
    let mut prev: Option<(GeoPoint, (f64, f64))> = None;

    for i in 0..=SAMPLES {
        let (x, y) = at(i as f64 / SAMPLES as f64);
        let Some(g) = panel.projection.unproject(x, y) else {
            prev = None;
            continue;
        };
        let pix = panel.to_pixel(x, y);
        if let Some((g0, p0)) = prev {
            let lerp = |t: f64| (p0.0 + (pix.0 - p0.0) * t, p0.1 + (pix.1 - p0.1) * t);

            let mut lon = -180.0;
            while lon < 180.0 {
                let d0 = normalize_longitude(g0.lon - lon);
                let d1 = normalize_longitude(g.lon - lon);
                // a sign flip across the antimeridian of `lon` is not a crossing
                if (d0 < 0.0) != (d1 < 0.0) && (d0 - d1).abs() < 90.0 {
                    out.push((lerp(d0 / (d0 - d1)), format_longitude(lon)));
                }
                lon += GRID_STEP_DEG;
            }

            let mut lat = -90.0 + GRID_STEP_DEG;
            while lat < 90.0 {
                let d0 = g0.lat - lat;
                let d1 = g.lat - lat;
                if (d0 < 0.0) != (d1 < 0.0) {
                    out.push((lerp(d0 / (d0 - d1)), format_latitude(lat)));
                }
                lat += GRID_STEP_DEG;
            }
        }
        prev = Some((g, pix));
    }
    out
}

/// Keep the labels that do not crowd one already in `placed`.
fn spread_labels(
    candidates: Vec<((f64, f64), String)>,
    min_spacing: f64,
    placed: &mut Vec<(f64, f64)>,
) -> Vec<((f64, f64), String)> {
    candidates
        .into_iter()
        .filter(|&(p, _)| {
            let crowded = placed
                .iter()
                .any(|q| (q.0 - p.0).abs() < min_spacing && (q.1 - p.1).abs() < min_spacing);
            if !crowded {
                placed.push(p);
            }
            !crowded
        })
        .collect()
}

/// Gridline labels where parallels/meridians cross the left and bottom edges.
fn draw_grid_labels(canvas: &mut Canvas, panel: &Panel, font: &FontArc, layout: &FigureLayout) {
    let px = (9.0 * layout.pt) as f32;
    let gap = 0.08 * layout.dpi;
    let min_spacing = 1.5 * px as f64;
    let e = panel.extent;

    let mut placed = Vec::new();
    let left = edge_crossings(panel, |t| (e.x_min, e.y_max - t * e.height()));
    for ((x, y), label) in spread_labels(left, min_spacing, &mut placed) {
        let (w, h) = Canvas::measure_text(font, px, &label);
        canvas.draw_text(font, px, x - gap - w as f64, y - h as f64 / 2.0, &label, TEXT);
    }
    let bottom = edge_crossings(panel, |t| (e.x_min + t * e.width(), e.y_min));
    for ((x, y), label) in spread_labels(bottom, min_spacing, &mut placed) {
        let (w, _) = Canvas::measure_text(font, px, &label);
        canvas.draw_text(font, px, x - w as f64 / 2.0, y + gap, &label, TEXT);
    }
}

fn draw_legend(canvas: &mut Canvas, rect: PixelRect, layers: &Layers, layout: &FigureLayout) {
    let pt = layout.pt;
    let text_px = (10.0 * pt) as f32;
    let marker_r = 5.0 * pt;
    let pad = 0.4 * text_px as f64;
    let label = crate::i18n::tr("plot.selected_point");

    let (text_w, text_h) = match layers.font {
        Some(font) => {
            let (w, h) = Canvas::measure_text(font, text_px, &label);
            (w as f64, h as f64)
        }
        None => (0.0, 0.0),
    };
    let inner_h = text_h.max(2.0 * marker_r);
    let box_w = pad + 2.0 * marker_r + pad + text_w + pad;
    let box_h = inner_h + 2.0 * pad;
    let margin = 0.1 * layout.dpi;
    let boxed = PixelRect::new(rect.x + margin, rect.bottom() - margin - box_h, box_w, box_h);

    canvas.fill_rect(boxed, with_alpha(rgb(255, 255, 255), 0.8));
    canvas.stroke_rect(boxed, 0.8 * pt, rgb(204, 204, 204));

    let cy = boxed.y + pad + inner_h / 2.0;
    canvas.fill_circle(boxed.x + pad + marker_r, cy, marker_r, MARKER);
    if let Some(font) = layers.font {
        let tx = boxed.x + pad + 2.0 * marker_r + pad;
        canvas.draw_text(font, text_px, tx, cy - text_h / 2.0, &label, rgb(0, 0, 0));
    }
}

fn draw_title(canvas: &mut Canvas, rect: PixelRect, font: &FontArc, lines: [&str; 2], layout: &FigureLayout) {
    let px = (12.0 * layout.pt) as f32;
    let line_h = 1.2 * px as f64;
    let mut top = rect.y - 0.12 * layout.dpi - 2.0 * line_h;
    for line in lines {
        let (w, _) = Canvas::measure_text(font, px, line);
        canvas.draw_text(font, px, rect.center().0 - w as f64 / 2.0, top, line, TEXT);
        top += line_h;
    }
}

fn centered_subtitle(center: GeoPoint) -> String {
    crate::i18n::tr_with(
        "plot.centered_at",
        &[
            ("lat", format!("{:.1}", center.lat)),
            ("lon", format!("{:.1}", center.lon)),
        ],
    )
}

fn draw_panel(
    canvas: &mut Canvas,
    panel: &Panel,
    center: GeoPoint,
    title: &str,
    labeled_grid: bool,
    layers: &Layers,
    layout: &FigureLayout,
) {
    let pt = layout.pt;

    draw_raster(canvas, panel, layers);

    canvas.set_clip(Some(panel.rect));
    if let Some(features) = layers.features {
        let style = LineStyle { width: 0.5 * pt, color: FEATURE_LINE, dash: None };
        draw_lines(canvas, panel, &features.coastlines, &style);
        draw_lines(canvas, panel, &features.borders, &style);
    }

    let grid = LineStyle {
        width: 0.5 * pt,
        color: with_alpha(GRID, 0.5),
        dash: Some([3.7 * pt, 1.6 * pt]),
    };
    draw_lines(canvas, panel, &graticule(), &grid);

    if let Some((x, y)) = panel.geo_to_pixel(center) {
        canvas.fill_circle(x, y, 5.0 * pt, MARKER);
    }
    canvas.set_clip(None);

    draw_legend(canvas, panel.rect, layers, layout);

    if let Some(font) = layers.font {
        let subtitle = centered_subtitle(center);
        draw_title(canvas, panel.rect, font, [title, &subtitle], layout);
        if labeled_grid {
            draw_grid_labels(canvas, panel, font, layout);
        }
    }
}

/// Validate the request and lay out the figure without allocating it.
fn checked_layout(center: GeoPoint, dpi: f64) -> Result<FigureLayout, RenderError> {
    if !center.is_finite() || center.lat.abs() > 90.0 {
        return Err(RenderError::InvalidCenter { lat: center.lat, lon: center.lon });
    }
    if !(dpi.is_finite() && dpi > 0.0) {
        return Err(RenderError::InvalidDpi(dpi));
    }
    let layout = FigureLayout::new(dpi);
    let pixels = layout.width as f64 * layout.height as f64;
    if pixels > MAX_FIGURE_PIXELS || layout.width < 2 || layout.height < 2 {
        return Err(RenderError::FigureSize { width: layout.width, height: layout.height });
    }
    Ok(layout)
}

/// Render both panels for `center` into one figure-sized image.
pub fn render_figure(center: GeoPoint, layers: &Layers, dpi: f64) -> Result<RgbaImage, RenderError> {
    let layout = checked_layout(center, dpi)?;

    let started = Instant::now();
    let mut canvas = Canvas::new(layout.width, layout.height, BACKGROUND);

    let ortho = Panel::new(MapProjection::orthographic(center), layout.orthographic);
    draw_panel(
        &mut canvas,
        &ortho,
        center,
        &crate::i18n::tr("plot.orthographic_title"),
        false,
        layers,
        &layout,
    );

    let rotated = Panel::new(MapProjection::rotated_pole(center), layout.rotated);
    draw_panel(
        &mut canvas,
        &rotated,
        center,
        &crate::i18n::tr("plot.rotated_title"),
        true,
        layers,
        &layout,
    );

    log::debug!(
        "figure {}x{} @ {} dpi rendered in {} ms",
        layout.width,
        layout.height,
        dpi,
        started.elapsed().as_millis()
    );
    Ok(canvas.into_image())
}

/// Session-owned figure renderer: texture, lazily loaded layers, font, DPI.
pub struct MapPlotter {
    texture: EarthTexture,
    features: FeatureCache,
    font: Option<FontArc>,
    dpi: f64,
    stock_image: bool,
}

impl MapPlotter {
    pub fn new(
        texture: EarthTexture,
        features: FeatureCache,
        font: Option<FontArc>,
        dpi: f64,
        stock_image: bool,
    ) -> Self {
        Self {
            texture,
            features,
            font,
            dpi,
            stock_image,
        }
    }
}

impl ProjectionRenderer for MapPlotter {
    fn render(&mut self, center: GeoPoint) -> Result<RgbaImage, RenderError> {
        let features = self.features.get()?;
        let layers = Layers {
            stock_image: self.stock_image.then_some(&self.texture),
            features,
            font: self.font.as_ref(),
        };
        render_figure(center, &layers, self.dpi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgba<u8> = Rgba([10, 200, 30, 255]);

    fn uniform_texture() -> EarthTexture {
        EarthTexture::from_image(RgbaImage::from_pixel(64, 32, GREEN)).unwrap()
    }

    fn count_in(img: &RgbaImage, rect: PixelRect, color: Rgba<u8>) -> usize {
        let mut n = 0;
        for y in rect.y as u32..rect.bottom() as u32 {
            for x in rect.x as u32..rect.right() as u32 {
                if *img.get_pixel(x, y) == color {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn layout_scales_with_dpi() {
        let l = FigureLayout::new(300.0);
        assert_eq!((l.width, l.height), (6000, 3000));
        assert!((l.rotated.w / l.rotated.h - 2.0).abs() < 1e-9);
        assert!((l.orthographic.w - l.orthographic.h).abs() < 1e-9);
        assert!(l.orthographic.right() <= 3000.0);
        assert!(l.rotated.x >= 3000.0);
    }

    #[test]
    fn figure_has_black_background_and_both_panels() {
        let texture = uniform_texture();
        let layers = Layers { stock_image: Some(&texture), ..Default::default() };
        let img = render_figure(GeoPoint::new(30.0, 40.0), &layers, 20.0).unwrap();
        let layout = FigureLayout::new(20.0);
        assert_eq!(img.dimensions(), (400, 200));
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);

        let o = layout.orthographic;
        let disc_area = std::f64::consts::PI * (o.w / 2.0).powi(2);
        assert!(count_in(&img, o, GREEN) as f64 > 0.5 * disc_area);
        // outside the disc, top-left corner of the map area
        assert_eq!(*img.get_pixel(o.x as u32 + 1, o.y as u32 + 1), BACKGROUND);

        let r = layout.rotated;
        assert!(count_in(&img, r, GREEN) as f64 > 0.5 * r.w * r.h);
    }

    #[test]
    fn marker_sits_at_orthographic_center() {
        let texture = uniform_texture();
        let layers = Layers { stock_image: Some(&texture), ..Default::default() };
        let img = render_figure(GeoPoint::new(-12.0, 77.0), &layers, 20.0).unwrap();
        let (cx, cy) = FigureLayout::new(20.0).orthographic.center();
        assert_eq!(*img.get_pixel(cx.floor() as u32, cy.floor() as u32), MARKER);
    }

    #[test]
    fn fill_shows_without_stock_image() {
        let everywhere = vec![vec![
            (-180.0, -90.0),
            (180.0, -90.0),
            (180.0, 90.0),
            (-180.0, 90.0),
        ]];
        let features = MapFeatures::new(&[everywhere], Vec::new(), Vec::new());
        let layers = Layers { features: Some(&features), ..Default::default() };
        let img = render_figure(GeoPoint::new(0.0, 0.0), &layers, 20.0).unwrap();
        let r = FigureLayout::new(20.0).rotated;
        assert!(count_in(&img, r, LAND) as f64 > 0.5 * r.w * r.h);

        let ocean_only = render_figure(GeoPoint::new(0.0, 0.0), &Layers::default(), 20.0).unwrap();
        assert!(count_in(&ocean_only, r, OCEAN) as f64 > 0.5 * r.w * r.h);
    }

    /// Pixels that differ between two renders and got darker in `a`.
    fn darkened_in(a: &RgbaImage, b: &RgbaImage, r: PixelRect) -> usize {
        let luma = |p: &Rgba<u8>| p[0] as u32 + p[1] as u32 + p[2] as u32;
        let mut n = 0;
        for y in r.y as u32..r.bottom() as u32 {
            for x in r.x as u32..r.right() as u32 {
                if luma(a.get_pixel(x, y)) < luma(b.get_pixel(x, y)) {
                    n += 1;
                }
            }
        }
        n
    }

    /// Pixels in `r` with every channel at least `min`.
    fn bright_in(img: &RgbaImage, r: PixelRect, min: u8) -> usize {
        let mut n = 0;
        for y in r.y.max(0.0) as u32..(r.bottom() as u32).min(img.height()) {
            for x in r.x.max(0.0) as u32..(r.right() as u32).min(img.width()) {
                let p = img.get_pixel(x, y);
                if p[0] >= min && p[1] >= min && p[2] >= min {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn coastlines_are_drawn() {
        let coast: Vec<Vec<(f64, f64)>> = vec![(0..=40).map(|lon| (lon as f64, 5.0)).collect()];
        let with_coast = MapFeatures::new(&[], coast, Vec::new());
        let without = MapFeatures::new(&[], Vec::new(), Vec::new());
        let center = GeoPoint::new(0.0, 20.0);
        let dpi = 150.0;
        let o = FigureLayout::new(dpi).orthographic;

        let drawn = Layers { features: Some(&with_coast), ..Default::default() };
        let bare = Layers { features: Some(&without), ..Default::default() };
        let a = render_figure(center, &drawn, dpi).unwrap();
        let b = render_figure(center, &bare, dpi).unwrap();
        // 40° of arc is a few hundred pixels long at this size
        let n = darkened_in(&a, &b, o);
        assert!(n > 100, "{n} pixels darkened");
        assert_eq!(darkened_in(&b, &a, o), 0);
    }

    #[test]
    fn rejects_bad_parameters() {
        let layers = Layers::default();
        assert!(matches!(
            render_figure(GeoPoint::new(f64::NAN, 0.0), &layers, 20.0),
            Err(RenderError::InvalidCenter { .. })
        ));
        assert!(matches!(
            render_figure(GeoPoint::new(0.0, 0.0), &layers, 0.0),
            Err(RenderError::InvalidDpi(_))
        ));
        assert!(matches!(
            render_figure(GeoPoint::new(0.0, 0.0), &layers, 5000.0),
            Err(RenderError::FigureSize { .. })
        ));
    }

    #[test]
    fn highest_dpi_fits_the_pixel_limit() {
        let center = GeoPoint::new(10.0, 20.0);
        let layout = checked_layout(center, MAX_DPI).unwrap();
        assert_eq!((layout.width, layout.height), (15000, 7500));
        assert!(matches!(
            checked_layout(center, MAX_DPI + 1.0),
            Err(RenderError::FigureSize { .. })
        ));
        assert!(checked_layout(center, crate::config::DEFAULT_DPI).is_ok());
    }

    #[test]
    fn left_edge_labels_follow_the_rotated_frame() {
        // the left edge runs from the rotated north pole at (0°N, 180°)
        // through the geographic south pole to the center at (0°N, 0°)
        let panel = Panel::new(
            MapProjection::rotated_pole(GeoPoint::new(0.0, 0.0)),
            PixelRect::new(0.0, 0.0, 360.0, 180.0),
        );
        let e = panel.extent;
        let left = edge_crossings(&panel, |t| (e.x_min, e.y_max - t * e.height()));

        assert!(left.iter().all(|((x, _), _)| *x == 0.0));
        assert!(left.iter().all(|(_, label)| !label.ends_with('N')));
        let ys = |want: &str| -> Vec<f64> {
            left.iter().filter(|(_, l)| l == want).map(|((_, y), _)| *y).collect()
        };
        let near = |ys: &[f64], y: f64| ys.iter().any(|v| (v - y).abs() < 1.0);

        let south_30 = ys("30°S");
        assert!(near(&south_30, 30.0) && near(&south_30, 150.0), "{south_30:?}");
        let south_60 = ys("60°S");
        assert!(near(&south_60, 60.0) && near(&south_60, 120.0), "{south_60:?}");
    }

    #[test]
    fn crowded_labels_are_dropped() {
        let candidates = vec![
            ((0.0, 0.0), "a".to_string()),
            ((3.0, 4.0), "b".to_string()),
            ((0.0, 20.0), "c".to_string()),
        ];
        let mut placed = vec![(100.0, 100.0)];
        let kept = spread_labels(candidates, 10.0, &mut placed);
        let labels: Vec<&str> = kept.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, ["a", "c"]);
        assert_eq!(placed.len(), 3);

        // a label already placed on another edge blocks this one
        assert!(spread_labels(vec![((98.0, 95.0), "d".into())], 10.0, &mut placed).is_empty());
    }

    #[test]
    fn subtitle_names_the_center() {
        assert_eq!(
            centered_subtitle(GeoPoint::new(12.345, -67.891)),
            "Centered at 12.3°N, -67.9°E"
        );
    }

    #[test]
    fn legend_box_sits_in_the_lower_left_corner() {
        let dpi = 60.0;
        let img = render_figure(GeoPoint::new(0.0, 0.0), &Layers::default(), dpi).unwrap();
        for r in [FigureLayout::new(dpi).orthographic, FigureLayout::new(dpi).rotated] {
            let corner = PixelRect::new(r.x, r.bottom() - 0.5 * dpi, 0.5 * dpi, 0.5 * dpi);
            // white box at 80% over the map, and the red marker swatch in it
            assert!(bright_in(&img, corner, 190) > 0);
            assert!(count_in(&img, corner, MARKER) > 0);
        }
        assert_eq!(crate::i18n::tr("plot.selected_point"), "Selected Point");
    }

    #[test]
    fn titles_and_edge_labels_are_drawn_with_a_font() {
        let Some(font) = crate::fonts::find_figure_font() else {
            return;
        };
        let dpi = 60.0;
        let layout = FigureLayout::new(dpi);
        let center = GeoPoint::new(20.0, 30.0);
        let labeled = Layers { font: Some(&font), ..Default::default() };
        let with_text = render_figure(center, &labeled, dpi).unwrap();
        let without = render_figure(center, &Layers::default(), dpi).unwrap();

        for r in [layout.orthographic, layout.rotated] {
            let above = PixelRect::new(r.x, 0.0, r.w, r.y - 1.0);
            assert!(bright_in(&with_text, above, 120) > 0);
            assert_eq!(bright_in(&without, above, 120), 0);
        }

        let r = layout.rotated;
        let left_margin = PixelRect::new(r.x - 0.7 * dpi, r.y, 0.7 * dpi - 1.0, r.h);
        assert!(bright_in(&with_text, left_margin, 120) > 0);
        assert_eq!(bright_in(&without, left_margin, 120), 0);
    }

    #[test]
    fn label_formats() {
        assert_eq!(format_longitude(0.0), "0°");
        assert_eq!(format_longitude(180.0), "180°");
        assert_eq!(format_longitude(-180.0), "180°");
        assert_eq!(format_longitude(60.0), "60°E");
        assert_eq!(format_longitude(-120.0), "120°W");
        assert_eq!(format_latitude(30.0), "30°N");
        assert_eq!(format_latitude(-60.0), "60°S");
        assert_eq!(format_latitude(0.0), "0°");
    }

    #[test]
    fn graticule_covers_the_globe() {
        let lines = graticule();
        // 12 meridians + 5 parallels
        assert_eq!(lines.len(), 17);
    }

    #[test]
    fn lines_split_at_the_wrap() {
        let panel = Panel::new(
            MapProjection::rotated_pole(GeoPoint::new(0.0, 0.0)),
            PixelRect::new(0.0, 0.0, 360.0, 180.0),
        );
        // the rotated north pole is at (0°N, 180°); circle it at 10° distance
        let ring: Vec<(f64, f64)> = (0..=36)
            .map(|i| {
                let a = (i as f64 * 10.0).to_radians();
                (180.0 + 10.0 * a.cos(), 10.0 * a.sin())
            })
            .collect();
        let runs = panel.project_line(&ring);
        assert!(runs.len() >= 2, "{} runs", runs.len());
    }
}
