// session.rs - click handling: pick -> coordinate -> projection figure

use crate::error::{ClickError, RenderError};
use crate::geo::{cartesian_to_geographic, GeoPoint};
use glam::Vec3;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// One click on the globe; `point` is `None` when the ray missed it.
#[derive(Debug, Clone, Copy)]
pub struct PickEvent {
    pub point: Option<Vec3>,
}

/// Draws the projection figure for a center coordinate.
pub trait ProjectionRenderer {
    fn render(&mut self, center: GeoPoint) -> Result<RgbaImage, RenderError>;
}

/// A rendered figure and the coordinate it is centered on.
#[derive(Debug, Clone)]
pub struct ProjectionView {
    pub center: GeoPoint,
    pub image: RgbaImage,
}

pub enum ClickOutcome {
    Rendered(ProjectionView),
    /// Already logged; the message is for the status bar.
    Failed(String),
}

/// Convert the picked point and render its projections.
pub fn handle_click<R: ProjectionRenderer + ?Sized>(
    renderer: &mut R,
    event: &PickEvent,
) -> Result<ProjectionView, ClickError> {
    let p = event.point.ok_or(ClickError::NoPick)?;
    let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);

    let center = cartesian_to_geographic(x, y, z);
    if !center.is_finite() {
        return Err(ClickError::InvalidPoint { x, y, z });
    }

    log::info!(
        "{}",
        crate::i18n::tr_with(
            "click.at",
            &[
                ("lat", format!("{:.2}", center.lat)),
                ("lon", format!("{:.2}", center.lon)),
            ]
        )
    );

    let image = renderer.render(center)?;
    Ok(ProjectionView { center, image })
}

pub fn projection_file_name(center: GeoPoint) -> String {
    format!("projection_{:.2}_{:.2}.png", center.lat, center.lon)
}

pub fn save_projection(dir: &Path, view: &ProjectionView) -> Result<PathBuf, image::ImageError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(projection_file_name(view.center));
    view.image.save(&path)?;
    Ok(path)
}

/// Runs each click to completion and contains its failure.
pub struct ClickDispatcher<R> {
    renderer: R,
    save_dir: Option<PathBuf>,
    rendered: usize,
    failed: usize,
}

impl<R: ProjectionRenderer> ClickDispatcher<R> {
    pub fn new(renderer: R, save_dir: Option<PathBuf>) -> Self {
        Self {
            renderer,
            save_dir,
            rendered: 0,
            failed: 0,
        }
    }

    pub fn dispatch(&mut self, event: PickEvent) -> ClickOutcome {
        let outcome = match handle_click(&mut self.renderer, &event) {
            Ok(view) => {
                self.rendered += 1;
                if let Some(dir) = &self.save_dir {
                    match save_projection(dir, &view) {
                        Ok(path) => log::info!(
                            "{}",
                            crate::i18n::tr_with(
                                "log.projection_saved",
                                &[("path", path.display().to_string())]
                            )
                        ),
                        Err(e) => log::warn!(
                            "{}",
                            crate::i18n::tr_with("error.save_projection", &[("err", e.to_string())])
                        ),
                    }
                }
                ClickOutcome::Rendered(view)
            }
            Err(e) => {
                self.failed += 1;
                let msg = crate::i18n::tr_with("click.error", &[("err", e.to_string())]);
                log::error!("{}", msg);
                ClickOutcome::Failed(msg)
            }
        };
        log::debug!("clicks: {} rendered, {} failed", self.rendered, self.failed);
        outcome
    }
}
