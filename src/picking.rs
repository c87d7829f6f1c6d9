// picking.rs - cursor -> point on the unit globe

use crate::camera::GlobeCamera;
use glam::{Vec2, Vec3};

/// Nearest intersection of a ray with the unit sphere at the origin.
/// `dir` must be normalized. Hits behind the origin are ignored.
pub fn intersect_unit_sphere(origin: Vec3, dir: Vec3) -> Option<Vec3> {
    let b = origin.dot(dir);
    let c = origin.length_squared() - 1.0;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let t = [-b - root, -b + root].into_iter().find(|t| *t >= 0.0)?;
    Some(origin + dir * t)
}

/// Globe point under `cursor` (physical px), or `None` on a miss.
pub fn pick_point(camera: &GlobeCamera, cursor: Vec2, width: f32, height: f32) -> Option<Vec3> {
    let (origin, dir) = camera.cursor_ray(cursor, width, height)?;
    intersect_unit_sphere(origin, dir)
}
