// camera.rs - orbit camera around the unit globe, plus click-vs-drag tracking
//
// World frame: z up, the globe is the unit sphere at the origin.
// yaw is the eye's azimuth in the xy plane, pitch its elevation.

use glam::{Mat4, Vec2, Vec3};

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_DISTANCE: f32 = 3.0;
pub const DEFAULT_FOV: f32 = 45.0;

pub const MIN_DISTANCE: f32 = 1.2;
pub const MAX_DISTANCE: f32 = 10.0;
pub const MAX_PITCH: f32 = 89.0;

/// Cursor travel (physical px) below which a press/release counts as a click.
pub const CLICK_SLOP: f32 = 4.0;

/// Drag speed multiplier offered in the View menu.
pub const SENSITIVITY_RANGE: std::ops::RangeInclusive<f32> = 0.1..=5.0;

const DEG_PER_PX: f32 = 0.25;
const ZOOM_STEP: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov: f32,
    pub sensitivity_scale: f32,
}

impl Default for GlobeCamera {
    fn default() -> Self {
        Self {
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            distance: DEFAULT_DISTANCE,
            fov: DEFAULT_FOV,
            sensitivity_scale: 1.0,
        }
    }
}

impl GlobeCamera {
    pub fn reset(&mut self) {
        let sensitivity_scale = self.sensitivity_scale;
        *self = Self {
            sensitivity_scale,
            ..Self::default()
        };
    }

    pub fn eye(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.cos() * yaw.sin(),
            pitch.sin(),
        ) * self.distance
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Z);
        let proj = Mat4::perspective_rh(self.fov.to_radians(), aspect.max(1e-3), 0.01, 100.0);
        proj * view
    }

    /// Orbit by a cursor delta. Slower when close so the surface tracks the cursor.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        let closeness = ((self.distance - 1.0) / (DEFAULT_DISTANCE - 1.0)).clamp(0.1, 2.0);
        let step = DEG_PER_PX * self.sensitivity_scale * closeness;
        self.yaw = (self.yaw - dx * step).rem_euclid(360.0);
        self.pitch = (self.pitch + dy * step).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Positive `scroll` moves toward the globe.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(scroll)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// World-space ray through a cursor position given in physical pixels.
    pub fn cursor_ray(&self, cursor: Vec2, width: f32, height: f32) -> Option<(Vec3, Vec3)> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(2.0 * cursor.x / width - 1.0, 1.0 - 2.0 * cursor.y / height);
        let inv = self.view_proj(width / height).inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        let dir = (far - near).try_normalize()?;
        Some((near, dir))
    }
}

/// Tracks one left-button gesture and decides whether it was a click.
#[derive(Debug, Default)]
pub struct PointerGesture {
    pressed_at: Option<Vec2>,
    last: Option<Vec2>,
    dragged: bool,
}

impl PointerGesture {
    pub fn press(&mut self, at: Vec2) {
        self.pressed_at = Some(at);
        self.last = Some(at);
        self.dragged = false;
    }

    /// Cursor delta since the previous move while pressed.
    pub fn motion(&mut self, at: Vec2) -> Option<Vec2> {
        let start = self.pressed_at?;
        let delta = self.last.map(|l| at - l);
        self.last = Some(at);
        if at.distance(start) >= CLICK_SLOP {
            self.dragged = true;
        }
        delta
    }

    /// Ends the gesture; returns the click position when it was not a drag.
    pub fn release(&mut self) -> Option<Vec2> {
        let start = self.pressed_at.take()?;
        let last = self.last.take().unwrap_or(start);
        (!self.dragged).then_some(last)
    }
}
