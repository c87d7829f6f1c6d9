// projection.rs - map projections used by the projection panels

use crate::geo::{cartesian_to_geographic, geographic_to_cartesian, normalize_longitude, GeoPoint};
use glam::{DMat3, DVec3};

/// Rotated-pole frame parameters, in unrotated degrees.
///
/// The rotated north pole sits at (`pole_latitude`, `pole_longitude`); the
/// geographic north pole lands on rotated meridian `central_rotated_longitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedPole {
    pub pole_longitude: f64,
    pub pole_latitude: f64,
    pub central_rotated_longitude: f64,
}

impl RotatedPole {
    /// Frame whose pole is the antipode of `center`.
    ///
    /// `center` itself ends up on the rotated south pole.
    pub fn centered_on(center: GeoPoint) -> Self {
        Self {
            pole_longitude: center.lon + 180.0,
            pole_latitude: -center.lat,
            central_rotated_longitude: 0.0,
        }
    }

    // geographic -> rotated, before the 180° meridian flip
    fn rotation(&self) -> DMat3 {
        let tilt = DMat3::from_rotation_y((self.pole_latitude - 90.0).to_radians());
        let spin = DMat3::from_rotation_z(-self.pole_longitude.to_radians());
        tilt * spin
    }

    pub fn to_rotated(&self, p: GeoPoint) -> GeoPoint {
        let v = self.rotation() * geographic_to_cartesian(p);
        // flip so the rotated origin faces away from the pole's meridian
        let r = cartesian_to_geographic(-v.x, -v.y, v.z);
        GeoPoint::new(
            r.lat,
            normalize_longitude(r.lon - self.central_rotated_longitude),
        )
    }

    pub fn from_rotated(&self, r: GeoPoint) -> GeoPoint {
        let shifted = GeoPoint::new(r.lat, r.lon + self.central_rotated_longitude);
        let v = geographic_to_cartesian(shifted);
        let g = self.rotation().transpose() * DVec3::new(-v.x, -v.y, v.z);
        cartesian_to_geographic(g.x, g.y, g.z)
    }
}

/// Projected-space bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn aspect(&self) -> f64 {
        self.width() / self.height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapProjection {
    /// Hemisphere seen from infinitely far above `center`, unit radius.
    Orthographic { center: GeoPoint },
    /// Plate carrée in a rotated frame, degrees.
    RotatedPole(RotatedPole),
}

impl MapProjection {
    pub fn orthographic(center: GeoPoint) -> Self {
        MapProjection::Orthographic { center }
    }

    pub fn rotated_pole(center: GeoPoint) -> Self {
        MapProjection::RotatedPole(RotatedPole::centered_on(center))
    }

    pub fn extent(&self) -> Extent {
        match self {
            MapProjection::Orthographic { .. } => Extent {
                x_min: -1.0,
                x_max: 1.0,
                y_min: -1.0,
                y_max: 1.0,
            },
            MapProjection::RotatedPole(_) => Extent {
                x_min: -180.0,
                x_max: 180.0,
                y_min: -90.0,
                y_max: 90.0,
            },
        }
    }

    /// Horizontal period of the projected plane, if it wraps.
    pub fn wrap_width(&self) -> Option<f64> {
        match self {
            MapProjection::Orthographic { .. } => None,
            MapProjection::RotatedPole(_) => Some(360.0),
        }
    }

    /// Projected position, or `None` on the far side of an orthographic globe.
    pub fn project(&self, p: GeoPoint) -> Option<(f64, f64)> {
        match self {
            MapProjection::Orthographic { center } => {
                let (sin_p0, cos_p0) = center.lat.to_radians().sin_cos();
                let (sin_p, cos_p) = p.lat.to_radians().sin_cos();
                let (sin_dl, cos_dl) = (p.lon - center.lon).to_radians().sin_cos();

                let cos_c = sin_p0 * sin_p + cos_p0 * cos_p * cos_dl;
                if cos_c < 0.0 {
                    return None;
                }
                let x = cos_p * sin_dl;
                let y = cos_p0 * sin_p - sin_p0 * cos_p * cos_dl;
                Some((x, y))
            }
            MapProjection::RotatedPole(pole) => {
                let r = pole.to_rotated(p);
                Some((r.lon, r.lat))
            }
        }
    }

    /// Geographic position of a projected point, `None` outside the domain.
    pub fn unproject(&self, x: f64, y: f64) -> Option<GeoPoint> {
        match self {
            MapProjection::Orthographic { center } => {
                let rho = (x * x + y * y).sqrt();
                if rho > 1.0 {
                    return None;
                }
                if rho < 1e-12 {
                    return Some(*center);
                }
                let c = rho.asin();
                let (sin_c, cos_c) = c.sin_cos();
                let (sin_p0, cos_p0) = center.lat.to_radians().sin_cos();

                let lat = (cos_c * sin_p0 + y * sin_c * cos_p0 / rho)
                    .clamp(-1.0, 1.0)
                    .asin();
                let dlon = (x * sin_c).atan2(rho * cos_p0 * cos_c - y * sin_p0 * sin_c);
                Some(GeoPoint::new(
                    lat.to_degrees(),
                    normalize_longitude(center.lon + dlon.to_degrees()),
                ))
            }
            MapProjection::RotatedPole(pole) => {
                if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
                    return None;
                }
                Some(pole.from_rotated(GeoPoint::new(y, x)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: GeoPoint, b: GeoPoint, tol: f64) -> bool {
        let dlon = normalize_longitude(a.lon - b.lon).abs();
        (a.lat - b.lat).abs() < tol && (dlon < tol || (a.lat.abs() - 90.0).abs() < tol)
    }

    #[test]
    fn pole_parameters_for_click() {
        let pole = RotatedPole::centered_on(GeoPoint::new(30.0, 40.0));
        assert_eq!(pole.pole_longitude, 220.0);
        assert_eq!(pole.pole_latitude, -30.0);
        assert_eq!(pole.central_rotated_longitude, 0.0);
    }

    #[test]
    fn rotated_pole_matches_its_definition() {
        let pole = RotatedPole {
            pole_longitude: -162.0,
            pole_latitude: 39.25,
            central_rotated_longitude: 0.0,
        };
        // the pole itself goes to the rotated north pole
        let n = pole.to_rotated(GeoPoint::new(39.25, -162.0));
        assert!((n.lat - 90.0).abs() < 1e-9);

        // rotated origin is opposite the pole's meridian, 90° - pole_lat up
        let origin = pole.from_rotated(GeoPoint::new(0.0, 0.0));
        assert!(close(origin, GeoPoint::new(50.75, 18.0), 1e-9), "{origin:?}");

        // geographic north pole sits on rotated meridian 0
        let np = pole.to_rotated(GeoPoint::new(90.0, 0.0));
        assert!((np.lat - 39.25).abs() < 1e-9);
        assert!(np.lon.abs() < 1e-9);
    }

    #[test]
    fn clicked_point_lands_on_rotated_south_pole() {
        let center = GeoPoint::new(30.0, 40.0);
        let r = RotatedPole::centered_on(center).to_rotated(center);
        assert!((r.lat + 90.0).abs() < 1e-6);
    }

    #[test]
    fn rotated_round_trip() {
        let pole = RotatedPole::centered_on(GeoPoint::new(-12.5, 131.0));
        for &(lat, lon) in &[(0.0, 0.0), (45.0, -120.0), (-60.0, 170.0), (10.0, 131.0)] {
            let p = GeoPoint::new(lat, lon);
            let back = pole.from_rotated(pole.to_rotated(p));
            assert!(close(back, p, 1e-9), "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn orthographic_center_and_horizon() {
        let center = GeoPoint::new(48.8, 2.3);
        let proj = MapProjection::orthographic(center);
        let (x, y) = proj.project(center).unwrap();
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);

        let antipode = GeoPoint::new(-48.8, -177.7);
        assert!(proj.project(antipode).is_none());

        assert!(proj.unproject(0.9, 0.9).is_none());
        assert_eq!(proj.unproject(0.0, 0.0), Some(center));
    }

    #[test]
    fn orthographic_round_trip() {
        let proj = MapProjection::orthographic(GeoPoint::new(-20.0, 100.0));
        for &(lat, lon) in &[(-20.0, 130.0), (10.0, 80.0), (-60.0, 100.0), (5.0, 150.0)] {
            let p = GeoPoint::new(lat, lon);
            let (x, y) = proj.project(p).unwrap();
            let back = proj.unproject(x, y).unwrap();
            assert!(close(back, p, 1e-9), "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn rotated_extent_rejects_outside_points() {
        let proj = MapProjection::rotated_pole(GeoPoint::new(0.0, 0.0));
        assert!(proj.unproject(181.0, 0.0).is_none());
        assert!(proj.unproject(0.0, -91.0).is_none());
        assert!(proj.unproject(-180.0, 90.0).is_some());
        assert_eq!(proj.extent().aspect(), 2.0);
        assert_eq!(proj.wrap_width(), Some(360.0));
    }
}
