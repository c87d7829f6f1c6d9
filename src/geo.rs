// geo.rs - sphere <-> texture <-> latitude/longitude conversions

use glam::DVec3;
use std::f64::consts::PI;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Fold a longitude into (-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    let mut l = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if l <= -180.0 {
        l += 360.0;
    }
    l
}

/// Texture coordinate for a point on the globe.
///
/// `u` follows the azimuth `atan2(y, x)` and `v` the polar angle, so the
/// texture's left edge is 180°W and its bottom edge (v = 0) the south pole.
/// The origin has no direction; callers only pass mesh vertices.
pub fn texture_coordinate(x: f64, y: f64, z: f64) -> [f64; 2] {
    let r = (x * x + y * y + z * z).sqrt();
    let theta = y.atan2(x);
    let phi = (z / r).clamp(-1.0, 1.0).acos();

    let u = (theta + PI) / (2.0 * PI);
    let v = 1.0 - (phi / PI);
    [u, v]
}

/// Latitude/longitude (degrees) of the direction `(x, y, z)`.
///
/// The radius is divided out, so picks slightly off the surface still give the
/// direction's coordinate. At the poles longitude is 0 (`atan2(0, 0)`).
pub fn cartesian_to_geographic(x: f64, y: f64, z: f64) -> GeoPoint {
    let r = (x * x + y * y + z * z).sqrt();
    let lat = (z / r).clamp(-1.0, 1.0).asin().to_degrees();
    let mut lon = y.atan2(x).to_degrees();
    if lon <= -180.0 {
        lon += 360.0;
    }
    GeoPoint { lat, lon }
}

/// Unit vector for a geographic coordinate, z towards the north pole.
pub fn geographic_to_cartesian(p: GeoPoint) -> DVec3 {
    let (sin_lat, cos_lat) = p.lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = p.lon.to_radians().sin_cos();
    DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    #[test]
    fn known_points() {
        let p = cartesian_to_geographic(1.0, 0.0, 0.0);
        assert!(p.lat.abs() < TOL && p.lon.abs() < TOL);

        let p = cartesian_to_geographic(0.0, 1.0, 0.0);
        assert!(p.lat.abs() < TOL);
        assert!((p.lon - 90.0).abs() < TOL);
    }

    #[test]
    fn north_pole_has_zero_longitude() {
        let p = cartesian_to_geographic(0.0, 0.0, 1.0);
        assert!((p.lat - 90.0).abs() < TOL);
        assert_eq!(p.lon, 0.0);

        let s = cartesian_to_geographic(0.0, 0.0, -2.5);
        assert!((s.lat + 90.0).abs() < TOL);
        assert_eq!(s.lon, 0.0);
    }

    #[test]
    fn round_trip_over_the_sphere() {
        let mut lat = -89.5;
        while lat < 90.0 {
            let mut lon = -179.5;
            while lon <= 180.0 {
                let v = geographic_to_cartesian(GeoPoint::new(lat, lon));
                let back = cartesian_to_geographic(v.x, v.y, v.z);
                assert!((back.lat - lat).abs() < TOL, "lat {lat} -> {}", back.lat);
                assert!((back.lon - lon).abs() < TOL, "lon {lon} -> {}", back.lon);

                let [u, w] = texture_coordinate(v.x, v.y, v.z);
                assert!((u - (lon + 180.0) / 360.0).abs() < 1e-9);
                assert!((w - (lat + 90.0) / 180.0).abs() < 1e-9);
                lon += 7.25;
            }
            lat += 3.5;
        }
    }

    #[test]
    fn off_surface_points_keep_their_direction() {
        let v = geographic_to_cartesian(GeoPoint::new(-33.9, 151.2)) * 1.013;
        let p = cartesian_to_geographic(v.x, v.y, v.z);
        assert!((p.lat + 33.9).abs() < TOL);
        assert!((p.lon - 151.2).abs() < TOL);
    }

    #[test]
    fn ranges_hold_on_edge_directions() {
        let dirs = [
            (-1.0, -0.0, 0.0),
            (-1.0, 0.0, 0.0),
            (0.0, -1.0, 0.0),
            (0.3, -0.2, -0.9),
            (-0.5, 1e-300, 0.1),
            (0.0, 0.0, -1.0),
        ];
        for (x, y, z) in dirs {
            let p = cartesian_to_geographic(x, y, z);
            assert!((-90.0..=90.0).contains(&p.lat));
            assert!(p.lon > -180.0 && p.lon <= 180.0, "lon {}", p.lon);

            let [u, v] = texture_coordinate(x, y, z);
            assert!((0.0..=1.0).contains(&u));
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn longitude_normalization() {
        assert_eq!(normalize_longitude(220.0), -140.0);
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
        assert!((normalize_longitude(-190.5) - 169.5).abs() < 1e-12);
    }
}
