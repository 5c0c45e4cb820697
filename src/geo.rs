//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    /// Whether both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &LatLng) -> f64 {
        haversine_km(*self, *other)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        LatLng { lat, lng }
    }
}

/// Great-circle distance between two points in kilometres, by the haversine formula.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        let p = LatLng::new(37.50, 127.03);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn known_distances() {
        // Seoul City Hall to Busan City Hall, ~325 km.
        let seoul = LatLng::new(37.5663, 126.9779);
        let busan = LatLng::new(35.1798, 129.0750);
        let d = seoul.distance_km(&busan);
        assert!((d - 325.0).abs() < 5.0, "{}", d);

        // One degree of latitude is ~111.19 km on this sphere.
        let d = haversine_km(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01, "{}", d);
    }

    #[test]
    fn symmetric() {
        let a = LatLng::new(37.50, 127.03);
        let b = LatLng::new(37.70, 127.30);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn finiteness() {
        assert!(LatLng::new(37.5, 127.0).is_finite());
        assert!(!LatLng::new(f64::NAN, 127.0).is_finite());
        assert!(!LatLng::new(37.5, f64::INFINITY).is_finite());
    }
}
