/// Equatorial radius used for route lengths, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

/// Great-circle distance between two lon/lat points in degrees, in metres.
pub fn great_circle_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

pub fn round_km(distance_m: f64) -> i64 {
    (distance_m / 1000.0).round() as i64
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn span(&self) -> (f64, f64) {
        (
            (self.max_lon - self.min_lon).max(1.0),
            (self.max_lat - self.min_lat).max(1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{great_circle_m, round_km, Bounds};

    #[test]
    fn same_point_is_zero() {
        let dist = great_circle_m(40.64, -73.78, 40.64, -73.78);
        assert!(dist.abs() < 0.0001);
    }

    #[test]
    fn jfk_to_lax_is_about_3980_km() {
        let dist = great_circle_m(40.6398, -73.7789, 33.9425, -118.4081);
        let km = round_km(dist);
        assert!((3960..=4000).contains(&km), "got {km} km");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = great_circle_m(47.45, -122.31, 25.79, -80.29);
        let b = great_circle_m(25.79, -80.29, 47.45, -122.31);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn bounds_span_never_collapses() {
        let bounds = Bounds {
            min_lat: 10.0,
            max_lat: 10.0,
            min_lon: -5.0,
            max_lon: -5.0,
        };
        assert_eq!(bounds.center(), (-5.0, 10.0));
        assert_eq!(bounds.span(), (1.0, 1.0));
    }
}
