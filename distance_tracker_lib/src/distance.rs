use crate::geo_point::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.;

/// Great-circle distance in km between two points, using the haversine formula.
/// Accepts any finite coordinates, including antipodes and out of range values.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);

    // Rounding can push h just past 1 near antipodes, and asin would return NaN
    let h = h.clamp(0., 1.);

    EARTH_RADIUS_KM * 2. * f64::asin(f64::sqrt(h))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn same_point_is_zero() {
        for point in [
            GeoPoint::new(0., 0.),
            GeoPoint::new(56.175188, 10.196123),
            GeoPoint::new(-33.86, 151.21),
            GeoPoint::new(90., 0.),
        ] {
            assert_eq!(distance_km(point, point), 0.);
        }
    }

    #[test]
    fn symmetric() {
        let pairs = [
            (GeoPoint::new(25.0330, 121.5654), GeoPoint::new(22.6273, 120.3014)),
            (GeoPoint::new(56.175188, 10.196123), GeoPoint::new(40.122151, 44.658078)),
            (GeoPoint::new(-10., 179.9), GeoPoint::new(10., -179.9)),
        ];

        for (a, b) in pairs {
            assert_abs_diff_eq!(distance_km(a, b), distance_km(b, a), epsilon = 1e-9);
        }
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance_km(GeoPoint::new(0., 0.), GeoPoint::new(0., 1.));
        assert_abs_diff_eq!(d, 111.19, epsilon = 0.5);
    }

    #[test]
    fn antipodes_are_half_the_circumference() {
        let d = distance_km(GeoPoint::new(0., 0.), GeoPoint::new(0., 180.));
        assert!(d.is_finite());
        assert_abs_diff_eq!(d, std::f64::consts::PI * EARTH_RADIUS_KM, epsilon = 1e-6);
    }

    #[test]
    fn out_of_range_input_does_not_panic() {
        let d = distance_km(GeoPoint::new(120., 400.), GeoPoint::new(-95., -720.));
        assert!(d.is_finite());
        assert!(d >= 0.);
    }
}
