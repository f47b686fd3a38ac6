use serde::{Deserialize, Serialize};

/// A position in degrees, as reported by the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One fix from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub point: GeoPoint,
    /// Ground speed in m/s. Providers leave this out when they can't estimate it.
    pub speed_mps: Option<f64>,
}

impl Sample {
    pub fn new(point: GeoPoint, speed_mps: Option<f64>) -> Self {
        Self {
            point,
            speed_mps,
        }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(GeoPoint::new(latitude, longitude), None)
    }

    /// Speed converted to km/h and rounded for display.
    /// Missing, negative or non-finite speeds display as 0 and never touch distance.
    pub fn display_speed_kmh(&self) -> u32 {
        match self.speed_mps {
            Some(mps) if mps.is_finite() && mps > 0. => (mps * 3.6).round() as u32,
            _ => 0,
        }
    }
}

#[test]
fn display_speed() {
    let point = GeoPoint::new(25.03, 121.56);

    assert_eq!(Sample::new(point, Some(10.)).display_speed_kmh(), 36);
    assert_eq!(Sample::new(point, Some(1.25)).display_speed_kmh(), 5); // 4.5 rounds away from zero
    assert_eq!(Sample::new(point, None).display_speed_kmh(), 0);
    assert_eq!(Sample::new(point, Some(-3.)).display_speed_kmh(), 0);
    assert_eq!(Sample::new(point, Some(f64::NAN)).display_speed_kmh(), 0);
}
