//! Earth ellipsoid constants and the geodetic to geocentric transformation

/// Geomagnetic reference radius in km
pub const MEAN_EARTH_RADIUS: f64 = 6371.2;

/// Reference ellipsoid given by its semi-axes in km
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major (equatorial) axis in km
    pub semi_major: f64,
    /// Semi-minor (polar) axis in km
    pub semi_minor: f64,
}

impl Ellipsoid {
    /// World Geodetic System 1984
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major: 6378.137,
        semi_minor: 6356.752314245,
    };

    /// Flattening `(a - b) / a`
    pub fn flattening(&self) -> f64 {
        (self.semi_major - self.semi_minor) / self.semi_major
    }

    /// Square of the first eccentricity
    pub fn eccentricity_squared(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// Point in geocentric spherical coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoordinates {
    /// Geocentric latitude in radians
    pub latitude: f64,
    /// Longitude in radians, identical to the geodetic longitude
    pub longitude: f64,
    /// Distance from the Earth's centre in km
    pub radius: f64,
}

/// Convert geodetic latitude/longitude (radians) and height above the
/// ellipsoid (km) to geocentric spherical coordinates on WGS-84
pub fn geodetic_to_spherical(latitude: f64, longitude: f64, height: f64) -> SphericalCoordinates {
    geodetic_to_spherical_on(&Ellipsoid::WGS84, latitude, longitude, height)
}

/// Convert geodetic coordinates to geocentric spherical coordinates on an
/// arbitrary ellipsoid
///
/// # Example
/// ```
/// use ahrs_wmm::geodesy::{Ellipsoid, geodetic_to_spherical_on};
///
/// // On a sphere both latitudes agree
/// let sphere = Ellipsoid { semi_major: 1737.4, semi_minor: 1737.4 };
/// let point = geodetic_to_spherical_on(&sphere, 0.5, 1.0, 0.0);
/// assert!((point.latitude - 0.5).abs() < 1e-12);
/// assert!((point.radius - 1737.4).abs() < 1e-9);
/// ```
pub fn geodetic_to_spherical_on(
    ellipsoid: &Ellipsoid,
    latitude: f64,
    longitude: f64,
    height: f64,
) -> SphericalCoordinates {
    let e2 = ellipsoid.eccentricity_squared();
    let (sin_lat, cos_lat) = latitude.sin_cos();

    // Radius of curvature of the prime vertical
    let rc = ellipsoid.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let rho = (rc + height) * cos_lat;
    let z = (rc * (1.0 - e2) + height) * sin_lat;
    let radius = rho.hypot(z);

    SphericalCoordinates {
        latitude: (z / radius).asin(),
        longitude,
        radius,
    }
}
