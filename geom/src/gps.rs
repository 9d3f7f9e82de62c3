use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Distance, Pt2D};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// longitude is x, latitude is y
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    longitude: f64,
    latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    pub fn x(self) -> f64 {
        self.longitude
    }

    pub fn y(self) -> f64 {
        self.latitude
    }

    /// Haversine distance on a spherical earth.
    pub fn gps_dist(self, other: LonLat) -> Distance {
        let lon1 = self.longitude.to_radians();
        let lon2 = other.longitude.to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        let a = (delta_lat / 2.0).sin().powi(2)
            + (delta_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Distance::meters(EARTH_RADIUS_METERS * c)
    }

    /// The initial bearing from here to `other`, in degrees clockwise from north, in (-180, 180].
    /// This matches the `azi1` convention of a geodesic inverse solution.
    pub fn bearing_to(self, other: LonLat) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let y = delta_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
        let degrees = y.atan2(x).to_degrees();
        if degrees == -180.0 {
            180.0
        } else {
            degrees
        }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}

/// A GPS bounding box. Also the anchor of the local planar frame that `convert` projects into.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GPSBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GPSBounds {
    pub fn new() -> GPSBounds {
        GPSBounds {
            min_lon: f64::MAX,
            min_lat: f64::MAX,
            max_lon: f64::MIN,
            max_lat: f64::MIN,
        }
    }

    pub fn from(pts: &[LonLat]) -> GPSBounds {
        let mut b = GPSBounds::new();
        for pt in pts {
            b.update(*pt);
        }
        b
    }

    pub fn update(&mut self, pt: LonLat) {
        self.min_lon = self.min_lon.min(pt.longitude);
        self.max_lon = self.max_lon.max(pt.longitude);
        self.min_lat = self.min_lat.min(pt.latitude);
        self.max_lat = self.max_lat.max(pt.latitude);
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    /// Projects into a local planar frame in meters, with the southwest corner at the origin, x
    /// growing east and y growing north. Points outside the bounds get negative coordinates
    /// rather than failing.
    pub fn convert(&self, gps: LonLat) -> Pt2D {
        let dx = LonLat::new(self.min_lon, gps.latitude)
            .gps_dist(LonLat::new(gps.longitude, gps.latitude))
            .inner_meters();
        let dy = LonLat::new(gps.longitude, self.min_lat)
            .gps_dist(LonLat::new(gps.longitude, gps.latitude))
            .inner_meters();
        Pt2D::new(
            if gps.longitude < self.min_lon { -dx } else { dx },
            if gps.latitude < self.min_lat { -dy } else { dy },
        )
    }
}

impl Default for GPSBounds {
    fn default() -> GPSBounds {
        GPSBounds::new()
    }
}
