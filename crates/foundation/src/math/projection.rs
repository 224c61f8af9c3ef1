use serde::{Deserialize, Serialize};

use crate::geometry::Position;

/// Spherical Web Mercator radius (EPSG:3857).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit beyond which Web Mercator diverges.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// Map between geographic coordinates and the plane a view is laid out in.
pub trait Projection {
    fn forward(&self, p: Position) -> Position;
    fn inverse(&self, p: Position) -> Position;
}

/// Planar coordinates pass through unchanged.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Identity;

impl Projection for Identity {
    fn forward(&self, p: Position) -> Position {
        p
    }

    fn inverse(&self, p: Position) -> Position {
        p
    }
}

/// Longitude/latitude in degrees to spherical mercator meters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn forward(&self, p: Position) -> Position {
        let lat = p[1].clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let x = EARTH_RADIUS_M * p[0].to_radians();
        let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        [x, y]
    }

    fn inverse(&self, p: Position) -> Position {
        let lon = (p[0] / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (p[1] / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        [lon, lat]
    }
}

/// Serializable selector for the projections above.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    #[default]
    Identity,
    WebMercator,
}

impl Projection for ProjectionKind {
    fn forward(&self, p: Position) -> Position {
        match self {
            ProjectionKind::Identity => Identity.forward(p),
            ProjectionKind::WebMercator => WebMercator.forward(p),
        }
    }

    fn inverse(&self, p: Position) -> Position {
        match self {
            ProjectionKind::Identity => Identity.inverse(p),
            ProjectionKind::WebMercator => WebMercator.inverse(p),
        }
    }
}
