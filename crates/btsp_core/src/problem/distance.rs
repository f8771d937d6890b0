use lkh::problem::EdgeWeightType;

use super::Cost;
use crate::{Error, Result};

/// TSPLIB truncates pi for GEO instances.
#[allow(clippy::approx_constant)]
const GEO_PI: f64 = 3.141592;
const GEO_EARTH_RADIUS_KM: f64 = 6378.388;

/// Planar or geographic node coordinate as read from `NODE_COORD_SECTION`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// TSPLIB distance functions. All round to integers the TSPLIB way.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DistanceKind {
    Euc2d,
    Ceil2d,
    Man2d,
    Max2d,
    Att,
    Geo,
}

impl DistanceKind {
    pub fn distance(self, a: Coord, b: Coord) -> Cost {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        match self {
            Self::Euc2d => nint((dx * dx + dy * dy).sqrt()),
            Self::Ceil2d => (dx * dx + dy * dy).sqrt().ceil() as Cost,
            Self::Man2d => nint(dx.abs() + dy.abs()),
            Self::Max2d => nint(dx.abs()).max(nint(dy.abs())),
            Self::Att => {
                let r = ((dx * dx + dy * dy) / 10.0).sqrt();
                let t = nint(r);
                if (t as f64) < r { t + 1 } else { t }
            }
            Self::Geo => geo_distance(a, b),
        }
    }
}

impl TryFrom<EdgeWeightType> for DistanceKind {
    type Error = Error;

    fn try_from(value: EdgeWeightType) -> Result<Self> {
        match value {
            EdgeWeightType::Euc2d => Ok(Self::Euc2d),
            EdgeWeightType::Ceil2d => Ok(Self::Ceil2d),
            EdgeWeightType::Man2d => Ok(Self::Man2d),
            EdgeWeightType::Max2d => Ok(Self::Max2d),
            EdgeWeightType::Att => Ok(Self::Att),
            EdgeWeightType::Geo => Ok(Self::Geo),
            EdgeWeightType::Explicit => Err(Error::invalid_input(
                "EXPLICIT edge weights have no distance function",
            )),
        }
    }
}

fn nint(value: f64) -> Cost {
    (value + 0.5).floor() as Cost
}

/// TSPLIB `DDD.MM` degrees-minutes to radians.
fn geo_radians(value: f64) -> f64 {
    let degrees = value.trunc();
    let minutes = value - degrees;
    GEO_PI * (degrees + 5.0 * minutes / 3.0) / 180.0
}

fn geo_distance(a: Coord, b: Coord) -> Cost {
    let (lat_a, lon_a) = (geo_radians(a.x), geo_radians(a.y));
    let (lat_b, lon_b) = (geo_radians(b.x), geo_radians(b.y));

    let q1 = (lon_a - lon_b).cos();
    let q2 = (lat_a - lat_b).cos();
    let q3 = (lat_a + lat_b).cos();
    let arc = (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).clamp(-1.0, 1.0).acos();
    (GEO_EARTH_RADIUS_KM * arc + 1.0) as Cost
}
