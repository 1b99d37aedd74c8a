//! Coverage boxes and buffered trip shapes.
//!
//! Coordinates follow the `geo` convention: `x` is longitude, `y` latitude.

use geo::{BoundingRect, Coord, EuclideanDistance, HaversineDestination, LineString, Point, Rect, coord};

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_319.49;

/// Smallest box holding every `(lat, lon)` point, or `None` for no points.
pub fn bounding_box(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Rect> {
    let mut points = points.into_iter();
    let (lat, lon) = points.next()?;
    let (mut min, mut max) = (coord! { x: lon, y: lat }, coord! { x: lon, y: lat });
    for (lat, lon) in points {
        min.x = min.x.min(lon);
        min.y = min.y.min(lat);
        max.x = max.x.max(lon);
        max.y = max.y.max(lat);
    }
    Some(Rect::new(min, max))
}

/// Grows `rect` by at least `meters` on every side.
pub fn buffer_rect(rect: Rect, meters: f64) -> Rect {
    // pythagoras
    let corner_distance = (meters.powi(2) * 2.0).sqrt();

    Rect::new(
        // south west
        Point::from(rect.min()).haversine_destination(225., corner_distance),
        // north east
        Point::from(rect.max()).haversine_destination(45., corner_distance),
    )
}

/// Inclusive containment; a point on the edge is inside.
pub fn rect_contains(rect: &Rect, lat: f64, lon: f64) -> bool {
    lon >= rect.min().x && lon <= rect.max().x && lat >= rect.min().y && lat <= rect.max().y
}

/// The region within `buffer_meters` of a shape polyline.
///
/// Distances are measured in a local equirectangular projection centred on
/// the first shape point, which is accurate to well under a meter at the
/// scale of a single trip.
#[derive(Debug, Clone)]
pub struct ShapeBuffer {
    origin: Coord,
    cos_lat: f64,
    line: LineString,
    envelope: Rect,
    buffer_meters: f64,
}

impl ShapeBuffer {
    /// Builds the buffer from `(lat, lon)` shape points in sequence order.
    pub fn new(points: &[(f64, f64)], buffer_meters: f64) -> Option<Self> {
        let &(lat0, lon0) = points.first()?;
        let origin = coord! { x: lon0, y: lat0 };
        let cos_lat = lat0.to_radians().cos();

        let line: LineString = points
            .iter()
            .map(|&(lat, lon)| project(origin, cos_lat, lat, lon))
            .collect::<Vec<Coord>>()
            .into();
        let bounds = line.bounding_rect()?;
        let envelope = Rect::new(
            coord! { x: bounds.min().x - buffer_meters, y: bounds.min().y - buffer_meters },
            coord! { x: bounds.max().x + buffer_meters, y: bounds.max().y + buffer_meters },
        );

        Some(Self {
            origin,
            cos_lat,
            line,
            envelope,
            buffer_meters,
        })
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let p = project(self.origin, self.cos_lat, lat, lon);
        let inside_envelope = p.x >= self.envelope.min().x
            && p.x <= self.envelope.max().x
            && p.y >= self.envelope.min().y
            && p.y <= self.envelope.max().y;
        inside_envelope && self.distance_meters(Point::from(p)) <= self.buffer_meters
    }

    fn distance_meters(&self, p: Point) -> f64 {
        match self.line.0.as_slice() {
            [only] => p.euclidean_distance(&Point::from(*only)),
            _ => p.euclidean_distance(&self.line),
        }
    }
}

fn project(origin: Coord, cos_lat: f64, lat: f64, lon: f64) -> Coord {
    coord! {
        x: (lon - origin.x) * cos_lat * METERS_PER_DEGREE,
        y: (lat - origin.y) * METERS_PER_DEGREE,
    }
}
